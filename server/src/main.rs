use clap::Parser;
use log::info;
use server::network::{Server, ServerConfig, ServerError};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Milliseconds between simulation ticks
    #[arg(long, default_value = "50")]
    tick_ms: u64,

    /// Milliseconds between coin spawns
    #[arg(long, default_value = "3000")]
    coin_interval_ms: u64,

    /// Simulated latency applied to every outbound message
    #[arg(short = 'l', long, default_value = "200")]
    delay_ms: u64,

    /// Simulated latency applied to every inbound message. 200 together with
    /// the default --delay-ms gives 200ms each way on both ends
    #[arg(long, default_value = "0")]
    inbound_delay_ms: u64,

    /// Maximum number of concurrent clients
    #[arg(short, long, default_value = "64")]
    max_clients: usize,

    /// Stop spawning coins while this many are on the map
    #[arg(long)]
    max_coins: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig {
        tick_interval: Duration::from_millis(args.tick_ms.max(1)),
        coin_interval: Duration::from_millis(args.coin_interval_ms.max(1)),
        network_delay: Duration::from_millis(args.delay_ms),
        inbound_delay: Duration::from_millis(args.inbound_delay_ms),
        max_clients: args.max_clients,
        max_coins: args.max_coins,
    };

    info!("Starting server...");
    info!(
        "Tick {:?}, coin every {:?}, {}ms simulated latency",
        config.tick_interval, config.coin_interval, args.delay_ms
    );

    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
