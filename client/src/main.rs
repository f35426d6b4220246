use clap::Parser;
use client::input;
use client::network::{Client, ClientConfig, ClientError};
use log::info;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server WebSocket URL to connect to
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8080")]
    server: String,

    /// Simulated latency applied to every outbound message
    #[arg(short = 'l', long, default_value = "200")]
    delay_ms: u64,

    /// Simulated latency applied to every inbound message. 200 together with
    /// the default --delay-ms gives 200ms each way on both ends
    #[arg(long, default_value = "0")]
    inbound_delay_ms: u64,

    /// How far in the past to render, in milliseconds
    #[arg(short = 'r', long, default_value = "100")]
    render_delay_ms: u64,

    /// Number of snapshots kept for interpolation
    #[arg(short = 'b', long, default_value = "20")]
    buffer: usize,

    /// Send a random direction at this interval instead of reading stdin
    #[arg(long)]
    bot_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ClientConfig {
        server_url: args.server,
        network_delay: Duration::from_millis(args.delay_ms),
        inbound_delay: Duration::from_millis(args.inbound_delay_ms),
        render_delay: Duration::from_millis(args.render_delay_ms),
        buffer_size: args.buffer.max(2),
        ..ClientConfig::default()
    };

    info!("Starting client...");
    if args.delay_ms > 0 {
        info!("Simulating {}ms latency", args.delay_ms);
    }

    let (input_tx, input_rx) = mpsc::unbounded_channel();
    match args.bot_interval_ms {
        Some(ms) => {
            info!("Bot mode: random move every {}ms", ms);
            input::spawn_bot(input_tx, Duration::from_millis(ms.max(1)));
        }
        None => {
            info!("Controls: type left/right/up/down (or a/d/w/s) and press Enter");
            input::spawn_stdin_reader(input_tx);
        }
    }

    let mut client = Client::new(config);
    client.run(input_rx).await
}
