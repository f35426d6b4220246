//! Server network layer: WebSocket connections and the game loop that owns the world

use crate::client_manager::ClientManager;
use crate::game::World;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    delay_line, DelayedSender, Packet, COIN_SPAWN_INTERVAL, NETWORK_DELAY, TICK_INTERVAL,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Runtime knobs. `Default` gives the standard arena timings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub tick_interval: Duration,
    pub coin_interval: Duration,
    /// Artificial latency applied to every outbound message
    pub network_delay: Duration,
    /// Artificial latency applied to every inbound message before it reaches the world
    pub inbound_delay: Duration,
    pub max_clients: usize,
    pub max_coins: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_interval: TICK_INTERVAL,
            coin_interval: COIN_SPAWN_INTERVAL,
            network_delay: NETWORK_DELAY,
            inbound_delay: Duration::ZERO,
            max_clients: 64,
            max_coins: None,
        }
    }
}

/// Messages sent from connection tasks to the game loop
#[derive(Debug)]
pub enum ServerEvent {
    Connected {
        addr: SocketAddr,
        outbound: DelayedSender<String>,
        /// Receives the allocated player id, or `None` if the server is full
        reply: oneshot::Sender<Option<u32>>,
    },
    PacketReceived {
        client_id: u32,
        packet: Packet,
    },
    Disconnected {
        client_id: u32,
    },
}

/// Authoritative server. The game loop in [`Server::run`] is the only place
/// the world is mutated; connection tasks talk to it through [`ServerEvent`]s.
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    config: ServerConfig,
    world: World,
    clients: ClientManager,
    rng: StdRng,

    event_tx: mpsc::UnboundedSender<ServerEvent>,
    event_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Server {
    pub async fn bind(addr: &str, config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on ws://{}", local_addr);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            local_addr,
            world: World::with_coin_cap(config.max_coins),
            clients: ClientManager::new(config.max_clients),
            config,
            rng: StdRng::from_entropy(),
            event_tx,
            event_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawns the task that accepts sockets and starts one task per connection
    fn spawn_acceptor(&mut self) -> Result<(), ServerError> {
        let listener = self.listener.take().ok_or("server is already running")?;
        let event_tx = self.event_tx.clone();
        let network_delay = self.config.network_delay;
        let inbound_delay = self.config.inbound_delay;

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        tokio::spawn(handle_connection(
                            stream,
                            addr,
                            event_tx.clone(),
                            network_delay,
                            inbound_delay,
                        ));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });

        Ok(())
    }

    fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Connected {
                addr,
                outbound,
                reply,
            } => {
                if self.clients.is_full() {
                    info!("Refusing connection from {}: server full", addr);
                    let _ = reply.send(None);
                    return;
                }

                let client_id = self.world.connect();
                self.clients.add_client(client_id, addr, outbound);
                self.send_packet(client_id, &Packet::Welcome { id: client_id });

                if reply.send(Some(client_id)).is_err() {
                    self.disconnect(client_id);
                }
            }

            ServerEvent::PacketReceived { client_id, packet } => match packet {
                Packet::Input { id, dir } => self.world.handle_input(id, dir),
                other => debug!(
                    "Ignoring unexpected {} message from client {}",
                    other.kind(),
                    client_id
                ),
            },

            ServerEvent::Disconnected { client_id } => self.disconnect(client_id),
        }
    }

    fn disconnect(&mut self, client_id: u32) {
        self.clients.remove_client(client_id);
        self.world.disconnect(client_id);
    }

    fn send_packet(&self, client_id: u32, packet: &Packet) {
        match packet.encode() {
            Ok(text) => {
                if !self.clients.send_to(client_id, text) {
                    debug!("Client {} closed before {} was queued", client_id, packet.kind());
                }
            }
            Err(e) => error!("Failed to encode {} packet: {}", packet.kind(), e),
        }
    }

    /// Captures coins and broadcasts the resulting snapshot
    fn tick(&mut self) {
        let snapshot = self.world.step();

        if self.world.tick % 200 == 0 {
            debug!(
                "Tick {}: {} clients, {} players, {} coins",
                self.world.tick,
                self.clients.len(),
                snapshot.players.len(),
                snapshot.coins.len()
            );
        }

        if self.clients.is_empty() {
            return;
        }

        match Packet::State(snapshot).encode() {
            Ok(text) => {
                self.clients.broadcast(&text);
            }
            Err(e) => error!("Failed to encode snapshot: {}", e),
        }
    }

    fn spawn_coin(&mut self) {
        match self.world.spawn_coin(&mut self.rng) {
            Some(coin) => debug!("Spawned coin {} at ({:.1}, {:.1})", coin.id, coin.x, coin.y),
            None => debug!("Coin cap reached, skipping spawn"),
        }
    }

    /// Main server loop: connection events, the simulation tick and the coin
    /// spawner all run here, one at a time.
    pub async fn run(mut self) -> Result<(), ServerError> {
        self.spawn_acceptor()?;

        let mut tick_interval = interval(self.config.tick_interval);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut coin_interval = interval(self.config.coin_interval);
        coin_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Both intervals fire immediately; the first real tick is one period out.
        tick_interval.tick().await;
        coin_interval.tick().await;

        info!("Server started successfully");

        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => self.tick(),

                _ = coin_interval.tick() => self.spawn_coin(),
            }
        }

        Ok(())
    }
}

/// Drives one WebSocket connection until it closes.
///
/// Outbound frames go through a delay line drained by a writer task, so a
/// slow or dead socket never stalls the game loop. When the socket closes the
/// writer is aborted and anything still in flight is dropped.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    event_tx: mpsc::UnboundedSender<ServerEvent>,
    network_delay: Duration,
    inbound_delay: Duration,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    let (mut sink, mut frames) = ws.split();

    let (outbound, mut outbound_rx) = delay_line::<String>(network_delay);
    let (reply_tx, reply_rx) = oneshot::channel();
    if event_tx
        .send(ServerEvent::Connected {
            addr,
            outbound,
            reply: reply_tx,
        })
        .is_err()
    {
        return;
    }

    let client_id = match reply_rx.await {
        Ok(Some(id)) => id,
        _ => {
            let _ = sink.send(Message::Close(None)).await;
            return;
        }
    };

    let writer = tokio::spawn(async move {
        while let Some(text) = outbound_rx.recv().await {
            if let Err(e) = sink.send(Message::Text(text)).await {
                debug!("Send to client {} failed: {}", client_id, e);
                break;
            }
        }
    });

    let (inbound, mut inbound_rx) = delay_line::<Packet>(inbound_delay);
    let forward_tx = event_tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(packet) = inbound_rx.recv().await {
            if forward_tx
                .send(ServerEvent::PacketReceived { client_id, packet })
                .is_err()
            {
                break;
            }
        }
    });

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Message::Text(text)) => match Packet::decode(&text) {
                Ok(Some(packet)) => {
                    inbound.send(packet);
                }
                Ok(None) => debug!("Ignoring unknown message type from client {}", client_id),
                Err(e) => debug!("Dropping malformed message from client {}: {}", client_id, e),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Connection to client {} failed: {}", client_id, e);
                break;
            }
        }
    }

    let _ = event_tx.send(ServerEvent::Disconnected { client_id });
    writer.abort();
    forwarder.abort();
}
