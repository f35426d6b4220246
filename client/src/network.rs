use crate::game::Synchronizer;
use crate::rendering::Renderer;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{
    delay_line, DelayedSender, Direction, Packet, NETWORK_DELAY, RENDER_DELAY,
    SNAPSHOT_BUFFER_SIZE,
};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    /// Artificial latency applied to every outbound message
    pub network_delay: Duration,
    /// Artificial latency applied to every inbound message before it is buffered
    pub inbound_delay: Duration,
    pub render_delay: Duration,
    pub buffer_size: usize,
    pub frame_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8080".to_string(),
            network_delay: NETWORK_DELAY,
            inbound_delay: Duration::ZERO,
            render_delay: RENDER_DELAY,
            buffer_size: SNAPSHOT_BUFFER_SIZE,
            frame_interval: Duration::from_millis(16),
        }
    }
}

pub struct Client {
    config: ClientConfig,
    sync: Synchronizer,
    renderer: Renderer,
    inputs_sent: u64,
    inputs_dropped: u64,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Client {
            sync: Synchronizer::new(config.buffer_size, config.render_delay),
            renderer: Renderer::new(),
            config,
            inputs_sent: 0,
            inputs_dropped: 0,
        }
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.sync
    }

    /// Inputs queued for the server so far
    pub fn inputs_sent(&self) -> u64 {
        self.inputs_sent
    }

    /// Inputs discarded because no player id was known yet
    pub fn inputs_dropped(&self) -> u64 {
        self.inputs_dropped
    }

    fn handle_packet(&mut self, packet: Packet, receive_time: Instant) {
        if let Packet::Welcome { id } = packet {
            info!("Connected! Player ID: {}", id);
        }
        self.sync.handle_packet(packet, receive_time);
    }

    /// Queues an input behind the simulated latency. Dropped while our id is
    /// unknown.
    fn send_input(&mut self, dir: Direction, outbound: &DelayedSender<String>) {
        let Some(packet) = self.sync.input(dir) else {
            self.inputs_dropped += 1;
            debug!("Dropping {:?} input: no player id yet", dir);
            return;
        };

        match packet.encode() {
            Ok(text) => {
                if outbound.send(text) {
                    self.inputs_sent += 1;
                }
            }
            Err(e) => warn!("Failed to encode input: {}", e),
        }
    }

    fn render(&mut self) {
        let state = self.sync.interpolate(Instant::now());
        self.renderer.render(state.as_ref(), self.sync.local_id());
    }

    /// Connects and runs until the server goes away. Directions arriving on
    /// `inputs` are sent to the server; when that channel closes the client
    /// keeps watching.
    pub async fn run(&mut self, mut inputs: mpsc::UnboundedReceiver<Direction>) -> Result<(), ClientError> {
        info!("Connecting to {}...", self.config.server_url);
        let (ws, _) = connect_async(self.config.server_url.as_str()).await?;
        let (mut sink, mut frames) = ws.split();

        let (outbound, mut outbound_rx) = delay_line::<String>(self.config.network_delay);
        let writer = tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    debug!("Send failed: {}", e);
                    break;
                }
            }
        });

        let (inbound, mut inbound_rx) = delay_line::<Packet>(self.config.inbound_delay);
        let reader = tokio::spawn(async move {
            while let Some(frame) = frames.next().await {
                match frame {
                    Ok(Message::Text(text)) => match Packet::decode(&text) {
                        Ok(Some(packet)) => {
                            inbound.send(packet);
                        }
                        Ok(None) => debug!("Ignoring unknown message type"),
                        Err(e) => debug!("Dropping malformed message: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Connection error: {}", e);
                        break;
                    }
                }
            }
        });

        let mut render_interval = interval(self.config.frame_interval);
        let mut inputs_open = true;

        loop {
            tokio::select! {
                packet = inbound_rx.recv() => {
                    match packet {
                        Some(packet) => self.handle_packet(packet, Instant::now()),
                        None => {
                            info!("Server closed the connection");
                            break;
                        }
                    }
                },

                dir = inputs.recv(), if inputs_open => {
                    match dir {
                        Some(dir) => self.send_input(dir, &outbound),
                        None => inputs_open = false,
                    }
                },

                _ = render_interval.tick() => self.render(),
            }
        }

        info!(
            "Sent {} inputs ({} dropped before welcome), rendered {} frames",
            self.inputs_sent,
            self.inputs_dropped,
            self.renderer.frames_rendered()
        );

        writer.abort();
        reader.abort();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Snapshot;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.network_delay, Duration::from_millis(200));
        assert_eq!(config.render_delay, Duration::from_millis(100));
        assert_eq!(config.buffer_size, 20);
    }

    #[tokio::test]
    async fn test_input_dropped_before_welcome() {
        let mut client = Client::new(ClientConfig::default());
        let (outbound, mut outbound_rx) = delay_line(Duration::ZERO);

        client.send_input(Direction::Up, &outbound);
        assert_eq!(client.inputs_dropped, 1);
        assert_eq!(client.inputs_sent, 0);

        client.handle_packet(Packet::Welcome { id: 3 }, Instant::now());
        client.send_input(Direction::Up, &outbound);
        assert_eq!(client.inputs_sent, 1);

        let text = outbound_rx.recv().await.unwrap();
        assert_eq!(
            Packet::decode(&text).unwrap(),
            Some(Packet::Input {
                id: 3,
                dir: Direction::Up
            })
        );
    }

    #[test]
    fn test_render_skips_until_two_snapshots() {
        let mut client = Client::new(ClientConfig::default());
        client.render();
        assert_eq!(client.renderer.frames_skipped(), 1);

        let earlier = Instant::now() - Duration::from_millis(300);
        client.handle_packet(Packet::State(Snapshot { seq: 1, ..Snapshot::default() }), earlier);
        client.handle_packet(
            Packet::State(Snapshot { seq: 2, ..Snapshot::default() }),
            earlier + Duration::from_millis(50),
        );
        client.render();
        assert_eq!(client.renderer.frames_rendered(), 1);
    }
}
