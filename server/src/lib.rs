//! # Arena Server Library
//!
//! This library provides the authoritative server for the coin arena. It owns
//! the canonical world state, applies player movement, awards coins, and
//! broadcasts a full snapshot of the world to every connected client on a
//! fixed tick.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Every position and score is decided here. Clients only ever send
//! directional inputs and render whatever snapshots they receive.
//!
//! ### Client Management
//! Handles the lifecycle of WebSocket connections:
//! - Player id assignment and the welcome message
//! - Delayed outbound delivery per connection
//! - Disconnection cleanup
//! - Connection capacity limits
//!
//! ### State Broadcasting
//! Every tick (20Hz by default) the server sends a sequenced snapshot of all
//! players and coins. Delivery is best-effort; closed connections are skipped.
//!
//! ## Architecture Design
//!
//! ### Single-Writer Event Loop
//! One task owns the [`game::World`] and the [`client_manager::ClientManager`].
//! Connection tasks parse frames and forward them as events, so inputs, the
//! simulation tick and the coin spawner never mutate state concurrently and
//! the outcome only depends on the order events reach the loop.
//!
//! ### Simulated Latency
//! Every outbound message is held for a fixed delay (200ms by default) in a
//! per-connection delay line before it is written. The game loop only
//! enqueues, so a slow socket never delays a tick.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! - Player spawn and removal
//! - Movement, boundary clamping and player-player collision
//! - Coin spawning and capture scoring
//! - Snapshot assembly
//!
//! ### Client Manager Module (`client_manager`)
//! - Connection registry keyed by player id
//! - Outbound queues and broadcast
//! - Capacity enforcement
//!
//! ### Network Module (`network`)
//! - WebSocket accept loop and per-connection tasks
//! - Message decoding and event forwarding
//! - The main game loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let server = Server::bind("127.0.0.1:8080", ServerConfig::default()).await?;
//!     server.run().await
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod network;
