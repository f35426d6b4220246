//! # Arena Client Library
//!
//! This library provides the client side of the coin arena: it connects to
//! the authoritative server, forwards the player's directional input, and
//! turns the stream of world snapshots into a smooth view of the game.
//!
//! ## Architecture Overview
//!
//! The client never simulates anything itself. All positions and scores come
//! from server snapshots, which arrive at roughly 20Hz and with jitter. To
//! show smooth motion anyway, the client renders the world slightly in the
//! past and blends between the two snapshots around that moment.
//!
//! ### Snapshot Interpolation
//! Snapshots are buffered by arrival time (20 entries by default). Each frame
//! the client picks a render time 100ms behind the wall clock, finds the
//! buffered pair that brackets it, and linearly interpolates player
//! positions. Scores and coins are discrete and are taken from the newer
//! snapshot unchanged.
//!
//! ### Input Gating
//! The server identifies players by the id it sends in its welcome message.
//! Until that arrives, input is dropped rather than queued.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! - Snapshot buffer with bounded, oldest-first eviction
//! - The synchronizer: welcome handling, input gating, interpolation
//!
//! ### Input Module (`input`)
//! - Key-name to direction mapping
//! - Stdin and bot input sources
//!
//! ### Network Module (`network`)
//! - WebSocket connection and delayed outbound queue
//! - The cooperative event loop tying network, input and rendering together
//!
//! ### Rendering Module (`rendering`)
//! - Frame skipping while no state is renderable
//! - Text HUD output
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::{Client, ClientConfig};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let (input_tx, input_rx) = mpsc::unbounded_channel();
//!     client::input::spawn_stdin_reader(input_tx);
//!
//!     let mut client = Client::new(ClientConfig::default());
//!     client.run(input_rx).await
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
