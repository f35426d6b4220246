//! Registry of connected clients and their outbound message queues
//!
//! This module owns the server side of every live connection:
//! - Which player id belongs to which socket address
//! - The delayed outbound queue feeding that connection's writer task
//! - The connection capacity limit
//!
//! It never touches game state; the server loop pairs every add/remove here
//! with the matching connect/disconnect on the world.

use log::{debug, info};
use shared::DelayedSender;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

/// A connected client as seen by the server loop
#[derive(Debug)]
pub struct Client {
    /// Player id handed out by the world
    pub id: u32,
    /// Remote address, for logging
    pub addr: SocketAddr,
    pub connected_at: Instant,
    /// Outbound text frames, written after the artificial network delay
    outbound: DelayedSender<String>,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr, outbound: DelayedSender<String>) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            outbound,
        }
    }

    /// Queues a frame. Returns false when the connection's writer is gone.
    pub fn send(&self, text: String) -> bool {
        self.outbound.send(text)
    }

    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }
}

/// Tracks every open connection and enforces the capacity limit
pub struct ClientManager {
    clients: HashMap<u32, Client>,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
        }
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    /// Registers a connection under an id the world already allocated.
    /// Returns false if the server is at capacity.
    pub fn add_client(&mut self, id: u32, addr: SocketAddr, outbound: DelayedSender<String>) -> bool {
        if self.is_full() {
            return false;
        }

        info!("Client {} connected from {}", id, addr);
        self.clients.insert(id, Client::new(id, addr, outbound));
        true
    }

    pub fn remove_client(&mut self, id: u32) -> bool {
        if let Some(client) = self.clients.remove(&id) {
            info!(
                "Client {} from {} disconnected after {:.1}s",
                id,
                client.addr,
                client.connected_at.elapsed().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    pub fn send_to(&self, id: u32, text: String) -> bool {
        match self.clients.get(&id) {
            Some(client) => client.send(text),
            None => false,
        }
    }

    /// Queues `text` for every open client; closed ones are skipped.
    /// Returns how many clients it was queued for.
    pub fn broadcast(&self, text: &str) -> usize {
        let mut delivered = 0;
        for client in self.clients.values() {
            if !client.is_open() {
                debug!("Skipping broadcast to closed client {}", client.id);
                continue;
            }
            if client.send(text.to_owned()) {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn contains(&self, id: u32) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
