use log::{debug, info};
use rand::Rng;
use shared::{separate, Coin, Direction, Player, Separation, Snapshot, MAP_HEIGHT, MAP_WIDTH};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Authoritative arena state. Players are keyed by id in a `BTreeMap` so
/// collision and capture always walk them in ascending id order.
#[derive(Debug, Clone)]
pub struct World {
    pub tick: u64,
    players: BTreeMap<u32, Player>,
    coins: Vec<Coin>,
    next_player_id: u32,
    max_coins: Option<usize>,
}

impl World {
    pub fn new() -> Self {
        Self::with_coin_cap(None)
    }

    /// `max_coins` bounds how many coins may be active at once; `None` lets
    /// them accumulate.
    pub fn with_coin_cap(max_coins: Option<usize>) -> Self {
        Self {
            tick: 0,
            players: BTreeMap::new(),
            coins: Vec::new(),
            next_player_id: 1,
            max_coins,
        }
    }

    /// Adds a player at the spawn point and returns its id. Ids are never reused.
    pub fn connect(&mut self) -> u32 {
        let id = self.next_player_id;
        self.next_player_id += 1;

        let player = Player::at_spawn();
        info!("Added player {} at ({}, {})", id, player.x, player.y);
        self.players.insert(id, player);
        id
    }

    pub fn disconnect(&mut self, id: u32) -> bool {
        let removed = self.players.remove(&id).is_some();
        if removed {
            info!("Removed player {}", id);
        }
        removed
    }

    /// Moves one player by a single step, keeps it inside the map and pushes
    /// it out of every other player it now overlaps.
    ///
    /// Overlaps are resolved one after another in id order against the
    /// already-adjusted position. If the mover lands exactly on another
    /// player it goes back to where it started. Unknown ids are ignored.
    pub fn handle_input(&mut self, id: u32, dir: Direction) {
        let Some(&start) = self.players.get(&id) else {
            debug!("Ignoring input for unknown player {}", id);
            return;
        };

        let (dx, dy) = dir.delta();
        let mut mover = start;
        mover.x += dx;
        mover.y += dy;
        mover.clamp_to_bounds();

        for (other_id, other) in &self.players {
            if *other_id == id {
                continue;
            }
            if separate(&mut mover, other) == Separation::Coincident {
                mover.x = start.x;
                mover.y = start.y;
            }
        }

        // Containment wins over separation at the walls.
        mover.clamp_to_bounds();

        if let Some(player) = self.players.get_mut(&id) {
            player.x = mover.x;
            player.y = mover.y;
        }
    }

    /// Awards coins to players within capture range. Each coin goes to the
    /// first player in id order that reaches it. Returns how many were taken.
    pub fn collect_coins(&mut self) -> usize {
        let coins = &mut self.coins;
        let mut captured = 0;

        for (id, player) in self.players.iter_mut() {
            coins.retain(|coin| {
                if player.can_capture(coin) {
                    player.score += 1;
                    captured += 1;
                    debug!("Player {} captured coin {} (score {})", id, coin.id, player.score);
                    false
                } else {
                    true
                }
            });
        }

        captured
    }

    /// Runs one authoritative step and returns the snapshot to broadcast.
    pub fn step(&mut self) -> Snapshot {
        self.collect_coins();
        self.tick += 1;
        self.snapshot()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            seq: self.tick,
            players: self.players.clone(),
            coins: self.coins.clone(),
        }
    }

    /// Places a coin uniformly over the map, unless the coin cap is reached.
    pub fn spawn_coin<R: Rng>(&mut self, rng: &mut R) -> Option<Coin> {
        let x = rng.gen_range(0.0..MAP_WIDTH);
        let y = rng.gen_range(0.0..MAP_HEIGHT);
        let id = unix_millis() as f64 + rng.gen::<f64>();
        self.spawn_coin_at(id, x, y)
    }

    pub fn spawn_coin_at(&mut self, id: f64, x: f32, y: f32) -> Option<Coin> {
        if let Some(max) = self.max_coins {
            if self.coins.len() >= max {
                return None;
            }
        }

        let coin = Coin { id, x, y };
        self.coins.push(coin);
        Some(coin)
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Test and tooling hook: puts an existing player at an exact position.
    pub fn place_player(&mut self, id: u32, x: f32, y: f32) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.x = x;
                player.y = y;
                true
            }
            None => false,
        }
    }

    pub fn players(&self) -> &BTreeMap<u32, Player> {
        &self.players
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
