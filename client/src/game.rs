use log::debug;
use shared::{lerp, Coin, Direction, Packet, Player, Snapshot, RENDER_DELAY, SNAPSHOT_BUFFER_SIZE};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

/// A snapshot stamped with the moment it reached the client
#[derive(Debug, Clone)]
pub struct BufferedSnapshot {
    pub received_at: Instant,
    pub snapshot: Snapshot,
}

/// Arrival-ordered snapshot history with a fixed capacity. The oldest entry
/// is evicted first.
#[derive(Debug, Clone)]
pub struct SnapshotBuffer {
    entries: VecDeque<BufferedSnapshot>,
    capacity: usize,
}

impl SnapshotBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, received_at: Instant, snapshot: Snapshot) {
        self.entries.push_back(BufferedSnapshot {
            received_at,
            snapshot,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn oldest(&self) -> Option<&BufferedSnapshot> {
        self.entries.front()
    }

    pub fn newest(&self) -> Option<&BufferedSnapshot> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BufferedSnapshot> {
        self.entries.iter()
    }

    /// Finds the newest adjacent pair whose older half arrived at or before
    /// `render_time`.
    fn bracketing_pair(
        &self,
        render_time: Instant,
    ) -> Option<(&BufferedSnapshot, &BufferedSnapshot)> {
        (0..self.entries.len().saturating_sub(1))
            .rev()
            .find(|&i| self.entries[i].received_at <= render_time)
            .map(|i| (&self.entries[i], &self.entries[i + 1]))
    }
}

/// What the renderer draws for one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderState {
    pub players: BTreeMap<u32, Player>,
    pub coins: Vec<Coin>,
}

impl From<&Snapshot> for RenderState {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            players: snapshot.players.clone(),
            coins: snapshot.coins.clone(),
        }
    }
}

/// Client-side view of the authoritative world.
///
/// Buffers incoming snapshots by arrival time and rebuilds a smoothed world
/// `render_delay` in the past by interpolating between the two snapshots
/// that bracket that moment. Also gates outgoing input on knowing our own id.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    buffer: SnapshotBuffer,
    render_delay: Duration,
    local_id: Option<u32>,
    last_seq: u64,
}

impl Synchronizer {
    pub fn new(buffer_size: usize, render_delay: Duration) -> Self {
        Self {
            buffer: SnapshotBuffer::new(buffer_size),
            render_delay,
            local_id: None,
            last_seq: 0,
        }
    }

    pub fn local_id(&self) -> Option<u32> {
        self.local_id
    }

    pub fn buffer(&self) -> &SnapshotBuffer {
        &self.buffer
    }

    pub fn on_welcome(&mut self, id: u32) {
        self.local_id = Some(id);
    }

    pub fn on_snapshot_received(&mut self, snapshot: Snapshot) -> bool {
        self.on_snapshot_received_at(snapshot, Instant::now())
    }

    /// Buffers `snapshot` as arriving at `received_at`. Sequenced snapshots
    /// older than one already accepted are dropped; returns false for those.
    pub fn on_snapshot_received_at(&mut self, snapshot: Snapshot, received_at: Instant) -> bool {
        if snapshot.seq != 0 {
            if snapshot.seq <= self.last_seq {
                debug!(
                    "Dropping stale snapshot {} (already have {})",
                    snapshot.seq, self.last_seq
                );
                return false;
            }
            self.last_seq = snapshot.seq;
        }

        self.buffer.push(received_at, snapshot);
        true
    }

    pub fn handle_packet(&mut self, packet: Packet, received_at: Instant) {
        match packet {
            Packet::Welcome { id } => self.on_welcome(id),
            Packet::State(snapshot) => {
                self.on_snapshot_received_at(snapshot, received_at);
            }
            other => debug!("Ignoring unexpected {} message", other.kind()),
        }
    }

    /// Builds the input message for `dir`, or `None` while our id is unknown.
    /// Suppressed inputs are dropped, not queued.
    pub fn input(&self, dir: Direction) -> Option<Packet> {
        self.local_id.map(|id| Packet::Input { id, dir })
    }

    /// Reconstructs the world as it was `render_delay` before `now`.
    ///
    /// Returns `None` until two snapshots are buffered. If every buffered
    /// snapshot arrived after the render time the oldest one is returned as
    /// is. Otherwise players are linearly interpolated between the bracketing
    /// pair with alpha clamped to [0, 1]; a player missing from the newer
    /// snapshot stays where the older one had it. Scores and coins always come
    /// from the newer snapshot.
    pub fn interpolate(&self, now: Instant) -> Option<RenderState> {
        if self.buffer.len() < 2 {
            return None;
        }

        let pair = now
            .checked_sub(self.render_delay)
            .and_then(|render_time| {
                self.buffer
                    .bracketing_pair(render_time)
                    .map(|(older, newer)| (render_time, older, newer))
            });

        let Some((render_time, older, newer)) = pair else {
            return self.buffer.oldest().map(|entry| RenderState::from(&entry.snapshot));
        };

        let span = newer.received_at.saturating_duration_since(older.received_at);
        let alpha = if span.is_zero() {
            1.0
        } else {
            let elapsed = render_time.saturating_duration_since(older.received_at);
            (elapsed.as_secs_f32() / span.as_secs_f32()).clamp(0.0, 1.0)
        };

        let players = older
            .snapshot
            .players
            .iter()
            .map(|(id, from)| {
                let to = newer.snapshot.players.get(id).unwrap_or(from);
                let player = Player {
                    x: lerp(from.x, to.x, alpha),
                    y: lerp(from.y, to.y, alpha),
                    score: to.score,
                };
                (*id, player)
            })
            .collect();

        Some(RenderState {
            players,
            coins: newer.snapshot.coins.clone(),
        })
    }
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new(SNAPSHOT_BUFFER_SIZE, RENDER_DELAY)
    }
}
