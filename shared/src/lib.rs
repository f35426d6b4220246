use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub mod delay;

pub use delay::{delay_line, DelayedReceiver, DelayedSender};

pub const MAP_WIDTH: f32 = 800.0;
pub const MAP_HEIGHT: f32 = 600.0;
pub const PLAYER_HALF_SIZE: f32 = 12.0;
pub const PLAYER_SIZE: f32 = PLAYER_HALF_SIZE * 2.0;
/// Closest two player centers may get after collision resolution.
pub const MIN_SEPARATION: f32 = PLAYER_SIZE;
pub const CAPTURE_RADIUS: f32 = 40.0;
pub const MOVE_SPEED: f32 = 5.0;
pub const SPAWN_X: f32 = 100.0;
pub const SPAWN_Y: f32 = 100.0;

pub const TICK_INTERVAL: Duration = Duration::from_millis(50);
pub const COIN_SPAWN_INTERVAL: Duration = Duration::from_millis(3000);
pub const NETWORK_DELAY: Duration = Duration::from_millis(200);
pub const RENDER_DELAY: Duration = Duration::from_millis(100);
pub const SNAPSHOT_BUFFER_SIZE: usize = 20;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Axis-aligned displacement for a single input.
    pub fn delta(self) -> (f32, f32) {
        match self {
            Direction::Left => (-MOVE_SPEED, 0.0),
            Direction::Right => (MOVE_SPEED, 0.0),
            Direction::Up => (0.0, -MOVE_SPEED),
            Direction::Down => (0.0, MOVE_SPEED),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub score: u32,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, score: 0 }
    }

    pub fn at_spawn() -> Self {
        Self::new(SPAWN_X, SPAWN_Y)
    }

    pub fn distance_to(&self, other: &Player) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn clamp_to_bounds(&mut self) {
        self.x = self.x.clamp(PLAYER_HALF_SIZE, MAP_WIDTH - PLAYER_HALF_SIZE);
        self.y = self.y.clamp(PLAYER_HALF_SIZE, MAP_HEIGHT - PLAYER_HALF_SIZE);
    }

    pub fn in_bounds(&self) -> bool {
        (PLAYER_HALF_SIZE..=MAP_WIDTH - PLAYER_HALF_SIZE).contains(&self.x)
            && (PLAYER_HALF_SIZE..=MAP_HEIGHT - PLAYER_HALF_SIZE).contains(&self.y)
    }

    pub fn can_capture(&self, coin: &Coin) -> bool {
        let dx = self.x - coin.x;
        let dy = self.y - coin.y;
        dx * dx + dy * dy < CAPTURE_RADIUS * CAPTURE_RADIUS
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coin {
    /// Unix milliseconds at spawn plus a random fraction.
    pub id: f64,
    pub x: f32,
    pub y: f32,
}

/// Result of pushing one player out of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separation {
    Clear,
    Pushed,
    /// Centers coincide, so there is no direction to push along.
    Coincident,
}

/// Moves `mover` away from `other` along the line between their centers by
/// exactly the overlap. `other` is never moved.
pub fn separate(mover: &mut Player, other: &Player) -> Separation {
    let dx = mover.x - other.x;
    let dy = mover.y - other.y;
    let distance = (dx * dx + dy * dy).sqrt();

    if distance >= MIN_SEPARATION {
        return Separation::Clear;
    }
    if distance == 0.0 {
        return Separation::Coincident;
    }

    let overlap = MIN_SEPARATION - distance;
    mover.x += dx / distance * overlap;
    mover.y += dy / distance * overlap;
    Separation::Pushed
}

/// Read-only world projection broadcast every tick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Snapshot {
    /// Server tick that produced this snapshot; 0 when the sender does not sequence.
    #[serde(default)]
    pub seq: u64,
    pub players: BTreeMap<u32, Player>,
    pub coins: Vec<Coin>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Packet {
    Welcome { id: u32 },
    Input { id: u32, dir: Direction },
    State(Snapshot),
}

#[derive(Deserialize)]
struct Tagged {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct WelcomeBody {
    id: u32,
}

#[derive(Deserialize)]
struct InputBody {
    id: u32,
    dir: Direction,
}

impl Packet {
    /// Wire tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Welcome { .. } => "welcome",
            Packet::Input { .. } => "input",
            Packet::State(_) => "state",
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses one text frame. `Ok(None)` means a well-formed message of a type
    /// nobody handles.
    ///
    /// The tag is read first and the body parsed straight from the text, so
    /// integer player ids survive as JSON object keys.
    pub fn decode(text: &str) -> Result<Option<Packet>, serde_json::Error> {
        let tagged: Tagged = serde_json::from_str(text)?;
        let packet = match tagged.kind.as_str() {
            "welcome" => {
                let body: WelcomeBody = serde_json::from_str(text)?;
                Packet::Welcome { id: body.id }
            }
            "input" => {
                let body: InputBody = serde_json::from_str(text)?;
                Packet::Input {
                    id: body.id,
                    dir: body.dir,
                }
            }
            "state" => Packet::State(serde_json::from_str(text)?),
            _ => return Ok(None),
        };
        Ok(Some(packet))
    }
}

pub fn lerp(a: f32, b: f32, alpha: f32) -> f32 {
    a + (b - a) * alpha
}
