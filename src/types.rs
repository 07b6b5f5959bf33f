use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub fn offset(self, x: i32, y: i32) -> (i32, i32) {
        match self {
            Self::Up => (x, y - 1),
            Self::Right => (x + 1, y),
            Self::Down => (x, y + 1),
            Self::Left => (x - 1, y),
        }
    }

    /// Next facing when probing around a blocked cell.
    pub fn clockwise(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Low,
    Standard,
    High,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "standard" => Some(Self::Standard),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Low, Self::Standard, Self::High]
    }
}

/// Round lifecycle. `Won` and `Lost` are terminal; only building a fresh
/// engine leaves them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Ready,
    Playing,
    Won,
    Lost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dir: Option<Direction>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PursuerView {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PacketView {
    pub x: i32,
    pub y: i32,
    pub ordinal: u32,
    pub collected: bool,
}

/// Static round geometry handed to presentation layers once per round.
#[derive(Clone, Debug, Serialize)]
pub struct MazeInit {
    pub size: i32,
    pub tiles: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PacketCollected {
        ordinal: u32,
        x: i32,
        y: i32,
    },
    RoundWon {
        score: i32,
    },
    RoundLost {
        x: i32,
        y: i32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub phase: GamePhase,
    pub score: i32,
    #[serde(rename = "nextOrdinal")]
    pub next_ordinal: u32,
    #[serde(rename = "collectedPackets")]
    pub collected_packets: u32,
    #[serde(rename = "totalPackets")]
    pub total_packets: u32,
    pub player: PlayerView,
    pub pursuers: Vec<PursuerView>,
    pub packets: Vec<PacketView>,
    pub events: Vec<RuntimeEvent>,
}
