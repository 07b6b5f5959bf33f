use crate::types::Difficulty;

pub const TICK_RATE: u32 = 20;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

/// Minimum real time between player steps. Pursuer cadence counts these
/// gated logic ticks, not raw `step` calls.
pub const MOVE_DELAY_MS: u64 = 150;

/// A pursuer moves once every `PURSUER_CADENCE_BASE - speed` logic ticks.
pub const PURSUER_CADENCE_BASE: u32 = 10;

/// Chance of re-rolling a pursuer's facing after a successful move.
pub const PURSUER_REDIRECT_CHANCE: f32 = 0.1;

/// Extra-opening trials per generated maze are `EXTRA_OPENING_FACTOR * size`.
pub const EXTRA_OPENING_FACTOR: i32 = 2;

/// Packets spawn outside this per-axis radius around the player spawn.
pub const PACKET_EXCLUSION_RADIUS: i32 = 3;
/// Pursuers spawn outside this per-axis radius around the player spawn.
pub const PURSUER_EXCLUSION_RADIUS: i32 = 5;

pub const PACKET_SCORE: i32 = 100;

#[derive(Clone, Copy, Debug)]
pub struct BreachConfig {
    pub name: &'static str,
    pub grid_size: i32,
    pub min_packets: u32,
    pub max_packets: u32,
    pub pursuer_count: usize,
    pub pursuer_speed: u32,
}

pub fn get_breach_config(difficulty: Difficulty) -> BreachConfig {
    match difficulty {
        Difficulty::Low => BreachConfig {
            name: "LOW FIREWALL",
            grid_size: 15,
            min_packets: 5,
            max_packets: 8,
            pursuer_count: 2,
            pursuer_speed: 2,
        },
        Difficulty::Standard => BreachConfig {
            name: "STANDARD FIREWALL",
            grid_size: 21,
            min_packets: 10,
            max_packets: 15,
            pursuer_count: 3,
            pursuer_speed: 3,
        },
        Difficulty::High => BreachConfig {
            name: "HIGH FIREWALL",
            grid_size: 25,
            min_packets: 15,
            max_packets: 20,
            pursuer_count: 4,
            pursuer_speed: 4,
        },
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RerouteConfig {
    pub name: &'static str,
    pub grid_size: i32,
    pub time_limit_secs: u32,
}

pub fn get_reroute_config(difficulty: Difficulty) -> RerouteConfig {
    match difficulty {
        Difficulty::Low => RerouteConfig {
            name: "LOW COMPLEXITY",
            grid_size: 5,
            time_limit_secs: 120,
        },
        Difficulty::Standard => RerouteConfig {
            name: "STANDARD COMPLEXITY",
            grid_size: 7,
            time_limit_secs: 180,
        },
        Difficulty::High => RerouteConfig {
            name: "HIGH COMPLEXITY",
            grid_size: 9,
            time_limit_secs: 240,
        },
    }
}
