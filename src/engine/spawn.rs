use super::*;

use crate::constants::{PACKET_EXCLUSION_RADIUS, PURSUER_EXCLUSION_RADIUS};
use crate::maze::path_cells;
use crate::types::Vec2;

impl BreachEngine {
    /// Scatters a difficulty-sized batch of numbered packets over shuffled
    /// open cells outside the exclusion box around the player spawn.
    /// Ordinals are a dense 1..=N permutation over the chosen cells.
    pub(super) fn place_packets(&mut self) {
        let count = self.rng.int(
            self.config.min_packets as i32,
            self.config.max_packets as i32,
        ) as usize;
        let mut candidates = self.spawn_candidates(PACKET_EXCLUSION_RADIUS);
        self.rng.shuffle(&mut candidates);

        self.packets = candidates
            .into_iter()
            .take(count)
            .enumerate()
            .map(|(idx, cell)| PacketView {
                x: cell.x,
                y: cell.y,
                ordinal: idx as u32 + 1,
                collected: false,
            })
            .collect();
    }

    /// Drops the antivirus pursuers on shuffled open cells well away from
    /// the player spawn, each with a random initial facing.
    pub(super) fn place_pursuers(&mut self) {
        let mut candidates = self.spawn_candidates(PURSUER_EXCLUSION_RADIUS);
        self.rng.shuffle(&mut candidates);

        let mut pursuers = Vec::new();
        for (idx, cell) in candidates
            .into_iter()
            .take(self.config.pursuer_count)
            .enumerate()
        {
            let dir = random_direction(&mut self.rng);
            pursuers.push(PursuerInternal {
                view: PursuerView {
                    id: format!("av_{}", idx + 1),
                    x: cell.x,
                    y: cell.y,
                    dir,
                },
                move_counter: 0,
            });
        }
        self.pursuers = pursuers;
    }

    /// Open cells outside the per-axis exclusion box around the player.
    fn spawn_candidates(&self, radius: i32) -> Vec<Vec2> {
        path_cells(&self.maze)
            .into_iter()
            .filter(|cell| {
                (cell.x - self.player.x).abs() > radius || (cell.y - self.player.y).abs() > radius
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::{
        get_breach_config, PACKET_EXCLUSION_RADIUS, PURSUER_EXCLUSION_RADIUS,
    };
    use crate::engine::BreachEngine;
    use crate::maze::is_path;
    use crate::types::Difficulty;

    #[test]
    fn packet_ordinals_are_a_dense_permutation() {
        for seed in 0..60u32 {
            let engine = BreachEngine::new(Difficulty::Standard, seed);
            let snapshot_count = engine.packets.len() as u32;
            let mut ordinals: Vec<u32> = engine.packets.iter().map(|p| p.ordinal).collect();
            ordinals.sort_unstable();
            assert_eq!(ordinals, (1..=snapshot_count).collect::<Vec<u32>>());
        }
    }

    #[test]
    fn packet_count_respects_difficulty_bounds() {
        for difficulty in Difficulty::all() {
            let config = get_breach_config(difficulty);
            for seed in 0..40u32 {
                let engine = BreachEngine::new(difficulty, seed);
                let count = engine.packets.len() as u32;
                assert!(count >= config.min_packets);
                assert!(count <= config.max_packets);
            }
        }
    }

    #[test]
    fn packets_spawn_on_path_outside_the_exclusion_box() {
        for seed in 0..60u32 {
            let engine = BreachEngine::new(Difficulty::Low, seed);
            for packet in &engine.packets {
                assert!(is_path(&engine.maze, packet.x, packet.y));
                assert!(!packet.collected);
                let near_x = (packet.x - engine.player.x).abs() <= PACKET_EXCLUSION_RADIUS;
                let near_y = (packet.y - engine.player.y).abs() <= PACKET_EXCLUSION_RADIUS;
                assert!(!(near_x && near_y), "packet inside exclusion box");
            }
        }
    }

    #[test]
    fn packet_cells_are_distinct() {
        for seed in 0..60u32 {
            let engine = BreachEngine::new(Difficulty::High, seed);
            let mut cells: Vec<(i32, i32)> =
                engine.packets.iter().map(|p| (p.x, p.y)).collect();
            cells.sort_unstable();
            cells.dedup();
            assert_eq!(cells.len(), engine.packets.len());
        }
    }

    #[test]
    fn pursuers_spawn_far_from_the_player() {
        for difficulty in Difficulty::all() {
            let config = get_breach_config(difficulty);
            for seed in 0..40u32 {
                let engine = BreachEngine::new(difficulty, seed);
                assert_eq!(engine.pursuers.len(), config.pursuer_count);
                for pursuer in &engine.pursuers {
                    assert!(is_path(&engine.maze, pursuer.view.x, pursuer.view.y));
                    let near_x =
                        (pursuer.view.x - engine.player.x).abs() <= PURSUER_EXCLUSION_RADIUS;
                    let near_y =
                        (pursuer.view.y - engine.player.y).abs() <= PURSUER_EXCLUSION_RADIUS;
                    assert!(!(near_x && near_y), "pursuer inside exclusion box");
                }
            }
        }
    }
}
