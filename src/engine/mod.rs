use crate::constants::{
    get_breach_config, BreachConfig, MOVE_DELAY_MS, PACKET_SCORE, PURSUER_CADENCE_BASE,
    PURSUER_REDIRECT_CHANCE,
};
use crate::maze::{first_path_cell, generate_maze, is_path, to_maze_init, Maze};
use crate::rng::Rng;
use crate::types::{
    Difficulty, Direction, GamePhase, MazeInit, PacketView, PlayerView, PursuerView, RuntimeEvent,
    Snapshot,
};

mod spawn;

/// Cap on gated logic ticks resolved inside one `step` call.
const MAX_CATCHUP_TICKS: u32 = 4;

#[derive(Clone, Debug)]
struct PursuerInternal {
    view: PursuerView,
    move_counter: u32,
}

/// One firewall-breach round: generated maze, the player, numbered packets,
/// and the antivirus pursuers, advanced by `step` at the host's cadence.
/// All randomness flows through the seeded generator, so a round replays
/// identically for a given seed and intent sequence.
#[derive(Clone, Debug)]
pub struct BreachEngine {
    pub config: BreachConfig,
    maze: Maze,
    rng: Rng,
    phase: GamePhase,
    player: PlayerView,
    desired_dir: Option<Direction>,
    pursuers: Vec<PursuerInternal>,
    packets: Vec<PacketView>,
    events: Vec<RuntimeEvent>,
    score: i32,
    next_ordinal: u32,
    collected: u32,
    elapsed_ms: u64,
    move_timer_ms: u64,
    tick_counter: u64,
}

impl BreachEngine {
    pub fn new(difficulty: Difficulty, seed: u32) -> Self {
        let config = get_breach_config(difficulty);
        let mut rng = Rng::new(seed);
        let maze = generate_maze(config.grid_size, &mut rng);
        let spawn = first_path_cell(&maze);

        let mut engine = Self {
            config,
            maze,
            rng,
            phase: GamePhase::Ready,
            player: PlayerView {
                x: spawn.x,
                y: spawn.y,
                dir: None,
            },
            desired_dir: None,
            pursuers: Vec::new(),
            packets: Vec::new(),
            events: Vec::new(),
            score: 0,
            next_ordinal: 1,
            collected: 0,
            elapsed_ms: 0,
            move_timer_ms: 0,
            tick_counter: 0,
        };
        engine.place_packets();
        engine.place_pursuers();
        engine
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.phase, GamePhase::Won | GamePhase::Lost)
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn get_maze_init(&self) -> MazeInit {
        to_maze_init(&self.maze)
    }

    /// Begins the round. A no-op outside the ready phase.
    pub fn start(&mut self) {
        if self.phase == GamePhase::Ready {
            self.phase = GamePhase::Playing;
        }
    }

    /// Held-direction intent from the input layer; `None` releases movement.
    pub fn set_desired_direction(&mut self, dir: Option<Direction>) {
        self.desired_dir = dir;
    }

    /// Advances the round by `dt_ms` of real time. Logic resolves in gated
    /// ticks of `MOVE_DELAY_MS`; render-rate callers simply accumulate time
    /// until the next gate elapses. Does nothing outside the playing phase.
    pub fn step(&mut self, dt_ms: u64) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        self.move_timer_ms = self.move_timer_ms.saturating_add(dt_ms);

        let mut safety = 0;
        while self.move_timer_ms >= MOVE_DELAY_MS && self.phase == GamePhase::Playing {
            self.move_timer_ms -= MOVE_DELAY_MS;
            safety += 1;
            if safety > MAX_CATCHUP_TICKS {
                break;
            }
            self.logic_tick();
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            elapsed_ms: self.elapsed_ms,
            phase: self.phase,
            score: self.score,
            next_ordinal: self.next_ordinal,
            collected_packets: self.collected,
            total_packets: self.total_packets(),
            player: self.player,
            pursuers: self.pursuers.iter().map(|p| p.view.clone()).collect(),
            packets: self.packets.clone(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    fn total_packets(&self) -> u32 {
        self.packets.len() as u32
    }

    fn logic_tick(&mut self) {
        self.tick_counter += 1;
        self.move_player();
        if self.phase != GamePhase::Playing {
            // A round won on this tick is not retroactively lost.
            return;
        }
        self.move_pursuers();
        self.resolve_capture();
    }

    fn move_player(&mut self) {
        let Some(dir) = self.desired_dir else {
            return;
        };
        let (nx, ny) = dir.offset(self.player.x, self.player.y);
        if !is_path(&self.maze, nx, ny) {
            return;
        }
        self.player.x = nx;
        self.player.y = ny;
        self.player.dir = Some(dir);
        self.collect_packet();
    }

    /// Ordered pickup: only the packet matching the running ordinal is
    /// consumed, anything else stays put for later.
    fn collect_packet(&mut self) {
        let x = self.player.x;
        let y = self.player.y;
        let expected = self.next_ordinal;
        let Some(packet) = self
            .packets
            .iter_mut()
            .find(|packet| packet.x == x && packet.y == y && !packet.collected)
        else {
            return;
        };
        if packet.ordinal != expected {
            return;
        }
        packet.collected = true;
        self.collected += 1;
        self.next_ordinal += 1;
        self.score += PACKET_SCORE;
        self.events.push(RuntimeEvent::PacketCollected {
            ordinal: expected,
            x,
            y,
        });
        if self.collected == self.total_packets() {
            self.phase = GamePhase::Won;
            self.events.push(RuntimeEvent::RoundWon { score: self.score });
        }
    }

    /// Each pursuer runs on its own counter cadence. Movement probes the
    /// current facing, rotating clockwise on a blocked cell, up to a full
    /// turn; a successful move re-rolls the facing with a small probability.
    fn move_pursuers(&mut self) {
        let cadence = PURSUER_CADENCE_BASE
            .saturating_sub(self.config.pursuer_speed)
            .max(1);
        for idx in 0..self.pursuers.len() {
            self.pursuers[idx].move_counter += 1;
            if self.pursuers[idx].move_counter < cadence {
                continue;
            }
            self.pursuers[idx].move_counter = 0;

            let mut dir = self.pursuers[idx].view.dir;
            for _ in 0..4 {
                let (nx, ny) = dir.offset(self.pursuers[idx].view.x, self.pursuers[idx].view.y);
                if is_path(&self.maze, nx, ny) {
                    self.pursuers[idx].view.x = nx;
                    self.pursuers[idx].view.y = ny;
                    if self.rng.bool(PURSUER_REDIRECT_CHANCE) {
                        dir = random_direction(&mut self.rng);
                    }
                    break;
                }
                dir = dir.clockwise();
            }
            self.pursuers[idx].view.dir = dir;
        }
    }

    fn resolve_capture(&mut self) {
        for pursuer in &self.pursuers {
            if pursuer.view.x == self.player.x && pursuer.view.y == self.player.y {
                self.phase = GamePhase::Lost;
                self.events.push(RuntimeEvent::RoundLost {
                    x: self.player.x,
                    y: self.player.y,
                });
                return;
            }
        }
    }
}

fn random_direction(rng: &mut Rng) -> Direction {
    match rng.int(0, 3) {
        0 => Direction::Up,
        1 => Direction::Right,
        2 => Direction::Down,
        _ => Direction::Left,
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::{MOVE_DELAY_MS, PURSUER_CADENCE_BASE};
    use crate::engine::BreachEngine;
    use crate::maze::is_path;
    use crate::rng::Rng;
    use crate::types::{Difficulty, Direction, GamePhase, PacketView, RuntimeEvent};

    fn started(difficulty: Difficulty, seed: u32) -> BreachEngine {
        let mut engine = BreachEngine::new(difficulty, seed);
        engine.start();
        engine
    }

    fn scripted_direction(rng: &mut Rng) -> Option<Direction> {
        match rng.int(0, 4) {
            0 => Some(Direction::Up),
            1 => Some(Direction::Right),
            2 => Some(Direction::Down),
            3 => Some(Direction::Left),
            _ => None,
        }
    }

    #[test]
    fn steps_before_start_do_not_advance_the_round() {
        let mut engine = BreachEngine::new(Difficulty::Low, 7);
        let before = engine.build_snapshot(false);
        engine.step(MOVE_DELAY_MS * 10);
        let after = engine.build_snapshot(false);
        assert_eq!(after.phase, GamePhase::Ready);
        assert_eq!(after.tick, before.tick);
        assert_eq!(after.elapsed_ms, 0);
    }

    #[test]
    fn same_seed_and_intents_replay_identically() {
        let mut a = started(Difficulty::Standard, 424_242);
        let mut b = started(Difficulty::Standard, 424_242);
        let mut script_a = Rng::new(99);
        let mut script_b = Rng::new(99);

        for _ in 0..400 {
            a.set_desired_direction(scripted_direction(&mut script_a));
            b.set_desired_direction(scripted_direction(&mut script_b));
            a.step(MOVE_DELAY_MS);
            b.step(MOVE_DELAY_MS);

            let sa = a.build_snapshot(false);
            let sb = b.build_snapshot(false);
            assert_eq!(sa.phase, sb.phase);
            assert_eq!(sa.score, sb.score);
            assert_eq!((sa.player.x, sa.player.y), (sb.player.x, sb.player.y));
            assert_eq!(sa.pursuers.len(), sb.pursuers.len());
            for (pa, pb) in sa.pursuers.iter().zip(sb.pursuers.iter()) {
                assert_eq!(pa.id, pb.id);
                assert_eq!((pa.x, pa.y), (pb.x, pb.y));
            }
            if a.is_ended() || b.is_ended() {
                assert_eq!(a.is_ended(), b.is_ended());
                break;
            }
        }
    }

    #[test]
    fn moves_into_walls_are_silently_rejected() {
        let mut engine = started(Difficulty::Low, 3);
        engine.player.x = 1;
        engine.player.y = 1;
        // (1,0) is border wall in every generated maze.
        engine.set_desired_direction(Some(Direction::Up));
        engine.move_player();
        assert_eq!((engine.player.x, engine.player.y), (1, 1));
        assert_eq!(engine.player.dir, None);
    }

    #[test]
    fn sub_gate_steps_accumulate_without_moving() {
        let mut engine = started(Difficulty::Low, 11);
        let start = (engine.player.x, engine.player.y);
        engine.set_desired_direction(Some(Direction::Down));
        engine.step(MOVE_DELAY_MS - 1);
        assert_eq!((engine.player.x, engine.player.y), start);
        assert_eq!(engine.tick_counter, 0);
        engine.step(1);
        assert_eq!(engine.tick_counter, 1);
    }

    #[test]
    fn packets_collect_only_in_ordinal_order() {
        let mut engine = started(Difficulty::Low, 5);
        engine.packets = vec![
            PacketView {
                x: 1,
                y: 1,
                ordinal: 1,
                collected: false,
            },
            PacketView {
                x: 3,
                y: 1,
                ordinal: 2,
                collected: false,
            },
        ];
        engine.next_ordinal = 1;
        engine.collected = 0;

        // Standing on packet #2 first changes nothing.
        engine.player.x = 3;
        engine.player.y = 1;
        engine.collect_packet();
        assert_eq!(engine.collected, 0);
        assert_eq!(engine.next_ordinal, 1);
        assert!(!engine.packets[1].collected);

        engine.player.x = 1;
        engine.player.y = 1;
        engine.collect_packet();
        assert_eq!(engine.collected, 1);
        assert_eq!(engine.next_ordinal, 2);

        engine.player.x = 3;
        engine.collect_packet();
        assert_eq!(engine.collected, 2);
        assert_eq!(engine.phase, GamePhase::Won);
        let events = engine.build_snapshot(true).events;
        assert!(events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::RoundWon { .. })));
    }

    #[test]
    fn capture_transitions_to_lost_exactly_once() {
        let mut engine = started(Difficulty::Low, 13);
        engine.set_desired_direction(None);
        let pursuer_count = engine.pursuers.len();
        assert!(pursuer_count > 0);
        engine.pursuers[0].view.x = engine.player.x;
        engine.pursuers[0].view.y = engine.player.y;
        // Keep the pursuer parked on this tick so the overlap survives.
        engine.pursuers[0].move_counter = 0;

        engine.step(MOVE_DELAY_MS);
        assert_eq!(engine.phase, GamePhase::Lost);
        let events = engine.build_snapshot(true).events;
        let losses = events
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::RoundLost { .. }))
            .count();
        assert_eq!(losses, 1);

        engine.step(MOVE_DELAY_MS * 8);
        assert_eq!(engine.phase, GamePhase::Lost);
        assert!(engine.build_snapshot(true).events.is_empty());
    }

    fn first_open_neighbor(engine: &BreachEngine) -> (Direction, i32, i32) {
        for dir in [
            Direction::Up,
            Direction::Right,
            Direction::Down,
            Direction::Left,
        ] {
            let (nx, ny) = dir.offset(engine.player.x, engine.player.y);
            if is_path(&engine.maze, nx, ny) {
                return (dir, nx, ny);
            }
        }
        panic!("player has no open neighbor");
    }

    #[test]
    fn winning_pickup_beats_a_same_tick_capture() {
        let mut engine = started(Difficulty::Low, 17);
        let (dir, nx, ny) = first_open_neighbor(&engine);
        // One packet left, on an adjacent open cell, with a pursuer parked
        // on it. The pickup resolves first, so the round is won.
        engine.packets = vec![PacketView {
            x: nx,
            y: ny,
            ordinal: 1,
            collected: false,
        }];
        engine.next_ordinal = 1;
        engine.collected = 0;
        engine.pursuers.truncate(1);
        engine.pursuers[0].view.x = nx;
        engine.pursuers[0].view.y = ny;
        engine.pursuers[0].move_counter = 0;

        engine.set_desired_direction(Some(dir));
        engine.step(MOVE_DELAY_MS);
        assert_eq!(engine.phase, GamePhase::Won);
    }

    #[test]
    fn pursuers_never_leave_path_cells() {
        for seed in 0..30u32 {
            let mut engine = started(Difficulty::Standard, seed);
            let mut script = Rng::new(seed.wrapping_mul(31));
            for _ in 0..600 {
                engine.set_desired_direction(scripted_direction(&mut script));
                engine.step(MOVE_DELAY_MS);
                for pursuer in &engine.pursuers {
                    assert!(
                        is_path(&engine.maze, pursuer.view.x, pursuer.view.y),
                        "pursuer off path: seed={seed}, pos=({},{})",
                        pursuer.view.x,
                        pursuer.view.y
                    );
                }
                if engine.is_ended() {
                    break;
                }
            }
        }
    }

    #[test]
    fn player_stays_on_path_cells_under_random_intents() {
        for seed in 0..30u32 {
            let mut engine = started(Difficulty::Low, seed);
            let mut script = Rng::new(seed.wrapping_add(1_000));
            for _ in 0..400 {
                engine.set_desired_direction(scripted_direction(&mut script));
                engine.step(MOVE_DELAY_MS);
                assert!(is_path(&engine.maze, engine.player.x, engine.player.y));
                if engine.is_ended() {
                    break;
                }
            }
        }
    }

    #[test]
    fn pursuers_move_only_on_their_cadence() {
        let mut engine = started(Difficulty::Low, 23);
        engine.set_desired_direction(None);
        let cadence = PURSUER_CADENCE_BASE - engine.config.pursuer_speed;
        let mut last = (engine.pursuers[0].view.x, engine.pursuers[0].view.y);
        for tick in 1..=40u32 {
            engine.step(MOVE_DELAY_MS);
            if engine.is_ended() {
                break;
            }
            let now = (engine.pursuers[0].view.x, engine.pursuers[0].view.y);
            if tick % cadence != 0 {
                assert_eq!(now, last, "pursuer moved off cadence at tick {tick}");
            }
            last = now;
        }
    }

    #[test]
    fn snapshot_drains_events_only_when_requested() {
        let mut engine = started(Difficulty::Low, 29);
        engine.events.push(RuntimeEvent::PacketCollected {
            ordinal: 1,
            x: 1,
            y: 1,
        });
        let kept = engine.build_snapshot(false);
        assert!(kept.events.is_empty());
        let drained = engine.build_snapshot(true);
        assert_eq!(drained.events.len(), 1);
        assert!(engine.build_snapshot(true).events.is_empty());
    }

    #[test]
    fn elapsed_time_stops_at_terminal_phase() {
        let mut engine = started(Difficulty::Low, 31);
        engine.pursuers[0].view.x = engine.player.x;
        engine.pursuers[0].view.y = engine.player.y;
        engine.step(MOVE_DELAY_MS);
        assert_eq!(engine.phase, GamePhase::Lost);
        let frozen = engine.elapsed_ms;
        engine.step(MOVE_DELAY_MS * 3);
        assert_eq!(engine.elapsed_ms, frozen);
    }
}
