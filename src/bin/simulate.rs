use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use breach_minigames::circuit::{connections, CircuitPuzzle, Tile, TileKind};
use breach_minigames::constants::MOVE_DELAY_MS;
use breach_minigames::engine::BreachEngine;
use breach_minigames::maze::{is_path, Maze};
use breach_minigames::puzzles::puzzle_set;
use breach_minigames::rng::Rng;
use breach_minigames::types::{Difficulty, Direction, GamePhase, Snapshot};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use rand::Rng as _;
use serde::Serialize;
use serde_json::{json, Value};

const TICK_SAFETY_LIMIT: u64 = 20_000;
const REROUTE_FUZZ_ROTATIONS: usize = 64;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Run a single difficulty tier instead of the full matrix.
    #[arg(long)]
    difficulty: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
    /// Breach rounds per scenario.
    #[arg(long)]
    rounds: Option<u32>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    difficulty: Difficulty,
    seed: u32,
    rounds: u32,
    won: u32,
    lost: u32,
    stalled: u32,
    #[serde(rename = "totalTicks")]
    total_ticks: u64,
    #[serde(rename = "totalScore")]
    total_score: i64,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, u32>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let base_seed = normalize_seed(cli.seed.unwrap_or_else(|| rand::rng().random::<u64>()));
    let rounds = cli.rounds.unwrap_or(3).clamp(1, 100);
    let difficulties: Vec<Difficulty> = match cli.difficulty.as_deref() {
        Some(raw) => match Difficulty::parse(raw) {
            Some(difficulty) => vec![difficulty],
            None => {
                eprintln!("unknown difficulty '{raw}' (expected low|standard|high)");
                std::process::exit(2);
            }
        },
        None => Difficulty::all().to_vec(),
    };

    let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| format!("sim-{base_seed}-{}", now_ms()));

    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, u32> = BTreeMap::new();
    let mut total_anomalies = 0usize;

    for (index, difficulty) in difficulties.iter().enumerate() {
        let seed = base_seed.wrapping_add(index as u32);

        let breach = run_breach_scenario(&match_id, *difficulty, seed, rounds);
        *outcome_counts.entry("won".to_string()).or_insert(0) += breach.result.won;
        *outcome_counts.entry("lost".to_string()).or_insert(0) += breach.result.lost;
        *outcome_counts.entry("stalled".to_string()).or_insert(0) += breach.result.stalled;
        total_anomalies += breach.anomaly_records.len();
        print_result_line(&breach.result);
        scenario_results.push(breach.result);

        let reroute = run_reroute_scenario(&match_id, *difficulty, seed);
        total_anomalies += reroute.anomaly_records.len();
        print_result_line(&reroute.result);
        scenario_results.push(reroute.result);
    }

    let finished_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let summary = RunSummary {
        match_id: match_id.clone(),
        started_at,
        finished_at,
        scenario_count: scenario_results.len(),
        anomaly_count: total_anomalies,
        outcome_counts,
        scenarios: scenario_results,
    };

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "outcomeCounts": summary.outcome_counts,
        }),
    );

    if summary.anomaly_count > 0 {
        std::process::exit(1);
    }
}

struct ScenarioRun {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

fn run_breach_scenario(
    match_id: &str,
    difficulty: Difficulty,
    seed: u32,
    rounds: u32,
) -> ScenarioRun {
    let scenario = format!("breach-{}", difficulty_key(difficulty));
    emit_log(
        "info",
        "scenario_started",
        match_id,
        Some(&scenario),
        Some(seed),
        None,
        json!({ "rounds": rounds }),
    );

    let mut won = 0;
    let mut lost = 0;
    let mut stalled = 0;
    let mut total_ticks = 0u64;
    let mut total_score = 0i64;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    for round in 0..rounds {
        let round_seed = seed.wrapping_add(round.wrapping_mul(7_919));
        let mut engine = BreachEngine::new(difficulty, round_seed);
        engine.start();

        let mut previous_collected = 0u32;
        let mut last_tick = 0u64;
        loop {
            let snapshot = engine.build_snapshot(false);
            let steer = autopilot_direction(engine.maze(), &snapshot);
            engine.set_desired_direction(steer);
            engine.step(MOVE_DELAY_MS);

            let snapshot = engine.build_snapshot(true);
            last_tick = snapshot.tick;
            for message in collect_snapshot_anomalies(engine.maze(), &snapshot, previous_collected)
            {
                push_anomaly(
                    &mut anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    snapshot.tick,
                    message,
                );
            }
            previous_collected = snapshot.collected_packets;

            if engine.is_ended() {
                match snapshot.phase {
                    GamePhase::Won => won += 1,
                    GamePhase::Lost => lost += 1,
                    _ => {}
                }
                total_score += snapshot.score as i64;
                break;
            }
            if snapshot.tick >= TICK_SAFETY_LIMIT {
                stalled += 1;
                push_anomaly(
                    &mut anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    snapshot.tick,
                    "tick safety limit exceeded".to_string(),
                );
                break;
            }
        }
        total_ticks += last_tick;

        emit_log(
            "info",
            "round_finished",
            match_id,
            Some(&scenario),
            Some(round_seed),
            Some(last_tick),
            json!({ "round": round, "phase": engine.phase() }),
        );
    }

    ScenarioRun {
        result: ScenarioResultLine {
            scenario,
            difficulty,
            seed,
            rounds,
            won,
            lost,
            stalled,
            total_ticks,
            total_score,
            anomalies,
        },
        anomaly_records,
    }
}

/// Consistency probes over the authored reroute boards: verify idempotence,
/// locked-tile immutability under rotation fuzz, and the rotation-invariant
/// cross table.
fn run_reroute_scenario(match_id: &str, difficulty: Difficulty, seed: u32) -> ScenarioRun {
    let scenario = format!("reroute-{}", difficulty_key(difficulty));
    emit_log(
        "info",
        "scenario_started",
        match_id,
        Some(&scenario),
        Some(seed),
        None,
        Value::Null,
    );

    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut rng = Rng::new(seed);

    for rotation in 0..4u8 {
        if connections(TileKind::Cross, rotation) != [true, true, true, true] {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                0,
                format!("cross tile not open on all sides at rotation {rotation}"),
            );
        }
    }

    for (index, mut board) in puzzle_set(difficulty).into_iter().enumerate() {
        let first = board.verify();
        let second = board.verify();
        if first != second {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                0,
                format!("verify not idempotent on board {index}"),
            );
        }

        let locked_before: Vec<_> = board_tiles(&board)
            .into_iter()
            .filter(|(_, _, tile)| tile.locked)
            .collect();
        for _ in 0..REROUTE_FUZZ_ROTATIONS {
            let x = rng.int(0, board.size() - 1);
            let y = rng.int(0, board.size() - 1);
            board.rotate(x, y);
        }
        let _ = board.verify();
        let locked_after: Vec<_> = board_tiles(&board)
            .into_iter()
            .filter(|(_, _, tile)| tile.locked)
            .collect();
        if locked_before != locked_after {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                0,
                format!("locked tiles changed under rotation fuzz on board {index}"),
            );
        }
    }

    ScenarioRun {
        result: ScenarioResultLine {
            scenario,
            difficulty,
            seed,
            rounds: 0,
            won: 0,
            lost: 0,
            stalled: 0,
            total_ticks: 0,
            total_score: 0,
            anomalies,
        },
        anomaly_records,
    }
}

fn board_tiles(board: &CircuitPuzzle) -> Vec<(i32, i32, Tile)> {
    let mut tiles = Vec::new();
    for y in 0..board.size() {
        for x in 0..board.size() {
            if let Some(tile) = board.tile(x, y) {
                tiles.push((x, y, tile));
            }
        }
    }
    tiles
}

/// Steers the player along the shortest open route toward the next expected
/// packet. Releases movement when nothing is left to chase.
fn autopilot_direction(maze: &Maze, snapshot: &Snapshot) -> Option<Direction> {
    let target = snapshot
        .packets
        .iter()
        .find(|packet| !packet.collected && packet.ordinal == snapshot.next_ordinal)?;
    bfs_first_step(
        maze,
        (snapshot.player.x, snapshot.player.y),
        (target.x, target.y),
    )
}

fn bfs_first_step(maze: &Maze, start: (i32, i32), goal: (i32, i32)) -> Option<Direction> {
    if start == goal {
        return None;
    }
    let mut prev: HashMap<(i32, i32), ((i32, i32), Direction)> = HashMap::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    let _ = seen.insert(start);
    queue.push_back(start);

    while let Some((x, y)) = queue.pop_front() {
        for dir in [
            Direction::Up,
            Direction::Right,
            Direction::Down,
            Direction::Left,
        ] {
            let (nx, ny) = dir.offset(x, y);
            if !is_path(maze, nx, ny) || !seen.insert((nx, ny)) {
                continue;
            }
            let _ = prev.insert((nx, ny), ((x, y), dir));
            if (nx, ny) == goal {
                let mut cursor = goal;
                let mut first = dir;
                while let Some(&(parent, step)) = prev.get(&cursor) {
                    first = step;
                    if parent == start {
                        return Some(first);
                    }
                    cursor = parent;
                }
                return Some(first);
            }
            queue.push_back((nx, ny));
        }
    }
    None
}

fn collect_snapshot_anomalies(
    maze: &Maze,
    snapshot: &Snapshot,
    previous_collected: u32,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    if !is_path(maze, snapshot.player.x, snapshot.player.y) {
        anomalies.push(format!(
            "player off path at ({},{})",
            snapshot.player.x, snapshot.player.y
        ));
    }
    for pursuer in &snapshot.pursuers {
        if !is_path(maze, pursuer.x, pursuer.y) {
            anomalies.push(format!(
                "pursuer {} off path at ({},{})",
                pursuer.id, pursuer.x, pursuer.y
            ));
        }
    }
    if snapshot.collected_packets < previous_collected {
        anomalies.push(format!(
            "collected count regressed: {} -> {}",
            previous_collected, snapshot.collected_packets
        ));
    }
    if snapshot.next_ordinal != snapshot.collected_packets + 1 {
        anomalies.push(format!(
            "ordinal skew: next={} collected={}",
            snapshot.next_ordinal, snapshot.collected_packets
        ));
    }
    if snapshot.collected_packets > snapshot.total_packets {
        anomalies.push(format!(
            "collected exceeds total: {}/{}",
            snapshot.collected_packets, snapshot.total_packets
        ));
    }
    anomalies
}

fn print_result_line(result: &ScenarioResultLine) {
    match serde_json::to_string(result) {
        Ok(line) => println!("{line}"),
        Err(error) => eprintln!("failed to serialize scenario result: {error}"),
    }
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn difficulty_key(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Low => "low",
        Difficulty::Standard => "standard",
        Difficulty::High => "high",
    }
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let text = serde_json::to_string_pretty(summary)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
    std::fs::write(path, text)
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    match serde_json::to_string(&line) {
        Ok(text) => eprintln!("{text}"),
        Err(error) => eprintln!("failed to serialize log line: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{autopilot_direction, bfs_first_step, collect_snapshot_anomalies, normalize_seed};
    use breach_minigames::constants::MOVE_DELAY_MS;
    use breach_minigames::engine::BreachEngine;
    use breach_minigames::maze::{generate_maze, is_path};
    use breach_minigames::rng::Rng;
    use breach_minigames::types::{Difficulty, GamePhase};

    #[test]
    fn bfs_reaches_any_open_cell() {
        let maze = generate_maze(15, &mut Rng::new(9));
        let mut target = (1, 1);
        'scan: for y in (1..maze.size).rev() {
            for x in (1..maze.size).rev() {
                if is_path(&maze, x, y) {
                    target = (x, y);
                    break 'scan;
                }
            }
        }
        let first = bfs_first_step(&maze, (1, 1), target);
        assert!(first.is_some());
    }

    #[test]
    fn bfs_returns_none_when_already_on_goal() {
        let maze = generate_maze(9, &mut Rng::new(4));
        assert!(bfs_first_step(&maze, (1, 1), (1, 1)).is_none());
    }

    #[test]
    fn autopilot_rounds_terminate() {
        for seed in 0..10u32 {
            let mut engine = BreachEngine::new(Difficulty::Low, seed);
            engine.start();
            let mut ticks = 0u64;
            while !engine.is_ended() {
                let snapshot = engine.build_snapshot(false);
                let steer = autopilot_direction(engine.maze(), &snapshot);
                engine.set_desired_direction(steer);
                engine.step(MOVE_DELAY_MS);
                ticks += 1;
                assert!(ticks < 20_000, "round failed to terminate, seed={seed}");
            }
            let phase = engine.phase();
            assert!(matches!(phase, GamePhase::Won | GamePhase::Lost));
        }
    }

    #[test]
    fn clean_snapshots_raise_no_anomalies() {
        let mut engine = BreachEngine::new(Difficulty::Low, 12);
        engine.start();
        engine.step(MOVE_DELAY_MS);
        let snapshot = engine.build_snapshot(false);
        let anomalies = collect_snapshot_anomalies(engine.maze(), &snapshot, 0);
        assert!(anomalies.is_empty(), "unexpected anomalies: {anomalies:?}");
    }

    #[test]
    fn seed_normalization_truncates_to_32_bits() {
        assert_eq!(normalize_seed(0x1_0000_0001), 1);
    }
}
