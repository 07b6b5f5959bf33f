//! Pre-built node-reroute boards, three per difficulty tier. Cells are
//! whitespace-separated tokens: `.` is an empty cell, otherwise a kind
//! letter (`I` straight, `L` corner, `T` tee, `X` cross) followed by a
//! rotation digit, with a `*` suffix marking the tile as locked.

use crate::circuit::{CircuitPuzzle, Tile, TileKind};
use crate::types::{Difficulty, Vec2};

pub const PUZZLES_PER_DIFFICULTY: usize = 3;

struct BoardLayout {
    rows: &'static [&'static str],
    source: (i32, i32),
    destination: (i32, i32),
}

const LOW_PUZZLES: [BoardLayout; PUZZLES_PER_DIFFICULTY] = [
    BoardLayout {
        rows: &[
            ".   .   I0  .   .",
            ".   L1  L2* .   .",
            "L0  L3  I0  L1  L2",
            ".   .   L0* L3  .",
            ".   .   I0  .   .",
        ],
        source: (2, 0),
        destination: (2, 4),
    },
    BoardLayout {
        rows: &[
            ".   .   I0  .   .",
            ".   L0  T2  L1* .",
            ".   I1  .   I0  .",
            ".   L3* I1  L2  .",
            ".   .   I0  .   .",
        ],
        source: (2, 0),
        destination: (2, 4),
    },
    BoardLayout {
        rows: &[
            ".   I0  .   .   .",
            "L0  L2* .   L0  L1",
            "I0  .   L0  L3  I0",
            "L3  L1* L2  .   I0",
            ".   .   .   .   I0",
        ],
        source: (1, 0),
        destination: (4, 4),
    },
];

const STANDARD_PUZZLES: [BoardLayout; PUZZLES_PER_DIFFICULTY] = [
    BoardLayout {
        rows: &[
            ".   .   .   I0  .   .   .",
            ".   L0  L1  T2  L1* L2  .",
            ".   I0  .   I0  .   I0  .",
            ".   L3  I1* X0  I1  L2  .",
            ".   .   .   I0  .   I0  .",
            ".   .   .   L3* I1  L2  .",
            ".   .   .   .   .   I0  .",
        ],
        source: (3, 0),
        destination: (5, 6),
    },
    BoardLayout {
        rows: &[
            ".   .   I0  .   .   .   .",
            ".   L0  T1  L1  L2* .   .",
            "L0  L3  .   L0  T2  L1  L2",
            "I0  .   .   I0* .   .   I0",
            "T0  I1  L1  L2  .   L3* L2",
            "L3  L1  L2  .   .   .   .",
            ".   .   I0  .   .   .   .",
        ],
        source: (2, 0),
        destination: (2, 6),
    },
    BoardLayout {
        rows: &[
            ".   .   .   .   I0  .   .",
            ".   L0  I1* L1  L2  .   .",
            "L0  L3  .   .   L3  L1  L2",
            "I0  .   L0  I1  L2* .   I0",
            "T0  L1  T1  L1  L2  .   I0",
            "L3* L1  L2  .   .   .   L3",
            ".   .   .   .   .   .   I0",
        ],
        source: (4, 0),
        destination: (6, 6),
    },
];

const HIGH_PUZZLES: [BoardLayout; PUZZLES_PER_DIFFICULTY] = [
    BoardLayout {
        rows: &[
            ".   .   .   .   I0  .   .   .   .",
            ".   L0  I1  L1  T2  L1* L2  .   .",
            ".   I0  .   .   L3  T1  L2  .   .",
            "L0  L2* .   L0  I1  L2  .   L0  L1",
            "I0  .   L0  T3  .   .   .   I0  I0",
            "T0  I1* T1  T1  L1  L2  .   L3  L2",
            "L3  L1  L2  .   .   .   L0* I1  .",
            ".   .   .   .   .   .   L3  L1  L2",
            ".   .   .   .   .   .   .   .   I0",
        ],
        source: (4, 0),
        destination: (8, 8),
    },
    BoardLayout {
        rows: &[
            ".   .   I0  .   .   .   .   .   .",
            ".   L0  T1  L1* L2  .   .   .   .",
            "L0  L3  .   .   L3  I1  L1  L2  .",
            "I0  .   L0  I1  T3  .   .   I0* .",
            "T0  I1  T1  L1  T2  I1  L1  L2  .",
            "L3* L1  L2  .   L3  L1  L2  .   .",
            ".   .   .   .   .   .   L3  L1  L2",
            ".   .   .   .   .   .   .   .   L3*",
            ".   .   .   .   .   .   .   .   I0",
        ],
        source: (2, 0),
        destination: (8, 8),
    },
    BoardLayout {
        rows: &[
            ".   .   .   I0  .   .   .   .   .",
            ".   .   L0  T1  L1  L2* .   .   .",
            ".   L0  X0  .   .   L3  I1  L1  L2",
            "L0  T1  L2  .   L0  L3  .   .   I0",
            "I0* .   .   L0  X0  L1  L2  .   I0",
            "T0  I1  L1* T1  T1  L2  .   .   L3",
            "L3  L1  L2  .   .   .   .   .   L3",
            ".   .   .   .   .   .   .   .   L3",
            ".   .   .   .   .   .   .   .   I0",
        ],
        source: (3, 0),
        destination: (8, 8),
    },
];

pub fn puzzle_set(difficulty: Difficulty) -> Vec<CircuitPuzzle> {
    let layouts = match difficulty {
        Difficulty::Low => &LOW_PUZZLES,
        Difficulty::Standard => &STANDARD_PUZZLES,
        Difficulty::High => &HIGH_PUZZLES,
    };
    layouts.iter().map(build_puzzle).collect()
}

pub fn puzzle(difficulty: Difficulty, index: usize) -> Option<CircuitPuzzle> {
    puzzle_set(difficulty).into_iter().nth(index)
}

fn build_puzzle(layout: &BoardLayout) -> CircuitPuzzle {
    let size = layout.rows.len() as i32;
    let mut cells = Vec::with_capacity((size * size) as usize);
    for row in layout.rows {
        let mut parsed = 0;
        for token in row.split_whitespace().take(size as usize) {
            cells.push(parse_token(token));
            parsed += 1;
        }
        for _ in parsed..size {
            cells.push(None);
        }
    }
    CircuitPuzzle::new(
        size,
        cells,
        Vec2 {
            x: layout.source.0,
            y: layout.source.1,
        },
        Vec2 {
            x: layout.destination.0,
            y: layout.destination.1,
        },
    )
}

/// Unknown tokens parse as empty cells.
fn parse_token(token: &str) -> Option<Tile> {
    let bytes = token.as_bytes();
    let kind = match bytes.first()? {
        b'I' => TileKind::Straight,
        b'L' => TileKind::Corner,
        b'T' => TileKind::Tee,
        b'X' => TileKind::Cross,
        _ => return None,
    };
    let rotation = match bytes.get(1) {
        Some(digit @ b'0'..=b'3') => digit - b'0',
        _ => return None,
    };
    let locked = bytes.get(2) == Some(&b'*');
    Some(Tile {
        kind,
        rotation,
        locked,
    })
}
