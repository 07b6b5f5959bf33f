use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::types::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Straight,
    Corner,
    Tee,
    Cross,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub kind: TileKind,
    pub rotation: u8,
    pub locked: bool,
}

/// Fixed per-kind connection table, indexed by rotation. Order is
/// `[north, east, south, west]`. `Cross` is rotation-invariant, `Straight`
/// alternates on rotation parity, `Corner` and `Tee` rotate cyclically.
pub fn connections(kind: TileKind, rotation: u8) -> [bool; 4] {
    let rot = (rotation % 4) as usize;
    match kind {
        TileKind::Straight => [
            [true, false, true, false],
            [false, true, false, true],
            [true, false, true, false],
            [false, true, false, true],
        ][rot],
        TileKind::Corner => [
            [true, true, false, false],
            [false, true, true, false],
            [false, false, true, true],
            [true, false, false, true],
        ][rot],
        TileKind::Tee => [
            [true, true, true, false],
            [false, true, true, true],
            [true, false, true, true],
            [true, true, false, true],
        ][rot],
        TileKind::Cross => [
            [true, true, true, true],
            [true, true, true, true],
            [true, true, true, true],
            [true, true, true, true],
        ][rot],
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VerifyResult {
    pub connected: bool,
    /// Cells in BFS discovery order. Meaningful as the "active flow" set
    /// only when `connected` is true.
    pub visited: Vec<Vec2>,
}

/// One reroute board: a square grid of optional tiles plus fixed endpoints.
/// Rotations mutate in place during play; the layout itself never changes.
#[derive(Clone, Debug)]
pub struct CircuitPuzzle {
    size: i32,
    cells: Vec<Option<Tile>>,
    source: Vec2,
    destination: Vec2,
}

impl CircuitPuzzle {
    pub fn new(size: i32, cells: Vec<Option<Tile>>, source: Vec2, destination: Vec2) -> Self {
        let mut cells = cells;
        cells.resize((size.max(0) as usize).pow(2), None);
        Self {
            size,
            cells,
            source,
            destination,
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn source(&self) -> Vec2 {
        self.source
    }

    pub fn destination(&self) -> Vec2 {
        self.destination
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<Tile> {
        self.index(x, y).and_then(|idx| self.cells[idx])
    }

    /// Rotates the tile at `(x, y)` a quarter turn clockwise. Locked tiles,
    /// empty cells, and out-of-bounds coordinates are silent no-ops.
    pub fn rotate(&mut self, x: i32, y: i32) {
        let Some(idx) = self.index(x, y) else {
            return;
        };
        if let Some(tile) = self.cells[idx].as_mut() {
            if !tile.locked {
                tile.rotation = (tile.rotation + 1) % 4;
            }
        }
    }

    /// Breadth-first reachability from source to destination. A step between
    /// orthogonal neighbors requires both touching sides open; empty cells
    /// have no connections at all. Pure and idempotent: repeated calls with
    /// unchanged rotations return identical results.
    pub fn verify(&self) -> VerifyResult {
        let mut visited_order = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        visited_order.push(self.source);
        let _ = visited.insert((self.source.x, self.source.y));
        queue.push_back(self.source);

        while let Some(current) = queue.pop_front() {
            let Some(tile) = self.tile(current.x, current.y) else {
                continue;
            };
            let open = connections(tile.kind, tile.rotation);
            for (side, (dx, dy)) in [(0, (0, -1)), (1, (1, 0)), (2, (0, 1)), (3, (-1, 0))] {
                if !open[side] {
                    continue;
                }
                let nx = current.x + dx;
                let ny = current.y + dy;
                if nx < 0 || ny < 0 || nx >= self.size || ny >= self.size {
                    continue;
                }
                if visited.contains(&(nx, ny)) {
                    continue;
                }
                let Some(neighbor) = self.tile(nx, ny) else {
                    continue;
                };
                if !connections(neighbor.kind, neighbor.rotation)[(side + 2) % 4] {
                    continue;
                }
                let _ = visited.insert((nx, ny));
                let cell = Vec2 { x: nx, y: ny };
                visited_order.push(cell);
                queue.push_back(cell);
                if nx == self.destination.x && ny == self.destination.y {
                    return VerifyResult {
                        connected: true,
                        visited: visited_order,
                    };
                }
            }
        }

        VerifyResult {
            connected: false,
            visited: visited_order,
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.size || y >= self.size {
            return None;
        }
        Some((y * self.size + x) as usize)
    }
}
