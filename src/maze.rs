use crate::constants::EXTRA_OPENING_FACTOR;
use crate::rng::Rng;
use crate::types::{MazeInit, Vec2};

const WALL: u8 = b'#';
const PATH: u8 = b'.';

/// Immutable once generated; agents move over it but never alter it.
#[derive(Clone, Debug)]
pub struct Maze {
    pub size: i32,
    pub tiles: Vec<String>,
}

/// Carves a maze with randomized depth-first backtracking from (1,1), then
/// punches `EXTRA_OPENING_FACTOR * size` random shortcut openings. The
/// opening pass introduces cycles and runs exactly once per generation; it
/// only ever converts wall to path, never the reverse.
///
/// `requested_size` is clamped to at least 5 and rounded up to odd.
pub fn generate_maze(requested_size: i32, rng: &mut Rng) -> Maze {
    let size = normalize_size(requested_size);
    let mut grid: Vec<Vec<u8>> = vec![vec![WALL; size as usize]; size as usize];

    let mut stack = vec![Vec2 { x: 1, y: 1 }];
    grid[1][1] = PATH;

    while let Some(current) = stack.last().copied() {
        let neighbors = unvisited_neighbors(&grid, size, current);
        if neighbors.is_empty() {
            let _ = stack.pop();
            continue;
        }
        let next = neighbors[rng.pick_index(neighbors.len())];
        let between = Vec2 {
            x: current.x + (next.x - current.x) / 2,
            y: current.y + (next.y - current.y) / 2,
        };
        grid[between.y as usize][between.x as usize] = PATH;
        grid[next.y as usize][next.x as usize] = PATH;
        stack.push(next);
    }

    for _ in 0..(EXTRA_OPENING_FACTOR * size) {
        let x = rng.int(1, size - 2);
        let y = rng.int(1, size - 2);
        if grid[y as usize][x as usize] == WALL && adjacent_path_count(&grid, size, x, y) >= 2 {
            grid[y as usize][x as usize] = PATH;
        }
    }

    Maze {
        size,
        tiles: grid
            .into_iter()
            .map(|row| String::from_utf8(row).unwrap_or_default())
            .collect(),
    }
}

fn normalize_size(requested_size: i32) -> i32 {
    let clamped = requested_size.max(5);
    if clamped % 2 == 0 {
        clamped + 1
    } else {
        clamped
    }
}

/// Cells two steps away in each cardinal direction that are still uncarved
/// wall and strictly inside the border.
fn unvisited_neighbors(grid: &[Vec<u8>], size: i32, cell: Vec2) -> Vec<Vec2> {
    let mut neighbors = Vec::new();
    for (dx, dy) in [(0, -2), (2, 0), (0, 2), (-2, 0)] {
        let nx = cell.x + dx;
        let ny = cell.y + dy;
        if nx > 0 && nx < size - 1 && ny > 0 && ny < size - 1 {
            if grid[ny as usize][nx as usize] == WALL {
                neighbors.push(Vec2 { x: nx, y: ny });
            }
        }
    }
    neighbors
}

fn adjacent_path_count(grid: &[Vec<u8>], size: i32, x: i32, y: i32) -> u32 {
    let mut count = 0;
    for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
        let nx = x + dx;
        let ny = y + dy;
        if nx >= 0 && nx < size && ny >= 0 && ny < size {
            if grid[ny as usize][nx as usize] == PATH {
                count += 1;
            }
        }
    }
    count
}

pub fn is_path(maze: &Maze, x: i32, y: i32) -> bool {
    if x < 0 || y < 0 || x >= maze.size || y >= maze.size {
        return false;
    }
    maze.tiles
        .get(y as usize)
        .and_then(|row| row.as_bytes().get(x as usize))
        .map(|cell| *cell == PATH)
        .unwrap_or(false)
}

pub fn path_cells(maze: &Maze) -> Vec<Vec2> {
    let mut cells = Vec::new();
    for y in 0..maze.size {
        for x in 0..maze.size {
            if is_path(maze, x, y) {
                cells.push(Vec2 { x, y });
            }
        }
    }
    cells
}

/// Row-major scan for the first open cell; the player spawns here.
pub fn first_path_cell(maze: &Maze) -> Vec2 {
    for y in 1..maze.size {
        for x in 1..maze.size {
            if is_path(maze, x, y) {
                return Vec2 { x, y };
            }
        }
    }
    Vec2 { x: 1, y: 1 }
}

pub fn to_maze_init(maze: &Maze) -> MazeInit {
    MazeInit {
        size: maze.size,
        tiles: maze.tiles.clone(),
    }
}
