use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use breach_minigames::circuit::{connections, CircuitPuzzle};
use breach_minigames::constants::{get_reroute_config, TICK_MS};
use breach_minigames::engine::BreachEngine;
use breach_minigames::puzzles::puzzle_set;
use breach_minigames::types::{Difficulty, Direction, GamePhase, Snapshot, Vec2};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use rand::Rng as _;

struct TerminalGuard {
    stdout: Stdout,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, Hide)?;
        Ok(Self { stdout })
    }

    fn stdout(&mut self) -> &mut Stdout {
        &mut self.stdout
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> io::Result<()> {
    let mut term = TerminalGuard::enter()?;
    loop {
        match main_menu(&mut term)? {
            MenuChoice::Breach => {
                if let Some(difficulty) = difficulty_menu(&mut term, "FIREWALL BREACH")? {
                    run_breach(&mut term, difficulty)?;
                }
            }
            MenuChoice::Reroute => {
                if let Some(difficulty) = difficulty_menu(&mut term, "NODE REROUTE")? {
                    run_reroute(&mut term, difficulty)?;
                }
            }
            MenuChoice::Quit => return Ok(()),
        }
    }
}

enum MenuChoice {
    Breach,
    Reroute,
    Quit,
}

fn main_menu(term: &mut TerminalGuard) -> io::Result<MenuChoice> {
    let out = term.stdout();
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    queue!(out, SetForegroundColor(Color::Green))?;
    queue!(out, Print("== BREACH CONSOLE =="), MoveTo(0, 2))?;
    queue!(out, Print("  1. FIREWALL BREACH  - extract packets, evade antivirus"))?;
    queue!(out, MoveTo(0, 3))?;
    queue!(out, Print("  2. NODE REROUTE     - rotate nodes, restore the data stream"))?;
    queue!(out, MoveTo(0, 5), Print("  select 1-2, q to quit"), ResetColor)?;
    out.flush()?;

    loop {
        if let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        {
            match code {
                KeyCode::Char('1') => return Ok(MenuChoice::Breach),
                KeyCode::Char('2') => return Ok(MenuChoice::Reroute),
                KeyCode::Char('q') | KeyCode::Esc => return Ok(MenuChoice::Quit),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(MenuChoice::Quit)
                }
                _ => {}
            }
        }
    }
}

fn difficulty_menu(term: &mut TerminalGuard, title: &str) -> io::Result<Option<Difficulty>> {
    let out = term.stdout();
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    queue!(out, SetForegroundColor(Color::Green))?;
    queue!(out, Print(format!("== {title} ==")), MoveTo(0, 2))?;
    queue!(out, Print("  1. LOW"), MoveTo(0, 3))?;
    queue!(out, Print("  2. STANDARD"), MoveTo(0, 4))?;
    queue!(out, Print("  3. HIGH"), MoveTo(0, 6))?;
    queue!(out, Print("  select 1-3, esc to go back"), ResetColor)?;
    out.flush()?;

    loop {
        if let Event::Key(KeyEvent { code, .. }) = event::read()? {
            match code {
                KeyCode::Char('1') => return Ok(Some(Difficulty::Low)),
                KeyCode::Char('2') => return Ok(Some(Difficulty::Standard)),
                KeyCode::Char('3') => return Ok(Some(Difficulty::High)),
                KeyCode::Esc | KeyCode::Char('q') => return Ok(None),
                _ => {}
            }
        }
    }
}

fn run_breach(term: &mut TerminalGuard, difficulty: Difficulty) -> io::Result<()> {
    loop {
        let seed = rand::rng().random::<u32>();
        let mut engine = BreachEngine::new(difficulty, seed);

        draw_breach_frame(term, &mut engine, "READY TO BREACH - press enter")?;
        loop {
            if let Event::Key(KeyEvent { code, .. }) = event::read()? {
                match code {
                    KeyCode::Enter => break,
                    KeyCode::Esc | KeyCode::Char('q') => return Ok(()),
                    _ => {}
                }
            }
        }
        engine.start();

        let mut last = Instant::now();
        while !engine.is_ended() {
            while event::poll(Duration::from_millis(0))? {
                if let Event::Key(KeyEvent { code, .. }) = event::read()? {
                    match code {
                        KeyCode::Up => engine.set_desired_direction(Some(Direction::Up)),
                        KeyCode::Right => engine.set_desired_direction(Some(Direction::Right)),
                        KeyCode::Down => engine.set_desired_direction(Some(Direction::Down)),
                        KeyCode::Left => engine.set_desired_direction(Some(Direction::Left)),
                        KeyCode::Char(' ') => engine.set_desired_direction(None),
                        KeyCode::Esc | KeyCode::Char('q') => return Ok(()),
                        _ => {}
                    }
                }
            }

            let dt = last.elapsed();
            last = Instant::now();
            engine.step(dt.as_millis() as u64);
            draw_breach_frame(term, &mut engine, "BREACHING... arrows move, space stops")?;
            std::thread::sleep(Duration::from_millis(TICK_MS));
        }

        let banner = match engine.phase() {
            GamePhase::Won => "ACCESS GRANTED - all packets extracted. r to rerun, esc for menu",
            _ => "ACCESS DENIED - antivirus detection. r to retry, esc for menu",
        };
        draw_breach_frame(term, &mut engine, banner)?;
        loop {
            if let Event::Key(KeyEvent { code, .. }) = event::read()? {
                match code {
                    KeyCode::Char('r') => break,
                    KeyCode::Esc | KeyCode::Char('q') => return Ok(()),
                    _ => {}
                }
            }
        }
    }
}

fn draw_breach_frame(
    term: &mut TerminalGuard,
    engine: &mut BreachEngine,
    status: &str,
) -> io::Result<()> {
    let snapshot = engine.build_snapshot(false);
    let maze = engine.get_maze_init();
    let config = engine.config;
    let out = term.stdout();

    queue!(out, MoveTo(0, 0), Clear(ClearType::CurrentLine))?;
    queue!(out, SetForegroundColor(Color::Green))?;
    queue!(
        out,
        Print(format!(
            "{}  packets {}/{}  next #{}  score {}",
            config.name,
            snapshot.collected_packets,
            snapshot.total_packets,
            snapshot.next_ordinal,
            snapshot.score
        ))
    )?;

    for (row_idx, row) in maze.tiles.iter().enumerate() {
        queue!(out, MoveTo(0, row_idx as u16 + 2), Clear(ClearType::CurrentLine))?;
        for (col_idx, cell) in row.bytes().enumerate() {
            let x = col_idx as i32;
            let y = row_idx as i32;
            let glyph = breach_cell_glyph(&snapshot, x, y, cell);
            queue!(out, SetForegroundColor(glyph.1), Print(glyph.0))?;
        }
    }

    let status_row = maze.size as u16 + 3;
    queue!(out, MoveTo(0, status_row), Clear(ClearType::CurrentLine))?;
    queue!(out, SetForegroundColor(Color::Green), Print(status), ResetColor)?;
    out.flush()
}

fn breach_cell_glyph(snapshot: &Snapshot, x: i32, y: i32, cell: u8) -> (char, Color) {
    if snapshot.player.x == x && snapshot.player.y == y {
        return ('@', Color::Green);
    }
    if snapshot
        .pursuers
        .iter()
        .any(|pursuer| pursuer.x == x && pursuer.y == y)
    {
        return ('X', Color::Red);
    }
    if let Some(packet) = snapshot
        .packets
        .iter()
        .find(|packet| !packet.collected && packet.x == x && packet.y == y)
    {
        let digit = char::from_digit(packet.ordinal % 10, 10).unwrap_or('?');
        let color = if packet.ordinal == snapshot.next_ordinal {
            Color::Green
        } else {
            Color::DarkGreen
        };
        return (digit, color);
    }
    if cell == b'#' {
        ('#', Color::DarkGreen)
    } else {
        (' ', Color::Reset)
    }
}

/// Header line state for the reroute screen.
struct RerouteHud<'a> {
    tier_name: &'a str,
    deadline: Instant,
    index: usize,
    total: usize,
}

fn run_reroute(term: &mut TerminalGuard, difficulty: Difficulty) -> io::Result<()> {
    let config = get_reroute_config(difficulty);
    let boards = puzzle_set(difficulty);
    let total = boards.len();

    for (index, mut board) in boards.into_iter().enumerate() {
        let deadline = Instant::now() + Duration::from_secs(config.time_limit_secs as u64);
        let hud = RerouteHud {
            tier_name: config.name,
            deadline,
            index,
            total,
        };
        let mut cursor = board.source();
        let mut flow: Vec<Vec2> = Vec::new();
        let mut status = format!("puzzle {}/{total} - enter rotates, v verifies", index + 1);

        let solved = loop {
            if Instant::now() >= deadline {
                draw_reroute_frame(term, &board, cursor, &flow, &hud,
                    "ACCESS DENIED - time expired. any key for menu")?;
                let _ = event::read()?;
                return Ok(());
            }

            draw_reroute_frame(term, &board, cursor, &flow, &hud, &status)?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(KeyEvent { code, .. }) = event::read()? {
                    match code {
                        KeyCode::Up => cursor.y = (cursor.y - 1).max(0),
                        KeyCode::Down => cursor.y = (cursor.y + 1).min(board.size() - 1),
                        KeyCode::Left => cursor.x = (cursor.x - 1).max(0),
                        KeyCode::Right => cursor.x = (cursor.x + 1).min(board.size() - 1),
                        KeyCode::Enter | KeyCode::Char(' ') => {
                            board.rotate(cursor.x, cursor.y);
                            flow.clear();
                        }
                        KeyCode::Char('v') => {
                            let result = board.verify();
                            if result.connected {
                                flow = result.visited;
                                break true;
                            }
                            flow.clear();
                            status = "INVALID PATH - connection not established".to_string();
                        }
                        KeyCode::Char('n') => break false,
                        KeyCode::Esc | KeyCode::Char('q') => return Ok(()),
                        _ => {}
                    }
                }
            }
        };

        if solved {
            let done = if index + 1 == total {
                "CONNECTION ESTABLISHED - all streams rerouted. any key for menu"
            } else {
                "CONNECTION ESTABLISHED - any key for next node"
            };
            draw_reroute_frame(term, &board, cursor, &flow, &hud, done)?;
            let _ = event::read()?;
        }
    }
    Ok(())
}

fn draw_reroute_frame(
    term: &mut TerminalGuard,
    board: &CircuitPuzzle,
    cursor: Vec2,
    flow: &[Vec2],
    hud: &RerouteHud<'_>,
    status: &str,
) -> io::Result<()> {
    let remaining = hud
        .deadline
        .saturating_duration_since(Instant::now())
        .as_secs();
    let out = term.stdout();

    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    queue!(out, SetForegroundColor(Color::Green))?;
    queue!(
        out,
        Print(format!(
            "{}  puzzle {}/{}  {}:{:02}",
            hud.tier_name,
            hud.index + 1,
            hud.total,
            remaining / 60,
            remaining % 60
        ))
    )?;

    for y in 0..board.size() {
        queue!(out, MoveTo(0, y as u16 + 2))?;
        for x in 0..board.size() {
            let under_cursor = cursor.x == x && cursor.y == y;
            let in_flow = flow.iter().any(|cell| cell.x == x && cell.y == y);
            let endpoint = board.source() == (Vec2 { x, y }) || board.destination() == (Vec2 { x, y });

            let (glyph, mut color) = match board.tile(x, y) {
                Some(tile) => {
                    let open = connections(tile.kind, tile.rotation);
                    let color = if tile.locked {
                        Color::DarkYellow
                    } else {
                        Color::DarkGreen
                    };
                    (tile_glyph(open), color)
                }
                None => (' ', Color::Reset),
            };
            if in_flow {
                color = Color::Green;
            }
            if endpoint {
                color = Color::Cyan;
            }

            let (left, right) = if under_cursor { ('[', ']') } else { (' ', ' ') };
            queue!(
                out,
                SetForegroundColor(Color::Grey),
                Print(left),
                SetForegroundColor(color),
                Print(glyph),
                SetForegroundColor(Color::Grey),
                Print(right)
            )?;
        }
    }

    let status_row = board.size() as u16 + 3;
    queue!(out, MoveTo(0, status_row), Clear(ClearType::CurrentLine))?;
    queue!(out, SetForegroundColor(Color::Green), Print(status))?;
    queue!(
        out,
        MoveTo(0, status_row + 1),
        Print("arrows move cursor, enter rotates, v verifies, n skips, esc quits"),
        ResetColor
    )?;
    out.flush()
}

/// Box-drawing glyph for a connection vector ordered north, east, south, west.
fn tile_glyph(open: [bool; 4]) -> char {
    match open {
        [true, false, true, false] => '│',
        [false, true, false, true] => '─',
        [true, true, false, false] => '└',
        [false, true, true, false] => '┌',
        [false, false, true, true] => '┐',
        [true, false, false, true] => '┘',
        [true, true, true, false] => '├',
        [false, true, true, true] => '┬',
        [true, false, true, true] => '┤',
        [true, true, false, true] => '┴',
        [true, true, true, true] => '┼',
        _ => '·',
    }
}

#[cfg(test)]
mod tests {
    use super::tile_glyph;
    use breach_minigames::circuit::{connections, TileKind};

    #[test]
    fn every_tile_kind_maps_to_a_drawable_glyph() {
        for kind in [
            TileKind::Straight,
            TileKind::Corner,
            TileKind::Tee,
            TileKind::Cross,
        ] {
            for rotation in 0..4u8 {
                assert_ne!(tile_glyph(connections(kind, rotation)), '·');
            }
        }
    }

    #[test]
    fn straight_rotations_alternate_bar_direction() {
        assert_eq!(tile_glyph(connections(TileKind::Straight, 0)), '│');
        assert_eq!(tile_glyph(connections(TileKind::Straight, 1)), '─');
    }
}
