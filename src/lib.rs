//! Core logic for the breach minigame arcade: procedural firewall mazes with
//! antivirus pursuit, and rotatable node-reroute circuit puzzles. Binaries in
//! `src/bin` provide a headless simulation harness and a terminal shell.

pub mod circuit;
pub mod constants;
pub mod engine;
pub mod maze;
pub mod puzzles;
pub mod rng;
pub mod types;
