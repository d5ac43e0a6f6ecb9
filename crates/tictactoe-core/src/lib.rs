//! Tic-tac-toe match engine
//!
//! This crate provides the core game logic for two-player tic-tac-toe
//! matches, including:
//! - The 3x3 grid and winning line detection
//! - Game status machine with turn and move validation
//! - Match lifecycle (create, join, move) with stat credits
//! - Per-player win/loss/draw statistics
//!
//! # Architecture
//!
//! The engine does no I/O. Callers resolve identities and load games, hand
//! them to the [`coordinator`] functions, then persist the updated game and
//! apply the returned [`StatCredit`]s as one unit.
//!
//! # Modules
//!
//! - [`grid`]: Cells, marks and winning lines
//! - [`game`]: Game state machine and rejection reasons
//! - [`coordinator`]: Create, join and move intents
//! - [`stats`]: Player statistics
//! - [`actions`]: Move payload parsing and events

pub mod actions;
pub mod coordinator;
pub mod game;
pub mod grid;
pub mod stats;

// Re-export commonly used types
pub use actions::{parse_square, GameEvent};
pub use coordinator::{create_game, join_game, submit_move, Transition};
pub use game::{Game, GameError, GameId, GameStatus, InvalidGame, MoveOutcome, PlayerId};
pub use grid::{Cell, Grid, Mark, CELL_COUNT, WINNING_LINES};
pub use stats::{init_stats, outcome_credits, StatCredit, StatKind, Stats};
