//! Move payload parsing and the events produced by accepted intents.

use crate::game::{GameError, GameId, GameStatus, PlayerId};
use crate::grid::{Mark, CELL_COUNT};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parse the `square` of a move payload into a cell index.
///
/// Accepts a JSON integer or a string holding one (form posts send strings).
/// Anything else, or a value outside `0..=8`, is `InvalidCellIndex`.
pub fn parse_square(square: &Value) -> Result<usize, GameError> {
    let index = match square {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    index
        .and_then(|i| usize::try_from(i).ok())
        .filter(|&i| i < CELL_COUNT)
        .ok_or(GameError::InvalidCellIndex)
}

/// Events that occur as a result of accepted intents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A game was opened
    GameCreated { game: GameId, creator: PlayerId },

    /// A second player took the open seat
    PlayerJoined {
        game: GameId,
        player: PlayerId,
        first_turn: GameStatus,
    },

    /// A mark was placed on the grid
    MarkPlaced {
        player: PlayerId,
        cell: usize,
        mark: Mark,
    },

    /// The mover completed a line
    GameWon {
        winner: PlayerId,
        line: [usize; 3],
    },

    /// The grid filled without a line
    GameDrawn,
}
