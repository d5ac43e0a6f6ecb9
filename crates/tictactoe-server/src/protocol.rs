//! WebSocket protocol messages for tic-tac-toe matches.

use serde::{Deserialize, Serialize};
use tictactoe_core::{Game, GameEvent, Stats};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Continue as a previously welcomed player on this connection
    Resume { player_id: Uuid },

    /// Open a new game as player one
    CreateGame,

    /// Take the open seat in a game
    JoinGame { game_id: Uuid },

    /// Place a mark; `square` is validated server side
    Move {
        game_id: Uuid,
        #[serde(default)]
        square: serde_json::Value,
    },

    /// Request the games this player can join
    ListGames,

    /// Request every game this player takes part in
    MyGames,

    /// Request a single game
    GetGame { game_id: Uuid },

    /// Request stats, for this player when `player_id` is absent
    GetStats {
        #[serde(default)]
        player_id: Option<Uuid>,
    },

    /// Request stats for every known player
    ListStats,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned player ID
    Welcome { player_id: Uuid },

    /// Game created successfully
    GameCreated { game: Game },

    /// A game this player takes part in changed
    GameUpdated { game: Game, events: Vec<GameEvent> },

    /// Requested game
    GameState { game: Game },

    /// Games open for joining
    GameList { games: Vec<Game> },

    /// Player statistics
    Stats { stats: Stats },

    /// Statistics of every known player
    StatsList { stats: Vec<Stats> },

    /// The game rules refused a join or move
    Rejected { code: String, message: String },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}
