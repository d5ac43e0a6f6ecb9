//! Core game state machine.
//!
//! This module contains the `Game` struct, its status transitions and the
//! validation rules for joining and moving.

use crate::grid::{Grid, Mark, CELL_COUNT};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Identity of an authenticated player
pub type PlayerId = Uuid;

/// Identifier of a game
pub type GameId = Uuid;

/// Game status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    /// Created, waiting for a second player
    #[serde(rename = "WAITING")]
    Waiting,
    /// Player one to move
    #[serde(rename = "PLAYER_TURN_ONE")]
    TurnOne,
    /// Player two to move
    #[serde(rename = "PLAYER_TURN_TWO")]
    TurnTwo,
    /// Player one completed a line
    #[serde(rename = "PLAYER_WIN_ONE")]
    WinOne,
    /// Player two completed a line
    #[serde(rename = "PLAYER_WIN_TWO")]
    WinTwo,
    /// Grid filled without a line
    #[serde(rename = "DRAW")]
    Draw,
}

impl GameStatus {
    /// Wire name of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Waiting => "WAITING",
            GameStatus::TurnOne => "PLAYER_TURN_ONE",
            GameStatus::TurnTwo => "PLAYER_TURN_TWO",
            GameStatus::WinOne => "PLAYER_WIN_ONE",
            GameStatus::WinTwo => "PLAYER_WIN_TWO",
            GameStatus::Draw => "DRAW",
        }
    }

    /// Status in which `mark` is to move
    pub fn turn_of(mark: Mark) -> Self {
        match mark {
            Mark::One => GameStatus::TurnOne,
            Mark::Two => GameStatus::TurnTwo,
        }
    }

    /// Status in which `mark` has won
    pub fn win_of(mark: Mark) -> Self {
        match mark {
            Mark::One => GameStatus::WinOne,
            Mark::Two => GameStatus::WinTwo,
        }
    }

    /// Whose turn it is, if the game is in progress
    pub fn turn(&self) -> Option<Mark> {
        match self {
            GameStatus::TurnOne => Some(Mark::One),
            GameStatus::TurnTwo => Some(Mark::Two),
            _ => None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.turn().is_some()
    }

    /// Win or draw; no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GameStatus::WinOne | GameStatus::WinTwo | GameStatus::Draw
        )
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a join or move is rejected.
///
/// Every variant is a recoverable rejection: the game is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Wrong move, allowed squares are 0 to 8")]
    InvalidCellIndex,

    #[error("Someone already joined")]
    AlreadyJoined,

    #[error("Already joined as player one")]
    SelfJoin,

    #[error("Wrong game status")]
    GameNotInProgress,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Square already taken")]
    CellOccupied,
}

impl GameError {
    /// Stable reason code reported to clients
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidCellIndex => "INVALID_CELL_INDEX",
            GameError::AlreadyJoined => "ALREADY_JOINED",
            GameError::SelfJoin => "SELF_JOIN",
            GameError::GameNotInProgress => "GAME_NOT_IN_PROGRESS",
            GameError::NotYourTurn => "NOT_YOUR_TURN",
            GameError::CellOccupied => "CELL_OCCUPIED",
        }
    }

    /// The game cannot be joined (already full, or the joiner created it)
    pub fn is_not_joinable(&self) -> bool {
        matches!(self, GameError::AlreadyJoined | GameError::SelfJoin)
    }
}

/// Result of a move that was accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// The game goes on with the other player to move
    Continue { next: Mark },
    /// The mover completed a line
    Won { mark: Mark, line: [usize; 3] },
    /// The grid is full and nobody completed a line
    Draw,
}

/// A stored game whose seats, status and grid contradict each other
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidGame {
    #[error("status {0} requires a second player")]
    MissingPlayerTwo(GameStatus),

    #[error("waiting game already has a second player")]
    WaitingWithPlayerTwo,

    #[error("waiting game has marks on the grid")]
    WaitingWithMarks,

    #[error("player two is the creator")]
    SamePlayers,
}

/// A single game between two players.
///
/// Deserializing checks the seat/status/grid invariants, so a stored game
/// that could never have been produced by play is refused on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredGame")]
pub struct Game {
    pub id: GameId,
    /// Creator of the game
    pub player_one: PlayerId,
    /// Joiner, absent while the game is waiting
    pub player_two: Option<PlayerId>,
    pub grid: Grid,
    pub status: GameStatus,
}

/// Unchecked wire shape of a [`Game`]
#[derive(Deserialize)]
struct StoredGame {
    id: GameId,
    player_one: PlayerId,
    player_two: Option<PlayerId>,
    grid: Grid,
    status: GameStatus,
}

impl TryFrom<StoredGame> for Game {
    type Error = InvalidGame;

    fn try_from(stored: StoredGame) -> Result<Self, Self::Error> {
        let game = Game {
            id: stored.id,
            player_one: stored.player_one,
            player_two: stored.player_two,
            grid: stored.grid,
            status: stored.status,
        };
        game.validate()?;
        Ok(game)
    }
}

impl Game {
    /// Check that seats, status and grid agree
    pub fn validate(&self) -> Result<(), InvalidGame> {
        match (self.status, self.player_two) {
            (GameStatus::Waiting, Some(_)) => Err(InvalidGame::WaitingWithPlayerTwo),
            (GameStatus::Waiting, None) if self.grid.empty_cells().count() != CELL_COUNT => {
                Err(InvalidGame::WaitingWithMarks)
            }
            (GameStatus::Waiting, None) => Ok(()),
            (status, None) => Err(InvalidGame::MissingPlayerTwo(status)),
            (_, Some(two)) if two == self.player_one => Err(InvalidGame::SamePlayers),
            (_, Some(_)) => Ok(()),
        }
    }

    /// Create a waiting game owned by `creator`
    pub fn new(id: GameId, creator: PlayerId) -> Self {
        Self {
            id,
            player_one: creator,
            player_two: None,
            grid: Grid::new(),
            status: GameStatus::Waiting,
        }
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Waiting for a second player
    pub fn is_joinable(&self) -> bool {
        self.status == GameStatus::Waiting && self.player_two.is_none()
    }

    pub fn is_player(&self, player: PlayerId) -> bool {
        self.mark_of(player).is_some()
    }

    /// The mark `player` plays with in this game
    pub fn mark_of(&self, player: PlayerId) -> Option<Mark> {
        if player == self.player_one {
            Some(Mark::One)
        } else if self.player_two == Some(player) {
            Some(Mark::Two)
        } else {
            None
        }
    }

    /// The player seated with `mark`
    pub fn player(&self, mark: Mark) -> Option<PlayerId> {
        match mark {
            Mark::One => Some(self.player_one),
            Mark::Two => self.player_two,
        }
    }

    /// The player expected to move next
    pub fn current_player(&self) -> Option<PlayerId> {
        self.status.turn().and_then(|mark| self.player(mark))
    }

    /// Get the winner if the game was won
    pub fn winner(&self) -> Option<PlayerId> {
        match self.status {
            GameStatus::WinOne => self.player(Mark::One),
            GameStatus::WinTwo => self.player(Mark::Two),
            _ => None,
        }
    }

    /// Seat a second player and pick who moves first, uniformly at random.
    ///
    /// Returns the mark that moves first.
    pub fn join<R: Rng + ?Sized>(&mut self, player: PlayerId, rng: &mut R) -> Result<Mark, GameError> {
        self.validate_join(player)?;
        let first = if rng.gen_bool(0.5) { Mark::One } else { Mark::Two };
        self.seat(player, first);
        Ok(first)
    }

    /// Seat a second player with a fixed first mover
    pub fn join_with_first_turn(&mut self, player: PlayerId, first: Mark) -> Result<(), GameError> {
        self.validate_join(player)?;
        self.seat(player, first);
        Ok(())
    }

    fn validate_join(&self, player: PlayerId) -> Result<(), GameError> {
        if self.player_two.is_some() {
            return Err(GameError::AlreadyJoined);
        }
        if player == self.player_one {
            return Err(GameError::SelfJoin);
        }
        Ok(())
    }

    fn seat(&mut self, player: PlayerId, first: Mark) {
        self.player_two = Some(player);
        self.status = GameStatus::turn_of(first);
    }

    /// Place the acting player's mark on `cell`.
    ///
    /// All checks run before the grid is touched, so a rejected move leaves
    /// the game unchanged. A move that completes a line wins even when it
    /// also fills the grid.
    pub fn apply_move(&mut self, player: PlayerId, cell: usize) -> Result<MoveOutcome, GameError> {
        if cell >= CELL_COUNT {
            return Err(GameError::InvalidCellIndex);
        }

        let turn = self.status.turn().ok_or(GameError::GameNotInProgress)?;

        // a turn status with an empty second seat cannot be played to an end
        if self.player_two.is_none() {
            return Err(GameError::GameNotInProgress);
        }

        if self.player(turn) != Some(player) {
            return Err(GameError::NotYourTurn);
        }

        if !self.grid.place(cell, turn) {
            return Err(GameError::CellOccupied);
        }

        let outcome = if let Some(line) = self.grid.winning_line(turn) {
            self.status = GameStatus::win_of(turn);
            MoveOutcome::Won { mark: turn, line }
        } else if self.grid.is_full() {
            self.status = GameStatus::Draw;
            MoveOutcome::Draw
        } else {
            self.status = GameStatus::turn_of(turn.other());
            MoveOutcome::Continue { next: turn.other() }
        };

        Ok(outcome)
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.player_two {
            Some(two) => write!(f, "{} vs {} - {}", self.player_one, two, self.status),
            None => write!(f, "{} vs (open) - {}", self.player_one, self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn started_game(first: Mark) -> (Game, PlayerId, PlayerId) {
        let one = Uuid::new_v4();
        let two = Uuid::new_v4();
        let mut game = Game::new(Uuid::new_v4(), one);
        game.join_with_first_turn(two, first).unwrap();
        (game, one, two)
    }

    #[test]
    fn test_new_game_is_waiting() {
        let creator = Uuid::new_v4();
        let game = Game::new(Uuid::new_v4(), creator);
        assert_eq!(game.status, GameStatus::Waiting);
        assert_eq!(game.player_two, None);
        assert!(game.is_joinable());
        assert_eq!(game.current_player(), None);
    }

    #[test]
    fn test_join_picks_first_turn_from_rng() {
        let one = Uuid::new_v4();

        let mut game = Game::new(Uuid::new_v4(), one);
        let first = game.join(Uuid::new_v4(), &mut StepRng::new(0, 0)).unwrap();
        assert_eq!(first, Mark::One);
        assert_eq!(game.status, GameStatus::TurnOne);

        let mut game = Game::new(Uuid::new_v4(), one);
        let first = game
            .join(Uuid::new_v4(), &mut StepRng::new(u64::MAX, 0))
            .unwrap();
        assert_eq!(first, Mark::Two);
        assert_eq!(game.status, GameStatus::TurnTwo);
    }

    #[test]
    fn test_join_first_turn_hits_both_sides() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen_one = false;
        let mut seen_two = false;
        for _ in 0..64 {
            let mut game = Game::new(Uuid::new_v4(), Uuid::new_v4());
            match game.join(Uuid::new_v4(), &mut rng).unwrap() {
                Mark::One => seen_one = true,
                Mark::Two => seen_two = true,
            }
        }
        assert!(seen_one && seen_two);
    }

    #[test]
    fn test_join_rejections() {
        let (mut game, one, two) = started_game(Mark::One);
        let before = game.clone();

        assert_eq!(
            game.join_with_first_turn(Uuid::new_v4(), Mark::Two),
            Err(GameError::AlreadyJoined)
        );
        assert_eq!(game.join_with_first_turn(two, Mark::Two), Err(GameError::AlreadyJoined));
        assert_eq!(game, before);

        let mut fresh = Game::new(Uuid::new_v4(), one);
        assert_eq!(fresh.join_with_first_turn(one, Mark::One), Err(GameError::SelfJoin));
        assert!(fresh.is_joinable());
    }

    #[test]
    fn test_move_flips_turn() {
        let (mut game, one, two) = started_game(Mark::One);

        let outcome = game.apply_move(one, 1).unwrap();
        assert_eq!(outcome, MoveOutcome::Continue { next: Mark::Two });
        assert_eq!(game.status, GameStatus::TurnTwo);
        assert_eq!(game.current_player(), Some(two));

        game.apply_move(two, 0).unwrap();
        assert_eq!(game.status, GameStatus::TurnOne);
        assert_eq!(game.grid.get(0).and_then(|c| c.mark()), Some(Mark::Two));
        assert_eq!(game.grid.get(1).and_then(|c| c.mark()), Some(Mark::One));
    }

    #[test]
    fn test_move_precondition_order() {
        let (mut game, one, two) = started_game(Mark::One);

        // out-of-range index wins over wrong turn
        assert_eq!(game.apply_move(two, 9), Err(GameError::InvalidCellIndex));
        assert_eq!(game.apply_move(two, 4), Err(GameError::NotYourTurn));
        assert_eq!(game.apply_move(Uuid::new_v4(), 4), Err(GameError::NotYourTurn));

        game.apply_move(one, 4).unwrap();
        let before = game.clone();
        assert_eq!(game.apply_move(two, 4), Err(GameError::CellOccupied));
        assert_eq!(game, before);
    }

    #[test]
    fn test_move_on_waiting_game() {
        let one = Uuid::new_v4();
        let mut game = Game::new(Uuid::new_v4(), one);
        assert_eq!(game.apply_move(one, 0), Err(GameError::GameNotInProgress));
    }

    #[test]
    fn test_win_one() {
        let (mut game, one, _) = started_game(Mark::One);
        game.grid = Grid::try_from([1, 0, 1, 1, 2, 1, 2, 1, 2]).unwrap();

        let outcome = game.apply_move(one, 1).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Won {
                mark: Mark::One,
                line: [0, 1, 2]
            }
        );
        assert_eq!(game.status, GameStatus::WinOne);
        assert_eq!(game.winner(), Some(one));
    }

    #[test]
    fn test_draw() {
        let (mut game, _, two) = started_game(Mark::Two);
        game.grid = Grid::try_from([1, 0, 1, 1, 2, 1, 2, 1, 2]).unwrap();

        assert_eq!(game.apply_move(two, 1), Ok(MoveOutcome::Draw));
        assert_eq!(game.status, GameStatus::Draw);
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn test_win_two() {
        let (mut game, _, two) = started_game(Mark::Two);
        game.grid = Grid::try_from([2, 0, 2, 2, 1, 2, 1, 2, 1]).unwrap();

        game.apply_move(two, 1).unwrap();
        assert_eq!(game.status, GameStatus::WinTwo);
        assert_eq!(game.winner(), Some(two));
    }

    #[test]
    fn test_finished_game_rejects_moves() {
        let (mut game, one, two) = started_game(Mark::One);
        game.grid = Grid::try_from([1, 0, 1, 1, 2, 1, 2, 1, 2]).unwrap();
        game.apply_move(one, 1).unwrap();

        let before = game.clone();
        assert_eq!(game.apply_move(two, 1), Err(GameError::GameNotInProgress));
        assert_eq!(game.apply_move(one, 1), Err(GameError::GameNotInProgress));
        assert_eq!(game, before);
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&GameStatus::TurnTwo).unwrap();
        assert_eq!(json, "\"PLAYER_TURN_TWO\"");
        let status: GameStatus = serde_json::from_str("\"DRAW\"").unwrap();
        assert_eq!(status, GameStatus::Draw);
        assert_eq!(GameStatus::Waiting.to_string(), "WAITING");
    }

    #[test]
    fn test_game_serialization_shape() {
        let (game, one, two) = started_game(Mark::One);
        let value = serde_json::to_value(&game).unwrap();
        assert_eq!(value["player_one"], serde_json::json!(one));
        assert_eq!(value["player_two"], serde_json::json!(two));
        assert_eq!(value["grid"], serde_json::json!([0, 0, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(value["status"], "PLAYER_TURN_ONE");

        let waiting = Game::new(Uuid::new_v4(), one);
        let value = serde_json::to_value(&waiting).unwrap();
        assert!(value["player_two"].is_null());
    }

    #[test]
    fn test_move_needs_both_seats() {
        let one = Uuid::new_v4();
        let mut game = Game::new(Uuid::new_v4(), one);
        game.status = GameStatus::TurnOne;
        game.grid = Grid::try_from([1, 1, 0, 0, 0, 0, 0, 0, 0]).unwrap();

        let before = game.clone();
        assert_eq!(game.apply_move(one, 2), Err(GameError::GameNotInProgress));
        assert_eq!(game, before);
    }

    #[test]
    fn test_load_rejects_inconsistent_games() {
        let one = Uuid::new_v4();
        let two = Uuid::new_v4();
        let load = |player_two: Option<Uuid>, grid: [u8; 9], status: &str| {
            let value = serde_json::json!({
                "id": Uuid::new_v4(),
                "player_one": one,
                "player_two": player_two,
                "grid": grid,
                "status": status,
            });
            serde_json::from_value::<Game>(value)
        };

        for status in [
            "PLAYER_TURN_ONE",
            "PLAYER_TURN_TWO",
            "PLAYER_WIN_ONE",
            "PLAYER_WIN_TWO",
            "DRAW",
        ] {
            let err = load(None, [1, 1, 0, 0, 0, 0, 0, 0, 0], status).unwrap_err();
            assert!(err.to_string().contains("requires a second player"), "{}", err);
        }

        let err = load(Some(two), [0; 9], "WAITING").unwrap_err();
        assert!(err.to_string().contains("already has a second player"));

        let err = load(None, [0, 0, 0, 0, 1, 0, 0, 0, 0], "WAITING").unwrap_err();
        assert!(err.to_string().contains("marks on the grid"));

        let err = load(Some(one), [0; 9], "PLAYER_TURN_ONE").unwrap_err();
        assert!(err.to_string().contains("creator"));

        assert!(load(None, [0; 9], "WAITING").is_ok());
        assert!(load(Some(two), [1, 0, 0, 0, 0, 0, 0, 0, 0], "PLAYER_TURN_TWO").is_ok());
    }

    #[test]
    fn test_validate() {
        let (mut game, _, _) = started_game(Mark::One);
        assert_eq!(game.validate(), Ok(()));

        game.player_two = None;
        assert_eq!(
            game.validate(),
            Err(InvalidGame::MissingPlayerTwo(GameStatus::TurnOne))
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(GameError::CellOccupied.code(), "CELL_OCCUPIED");
        assert!(GameError::SelfJoin.is_not_joinable());
        assert!(GameError::AlreadyJoined.is_not_joinable());
        assert!(!GameError::NotYourTurn.is_not_joinable());
    }
}
