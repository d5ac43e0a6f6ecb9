//! Match lifecycle: create, join and move.
//!
//! These functions validate an intent against a game, mutate it, and return
//! the events plus the stat credits the caller must apply. They never touch
//! storage; the caller persists the game and applies the credits together
//! while it holds the game exclusively.

use crate::actions::GameEvent;
use crate::game::{Game, GameError, GameId, GameStatus, MoveOutcome, PlayerId};
use crate::stats::{outcome_credits, StatCredit, StatKind};
use rand::Rng;

/// What an accepted intent produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub events: Vec<GameEvent>,
    pub credits: Vec<StatCredit>,
}

impl Transition {
    /// True if this transition finished the game
    pub fn is_terminal(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, GameEvent::GameWon { .. } | GameEvent::GameDrawn))
    }
}

/// Open a new game owned by `creator`.
pub fn create_game(id: GameId, creator: PlayerId) -> (Game, Transition) {
    let game = Game::new(id, creator);
    let transition = Transition {
        events: vec![GameEvent::GameCreated { game: id, creator }],
        credits: vec![StatCredit::new(creator, StatKind::Created)],
    };
    (game, transition)
}

/// Seat `player` as player two; the first mover is drawn from `rng`.
pub fn join_game<R: Rng + ?Sized>(
    game: &mut Game,
    player: PlayerId,
    rng: &mut R,
) -> Result<Transition, GameError> {
    game.join(player, rng)?;

    Ok(Transition {
        events: vec![GameEvent::PlayerJoined {
            game: game.id,
            player,
            first_turn: game.status,
        }],
        credits: vec![StatCredit::new(player, StatKind::Joined)],
    })
}

/// Apply a move for `player`; a terminal move also yields outcome credits.
pub fn submit_move(game: &mut Game, player: PlayerId, cell: usize) -> Result<Transition, GameError> {
    let outcome = game.apply_move(player, cell)?;

    let mut events = Vec::with_capacity(2);
    if let Some(mark) = game.mark_of(player) {
        events.push(GameEvent::MarkPlaced { player, cell, mark });
    }

    match outcome {
        MoveOutcome::Continue { .. } => {}
        MoveOutcome::Won { line, .. } => {
            events.push(GameEvent::GameWon {
                winner: player,
                line,
            });
        }
        MoveOutcome::Draw => events.push(GameEvent::GameDrawn),
    }

    // only the move that ends the game reaches here with a terminal status
    let credits = if game.status.is_terminal() {
        outcome_credits(game)
    } else {
        Vec::new()
    };

    Ok(Transition { events, credits })
}

/// The first-turn status a join produced, for callers that only keep events
pub fn first_turn(transition: &Transition) -> Option<GameStatus> {
    transition.events.iter().find_map(|e| match e {
        GameEvent::PlayerJoined { first_turn, .. } => Some(*first_turn),
        _ => None,
    })
}
