//! In-memory store of games and player stats.
//!
//! Each game lives in its own map entry; holding the entry serializes every
//! intent against that game. Stats are credited one player at a time through
//! their own entries. Lock order is always game, then stats.

use dashmap::DashMap;
use rand::Rng;
use serde_json::Value;
use thiserror::Error;
use tictactoe_core::coordinator::{self, Transition};
use tictactoe_core::{init_stats, parse_square, Game, GameError, GameEvent, GameId, PlayerId, Stats};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LobbyError {
    /// The game rules refused the intent
    #[error("{0}")]
    Rejected(#[from] GameError),

    #[error("Game not found")]
    GameNotFound,

    /// A participant has no stats record; nothing was changed
    #[error("No stats record for player {0}")]
    StatsMissing(PlayerId),
}

/// An accepted join or move: the updated game and what happened
#[derive(Debug, Clone)]
pub struct Update {
    pub game: Game,
    pub events: Vec<GameEvent>,
}

pub struct Lobby {
    games: DashMap<GameId, Game>,
    stats: DashMap<PlayerId, Stats>,
}

impl Lobby {
    pub fn new() -> Self {
        Self {
            games: DashMap::new(),
            stats: DashMap::new(),
        }
    }

    /// Create the stats record for a player seen for the first time.
    ///
    /// Returns `true` if the player was new.
    pub fn register(&self, player: PlayerId) -> bool {
        let mut created = false;
        self.stats.entry(player).or_insert_with(|| {
            created = true;
            init_stats(player)
        });
        if created {
            debug!("Registered stats for {}", player);
        }
        created
    }

    /// Open a new game for `creator`
    pub fn create_game(&self, creator: PlayerId) -> Result<Game, LobbyError> {
        self.ensure_stats(&[creator])?;

        let (game, transition) = coordinator::create_game(Uuid::new_v4(), creator);
        self.games.insert(game.id, game.clone());
        self.apply_credits(&transition);

        info!("Game {} created by {}", game.id, creator);
        Ok(game)
    }

    /// Seat `player` in an open game
    pub fn join_game<R: Rng + ?Sized>(
        &self,
        game_id: GameId,
        player: PlayerId,
        rng: &mut R,
    ) -> Result<Update, LobbyError> {
        let mut game = self.games.get_mut(&game_id).ok_or(LobbyError::GameNotFound)?;
        self.ensure_stats(&[player])?;

        let transition = coordinator::join_game(&mut game, player, rng)?;
        self.apply_credits(&transition);

        info!(
            "Player {} joined game {}, first turn {:?}",
            player,
            game_id,
            coordinator::first_turn(&transition)
        );
        Ok(Update {
            game: game.value().clone(),
            events: transition.events,
        })
    }

    /// Play `square` for `player`; `square` is the raw payload value
    pub fn submit_move(
        &self,
        game_id: GameId,
        player: PlayerId,
        square: &Value,
    ) -> Result<Update, LobbyError> {
        let cell = parse_square(square)?;

        let mut game = self.games.get_mut(&game_id).ok_or(LobbyError::GameNotFound)?;
        let mut participants = vec![game.player_one];
        participants.extend(game.player_two);
        self.ensure_stats(&participants)?;

        let transition = coordinator::submit_move(&mut game, player, cell)?;
        self.apply_credits(&transition);

        debug!("Player {} played {} in game {}", player, cell, game_id);
        if transition.is_terminal() {
            info!("Game {} finished: {}", game_id, game.status);
        }
        Ok(Update {
            game: game.value().clone(),
            events: transition.events,
        })
    }

    /// Waiting games that `requester` did not create
    pub fn joinable_games(&self, requester: PlayerId) -> Vec<Game> {
        self.games
            .iter()
            .filter(|g| g.is_joinable() && g.player_one != requester)
            .map(|g| g.value().clone())
            .collect()
    }

    /// Every game `player` takes part in
    pub fn games_of(&self, player: PlayerId) -> Vec<Game> {
        self.games
            .iter()
            .filter(|g| g.is_player(player))
            .map(|g| g.value().clone())
            .collect()
    }

    pub fn game(&self, game_id: GameId) -> Option<Game> {
        self.games.get(&game_id).map(|g| g.value().clone())
    }

    pub fn stats(&self, player: PlayerId) -> Option<Stats> {
        self.stats.get(&player).map(|s| s.value().clone())
    }

    /// True once `register` has run for `player`
    pub fn is_registered(&self, player: PlayerId) -> bool {
        self.stats.contains_key(&player)
    }

    /// Stats of every registered player
    pub fn all_stats(&self) -> Vec<Stats> {
        self.stats.iter().map(|s| s.value().clone()).collect()
    }

    fn ensure_stats(&self, players: &[PlayerId]) -> Result<(), LobbyError> {
        match players.iter().find(|p| !self.stats.contains_key(*p)) {
            Some(&missing) => Err(LobbyError::StatsMissing(missing)),
            None => Ok(()),
        }
    }

    fn apply_credits(&self, transition: &Transition) {
        for credit in &transition.credits {
            // records are never removed, and presence was checked before mutating
            if let Some(mut stats) = self.stats.get_mut(&credit.player) {
                stats.credit(credit.kind);
            }
        }
    }
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new()
    }
}
