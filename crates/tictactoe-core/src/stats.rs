//! Per-player statistics.
//!
//! Counters only ever go up, one credit at a time. Terminal credits for a
//! game are derived from its final status by [`outcome_credits`].

use crate::game::{Game, GameStatus, PlayerId};
use serde::{Deserialize, Serialize};

/// Cumulative counters for one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub player: PlayerId,
    /// Games created
    #[serde(default)]
    pub created: u32,
    /// Games joined as player two
    #[serde(default)]
    pub joined: u32,
    #[serde(default)]
    pub won: u32,
    #[serde(default)]
    pub lost: u32,
    #[serde(default)]
    pub draw: u32,
}

/// Which counter a credit increments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Created,
    Joined,
    Won,
    Lost,
    Draw,
}

/// A single +1 on one player's counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCredit {
    pub player: PlayerId,
    pub kind: StatKind,
}

impl StatCredit {
    pub fn new(player: PlayerId, kind: StatKind) -> Self {
        Self { player, kind }
    }
}

impl Stats {
    /// Zeroed stats for a player
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            created: 0,
            joined: 0,
            won: 0,
            lost: 0,
            draw: 0,
        }
    }

    /// Increment one counter
    pub fn credit(&mut self, kind: StatKind) {
        let counter = match kind {
            StatKind::Created => &mut self.created,
            StatKind::Joined => &mut self.joined,
            StatKind::Won => &mut self.won,
            StatKind::Lost => &mut self.lost,
            StatKind::Draw => &mut self.draw,
        };
        *counter = counter.saturating_add(1);
    }

    /// Apply a credit addressed to this player; credits for others are ignored.
    ///
    /// Returns whether the credit was applied.
    pub fn apply(&mut self, credit: &StatCredit) -> bool {
        if credit.player != self.player {
            return false;
        }
        self.credit(credit.kind);
        true
    }

    /// Number of finished games
    pub fn played(&self) -> u32 {
        self.won.saturating_add(self.lost).saturating_add(self.draw)
    }
}

/// Create the stats record for a newly registered player.
///
/// Called once per identity by whoever handles registration.
pub fn init_stats(player: PlayerId) -> Stats {
    Stats::new(player)
}

/// Terminal credits for a finished game: one for each player.
///
/// Empty for games that are not finished.
pub fn outcome_credits(game: &Game) -> Vec<StatCredit> {
    let Some(two) = game.player_two else {
        return Vec::new();
    };
    let one = game.player_one;

    match game.status {
        GameStatus::WinOne => vec![
            StatCredit::new(one, StatKind::Won),
            StatCredit::new(two, StatKind::Lost),
        ],
        GameStatus::WinTwo => vec![
            StatCredit::new(two, StatKind::Won),
            StatCredit::new(one, StatKind::Lost),
        ],
        GameStatus::Draw => vec![
            StatCredit::new(one, StatKind::Draw),
            StatCredit::new(two, StatKind::Draw),
        ],
        GameStatus::Waiting | GameStatus::TurnOne | GameStatus::TurnTwo => Vec::new(),
    }
}
