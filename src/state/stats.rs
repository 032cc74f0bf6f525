//! Game statistics.
//!
//! Stored state is deliberately small: the single best turn ever banked and
//! per-player farkle tallies. The aggregate display values (average score,
//! total farkles, turns played) are recomputed from the player ledger on
//! demand so they cannot drift out of sync.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::player::Player;

/// Best single non-farkle turn ever banked this game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighestTurn {
    pub score: u32,
    pub player_name: String,
}

/// Tracked statistics. `highest_turn.score` only ever increases; farkle
/// tallies only ever grow (undo restores a whole prior copy instead of
/// decrementing).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub highest_turn: HighestTurn,
    pub farkle_counts: BTreeMap<String, u32>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh statistics for a roster, with every farkle tally zeroed.
    pub fn for_roster(players: &[Player]) -> Self {
        let farkle_counts = players
            .iter()
            .map(|player| (player.name.clone(), 0))
            .collect();
        Self {
            highest_turn: HighestTurn::default(),
            farkle_counts,
        }
    }

    /// Record a scored turn. Returns true when this set a new record; ties
    /// leave the standing record in place.
    pub fn record_turn_score(&mut self, player_name: &str, value: u32) -> bool {
        if value > self.highest_turn.score {
            self.highest_turn = HighestTurn {
                score: value,
                player_name: player_name.to_string(),
            };
            true
        } else {
            false
        }
    }

    /// Bump a player's farkle tally.
    pub fn record_farkle(&mut self, player_name: &str) {
        *self.farkle_counts.entry(player_name.to_string()).or_insert(0) += 1;
    }

    /// Total farkles across all players.
    pub fn total_farkles(&self) -> u32 {
        self.farkle_counts.values().sum()
    }

    /// Average banked score among on-board players, rounded to the nearest
    /// integer. `None` until somebody is on the board.
    pub fn average_on_board_score(players: &[Player]) -> Option<u32> {
        let on_board: Vec<&Player> = players.iter().filter(|p| p.on_board).collect();
        if on_board.is_empty() {
            return None;
        }
        let sum: u32 = on_board.iter().map(|p| p.score).sum();
        Some((f64::from(sum) / on_board.len() as f64).round() as u32)
    }

    /// Total turns taken across all players, farkles included.
    pub fn total_turns(players: &[Player]) -> u32 {
        players.iter().map(|p| p.turns_taken() as u32).sum()
    }

    /// Statistics panel snapshot for clients.
    pub fn to_json(&self, players: &[Player]) -> serde_json::Value {
        serde_json::json!({
            "highest_turn": {
                "score": self.highest_turn.score,
                "player_name": self.highest_turn.player_name
            },
            "average_score": Self::average_on_board_score(players),
            "total_farkles": self.total_farkles(),
            "turns_played": Self::total_turns(players)
        })
    }
}
