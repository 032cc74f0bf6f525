//! Snapshot history for undo.
//!
//! A LIFO stack of full-state copies. A snapshot is pushed immediately
//! *before* each turn-mutating action, never after, so popping one is
//! exactly "the state as of before the last scoring action". Depth is
//! unbounded; a session's turn count bounds it in practice.

use super::game::GameState;
use super::stats::Stats;

/// A point-in-time deep copy of the full game state.
///
/// Everything inside is owned, so the copy shares no mutable structure with
/// the live state it was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub game: GameState,
    pub stats: Stats,
}

/// Stack of pre-mutation snapshots.
#[derive(Debug, Default)]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the live state and push it.
    pub fn record(&mut self, game: &GameState, stats: &Stats) {
        self.snapshots.push(Snapshot {
            game: game.clone(),
            stats: stats.clone(),
        });
    }

    /// Pop the most recent snapshot. `None` when there is nothing to undo;
    /// the caller treats that as a no-op.
    pub fn undo(&mut self) -> Option<Snapshot> {
        self.snapshots.pop()
    }

    /// Drop all snapshots (rematch, new game).
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> GameState {
        GameState::new(&["Alice", "Bob"]).unwrap()
    }

    #[test]
    fn test_undo_empty_is_none() {
        let mut history = History::new();
        assert!(history.is_empty());
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn test_lifo_order() {
        let mut history = History::new();
        let mut game = game();
        let stats = Stats::for_roster(&game.players);

        history.record(&game, &stats);
        game.apply_score(600);
        history.record(&game, &stats);
        assert_eq!(history.len(), 2);

        // Most recent first
        let top = history.undo().unwrap();
        assert_eq!(top.game.players[0].score, 600);

        let bottom = history.undo().unwrap();
        assert_eq!(bottom.game.players[0].score, 0);

        assert!(history.is_empty());
    }

    #[test]
    fn test_snapshot_is_independent_of_live_state() {
        let mut history = History::new();
        let mut game = game();
        let mut stats = Stats::for_roster(&game.players);

        history.record(&game, &stats);

        // Mutate the live state after the snapshot was taken
        game.apply_score(600);
        stats.record_turn_score("Alice", 600);

        let snapshot = history.undo().unwrap();
        assert_eq!(snapshot.game.players[0].score, 0);
        assert!(snapshot.game.players[0].turn_scores.is_empty());
        assert_eq!(snapshot.stats.highest_turn.score, 0);
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        let game = game();
        let stats = Stats::for_roster(&game.players);

        history.record(&game, &stats);
        history.record(&game, &stats);
        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.undo(), None);
    }
}
