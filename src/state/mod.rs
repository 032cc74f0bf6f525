//! State management module for Farkle scorekeeping.
//!
//! This module provides the core state types and the combined session:
//!
//! - `player` - Player ledger (score, on-board status, turn history)
//! - `game` - Turn state machine (cursor, final round, eliminations)
//! - `stats` - Statistics tracker (highest turn, farkle tallies)
//! - `history` - Snapshot stack for undo
//! - `store` - Session persistence with staleness expiry
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           GameSession                            │
//! │                                                                  │
//! │  ┌───────────────┐  ┌───────────────┐  ┌─────────────────────┐  │
//! │  │   GameState   │  │     Stats     │  │       History       │  │
//! │  │               │  │               │  │                     │  │
//! │  │ players       │  │ highest turn  │  │ pre-mutation        │  │
//! │  │ turn cursor   │  │ farkle        │  │ snapshots of        │  │
//! │  │ final round   │  │   tallies     │  │ GameState + Stats   │  │
//! │  │ eliminated    │  │               │  │ (LIFO)              │  │
//! │  └───────────────┘  └───────────────┘  └─────────────────────┘  │
//! │                                                                  │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │ SessionStore: one JSON record under a fixed key, 24 h      │ │
//! │  │ staleness window, best-effort (never fatal)                │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every action follows the same sequence: validate (reject with no state
//! change), record a history snapshot, mutate through the turn state
//! machine, advance the cursor, persist. Exactly one action runs at a time;
//! the session is a plain owned value with no interior mutability.
//!
//! # Usage
//!
//! ```rust,ignore
//! use farkle_state::state::GameSession;
//!
//! let mut session = GameSession::new();
//! session.start_game(&["Alice", "Bob"])?;
//!
//! let report = session.submit_score("600")?;
//! assert!(report.new_record);
//!
//! session.declare_farkle()?;
//! session.undo();
//! ```

pub mod game;
pub mod history;
pub mod player;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use game::{
    next_active_index, parse_score, GameError, GamePhase, GameState, ScoreOutcome, MAX_PLAYERS,
    MIN_PLAYERS, WIN_SCORE,
};
pub use history::{History, Snapshot};
pub use player::{Player, MAX_NAME_LEN, ON_BOARD_MINIMUM};
pub use stats::{HighestTurn, Stats};
pub use store::{
    MemoryBackend, SavedGame, SessionStore, StorageBackend, StoreError, SAVE_TTL_HOURS,
    STORAGE_KEY,
};

use chrono::{DateTime, Utc};

/// What a single turn changed, for the caller's notifications. The full
/// table state is read from the session afterwards; this only carries the
/// events worth announcing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Acting player's name
    pub player: String,

    /// Banked value; `None` for a farkle
    pub value: Option<u32>,

    /// This turn set a new highest-turn record
    pub new_record: bool,

    /// This turn pushed the acting player past the win threshold
    pub triggered_final_round: bool,

    /// The acting player was eliminated this turn
    pub eliminated: bool,

    /// The game ended this turn
    pub ended: bool,

    /// Winner's name once the game has ended
    pub winner: Option<String>,
}

/// Combined game session.
///
/// Owns the full state and funnels every mutation through the turn state
/// machine, recording a history snapshot before each scoring action and
/// persisting the result after it. The presentation layer holds one of
/// these, calls the inbound operations, and re-reads the state (or
/// [`to_json`](Self::to_json)) after each call.
#[derive(Debug)]
pub struct GameSession {
    game: GameState,
    stats: Stats,
    history: History,
    store: SessionStore,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    /// Session with in-memory persistence.
    pub fn new() -> Self {
        Self::with_backend(Box::new(MemoryBackend::new()))
    }

    /// Session persisting into the given backend.
    pub fn with_backend(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            game: GameState::default(),
            stats: Stats::new(),
            history: History::new(),
            store: SessionStore::with_backend(backend),
        }
    }

    /// Start a fresh game from setup input. Replaces any game in progress;
    /// statistics and history start over with the new roster.
    pub fn start_game(&mut self, names: &[impl AsRef<str>]) -> Result<(), GameError> {
        let game = GameState::new(names)?;
        self.stats = Stats::for_roster(&game.players);
        self.game = game;
        self.history.clear();
        self.persist();
        Ok(())
    }

    /// Submit the acting player's turn score from raw input.
    ///
    /// Rejected input (not a positive integer, or below the entry threshold
    /// while off the board) leaves every component untouched.
    pub fn submit_score(&mut self, raw: &str) -> Result<TurnReport, GameError> {
        let value = parse_score(raw)?;
        self.game.check_score(value)?;
        let acting = match self.game.current_player() {
            Some(player) => player.name.clone(),
            None => return Err(GameError::GameNotActive),
        };

        self.history.record(&self.game, &self.stats);

        let new_record = self.stats.record_turn_score(&acting, value);
        let outcome = self.game.apply_score(value);
        self.persist();

        Ok(TurnReport {
            player: acting,
            value: Some(value),
            new_record,
            triggered_final_round: outcome.triggered_final_round,
            eliminated: outcome.eliminated,
            ended: outcome.ended,
            winner: self.game.winner_name(),
        })
    }

    /// Record a farkle for the acting player.
    pub fn declare_farkle(&mut self) -> Result<TurnReport, GameError> {
        self.game.check_turn()?;
        let acting = match self.game.current_player() {
            Some(player) => player.name.clone(),
            None => return Err(GameError::GameNotActive),
        };

        self.history.record(&self.game, &self.stats);

        self.stats.record_farkle(&acting);
        let outcome = self.game.apply_farkle();
        self.persist();

        Ok(TurnReport {
            player: acting,
            value: None,
            new_record: false,
            triggered_final_round: false,
            eliminated: outcome.eliminated,
            ended: outcome.ended,
            winner: self.game.winner_name(),
        })
    }

    /// Roll back to the state before the last scoring action. Both the game
    /// and the statistics are replaced together; there is no partial
    /// restore. Returns false (and does nothing) when there is nothing to
    /// undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.game = snapshot.game;
        self.stats = snapshot.stats;
        self.persist();
        true
    }

    /// Start over with the same roster. Scores, turn histories,
    /// eliminations, statistics, and undo history are all reset. Does
    /// nothing before a roster exists.
    pub fn rematch(&mut self) {
        if self.game.players.is_empty() {
            return;
        }
        self.game.reset_for_rematch();
        self.stats = Stats::for_roster(&self.game.players);
        self.history.clear();
        self.persist();
    }

    /// Tear the session down to setup. The saved snapshot is deleted too.
    pub fn reset(&mut self) {
        self.game = GameState::default();
        self.stats = Stats::new();
        self.history.clear();
        self.store.clear();
    }

    /// Replace live state with the saved session, if a fresh one exists.
    /// The undo history starts empty after a resume.
    pub fn try_resume(&mut self) -> bool {
        self.try_resume_at(Utc::now())
    }

    /// Resume against an explicit clock, for callers that own time.
    pub fn try_resume_at(&mut self, now: DateTime<Utc>) -> bool {
        let Some(record) = self.store.load(now) else {
            return false;
        };
        let (game, stats) = record.into_state();
        self.game = game;
        self.stats = stats;
        self.history.clear();
        true
    }

    // Read model

    /// Current game state (read-only; mutation goes through the operations
    /// above).
    pub fn game(&self) -> &GameState {
        &self.game
    }

    /// Current statistics.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Derived phase.
    pub fn phase(&self) -> GamePhase {
        self.game.phase()
    }

    /// Whether an undo would do anything.
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Undo stack depth.
    pub fn history_depth(&self) -> usize {
        self.history.len()
    }

    /// Full snapshot for the presentation layer, polled after each action.
    pub fn to_json(&self) -> serde_json::Value {
        let mut snapshot = self.game.to_json();
        snapshot["stats"] = self.stats.to_json(&self.game.players);
        snapshot["can_undo"] = serde_json::json!(self.can_undo());
        snapshot
    }

    /// Best-effort save. Failure is logged and the in-memory game plays on.
    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.game, &self.stats, Utc::now()) {
            tracing::warn!(error = %err, "failed to persist game state");
        }
    }
}
