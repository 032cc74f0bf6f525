//! Session persistence.
//!
//! Saves the full game state as one JSON record under a single fixed key so
//! an interrupted session can be resumed within 24 hours. Persistence is
//! best-effort: a failed save or a bad saved entry degrades to "no resume"
//! and never becomes an error the in-memory game has to handle.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::game::GameState;
use super::player::Player;
use super::stats::Stats;

/// Fixed storage key for the session snapshot.
pub const STORAGE_KEY: &str = "farkle_game_state";

/// Saved entries older than this are discarded at load time.
pub const SAVE_TTL_HOURS: i64 = 24;

/// String key-value storage seam. Implementations decide where the snapshot
/// actually lives (browser storage, a file, plain memory); the store only
/// ever touches [`STORAGE_KEY`].
pub trait StorageBackend: fmt::Debug {
    /// Read the value under a key, if present.
    fn read(&self, key: &str) -> Option<String>;

    /// Write a value, overwriting any prior one.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is fine.
    fn remove(&mut self, key: &str);
}

/// In-memory backend: keeps the snapshot for the lifetime of the process.
/// Also the test double.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// The persisted record. Phase is never stored; the consumer derives it from
/// the fields (a non-empty roster means there is a game to resume).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGame {
    pub players: Vec<Player>,
    pub current_player_index: usize,
    pub final_round: bool,
    pub final_round_start_player: Option<usize>,
    /// Eliminated seat indices, ascending
    pub eliminated_players: Vec<usize>,
    pub stats: Stats,
    pub timestamp: DateTime<Utc>,
}

impl SavedGame {
    /// Capture the live state for persistence. The eliminated set flattens
    /// to an ordered sequence here; [`into_state`](Self::into_state)
    /// converts it back.
    pub fn capture(game: &GameState, stats: &Stats, timestamp: DateTime<Utc>) -> Self {
        Self {
            players: game.players.clone(),
            current_player_index: game.current_player_index,
            final_round: game.final_round,
            final_round_start_player: game.final_round_start_player,
            eliminated_players: game.eliminated_players.iter().copied().collect(),
            stats: stats.clone(),
            timestamp,
        }
    }

    /// Rebuild live state from the record.
    pub fn into_state(self) -> (GameState, Stats) {
        let game = GameState {
            players: self.players,
            current_player_index: self.current_player_index,
            final_round: self.final_round,
            final_round_start_player: self.final_round_start_player,
            eliminated_players: self.eliminated_players.into_iter().collect(),
        };
        (game, self.stats)
    }

    /// Structural sanity: every recorded index must refer to a seat.
    fn is_well_formed(&self) -> bool {
        let len = self.players.len();
        len > 0
            && self.current_player_index < len
            && self.final_round_start_player.map_or(true, |seat| seat < len)
            && self.eliminated_players.iter().all(|&seat| seat < len)
    }
}

/// Serializes game state into a storage backend under [`STORAGE_KEY`].
#[derive(Debug)]
pub struct SessionStore {
    backend: Box<dyn StorageBackend>,
}

impl SessionStore {
    /// Store backed by process memory.
    pub fn in_memory() -> Self {
        Self::with_backend(Box::new(MemoryBackend::new()))
    }

    pub fn with_backend(backend: Box<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Persist the full state, overwriting any prior save.
    pub fn save(
        &mut self,
        game: &GameState,
        stats: &Stats,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let record = SavedGame::capture(game, stats, timestamp);
        let payload =
            serde_json::to_string(&record).map_err(|err| StoreError::Serialize(err.to_string()))?;
        self.backend.write(STORAGE_KEY, &payload)
    }

    /// Load the saved session, if one exists and is still fresh.
    ///
    /// Malformed, inconsistent, and stale entries are deleted on the way
    /// out so they are not retried every load.
    pub fn load(&mut self, now: DateTime<Utc>) -> Option<SavedGame> {
        let payload = self.backend.read(STORAGE_KEY)?;

        let record: SavedGame = match serde_json::from_str(&payload) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = %err, "discarding malformed saved game");
                self.backend.remove(STORAGE_KEY);
                return None;
            }
        };

        if !record.is_well_formed() {
            tracing::warn!("discarding saved game with out-of-range indices");
            self.backend.remove(STORAGE_KEY);
            return None;
        }

        if now - record.timestamp > Duration::hours(SAVE_TTL_HOURS) {
            tracing::debug!("discarding saved game past the staleness window");
            self.backend.remove(STORAGE_KEY);
            return None;
        }

        Some(record)
    }

    /// Drop the saved session.
    pub fn clear(&mut self) {
        self.backend.remove(STORAGE_KEY);
    }

    /// Check whether anything is saved, without validating it.
    pub fn has_saved_game(&self) -> bool {
        self.backend.read(STORAGE_KEY).is_some()
    }
}

/// Persistence errors. None of these are fatal to the game; the session
/// logs and plays on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Unavailable,
    QuotaExceeded,
    Serialize(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "Storage is unavailable"),
            Self::QuotaExceeded => write!(f, "Storage quota exceeded"),
            Self::Serialize(detail) => write!(f, "Failed to serialize game state: {}", detail),
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn played_game() -> (GameState, Stats) {
        let mut game = GameState::new(&["Alice", "Bob"]).unwrap();
        let mut stats = Stats::for_roster(&game.players);

        stats.record_turn_score("Alice", 600);
        game.apply_score(600);
        stats.record_farkle("Bob");
        game.apply_farkle();
        (game, stats)
    }

    #[test]
    fn test_save_load_round_trip() {
        let (game, stats) = played_game();
        let mut store = SessionStore::in_memory();
        let now = Utc::now();

        store.save(&game, &stats, now).unwrap();
        let record = store.load(now).unwrap();
        assert_eq!(record.timestamp, now);

        let (restored_game, restored_stats) = record.into_state();
        assert_eq!(restored_game, game);
        assert_eq!(restored_stats, stats);
    }

    #[test]
    fn test_round_trip_preserves_eliminations() {
        let mut game = GameState::new(&["Alice", "Bob", "Carol"]).unwrap();
        let stats = Stats::for_roster(&game.players);
        game.apply_score(10_200);
        game.apply_farkle(); // Bob eliminated

        let mut store = SessionStore::in_memory();
        let now = Utc::now();
        store.save(&game, &stats, now).unwrap();

        let record = store.load(now).unwrap();
        assert_eq!(record.eliminated_players, vec![1]);

        let (restored, _) = record.into_state();
        assert_eq!(restored, game);
        assert!(restored.final_round);
        assert_eq!(restored.final_round_start_player, Some(0));
    }

    #[test]
    fn test_load_nothing_saved() {
        let mut store = SessionStore::in_memory();
        assert_eq!(store.load(Utc::now()), None);
    }

    #[test]
    fn test_load_deletes_stale_entry() {
        let (game, stats) = played_game();
        let mut store = SessionStore::in_memory();
        let saved_at = Utc::now();

        store.save(&game, &stats, saved_at).unwrap();

        // Exactly 24 hours old still loads; a second past it does not
        let boundary = saved_at + Duration::hours(SAVE_TTL_HOURS);
        assert!(store.load(boundary).is_some());

        let past = boundary + Duration::seconds(1);
        assert_eq!(store.load(past), None);
        assert!(!store.has_saved_game()); // deleted as a side effect
    }

    #[test]
    fn test_load_deletes_malformed_entry() {
        let mut backend = MemoryBackend::new();
        backend.write(STORAGE_KEY, "{not json").unwrap();
        let mut store = SessionStore::with_backend(Box::new(backend));

        assert_eq!(store.load(Utc::now()), None);
        assert!(!store.has_saved_game());
    }

    #[test]
    fn test_load_deletes_out_of_range_indices() {
        let (game, stats) = played_game();
        let mut record = SavedGame::capture(&game, &stats, Utc::now());
        record.current_player_index = 7;

        let mut backend = MemoryBackend::new();
        backend
            .write(STORAGE_KEY, &serde_json::to_string(&record).unwrap())
            .unwrap();
        let mut store = SessionStore::with_backend(Box::new(backend));

        assert_eq!(store.load(Utc::now()), None);
        assert!(!store.has_saved_game());
    }

    #[test]
    fn test_save_overwrites_prior_save() {
        let (mut game, stats) = played_game();
        let mut store = SessionStore::in_memory();
        let now = Utc::now();

        store.save(&game, &stats, now).unwrap();
        game.apply_score(750); // Alice again
        store.save(&game, &stats, now).unwrap();

        let record = store.load(now).unwrap();
        assert_eq!(record.players[0].score, 1350);
    }

    #[test]
    fn test_clear() {
        let (game, stats) = played_game();
        let mut store = SessionStore::in_memory();

        store.save(&game, &stats, Utc::now()).unwrap();
        store.clear();
        assert_eq!(store.load(Utc::now()), None);
    }
}
