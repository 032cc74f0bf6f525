//! Turn state machine.
//!
//! Owns the roster, the turn cursor, and the final-round elimination flow.
//! Every score mutation enters through this module, which is what guarantees
//! an eliminated player can never act again.
//!
//! # State Diagram
//!
//! ```text
//! ┌───────┐  start (≥2 unique names)  ┌────────────┐
//! │ Setup │──────────────────────────▶│ InProgress │◀─┐
//! └───────┘                           └─────┬──────┘  │ turn below
//!                                           │         │ threshold
//!                                           │◀────────┘
//!                          score ≥ 10 000   │
//!                                           ▼
//!                                    ┌────────────┐◀─┐
//!                                    │ FinalRound │  │ turn, eliminations
//!                                    └─────┬──────┘──┘
//!                                          │
//!                 one non-eliminated left  │
//!                                          ▼
//!                                      ┌───────┐
//!                                      │ Ended │
//!                                      └───────┘
//! ```
//!
//! The phase is derived from the state fields, never stored, so a restored
//! or rolled-back state can't carry a stale phase flag.

use std::collections::BTreeSet;
use std::fmt;

use super::player::{Player, MAX_NAME_LEN, ON_BOARD_MINIMUM};

/// Score a player must reach to trigger the final round.
pub const WIN_SCORE: u32 = 10_000;

/// Minimum players per game.
pub const MIN_PLAYERS: usize = 2;

/// Maximum players per game.
pub const MAX_PLAYERS: usize = 8;

/// Game phases, derived via [`GameState::phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    /// No roster yet
    #[default]
    Setup,
    /// Normal play, nobody has crossed the win threshold
    InProgress,
    /// Threshold crossed; beat the leader or be eliminated
    FinalRound,
    /// One player left standing
    Ended,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::InProgress => "in_progress",
            Self::FinalRound => "final_round",
            Self::Ended => "ended",
        }
    }

    /// Check if the game accepts turn submissions.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress | Self::FinalRound)
    }

    /// Check if the game is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended)
    }
}

/// Next non-eliminated seat strictly after `from`, wrapping around the
/// table. Each seat is probed at most once, so the scan is bounded by the
/// player count. `None` means every seat is eliminated, which normal play
/// can't reach because the leader is never eliminated.
pub fn next_active_index(
    player_count: usize,
    eliminated: &BTreeSet<usize>,
    from: usize,
) -> Option<usize> {
    if player_count == 0 {
        return None;
    }
    (1..=player_count)
        .map(|step| (from + step) % player_count)
        .find(|seat| !eliminated.contains(seat))
}

/// Parse raw score input as a positive integer.
pub fn parse_score(raw: &str) -> Result<u32, GameError> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(GameError::InvalidScore),
    }
}

/// What a single applied turn changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreOutcome {
    /// This turn pushed the acting player past the win threshold
    pub triggered_final_round: bool,
    /// The acting player was eliminated this turn
    pub eliminated: bool,
    /// The game ended this turn
    pub ended: bool,
}

/// Full game state: roster in turn order, cursor, and final-round bookkeeping.
///
/// All fields are plain owned data; `Clone` therefore produces a fully
/// independent deep copy, which is what the history stack and the session
/// store rely on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    /// Players in turn order, fixed for the game
    pub players: Vec<Player>,

    /// Whose turn it is (parked on the winner once the game ends)
    pub current_player_index: usize,

    /// Whether the final round has been triggered
    pub final_round: bool,

    /// Seat whose score triggered the final round
    pub final_round_start_player: Option<usize>,

    /// Seats eliminated during the final round
    pub eliminated_players: BTreeSet<usize>,
}

impl GameState {
    /// Build a fresh game from setup input.
    ///
    /// Names are trimmed and blank entries dropped; what remains must be
    /// 2–8 pairwise-distinct names of at most 20 characters.
    pub fn new(names: &[impl AsRef<str>]) -> Result<Self, GameError> {
        let mut seen = BTreeSet::new();
        let mut players = Vec::new();
        for raw in names {
            let name = raw.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if name.chars().count() > MAX_NAME_LEN {
                return Err(GameError::NameTooLong);
            }
            if !seen.insert(name.to_string()) {
                return Err(GameError::DuplicateName);
            }
            players.push(Player::new(name.to_string()));
        }
        if players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }
        if players.len() > MAX_PLAYERS {
            return Err(GameError::TooManyPlayers);
        }
        Ok(Self {
            players,
            ..Self::default()
        })
    }

    /// Derive the current phase from the state fields.
    pub fn phase(&self) -> GamePhase {
        if self.players.is_empty() {
            GamePhase::Setup
        } else if self.winner_index().is_some() {
            GamePhase::Ended
        } else if self.final_round {
            GamePhase::FinalRound
        } else {
            GamePhase::InProgress
        }
    }

    /// Get the acting player.
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    /// Highest banked score at the table.
    pub fn high_score(&self) -> u32 {
        self.players.iter().map(|p| p.score).max().unwrap_or(0)
    }

    /// Players currently holding the top score. Empty until somebody banks;
    /// several entries when the top is tied.
    pub fn leaders(&self) -> Vec<&Player> {
        let high = self.high_score();
        if high == 0 {
            return Vec::new();
        }
        self.players.iter().filter(|p| p.score == high).collect()
    }

    /// Check if a seat has been eliminated.
    pub fn is_eliminated(&self, seat: usize) -> bool {
        self.eliminated_players.contains(&seat)
    }

    /// Seats still in the game.
    pub fn remaining_players(&self) -> usize {
        self.players.len() - self.eliminated_players.len()
    }

    /// The sole surviving seat, once every other player is eliminated.
    pub fn winner_index(&self) -> Option<usize> {
        if self.players.is_empty() || self.eliminated_players.len() + 1 != self.players.len() {
            return None;
        }
        (0..self.players.len()).find(|seat| !self.eliminated_players.contains(seat))
    }

    /// Winner's name, once the game has ended.
    pub fn winner_name(&self) -> Option<String> {
        self.winner_index()
            .and_then(|seat| self.players.get(seat))
            .map(|p| p.name.clone())
    }

    /// Final standings, best score first. Ties keep roster order.
    pub fn standings(&self) -> Vec<&Player> {
        let mut table: Vec<&Player> = self.players.iter().collect();
        table.sort_by(|a, b| b.score.cmp(&a.score));
        table
    }

    /// Validate a turn submission without mutating anything.
    pub fn check_turn(&self) -> Result<(), GameError> {
        if !self.phase().is_active() {
            return Err(GameError::GameNotActive);
        }
        Ok(())
    }

    /// Validate a proposed score for the acting player without mutating
    /// anything. Rejection here means no component has changed.
    pub fn check_score(&self, value: u32) -> Result<(), GameError> {
        self.check_turn()?;
        if value == 0 {
            return Err(GameError::InvalidScore);
        }
        match self.current_player() {
            Some(player) if !player.can_bank(value) => Err(GameError::NotOnBoard),
            Some(_) => Ok(()),
            None => Err(GameError::GameNotActive),
        }
    }

    /// Bank a validated score for the acting player, run the final-round
    /// bookkeeping, and advance the turn. Callers validate with
    /// [`check_score`](Self::check_score) first.
    pub fn apply_score(&mut self, value: u32) -> ScoreOutcome {
        let seat = self.current_player_index;
        let new_total = match self.players.get_mut(seat) {
            Some(player) => {
                player.record_turn(value);
                player.score
            }
            None => return ScoreOutcome::default(),
        };

        let mut outcome = ScoreOutcome::default();

        // First crossing of the threshold opens the final round. The
        // triggering player is recorded but not eliminated: they hold the
        // high score, so the strict comparison below cannot remove them.
        if new_total >= WIN_SCORE && !self.final_round {
            self.final_round = true;
            self.final_round_start_player = Some(seat);
            outcome.triggered_final_round = true;
        }

        // In the final round, failing to at least tie the leader is
        // elimination. Ties survive.
        if self.final_round && new_total < self.high_score() {
            self.eliminated_players.insert(seat);
            outcome.eliminated = true;
        }

        outcome.ended = self.advance_turn();
        outcome
    }

    /// Record a farkle for the acting player and advance the turn. Farkling
    /// in the final round is always elimination, regardless of score.
    pub fn apply_farkle(&mut self) -> ScoreOutcome {
        let seat = self.current_player_index;
        match self.players.get_mut(seat) {
            Some(player) => player.record_farkle(),
            None => return ScoreOutcome::default(),
        }

        let mut outcome = ScoreOutcome::default();
        if self.final_round {
            self.eliminated_players.insert(seat);
            outcome.eliminated = true;
        }

        outcome.ended = self.advance_turn();
        outcome
    }

    /// Move the cursor to the next seat. Outside the final round every seat
    /// plays, so this is a plain wrap-around step. In the final round
    /// eliminated seats are skipped and the end condition is evaluated; once
    /// one player is left the cursor parks on the winner and this returns
    /// true.
    pub fn advance_turn(&mut self) -> bool {
        if self.players.is_empty() {
            return false;
        }
        if !self.final_round {
            self.current_player_index = (self.current_player_index + 1) % self.players.len();
            return false;
        }
        if let Some(seat) = next_active_index(
            self.players.len(),
            &self.eliminated_players,
            self.current_player_index,
        ) {
            self.current_player_index = seat;
        }
        if let Some(winner) = self.winner_index() {
            self.current_player_index = winner;
            return true;
        }
        false
    }

    /// Reset for a rematch: same roster, everything else starts over.
    pub fn reset_for_rematch(&mut self) {
        for player in &mut self.players {
            player.reset();
        }
        self.current_player_index = 0;
        self.final_round = false;
        self.final_round_start_player = None;
        self.eliminated_players.clear();
    }

    /// Convert the full game state to a JSON snapshot for clients.
    pub fn to_json(&self) -> serde_json::Value {
        let players: Vec<serde_json::Value> = self.players.iter().map(|p| p.to_json()).collect();

        let leaders: Vec<&str> = self.leaders().iter().map(|p| p.name.as_str()).collect();

        let standings: Vec<serde_json::Value> = self
            .standings()
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "score": p.score,
                    "farkle_count": p.farkle_count
                })
            })
            .collect();

        serde_json::json!({
            "phase": self.phase().as_str(),
            "players": players,
            "current_player_index": self.current_player_index,
            "current_player": self.current_player().map(|p| p.name.as_str()),
            "final_round": self.final_round,
            "final_round_start_player": self.final_round_start_player,
            "eliminated_players": self.eliminated_players.iter().copied().collect::<Vec<_>>(),
            "high_score": self.high_score(),
            "leaders": leaders,
            "remaining_players": self.remaining_players(),
            "winner": self.winner_name(),
            "standings": standings
        })
    }
}

/// Game errors. Every variant is a rejection raised before any mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    InvalidScore,
    NotOnBoard,
    NameTooLong,
    DuplicateName,
    NotEnoughPlayers,
    TooManyPlayers,
    GameNotActive,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidScore => write!(f, "Score must be a positive number"),
            Self::NotOnBoard => write!(
                f,
                "Need {} or more points to get on the board",
                ON_BOARD_MINIMUM
            ),
            Self::NameTooLong => {
                write!(f, "Player names are limited to {} characters", MAX_NAME_LEN)
            }
            Self::DuplicateName => write!(f, "Player names must be unique"),
            Self::NotEnoughPlayers => write!(f, "At least {} players are required", MIN_PLAYERS),
            Self::TooManyPlayers => write!(f, "At most {} players are allowed", MAX_PLAYERS),
            Self::GameNotActive => write!(f, "Game is not active"),
        }
    }
}

impl std::error::Error for GameError {}
