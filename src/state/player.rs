//! Player ledger.
//!
//! Per-player scoring data: cumulative score, on-board status, turn history,
//! and farkle count. Players are created at game start and never removed; a
//! rematch resets their fields in place. All score mutation goes through the
//! turn state machine in [`game`](super::game).

use serde::{Deserialize, Serialize};

/// Minimum single-turn score required to get on the board.
pub const ON_BOARD_MINIMUM: u32 = 500;

/// Maximum player name length after trimming.
pub const MAX_NAME_LEN: usize = 20;

/// A player in the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name, unique within a game
    pub name: String,

    /// Cumulative banked score
    pub score: u32,

    /// Whether the 500-point entry threshold has been met
    pub on_board: bool,

    /// One entry per turn taken; 0 denotes a farkle
    pub turn_scores: Vec<u32>,

    /// Number of farkled turns
    pub farkle_count: u32,
}

impl Player {
    /// Create a fresh player with a validated name.
    pub fn new(name: String) -> Self {
        Self {
            name,
            score: 0,
            on_board: false,
            turn_scores: Vec::new(),
            farkle_count: 0,
        }
    }

    /// Bank a scored turn. The first qualifying score puts the player on the
    /// board permanently.
    pub fn record_turn(&mut self, value: u32) {
        self.score += value;
        self.on_board = true;
        self.turn_scores.push(value);
    }

    /// Record a farkled turn: a 0 entry in the turn history. The banked
    /// score is untouched.
    pub fn record_farkle(&mut self) {
        self.turn_scores.push(0);
        self.farkle_count += 1;
    }

    /// Check whether a proposed turn score can be banked: the player is
    /// either already on the board or the value meets the entry threshold.
    pub fn can_bank(&self, value: u32) -> bool {
        self.on_board || value >= ON_BOARD_MINIMUM
    }

    /// Number of turns taken, farkles included.
    pub fn turns_taken(&self) -> usize {
        self.turn_scores.len()
    }

    /// Reconstruct the running total from the turn history.
    ///
    /// This is a derived display view, not stored state: entries count only
    /// once the on-board flag or an accumulated 500 points shows the entry
    /// threshold has been met. Entries before qualification contribute
    /// nothing.
    pub fn running_total(&self) -> u32 {
        let mut total = 0;
        for &value in &self.turn_scores {
            if self.on_board || total >= ON_BOARD_MINIMUM {
                total += value;
            }
        }
        total
    }

    /// Reset for a rematch. The name survives; everything else starts over.
    pub fn reset(&mut self) {
        self.score = 0;
        self.on_board = false;
        self.turn_scores.clear();
        self.farkle_count = 0;
    }

    /// Scoreboard row for clients.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "score": self.score,
            "on_board": self.on_board,
            "turn_scores": self.turn_scores,
            "running_total": self.running_total(),
            "farkle_count": self.farkle_count
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player() {
        let player = Player::new("Alice".to_string());
        assert_eq!(player.score, 0);
        assert!(!player.on_board);
        assert!(player.turn_scores.is_empty());
        assert_eq!(player.farkle_count, 0);
    }

    #[test]
    fn test_record_turn() {
        let mut player = Player::new("Alice".to_string());

        player.record_turn(600);
        assert_eq!(player.score, 600);
        assert!(player.on_board);
        assert_eq!(player.turn_scores, vec![600]);

        player.record_turn(250);
        assert_eq!(player.score, 850);
        assert_eq!(player.turn_scores, vec![600, 250]);
    }

    #[test]
    fn test_record_farkle() {
        let mut player = Player::new("Alice".to_string());
        player.record_turn(600);

        player.record_farkle();
        assert_eq!(player.score, 600); // farkle never changes the banked score
        assert_eq!(player.turn_scores, vec![600, 0]);
        assert_eq!(player.farkle_count, 1);
    }

    #[test]
    fn test_score_equals_turn_sum_once_on_board() {
        let mut player = Player::new("Alice".to_string());
        player.record_turn(600);
        player.record_farkle();
        player.record_turn(1050);
        player.record_farkle();

        let turn_sum: u32 = player.turn_scores.iter().sum();
        assert_eq!(player.score, turn_sum);
    }

    #[test]
    fn test_can_bank() {
        let mut player = Player::new("Alice".to_string());
        assert!(!player.can_bank(450));
        assert!(player.can_bank(500));

        player.record_turn(600);
        assert!(player.can_bank(50)); // anything goes once on board
    }

    #[test]
    fn test_running_total_on_board() {
        let mut player = Player::new("Alice".to_string());
        player.record_turn(600);
        player.record_farkle();
        player.record_turn(300);

        assert_eq!(player.running_total(), 900);
    }

    #[test]
    fn test_running_total_before_qualification() {
        // An off-board turn history never accumulates: the entries predate
        // qualification.
        let player = Player {
            name: "Alice".to_string(),
            score: 0,
            on_board: false,
            turn_scores: vec![450, 300],
            farkle_count: 0,
        };
        assert_eq!(player.running_total(), 0);
    }

    #[test]
    fn test_reset_keeps_name() {
        let mut player = Player::new("Alice".to_string());
        player.record_turn(600);
        player.record_farkle();

        player.reset();
        assert_eq!(player.name, "Alice");
        assert_eq!(player.score, 0);
        assert!(!player.on_board);
        assert!(player.turn_scores.is_empty());
        assert_eq!(player.farkle_count, 0);
    }

    #[test]
    fn test_to_json() {
        let mut player = Player::new("Alice".to_string());
        player.record_turn(600);

        let row = player.to_json();
        assert_eq!(row["name"], "Alice");
        assert_eq!(row["score"], 600);
        assert_eq!(row["on_board"], true);
        assert_eq!(row["running_total"], 600);
    }
}
