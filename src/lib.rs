//! Farkle State Library
//!
//! This crate provides state management for Farkle scorekeeping logic.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Turn State Machine** - Tracks whose turn it is, triggers the final
//!   round at the win threshold, eliminates players who fail to answer the
//!   leader, and declares the winner.
//!
//! - **Player Ledger** - Per-player score, on-board status, turn history,
//!   and farkle count.
//!
//! - **History Stack** - Snapshot-based undo of every scoring action.
//!
//! - **Session Store** - Saves the full game under a fixed key so a session
//!   can be resumed within 24 hours.
//!
//! - **Statistics Tracker** - Highest single turn, farkle tallies, and
//!   derived table aggregates.
//!
//! # Design Principles
//!
//! 1. **Validation before mutation** - An action is either rejected with no
//!    state change or applied completely; there is no partial application.
//!
//! 2. **Phase is derived** - Setup/InProgress/FinalRound/Ended are computed
//!    from the state fields, so restored or rolled-back states cannot carry
//!    a stale phase flag.
//!
//! 3. **No rendering, no I/O** - This crate is pure state. The presentation
//!    layer submits turn outcomes and polls a snapshot back; the only
//!    storage contact is through a pluggable key-value seam.
//!
//! 4. **Serialization-ready** - All persisted types carry serde derives, and
//!    the session renders a full JSON snapshot for clients.
//!
//! # Example
//!
//! ```rust
//! use farkle_state::state::GameSession;
//!
//! let mut session = GameSession::new();
//! session.start_game(&["Alice", "Bob"]).unwrap();
//!
//! // Alice banks 600 and is on the board
//! let report = session.submit_score("600").unwrap();
//! assert!(report.new_record);
//!
//! // Bob has no scoring dice
//! session.declare_farkle().unwrap();
//!
//! // Take the farkle back
//! assert!(session.undo());
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
