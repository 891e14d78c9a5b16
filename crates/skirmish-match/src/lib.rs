//! Matches for Skirmish.
//!
//! Each match runs as an isolated Tokio task (actor model) that owns the
//! canonical match record, both participants' outboxes, the round timer,
//! and the post-match grace timer. Everything that can change a match
//! (choices, the timer firing, leaving, reaping) is serialised through
//! that one task.
//!
//! # Key types
//!
//! - [`Match`]: the canonical player1/player2 record and its state machine
//! - [`judge`]: the pure round resolver
//! - [`MatchBook`]: spawns match actors and enforces one match per player
//! - [`MatchHandle`]: send commands to a running match actor
//! - [`MatchEvent`]: lifecycle notifications emitted by match actors
//! - [`MatchConfig`]: round limit and timing

mod actor;
mod book;
mod config;
mod error;
mod resolver;
mod state;

pub use actor::{LeaveReason, MatchEvent, MatchHandle, MatchSeat, RematchTerms};
pub use book::MatchBook;
pub use config::MatchConfig;
pub use error::MatchError;
pub use resolver::{final_outcome, judge};
pub use state::{Match, Participant};
