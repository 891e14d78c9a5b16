//! Player identity for Skirmish.
//!
//! Maps a live connection to a player record: display name, connected
//! flag, last-activity timestamp, per-session stats, and the outbox used
//! to push events back to that connection.
//!
//! # How it fits in the stack
//!
//! ```text
//! Lobby / Match layers (above)  ← resolve "who is this connection?"
//!     ↕
//! Session layer (this crate)    ← PlayerRegistry
//!     ↕
//! Protocol layer (below)        ← PlayerId, ServerEvent, PlayerStats
//! ```
//!
//! Identity is per session only: there is no authentication and nothing
//! survives a disconnect.

mod error;
mod player;
mod registry;

pub use error::SessionError;
pub use player::{Outbox, Player, SessionConfig};
pub use registry::PlayerRegistry;
