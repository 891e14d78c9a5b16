//! Pairing for Skirmish: the anonymous matchmaking queue and the
//! private room directory.
//!
//! Both structures are plain owned data. They hold player ids only and
//! never talk to connections; the orchestration layer decides who is
//! still available and turns a successful pairing into a match.
//!
//! # Key types
//!
//! - [`MatchmakingQueue`]: FIFO of players waiting for any opponent
//! - [`RoomDirectory`]: host-issued invitation codes
//! - [`LobbyConfig`]: room expiry settings

mod config;
mod error;
mod queue;
mod rooms;

pub use config::LobbyConfig;
pub use error::LobbyError;
pub use queue::MatchmakingQueue;
pub use rooms::{Room, RoomDirectory};
