//! # Skirmish
//!
//! Real-time rock-paper-scissors match server.
//!
//! Players connect over WebSocket, register a display name, and are
//! paired either through an anonymous matchmaking queue or a private
//! six-character room code. Each match is best-of-three with a 15 second
//! round timer; a player who misses the deadline gets a random choice.
//!
//! ## Layers
//!
//! ```text
//! skirmish            Arena, connection handler, server loop
//!   skirmish-match    match actor, state machine, resolver
//!   skirmish-lobby    matchmaking queue, room directory
//!   skirmish-session  player registry
//!   skirmish-timer    countdown and sweep primitives
//!   skirmish-protocol wire events, codec
//!   skirmish-transport WebSocket transport
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! # async fn start() -> Result<(), SkirmishError> {
//! let server = SkirmishServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod arena;
mod config;
mod error;
mod handler;
mod server;

pub use arena::{Arena, ReapReport};
pub use config::{ArenaConfig, ServerSettings};
pub use error::SkirmishError;
pub use server::{SkirmishServer, SkirmishServerBuilder};

pub use skirmish_lobby as lobby;
pub use skirmish_match as matching;
pub use skirmish_protocol as protocol;
pub use skirmish_session as session;
pub use skirmish_timer as timer;
pub use skirmish_transport as transport;

/// Common imports for running or embedding a Skirmish server.
pub mod prelude {
    pub use crate::{Arena, ArenaConfig, ReapReport, ServerSettings, SkirmishError, SkirmishServer, SkirmishServerBuilder};
    pub use skirmish_lobby::{LobbyConfig, LobbyError};
    pub use skirmish_match::{MatchConfig, MatchError};
    pub use skirmish_protocol::{
        Choice, ClientEvent, MatchId, MatchOutcome, MatchPhase, MatchView, PlayerId, PlayerStats,
        RoomCode, RoundResult, RoundWinner, ServerEvent,
    };
    pub use skirmish_session::{Outbox, SessionConfig, SessionError};
}
