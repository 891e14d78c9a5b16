//! Error types for the session layer.

use skirmish_protocol::PlayerId;

/// Errors that can occur while resolving a player's identity.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection never sent `join`, or its record was already
    /// removed. Every matchmaking, room, and match operation fails fast
    /// with this.
    #[error("Player not found. Please rejoin.")]
    NotJoined(PlayerId),
}
