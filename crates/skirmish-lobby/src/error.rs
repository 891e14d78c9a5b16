//! Error types for the lobby layer.

use skirmish_protocol::PlayerId;

/// Errors that can occur while queueing or pairing through a room.
///
/// The `Display` text is sent to the client as-is.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("Already in matchmaking queue")]
    AlreadyQueued(PlayerId),

    #[error("Room not found")]
    RoomNotFound,

    #[error("Cannot join your own room")]
    SelfJoin,

    /// The host left or got matched elsewhere. The room is gone.
    #[error("Room no longer available")]
    HostUnavailable,

    /// Every drawn code collided with a live room.
    #[error("could not allocate a room code after {0} attempts")]
    CodeSpaceExhausted(usize),
}
