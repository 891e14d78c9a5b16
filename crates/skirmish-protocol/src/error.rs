//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating wire input.
///
/// The `Display` text of the validation variants is sent verbatim to
/// clients, so it reads as a user-facing sentence.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame was not a well-formed event.
    #[cfg(feature = "json")]
    #[error("malformed event: {0}")]
    Decode(serde_json::Error),

    /// A round choice outside rock / paper / scissors.
    #[error("Invalid choice: {0:?}")]
    InvalidChoice(String),

    /// A room code that is not six symbols from the room-code alphabet.
    #[error("Invalid room code format")]
    InvalidRoomCode(String),
}
