//! Error types for the match layer.

use skirmish_protocol::{MatchId, PlayerId};

/// Errors that can occur while acting on a match.
///
/// Everything except [`Unavailable`](Self::Unavailable) and
/// [`Invariant`](Self::Invariant) is shown to the player verbatim.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// No match, or the match is no longer being played.
    #[error("Match not active")]
    NotActive,

    /// The participant already committed a choice this round.
    #[error("Already made choice this round")]
    AlreadyChosen,

    #[error("Already in a match")]
    AlreadyMatched(PlayerId),

    #[error("player {0} is not in this match")]
    NotParticipant(PlayerId),

    #[error("Rematch not available")]
    RematchUnavailable,

    #[error("Chat messages must be 1-200 characters")]
    ChatRejected,

    /// The match actor has already shut down.
    #[error("match {0} is unavailable")]
    Unavailable(MatchId),

    /// A programming error caught at runtime. Rejects the operation and
    /// leaves the match as it was.
    #[error("internal match error: {0}")]
    Invariant(String),
}
