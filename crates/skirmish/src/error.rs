//! Unified error type for the Skirmish server.

use skirmish_lobby::LobbyError;
use skirmish_match::MatchError;
use skirmish_protocol::ProtocolError;
use skirmish_session::SessionError;
use skirmish_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A malformed frame, choice, or room code.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The connection has not joined.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Queue or room conflicts.
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// Match state conflicts.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// A bad setting in the environment or builder.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SkirmishError {
    /// `true` for programming errors that the client cannot fix.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Match(MatchError::Invariant(_) | MatchError::NotParticipant(_))
                | Self::Lobby(LobbyError::CodeSpaceExhausted(_))
                | Self::Protocol(ProtocolError::Encode(_))
        )
    }

    /// The text reported to the client in an `error` event.
    pub fn client_message(&self) -> String {
        if self.is_internal() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_protocol::PlayerId;

    #[test]
    fn test_from_session_error_keeps_message() {
        let err: SkirmishError = SessionError::NotJoined(PlayerId(1)).into();
        assert!(matches!(err, SkirmishError::Session(_)));
        assert_eq!(err.client_message(), "Player not found. Please rejoin.");
    }

    #[test]
    fn test_from_lobby_error() {
        let err: SkirmishError = LobbyError::SelfJoin.into();
        assert!(matches!(err, SkirmishError::Lobby(_)));
        assert_eq!(err.to_string(), "Cannot join your own room");
    }

    #[test]
    fn test_from_match_error() {
        let err: SkirmishError = MatchError::AlreadyChosen.into();
        assert!(!err.is_internal());
        assert_eq!(err.client_message(), "Already made choice this round");
    }

    #[test]
    fn test_invariant_is_hidden_from_clients() {
        let err: SkirmishError = MatchError::Invariant("missing choice".into()).into();
        assert!(err.is_internal());
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.to_string().contains("missing choice"));
    }

    #[test]
    fn test_from_transport_error() {
        let err: SkirmishError = TransportError::ConnectionClosed("gone".into()).into();
        assert!(matches!(err, SkirmishError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }
}
