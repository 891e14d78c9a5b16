//! Inbound and outbound events.
//!
//! Both directions use adjacent tagging:
//!
//! ```text
//! {"event": "join_room", "data": {"roomCode": "ABC234"}}
//! {"event": "opponent_ready"}
//! ```
//!
//! `data` is absent for events without a payload.

use serde::{Deserialize, Serialize};

use crate::{Choice, MatchView, PlayerId, PlayerStats, RoomCode, RoundResult};

/// Client → server events.
///
/// Scalar payloads (`choice`, `room_code`) stay raw strings here so the
/// server can answer malformed values with a specific error instead of a
/// generic decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Register this connection under a display name.
    Join {
        #[serde(default)]
        name: Option<String>,
    },
    /// Enter the anonymous matchmaking queue.
    FindMatch,
    /// Issue a private invitation code.
    CreateRoom,
    /// Join a host through their invitation code.
    JoinRoom { room_code: String },
    /// Commit this round's choice.
    MakeChoice { choice: String },
    CancelMatchmaking,
    SendChat { text: String },
    RequestRematch,
    AcceptRematch,
    /// Leave the current match. Forfeits if it is still being played.
    LeaveMatch,
    GetStats,
    Ping,
}

impl ClientEvent {
    /// Event name as it appears on the wire, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::FindMatch => "find_match",
            Self::CreateRoom => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::MakeChoice { .. } => "make_choice",
            Self::CancelMatchmaking => "cancel_matchmaking",
            Self::SendChat { .. } => "send_chat",
            Self::RequestRematch => "request_rematch",
            Self::AcceptRematch => "accept_rematch",
            Self::LeaveMatch => "leave_match",
            Self::GetStats => "get_stats",
            Self::Ping => "ping",
        }
    }
}

/// Status reported while a player waits in the matchmaking queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Searching,
}

/// Server → client events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    Joined {
        player_id: PlayerId,
        player_name: String,
        stats: PlayerStats,
    },
    MatchmakingStatus { status: QueueStatus },
    MatchFound(MatchView),
    /// Echo of the sender's own committed choice.
    ChoiceRecorded { choice: Choice },
    /// The opponent committed a choice. Which one stays hidden.
    OpponentReady,
    /// A new round deadline, in whole seconds.
    RoundTimerStarted { duration: u64 },
    /// The round timer expired and picked a choice on this player's behalf.
    ChoiceAutoAssigned { choice: Choice },
    RoundResult(RoundResult),
    RoomCreated { room_code: RoomCode },
    OpponentDisconnected { message: String },
    OpponentForfeit { message: String },
    MatchmakingCancelled,
    ChatMessage { from: String, text: String },
    RematchRequested { from: String },
    /// The match record is gone and the player is back in the lobby.
    MatchClosed { reason: String },
    Stats(PlayerStats),
    Error { message: String },
    Pong,
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }
}
