//! Player records and session configuration.

use skirmish_protocol::{PlayerId, PlayerStats, ServerEvent};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Channel for delivering outbound events to one connection.
///
/// Unbounded so that a match actor never waits on a slow client. A send
/// to a closed outbox is dropped silently by every caller.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// Configuration for player registration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Longest display name kept, in characters. Longer names are cut.
    pub max_name_len: usize,

    /// Prefix for generated names, followed by a number in `0..1000`.
    pub fallback_name_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_name_len: 20,
            fallback_name_prefix: "Player".to_string(),
        }
    }
}

/// A registered player.
///
/// Created on `join`, flipped to disconnected when the transport reports
/// the connection gone, and removed once disconnect cleanup finishes.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub connected: bool,
    pub last_activity: Instant,
    pub stats: PlayerStats,
    pub outbox: Outbox,
}

impl Player {
    /// Pushes an event to this player's connection. Returns `false` if
    /// the connection's writer is gone.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.outbox.send(event).is_ok()
    }
}
