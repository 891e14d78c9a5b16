//! Lobby configuration.

use std::time::Duration;

/// Settings for the room directory.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// Rooms older than this are evicted by the reaper, joined or not.
    pub room_ttl: Duration,

    /// Attempts at drawing an unused code before giving up.
    pub max_code_attempts: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            room_ttl: Duration::from_secs(10 * 60),
            max_code_attempts: 64,
        }
    }
}
