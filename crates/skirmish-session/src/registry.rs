//! The player registry: every joined connection and its record.
//!
//! # Concurrency note
//!
//! `PlayerRegistry` is a plain `HashMap` wrapper. The arena owns one
//! instance behind a `tokio::sync::Mutex`, so none of the methods here
//! lock anything themselves.

use std::collections::HashMap;

use rand::Rng;
use skirmish_protocol::{PlayerId, PlayerStats};
use tokio::time::Instant;

use crate::{Outbox, Player, SessionConfig, SessionError};

/// Tracks every registered player, keyed by connection-derived id.
///
/// ```text
/// register() ──→ [connected] ──mark_disconnected()──→ [disconnected] ──remove()──→ gone
///      ↑               │
///      └──(re-join)────┘  keeps stats and outbox, updates the name
/// ```
pub struct PlayerRegistry {
    players: HashMap<PlayerId, Player>,
    config: SessionConfig,
}

impl PlayerRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            players: HashMap::new(),
            config,
        }
    }

    /// Registers a connection under a display name. Never blocks or fails.
    ///
    /// A blank or missing name gets a generated `Player<n>` fallback.
    /// Names are not required to be unique. Registering an id that is
    /// already known refreshes its name and activity but keeps its stats
    /// and outbox.
    pub fn register(
        &mut self,
        id: PlayerId,
        requested_name: Option<&str>,
        outbox: Outbox,
    ) -> &Player {
        let name = self.display_name(requested_name);
        let now = Instant::now();

        let player = self
            .players
            .entry(id)
            .and_modify(|p| {
                p.name = name.clone();
                p.connected = true;
                p.last_activity = now;
            })
            .or_insert_with(|| Player {
                id,
                name: name.clone(),
                connected: true,
                last_activity: now,
                stats: PlayerStats::default(),
                outbox,
            });

        tracing::info!(player_id = %id, name = %player.name, "player joined");
        player
    }

    /// Looks up a joined player.
    ///
    /// # Errors
    /// Returns [`SessionError::NotJoined`] if `id` never registered.
    pub fn lookup(&self, id: PlayerId) -> Result<&Player, SessionError> {
        self.players.get(&id).ok_or(SessionError::NotJoined(id))
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// `true` if the player is registered and its connection is still up.
    pub fn is_connected(&self, id: PlayerId) -> bool {
        self.players.get(&id).is_some_and(|p| p.connected)
    }

    /// Flags a player as disconnected. Returns `false` if unknown.
    pub fn mark_disconnected(&mut self, id: PlayerId) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.connected = false;
                tracing::debug!(player_id = %id, "player marked disconnected");
                true
            }
            None => false,
        }
    }

    /// Refreshes the activity timestamp. No-op for unknown ids.
    pub fn touch(&mut self, id: PlayerId) {
        if let Some(player) = self.players.get_mut(&id) {
            player.last_activity = Instant::now();
        }
    }

    /// Applies `update` to the player's stats, if the player still exists.
    ///
    /// Match results can arrive after a participant already left, in which
    /// case the update is dropped with the rest of that player's session.
    pub fn update_stats(&mut self, id: PlayerId, update: impl FnOnce(&mut PlayerStats)) {
        if let Some(player) = self.players.get_mut(&id) {
            update(&mut player.stats);
        }
    }

    /// Deletes a player's record entirely.
    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        let removed = self.players.remove(&id);
        if removed.is_some() {
            tracing::info!(player_id = %id, "player removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn display_name(&self, requested: Option<&str>) -> String {
        let trimmed = requested.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            let n = rand::rng().random_range(0..1000);
            return format!("{}{n}", self.config.fallback_name_prefix);
        }
        trimmed.chars().take(self.config.max_name_len).collect()
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
