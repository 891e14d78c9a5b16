//! Match book: spawns match actors and tracks which player is in which
//! match.

use std::collections::HashMap;

use skirmish_protocol::{MatchId, PlayerId, RoomCode};
use tokio::sync::mpsc;

use crate::actor::spawn_match;
use crate::{MatchConfig, MatchError, MatchEvent, MatchHandle, MatchSeat};

/// All live matches plus the player→match index.
///
/// A player is in at most ONE match at a time (key invariant). Entries
/// stay until [`release`](Self::release) is called for the match, which
/// happens when it is torn down, not when it finishes.
pub struct MatchBook {
    matches: HashMap<MatchId, MatchHandle>,
    by_player: HashMap<PlayerId, MatchId>,
    config: MatchConfig,
    events: mpsc::UnboundedSender<MatchEvent>,
}

impl MatchBook {
    /// Creates an empty book. Every actor it spawns reports lifecycle
    /// events on `events`.
    pub fn new(config: MatchConfig, events: mpsc::UnboundedSender<MatchEvent>) -> Self {
        Self {
            matches: HashMap::new(),
            by_player: HashMap::new(),
            config,
            events,
        }
    }

    /// Starts a match with `seats[0]` as player1 and `seats[1]` as
    /// player2, and indexes both.
    ///
    /// # Errors
    /// [`MatchError::AlreadyMatched`] if either player already holds a
    /// match. Nothing is spawned in that case.
    pub fn open(
        &mut self,
        seats: [MatchSeat; 2],
        room_code: Option<RoomCode>,
    ) -> Result<MatchHandle, MatchError> {
        if let Some(seat) = seats.iter().find(|s| self.by_player.contains_key(&s.id)) {
            return Err(MatchError::AlreadyMatched(seat.id));
        }
        if seats[0].id == seats[1].id {
            return Err(MatchError::Invariant(format!(
                "player {} cannot be matched against themselves",
                seats[0].id
            )));
        }

        let handle = spawn_match(seats, room_code, self.config.clone(), self.events.clone());
        let match_id = handle.match_id();
        for pid in handle.players() {
            self.by_player.insert(pid, match_id);
        }
        self.matches.insert(match_id, handle.clone());
        Ok(handle)
    }

    pub fn handle_for(&self, player_id: PlayerId) -> Option<&MatchHandle> {
        self.by_player
            .get(&player_id)
            .and_then(|id| self.matches.get(id))
    }

    pub fn match_of(&self, player_id: PlayerId) -> Option<MatchId> {
        self.by_player.get(&player_id).copied()
    }

    pub fn contains_player(&self, player_id: PlayerId) -> bool {
        self.by_player.contains_key(&player_id)
    }

    /// Drops a match and every index entry pointing at it.
    ///
    /// Idempotent. Entries that already point at a newer match (after a
    /// rematch) are left alone.
    pub fn release(&mut self, match_id: MatchId) -> Option<MatchHandle> {
        let handle = self.matches.remove(&match_id)?;
        for pid in handle.players() {
            if self.by_player.get(&pid) == Some(&match_id) {
                self.by_player.remove(&pid);
            }
        }
        tracing::debug!(%match_id, "match released");
        Some(handle)
    }

    /// Cloned handles to every live match.
    ///
    /// Useful when callers need to await match actors without holding
    /// the book's lock.
    pub fn handles(&self) -> Vec<MatchHandle> {
        self.matches.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }
}
