//! Private rooms: a host hands out a short code, one other player joins
//! with it, and the pair becomes a match.

use std::collections::HashMap;

use rand::Rng;
use skirmish_protocol::{PlayerId, ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode};
use tokio::time::Instant;

use crate::{LobbyConfig, LobbyError};

/// A waiting invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub code: RoomCode,
    pub host: PlayerId,
    pub created_at: Instant,
}

/// All open rooms, indexed both by code and by host.
///
/// A host owns at most one room at a time. Both maps are updated together
/// so `rooms` and `hosts` always describe the same set.
#[derive(Debug)]
pub struct RoomDirectory {
    rooms: HashMap<RoomCode, Room>,
    hosts: HashMap<PlayerId, RoomCode>,
    config: LobbyConfig,
}

impl RoomDirectory {
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            hosts: HashMap::new(),
            config,
        }
    }

    /// Opens a room for `host` with a fresh code, replacing any room the
    /// host already had.
    pub fn create_room(&mut self, host: PlayerId) -> Result<RoomCode, LobbyError> {
        self.create_room_with(host, &mut rand::rng())
    }

    /// [`create_room`](Self::create_room) with a caller-supplied RNG.
    ///
    /// # Errors
    /// [`LobbyError::CodeSpaceExhausted`] if `max_code_attempts` draws all
    /// collide with live rooms.
    pub fn create_room_with<R: Rng + ?Sized>(
        &mut self,
        host: PlayerId,
        rng: &mut R,
    ) -> Result<RoomCode, LobbyError> {
        if let Some(old) = self.remove_hosted_by(host) {
            tracing::debug!(%host, room_code = %old.code, "replaced previous room");
        }

        let code = self.unused_code(rng)?;
        let room = Room {
            code: code.clone(),
            host,
            created_at: Instant::now(),
        };
        self.rooms.insert(code.clone(), room);
        self.hosts.insert(host, code.clone());

        tracing::info!(%host, room_code = %code, "room created");
        Ok(code)
    }

    fn unused_code<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RoomCode, LobbyError> {
        for _ in 0..self.config.max_code_attempts {
            let indices: [usize; ROOM_CODE_LEN] =
                std::array::from_fn(|_| rng.random_range(0..ROOM_CODE_ALPHABET.len()));
            let code = RoomCode::from_indices(indices);
            if !self.rooms.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(LobbyError::CodeSpaceExhausted(self.config.max_code_attempts))
    }

    /// Takes the room behind `code` for `joiner`.
    ///
    /// On success the room is removed and returned so the caller can pair
    /// `room.host` (player1) with `joiner` (player2).
    ///
    /// # Errors
    /// - [`LobbyError::RoomNotFound`] if no room has this code.
    /// - [`LobbyError::SelfJoin`] if `joiner` is the host. The room stays.
    /// - [`LobbyError::HostUnavailable`] if `host_available` says the host
    ///   is gone or already matched. The stale room is deleted.
    pub fn claim(
        &mut self,
        code: &RoomCode,
        joiner: PlayerId,
        host_available: impl FnOnce(PlayerId) -> bool,
    ) -> Result<Room, LobbyError> {
        let host = self
            .rooms
            .get(code)
            .map(|room| room.host)
            .ok_or(LobbyError::RoomNotFound)?;

        if host == joiner {
            return Err(LobbyError::SelfJoin);
        }

        let room = self.remove(code).ok_or(LobbyError::RoomNotFound)?;
        if !host_available(host) {
            tracing::debug!(%host, room_code = %code, "dropped room with unavailable host");
            return Err(LobbyError::HostUnavailable);
        }

        tracing::info!(%host, %joiner, room_code = %code, "room claimed");
        Ok(room)
    }

    /// Deletes the room owned by `host`, if any.
    pub fn remove_hosted_by(&mut self, host: PlayerId) -> Option<Room> {
        let code = self.hosts.get(&host)?.clone();
        self.remove(&code)
    }

    /// Evicts every room older than the configured TTL and returns the
    /// evicted codes.
    pub fn expire(&mut self) -> Vec<RoomCode> {
        let ttl = self.config.room_ttl;
        let stale: Vec<RoomCode> = self
            .rooms
            .values()
            .filter(|room| room.created_at.elapsed() > ttl)
            .map(|room| room.code.clone())
            .collect();

        for code in &stale {
            self.remove(code);
            tracing::info!(room_code = %code, "room expired");
        }
        stale
    }

    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// The code of the room `host` currently owns.
    pub fn room_of(&self, host: PlayerId) -> Option<&RoomCode> {
        self.hosts.get(&host)
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn remove(&mut self, code: &RoomCode) -> Option<Room> {
        let room = self.rooms.remove(code)?;
        self.hosts.remove(&room.host);
        Some(room)
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new(LobbyConfig::default())
    }
}
