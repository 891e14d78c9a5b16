//! Wire protocol for Skirmish.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`PlayerId`], [`Choice`], [`RoomCode`], [`MatchView`],
//!   [`RoundResult`], ...): the values that travel inside events.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): one JSON object per
//!   frame, `{"event": "...", "data": {...}}`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become bytes.
//! - **Errors** ([`ProtocolError`]): encoding failures and malformed
//!   scalar input (choices, room codes).
//!
//! # Architecture
//!
//! The protocol layer knows nothing about connections, queues, or match
//! state. It only describes and validates messages.
//!
//! ```text
//! Transport (frames) → Protocol (events) → Arena (matches, rooms, queue)
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, QueueStatus, ServerEvent};
pub use types::{
    Choice, MatchId, MatchOutcome, MatchPhase, MatchView, PlayerId,
    PlayerStats, ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode,
    RoundParticipant, RoundResult, RoundWinner,
};
