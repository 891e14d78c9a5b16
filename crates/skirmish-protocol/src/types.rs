//! Core value types carried by Skirmish events.
//!
//! Everything here is serialized with camelCase field names so that
//! browser clients can consume it without a mapping layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected player.
///
/// Stable for the lifetime of the connection that owns it. Serialized as a
/// plain number (`#[serde(transparent)]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Choice
// ---------------------------------------------------------------------------

/// One of the three legal round symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    /// Every legal choice, in a fixed order. Used for uniform random picks.
    pub const ALL: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissors];

    /// Returns `true` if `self` wins against `other`.
    ///
    /// Rock beats scissors, scissors beats paper, paper beats rock.
    pub fn beats(self, other: Choice) -> bool {
        matches!(
            (self, other),
            (Choice::Rock, Choice::Scissors)
                | (Choice::Scissors, Choice::Paper)
                | (Choice::Paper, Choice::Rock)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Choice::Rock => "rock",
            Choice::Paper => "paper",
            Choice::Scissors => "scissors",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" => Ok(Choice::Rock),
            "paper" => Ok(Choice::Paper),
            "scissors" => Ok(Choice::Scissors),
            _ => Err(ProtocolError::InvalidChoice(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// Symbols a room code may contain. Excludes `I`, `O`, `0` and `1`, which
/// are easy to misread when a code is shared out loud or on screen.
pub const ROOM_CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of symbols in a room code.
pub const ROOM_CODE_LEN: usize = 6;

/// A validated, upper-case six-symbol invitation code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Parses user input into a room code.
    ///
    /// Surrounding whitespace is ignored and input is case-insensitive.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidRoomCode`] if the normalized input is
    /// not exactly [`ROOM_CODE_LEN`] symbols from [`ROOM_CODE_ALPHABET`].
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let normalized = input.trim().to_ascii_uppercase();
        let valid = normalized.len() == ROOM_CODE_LEN
            && normalized.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b));
        if valid {
            Ok(Self(normalized))
        } else {
            Err(ProtocolError::InvalidRoomCode(input.to_string()))
        }
    }

    /// Builds a code from alphabet indices. Each index is reduced modulo the
    /// alphabet size, so any `[usize; ROOM_CODE_LEN]` yields a valid code.
    pub fn from_indices(indices: [usize; ROOM_CODE_LEN]) -> Self {
        let code = indices
            .iter()
            .map(|i| ROOM_CODE_ALPHABET[i % ROOM_CODE_ALPHABET.len()] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Match phase and outcomes
// ---------------------------------------------------------------------------

/// The lifecycle phase of a match.
///
/// ```text
/// Playing ──(final round resolves)──→ Finished
/// ```
///
/// The transition happens exactly once and never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPhase {
    Playing,
    Finished,
}

impl MatchPhase {
    /// Returns `true` while rounds are still being played.
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Which seat won a single round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundWinner {
    Player1,
    Player2,
    Tie,
}

impl RoundWinner {
    /// The same result seen from the other seat.
    pub fn mirrored(self) -> Self {
        match self {
            Self::Player1 => Self::Player2,
            Self::Player2 => Self::Player1,
            Self::Tie => Self::Tie,
        }
    }
}

/// Final result of a completed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchOutcome {
    /// The participant with the strictly higher score.
    Winner(PlayerId),
    /// Scores were level after the last round.
    Draw,
}

impl MatchOutcome {
    pub fn winner(self) -> Option<PlayerId> {
        match self {
            Self::Winner(id) => Some(id),
            Self::Draw => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One side of a [`RoundResult`], reflecting scores *after* the round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundParticipant {
    pub id: PlayerId,
    pub name: String,
    pub choice: Choice,
    pub score: u32,
}

/// The outcome of one resolved round, broadcast to both participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    /// 1-based number of the round that just resolved.
    pub round: u32,
    pub player1: RoundParticipant,
    pub player2: RoundParticipant,
    pub result: RoundWinner,
    /// The round winner's id, or `None` on a tie.
    pub winner: Option<PlayerId>,
    /// Match phase after this round.
    pub phase: MatchPhase,
    /// Present only on the round that finished the match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_outcome: Option<MatchOutcome>,
}

/// A match as seen by one participant.
///
/// The canonical record is player1/player2 indexed. This view is framed as
/// "me" against "opponent" instead, and never reveals the opponent's
/// pending choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub match_id: MatchId,
    pub round: u32,
    pub max_rounds: u32,
    pub phase: MatchPhase,
    pub my_score: u32,
    pub opponent_score: u32,
    pub my_name: String,
    pub opponent_name: String,
    pub my_choice: Option<Choice>,
    pub opponent_ready: bool,
    pub both_players_ready: bool,
    pub room_code: Option<RoomCode>,
    pub opponent_connected: bool,
}

/// Per-session win/loss record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl PlayerStats {
    pub fn record_win(&mut self) {
        self.matches_played += 1;
        self.wins += 1;
    }

    pub fn record_loss(&mut self) {
        self.matches_played += 1;
        self.losses += 1;
    }

    pub fn record_draw(&mut self) {
        self.matches_played += 1;
        self.draws += 1;
    }
}
