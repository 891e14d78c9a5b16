//! The canonical match record and its state machine.
//!
//! A [`Match`] is plain data with synchronous transitions. It knows
//! nothing about timers or connections; the actor in `actor.rs` drives
//! it and turns its results into outbound events.

use std::time::Duration;

use rand::Rng;
use skirmish_protocol::{
    Choice, MatchId, MatchPhase, MatchView, PlayerId, RoomCode, RoundParticipant, RoundResult,
    RoundWinner,
};
use tokio::time::Instant;

use crate::{MatchError, final_outcome, judge};

/// One side of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: PlayerId,
    /// Display name captured when the match was created.
    pub name: String,
    pub score: u32,
    /// This round's committed choice. `Some` means ready.
    pub choice: Option<Choice>,
}

impl Participant {
    fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            score: 0,
            choice: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.choice.is_some()
    }
}

/// A best-of-N match between exactly two participants.
///
/// ```text
/// Playing ──resolve() with round == max_rounds──→ Finished
/// ```
///
/// Invariants:
/// - while `Playing`, `round < max_rounds`
/// - `Finished` is entered exactly once and never left
/// - a participant holds at most one choice per round
#[derive(Debug, Clone)]
pub struct Match {
    id: MatchId,
    seats: [Participant; 2],
    round: u32,
    max_rounds: u32,
    phase: MatchPhase,
    room_code: Option<RoomCode>,
    last_activity: Instant,
}

impl Match {
    pub fn new(
        id: MatchId,
        player1: (PlayerId, String),
        player2: (PlayerId, String),
        max_rounds: u32,
        room_code: Option<RoomCode>,
    ) -> Self {
        Self {
            id,
            seats: [
                Participant::new(player1.0, player1.1),
                Participant::new(player2.0, player2.1),
            ],
            round: 0,
            max_rounds: max_rounds.max(1),
            phase: MatchPhase::Playing,
            room_code,
            last_activity: Instant::now(),
        }
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    /// Number of rounds resolved so far.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn room_code(&self) -> Option<&RoomCode> {
        self.room_code.as_ref()
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// `[player1, player2]`.
    pub fn players(&self) -> [PlayerId; 2] {
        [self.seats[0].id, self.seats[1].id]
    }

    pub fn participant(&self, player_id: PlayerId) -> Option<&Participant> {
        self.seat_of(player_id).map(|seat| &self.seats[seat])
    }

    pub fn opponent_of(&self, player_id: PlayerId) -> Option<&Participant> {
        self.seat_of(player_id).map(|seat| &self.seats[1 - seat])
    }

    pub fn both_ready(&self) -> bool {
        self.seats.iter().all(Participant::is_ready)
    }

    /// Refreshes the activity timestamp used by the idle reaper.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// `true` if no participant has acted for longer than `timeout`.
    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }

    /// Records a participant's choice for the current round.
    ///
    /// # Errors
    /// - [`MatchError::NotParticipant`] if `player_id` is not seated here.
    /// - [`MatchError::NotActive`] once the match is finished.
    /// - [`MatchError::AlreadyChosen`] if this participant already chose
    ///   this round. The match is left untouched.
    pub fn submit_choice(&mut self, player_id: PlayerId, choice: Choice) -> Result<(), MatchError> {
        let seat = self
            .seat_of(player_id)
            .ok_or(MatchError::NotParticipant(player_id))?;
        if !self.phase.is_playing() {
            return Err(MatchError::NotActive);
        }
        if self.seats[seat].is_ready() {
            return Err(MatchError::AlreadyChosen);
        }

        self.seats[seat].choice = Some(choice);
        self.touch();
        Ok(())
    }

    /// Picks a uniformly random choice for every participant who has none.
    ///
    /// Returns who got what. Participants who already chose keep their
    /// choice. Does nothing once the match is finished.
    pub fn assign_missing<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<(PlayerId, Choice)> {
        if !self.phase.is_playing() {
            return Vec::new();
        }

        let mut assigned = Vec::new();
        for seat in self.seats.iter_mut().filter(|s| !s.is_ready()) {
            let choice = Choice::ALL[rng.random_range(0..Choice::ALL.len())];
            seat.choice = Some(choice);
            assigned.push((seat.id, choice));
        }
        assigned
    }

    /// Resolves the current round from both committed choices.
    ///
    /// Scores the round, advances the round counter, clears both choices,
    /// and finishes the match when the counter reaches the round limit.
    /// The returned result reflects scores after this round.
    ///
    /// # Errors
    /// - [`MatchError::NotActive`] if the match is already finished.
    /// - [`MatchError::Invariant`] if either choice is missing. Nothing is
    ///   changed in that case.
    pub fn resolve(&mut self) -> Result<RoundResult, MatchError> {
        if !self.phase.is_playing() {
            return Err(MatchError::NotActive);
        }
        let (Some(c1), Some(c2)) = (self.seats[0].choice, self.seats[1].choice) else {
            return Err(MatchError::Invariant(format!(
                "match {} resolved round {} without both choices",
                self.id,
                self.round + 1
            )));
        };

        let result = judge(c1, c2);
        let winner = match result {
            RoundWinner::Player1 => Some(0),
            RoundWinner::Player2 => Some(1),
            RoundWinner::Tie => None,
        };
        if let Some(seat) = winner {
            self.seats[seat].score += 1;
        }
        self.round += 1;
        for seat in &mut self.seats {
            seat.choice = None;
        }

        let match_outcome = if self.round >= self.max_rounds {
            self.phase = MatchPhase::Finished;
            Some(final_outcome(
                (self.seats[0].id, self.seats[0].score),
                (self.seats[1].id, self.seats[1].score),
            ))
        } else {
            None
        };

        let [p1, p2] = &self.seats;
        Ok(RoundResult {
            round: self.round,
            player1: RoundParticipant {
                id: p1.id,
                name: p1.name.clone(),
                choice: c1,
                score: p1.score,
            },
            player2: RoundParticipant {
                id: p2.id,
                name: p2.name.clone(),
                choice: c2,
                score: p2.score,
            },
            result,
            winner: winner.map(|seat| self.seats[seat].id),
            phase: self.phase,
            match_outcome,
        })
    }

    /// The match as `player_id` sees it. `None` if they are not seated here.
    pub fn view_for(&self, player_id: PlayerId, opponent_connected: bool) -> Option<MatchView> {
        let seat = self.seat_of(player_id)?;
        let me = &self.seats[seat];
        let opponent = &self.seats[1 - seat];
        Some(MatchView {
            match_id: self.id,
            round: self.round,
            max_rounds: self.max_rounds,
            phase: self.phase,
            my_score: me.score,
            opponent_score: opponent.score,
            my_name: me.name.clone(),
            opponent_name: opponent.name.clone(),
            my_choice: me.choice,
            opponent_ready: opponent.is_ready(),
            both_players_ready: self.both_ready(),
            room_code: self.room_code.clone(),
            opponent_connected,
        })
    }

    fn seat_of(&self, player_id: PlayerId) -> Option<usize> {
        self.seats.iter().position(|s| s.id == player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_protocol::MatchOutcome;

    const A: PlayerId = PlayerId(1);
    const B: PlayerId = PlayerId(2);

    fn new_match() -> Match {
        Match::new(MatchId(1), (A, "alice".into()), (B, "bob".into()), 3, None)
    }

    fn play(m: &mut Match, a: Choice, b: Choice) -> RoundResult {
        m.submit_choice(A, a).unwrap();
        m.submit_choice(B, b).unwrap();
        m.resolve().unwrap()
    }

    #[test]
    fn test_new_match_starts_playing_at_round_zero() {
        let m = new_match();
        assert_eq!(m.round(), 0);
        assert_eq!(m.phase(), MatchPhase::Playing);
        assert_eq!(m.players(), [A, B]);
        assert!(!m.both_ready());
    }

    #[test]
    fn test_submit_choice_twice_is_rejected_without_side_effects() {
        let mut m = new_match();
        m.submit_choice(A, Choice::Rock).unwrap();

        let err = m.submit_choice(A, Choice::Paper).unwrap_err();
        assert!(matches!(err, MatchError::AlreadyChosen));
        assert_eq!(m.participant(A).unwrap().choice, Some(Choice::Rock));
        assert_eq!(m.round(), 0);
        assert_eq!(m.participant(A).unwrap().score, 0);
    }

    #[test]
    fn test_submit_choice_from_stranger() {
        let mut m = new_match();
        let err = m.submit_choice(PlayerId(9), Choice::Rock).unwrap_err();
        assert!(matches!(err, MatchError::NotParticipant(p) if p == PlayerId(9)));
    }

    #[test]
    fn test_resolve_scores_and_clears_choices() {
        let mut m = new_match();
        let result = play(&mut m, Choice::Rock, Choice::Scissors);

        assert_eq!(result.round, 1);
        assert_eq!(result.result, RoundWinner::Player1);
        assert_eq!(result.winner, Some(A));
        assert_eq!(result.player1.score, 1);
        assert_eq!(result.player2.score, 0);
        assert_eq!(result.phase, MatchPhase::Playing);
        assert_eq!(result.match_outcome, None);
        assert!(m.participant(A).unwrap().choice.is_none());
        assert!(m.participant(B).unwrap().choice.is_none());
    }

    #[test]
    fn test_tie_leaves_scores_unchanged() {
        let mut m = new_match();
        let result = play(&mut m, Choice::Paper, Choice::Paper);
        assert_eq!(result.result, RoundWinner::Tie);
        assert_eq!(result.winner, None);
        assert_eq!((result.player1.score, result.player2.score), (0, 0));
        assert_eq!(m.round(), 1);
    }

    #[test]
    fn test_match_finishes_exactly_at_round_limit() {
        let mut m = new_match();
        play(&mut m, Choice::Rock, Choice::Scissors);
        let second = play(&mut m, Choice::Rock, Choice::Rock);
        assert_eq!(second.phase, MatchPhase::Playing);

        let last = play(&mut m, Choice::Rock, Choice::Rock);
        assert_eq!(last.round, 3);
        assert_eq!(last.phase, MatchPhase::Finished);
        assert_eq!(last.match_outcome, Some(MatchOutcome::Winner(A)));
        assert_eq!(m.phase(), MatchPhase::Finished);
    }

    #[test]
    fn test_finished_match_rejects_everything() {
        let mut m = new_match();
        for _ in 0..3 {
            play(&mut m, Choice::Rock, Choice::Rock);
        }
        assert_eq!(m.phase(), MatchPhase::Finished);

        assert!(matches!(
            m.submit_choice(A, Choice::Rock),
            Err(MatchError::NotActive)
        ));
        assert!(matches!(m.resolve(), Err(MatchError::NotActive)));
        assert!(m.assign_missing(&mut rand::rng()).is_empty());
        assert_eq!(m.round(), 3);
        assert_eq!(m.phase(), MatchPhase::Finished);
    }

    #[test]
    fn test_drawn_match_has_no_winner() {
        let mut m = new_match();
        play(&mut m, Choice::Rock, Choice::Scissors);
        play(&mut m, Choice::Rock, Choice::Paper);
        let last = play(&mut m, Choice::Rock, Choice::Rock);
        assert_eq!(last.match_outcome, Some(MatchOutcome::Draw));
    }

    #[test]
    fn test_resolve_without_both_choices_is_an_invariant_error() {
        let mut m = new_match();
        m.submit_choice(A, Choice::Rock).unwrap();

        let err = m.resolve().unwrap_err();
        assert!(matches!(err, MatchError::Invariant(_)));
        assert_eq!(m.round(), 0);
        assert_eq!(m.participant(A).unwrap().choice, Some(Choice::Rock));
    }

    #[test]
    fn test_assign_missing_keeps_existing_choice() {
        let mut m = new_match();
        m.submit_choice(A, Choice::Scissors).unwrap();

        let assigned = m.assign_missing(&mut rand::rng());

        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].0, B);
        assert_eq!(m.participant(A).unwrap().choice, Some(Choice::Scissors));
        assert_eq!(m.participant(B).unwrap().choice, Some(assigned[0].1));
        assert!(m.both_ready());
    }

    #[test]
    fn test_view_is_framed_per_viewer_and_hides_opponent_choice() {
        let mut m = Match::new(
            MatchId(5),
            (A, "alice".into()),
            (B, "bob".into()),
            3,
            RoomCode::parse("ABC234").ok(),
        );
        m.submit_choice(B, Choice::Paper).unwrap();

        let va = m.view_for(A, true).unwrap();
        assert_eq!(va.my_name, "alice");
        assert_eq!(va.opponent_name, "bob");
        assert_eq!(va.my_choice, None);
        assert!(va.opponent_ready);
        assert!(!va.both_players_ready);
        assert_eq!(va.room_code.as_ref().map(RoomCode::as_str), Some("ABC234"));

        let vb = m.view_for(B, true).unwrap();
        assert_eq!(vb.my_name, "bob");
        assert_eq!(vb.my_choice, Some(Choice::Paper));
        assert!(!vb.opponent_ready);

        assert!(m.view_for(PlayerId(9), true).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_tracks_last_activity() {
        let mut m = new_match();
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(m.is_idle(Duration::from_secs(60)));

        m.submit_choice(A, Choice::Rock).unwrap();
        assert!(!m.is_idle(Duration::from_secs(60)));
    }
}
