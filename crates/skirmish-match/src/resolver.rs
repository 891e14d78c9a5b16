//! Round and match outcome rules.

use skirmish_protocol::{Choice, MatchOutcome, PlayerId, RoundWinner};

/// Decides one round. Equal choices tie.
pub fn judge(player1: Choice, player2: Choice) -> RoundWinner {
    if player1 == player2 {
        RoundWinner::Tie
    } else if player1.beats(player2) {
        RoundWinner::Player1
    } else {
        RoundWinner::Player2
    }
}

/// Decides a finished match: strictly higher score wins, level is a draw.
pub fn final_outcome(player1: (PlayerId, u32), player2: (PlayerId, u32)) -> MatchOutcome {
    match player1.1.cmp(&player2.1) {
        std::cmp::Ordering::Greater => MatchOutcome::Winner(player1.0),
        std::cmp::Ordering::Less => MatchOutcome::Winner(player2.0),
        std::cmp::Ordering::Equal => MatchOutcome::Draw,
    }
}
