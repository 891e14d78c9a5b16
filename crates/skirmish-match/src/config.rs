//! Match configuration.

use std::time::Duration;

/// Round limit and timing for every match.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Rounds per match. The match finishes when this many have resolved.
    pub max_rounds: u32,

    /// How long participants get to choose before a choice is assigned.
    pub round_duration: Duration,

    /// How long a finished match lingers so both sides can see the
    /// result (and ask for a rematch) before it is torn down.
    pub finished_grace: Duration,

    /// A match with no player activity for this long is evicted by the
    /// reaper, whatever its phase.
    pub idle_timeout: Duration,

    /// Capacity of each match actor's command channel.
    pub channel_size: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            round_duration: Duration::from_secs(15),
            finished_grace: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(5 * 60),
            channel_size: 32,
        }
    }
}
