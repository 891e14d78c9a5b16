//! Timing primitives for Skirmish match actors and the reaper.
//!
//! - [`Countdown`]: a one-shot, cancellable deadline. A match actor owns
//!   one for the round timer and one for the post-match grace period.
//! - [`Sweeper`]: a fixed-interval ticker for periodic cleanup.
//!
//! # Integration
//!
//! Both are designed to sit inside an actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         () = round_timer.expired() => { /* force the round */ }
//!     }
//! }
//! ```
//!
//! Because the deadline and the commands are polled by the same task, a
//! firing timer can never interleave with a command's state change.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// A single cancellable deadline with a fixed duration.
///
/// ```text
/// [idle] ──start()──→ [armed] ──(deadline passes)──→ expired() resolves → [idle]
///   ↑                    │
///   └─────cancel()───────┘
/// ```
///
/// At most one deadline is live at a time: `start()` on an armed
/// countdown replaces the old deadline instead of adding a second one.
#[derive(Debug)]
pub struct Countdown {
    duration: Duration,
    deadline: Option<Instant>,
}

impl Countdown {
    /// Creates an idle countdown. Nothing fires until [`start`](Self::start).
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: None,
        }
    }

    /// Arms the countdown `duration` from now, discarding any pending
    /// deadline. Returns the duration for convenience.
    pub fn start(&mut self) -> Duration {
        if self.deadline.is_some() {
            trace!("countdown restarted before expiry");
        }
        self.deadline = Some(Instant::now() + self.duration);
        self.duration
    }

    /// Disarms the countdown. Always safe to call, armed or not.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            trace!("countdown cancelled");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time left before expiry, or `None` when idle.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Resolves once the armed deadline passes, then disarms.
    ///
    /// While idle this future pends forever. It will never resolve on its
    /// own, but `tokio::select!` keeps processing the other branches. If
    /// the enclosing `select!` picks another branch first, dropping this
    /// future leaves the deadline armed.
    pub async fn expired(&mut self) {
        let Some(deadline) = self.deadline else {
            std::future::pending::<()>().await;
            return;
        };

        time::sleep_until(deadline).await;
        self.deadline = None;
        trace!(duration_ms = self.duration.as_millis() as u64, "countdown expired");
    }
}

// ---------------------------------------------------------------------------
// Sweeper
// ---------------------------------------------------------------------------

/// Fixed-interval ticker for background sweeps.
///
/// The first tick fires one full period after creation, not immediately.
/// Sweeps that fall behind are skipped rather than run back to back.
#[derive(Debug)]
pub struct Sweeper {
    interval: Interval,
    sweeps: u64,
}

impl Sweeper {
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(period_ms = period.as_millis() as u64, "sweeper created");
        Self {
            interval,
            sweeps: 0,
        }
    }

    /// Waits for the next sweep and returns its 1-based number.
    pub async fn tick(&mut self) -> u64 {
        self.interval.tick().await;
        self.sweeps += 1;
        self.sweeps
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }
}
