//! The orchestration service: every player-facing operation.
//!
//! `Arena` owns the four shared structures, each behind its own lock:
//!
//! ```text
//! players ─→ queue ─→ rooms ─→ matches      (acquisition order)
//! ```
//!
//! When an operation needs several at once it takes them in that order.
//! No lock is held while waiting on a match actor; operations clone the
//! actor's handle, drop the locks, then await the reply.
//!
//! Success events are pushed to the player's outbox from here or from
//! the match actor. Errors are returned to the caller, which reports them
//! to the originating connection.

use std::sync::{Arc, Weak};

use skirmish_lobby::{LobbyError, MatchmakingQueue, RoomDirectory};
use skirmish_match::{LeaveReason, MatchBook, MatchError, MatchEvent, MatchHandle, MatchSeat};
use skirmish_protocol::{
    Choice, MatchId, MatchOutcome, MatchView, PlayerId, PlayerStats, QueueStatus, RoomCode,
    ServerEvent,
};
use skirmish_session::{Outbox, PlayerRegistry, SessionError};
use skirmish_timer::Sweeper;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::{ArenaConfig, SkirmishError};

/// What one reaper sweep evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub matches: Vec<MatchId>,
    pub rooms: Vec<RoomCode>,
}

impl ReapReport {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.rooms.is_empty()
    }
}

struct ArenaInner {
    players: Mutex<PlayerRegistry>,
    queue: Mutex<MatchmakingQueue>,
    rooms: Mutex<RoomDirectory>,
    matches: Mutex<MatchBook>,
    config: ArenaConfig,
}

/// Shared handle to the orchestration service.
///
/// Cheap to clone: every connection task holds one.
#[derive(Clone)]
pub struct Arena {
    inner: Arc<ArenaInner>,
}

impl Arena {
    /// Creates the service and starts its lifecycle task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: ArenaConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(ArenaInner {
            players: Mutex::new(PlayerRegistry::new(config.session.clone())),
            queue: Mutex::new(MatchmakingQueue::new()),
            rooms: Mutex::new(RoomDirectory::new(config.lobby.clone())),
            matches: Mutex::new(MatchBook::new(config.matches.clone(), events_tx)),
            config,
        });
        tokio::spawn(run_lifecycle(Arc::downgrade(&inner), events_rx));
        Self { inner }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.inner.config
    }

    // -----------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------

    /// Registers `player_id` under a display name and replies `joined`.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: Option<&str>,
        outbox: Outbox,
    ) -> Result<(), SkirmishError> {
        let mut players = self.inner.players.lock().await;
        let player = players.register(player_id, name, outbox);
        player.send(ServerEvent::Joined {
            player_id,
            player_name: player.name.clone(),
            stats: player.stats,
        });
        Ok(())
    }

    /// Replies `pong` and counts as activity.
    pub async fn ping(&self, player_id: PlayerId, outbox: &Outbox) {
        self.inner.players.lock().await.touch(player_id);
        let _ = outbox.send(ServerEvent::Pong);
    }

    /// Replies with the player's session stats.
    pub async fn stats(&self, player_id: PlayerId) -> Result<PlayerStats, SkirmishError> {
        let players = self.inner.players.lock().await;
        let player = players.lookup(player_id)?;
        player.send(ServerEvent::Stats(player.stats));
        Ok(player.stats)
    }

    // -----------------------------------------------------------------
    // Matchmaking
    // -----------------------------------------------------------------

    /// Pairs the player with the longest-waiting live opponent, or queues
    /// them if there is none.
    ///
    /// The requester becomes player1.
    pub async fn find_match(&self, player_id: PlayerId) -> Result<(), SkirmishError> {
        let mut players = self.inner.players.lock().await;
        players.lookup(player_id)?;
        players.touch(player_id);
        let mut queue = self.inner.queue.lock().await;
        let mut matches = self.inner.matches.lock().await;

        if matches.contains_player(player_id) {
            return Err(MatchError::AlreadyMatched(player_id).into());
        }
        if queue.contains(player_id) {
            return Err(LobbyError::AlreadyQueued(player_id).into());
        }

        let opponent = queue.dequeue_opponent_for(player_id, |candidate| {
            players.is_connected(candidate) && !matches.contains_player(candidate)
        });

        match opponent {
            Some(opponent) => {
                let seats = [seat(&players, player_id)?, seat(&players, opponent)?];
                matches.open(seats, None)?;
            }
            None => {
                queue.enqueue(player_id)?;
                tracing::info!(%player_id, waiting = queue.len(), "player searching");
                if let Some(player) = players.get(player_id) {
                    player.send(ServerEvent::MatchmakingStatus {
                        status: QueueStatus::Searching,
                    });
                }
            }
        }
        Ok(())
    }

    /// Leaves the matchmaking queue. Succeeds even if not queued.
    pub async fn cancel_matchmaking(&self, player_id: PlayerId) -> Result<(), SkirmishError> {
        let players = self.inner.players.lock().await;
        let player = players.lookup(player_id)?;
        // Confirmed even when nothing was queued, so a client whose entry
        // was already consumed by a pairing still gets an answer.
        if self.inner.queue.lock().await.cancel(player_id) {
            tracing::debug!(%player_id, "matchmaking cancelled");
        }
        player.send(ServerEvent::MatchmakingCancelled);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Private rooms
    // -----------------------------------------------------------------

    /// Opens a private room hosted by the player and replies with its code.
    ///
    /// Replaces any room the player already hosts and takes them out of
    /// the matchmaking queue.
    pub async fn create_room(&self, player_id: PlayerId) -> Result<RoomCode, SkirmishError> {
        let mut players = self.inner.players.lock().await;
        players.lookup(player_id)?;
        players.touch(player_id);
        let mut queue = self.inner.queue.lock().await;
        let mut rooms = self.inner.rooms.lock().await;
        let matches = self.inner.matches.lock().await;

        if matches.contains_player(player_id) {
            return Err(MatchError::AlreadyMatched(player_id).into());
        }
        queue.cancel(player_id);
        let code = rooms.create_room(player_id)?;

        if let Some(player) = players.get(player_id) {
            player.send(ServerEvent::RoomCreated {
                room_code: code.clone(),
            });
        }
        Ok(code)
    }

    /// Joins the host behind `raw_code`. The host becomes player1.
    pub async fn join_room(&self, player_id: PlayerId, raw_code: &str) -> Result<(), SkirmishError> {
        let mut players = self.inner.players.lock().await;
        players.lookup(player_id)?;
        players.touch(player_id);
        let mut queue = self.inner.queue.lock().await;
        queue.cancel(player_id);

        let code = RoomCode::parse(raw_code)?;
        let mut rooms = self.inner.rooms.lock().await;
        let mut matches = self.inner.matches.lock().await;

        if matches.contains_player(player_id) {
            return Err(MatchError::AlreadyMatched(player_id).into());
        }
        let room = rooms.claim(&code, player_id, |host| {
            players.is_connected(host) && !matches.contains_player(host)
        })?;

        queue.cancel(room.host);
        let seats = [seat(&players, room.host)?, seat(&players, player_id)?];
        matches.open(seats, Some(room.code))?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // In-match actions
    // -----------------------------------------------------------------

    /// Commits the player's choice for the current round.
    ///
    /// Checked in order: joined, legal choice, active match, not yet
    /// chosen this round.
    pub async fn make_choice(&self, player_id: PlayerId, raw_choice: &str) -> Result<(), SkirmishError> {
        self.touch_joined(player_id).await?;
        let choice: Choice = raw_choice.parse()?;
        let handle = self.active_handle(player_id).await?;
        handle.submit(player_id, choice).await.map_err(settle)?;
        Ok(())
    }

    /// Relays a chat line to both participants of the player's match.
    pub async fn send_chat(&self, player_id: PlayerId, text: String) -> Result<(), SkirmishError> {
        self.touch_joined(player_id).await?;
        let handle = self.active_handle(player_id).await?;
        handle.chat(player_id, text).await.map_err(settle)?;
        Ok(())
    }

    /// Asks the opponent for a rematch. Only valid while the finished
    /// match is still open.
    pub async fn request_rematch(&self, player_id: PlayerId) -> Result<(), SkirmishError> {
        self.touch_joined(player_id).await?;
        let handle = self.rematch_handle(player_id).await?;
        handle.request_rematch(player_id).await.map_err(settle_rematch)?;
        Ok(())
    }

    /// Accepts the opponent's rematch request and starts a fresh match
    /// with the same seating and room code.
    pub async fn accept_rematch(&self, player_id: PlayerId) -> Result<(), SkirmishError> {
        self.touch_joined(player_id).await?;
        let handle = self.rematch_handle(player_id).await?;
        let terms = handle.accept_rematch(player_id).await.map_err(settle_rematch)?;

        let players = self.inner.players.lock().await;
        let mut matches = self.inner.matches.lock().await;
        matches.release(handle.match_id());
        // A disconnect may be midway through tearing the old match down.
        if !terms.players.iter().all(|pid| players.is_connected(*pid)) {
            tracing::debug!(%player_id, match_id = %handle.match_id(), "rematch partner gone");
            return Err(MatchError::RematchUnavailable.into());
        }
        let seats = [
            seat(&players, terms.players[0]).map_err(|_| MatchError::RematchUnavailable)?,
            seat(&players, terms.players[1]).map_err(|_| MatchError::RematchUnavailable)?,
        ];
        matches.open(seats, terms.room_code)?;
        Ok(())
    }

    /// Leaves the current match. A match still being played is forfeited
    /// to the opponent.
    pub async fn leave_match(&self, player_id: PlayerId) -> Result<(), SkirmishError> {
        self.touch_joined(player_id).await?;
        let handle = self.active_handle(player_id).await?;
        let phase = handle
            .leave(player_id, LeaveReason::Forfeit)
            .await
            .map_err(settle)?;
        self.inner.matches.lock().await.release(handle.match_id());
        tracing::info!(%player_id, match_id = %handle.match_id(), %phase, "player left match");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Connection lifecycle
    // -----------------------------------------------------------------

    /// Cleans up after a closed connection.
    ///
    /// Leaves the queue, drops any hosted room, forfeits an active match
    /// to the opponent immediately, and finally forgets the player.
    pub async fn disconnect(&self, player_id: PlayerId) {
        if !self.inner.players.lock().await.mark_disconnected(player_id) {
            tracing::debug!(%player_id, "disconnect before join");
            return;
        }
        self.inner.queue.lock().await.cancel(player_id);
        self.inner.rooms.lock().await.remove_hosted_by(player_id);

        let handle = self.inner.matches.lock().await.handle_for(player_id).cloned();
        if let Some(handle) = handle {
            match handle.leave(player_id, LeaveReason::Disconnected).await {
                Ok(_) | Err(MatchError::Unavailable(_)) => {}
                Err(err) => {
                    tracing::warn!(%player_id, match_id = %handle.match_id(), %err, "disconnect leave failed");
                }
            }
            self.inner.matches.lock().await.release(handle.match_id());
        }

        self.inner.players.lock().await.remove(player_id);
        tracing::info!(%player_id, "player disconnected");
    }

    // -----------------------------------------------------------------
    // Reaper
    // -----------------------------------------------------------------

    /// Runs one sweep: expires old rooms and evicts idle matches.
    pub async fn reap(&self) -> ReapReport {
        let rooms = self.inner.rooms.lock().await.expire();
        let handles = self.inner.matches.lock().await.handles();

        let mut evicted = Vec::new();
        for handle in handles {
            let gone = match handle.reap().await {
                Ok(stopped) => stopped,
                Err(MatchError::Unavailable(_)) => true,
                Err(err) => {
                    tracing::warn!(match_id = %handle.match_id(), %err, "reap failed");
                    false
                }
            };
            if gone {
                self.inner.matches.lock().await.release(handle.match_id());
                evicted.push(handle.match_id());
            }
        }

        ReapReport {
            matches: evicted,
            rooms,
        }
    }

    /// Spawns the periodic reaper. It stops on its own once every
    /// `Arena` clone is dropped.
    pub fn spawn_reaper(&self) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let mut sweeper = Sweeper::new(self.inner.config.reap_interval);
        tokio::spawn(async move {
            loop {
                let sweep = sweeper.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                let report = Arena { inner }.reap().await;
                if report.is_empty() {
                    tracing::trace!(sweep, "reaper found nothing");
                } else {
                    tracing::info!(
                        sweep,
                        matches = report.matches.len(),
                        rooms = report.rooms.len(),
                        "reaper evicted stale entries"
                    );
                }
            }
        })
    }

    // -----------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------

    pub async fn match_of(&self, player_id: PlayerId) -> Option<MatchId> {
        self.inner.matches.lock().await.match_of(player_id)
    }

    pub async fn match_view(&self, player_id: PlayerId) -> Option<MatchView> {
        let handle = self.inner.matches.lock().await.handle_for(player_id).cloned()?;
        handle.view(player_id).await.ok().flatten()
    }

    pub async fn is_queued(&self, player_id: PlayerId) -> bool {
        self.inner.queue.lock().await.contains(player_id)
    }

    pub async fn room_of(&self, player_id: PlayerId) -> Option<RoomCode> {
        self.inner.rooms.lock().await.room_of(player_id).cloned()
    }

    pub async fn has_room(&self, code: &RoomCode) -> bool {
        self.inner.rooms.lock().await.contains(code)
    }

    pub async fn stats_of(&self, player_id: PlayerId) -> Option<PlayerStats> {
        self.inner.players.lock().await.get(player_id).map(|p| p.stats)
    }

    pub async fn player_count(&self) -> usize {
        self.inner.players.lock().await.len()
    }

    pub async fn match_count(&self) -> usize {
        self.inner.matches.lock().await.len()
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    async fn touch_joined(&self, player_id: PlayerId) -> Result<(), SessionError> {
        let mut players = self.inner.players.lock().await;
        players.lookup(player_id)?;
        players.touch(player_id);
        Ok(())
    }

    async fn active_handle(&self, player_id: PlayerId) -> Result<MatchHandle, MatchError> {
        self.inner
            .matches
            .lock()
            .await
            .handle_for(player_id)
            .cloned()
            .ok_or(MatchError::NotActive)
    }

    async fn rematch_handle(&self, player_id: PlayerId) -> Result<MatchHandle, MatchError> {
        self.active_handle(player_id)
            .await
            .map_err(|_| MatchError::RematchUnavailable)
    }
}

/// A match that stopped between lookup and command counts as inactive.
fn settle(err: MatchError) -> MatchError {
    match err {
        MatchError::Unavailable(_) => MatchError::NotActive,
        other => other,
    }
}

fn settle_rematch(err: MatchError) -> MatchError {
    match err {
        MatchError::Unavailable(_) => MatchError::RematchUnavailable,
        other => other,
    }
}

fn seat(players: &PlayerRegistry, player_id: PlayerId) -> Result<MatchSeat, SessionError> {
    let player = players.lookup(player_id)?;
    Ok(MatchSeat {
        id: player_id,
        name: player.name.clone(),
        outbox: player.outbox.clone(),
    })
}

/// Applies match lifecycle events: stats on finish and forfeit, index
/// release once a finished match closes.
async fn run_lifecycle(inner: Weak<ArenaInner>, mut events: mpsc::UnboundedReceiver<MatchEvent>) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else { break };
        match event {
            MatchEvent::Finished {
                players, outcome, ..
            } => {
                let mut registry = inner.players.lock().await;
                for pid in players {
                    registry.update_stats(pid, |stats| match outcome {
                        MatchOutcome::Draw => stats.record_draw(),
                        MatchOutcome::Winner(winner) if winner == pid => stats.record_win(),
                        MatchOutcome::Winner(_) => stats.record_loss(),
                    });
                }
            }
            MatchEvent::Forfeited { winner, loser, .. } => {
                let mut registry = inner.players.lock().await;
                registry.update_stats(winner, PlayerStats::record_win);
                registry.update_stats(loser, PlayerStats::record_loss);
            }
            MatchEvent::Closed { match_id, .. } => {
                inner.matches.lock().await.release(match_id);
            }
        }
    }
    tracing::debug!("lifecycle task stopped");
}
