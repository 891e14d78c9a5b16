//! Match actor: an isolated Tokio task that owns one match.
//!
//! Choice submissions, leave/disconnect, rematch, chat and reap requests
//! arrive over an mpsc channel. The round timer and the post-match grace
//! timer are polled by the same `select!` loop, so a timer expiry and a
//! command can never interleave on the same match.

use std::sync::atomic::{AtomicU64, Ordering};

use skirmish_protocol::{
    Choice, MatchId, MatchOutcome, MatchPhase, MatchView, PlayerId, RoomCode, ServerEvent,
};
use skirmish_session::Outbox;
use skirmish_timer::Countdown;
use tokio::sync::{mpsc, oneshot};

use crate::{Match, MatchConfig, MatchError};

/// Counter for generating unique match IDs.
static NEXT_MATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Longest chat message accepted, in characters after trimming.
const MAX_CHAT_LEN: usize = 200;

/// A participant as handed to a new match: who, display name, and where
/// to deliver their events.
#[derive(Debug, Clone)]
pub struct MatchSeat {
    pub id: PlayerId,
    pub name: String,
    pub outbox: Outbox,
}

/// Why a participant is leaving a match early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    /// The transport reported the connection gone.
    Disconnected,
    /// The player asked to leave.
    Forfeit,
}

/// What an accepted rematch needs to start the next match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RematchTerms {
    /// Same player1/player2 order as the old match.
    pub players: [PlayerId; 2],
    pub room_code: Option<RoomCode>,
}

/// Lifecycle notifications from match actors to the orchestration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// The final round resolved. The match lingers for its grace period.
    Finished {
        match_id: MatchId,
        players: [PlayerId; 2],
        outcome: MatchOutcome,
    },
    /// A participant left or disconnected mid-match.
    Forfeited {
        match_id: MatchId,
        winner: PlayerId,
        loser: PlayerId,
    },
    /// The grace period ran out and the actor stopped. Its index entries
    /// can be released.
    Closed {
        match_id: MatchId,
        players: [PlayerId; 2],
    },
}

/// Commands sent to a match actor through its channel.
///
/// Every variant carries a reply channel so callers learn the outcome
/// before they touch any shared index.
pub(crate) enum MatchCommand {
    Submit {
        player_id: PlayerId,
        choice: Choice,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },
    Chat {
        player_id: PlayerId,
        text: String,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },
    RequestRematch {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },
    AcceptRematch {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<RematchTerms, MatchError>>,
    },
    /// Tear the match down on behalf of `player_id`. Replies with the
    /// phase the match was in.
    Leave {
        player_id: PlayerId,
        reason: LeaveReason,
        reply: oneshot::Sender<Result<MatchPhase, MatchError>>,
    },
    /// Stop if idle. Replies `true` if the actor stopped.
    Reap { reply: oneshot::Sender<bool> },
    View {
        player_id: PlayerId,
        reply: oneshot::Sender<Option<MatchView>>,
    },
}

impl std::fmt::Debug for MatchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Submit { .. } => "Submit",
            Self::Chat { .. } => "Chat",
            Self::RequestRematch { .. } => "RequestRematch",
            Self::AcceptRematch { .. } => "AcceptRematch",
            Self::Leave { .. } => "Leave",
            Self::Reap { .. } => "Reap",
            Self::View { .. } => "View",
        };
        f.write_str(name)
    }
}

/// Handle to a running match actor. Used to send commands to it.
///
/// Cheap to clone. The [`MatchBook`](crate::MatchBook) holds one per
/// live match.
#[derive(Debug, Clone)]
pub struct MatchHandle {
    match_id: MatchId,
    players: [PlayerId; 2],
    sender: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// `[player1, player2]`.
    pub fn players(&self) -> [PlayerId; 2] {
        self.players
    }

    pub fn opponent_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        match self.players {
            [a, b] if a == player_id => Some(b),
            [a, b] if b == player_id => Some(a),
            _ => None,
        }
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Submits `choice` for the current round.
    pub async fn submit(&self, player_id: PlayerId, choice: Choice) -> Result<(), MatchError> {
        self.request(|reply| MatchCommand::Submit {
            player_id,
            choice,
            reply,
        })
        .await?
    }

    /// Relays a chat line to both participants.
    pub async fn chat(&self, player_id: PlayerId, text: String) -> Result<(), MatchError> {
        self.request(|reply| MatchCommand::Chat {
            player_id,
            text,
            reply,
        })
        .await?
    }

    pub async fn request_rematch(&self, player_id: PlayerId) -> Result<(), MatchError> {
        self.request(|reply| MatchCommand::RequestRematch { player_id, reply })
            .await?
    }

    /// Accepts the opponent's rematch request. On success the actor has
    /// stopped and the caller starts the next match from the terms.
    pub async fn accept_rematch(&self, player_id: PlayerId) -> Result<RematchTerms, MatchError> {
        self.request(|reply| MatchCommand::AcceptRematch { player_id, reply })
            .await?
    }

    /// Removes `player_id` from the match, which ends it. Returns the
    /// phase the match was in when they left.
    pub async fn leave(
        &self,
        player_id: PlayerId,
        reason: LeaveReason,
    ) -> Result<MatchPhase, MatchError> {
        self.request(|reply| MatchCommand::Leave {
            player_id,
            reason,
            reply,
        })
        .await?
    }

    /// Asks the actor to stop if it has been idle too long. Returns
    /// `true` if it stopped.
    pub async fn reap(&self) -> Result<bool, MatchError> {
        self.request(|reply| MatchCommand::Reap { reply }).await
    }

    /// The match as `player_id` currently sees it.
    pub async fn view(&self, player_id: PlayerId) -> Result<Option<MatchView>, MatchError> {
        self.request(|reply| MatchCommand::View { player_id, reply })
            .await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> MatchCommand,
    ) -> Result<T, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))
    }
}

/// Who receives an outbound event.
#[derive(Debug, Clone, Copy)]
enum Recipient {
    All,
    Player(PlayerId),
    AllExcept(PlayerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// The internal match actor state. Runs inside a Tokio task.
struct MatchActor {
    record: Match,
    seats: [MatchSeat; 2],
    config: MatchConfig,
    round_timer: Countdown,
    teardown: Countdown,
    rematch_requested_by: Option<PlayerId>,
    receiver: mpsc::Receiver<MatchCommand>,
    events: mpsc::UnboundedSender<MatchEvent>,
}

impl MatchActor {
    fn match_id(&self) -> MatchId {
        self.record.id()
    }

    /// Runs the actor loop until the match is torn down or every handle
    /// is dropped.
    async fn run(mut self) {
        tracing::debug!(match_id = %self.match_id(), "match actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if self.handle_command(cmd) == Flow::Stop {
                        break;
                    }
                }
                () = self.round_timer.expired() => self.on_round_timeout(),
                () = self.teardown.expired() => {
                    self.close("Match finished");
                    break;
                }
            }
        }

        tracing::debug!(match_id = %self.match_id(), "match actor stopped");
    }

    fn handle_command(&mut self, cmd: MatchCommand) -> Flow {
        tracing::trace!(match_id = %self.match_id(), ?cmd, "match command");
        match cmd {
            MatchCommand::Submit {
                player_id,
                choice,
                reply,
            } => {
                let _ = reply.send(self.handle_submit(player_id, choice));
                Flow::Continue
            }
            MatchCommand::Chat {
                player_id,
                text,
                reply,
            } => {
                let _ = reply.send(self.handle_chat(player_id, &text));
                Flow::Continue
            }
            MatchCommand::RequestRematch { player_id, reply } => {
                let _ = reply.send(self.handle_request_rematch(player_id));
                Flow::Continue
            }
            MatchCommand::AcceptRematch { player_id, reply } => {
                match self.handle_accept_rematch(player_id) {
                    Ok(terms) => {
                        let _ = reply.send(Ok(terms));
                        Flow::Stop
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                        Flow::Continue
                    }
                }
            }
            MatchCommand::Leave {
                player_id,
                reason,
                reply,
            } => match self.handle_leave(player_id, reason) {
                Ok(phase) => {
                    let _ = reply.send(Ok(phase));
                    Flow::Stop
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                    Flow::Continue
                }
            },
            MatchCommand::Reap { reply } => {
                let idle = self.record.is_idle(self.config.idle_timeout);
                if idle {
                    tracing::info!(match_id = %self.match_id(), "evicting idle match");
                    self.close("Match closed due to inactivity");
                }
                let _ = reply.send(idle);
                if idle { Flow::Stop } else { Flow::Continue }
            }
            MatchCommand::View { player_id, reply } => {
                let _ = reply.send(self.record.view_for(player_id, true));
                Flow::Continue
            }
        }
    }

    fn handle_submit(&mut self, player_id: PlayerId, choice: Choice) -> Result<(), MatchError> {
        self.record.submit_choice(player_id, choice)?;
        tracing::debug!(match_id = %self.match_id(), %player_id, "choice recorded");

        self.dispatch(Recipient::Player(player_id), ServerEvent::ChoiceRecorded { choice });
        self.dispatch(Recipient::AllExcept(player_id), ServerEvent::OpponentReady);

        if self.record.both_ready() {
            self.resolve_round();
        }
        Ok(())
    }

    /// Forces the round when its timer runs out.
    ///
    /// The timer may be stale: the round could have resolved or the match
    /// finished since it was armed. Both cases are no-ops.
    fn on_round_timeout(&mut self) {
        if !self.record.phase().is_playing() {
            return;
        }

        let assigned = self.record.assign_missing(&mut rand::rng());
        for (player_id, choice) in assigned {
            tracing::debug!(match_id = %self.match_id(), %player_id, %choice, "choice auto-assigned");
            self.dispatch(
                Recipient::Player(player_id),
                ServerEvent::ChoiceAutoAssigned { choice },
            );
        }

        if self.record.both_ready() {
            self.resolve_round();
        }
    }

    /// The single resolution path for both submissions and timer expiry.
    fn resolve_round(&mut self) {
        let result = match self.record.resolve() {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(match_id = %self.match_id(), %err, "round resolution rejected");
                return;
            }
        };
        self.round_timer.cancel();

        tracing::info!(
            match_id = %self.match_id(),
            round = result.round,
            result = ?result.result,
            "round resolved"
        );
        let outcome = result.match_outcome;
        self.dispatch(Recipient::All, ServerEvent::RoundResult(result));

        match outcome {
            Some(outcome) => self.finish(outcome),
            None => self.start_round_timer(),
        }
    }

    fn start_round_timer(&mut self) {
        let duration = self.round_timer.start();
        self.dispatch(
            Recipient::All,
            ServerEvent::RoundTimerStarted {
                duration: duration.as_secs(),
            },
        );
    }

    fn finish(&mut self, outcome: MatchOutcome) {
        self.round_timer.cancel();
        self.teardown.start();
        tracing::info!(match_id = %self.match_id(), ?outcome, "match finished");
        let _ = self.events.send(MatchEvent::Finished {
            match_id: self.match_id(),
            players: self.record.players(),
            outcome,
        });
    }

    fn handle_chat(&mut self, player_id: PlayerId, text: &str) -> Result<(), MatchError> {
        let from = self
            .record
            .participant(player_id)
            .ok_or(MatchError::NotParticipant(player_id))?
            .name
            .clone();
        let text = text.trim();
        let len = text.chars().count();
        if len == 0 || len > MAX_CHAT_LEN {
            return Err(MatchError::ChatRejected);
        }

        self.record.touch();
        self.dispatch(
            Recipient::All,
            ServerEvent::ChatMessage {
                from,
                text: text.to_string(),
            },
        );
        Ok(())
    }

    fn handle_request_rematch(&mut self, player_id: PlayerId) -> Result<(), MatchError> {
        let from = self
            .record
            .participant(player_id)
            .ok_or(MatchError::NotParticipant(player_id))?
            .name
            .clone();
        if self.record.phase().is_playing() {
            return Err(MatchError::RematchUnavailable);
        }

        self.rematch_requested_by = Some(player_id);
        self.record.touch();
        tracing::debug!(match_id = %self.match_id(), %player_id, "rematch requested");
        self.dispatch(
            Recipient::AllExcept(player_id),
            ServerEvent::RematchRequested { from },
        );
        Ok(())
    }

    fn handle_accept_rematch(&mut self, player_id: PlayerId) -> Result<RematchTerms, MatchError> {
        let opponent = self
            .record
            .opponent_of(player_id)
            .ok_or(MatchError::NotParticipant(player_id))?
            .id;
        if self.record.phase().is_playing() || self.rematch_requested_by != Some(opponent) {
            return Err(MatchError::RematchUnavailable);
        }

        self.teardown.cancel();
        tracing::info!(match_id = %self.match_id(), "rematch accepted");
        Ok(RematchTerms {
            players: self.record.players(),
            room_code: self.record.room_code().cloned(),
        })
    }

    fn handle_leave(
        &mut self,
        player_id: PlayerId,
        reason: LeaveReason,
    ) -> Result<MatchPhase, MatchError> {
        let opponent = self
            .record
            .opponent_of(player_id)
            .ok_or(MatchError::NotParticipant(player_id))?
            .id;
        let phase = self.record.phase();
        self.round_timer.cancel();
        self.teardown.cancel();

        let notice = match (reason, phase) {
            (LeaveReason::Disconnected, MatchPhase::Playing) => ServerEvent::OpponentDisconnected {
                message: "Your opponent disconnected. You win by forfeit!".to_string(),
            },
            (LeaveReason::Disconnected, MatchPhase::Finished) => {
                ServerEvent::OpponentDisconnected {
                    message: "Your opponent disconnected.".to_string(),
                }
            }
            (LeaveReason::Forfeit, MatchPhase::Playing) => ServerEvent::OpponentForfeit {
                message: "Your opponent left the match. You win by forfeit!".to_string(),
            },
            (LeaveReason::Forfeit, MatchPhase::Finished) => ServerEvent::OpponentDisconnected {
                message: "Your opponent left the match.".to_string(),
            },
        };
        self.dispatch(Recipient::Player(opponent), notice);
        if reason == LeaveReason::Forfeit {
            self.dispatch(
                Recipient::Player(player_id),
                ServerEvent::MatchClosed {
                    reason: "You left the match".to_string(),
                },
            );
        }

        if phase.is_playing() {
            tracing::info!(
                match_id = %self.match_id(),
                winner = %opponent,
                loser = %player_id,
                ?reason,
                "match forfeited"
            );
            let _ = self.events.send(MatchEvent::Forfeited {
                match_id: self.match_id(),
                winner: opponent,
                loser: player_id,
            });
        }
        Ok(phase)
    }

    /// Tells both participants the match is gone and reports it closed.
    fn close(&mut self, reason: &str) {
        self.round_timer.cancel();
        self.dispatch(
            Recipient::All,
            ServerEvent::MatchClosed {
                reason: reason.to_string(),
            },
        );
        tracing::info!(match_id = %self.match_id(), reason, "match closed");
        let _ = self.events.send(MatchEvent::Closed {
            match_id: self.match_id(),
            players: self.record.players(),
        });
    }

    fn dispatch(&self, recipient: Recipient, event: ServerEvent) {
        match recipient {
            Recipient::All => {
                for seat in &self.seats {
                    let _ = seat.outbox.send(event.clone());
                }
            }
            Recipient::Player(pid) => self.send_to(pid, event),
            Recipient::AllExcept(excluded) => {
                for seat in self.seats.iter().filter(|s| s.id != excluded) {
                    let _ = seat.outbox.send(event.clone());
                }
            }
        }
    }

    /// Sends to one participant. Silently drops if their connection is
    /// gone.
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(seat) = self.seats.iter().find(|s| s.id == player_id) {
            let _ = seat.outbox.send(event);
        }
    }
}

/// Creates a match between `seats[0]` (player1) and `seats[1]` (player2)
/// and spawns its actor.
///
/// Both participants receive `match_found` and `round_timer_started`
/// before this returns.
pub(crate) fn spawn_match(
    seats: [MatchSeat; 2],
    room_code: Option<RoomCode>,
    config: MatchConfig,
    events: mpsc::UnboundedSender<MatchEvent>,
) -> MatchHandle {
    let match_id = MatchId(NEXT_MATCH_ID.fetch_add(1, Ordering::Relaxed));
    let record = Match::new(
        match_id,
        (seats[0].id, seats[0].name.clone()),
        (seats[1].id, seats[1].name.clone()),
        config.max_rounds,
        room_code,
    );
    let players = record.players();
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let mut actor = MatchActor {
        round_timer: Countdown::new(config.round_duration),
        teardown: Countdown::new(config.finished_grace),
        record,
        seats,
        config,
        rematch_requested_by: None,
        receiver: rx,
        events,
    };

    tracing::info!(
        %match_id,
        player1 = %players[0],
        player2 = %players[1],
        room_code = actor.record.room_code().map(RoomCode::as_str),
        "match created"
    );
    for pid in players {
        if let Some(view) = actor.record.view_for(pid, true) {
            actor.send_to(pid, ServerEvent::MatchFound(view));
        }
    }
    actor.start_round_timer();

    tokio::spawn(actor.run());

    MatchHandle {
        match_id,
        players,
        sender: tx,
    }
}
