//! Integration tests for match actors.
//!
//! All timer-dependent tests run on paused Tokio time: sleeping in the
//! test lets the clock jump straight to the next pending deadline.

use std::time::Duration;

use skirmish_match::{LeaveReason, MatchBook, MatchConfig, MatchError, MatchEvent, MatchSeat};
use skirmish_protocol::{
    Choice, MatchOutcome, MatchPhase, PlayerId, RoomCode, RoundWinner, ServerEvent,
};
use tokio::sync::mpsc;

const A: PlayerId = PlayerId(1);
const B: PlayerId = PlayerId(2);

type Inbox = mpsc::UnboundedReceiver<ServerEvent>;

// =========================================================================
// Helpers
// =========================================================================

struct Fixture {
    book: MatchBook,
    events: mpsc::UnboundedReceiver<MatchEvent>,
    a: Inbox,
    b: Inbox,
}

fn seat(id: PlayerId, name: &str) -> (MatchSeat, Inbox) {
    let (outbox, rx) = mpsc::unbounded_channel();
    (
        MatchSeat {
            id,
            name: name.to_string(),
            outbox,
        },
        rx,
    )
}

/// Opens a match between A (player1) and B (player2) and drains the
/// opening events.
fn start(room_code: Option<RoomCode>) -> (Fixture, skirmish_match::MatchHandle) {
    let (tx, events) = mpsc::unbounded_channel();
    let mut book = MatchBook::new(MatchConfig::default(), tx);
    let (sa, mut a) = seat(A, "alice");
    let (sb, mut b) = seat(B, "bob");

    let handle = book.open([sa, sb], room_code).unwrap();

    for inbox in [&mut a, &mut b] {
        let opening = drain(inbox);
        assert!(matches!(opening[0], ServerEvent::MatchFound(_)));
        assert_eq!(opening[1], ServerEvent::RoundTimerStarted { duration: 15 });
    }
    (Fixture { book, events, a, b }, handle)
}

fn drain(inbox: &mut Inbox) -> Vec<ServerEvent> {
    let mut out = Vec::new();
    while let Ok(event) = inbox.try_recv() {
        out.push(event);
    }
    out
}

fn round_results(events: &[ServerEvent]) -> Vec<&skirmish_protocol::RoundResult> {
    events
        .iter()
        .filter_map(|e| match e {
            ServerEvent::RoundResult(r) => Some(r),
            _ => None,
        })
        .collect()
}

async fn play_round(handle: &skirmish_match::MatchHandle, a: Choice, b: Choice) {
    handle.submit(A, a).await.unwrap();
    handle.submit(B, b).await.unwrap();
}

async fn sleep_secs(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

// =========================================================================
// Opening
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_match_found_is_framed_per_player() {
    let (tx, _events) = mpsc::unbounded_channel();
    let mut book = MatchBook::new(MatchConfig::default(), tx);
    let (sa, mut a) = seat(A, "alice");
    let (sb, mut b) = seat(B, "bob");
    let code = RoomCode::parse("ABC234").unwrap();

    book.open([sa, sb], Some(code.clone())).unwrap();

    let ServerEvent::MatchFound(va) = drain(&mut a).remove(0) else {
        panic!("expected match_found first");
    };
    let ServerEvent::MatchFound(vb) = drain(&mut b).remove(0) else {
        panic!("expected match_found first");
    };
    assert_eq!((va.my_name.as_str(), va.opponent_name.as_str()), ("alice", "bob"));
    assert_eq!((vb.my_name.as_str(), vb.opponent_name.as_str()), ("bob", "alice"));
    assert_eq!(va.round, 0);
    assert_eq!(va.max_rounds, 3);
    assert_eq!(va.phase, MatchPhase::Playing);
    assert_eq!(va.room_code, Some(code));
    assert!(va.opponent_connected);
}

// =========================================================================
// Submissions
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_submit_notifies_without_revealing_choice() {
    let (mut fx, handle) = start(None);

    handle.submit(A, Choice::Rock).await.unwrap();

    assert_eq!(drain(&mut fx.a), vec![ServerEvent::ChoiceRecorded { choice: Choice::Rock }]);
    assert_eq!(drain(&mut fx.b), vec![ServerEvent::OpponentReady]);
}

#[tokio::test(start_paused = true)]
async fn test_double_submit_is_rejected() {
    let (mut fx, handle) = start(None);
    handle.submit(A, Choice::Rock).await.unwrap();
    drain(&mut fx.a);
    drain(&mut fx.b);

    let err = handle.submit(A, Choice::Paper).await.unwrap_err();
    assert!(matches!(err, MatchError::AlreadyChosen));
    assert!(drain(&mut fx.b).is_empty(), "no notifications after a rejection");

    let view = handle.view(A).await.unwrap().unwrap();
    assert_eq!(view.my_choice, Some(Choice::Rock));
    assert_eq!(view.round, 0);
}

#[tokio::test(start_paused = true)]
async fn test_full_match_reports_every_round_and_finishes() {
    let (mut fx, handle) = start(None);

    play_round(&handle, Choice::Rock, Choice::Scissors).await;
    let events = drain(&mut fx.a);
    let first = round_results(&events);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].round, 1);
    assert_eq!(first[0].result, RoundWinner::Player1);
    assert_eq!(first[0].winner, Some(A));
    assert_eq!((first[0].player1.score, first[0].player2.score), (1, 0));
    assert_eq!(first[0].phase, MatchPhase::Playing);
    assert_eq!(
        events.last(),
        Some(&ServerEvent::RoundTimerStarted { duration: 15 }),
        "a continuing match re-arms the round timer"
    );

    play_round(&handle, Choice::Rock, Choice::Rock).await;
    play_round(&handle, Choice::Rock, Choice::Rock).await;

    let events = drain(&mut fx.b);
    let results = round_results(&events);
    let last = results.last().unwrap();
    assert_eq!(last.round, 3);
    assert_eq!(last.phase, MatchPhase::Finished);
    assert_eq!(last.match_outcome, Some(MatchOutcome::Winner(A)));
    assert!(
        !matches!(events.last(), Some(ServerEvent::RoundTimerStarted { .. })),
        "no timer after the final round"
    );

    let event = fx.events.recv().await.unwrap();
    assert_eq!(
        event,
        MatchEvent::Finished {
            match_id: handle.match_id(),
            players: [A, B],
            outcome: MatchOutcome::Winner(A),
        }
    );

    assert!(matches!(
        handle.submit(A, Choice::Rock).await,
        Err(MatchError::NotActive)
    ));
}

// =========================================================================
// Round timer
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_timeout_auto_assigns_only_the_missing_choice() {
    let (mut fx, handle) = start(None);
    handle.submit(A, Choice::Scissors).await.unwrap();
    drain(&mut fx.a);
    drain(&mut fx.b);

    sleep_secs(16).await;

    let b_events = drain(&mut fx.b);
    let ServerEvent::ChoiceAutoAssigned { choice } = b_events[0] else {
        panic!("expected choice_auto_assigned, got {b_events:?}");
    };
    let a_events = drain(&mut fx.a);
    assert!(
        !a_events
            .iter()
            .any(|e| matches!(e, ServerEvent::ChoiceAutoAssigned { .. })),
        "the player who chose keeps their choice"
    );

    let results = round_results(&a_events);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].player1.choice, Choice::Scissors);
    assert_eq!(results[0].player2.choice, choice);
    assert_eq!(results[0].round, 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_with_nobody_ready_assigns_both() {
    let (mut fx, handle) = start(None);

    sleep_secs(16).await;

    for inbox in [&mut fx.a, &mut fx.b] {
        let events = drain(inbox);
        assert!(matches!(events[0], ServerEvent::ChoiceAutoAssigned { .. }));
        assert_eq!(round_results(&events).len(), 1);
    }
    assert_eq!(handle.view(A).await.unwrap().unwrap().round, 1);
}

#[tokio::test(start_paused = true)]
async fn test_submissions_racing_the_deadline_resolve_once() {
    let (mut fx, handle) = start(None);

    // Both choices land just before the deadline; the timer then fires
    // against a round that has already been resolved.
    tokio::time::sleep(Duration::from_millis(14_900)).await;
    play_round(&handle, Choice::Paper, Choice::Rock).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let events = drain(&mut fx.a);
    assert_eq!(round_results(&events).len(), 1);
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, ServerEvent::ChoiceAutoAssigned { .. }))
    );
    let view = handle.view(A).await.unwrap().unwrap();
    assert_eq!(view.round, 1);
    assert_eq!(view.my_score, 1);
}

#[tokio::test(start_paused = true)]
async fn test_submission_at_the_deadline_resolves_once() {
    let (mut fx, handle) = start(None);

    handle.submit(A, Choice::Paper).await.unwrap();
    drain(&mut fx.a);
    tokio::time::advance(Duration::from_secs(15)).await;

    // Lands in the same instant the round timer fires. Whichever is
    // processed first resolves round 1; the other must not resolve it again.
    handle.submit(B, Choice::Rock).await.unwrap();
    tokio::task::yield_now().await;

    let events = drain(&mut fx.a);
    let results = round_results(&events);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].round, 1);
    assert_eq!(results[0].player1.choice, Choice::Paper);
    assert_eq!(handle.view(A).await.unwrap().unwrap().round, 1);
}

#[tokio::test(start_paused = true)]
async fn test_timer_rearms_for_each_round() {
    let (mut fx, handle) = start(None);

    // Three unattended rounds finish the match on the timer alone.
    sleep_secs(16 * 3).await;

    let events = drain(&mut fx.a);
    let results = round_results(&events);
    assert_eq!(results.len(), 3);
    assert_eq!(results[2].phase, MatchPhase::Finished);
    assert!(matches!(
        fx.events.recv().await,
        Some(MatchEvent::Finished { .. })
    ));
    drop(handle);
}

// =========================================================================
// Teardown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_finished_match_closes_after_grace() {
    let (mut fx, handle) = start(None);
    for _ in 0..3 {
        play_round(&handle, Choice::Rock, Choice::Rock).await;
    }
    assert!(matches!(fx.events.recv().await, Some(MatchEvent::Finished { .. })));
    drain(&mut fx.a);
    drain(&mut fx.b);

    sleep_secs(9).await;
    assert!(drain(&mut fx.a).is_empty(), "still inside the grace period");

    sleep_secs(2).await;
    assert!(matches!(
        drain(&mut fx.a).as_slice(),
        [ServerEvent::MatchClosed { .. }]
    ));
    assert!(matches!(
        drain(&mut fx.b).as_slice(),
        [ServerEvent::MatchClosed { .. }]
    ));
    assert_eq!(
        fx.events.recv().await,
        Some(MatchEvent::Closed {
            match_id: handle.match_id(),
            players: [A, B],
        })
    );
    assert!(handle.is_closed());
    assert!(matches!(
        handle.submit(A, Choice::Rock).await,
        Err(MatchError::Unavailable(_))
    ));

    // Releasing is the orchestration layer's job; the book still knows it.
    assert!(fx.book.release(handle.match_id()).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_mid_match_forfeits_immediately() {
    let (mut fx, handle) = start(None);

    let phase = handle.leave(A, LeaveReason::Disconnected).await.unwrap();

    assert_eq!(phase, MatchPhase::Playing);
    assert_eq!(
        drain(&mut fx.b),
        vec![ServerEvent::OpponentDisconnected {
            message: "Your opponent disconnected. You win by forfeit!".into()
        }]
    );
    assert!(drain(&mut fx.a).is_empty());
    assert_eq!(
        fx.events.recv().await,
        Some(MatchEvent::Forfeited {
            match_id: handle.match_id(),
            winner: B,
            loser: A,
        })
    );

    // No timer survives the teardown.
    sleep_secs(60).await;
    assert!(drain(&mut fx.b).is_empty());
    assert!(handle.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_voluntary_leave_notifies_both_sides() {
    let (mut fx, handle) = start(None);

    handle.leave(B, LeaveReason::Forfeit).await.unwrap();

    assert!(matches!(
        drain(&mut fx.a).as_slice(),
        [ServerEvent::OpponentForfeit { .. }]
    ));
    assert!(matches!(
        drain(&mut fx.b).as_slice(),
        [ServerEvent::MatchClosed { .. }]
    ));
}

#[tokio::test(start_paused = true)]
async fn test_leave_after_finish_is_not_a_forfeit() {
    let (mut fx, handle) = start(None);
    for _ in 0..3 {
        play_round(&handle, Choice::Rock, Choice::Rock).await;
    }
    assert!(matches!(fx.events.recv().await, Some(MatchEvent::Finished { .. })));
    drain(&mut fx.b);

    let phase = handle.leave(A, LeaveReason::Disconnected).await.unwrap();

    assert_eq!(phase, MatchPhase::Finished);
    assert_eq!(
        drain(&mut fx.b),
        vec![ServerEvent::OpponentDisconnected {
            message: "Your opponent disconnected.".into()
        }]
    );
    assert!(fx.events.try_recv().is_err(), "no forfeit for a finished match");
}

#[tokio::test(start_paused = true)]
async fn test_idle_match_is_reaped() {
    let (mut fx, handle) = start(None);
    handle.submit(A, Choice::Rock).await.unwrap();

    assert!(!handle.reap().await.unwrap(), "fresh activity keeps it alive");

    // The round timer keeps resolving rounds but only players count as
    // activity. Drive the clock past the idle window in one jump.
    tokio::time::advance(Duration::from_secs(5 * 60 + 1)).await;
    assert!(handle.reap().await.unwrap());
    assert!(
        drain(&mut fx.a)
            .iter()
            .any(|e| matches!(e, ServerEvent::MatchClosed { .. }))
    );
}

// =========================================================================
// Chat and rematch
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_chat_is_trimmed_and_relayed_to_both() {
    let (mut fx, handle) = start(None);

    handle.chat(A, "  gl hf  ".into()).await.unwrap();

    let expected = ServerEvent::ChatMessage {
        from: "alice".into(),
        text: "gl hf".into(),
    };
    assert_eq!(drain(&mut fx.a), vec![expected.clone()]);
    assert_eq!(drain(&mut fx.b), vec![expected]);

    assert!(matches!(
        handle.chat(A, "   ".into()).await,
        Err(MatchError::ChatRejected)
    ));
    assert!(matches!(
        handle.chat(A, "x".repeat(201)).await,
        Err(MatchError::ChatRejected)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_rematch_needs_finish_and_opponent_request() {
    let (mut fx, handle) = start(Some(RoomCode::parse("XYZ789").unwrap()));

    assert!(matches!(
        handle.request_rematch(A).await,
        Err(MatchError::RematchUnavailable)
    ));

    for _ in 0..3 {
        play_round(&handle, Choice::Rock, Choice::Rock).await;
    }
    drain(&mut fx.b);

    assert!(matches!(
        handle.accept_rematch(B).await,
        Err(MatchError::RematchUnavailable)
    ));

    handle.request_rematch(A).await.unwrap();
    assert_eq!(
        drain(&mut fx.b),
        vec![ServerEvent::RematchRequested { from: "alice".into() }]
    );
    assert!(matches!(
        handle.accept_rematch(A).await,
        Err(MatchError::RematchUnavailable)
    ));

    let terms = handle.accept_rematch(B).await.unwrap();
    assert_eq!(terms.players, [A, B]);
    assert_eq!(terms.room_code.as_ref().map(RoomCode::as_str), Some("XYZ789"));

    // The old actor is gone and never fires its grace teardown.
    sleep_secs(30).await;
    assert!(handle.is_closed());
    assert!(drain(&mut fx.a).iter().all(|e| !matches!(e, ServerEvent::MatchClosed { .. })));
}
