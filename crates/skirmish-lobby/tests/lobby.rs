//! Integration tests for queue and room pairing.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use skirmish_lobby::{LobbyConfig, LobbyError, MatchmakingQueue, RoomDirectory};
use skirmish_protocol::{PlayerId, RoomCode};

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

#[test]
fn test_room_claim_then_reuse_is_not_found() {
    let mut dir = RoomDirectory::default();
    let code = dir.create_room(pid(1)).unwrap();

    let room = dir.claim(&code, pid(2), |_| true).unwrap();
    assert_eq!(room.host, pid(1));
    assert_eq!(room.code, code);
    assert!(!dir.contains(&code), "a claimed room leaves the directory");

    let err = dir.claim(&code, pid(3), |_| true).unwrap_err();
    assert!(matches!(err, LobbyError::RoomNotFound));
    assert_eq!(err.to_string(), "Room not found");
}

#[test]
fn test_lowercase_input_finds_room() {
    let mut dir = RoomDirectory::default();
    let code = dir.create_room(pid(1)).unwrap();

    let typed = RoomCode::parse(&code.as_str().to_lowercase()).unwrap();
    assert!(dir.claim(&typed, pid(2), |_| true).is_ok());
}

#[test]
fn test_code_collision_is_retried() {
    let mut dir = RoomDirectory::default();
    let first = dir
        .create_room_with(pid(1), &mut StdRng::seed_from_u64(7))
        .unwrap();
    // Same seed: the first draw repeats the live code and must be redrawn.
    let second = dir
        .create_room_with(pid(2), &mut StdRng::seed_from_u64(7))
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(dir.len(), 2);
}

#[test]
fn test_code_space_exhaustion_is_reported() {
    let mut dir = RoomDirectory::new(LobbyConfig {
        max_code_attempts: 1,
        ..LobbyConfig::default()
    });
    dir.create_room_with(pid(1), &mut StdRng::seed_from_u64(7))
        .unwrap();

    let err = dir
        .create_room_with(pid(2), &mut StdRng::seed_from_u64(7))
        .unwrap_err();
    assert!(matches!(err, LobbyError::CodeSpaceExhausted(1)));
    assert!(dir.room_of(pid(2)).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_rooms_expire_after_ttl() {
    let mut dir = RoomDirectory::new(LobbyConfig {
        room_ttl: Duration::from_secs(600),
        ..LobbyConfig::default()
    });
    let old = dir.create_room(pid(1)).unwrap();

    tokio::time::advance(Duration::from_secs(300)).await;
    let young = dir.create_room(pid(2)).unwrap();

    assert!(dir.expire().is_empty());

    tokio::time::advance(Duration::from_secs(301)).await;
    assert_eq!(dir.expire(), vec![old.clone()]);
    assert!(!dir.contains(&old));
    assert!(dir.contains(&young));
    assert!(dir.room_of(pid(1)).is_none());
}

#[test]
fn test_queue_pairs_in_arrival_order_skipping_ghosts() {
    let mut queue = MatchmakingQueue::new();
    let gone = [pid(1), pid(2)];
    for id in 1..=4 {
        queue.enqueue(pid(id)).unwrap();
    }

    let available = |p: PlayerId| !gone.contains(&p);
    assert_eq!(queue.dequeue_opponent_for(pid(10), available), Some(pid(3)));
    assert_eq!(queue.dequeue_opponent_for(pid(11), available), Some(pid(4)));
    assert_eq!(queue.dequeue_opponent_for(pid(12), available), None);

    // The unmatched requester waits for the next arrival.
    queue.enqueue(pid(12)).unwrap();
    assert_eq!(queue.dequeue_opponent_for(pid(13), available), Some(pid(12)));
}
