//! The anonymous matchmaking queue.

use std::collections::VecDeque;

use skirmish_protocol::PlayerId;

use crate::LobbyError;

/// Strict FIFO of players waiting for an opponent.
///
/// The queue does not know whether a waiting player is still connected
/// or got matched another way. Callers pass that knowledge in as an
/// `is_available` predicate when pulling an opponent, and stale entries
/// at the head are dropped instead of being paired.
#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    waiting: VecDeque<PlayerId>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a player to the back of the queue.
    ///
    /// # Errors
    /// [`LobbyError::AlreadyQueued`] if the player is already waiting.
    /// Whether the player already holds a match is the caller's check.
    pub fn enqueue(&mut self, player_id: PlayerId) -> Result<(), LobbyError> {
        if self.contains(player_id) {
            return Err(LobbyError::AlreadyQueued(player_id));
        }
        self.waiting.push_back(player_id);
        tracing::debug!(%player_id, queued = self.waiting.len(), "player queued");
        Ok(())
    }

    /// Pops the longest-waiting available opponent for `requester`.
    ///
    /// Head entries for which `is_available` returns `false` are
    /// discarded. An entry for the requester itself is skipped and kept
    /// in place. Returns `None` when no live opponent is waiting; the
    /// caller should then [`enqueue`](Self::enqueue) the requester.
    ///
    /// The scan continues past a stale head rather than queueing the
    /// requester behind it, so a live opponent further back is still paired.
    pub fn dequeue_opponent_for(
        &mut self,
        requester: PlayerId,
        is_available: impl Fn(PlayerId) -> bool,
    ) -> Option<PlayerId> {
        let mut idx = 0;
        while idx < self.waiting.len() {
            let candidate = self.waiting[idx];
            if candidate == requester {
                idx += 1;
                continue;
            }
            self.waiting.remove(idx);
            if is_available(candidate) {
                tracing::debug!(%requester, opponent = %candidate, "opponent dequeued");
                return Some(candidate);
            }
            tracing::debug!(player_id = %candidate, "discarded stale queue entry");
        }
        None
    }

    /// Removes a player from the queue. Idempotent: returns `false` if the
    /// player was not queued.
    pub fn cancel(&mut self, player_id: PlayerId) -> bool {
        match self.waiting.iter().position(|p| *p == player_id) {
            Some(idx) => {
                self.waiting.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.waiting.contains(&player_id)
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    #[test]
    fn test_enqueue_rejects_duplicate() {
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(pid(1)).unwrap();
        let err = queue.enqueue(pid(1)).unwrap_err();
        assert!(matches!(err, LobbyError::AlreadyQueued(p) if p == pid(1)));
        assert_eq!(err.to_string(), "Already in matchmaking queue");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_dequeue_is_fifo() {
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(pid(1)).unwrap();
        queue.enqueue(pid(2)).unwrap();

        assert_eq!(queue.dequeue_opponent_for(pid(9), |_| true), Some(pid(1)));
        assert_eq!(queue.dequeue_opponent_for(pid(9), |_| true), Some(pid(2)));
        assert_eq!(queue.dequeue_opponent_for(pid(9), |_| true), None);
    }

    #[test]
    fn test_dequeue_discards_stale_heads() {
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(pid(1)).unwrap();
        queue.enqueue(pid(2)).unwrap();
        queue.enqueue(pid(3)).unwrap();

        let live = |p: PlayerId| p == pid(3);
        assert_eq!(queue.dequeue_opponent_for(pid(9), live), Some(pid(3)));
        assert!(queue.is_empty(), "stale entries must not linger");
    }

    #[test]
    fn test_dequeue_only_stale_entries_returns_none() {
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(pid(1)).unwrap();

        assert_eq!(queue.dequeue_opponent_for(pid(2), |_| false), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dequeue_never_pairs_requester_with_itself() {
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(pid(1)).unwrap();

        assert_eq!(queue.dequeue_opponent_for(pid(1), |_| true), None);
        assert!(queue.contains(pid(1)));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(pid(1)).unwrap();

        assert!(queue.cancel(pid(1)));
        assert!(!queue.cancel(pid(1)));
        assert!(!queue.contains(pid(1)));
    }

    #[test]
    fn test_cancel_keeps_order_of_others() {
        let mut queue = MatchmakingQueue::new();
        for id in 1..=3 {
            queue.enqueue(pid(id)).unwrap();
        }
        queue.cancel(pid(2));

        assert_eq!(queue.dequeue_opponent_for(pid(9), |_| true), Some(pid(1)));
        assert_eq!(queue.dequeue_opponent_for(pid(9), |_| true), Some(pid(3)));
    }
}
