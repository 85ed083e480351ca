// Game-clock event queue.
//
// Replaces timer-callback-driven delayed effects: effects are scheduled
// against the simulation clock and drained once per frame by whoever owns
// the tick, so nothing fires between frames and replays stay deterministic.

use log::warn;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One scheduled entry. Ordered so the heap pops the earliest timestamp
/// first, with insertion sequence breaking ties — two effects scheduled for
/// the same instant drain in the order they were scheduled.
struct Scheduled<E> {
    at_ms: f64,
    seq: u64,
    event: E,
}

impl<E> Ord for Scheduled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at_ms
            .total_cmp(&self.at_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<E> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> PartialEq for Scheduled<E> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<E> Eq for Scheduled<E> {}

/// Events keyed by a game-clock timestamp in milliseconds.
///
/// Single-threaded like the rest of the engine: schedule during the update
/// phase, drain once at the top of each frame.
pub struct EventQueue<E> {
    heap: BinaryHeap<Scheduled<E>>,
    next_seq: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` to fire once the game clock reaches `at_ms`.
    /// Non-finite timestamps are refused — they would never drain.
    pub fn schedule(&mut self, at_ms: f64, event: E) {
        if !at_ms.is_finite() {
            warn!("refusing event scheduled at non-finite timestamp {at_ms}");
            return;
        }
        self.heap.push(Scheduled {
            at_ms,
            seq: self.next_seq,
            event,
        });
        self.next_seq += 1;
    }

    /// Remove and return every event due at or before `now_ms`, earliest
    /// first (schedule order within a shared timestamp).
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<E> {
        let mut due = Vec::new();
        while let Some(head) = self.heap.peek() {
            if head.at_ms > now_ms {
                break;
            }
            due.push(self.heap.pop().expect("peeked entry").event);
        }
        due
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drains_in_time_order() {
        let mut queue = EventQueue::new();
        queue.schedule(300.0, "late");
        queue.schedule(100.0, "early");
        queue.schedule(200.0, "middle");

        assert_eq!(queue.drain_due(250.0), vec!["early", "middle"]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_due(1000.0), vec!["late"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_same_timestamp_keeps_schedule_order() {
        let mut queue = EventQueue::new();
        queue.schedule(50.0, 1);
        queue.schedule(50.0, 2);
        queue.schedule(50.0, 3);
        assert_eq!(queue.drain_due(50.0), vec![1, 2, 3]);
    }

    #[test]
    fn test_nothing_due_nothing_drained() {
        let mut queue = EventQueue::new();
        queue.schedule(500.0, ());
        assert!(queue.drain_due(499.9).is_empty());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_non_finite_timestamp_refused() {
        let mut queue = EventQueue::new();
        queue.schedule(f64::NAN, ());
        queue.schedule(f64::INFINITY, ());
        assert!(queue.is_empty());
    }
}
