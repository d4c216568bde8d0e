//! Single-shot cancellable timers for the engine loop
//!
//! The engine blocks on its event channel with a timeout derived from the
//! earliest pending deadline, so timers cost nothing while idle. Each
//! [`TimerKind`] has at most one live entry; rescheduling replaces it and
//! cancellation is idempotent — cancelling a fired or absent timer is a
//! no-op, never an error. Superseded heap entries are discarded lazily.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

/// The timers owned by the engine's state machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Gesture cooldown after a dispatch
    GestureCooldown,
    /// Hand-absence grace period before a session reset
    GestureAbsence,
    /// Settle window between synthesis end and input resume
    VoiceResume,
    /// Backoff before re-attempting a failed input start
    VoiceBackoff,
}

/// Keyed queue of pending single-shot timers.
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<(Instant, u64)>>,
    /// Live sequence number per kind
    active: HashMap<TimerKind, u64>,
    /// Kind per live sequence number; absent entries are stale
    live: HashMap<u64, TimerKind>,
    next_seq: u64,
}

impl TimerQueue {
    /// Creates an empty timer queue.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            active: HashMap::new(),
            live: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Schedule (or reschedule) a timer of the given kind.
    pub fn schedule(&mut self, kind: TimerKind, deadline: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;

        if let Some(old) = self.active.insert(kind, seq) {
            self.live.remove(&old);
        }
        self.live.insert(seq, kind);
        self.heap.push(Reverse((deadline, seq)));
    }

    /// Cancel a pending timer. No-op if none is pending.
    pub fn cancel(&mut self, kind: TimerKind) {
        if let Some(seq) = self.active.remove(&kind) {
            self.live.remove(&seq);
        }
    }

    /// Whether a timer of the given kind is pending.
    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.active.contains_key(&kind)
    }

    /// The earliest pending deadline, if any.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        // Drop superseded entries so the caller never sleeps on one.
        while let Some(Reverse((deadline, seq))) = self.heap.peek().copied() {
            if self.live.contains_key(&seq) {
                return Some(deadline);
            }
            self.heap.pop();
        }
        None
    }

    /// Pop every timer whose deadline has passed, in firing order.
    pub fn fire_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut fired = Vec::new();
        while let Some(Reverse((deadline, seq))) = self.heap.peek().copied() {
            if deadline > now {
                break;
            }
            self.heap.pop();
            if let Some(kind) = self.live.remove(&seq) {
                self.active.remove(&kind);
                fired.push(kind);
            }
        }
        fired
    }

    /// Cancel every pending timer.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.active.clear();
        self.live.clear();
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}
