//! Value-threshold rendezvous between the follower and request handlers.
//!
//! Readers block until the follower has durably caught up to a given
//! notification id. The counter only moves forward through `update`;
//! `reset` is the single exception, used when a snapshot re-based the
//! stream and thresholds must be recomputed against the new baseline.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::core::EventId;

/// Result of a [`CounterWait::wait`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitStatus {
    /// The counter reached the threshold.
    Ready,
    /// The timeout elapsed first.
    TimedOut,
    /// The counter was closed; no further advance will happen.
    Closed,
}

struct CounterState {
    value: EventId,
    closed: bool,
}

pub struct CounterWait {
    state: Mutex<CounterState>,
    cond: Condvar,
}

impl CounterWait {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CounterState {
                value: EventId::ZERO,
                closed: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Advance the counter to `value` if it is ahead of the current value
    /// and wake every waiter whose threshold is now satisfied.
    ///
    /// After `update(n)` returns, any `wait(m, ..)` with `m <= n` returns
    /// `Ready` without blocking.
    pub fn update(&self, value: EventId) {
        let mut state = self.lock();
        if value > state.value {
            state.value = value;
            self.cond.notify_all();
        }
    }

    /// Set the counter to `value` unconditionally, moving it backward if
    /// needed. Waiters whose threshold is `<= value` wake; the rest stay
    /// blocked against the new baseline.
    pub fn reset(&self, value: EventId) {
        let mut state = self.lock();
        state.value = value;
        self.cond.notify_all();
    }

    /// Block until the counter reaches `threshold`, the timeout elapses,
    /// or the counter is closed.
    pub fn wait(&self, threshold: EventId, timeout: Duration) -> WaitStatus {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if state.value >= threshold {
                return WaitStatus::Ready;
            }
            if state.closed {
                return WaitStatus::Closed;
            }
            let now = Instant::now();
            if now >= deadline {
                return WaitStatus::TimedOut;
            }
            let (next, result) = self
                .cond
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state = next;
            if result.timed_out() && state.value < threshold && !state.closed {
                return WaitStatus::TimedOut;
            }
        }
    }

    /// Wake every waiter with `Closed`. Used on follower shutdown.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.cond.notify_all();
    }

    /// Current counter value.
    pub fn value(&self) -> EventId {
        self.lock().value
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CounterState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for CounterWait {
    fn default() -> Self {
        Self::new()
    }
}
