//! Single-shot timers over virtual time.
//!
//! The scheduler never looks at a wall clock. Whoever owns it moves time
//! forward with [`Scheduler::pop_due`] and [`Scheduler::set_now`], which lets
//! tests replay minutes of timer activity instantly and in a fixed order.

use std::collections::BTreeMap;
use std::time::Duration;

/// Handle for cancelling a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
pub struct Scheduler<E> {
    now: Duration,
    next_id: u64,
    /// Keyed by `(deadline, id)` so ties fire in scheduling order.
    pending: BTreeMap<(Duration, u64), E>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Virtual time elapsed since the scheduler was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, event: E) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert((self.now + delay, id), event);
        TimerId(id)
    }

    /// Drop a pending event. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, timer: TimerId) -> bool {
        let key = self.pending.keys().find(|(_, id)| *id == timer.0).copied();
        match key {
            Some(key) => self.pending.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, timer: TimerId) -> bool {
        self.pending.keys().any(|(_, id)| *id == timer.0)
    }

    /// Remove the earliest event due at or before `until`, moving the clock to
    /// its deadline. Events scheduled while handling it are relative to that
    /// deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<E> {
        let (&(deadline, id), _) = self.pending.iter().next()?;
        if deadline > until {
            return None;
        }
        let event = self.pending.remove(&(deadline, id))?;
        self.now = self.now.max(deadline);
        Some(event)
    }

    /// Move the clock forward. Never moves it backwards.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}
