//! Cancellable one-shot timers
//!
//! The shell never blocks; anything that has to "wait" is a deadline in this
//! table. There is at most one pending deadline per [`TimerId`]: arming an id
//! that is already pending replaces it, which is what keeps a stuck
//! press-up from leaving two long-press timers racing each other.
//!
//! The event loop asks for [`Timers::next_deadline`] to decide how long to
//! sleep, then hands expired ids back to the shell.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::input::Button;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerId {
    /// Long-press threshold for a tracked button
    LongPress(Button),
    /// Forwarded Back went unanswered
    BackFallback,
    /// Status bar clock refresh
    ClockTick,
}

#[derive(Debug, Default)]
pub struct Timers {
    pending: BTreeMap<TimerId, Instant>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `id` for `deadline`, cancelling any earlier arm of the same id
    pub fn arm(&mut self, id: TimerId, deadline: Instant) {
        if self.pending.insert(id, deadline).is_some() {
            tracing::trace!(?id, "re-armed timer");
        }
    }

    /// Returns true if a pending timer was removed
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id).is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Remove and return every timer due at or before `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<(TimerId, Instant)> {
        let mut due: Vec<(TimerId, Instant)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, deadline)| (*id, *deadline))
            .collect();
        due.sort_by_key(|(_, deadline)| *deadline);
        for (id, _) in &due {
            self.pending.remove(id);
        }
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rearm_replaces() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let id = TimerId::LongPress(Button::Back);
        timers.arm(id, t0 + Duration::from_millis(250));
        timers.arm(id, t0 + Duration::from_millis(400));
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(t0 + Duration::from_millis(400)));
    }

    #[test]
    fn test_take_due_in_deadline_order() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.arm(TimerId::ClockTick, t0 + Duration::from_millis(30));
        timers.arm(TimerId::BackFallback, t0 + Duration::from_millis(10));
        timers.arm(TimerId::LongPress(Button::Back), t0 + Duration::from_millis(500));

        assert_eq!(timers.next_deadline(), Some(t0 + Duration::from_millis(10)));
        let due: Vec<TimerId> = timers
            .take_due(t0 + Duration::from_millis(100))
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(due, vec![TimerId::BackFallback, TimerId::ClockTick]);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_cancel() {
        let mut timers = Timers::new();
        timers.arm(TimerId::ClockTick, Instant::now());
        assert!(timers.cancel(TimerId::ClockTick));
        assert!(!timers.cancel(TimerId::ClockTick));
        assert!(timers.is_empty());
    }
}
