//! Rate limiting for dial pulses
//!
//! A fast spin of the rotary encoder produces a burst of ticks. Each accepted
//! tick costs a re-render or a message post, so only one tick per interval is
//! let through, measured from the last accepted tick.

use std::time::{Duration, Instant};

pub struct DialThrottle {
    interval: Duration,
    last_accepted: Option<Instant>,
}

impl DialThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: None,
        }
    }

    /// Returns true if a pulse at `at` should be processed
    pub fn accept(&mut self, at: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if at.saturating_duration_since(last) < self.interval {
                return false;
            }
        }
        self.last_accepted = Some(at);
        true
    }
}
