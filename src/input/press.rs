//! Short/long press detection for momentary buttons
//!
//! `Idle -> Armed -> {Short | LongPress} -> Idle`
//!
//! The long press fires from the timer, as soon as the threshold passes, not
//! when the button is released. Every press-down cancels the previous timer
//! before arming a new one.

use std::time::{Duration, Instant};

use super::Button;
use crate::timers::{TimerId, Timers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressState {
    Idle,
    Armed { since: Instant },
    /// Threshold passed while held; waiting for release
    LongPress,
}

/// Semantic result of a physical press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressAction {
    Short,
    Long,
    /// Button released after a long press already fired
    LongReleased,
}

pub struct PressDetector {
    button: Button,
    threshold: Duration,
    state: PressState,
}

impl PressDetector {
    pub fn new(button: Button, threshold: Duration) -> Self {
        Self {
            button,
            threshold,
            state: PressState::Idle,
        }
    }

    pub fn state(&self) -> PressState {
        self.state
    }

    pub fn timer_id(&self) -> TimerId {
        TimerId::LongPress(self.button)
    }

    pub fn press_down(&mut self, at: Instant, timers: &mut Timers) {
        if timers.cancel(self.timer_id()) {
            tracing::debug!(button = ?self.button, "press-down while armed, dropping stale timer");
        }
        timers.arm(self.timer_id(), at + self.threshold);
        self.state = PressState::Armed { since: at };
    }

    pub fn press_up(&mut self, timers: &mut Timers) -> Option<PressAction> {
        match self.state {
            PressState::Armed { .. } => {
                timers.cancel(self.timer_id());
                self.state = PressState::Idle;
                Some(PressAction::Short)
            }
            PressState::LongPress => {
                self.state = PressState::Idle;
                Some(PressAction::LongReleased)
            }
            // Release without a press we saw
            PressState::Idle => None,
        }
    }

    /// The long-press timer for this button expired
    pub fn on_timer(&mut self) -> Option<PressAction> {
        match self.state {
            PressState::Armed { .. } => {
                self.state = PressState::LongPress;
                Some(PressAction::Long)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: Duration = Duration::from_millis(250);

    fn fire_due(
        detector: &mut PressDetector,
        timers: &mut Timers,
        now: Instant,
    ) -> Vec<PressAction> {
        let timer_id = detector.timer_id();
        timers
            .take_due(now)
            .into_iter()
            .filter(|(id, _)| *id == timer_id)
            .filter_map(|_| detector.on_timer())
            .collect()
    }

    #[test]
    fn test_short_press() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let mut detector = PressDetector::new(Button::Back, THRESHOLD);

        detector.press_down(t0, &mut timers);
        assert!(fire_due(&mut detector, &mut timers, t0 + Duration::from_millis(100)).is_empty());
        assert_eq!(detector.press_up(&mut timers), Some(PressAction::Short));
        assert!(timers.is_empty());
        assert_eq!(detector.state(), PressState::Idle);
    }

    #[test]
    fn test_long_press_fires_at_threshold() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let mut detector = PressDetector::new(Button::Back, THRESHOLD);

        detector.press_down(t0, &mut timers);
        assert_eq!(timers.next_deadline(), Some(t0 + THRESHOLD));
        assert!(fire_due(&mut detector, &mut timers, t0 + Duration::from_millis(249)).is_empty());
        assert_eq!(
            fire_due(&mut detector, &mut timers, t0 + THRESHOLD),
            vec![PressAction::Long]
        );
        assert_eq!(detector.press_up(&mut timers), Some(PressAction::LongReleased));
    }

    #[test]
    fn test_rapid_presses_never_stack_timers() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let mut detector = PressDetector::new(Button::Back, THRESHOLD);

        for i in 0..10 {
            detector.press_down(t0 + Duration::from_millis(i * 20), &mut timers);
            assert_eq!(timers.len(), 1);
        }
        // Only the latest arm survives
        assert_eq!(timers.next_deadline(), Some(t0 + Duration::from_millis(180) + THRESHOLD));
        assert_eq!(detector.press_up(&mut timers), Some(PressAction::Short));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_stray_release_ignored() {
        let mut timers = Timers::new();
        let mut detector = PressDetector::new(Button::Back, THRESHOLD);
        assert_eq!(detector.press_up(&mut timers), None);
        assert_eq!(detector.on_timer(), None);
    }
}
