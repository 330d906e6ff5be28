//! Input handling - classification, press duration, dial throttling
//!
//! This module provides:
//! - Normalization of raw input (keyboard simulation, hardware bridge, test harness)
//! - Short/long press detection for momentary buttons
//! - Rate limiting for rotary dial pulses

mod event;
mod press;
mod throttle;

pub use event::*;
pub use press::*;
pub use throttle::*;
