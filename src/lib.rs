//! Dial Shell - permanent on-device UI runtime for a rotary-dial display
//!
//! The shell hosts one embedded application at a time and arbitrates a single
//! stream of physical input (rotary dial, back and preset buttons, touch)
//! between its own chrome and that application.
//!
//! ```text
//! raw input ─► input::classify ─► Shell::handle_input
//!                                   │
//!                   ┌───────────────┼────────────────┐
//!                   ▼               ▼                ▼
//!              status bar     launcher grid     AppHost ◄──► embedded app
//! ```
//!
//! - [`input`]: normalization, press duration, dial throttle
//! - [`shell`]: focus zones and routing
//! - [`host`]: application lifecycle and the message bridge
//! - [`backend`]: the event loop that drives it all

pub mod backend;
pub mod config;
pub mod error;
pub mod host;
pub mod input;
pub mod shell;
pub mod timers;

pub use config::ShellConfig;
pub use error::{Result, ShellError};
pub use shell::Shell;
