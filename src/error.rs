//! Error types for the dial shell

use thiserror::Error;

/// Startup and persistence errors
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures crossing into an embedded application frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The frame's document cannot be reached from the shell
    #[error("frame document is cross-origin")]
    CrossOrigin,

    #[error("frame is gone")]
    Gone,

    #[error("failed to post message: {0}")]
    Post(String),
}

/// Reasons an inbound bridge message is rejected
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("message is not an object")]
    NotAnObject,

    #[error("message has no kind")]
    MissingKind,

    #[error("unknown message kind {0:?}")]
    UnknownKind(String),

    #[error("unexpected origin {got:?} (expected {expected:?})")]
    UnexpectedOrigin { expected: String, got: String },

    #[error("no application session")]
    NoSession,

    #[error("message from session {got} (current is {current})")]
    StaleSession { current: u64, got: u64 },
}

/// Result type for this crate
pub type Result<T> = std::result::Result<T, ShellError>;
