//! Backends - drive the shell from an event source
//!
//! Only the stdio backend lives here: the device bridge and the frame host
//! talk to it over JSON lines.

pub mod stdio;
