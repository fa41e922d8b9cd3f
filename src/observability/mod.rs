//! Observability
//!
//! Structured JSON logging with a typed event catalog. One log line is one
//! event; output is synchronous and deterministic.

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
