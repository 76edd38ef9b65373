//! Engine module — stateful classification and the cancellable event stream.

pub mod classify;
pub mod stream;

pub use classify::{EngineOptions, LogEventEngine};
pub use stream::{tail_log, EventStream, StopReason};
