// Module structure for the FlexNet license-log monitor.

// Core
pub mod parser;
pub mod engine;
pub mod source;

// Process wiring
pub mod conf;
pub mod runtime;

pub use engine::{tail_log, EngineOptions, EventStream, LogEventEngine};
pub use parser::{Direction, Event, EventError};
pub use source::{FileTail, LineSource, MemorySource, TailOptions};
