//! Source module — raw line sources feeding the event engine.
//!
//! `file.rs` follows a log file on disk across truncation and rotation.
//! `memory.rs` replays lines from memory for tests and offline use.

pub mod traits;
pub mod error;
pub mod file;
pub mod file_id;
pub mod memory;

pub use traits::LineSource;
pub use error::SourceError;
pub use file::{FileTail, TailOptions};
pub use memory::MemorySource;
