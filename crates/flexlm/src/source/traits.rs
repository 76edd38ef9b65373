//! Line source trait — abstract interface over anything that yields log lines.

use std::future::Future;
use std::pin::Pin;

/// Ordered supply of raw log lines.
///
/// Object-safe thanks to the `Pin<Box<…>>` return. Implementations must be
/// `Send` so the engine can drive them from a spawned task.
pub trait LineSource: Send {
    /// Next line without its terminator, or `None` once the source is
    /// exhausted or stopped. A following source may wait indefinitely.
    fn next_line(&mut self) -> Pin<Box<dyn Future<Output = Option<String>> + Send + '_>>;

    /// Stop following and release any underlying handle. Later calls to
    /// `next_line` return `None`.
    fn stop(&mut self);
}
