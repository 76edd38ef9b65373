/// FlexNet debug-log parsing
///
/// Turns raw `lmgrd` / vendor-daemon log lines into typed license events.
///
/// # Architecture
///
/// - `grammar.rs`: compiled line shapes and the classifier
/// - `anchor.rs`: rolling date anchor and midnight rollover
/// - `model.rs`: `Event`, `Direction`, `EventError`
/// - `metrics.rs`: per-engine counters

pub mod grammar;
pub mod anchor;
pub mod model;
pub mod metrics;
mod serde_utils;

pub use grammar::{classify, LineShape};
pub use anchor::TimestampAnchor;
pub use model::{Direction, Event, EventError};
pub use metrics::{EngineMetrics, MetricsSnapshot};
