//! Stream — drives an engine from a line source on a spawned task.
//!
//! The producer hands events over a channel of capacity one and reserves the
//! slot before it reads the next line, so at most one event is ever in flight
//! and a slow consumer throttles reading instead of losing events.

use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::parser::{EngineMetrics, Event};
use crate::source::{FileTail, LineSource, SourceError, TailOptions};
use super::classify::{EngineOptions, LogEventEngine};

/// Events in flight between producer and consumer
const HANDOFF_CAPACITY: usize = 1;

/// Why the producer stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    SourceExhausted,
    ConsumerGone,
}

/// Ordered, cancellable stream of events.
///
/// Ends after the line source is exhausted or the stream is cancelled.
/// Dropping the stream cancels the producer.
pub struct EventStream {
    rx: mpsc::Receiver<Event>,
    cancel: CancellationToken,
    metrics: Arc<EngineMetrics>,
    task: Option<JoinHandle<StopReason>>,
}

impl EventStream {
    /// Start `engine` on `source`.
    ///
    /// `signal` is an optional external stop trigger; cancelling it has the
    /// same effect as [`EventStream::cancel`]. Must be called inside a Tokio
    /// runtime.
    pub fn spawn<S>(engine: LogEventEngine, source: S, signal: Option<CancellationToken>) -> Self
    where
        S: LineSource + 'static,
    {
        let cancel = signal.map(|s| s.child_token()).unwrap_or_default();
        let (tx, rx) = mpsc::channel(HANDOFF_CAPACITY);
        let metrics = engine.metrics();

        let task = tokio::spawn(produce(engine, source, tx, cancel.clone()));

        Self {
            rx,
            cancel,
            metrics,
            task: Some(task),
        }
    }

    /// Stop reading lines. Events already handed off are still delivered,
    /// then the stream ends.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    pub async fn next_event(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Wait for the producer to finish and report why it stopped.
    ///
    /// Returns `None` if already joined or if the task panicked.
    pub async fn join(&mut self) -> Option<StopReason> {
        let task = self.task.take()?;
        task.await.ok()
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn produce<S>(
    mut engine: LogEventEngine,
    mut source: S,
    tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
) -> StopReason
where
    S: LineSource,
{
    info!(
        timezone = %engine.options().timezone,
        report_parsing_errors = engine.options().report_parsing_errors,
        report_unmatched_log_lines = engine.options().report_unmatched_log_lines,
        "log event engine started"
    );

    let reason = pump(&mut engine, &mut source, &tx, &cancel).await;

    source.stop();
    drop(tx);

    let snapshot = engine.metrics().snapshot();
    info!(
        reason = ?reason,
        lines = snapshot.lines,
        emitted = snapshot.emitted,
        dropped = snapshot.dropped,
        "log event engine stopped"
    );
    reason
}

async fn pump<S>(
    engine: &mut LogEventEngine,
    source: &mut S,
    tx: &mpsc::Sender<Event>,
    cancel: &CancellationToken,
) -> StopReason
where
    S: LineSource,
{
    loop {
        // Wait for the consumer to make room before touching the source
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return StopReason::Cancelled,
            permit = tx.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    debug!("event consumer dropped");
                    return StopReason::ConsumerGone;
                }
            },
        };

        let event = loop {
            let line = tokio::select! {
                biased;
                _ = cancel.cancelled() => return StopReason::Cancelled,
                line = source.next_line() => line,
            };
            let Some(line) = line else {
                debug!("line source exhausted");
                return StopReason::SourceExhausted;
            };
            if let Some(event) = engine.process_line(&line) {
                break event;
            }
        };

        permit.send(event);
    }
}

/// Tail `path` and stream its events.
///
/// Fatal conditions on the file (missing with `must_exist`, unreadable) are
/// returned here, before any streaming starts.
pub async fn tail_log(
    path: impl AsRef<Path>,
    options: EngineOptions,
    tail: TailOptions,
    signal: Option<CancellationToken>,
) -> Result<EventStream, SourceError> {
    let source = FileTail::open(path, tail).await?;
    Ok(EventStream::spawn(LogEventEngine::new(options), source, signal))
}
