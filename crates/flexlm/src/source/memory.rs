//! In-memory line source for tests and replay of captured logs.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::traits::LineSource;

/// Replays a fixed list of lines.
///
/// By default the source ends after the last line. An endless source instead
/// waits forever once drained, the way a live tail sits on an idle file.
pub struct MemorySource {
    lines: VecDeque<String>,
    endless: bool,
    stopped: Arc<AtomicBool>,
}

impl MemorySource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            endless: false,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Split captured log text into lines
    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines())
    }

    pub fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    /// Flag that flips once `stop()` has been called
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stopped)
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for MemorySource {
    fn next_line(&mut self) -> Pin<Box<dyn Future<Output = Option<String>> + Send + '_>> {
        Box::pin(async move {
            if self.stopped.load(Ordering::Acquire) {
                return None;
            }
            match self.lines.pop_front() {
                Some(line) => Some(line),
                None if self.endless => std::future::pending().await,
                None => None,
            }
        })
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::Release);
        self.lines.clear();
    }
}
