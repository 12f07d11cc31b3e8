//! # LogView — append-only rendered log list.
//!
//! The consumer-side list a foreground surface renders. Each event becomes one
//! or more lines:
//!
//! ```text
//! Message("hello")                → "hello"
//! Error("boom", ["a()", "b()"])   → "ERROR: boom", "a()", "b()"
//! ```
//!
//! The surface can also [`push`](LogView::push) its own lines (lifecycle notes and
//! the like). An optional line limit drops the oldest lines first.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::listener::Listen;

/// Prefix of the first line rendered for an `Error` event.
pub const ERROR_PREFIX: &str = "ERROR: ";

/// Listener that keeps rendered lines in memory.
pub struct LogView {
    name: &'static str,
    lines: Mutex<VecDeque<String>>,
    limit: Option<usize>,
}

impl LogView {
    /// Unbounded view.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            lines: Mutex::new(VecDeque::new()),
            limit: None,
        }
    }

    /// View keeping at most `limit` lines (min 1).
    #[must_use]
    pub fn with_limit(name: &'static str, limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::new(name)
        }
    }

    /// Appends a line.
    pub fn push(&self, line: impl Into<String>) {
        let mut lines = self.lines.lock();
        lines.push_back(line.into());
        if let Some(limit) = self.limit {
            while lines.len() > limit {
                lines.pop_front();
            }
        }
    }

    /// Snapshot of all lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

#[async_trait]
impl Listen for LogView {
    async fn on_message(&self, text: &str) {
        self.push(text);
    }

    async fn on_error(&self, text: &str, stack_frames: &[String]) {
        self.push(format!("{ERROR_PREFIX}{text}"));
        for frame in stack_frames {
            self.push(frame.as_str());
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
