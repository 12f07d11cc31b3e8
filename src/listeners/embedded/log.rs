//! # LogWriter — forwards relayed events to `tracing`
//!
//! A minimal listener for diagnostics and demos.
//!
//! ## Example output
//! ```text
//! INFO logrelay: relayed message seq=1 text="Starting Service"
//! WARN logrelay: relayed error seq=2 text="work 'scan' failed" frames=2
//! DEBUG logrelay: frame frame="disk gone"
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::listeners::Listen;

/// Event writer listener.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Listen for LogWriter {
    async fn on_message(&self, text: &str) {
        info!(text, "relayed message");
    }

    async fn on_error(&self, text: &str, stack_frames: &[String]) {
        warn!(text, frames = stack_frames.len(), "relayed error");
        for frame in stack_frames {
            debug!(frame = frame.as_str(), "frame");
        }
    }

    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::Message => info!(seq = e.seq, text = &*e.text, "relayed message"),
            EventKind::Error => {
                warn!(
                    seq = e.seq,
                    text = &*e.text,
                    frames = e.stack_frames.len(),
                    fault_report = e.is_fault_report(),
                    "relayed error"
                );
                for frame in e.stack_frames.iter() {
                    debug!(frame = frame.as_str(), "frame");
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
