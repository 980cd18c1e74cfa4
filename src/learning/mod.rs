//! Feedback and learning loop.
//!
//! Outcomes and user ratings become `LearningSignal`s in an append-only,
//! replayable log. Everything derived from them - learned multipliers,
//! historical success rates - is a pure fold over that log, so selection
//! weights can always be fully re-derived from history.

mod performance;
mod signal;
mod weights;

pub use performance::{ToolPerformance, ToolStats};
pub use signal::{LearningSignal, RatingBucket, SignalOutcome};
pub use weights::LearnedWeights;

use std::sync::{Arc, Mutex};

use crate::sink::{PersistenceSink, SinkRecord};

/// Append-only log of learning signals, mirrored to the persistence sink.
pub struct SignalLog {
    entries: Mutex<Vec<LearningSignal>>,
    sink: Arc<dyn PersistenceSink>,
}

impl SignalLog {
    pub fn new(sink: Arc<dyn PersistenceSink>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            sink,
        }
    }

    /// Append one signal. Sink failure is logged, never surfaced.
    pub async fn append(&self, signal: LearningSignal) {
        if let Ok(payload) = serde_json::to_value(&signal) {
            if let Err(e) = self.sink.append(&SinkRecord::new("signals", payload)).await {
                tracing::warn!(
                    tool = %signal.tool,
                    error = %e,
                    "Persistence sink rejected learning signal"
                );
            }
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(signal);
        }
    }

    /// Snapshot of the full history, oldest first.
    pub fn snapshot(&self) -> Vec<LearningSignal> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
