//! Learning signals: append-only observations of tool outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a rating or outcome leans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingBucket {
    Negative,
    Neutral,
    Positive,
}

/// What was observed about a tool run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalOutcome {
    /// The tool run succeeded.
    Success,
    /// The tool run failed.
    Failure,
    /// An explicit user rating, 1-5.
    Rating { stars: u8 },
}

impl SignalOutcome {
    /// Bucket the outcome: 1-2 negative, 3 neutral, 4-5 positive.
    pub fn bucket(&self) -> RatingBucket {
        match self {
            Self::Success => RatingBucket::Positive,
            Self::Failure => RatingBucket::Negative,
            Self::Rating { stars } => match stars {
                0..=2 => RatingBucket::Negative,
                3 => RatingBucket::Neutral,
                _ => RatingBucket::Positive,
            },
        }
    }

    /// The observation fed into the learned-multiplier smoothing.
    pub fn observed_delta(&self) -> f64 {
        match self {
            Self::Success => 0.1,
            Self::Failure => -0.1,
            Self::Rating { stars } => match stars {
                0 | 1 => -0.15,
                2 => -0.075,
                3 => 0.0,
                4 => 0.075,
                _ => 0.15,
            },
        }
    }
}

/// One append-only observation of a tool's outcome, keyed by
/// (tool, task-type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningSignal {
    pub tool: String,
    pub task_type: String,
    pub outcome: SignalOutcome,
    /// Cached `outcome.observed_delta()`, stored so the log is
    /// self-describing when replayed elsewhere.
    pub confidence_delta: f64,
    pub recorded_at: DateTime<Utc>,
}

impl LearningSignal {
    fn new(tool: &str, task_type: &str, outcome: SignalOutcome) -> Self {
        Self {
            tool: tool.to_string(),
            task_type: task_type.to_string(),
            outcome,
            confidence_delta: outcome.observed_delta(),
            recorded_at: Utc::now(),
        }
    }

    /// Signal emitted after a tool execution.
    pub fn from_execution(tool: &str, task_type: &str, success: bool) -> Self {
        let outcome = if success {
            SignalOutcome::Success
        } else {
            SignalOutcome::Failure
        };
        Self::new(tool, task_type, outcome)
    }

    /// Signal emitted from an explicit user rating (clamped to 1-5).
    pub fn from_rating(tool: &str, task_type: &str, stars: u8) -> Self {
        Self::new(
            tool,
            task_type,
            SignalOutcome::Rating {
                stars: stars.clamp(1, 5),
            },
        )
    }
}
