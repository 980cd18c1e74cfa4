//! Crate-wide error taxonomy.
//!
//! Recoverable failures (validation, readiness) are surfaced to callers as
//! pipeline outcomes carrying structured clarification messages, never as raw
//! error text. The variants here cover genuine faults: broken invariants,
//! store conflicts, exhausted tool retries, and terminal approval states.

use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::mission::{MissionId, MissionStatus};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A pre-validation check failed hard enough to stop the pipeline.
    #[error("validation failed ({check}): {message}")]
    ValidationFailure { check: &'static str, message: String },

    /// A goal reached mission construction without its required fields.
    #[error("readiness incomplete: missing {0:?}")]
    ReadinessIncomplete(Vec<String>),

    /// The approval oracle (or user) declined the mission.
    #[error("approval denied{}", feedback.as_deref().map(|f| format!(": {f}")).unwrap_or_default())]
    ApprovalDenied { feedback: Option<String> },

    /// The approval window elapsed without a decision. Distinct from denial.
    #[error("approval request {request_id} timed out")]
    ApprovalTimeout { request_id: Uuid },

    /// Tool execution failed after the retry budget was spent.
    #[error("tool '{tool}' failed after {attempts} attempt(s): {reason}")]
    ToolExecutionFailure {
        tool: String,
        attempts: u32,
        reason: String,
    },

    /// The persistence sink rejected an append. Logged and flagged for
    /// reconciliation; never blocks the user-visible response.
    #[error("persistence sink failed: {0}")]
    Persistence(String),

    /// A state-machine invariant was broken. Processing of that mission halts.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("mission {0} not found")]
    MissionNotFound(MissionId),

    #[error("approval request {0} not found or already resolved")]
    ApprovalRequestNotFound(Uuid),

    /// A second writer tried to claim a mission that is already in flight.
    /// First writer wins.
    #[error("mission {mission} is owned by another in-flight operation")]
    WriterConflict { mission: MissionId },

    /// An event does not apply to the mission's current state.
    #[error("mission {mission}: cannot apply '{event}' while {from}")]
    InvalidTransition {
        mission: MissionId,
        from: MissionStatus,
        event: &'static str,
    },

    #[error("no tool available for this goal")]
    NoToolAvailable,

    /// The approval oracle could not be reached or errored.
    #[error("approval oracle failed: {0}")]
    Oracle(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether the failure can be recovered by clarifying the goal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ValidationFailure { .. } | Error::ReadinessIncomplete(_)
        )
    }
}
