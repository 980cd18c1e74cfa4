//! Core mission types.
//!
//! # Invariants
//! - A mission's structured fields come exclusively from the readiness
//!   result that produced it; nothing downstream re-parses the goal text.
//! - `tool_confidence` is always in [0.0, 1.0].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::readiness::{Constraint, Intent, ReadinessDecision, ReadinessResult};
use crate::tools::ToolInput;

/// Unique identifier for a mission.
///
/// # Properties
/// - Globally unique within an execution context
/// - Immutable once created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MissionId(Uuid);

impl MissionId {
    /// Create a new unique mission ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a mission in its lifecycle.
///
/// # State Machine
/// ```text
/// Proposed -> Approved -> Active -> Completed
///         |           |        \-> Failed
///         |-> ApprovalDenied
///         \-> ApprovalTimeout
/// ```
///
/// Execution may only start from `Approved`; terminal states are immutable
/// once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    /// Readiness passed; awaiting routing or approval.
    Proposed,
    /// Cleared to execute (auto or explicit).
    Approved,
    /// A tool is currently running.
    Active,
    /// Execution finished successfully.
    Completed,
    /// Execution failed after retries.
    Failed,
    /// The approval was declined. Terminal.
    ApprovalDenied,
    /// The approval window elapsed. Terminal, distinct from denial.
    ApprovalTimeout,
}

impl MissionStatus {
    /// Check if the mission is in a terminal state.
    ///
    /// # Property
    /// `is_terminal() => no further events apply`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::ApprovalDenied | Self::ApprovalTimeout
        )
    }
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Proposed => "proposed",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::ApprovalDenied => "approval_denied",
            Self::ApprovalTimeout => "approval_timeout",
        };
        write!(f, "{}", s)
    }
}

/// Structured fields copied verbatim from the readiness result that gated
/// this mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredFields {
    pub intent: Intent,
    pub action_object: Option<String>,
    pub action_target: Option<String>,
    pub source_url: Option<String>,
    pub constraints: Vec<Constraint>,
}

impl StructuredFields {
    /// Copy the fields out of a READY readiness result.
    ///
    /// # Errors
    ///
    /// `Error::InvariantViolation` if the result is not READY or carries no
    /// intent - missions must never be built from anything else.
    pub fn from_readiness(result: &ReadinessResult) -> Result<Self> {
        if result.decision != ReadinessDecision::Ready {
            return Err(Error::InvariantViolation(format!(
                "mission fields requested from a {} readiness result",
                result.decision
            )));
        }
        let intent = result.intent.ok_or_else(|| {
            Error::InvariantViolation("READY readiness result without an intent".to_string())
        })?;
        Ok(Self {
            intent,
            action_object: result.action_object.clone(),
            action_target: result.action_target.clone(),
            source_url: result.source_url.clone(),
            constraints: result.constraints.clone(),
        })
    }
}

/// What happened when the mission's tool ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub tool: String,
    pub input: ToolInput,
    pub output: Option<String>,
    pub success: bool,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// A persisted, gated unit of work derived from a user goal.
///
/// Missions are never mutated in place; this struct is the fold of a
/// mission's event log at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    /// The goal text, verbatim.
    pub objective: String,
    /// Where the mission is allowed to act (the source host, typically).
    pub scope: Option<String>,
    pub status: MissionStatus,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub fields: StructuredFields,
    /// Tool chosen by the selector, if selection has happened.
    pub tool: Option<String>,
    /// Combined selection confidence for that tool.
    pub tool_confidence: f64,
    /// Prepared input for the selected tool.
    pub tool_input: Option<ToolInput>,
    pub execution: Option<ExecutionRecord>,
}
