//! Mission events and the fold that turns them into current state.
//!
//! All mission changes are appended events; `fold` replays them in order to
//! produce the current `Mission`. Applying an event that does not fit the
//! current state is either an idempotent no-op (re-approving an approved
//! mission) or a rejected transition - never a silent overwrite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{ExecutionRecord, Mission, MissionId, MissionStatus, StructuredFields};
use crate::error::{Error, Result};
use crate::tools::ToolInput;

/// Where an approval came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalSource {
    /// Confidence cleared the high threshold; no human involved.
    Auto,
    /// The approval oracle (or user) said yes.
    Oracle,
}

/// One append-only change to a mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MissionEvent {
    Proposed {
        objective: String,
        scope: Option<String>,
        fields: StructuredFields,
        at: DateTime<Utc>,
    },
    ToolSelected {
        tool: String,
        confidence: f64,
        input: ToolInput,
        at: DateTime<Utc>,
    },
    Approved {
        source: ApprovalSource,
        at: DateTime<Utc>,
    },
    ApprovalDenied {
        feedback: Option<String>,
        at: DateTime<Utc>,
    },
    ApprovalTimedOut {
        at: DateTime<Utc>,
    },
    Started {
        at: DateTime<Utc>,
    },
    Completed {
        record: ExecutionRecord,
        at: DateTime<Utc>,
    },
    Failed {
        record: Option<ExecutionRecord>,
        reason: String,
        at: DateTime<Utc>,
    },
}

impl MissionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Proposed { .. } => "proposed",
            Self::ToolSelected { .. } => "tool_selected",
            Self::Approved { .. } => "approved",
            Self::ApprovalDenied { .. } => "approval_denied",
            Self::ApprovalTimedOut { .. } => "approval_timed_out",
            Self::Started { .. } => "started",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Proposed { at, .. }
            | Self::ToolSelected { at, .. }
            | Self::Approved { at, .. }
            | Self::ApprovalDenied { at, .. }
            | Self::ApprovalTimedOut { at }
            | Self::Started { at }
            | Self::Completed { at, .. }
            | Self::Failed { at, .. } => *at,
        }
    }
}

/// How applying one event to the current state turned out.
pub enum Applied {
    /// State advanced to the contained mission.
    Advanced(Mission),
    /// The event repeats what already holds; nothing to append.
    NoOp(Mission),
}

/// Apply one event to the current state of a mission.
///
/// `current` is `None` only for the initial `Proposed` event.
///
/// # Errors
///
/// `Error::InvalidTransition` when the event does not apply to the current
/// state, `Error::InvariantViolation` for events arriving before `Proposed`.
pub fn apply(id: MissionId, current: Option<Mission>, event: &MissionEvent) -> Result<Applied> {
    let Some(mut mission) = current else {
        // Only a proposal can bring a mission into existence.
        return match event {
            MissionEvent::Proposed {
                objective,
                scope,
                fields,
                at,
            } => Ok(Applied::Advanced(Mission {
                id,
                objective: objective.clone(),
                scope: scope.clone(),
                status: MissionStatus::Proposed,
                created_at: *at,
                approved_at: None,
                fields: fields.clone(),
                tool: None,
                tool_confidence: 0.0,
                tool_input: None,
                execution: None,
            })),
            other => Err(Error::InvariantViolation(format!(
                "event '{}' for unknown mission {id}",
                other.name()
            ))),
        };
    };

    let from = mission.status;
    let reject = |event: &MissionEvent| {
        Err(Error::InvalidTransition {
            mission: id,
            from,
            event: event.name(),
        })
    };

    match event {
        MissionEvent::Proposed { .. } => reject(event),

        MissionEvent::ToolSelected {
            tool,
            confidence,
            input,
            ..
        } => match from {
            MissionStatus::Proposed => {
                mission.tool = Some(tool.clone());
                mission.tool_confidence = confidence.clamp(0.0, 1.0);
                mission.tool_input = Some(input.clone());
                Ok(Applied::Advanced(mission))
            }
            _ => reject(event),
        },

        MissionEvent::Approved { at, .. } => match from {
            MissionStatus::Proposed => {
                mission.status = MissionStatus::Approved;
                mission.approved_at = Some(*at);
                Ok(Applied::Advanced(mission))
            }
            // Re-approving an approved mission is a no-op, not an error.
            MissionStatus::Approved => Ok(Applied::NoOp(mission)),
            _ => reject(event),
        },

        MissionEvent::ApprovalDenied { .. } => match from {
            MissionStatus::Proposed => {
                mission.status = MissionStatus::ApprovalDenied;
                Ok(Applied::Advanced(mission))
            }
            MissionStatus::ApprovalDenied => Ok(Applied::NoOp(mission)),
            _ => reject(event),
        },

        MissionEvent::ApprovalTimedOut { .. } => match from {
            MissionStatus::Proposed => {
                mission.status = MissionStatus::ApprovalTimeout;
                Ok(Applied::Advanced(mission))
            }
            MissionStatus::ApprovalTimeout => Ok(Applied::NoOp(mission)),
            _ => reject(event),
        },

        MissionEvent::Started { .. } => match from {
            // Execution may only start from approved. A proposed mission
            // cannot jump straight to active.
            MissionStatus::Approved => {
                mission.status = MissionStatus::Active;
                Ok(Applied::Advanced(mission))
            }
            MissionStatus::Active => Ok(Applied::NoOp(mission)),
            _ => reject(event),
        },

        MissionEvent::Completed { record, .. } => match from {
            MissionStatus::Active => {
                mission.status = MissionStatus::Completed;
                mission.execution = Some(record.clone());
                Ok(Applied::Advanced(mission))
            }
            _ => reject(event),
        },

        MissionEvent::Failed { record, .. } => match from {
            MissionStatus::Active => {
                mission.status = MissionStatus::Failed;
                mission.execution = record.clone();
                Ok(Applied::Advanced(mission))
            }
            _ => reject(event),
        },
    }
}

/// Fold a mission's full event history into its current state.
///
/// # Errors
///
/// Any error from `apply`; a stored history that fails to fold indicates a
/// broken invariant, and processing of that mission halts.
pub fn fold(id: MissionId, events: &[MissionEvent]) -> Result<Mission> {
    let mut current: Option<Mission> = None;
    for event in events {
        current = Some(match apply(id, current, event)? {
            Applied::Advanced(m) | Applied::NoOp(m) => m,
        });
    }
    current.ok_or(Error::MissionNotFound(id))
}
