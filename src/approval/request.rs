//! Approval exchange types.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Thresholds;
use crate::mission::MissionId;
use crate::selector::Selection;
use crate::tools::ToolTraits;

/// A request for an external yes/no on a mid-confidence mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub request_id: Uuid,
    pub mission_id: MissionId,
    /// The goal text, verbatim.
    pub goal: String,
    pub confidence: f64,
    /// Best tool first, then alternatives by score.
    pub tools_proposed: Vec<String>,
    pub risks: Vec<String>,
    /// Runner-up tools the approver could pick instead.
    pub alternatives: Vec<String>,
    /// How long the request stays open before timing out.
    pub time_limit: Duration,
    pub requested_at: DateTime<Utc>,
}

impl ApprovalRequest {
    pub fn new(
        mission_id: MissionId,
        goal: impl Into<String>,
        confidence: f64,
        selection: &Selection,
        risks: Vec<String>,
        time_limit: Duration,
    ) -> Self {
        let alternatives: Vec<String> = selection
            .alternatives
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let mut tools_proposed = vec![selection.best.name.clone()];
        tools_proposed.extend(alternatives.iter().cloned());
        Self {
            request_id: Uuid::new_v4(),
            mission_id,
            goal: goal.into(),
            confidence: confidence.clamp(0.0, 1.0),
            tools_proposed,
            risks,
            alternatives,
            time_limit,
            requested_at: Utc::now(),
        }
    }

    /// Whether the request has outlived its window at `now`.
    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        let deadline = self.requested_at
            + chrono::Duration::from_std(self.time_limit).unwrap_or(chrono::Duration::zero());
        now >= deadline
    }
}

/// The external decision for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalResponse {
    pub request_id: Uuid,
    pub approved: bool,
    pub feedback: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ApprovalResponse {
    pub fn approve(request_id: Uuid) -> Self {
        Self {
            request_id,
            approved: true,
            feedback: None,
            timestamp: Utc::now(),
        }
    }

    pub fn deny(request_id: Uuid, feedback: impl Into<String>) -> Self {
        Self {
            request_id,
            approved: false,
            feedback: Some(feedback.into()),
            timestamp: Utc::now(),
        }
    }
}

static DESTRUCTIVE_VERBS: &[&str] = &["delete", "remove", "overwrite", "send", "submit", "post"];

/// Concrete risk notes for the approver. Always names why the mission did
/// not auto-execute.
pub fn derive_risks(
    goal: &str,
    confidence: f64,
    thresholds: &Thresholds,
    tool_traits: Option<ToolTraits>,
) -> Vec<String> {
    let mut risks = vec![format!(
        "confidence {confidence:.2} is below the auto-execute threshold {:.2}",
        thresholds.high
    )];

    if let Some(traits) = tool_traits {
        if traits.side_effects {
            risks.push("the proposed tool performs side effects outside the engine".to_string());
        }
        if !traits.idempotent {
            risks.push("the proposed tool is not idempotent; retries may duplicate effects".to_string());
        }
        if !traits.deterministic {
            risks.push("the proposed tool is not deterministic; results may vary".to_string());
        }
    }

    let lowered = goal.to_lowercase();
    for verb in DESTRUCTIVE_VERBS {
        if lowered.contains(verb) {
            risks.push(format!("the goal mentions '{verb}', which may be destructive"));
            break;
        }
    }

    risks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_wall_clock() {
        let request = ApprovalRequest {
            request_id: Uuid::new_v4(),
            mission_id: MissionId::new(),
            goal: "g".to_string(),
            confidence: 0.7,
            tools_proposed: vec![],
            risks: vec![],
            alternatives: vec![],
            time_limit: Duration::from_secs(300),
            requested_at: Utc::now(),
        };
        assert!(!request.expired_at(Utc::now()));
        assert!(request.expired_at(Utc::now() + chrono::Duration::seconds(301)));
    }

    #[test]
    fn risks_always_name_the_threshold() {
        let risks = derive_risks("extract stuff", 0.7, &Thresholds::default(), None);
        assert!(risks[0].contains("0.70"));
        assert!(risks[0].contains("0.85"));
    }

    #[test]
    fn destructive_goals_carry_a_warning() {
        let risks = derive_risks(
            "delete the old entries from https://example.com",
            0.7,
            &Thresholds::default(),
            None,
        );
        assert!(risks.iter().any(|r| r.contains("delete")));
    }
}
