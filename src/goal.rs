//! Goals and session context.
//!
//! A `Goal` is the raw request text plus the session it arrived in. The
//! session is what makes pronoun resolution ("extract the title from there")
//! and clarification round-trips possible.

use serde::{Deserialize, Serialize};

/// A raw user request plus the session context it arrived in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub text: String,
    pub context: SessionContext,
}

impl Goal {
    /// A goal with an empty session (first request).
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: SessionContext::default(),
        }
    }

    /// A goal evaluated against existing session context.
    pub fn with_context(text: impl Into<String>, context: SessionContext) -> Self {
        Self {
            text: text.into(),
            context,
        }
    }
}

/// Rolling per-session state: prior goals, prior approvals, the last URL the
/// session touched and any clarification answers given so far.
///
/// # Invariants
/// - Append-only from the caller's perspective; fields are only ever added to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    /// Goals processed earlier in this session, oldest first.
    pub prior_goals: Vec<String>,

    /// How many missions this session has approved (explicitly or by
    /// auto-execution).
    pub prior_approvals: u32,

    /// The most recent URL seen in a goal or clarification answer. Used for
    /// pronoun resolution ("the same page", "there").
    pub last_url: Option<String>,

    /// Clarification answers given this session, oldest first.
    pub clarification_answers: Vec<String>,
}

impl SessionContext {
    /// True when the session has no history at all.
    pub fn is_empty(&self) -> bool {
        self.prior_goals.is_empty()
            && self.prior_approvals == 0
            && self.last_url.is_none()
            && self.clarification_answers.is_empty()
    }

    pub fn record_goal(&mut self, text: &str) {
        self.prior_goals.push(text.to_string());
    }

    pub fn record_approval(&mut self) {
        self.prior_approvals += 1;
    }

    pub fn record_answer(&mut self, answer: &str) {
        self.clarification_answers.push(answer.to_string());
    }

    /// How much supporting history this session carries, in [0,1].
    ///
    /// A fresh session is neutral rather than zero: absence of history is not
    /// evidence against the goal.
    pub fn richness(&self) -> f64 {
        let mut score: f64 = 0.4;
        if !self.prior_goals.is_empty() {
            score += 0.2;
        }
        if self.last_url.is_some() {
            score += 0.2;
        }
        if self.prior_approvals > 0 {
            score += 0.2;
        }
        score.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_neutral() {
        let ctx = SessionContext::default();
        assert!(ctx.is_empty());
        assert!((ctx.richness() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn richness_saturates() {
        let mut ctx = SessionContext::default();
        ctx.record_goal("go to https://example.com");
        ctx.last_url = Some("https://example.com".to_string());
        ctx.record_approval();
        ctx.record_approval();
        assert!((ctx.richness() - 1.0).abs() < 1e-9);
    }
}
