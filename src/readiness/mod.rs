//! Action readiness engine - the sole mission gate.
//!
//! Decides whether a goal carries enough structured information to become a
//! mission. Five-way decision: READY, INCOMPLETE, QUESTION, AMBIGUOUS, META.
//! This engine is the single authoritative entry point for mission
//! construction for execution-class intents; no other intake path may create
//! a mission for them.
//!
//! # Invariants
//! - A READY result satisfies its intent's full field schema (hard-asserted
//!   before returning).
//! - Evaluation is pure: no tool calls, no log writes, same goal and context
//!   always produce the same result.

pub mod extract;
mod intent;

pub use intent::{Intent, RequiredField};

use serde::{Deserialize, Serialize};

use crate::clarification::ClarificationType;
use crate::error::{Error, Result};
use crate::goal::Goal;

/// The five-way readiness decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessDecision {
    /// Every required field present; a mission may be built.
    Ready,
    /// Execution intent recognized, but a required field is missing.
    Incomplete,
    /// The goal is a question to answer, not an action to take.
    Question,
    /// The goal is ambiguous: vague, multi-intent, or a dangling reference.
    #[default]
    Ambiguous,
    /// The goal is about the system itself.
    Meta,
}

impl std::fmt::Display for ReadinessDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ready => "ready",
            Self::Incomplete => "incomplete",
            Self::Question => "question",
            Self::Ambiguous => "ambiguous",
            Self::Meta => "meta",
        };
        write!(f, "{}", s)
    }
}

/// A structured constraint parsed out of the goal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    CountLimit(u32),
    Format(String),
    Filter(String),
}

/// The full readiness verdict for one goal.
///
/// Structured fields here are the *only* source for mission fields; nothing
/// downstream re-parses the raw goal text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadinessResult {
    pub decision: ReadinessDecision,
    pub intent: Option<Intent>,
    pub action_object: Option<String>,
    pub action_target: Option<String>,
    pub source_url: Option<String>,
    pub constraints: Vec<Constraint>,
    pub missing_fields: Vec<RequiredField>,
    pub clarification: Option<ClarificationType>,
}

impl ReadinessResult {
    fn non_ready(
        decision: ReadinessDecision,
        intent: Option<Intent>,
        clarification: ClarificationType,
    ) -> Self {
        Self {
            decision,
            intent,
            clarification: Some(clarification),
            ..Self::default()
        }
    }

    /// Whether the given field is populated.
    fn has_field(&self, field: RequiredField) -> bool {
        match field {
            RequiredField::ActionObject => self.action_object.is_some(),
            RequiredField::SourceUrl => self.source_url.is_some(),
        }
    }
}

/// Evaluates goals into readiness results.
#[derive(Debug, Default)]
pub struct ReadinessEngine;

impl ReadinessEngine {
    pub fn new() -> Self {
        Self
    }

    /// Classify a goal and, for execution-class intents, populate its
    /// structured fields.
    ///
    /// # Errors
    ///
    /// `Error::InvariantViolation` if a READY result would be returned with a
    /// schema field missing. That cannot happen through this code path; the
    /// assertion is the last line of defense for the sole-gate invariant.
    pub fn evaluate(&self, goal: &Goal) -> Result<ReadinessResult> {
        let text = goal.text.trim();

        if detect_empty(text) {
            return Ok(ReadinessResult::non_ready(
                ReadinessDecision::Ambiguous,
                None,
                ClarificationType::TooVague,
            ));
        }

        if extract::detect_meta(text) {
            return Ok(ReadinessResult {
                decision: ReadinessDecision::Meta,
                clarification: Some(ClarificationType::IntentAmbiguous),
                ..ReadinessResult::default()
            });
        }

        let intents = extract::detect_intents(text);

        if intents.is_empty() {
            if extract::detect_question(text) {
                return Ok(ReadinessResult::non_ready(
                    ReadinessDecision::Question,
                    None,
                    ClarificationType::IntentAmbiguous,
                ));
            }
            if extract::detect_ambiguous_verb(text) {
                return Ok(ReadinessResult::non_ready(
                    ReadinessDecision::Ambiguous,
                    None,
                    ClarificationType::IntentAmbiguous,
                ));
            }
            return Ok(ReadinessResult::non_ready(
                ReadinessDecision::Ambiguous,
                None,
                ClarificationType::TooVague,
            ));
        }

        if intents.len() > 1 {
            return Ok(ReadinessResult::non_ready(
                ReadinessDecision::Ambiguous,
                None,
                ClarificationType::MultiIntent,
            ));
        }

        let intent = intents[0];

        // A dangling "there"/"it" with nothing in the session to resolve it
        // against is ambiguity, not incompleteness.
        if extract::has_pronoun_reference(text) && goal.context.last_url.is_none() {
            return Ok(ReadinessResult::non_ready(
                ReadinessDecision::Ambiguous,
                Some(intent),
                ClarificationType::AmbiguousReference,
            ));
        }

        let mut result = ReadinessResult {
            decision: ReadinessDecision::Ready,
            intent: Some(intent),
            action_object: extract::extract_object(text, intent),
            action_target: extract::extract_target(text),
            source_url: extract::resolve_url(text, &goal.context),
            constraints: extract::extract_constraints(text),
            missing_fields: Vec::new(),
            clarification: None,
        };

        for field in intent.required_fields() {
            if !result.has_field(*field) {
                result.missing_fields.push(*field);
            }
        }

        if !result.missing_fields.is_empty() {
            result.decision = ReadinessDecision::Incomplete;
            result.clarification = Some(classify_missing(&result, goal));
            return Ok(result);
        }

        assert_schema(&result)?;
        Ok(result)
    }
}

fn detect_empty(text: &str) -> bool {
    text.is_empty() || text.split_whitespace().count() < 2
}

fn classify_missing(result: &ReadinessResult, goal: &Goal) -> ClarificationType {
    if result.missing_fields.contains(&RequiredField::SourceUrl) {
        if goal.context.is_empty() {
            ClarificationType::MissingTargetNoContext
        } else {
            ClarificationType::MissingTarget
        }
    } else {
        ClarificationType::MissingObject
    }
}

/// Hard assertion: a READY result must satisfy its intent's schema.
fn assert_schema(result: &ReadinessResult) -> Result<()> {
    if result.decision != ReadinessDecision::Ready {
        return Ok(());
    }
    let intent = result.intent.ok_or_else(|| {
        Error::InvariantViolation("READY result without an intent".to_string())
    })?;
    for field in intent.required_fields() {
        if !result.has_field(*field) {
            return Err(Error::InvariantViolation(format!(
                "READY result for intent '{intent}' missing required field '{field}'"
            )));
        }
    }
    Ok(())
}
