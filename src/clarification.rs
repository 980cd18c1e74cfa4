//! Clarification dialogue.
//!
//! Every non-READY classification maps to exactly one entry in a closed
//! taxonomy, and every entry renders a templated question carrying at least
//! one concrete example. A generic "please provide more details" is never
//! produced. Clarification answers re-enter pre-validation and readiness
//! with merged context; they never construct a mission directly.

use serde::{Deserialize, Serialize};

use crate::goal::Goal;
use crate::readiness::{ReadinessDecision, ReadinessResult};

/// Why a goal could not proceed, from the closed taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClarificationType {
    /// The goal names no object to act on.
    MissingObject,
    /// The goal names no source location.
    MissingTarget,
    /// The goal names no source location and the session has none to offer.
    MissingTargetNoContext,
    /// The goal points at "it"/"there" but nothing precedes it.
    AmbiguousReference,
    /// The goal asks for several different actions at once.
    MultiIntent,
    /// The goal is too vague to classify.
    TooVague,
    /// The action verb could mean several different things.
    IntentAmbiguous,
    /// Constraints contradict each other or cannot be parsed.
    ConstraintUnclear,
}

impl std::fmt::Display for ClarificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MissingObject => "missing_object",
            Self::MissingTarget => "missing_target",
            Self::MissingTargetNoContext => "missing_target_no_context",
            Self::AmbiguousReference => "ambiguous_reference",
            Self::MultiIntent => "multi_intent",
            Self::TooVague => "too_vague",
            Self::IntentAmbiguous => "intent_ambiguous",
            Self::ConstraintUnclear => "constraint_unclear",
        };
        write!(f, "{}", s)
    }
}

/// A targeted question back to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clarification {
    pub kind: ClarificationType,
    pub question: String,
}

/// Renders clarification questions from readiness results.
#[derive(Debug, Default)]
pub struct ClarificationGenerator;

impl ClarificationGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Build the question for a non-READY result.
    ///
    /// Falls back to `TooVague` if the readiness engine left no explicit
    /// clarification type (it always should).
    pub fn generate(&self, result: &ReadinessResult, goal: &Goal) -> Clarification {
        debug_assert!(result.decision != ReadinessDecision::Ready);
        let kind = result.clarification.unwrap_or(ClarificationType::TooVague);
        Clarification {
            kind,
            question: self.question_for(kind, result, goal),
        }
    }

    /// A clarification built directly from a type, for callers outside the
    /// readiness path (pre-validation contradiction routing).
    pub fn for_kind(&self, kind: ClarificationType, goal: &Goal) -> Clarification {
        Clarification {
            kind,
            question: self.question_for(kind, &ReadinessResult::default(), goal),
        }
    }

    fn question_for(
        &self,
        kind: ClarificationType,
        result: &ReadinessResult,
        goal: &Goal,
    ) -> String {
        let verb = result
            .intent
            .map(|i| i.task_type())
            .unwrap_or("work with");
        match kind {
            ClarificationType::MissingObject => format!(
                "What exactly should I {verb}? For example: \"the article title\", \
                 \"all product prices\" or \"links in the footer\"."
            ),
            ClarificationType::MissingTarget => format!(
                "Where should I {verb} that from? Please give me a page, for example \
                 https://example.com/products."
            ),
            ClarificationType::MissingTargetNoContext => format!(
                "Where should I {verb} that from? I don't have a page open yet, so I need \
                 a full address, for example https://example.com."
            ),
            ClarificationType::AmbiguousReference => {
                "You referred to \"there\" or \"it\", but I don't know which page that is. \
                 Which URL do you mean? For example: https://example.com/pricing."
                    .to_string()
            }
            ClarificationType::MultiIntent => format!(
                "That sounds like several tasks at once. Which should I do first? For \
                 example: \"first open the page, then extract the table\". You said: \
                 \"{}\".",
                goal.text.trim()
            ),
            ClarificationType::TooVague => {
                "I can't tell what you'd like done. Could you phrase it as an action? For \
                 example: \"extract the headlines from https://news.example.com\"."
                    .to_string()
            }
            ClarificationType::IntentAmbiguous => format!(
                "I'm not sure what kind of action you mean by \"{}\". Do you want me to \
                 extract data, search for something, or open a page? For example: \
                 \"extract the prices from example.com/shop\".",
                goal.text.trim()
            ),
            ClarificationType::ConstraintUnclear => {
                "Your request seems to ask for contradictory things. Could you restate the \
                 limits? For example: \"extract only the first 10 results\" or \"extract \
                 all results\" - but not both."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readiness::RequiredField;

    fn incomplete_result(kind: ClarificationType, missing: Vec<RequiredField>) -> ReadinessResult {
        ReadinessResult {
            decision: ReadinessDecision::Incomplete,
            missing_fields: missing,
            clarification: Some(kind),
            ..ReadinessResult::default()
        }
    }

    #[test]
    fn every_question_carries_an_example() {
        let generator = ClarificationGenerator::new();
        let goal = Goal::new("do something");
        for kind in [
            ClarificationType::MissingObject,
            ClarificationType::MissingTarget,
            ClarificationType::MissingTargetNoContext,
            ClarificationType::AmbiguousReference,
            ClarificationType::MultiIntent,
            ClarificationType::TooVague,
            ClarificationType::IntentAmbiguous,
            ClarificationType::ConstraintUnclear,
        ] {
            let c = generator.for_kind(kind, &goal);
            assert!(
                c.question.contains("example") || c.question.contains("first"),
                "{kind}: question must carry a concrete example: {}",
                c.question
            );
            assert!(!c.question.to_lowercase().contains("more details"));
        }
    }

    #[test]
    fn missing_source_question_asks_where() {
        let generator = ClarificationGenerator::new();
        let goal = Goal::new("Extract the title");
        let result = incomplete_result(
            ClarificationType::MissingTargetNoContext,
            vec![RequiredField::SourceUrl],
        );
        let c = generator.generate(&result, &goal);
        assert!(c.question.to_lowercase().contains("where"));
    }
}
