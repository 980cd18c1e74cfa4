//! Pre-validation: six deterministic checks run before deeper reasoning.
//!
//! Cheap, read-only screens that penalize or reject impossible and
//! self-contradictory goals before the readiness engine and confidence model
//! spend effort on them. Checks never invoke tools, so validation alone can
//! have no side effects. Severe failures short-circuit the pipeline; the
//! rest only subtract from confidence.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::goal::Goal;
use crate::readiness::extract;
use crate::tools::ToolRegistry;

static UI_VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:click|press|type\s+into|select|toggle|hover\s+over)\b")
        .expect("valid regex")
});

static UI_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:"[^"]+"|'[^']+'|\bthe\s+[a-z0-9 _-]+\s+(?:button|link|field|tab|menu|checkbox)\b|(?:^|\s)[#.][A-Za-z][\w-]*)"#)
        .expect("valid regex")
});

static EXTERNAL_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:the\s+page|the\s+file|the\s+document|the\s+results?|previous|earlier|that|there|it)\b")
        .expect("valid regex")
});

static NO_BROWSER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:without\s+(?:a\s+|the\s+)?browser|without\s+browsing|offline|no\s+browser)\b")
        .expect("valid regex")
});

static ALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\ball\s+(?:the\s+)?\w+").expect("valid regex"));

static ONLY_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bonly\s+(?:the\s+)?first\b|\bjust\s+(?:the\s+)?first\b").expect("valid regex")
});

static OUT_OF_SCOPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:call|phone|text)\s+(?:me|him|her|them|\+?\d)|\b(?:print\s+(?:this|it|the)\b.*\bpaper\b)|\b(?:order|buy|purchase)\s+(?:a\s+|some\s+)?(?:pizza|food|groceries)\b|\bsend\s+money\b|\bmake\s+a\s+payment\b|\bunlock\s+the\s+door\b|\bturn\s+(?:on|off)\s+the\s+lights?\b",
    )
    .expect("valid regex")
});

static STEP_CONNECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:and\s+then|then|after\s+that|afterwards|finally)\b")
        .expect("valid regex")
});

/// The six pre-validation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// The tools the goal's intent needs are registered and healthy.
    ToolAvailability,
    /// UI-style goals must name the element they act on.
    TargetElement,
    /// Goals referencing prior material need session context to back it.
    ContextAvailability,
    /// Clauses of the goal must not contradict each other.
    Contradiction,
    /// The goal must be something this system can do at all.
    OutOfScope,
    /// Goals needing many steps get a warning, not a rejection.
    Complexity,
}

impl CheckKind {
    /// Confidence delta applied when the check fails.
    pub fn delta(&self) -> f64 {
        match self {
            CheckKind::ToolAvailability => -0.3,
            CheckKind::TargetElement => -0.2,
            CheckKind::ContextAvailability => -0.2,
            CheckKind::Contradiction => -0.3,
            CheckKind::OutOfScope => -0.4,
            CheckKind::Complexity => -0.1,
        }
    }

    /// Severe failures stop the pipeline before the confidence model runs.
    pub fn is_severe(&self) -> bool {
        matches!(
            self,
            CheckKind::ToolAvailability | CheckKind::Contradiction | CheckKind::OutOfScope
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::ToolAvailability => "tool_availability",
            CheckKind::TargetElement => "target_element",
            CheckKind::ContextAvailability => "context_availability",
            CheckKind::Contradiction => "contradiction",
            CheckKind::OutOfScope => "out_of_scope",
            CheckKind::Complexity => "complexity",
        }
    }
}

/// One failed check with its user-facing explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckFailure {
    pub kind: CheckKind,
    pub message: String,
}

/// Outcome of running all six checks against a goal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub failures: Vec<CheckFailure>,
    /// Sum of the deltas of all failed checks. Always <= 0.
    pub confidence_delta: f64,
}

impl ValidationReport {
    /// The first severe failure, if any. Severe failures short-circuit.
    pub fn severe(&self) -> Option<&CheckFailure> {
        self.failures.iter().find(|f| f.kind.is_severe())
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Did a clarity-related check fail? Used by the approval gate to decide
    /// between rejection and clarification for low-confidence goals.
    pub fn ambiguity_caused(&self) -> bool {
        self.failures.iter().any(|f| {
            matches!(
                f.kind,
                CheckKind::Contradiction | CheckKind::TargetElement | CheckKind::ContextAvailability
            )
        })
    }
}

/// Runs the six checks. Stateless and read-only.
#[derive(Debug, Default)]
pub struct PreValidator;

impl PreValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, goal: &Goal, registry: &ToolRegistry) -> ValidationReport {
        let mut report = ValidationReport::default();
        let text = goal.text.as_str();

        self.check_tool_availability(text, registry, &mut report);
        self.check_target_element(text, &mut report);
        self.check_context_availability(goal, &mut report);
        self.check_contradiction(text, &mut report);
        self.check_out_of_scope(text, &mut report);
        self.check_complexity(text, &mut report);

        if !report.failures.is_empty() {
            tracing::debug!(
                failures = report.failures.len(),
                delta = report.confidence_delta,
                "Pre-validation found issues"
            );
        }
        report
    }

    fn fail(&self, report: &mut ValidationReport, kind: CheckKind, message: String) {
        report.confidence_delta += kind.delta();
        report.failures.push(CheckFailure { kind, message });
    }

    /// Check 1: the intent's primary tool category has an available tool.
    fn check_tool_availability(
        &self,
        text: &str,
        registry: &ToolRegistry,
        report: &mut ValidationReport,
    ) {
        for intent in extract::detect_intents(text) {
            let category = intent.primary_category();
            if !registry.has_category(category) {
                self.fail(
                    report,
                    CheckKind::ToolAvailability,
                    format!("no {category} tool is currently available for a '{intent}' goal"),
                );
                return;
            }
        }
    }

    /// Check 2: UI-style goals ("click ...") must name their target element.
    fn check_target_element(&self, text: &str, report: &mut ValidationReport) {
        if UI_VERB_RE.is_match(text) && !UI_TARGET_RE.is_match(text) {
            self.fail(
                report,
                CheckKind::TargetElement,
                "the goal acts on a page element but does not name one".to_string(),
            );
        }
    }

    /// Check 3: goals referencing prior material need session context.
    fn check_context_availability(&self, goal: &Goal, report: &mut ValidationReport) {
        if EXTERNAL_REFERENCE_RE.is_match(&goal.text)
            && goal.context.is_empty()
            && extract::find_url(&goal.text).is_none()
        {
            self.fail(
                report,
                CheckKind::ContextAvailability,
                "the goal refers to earlier material, but this session has none".to_string(),
            );
        }
    }

    /// Check 4: clauses must not contradict each other.
    fn check_contradiction(&self, text: &str, report: &mut ValidationReport) {
        let browserless_browsing = NO_BROWSER_RE.is_match(text)
            && (!extract::detect_intents(text).is_empty() || extract::find_url(text).is_some());
        let all_vs_first = ALL_RE.is_match(text) && ONLY_FIRST_RE.is_match(text);

        if browserless_browsing {
            self.fail(
                report,
                CheckKind::Contradiction,
                "the goal needs a page but asks to work without the browser".to_string(),
            );
        } else if all_vs_first {
            self.fail(
                report,
                CheckKind::Contradiction,
                "the goal asks for all items and only the first at the same time".to_string(),
            );
        }
    }

    /// Check 5: physical-world and payment actions are out of scope.
    fn check_out_of_scope(&self, text: &str, report: &mut ValidationReport) {
        if OUT_OF_SCOPE_RE.is_match(text) {
            self.fail(
                report,
                CheckKind::OutOfScope,
                "this asks for an action outside the web: I can extract, search and navigate"
                    .to_string(),
            );
        }
    }

    /// Check 6: many-step goals get a complexity warning.
    fn check_complexity(&self, text: &str, report: &mut ValidationReport) {
        let steps = STEP_CONNECTOR_RE.find_iter(text).count();
        if steps >= 2 {
            self.fail(
                report,
                CheckKind::Complexity,
                format!("the goal chains {} steps; consider splitting it", steps + 1),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::standard_registry;
    use crate::tools::ToolRegistry;

    fn run(text: &str) -> ValidationReport {
        let registry = standard_registry();
        PreValidator::new().run(&Goal::new(text), &registry)
    }

    #[test]
    fn clean_goal_passes() {
        let report = run("Extract the title from https://example.com");
        assert!(report.passed());
        assert_eq!(report.confidence_delta, 0.0);
    }

    #[test]
    fn missing_tool_is_severe() {
        let registry = ToolRegistry::new();
        let report =
            PreValidator::new().run(&Goal::new("extract the title from example.com"), &registry);
        let severe = report.severe().expect("should fail tool availability");
        assert_eq!(severe.kind, CheckKind::ToolAvailability);
        assert!((report.confidence_delta - (-0.3)).abs() < 1e-9);
    }

    #[test]
    fn unhealthy_tool_counts_as_missing() {
        let registry = standard_registry();
        registry.set_health("page_extractor", false);
        let report =
            PreValidator::new().run(&Goal::new("extract the title from example.com"), &registry);
        assert!(report.severe().is_some());
    }

    #[test]
    fn ui_goal_without_element_penalized() {
        let report = run("click around on https://example.com");
        assert!(report
            .failures
            .iter()
            .any(|f| f.kind == CheckKind::TargetElement));
        assert!(report.severe().is_none());
    }

    #[test]
    fn contradiction_detected() {
        let report = run("extract all the rows but only the first one from example.com");
        assert!(report
            .failures
            .iter()
            .any(|f| f.kind == CheckKind::Contradiction));
        assert!(report.ambiguity_caused());
    }

    #[test]
    fn out_of_scope_detected() {
        let report = run("order a pizza for me");
        let severe = report.severe().expect("out of scope is severe");
        assert_eq!(severe.kind, CheckKind::OutOfScope);
    }

    #[test]
    fn complexity_warns_without_short_circuit() {
        let report =
            run("open example.com then extract the table and then search for the totals");
        assert!(report
            .failures
            .iter()
            .any(|f| f.kind == CheckKind::Complexity));
    }

    #[test]
    fn checks_have_no_side_effects() {
        let registry = standard_registry();
        let goal = Goal::new("extract the title from https://example.com");
        let validator = PreValidator::new();
        let first = validator.run(&goal, &registry);
        let second = validator.run(&goal, &registry);
        assert_eq!(first.failures.len(), second.failures.len());
        assert_eq!(first.confidence_delta, second.confidence_delta);
    }
}
