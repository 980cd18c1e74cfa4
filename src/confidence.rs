//! Confidence model: a deterministic weighted sum of four factors.
//!
//! The model estimates how likely unsupervised execution is to succeed. It
//! performs no learning itself - weights are external, tunable constants -
//! and the same inputs always yield the same score. Pre-validation deltas
//! are applied on top, and the result is clamped to [0,1].

use serde::{Deserialize, Serialize};

use crate::config::ConfidenceWeights;
use crate::goal::Goal;
use crate::readiness::ReadinessResult;
use crate::tools::ToolRegistry;
use crate::validation::{CheckKind, ValidationReport};

/// The four factor scores before weighting, each in [0,1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FactorScores {
    pub clarity: f64,
    pub tool_availability: f64,
    pub context: f64,
    pub reliability: f64,
}

/// Computes confidence scores.
#[derive(Debug, Clone)]
pub struct ConfidenceModel {
    weights: ConfidenceWeights,
}

impl ConfidenceModel {
    pub fn new(weights: ConfidenceWeights) -> Self {
        Self { weights }
    }

    /// The unweighted factor scores for one goal.
    pub fn factors(
        &self,
        goal: &Goal,
        readiness: &ReadinessResult,
        registry: &ToolRegistry,
        report: &ValidationReport,
    ) -> FactorScores {
        FactorScores {
            clarity: clarity_score(readiness, report),
            tool_availability: availability_score(readiness, registry),
            context: goal.context.richness(),
            reliability: reliability_score(readiness, registry),
        }
    }

    /// Weighted confidence with pre-validation deltas applied, in [0,1].
    pub fn score(
        &self,
        goal: &Goal,
        readiness: &ReadinessResult,
        registry: &ToolRegistry,
        report: &ValidationReport,
    ) -> f64 {
        let f = self.factors(goal, readiness, registry, report);
        let weighted = self.weights.clarity * f.clarity
            + self.weights.tool_availability * f.tool_availability
            + self.weights.context * f.context
            + self.weights.reliability * f.reliability;
        let score = (weighted + report.confidence_delta).clamp(0.0, 1.0);
        tracing::debug!(
            clarity = f.clarity,
            availability = f.tool_availability,
            context = f.context,
            reliability = f.reliability,
            delta = report.confidence_delta,
            score,
            "Confidence computed"
        );
        score
    }
}

/// Clarity: action verb recognized, target specified, no contradictions.
fn clarity_score(readiness: &ReadinessResult, report: &ValidationReport) -> f64 {
    let mut score = 0.0;
    if readiness.intent.is_some() {
        score += 0.4;
    }
    if readiness.action_object.is_some() || readiness.source_url.is_some() {
        score += 0.3;
    }
    let contradicted = report
        .failures
        .iter()
        .any(|f| f.kind == CheckKind::Contradiction);
    if !contradicted {
        score += 0.3;
    }
    score
}

/// Availability: 1.0 when the intent's primary tool category has a healthy
/// tool, 0.3 when tools exist but are unhealthy, 0.0 when none are
/// registered. Goals without an execution intent get a neutral 0.5.
fn availability_score(readiness: &ReadinessResult, registry: &ToolRegistry) -> f64 {
    let Some(intent) = readiness.intent else {
        return 0.5;
    };
    let category = intent.primary_category();
    if registry.has_category(category) {
        1.0
    } else if registry.infos().iter().any(|i| i.category == category) {
        0.3
    } else {
        0.0
    }
}

/// Reliability: the best trait score among available tools in the intent's
/// category. Deterministic, idempotent, side-effect-free tools raise it.
fn reliability_score(readiness: &ReadinessResult, registry: &ToolRegistry) -> f64 {
    match readiness.intent {
        Some(intent) => registry.category_reliability(intent.primary_category()),
        None => 0.3,
    }
}
