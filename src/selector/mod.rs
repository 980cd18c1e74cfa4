//! Tool selection with learned feedback.
//!
//! Scores every available tool for the goal, applies the intent-aware
//! override and the learned multiplier, picks the best (ties toward lower
//! historical variance) and prepares its input. Runner-up candidates travel
//! along as alternatives for approval requests.

mod input;
mod scoring;

pub use input::prepare;
pub use scoring::{pattern_score, rank, score_candidate, ToolCandidate};

use crate::config::SelectorConfig;
use crate::learning::{LearnedWeights, ToolPerformance};
use crate::mission::StructuredFields;
use crate::readiness::Intent;
use crate::tools::{ToolInput, ToolRegistry};

/// The selector's verdict for one goal.
#[derive(Debug, Clone)]
pub struct Selection {
    pub best: ToolCandidate,
    pub input: ToolInput,
    /// Runner-ups by combined score, best first.
    pub alternatives: Vec<ToolCandidate>,
}

#[derive(Debug, Clone)]
pub struct ToolSelector {
    config: SelectorConfig,
}

impl ToolSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Pick the best available tool for a goal, or `None` when nothing
    /// usable is registered.
    pub fn select(
        &self,
        goal_text: &str,
        fields: &StructuredFields,
        registry: &ToolRegistry,
        performance: &ToolPerformance,
        learned: &LearnedWeights,
    ) -> Option<Selection> {
        let intent: Intent = fields.intent;
        let mut candidates: Vec<ToolCandidate> = registry
            .infos()
            .iter()
            .filter(|info| info.healthy)
            .map(|info| {
                scoring::score_candidate(
                    &self.config,
                    goal_text,
                    intent,
                    info,
                    performance,
                    learned,
                )
            })
            .collect();

        if candidates.is_empty() {
            return None;
        }

        scoring::rank(&mut candidates);
        let best = candidates.remove(0);
        if best.combined <= 0.0 {
            return None;
        }

        let category = registry.get(&best.name).map(|t| t.category())?;
        let input = input::prepare(goal_text, fields, category);

        tracing::debug!(
            tool = %best.name,
            combined = best.combined,
            pattern = best.pattern_score,
            historical = best.historical_score,
            multiplier = best.learned_multiplier,
            "Tool selected"
        );

        candidates.truncate(2);
        Some(Selection {
            best,
            input,
            alternatives: candidates,
        })
    }
}
