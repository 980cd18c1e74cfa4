//! Candidate scoring.
//!
//! Per candidate: `0.8 * pattern_match + 0.2 * historical_success`, then an
//! intent-aware category override (fixed boost for favored categories, heavy
//! penalty for ruled-out ones) and the bounded learned multiplier for the
//! (tool, task-type) pair. Ties break toward lower historical variance.

use serde::{Deserialize, Serialize};

use crate::config::SelectorConfig;
use crate::learning::{LearnedWeights, ToolPerformance};
use crate::readiness::Intent;
use crate::tools::ToolInfo;

/// One scored tool candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCandidate {
    pub name: String,
    pub pattern_score: f64,
    pub historical_score: f64,
    pub learned_multiplier: f64,
    /// Final score after weighting, override and multiplier, in [0,1].
    pub combined: f64,
    /// Historical variance, used only to break ties.
    pub variance: f64,
}

/// Keyword overlap between the goal text and what the tool says about
/// itself, in [0,1].
pub fn pattern_score(goal_text: &str, info: &ToolInfo) -> f64 {
    let goal = goal_text.to_lowercase();
    let goal_words: Vec<&str> = goal
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .collect();
    if goal_words.is_empty() {
        return 0.0;
    }

    let tool_text = format!(
        "{} {} {}",
        info.name.replace('_', " "),
        info.description.to_lowercase(),
        info.category
    );
    let tool_words: std::collections::HashSet<&str> = tool_text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .collect();

    let hits = goal_words
        .iter()
        .filter(|w| tool_words.contains(*w))
        .count();
    // A handful of overlapping words is a strong match already.
    (hits as f64 / 4.0).min(1.0)
}

/// Score one tool for one goal.
pub fn score_candidate(
    config: &SelectorConfig,
    goal_text: &str,
    intent: Intent,
    info: &ToolInfo,
    performance: &ToolPerformance,
    learned: &LearnedWeights,
) -> ToolCandidate {
    let pattern = pattern_score(goal_text, info);
    let stats = performance.stats(&info.name);
    let historical = stats.success_rate();
    let multiplier = learned.multiplier(&info.name, intent.task_type());

    let mut combined = config.pattern_weight * pattern + config.history_weight * historical;
    if intent.favored_categories().contains(&info.category) {
        combined += config.intent_boost;
    }
    if intent.penalized_categories().contains(&info.category) {
        combined -= config.mismatch_penalty;
    }
    combined = (combined + multiplier).clamp(0.0, 1.0);

    ToolCandidate {
        name: info.name.clone(),
        pattern_score: pattern,
        historical_score: historical,
        learned_multiplier: multiplier,
        combined,
        variance: stats.variance(),
    }
}

/// Order candidates best-first: combined score descending, variance
/// ascending on ties.
pub fn rank(candidates: &mut [ToolCandidate]) {
    candidates.sort_by(|a, b| {
        b.combined
            .partial_cmp(&a.combined)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                a.variance
                    .partial_cmp(&b.variance)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LearningConfig;
    use crate::learning::LearningSignal;
    use crate::tools::ToolCategory;

    fn info(name: &str, description: &str, category: ToolCategory) -> ToolInfo {
        ToolInfo {
            name: name.to_string(),
            description: description.to_string(),
            category,
            healthy: true,
        }
    }

    #[test]
    fn pattern_match_rewards_overlap() {
        let extractor = info(
            "page_extractor",
            "Extract the title, text or links from a web page",
            ToolCategory::Extraction,
        );
        let calculator = info(
            "calculator",
            "Evaluate a numeric expression",
            ToolCategory::Calculation,
        );
        let goal = "Extract the title from https://example.com";
        assert!(pattern_score(goal, &extractor) > pattern_score(goal, &calculator));
    }

    #[test]
    fn calculation_tools_penalized_for_extraction_goals() {
        let config = SelectorConfig::default();
        let performance = ToolPerformance::new();
        let learned = LearnedWeights::new(LearningConfig::default());
        let goal = "Extract the total from https://example.com";

        let extractor = score_candidate(
            &config,
            goal,
            Intent::Extract,
            &info(
                "page_extractor",
                "Extract data from a web page",
                ToolCategory::Extraction,
            ),
            &performance,
            &learned,
        );
        let calculator = score_candidate(
            &config,
            goal,
            Intent::Extract,
            &info(
                "calculator",
                "Evaluate a numeric expression",
                ToolCategory::Calculation,
            ),
            &performance,
            &learned,
        );
        assert!(extractor.combined > calculator.combined);
    }

    #[test]
    fn learned_multiplier_shifts_ranking() {
        let config = SelectorConfig::default();
        let performance = ToolPerformance::new();
        let mut learned = LearnedWeights::new(LearningConfig::default());
        let goal = "Extract the title from https://example.com";
        let tool = info(
            "page_extractor",
            "Extract data from a web page",
            ToolCategory::Extraction,
        );

        let before = score_candidate(&config, goal, Intent::Extract, &tool, &performance, &learned);
        for _ in 0..10 {
            learned.observe(&LearningSignal::from_execution(
                "page_extractor",
                "extract",
                false,
            ));
        }
        let after = score_candidate(&config, goal, Intent::Extract, &tool, &performance, &learned);
        assert!(after.combined < before.combined);
    }

    #[test]
    fn ties_break_toward_lower_variance() {
        let mut candidates = vec![
            ToolCandidate {
                name: "unproven".to_string(),
                pattern_score: 0.5,
                historical_score: 0.5,
                learned_multiplier: 0.0,
                combined: 0.6,
                variance: 0.25,
            },
            ToolCandidate {
                name: "proven".to_string(),
                pattern_score: 0.5,
                historical_score: 0.5,
                learned_multiplier: 0.0,
                combined: 0.6,
                variance: 0.05,
            },
        ];
        rank(&mut candidates);
        assert_eq!(candidates[0].name, "proven");
    }
}
