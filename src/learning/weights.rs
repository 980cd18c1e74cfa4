//! Learned multipliers, derived from the signal log by a pure fold.
//!
//! There is no shared mutable singleton holding tool confidence: the signal
//! log is the source of truth, and this table can always be re-derived from
//! it with `replay`. Updates use exponential smoothing
//! (`new = 0.7*old + 0.3*observed` by default) and are clamped to the
//! configured range.

use std::collections::HashMap;

use crate::config::LearningConfig;
use crate::learning::signal::LearningSignal;

/// Per-(tool, task-type) learned selection multiplier.
#[derive(Debug, Clone)]
pub struct LearnedWeights {
    weights: HashMap<(String, String), f64>,
    config: LearningConfig,
}

impl LearnedWeights {
    pub fn new(config: LearningConfig) -> Self {
        Self {
            weights: HashMap::new(),
            config,
        }
    }

    /// Fold one signal into the table.
    pub fn observe(&mut self, signal: &LearningSignal) {
        let key = (signal.tool.clone(), signal.task_type.clone());
        let old = self.weights.get(&key).copied().unwrap_or(0.0);
        let observed = signal.outcome.observed_delta();
        let smoothing = self.config.smoothing;
        let updated = ((1.0 - smoothing) * old + smoothing * observed)
            .clamp(-self.config.clamp, self.config.clamp);
        tracing::debug!(
            tool = %signal.tool,
            task_type = %signal.task_type,
            old,
            updated,
            "Learned multiplier updated"
        );
        self.weights.insert(key, updated);
    }

    /// Rebuild the whole table from a signal history.
    pub fn replay<'a>(
        config: LearningConfig,
        signals: impl IntoIterator<Item = &'a LearningSignal>,
    ) -> Self {
        let mut weights = Self::new(config);
        for signal in signals {
            weights.observe(signal);
        }
        weights
    }

    /// Current multiplier for a (tool, task-type) pair; 0.0 when unobserved.
    pub fn multiplier(&self, tool: &str, task_type: &str) -> f64 {
        self.weights
            .get(&(tool.to_string(), task_type.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(tool: &str) -> LearningSignal {
        LearningSignal::from_execution(tool, "extract", true)
    }

    fn failure(tool: &str) -> LearningSignal {
        LearningSignal::from_execution(tool, "extract", false)
    }

    #[test]
    fn smoothing_converges_toward_observation() {
        let mut weights = LearnedWeights::new(LearningConfig::default());
        weights.observe(&success("scraper"));
        let first = weights.multiplier("scraper", "extract");
        assert!((first - 0.03).abs() < 1e-9);

        for _ in 0..50 {
            weights.observe(&success("scraper"));
        }
        let converged = weights.multiplier("scraper", "extract");
        assert!(converged > first);
        assert!(converged <= 0.1 + 1e-9);
    }

    #[test]
    fn multiplier_stays_clamped() {
        let config = LearningConfig {
            smoothing: 1.0,
            clamp: 0.05,
        };
        let mut weights = LearnedWeights::new(config);
        weights.observe(&LearningSignal::from_rating("scraper", "extract", 5));
        assert!((weights.multiplier("scraper", "extract") - 0.05).abs() < 1e-9);
        weights.observe(&LearningSignal::from_rating("scraper", "extract", 1));
        assert!((weights.multiplier("scraper", "extract") - (-0.05)).abs() < 1e-9);
    }

    #[test]
    fn keyed_by_tool_and_task_type() {
        let mut weights = LearnedWeights::new(LearningConfig::default());
        weights.observe(&success("scraper"));
        assert!(weights.multiplier("scraper", "extract") > 0.0);
        assert_eq!(weights.multiplier("scraper", "navigate"), 0.0);
        assert_eq!(weights.multiplier("browser", "extract"), 0.0);
    }

    #[test]
    fn replay_rebuilds_identical_table() {
        let signals = vec![
            success("scraper"),
            failure("scraper"),
            success("scraper"),
            LearningSignal::from_rating("browser", "navigate", 4),
        ];
        let mut incremental = LearnedWeights::new(LearningConfig::default());
        for s in &signals {
            incremental.observe(s);
        }
        let replayed = LearnedWeights::replay(LearningConfig::default(), signals.iter());
        assert_eq!(
            incremental.multiplier("scraper", "extract"),
            replayed.multiplier("scraper", "extract")
        );
        assert_eq!(
            incremental.multiplier("browser", "navigate"),
            replayed.multiplier("browser", "navigate")
        );
    }
}
