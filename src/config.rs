//! Configuration for the orchestration engine.
//!
//! All thresholds, weights and timeouts live here; nothing is hard-coded at
//! the call sites. Configuration can be set via environment variables:
//! - `APPROVAL_HIGH_THRESHOLD` - Optional. Confidence at or above which missions auto-execute. Defaults to `0.85`.
//! - `APPROVAL_MEDIUM_THRESHOLD` - Optional. Confidence at or above which missions request approval. Defaults to `0.55`.
//! - `APPROVAL_TIMEOUT_SECS` - Optional. Wall-clock window for pending approvals. Defaults to `300`.
//! - `EXECUTION_TIMEOUT_SECS` - Optional. Per-attempt bound for tool execution. Defaults to `60`.
//! - `MAX_TOOL_ATTEMPTS` - Optional. Retry budget for transient tool failures. Defaults to `3`.
//! - `RETRY_BASE_DELAY_MS` - Optional. Base backoff delay, doubled per attempt. Defaults to `500`.
//! - `LEARNING_SMOOTHING` - Optional. Weight given to a new observation. Defaults to `0.3`.
//! - `LEARNING_CLAMP` - Optional. Bound on the learned multiplier. Defaults to `0.15`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Thresholds out of order: medium {medium} must be below high {high}")]
    ThresholdOrder { medium: f64, high: f64 },
}

/// Confidence thresholds for approval routing.
///
/// The source material recalibrated these more than once; they are tunable
/// constants, not a canonical pair.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// At or above: auto-execute without human approval.
    pub high: f64,
    /// At or above (but below high): request approval and suspend.
    pub medium: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: 0.85,
            medium: 0.55,
        }
    }
}

impl Thresholds {
    /// Validate ordering and range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.high) {
            return Err(ConfigError::InvalidValue(
                "APPROVAL_HIGH_THRESHOLD".to_string(),
                format!("{} not in [0,1]", self.high),
            ));
        }
        if !(0.0..=1.0).contains(&self.medium) {
            return Err(ConfigError::InvalidValue(
                "APPROVAL_MEDIUM_THRESHOLD".to_string(),
                format!("{} not in [0,1]", self.medium),
            ));
        }
        if self.medium >= self.high {
            return Err(ConfigError::ThresholdOrder {
                medium: self.medium,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// Weights for the four confidence factors. Must sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceWeights {
    /// Goal-understanding clarity signals.
    pub clarity: f64,
    /// Required tools registered and healthy.
    pub tool_availability: f64,
    /// Session history available.
    pub context: f64,
    /// Deterministic/idempotent tools score higher.
    pub reliability: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            clarity: 0.3,
            tool_availability: 0.3,
            context: 0.2,
            reliability: 0.2,
        }
    }
}

/// Tool selection scoring parameters.
#[derive(Debug, Clone, Copy)]
pub struct SelectorConfig {
    /// Weight of the goal-text pattern match.
    pub pattern_weight: f64,
    /// Weight of the historical success rate.
    pub history_weight: f64,
    /// Fixed boost for tools in a category the intent favors.
    pub intent_boost: f64,
    /// Penalty for tools in a category the intent rules out.
    pub mismatch_penalty: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            pattern_weight: 0.8,
            history_weight: 0.2,
            intent_boost: 0.2,
            mismatch_penalty: 0.5,
        }
    }
}

/// Learning-loop parameters.
#[derive(Debug, Clone, Copy)]
pub struct LearningConfig {
    /// Exponential smoothing factor: `new = (1 - smoothing) * old + smoothing * observed`.
    pub smoothing: f64,
    /// Learned multipliers are clamped to `[-clamp, +clamp]`.
    pub clamp: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.3,
            clamp: 0.15,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub thresholds: Thresholds,
    pub weights: ConfidenceWeights,
    pub selector: SelectorConfig,
    pub learning: LearningConfig,

    /// Wall-clock window for a pending approval before it becomes
    /// `approval_timeout`.
    pub approval_timeout: Duration,

    /// Per-attempt bound on tool execution. Shorter than the approval window.
    pub execution_timeout: Duration,

    /// Retry budget for transient tool failures.
    pub max_tool_attempts: u32,

    /// Base backoff delay between attempts, doubled each retry.
    pub retry_base_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            weights: ConfidenceWeights::default(),
            selector: SelectorConfig::default(),
            learning: LearningConfig::default(),
            approval_timeout: Duration::from_secs(300),
            execution_timeout: Duration::from_secs(60),
            max_tool_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for unparseable values and
    /// `ConfigError::ThresholdOrder` if the thresholds are inverted.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = read_env_f64("APPROVAL_HIGH_THRESHOLD")? {
            config.thresholds.high = v;
        }
        if let Some(v) = read_env_f64("APPROVAL_MEDIUM_THRESHOLD")? {
            config.thresholds.medium = v;
        }
        config.thresholds.validate()?;

        if let Some(v) = read_env_u64("APPROVAL_TIMEOUT_SECS")? {
            config.approval_timeout = Duration::from_secs(v);
        }
        if let Some(v) = read_env_u64("EXECUTION_TIMEOUT_SECS")? {
            config.execution_timeout = Duration::from_secs(v);
        }
        if let Some(v) = read_env_u64("MAX_TOOL_ATTEMPTS")? {
            config.max_tool_attempts = v.max(1) as u32;
        }
        if let Some(v) = read_env_u64("RETRY_BASE_DELAY_MS")? {
            config.retry_base_delay = Duration::from_millis(v);
        }
        if let Some(v) = read_env_f64("LEARNING_SMOOTHING")? {
            config.learning.smoothing = v.clamp(0.0, 1.0);
        }
        if let Some(v) = read_env_f64("LEARNING_CLAMP")? {
            config.learning.clamp = v.abs();
        }

        Ok(config)
    }
}

fn read_env_f64(name: &str) -> Result<Option<f64>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(None),
    }
}

fn read_env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(None),
    }
}
