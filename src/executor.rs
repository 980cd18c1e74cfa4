//! Execution driver.
//!
//! The only part of the pipeline allowed to block on external I/O. Invokes
//! the selected tool for an approved mission, retries transient failures
//! with exponential backoff up to a fixed bound, and applies a per-attempt
//! wall-clock timeout so a hung tool resolves to failure instead of hanging
//! the mission.

use std::time::{Duration, Instant};

use chrono::Utc;

use crate::config::Config;
use crate::mission::ExecutionRecord;
use crate::tools::{ToolInput, ToolRegistry};

#[derive(Debug, Clone)]
pub struct ExecutionDriver {
    max_attempts: u32,
    base_delay: Duration,
    attempt_timeout: Duration,
}

impl ExecutionDriver {
    pub fn new(config: &Config) -> Self {
        Self {
            max_attempts: config.max_tool_attempts.max(1),
            base_delay: config.retry_base_delay,
            attempt_timeout: config.execution_timeout,
        }
    }

    /// Run a tool to completion or exhaustion, capturing the record either way.
    pub async fn run(
        &self,
        registry: &ToolRegistry,
        tool: &str,
        input: &ToolInput,
    ) -> ExecutionRecord {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut last_error: Option<String> = None;

        for attempt in 1..=self.max_attempts {
            match tokio::time::timeout(self.attempt_timeout, registry.execute(tool, input)).await {
                Ok(Ok(output)) if output.success => {
                    tracing::info!(tool, attempt, "Tool execution succeeded");
                    return ExecutionRecord {
                        tool: tool.to_string(),
                        input: input.clone(),
                        output: Some(output.content),
                        success: true,
                        attempts: attempt,
                        started_at,
                        duration_ms: clock.elapsed().as_millis() as u64,
                        error: None,
                    };
                }
                Ok(Ok(output)) => {
                    tracing::warn!(tool, attempt, "Tool reported failure");
                    last_error = Some(output.content);
                }
                Ok(Err(e)) => {
                    tracing::warn!(tool, attempt, error = %e, "Tool invocation error");
                    last_error = Some(e.to_string());
                }
                Err(_) => {
                    tracing::warn!(
                        tool,
                        attempt,
                        timeout_secs = self.attempt_timeout.as_secs(),
                        "Tool attempt timed out"
                    );
                    last_error = Some(format!(
                        "timed out after {}s",
                        self.attempt_timeout.as_secs()
                    ));
                }
            }

            if attempt < self.max_attempts {
                let delay = self.base_delay * 2u32.saturating_pow(attempt - 1);
                tokio::time::sleep(delay).await;
            }
        }

        ExecutionRecord {
            tool: tool.to_string(),
            input: input.clone(),
            output: None,
            success: false,
            attempts: self.max_attempts,
            started_at,
            duration_ms: clock.elapsed().as_millis() as u64,
            error: last_error,
        }
    }
}
