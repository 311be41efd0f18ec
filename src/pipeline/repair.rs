//! Retry-repair loop: executes the current code artifact and repairs it on
//! failure until it succeeds or the budget is spent.
//!
//! States: Init -> Executing -> {Solved, Repairing} -> Executing -> ... ->
//! {Solved, Exhausted}. A non-zero exit while repairs remain feeds the
//! failing code and its stderr back to the LLM for a replacement artifact;
//! repair calls are issued immediately, with no backoff. An LLM failure
//! during repair is fatal to the whole request. Every execution attempt
//! stages under a fresh scratch token, including re-executions within one
//! request.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{LlmError, PipelineError};
use crate::executor::Executor;
use crate::llm::{GenerationRequest, LlmProvider};
use crate::prompts::build_repair_prompt;

use super::types::{CodeArtifact, PipelineOutcome, TaskRequest};

/// Drives execute/repair cycles for one request.
pub struct RepairLoop {
    llm: Arc<dyn LlmProvider>,
    executor: Arc<dyn Executor>,
    model: String,
    temperature: f64,
    max_output_tokens: u32,
    repair_budget: u32,
}

impl std::fmt::Debug for RepairLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepairLoop")
            .field("model", &self.model)
            .field("repair_budget", &self.repair_budget)
            .finish_non_exhaustive()
    }
}

impl RepairLoop {
    /// Creates a new repair loop.
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        executor: Arc<dyn Executor>,
        model: impl Into<String>,
        temperature: f64,
        max_output_tokens: u32,
        repair_budget: u32,
    ) -> Self {
        Self {
            llm,
            executor,
            model: model.into(),
            temperature,
            max_output_tokens,
            repair_budget,
        }
    }

    /// Runs the loop starting from an initial artifact.
    ///
    /// Returns `Solved` with the successful attempt's stdout, or `Exhausted`
    /// with the final attempt's stderr once the budget is spent. Executor
    /// faults (spawn, IO, timeout) and LLM faults during repair are fatal.
    pub async fn run(
        &self,
        task: &TaskRequest,
        initial: CodeArtifact,
    ) -> Result<PipelineOutcome, PipelineError> {
        let mut artifact = initial;
        let mut retries_left = self.repair_budget;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let result = self.executor.execute(&artifact, Uuid::new_v4()).await?;

            if result.is_success() {
                info!(request_id = %task.id, attempts, "Task solved");
                return Ok(PipelineOutcome::Solved {
                    stdout: result.stdout,
                    attempts,
                });
            }

            if retries_left == 0 {
                warn!(
                    request_id = %task.id,
                    attempts,
                    exit_code = result.exit_code,
                    "Repair budget exhausted"
                );
                return Ok(PipelineOutcome::Exhausted {
                    stderr: result.stderr,
                    attempts,
                });
            }

            warn!(
                request_id = %task.id,
                attempt = attempts,
                exit_code = result.exit_code,
                retries_left,
                "Execution failed, requesting repaired code"
            );

            artifact = self.repair(&artifact, &result.stderr).await?;
            retries_left -= 1;
        }
    }

    /// Requests a corrected artifact for failing code.
    async fn repair(
        &self,
        failing: &CodeArtifact,
        stderr: &str,
    ) -> Result<CodeArtifact, PipelineError> {
        let prompt = build_repair_prompt(failing.source(), stderr);

        let request = GenerationRequest::new(self.model.clone(), vec![prompt])
            .with_temperature(self.temperature)
            .with_max_output_tokens(self.max_output_tokens);

        let response = self.llm.generate(request).await?;
        let source = response
            .first_text()
            .ok_or_else(|| LlmError::ParseError("No content in LLM response".to_string()))?;

        Ok(CodeArtifact::new(source))
    }
}
