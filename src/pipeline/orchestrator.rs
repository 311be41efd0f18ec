//! Pipeline orchestrator: the core interface exposed to the outer layer.
//!
//! One call to [`Pipeline::run`] drives a request end to end, strictly
//! sequentially: decompose once, synthesize once, then hand the initial
//! artifact to the repair loop. The caller (an HTTP handler, the CLI) owns
//! upload parsing and response shaping; this type only consumes task text
//! plus an attachment manifest and produces a [`PipelineOutcome`].

use std::sync::Arc;

use tracing::info;

use crate::error::PipelineError;
use crate::executor::Executor;
use crate::llm::LlmProvider;
use crate::prompts::TemplateStore;

use super::config::PipelineConfig;
use super::decomposer::TaskDecomposer;
use super::repair::RepairLoop;
use super::synthesizer::CodeSynthesizer;
use super::types::{AttachmentManifest, PipelineOutcome, TaskRequest};

/// The generate-execute-repair pipeline.
pub struct Pipeline {
    decomposer: TaskDecomposer,
    synthesizer: CodeSynthesizer,
    repair: RepairLoop,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("decomposer", &self.decomposer)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Wires a pipeline from a provider, an executor, and configuration.
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        executor: Arc<dyn Executor>,
        config: PipelineConfig,
    ) -> Self {
        let decomposer = TaskDecomposer::new(
            llm.clone(),
            TemplateStore::new(&config.template_dir),
            &config.breakdown_dir,
            config.model.clone(),
        );
        let synthesizer = CodeSynthesizer::new(
            llm.clone(),
            config.model.clone(),
            config.temperature,
            config.max_output_tokens,
        );
        let repair = RepairLoop::new(
            llm,
            executor,
            config.model.clone(),
            config.temperature,
            config.max_output_tokens,
            config.repair_budget,
        );

        Self {
            decomposer,
            synthesizer,
            repair,
        }
    }

    /// Runs one request through the pipeline.
    ///
    /// # Errors
    ///
    /// Any `Err` is fatal for the request: a missing instruction template,
    /// an LLM service failure (initial or mid-repair), or an executor fault
    /// including timeout. Retry exhaustion is *not* an error; it comes back
    /// as `PipelineOutcome::Exhausted`.
    pub async fn run(
        &self,
        task: TaskRequest,
        attachments: AttachmentManifest,
    ) -> Result<PipelineOutcome, PipelineError> {
        info!(
            request_id = %task.id,
            task_chars = task.text.len(),
            attachments = attachments.len(),
            "Pipeline started"
        );

        let breakdown = self.decomposer.decompose(&task).await?;
        let initial = self
            .synthesizer
            .synthesize(&task, &breakdown, &attachments)
            .await?;
        let outcome = self.repair.run(&task, initial).await?;

        info!(
            request_id = %task.id,
            solved = outcome.is_solved(),
            attempts = outcome.attempts(),
            "Pipeline finished"
        );

        Ok(outcome)
    }
}
