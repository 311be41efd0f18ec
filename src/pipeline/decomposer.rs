//! Task decomposer: turns raw task text into a step-by-step breakdown.
//!
//! Makes exactly one LLM call per request, combining the task text with the
//! fixed instruction template from the template store. The resulting
//! breakdown is persisted under the request id for audit; the persisted copy
//! is a side product, the in-memory text is what the synthesizer consumes.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::PipelineError;
use crate::llm::{GenerationRequest, LlmProvider};
use crate::prompts::{TemplateStore, TASK_BREAKDOWN_TEMPLATE};

use super::types::{Breakdown, TaskRequest};

/// Decomposes tasks into programmable step plans.
pub struct TaskDecomposer {
    llm: Arc<dyn LlmProvider>,
    templates: TemplateStore,
    breakdown_dir: PathBuf,
    model: String,
}

impl std::fmt::Debug for TaskDecomposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDecomposer")
            .field("breakdown_dir", &self.breakdown_dir)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl TaskDecomposer {
    /// Creates a new decomposer.
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        templates: TemplateStore,
        breakdown_dir: impl Into<PathBuf>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            templates,
            breakdown_dir: breakdown_dir.into(),
            model: model.into(),
        }
    }

    /// Where the breakdown for a request is persisted.
    pub fn breakdown_path(&self, task: &TaskRequest) -> PathBuf {
        self.breakdown_dir
            .join(format!("breakdown-{}.txt", task.id))
    }

    /// Decomposes a task into a breakdown.
    ///
    /// Fails with `TemplateError::NotFound` (before any LLM traffic) when
    /// the instruction template is missing, and propagates `LlmError` from
    /// the adapter. No retries at this layer.
    pub async fn decompose(&self, task: &TaskRequest) -> Result<Breakdown, PipelineError> {
        let template = self.templates.load(TASK_BREAKDOWN_TEMPLATE)?;

        // Task first, instruction template second; the template refers back
        // to "the task above".
        let request = GenerationRequest::new(
            self.model.clone(),
            vec![task.text.clone(), template],
        );

        let response = self.llm.generate(request).await?;
        let text = response
            .first_text()
            .ok_or_else(|| {
                crate::error::LlmError::ParseError("No content in LLM response".to_string())
            })?
            .to_string();

        info!(request_id = %task.id, chars = text.len(), "Task decomposed");

        let mut breakdown = Breakdown::new(text);
        breakdown.persisted_to = Some(self.persist(task, &breakdown).await?);

        Ok(breakdown)
    }

    /// Persists the breakdown for audit, namespaced by request id.
    async fn persist(
        &self,
        task: &TaskRequest,
        breakdown: &Breakdown,
    ) -> Result<PathBuf, PipelineError> {
        tokio::fs::create_dir_all(&self.breakdown_dir).await?;
        let path = self.breakdown_path(task);
        tokio::fs::write(&path, &breakdown.text).await?;
        debug!(path = %path.display(), "Breakdown persisted");
        Ok(path)
    }
}
