//! Code synthesizer: turns a task plus its breakdown into a code artifact.
//!
//! One LLM call per invocation. The attachment manifest contributes names
//! and staged paths to the prompt so the generated code can open its inputs;
//! attachment bytes are never read here. The response text is used verbatim
//! as code, with no syntactic validation: broken output is expected to fail
//! at execution time and be handled by the repair loop.

use std::sync::Arc;

use tracing::info;

use crate::error::{LlmError, PipelineError};
use crate::llm::{GenerationRequest, LlmProvider};
use crate::prompts::build_synthesis_prompt;

use super::types::{AttachmentManifest, Breakdown, CodeArtifact, TaskRequest};

/// Synthesizes code artifacts from task breakdowns.
pub struct CodeSynthesizer {
    llm: Arc<dyn LlmProvider>,
    model: String,
    temperature: f64,
    max_output_tokens: u32,
}

impl std::fmt::Debug for CodeSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeSynthesizer")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl CodeSynthesizer {
    /// Creates a new synthesizer.
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        temperature: f64,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            temperature,
            max_output_tokens,
        }
    }

    /// Generates a code artifact for the task.
    ///
    /// Propagates `LlmError` from the adapter; no retries at this layer.
    pub async fn synthesize(
        &self,
        task: &TaskRequest,
        breakdown: &Breakdown,
        attachments: &AttachmentManifest,
    ) -> Result<CodeArtifact, PipelineError> {
        let prompt = build_synthesis_prompt(&task.text, &breakdown.text, attachments);

        let request = GenerationRequest::new(self.model.clone(), vec![prompt])
            .with_temperature(self.temperature)
            .with_max_output_tokens(self.max_output_tokens);

        let response = self.llm.generate(request).await?;
        let source = response
            .first_text()
            .ok_or_else(|| LlmError::ParseError("No content in LLM response".to_string()))?;

        let artifact = CodeArtifact::new(source);
        info!(
            request_id = %task.id,
            lines = artifact.line_count(),
            attachments = attachments.len(),
            "Code synthesized"
        );

        Ok(artifact)
    }
}
