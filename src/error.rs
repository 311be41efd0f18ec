//! Error types for taskforge operations.
//!
//! One enum per subsystem:
//! - LLM API interactions
//! - Prompt template loading
//! - Script execution
//! - Pipeline orchestration (the fatal boundary for a request)
//!
//! A non-zero exit from generated code is deliberately *not* an error here:
//! while repair attempts remain it is carried as an `ExecutionResult`, and
//! after the budget is spent it becomes `PipelineOutcome::Exhausted`.

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: GEMINI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while loading prompt templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while executing a generated script.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Failed to spawn interpreter '{interpreter}': {reason}")]
    SpawnFailed { interpreter: String, reason: String },

    #[error("Execution timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal errors for a whole pipeline request.
///
/// Anything that reaches the caller as `Err` aborts the request with no
/// partial result: an LLM failure during initial or repair generation, a
/// missing instruction template, or a filesystem/spawn/timeout failure in
/// the executor.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("LLM service error: {0}")]
    Llm(#[from] LlmError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True when the failure came from the instruction template store.
    pub fn is_template_missing(&self) -> bool {
        matches!(self, PipelineError::Template(TemplateError::NotFound(_)))
    }

    /// True when the failure was an execution timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            PipelineError::Executor(ExecutorError::Timeout { .. })
        )
    }
}
