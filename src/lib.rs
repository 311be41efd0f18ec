//! taskforge: solve natural-language tasks by generating and executing code.
//!
//! The core is a generate-execute-repair pipeline: a task is decomposed into
//! a step plan, code is synthesized for the plan, the code runs as an
//! isolated child process, and failures are fed back to the LLM for a
//! bounded number of repair cycles.

// Core modules
pub mod cli;
pub mod error;
pub mod executor;
pub mod llm;
pub mod pipeline;
pub mod prompts;

// Re-export commonly used error types
pub use error::{ExecutorError, LlmError, PipelineError, TemplateError};
