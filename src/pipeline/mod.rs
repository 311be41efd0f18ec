//! The taskforge pipeline: decompose a task, synthesize code for it,
//! execute it, and repair failures under a fixed budget.
//!
//! # Architecture
//!
//! ```text
//! task text + attachments
//!     → TaskDecomposer   (1 LLM call, breakdown persisted per request)
//!     → CodeSynthesizer  (1 LLM call, raw text becomes the artifact)
//!     → RepairLoop       (execute; on failure, repair and re-execute,
//!                         at most 2 repairs / 3 executions)
//!     → PipelineOutcome  (Solved stdout | Exhausted stderr)
//! ```
//!
//! Stages within one request run strictly sequentially. Requests are
//! independent: every persisted or staged path carries a request- or
//! attempt-scoped identifier, so concurrent requests never collide.

pub mod config;
pub mod decomposer;
pub mod orchestrator;
pub mod repair;
pub mod synthesizer;
pub mod types;

pub use config::{ConfigError, PipelineConfig};
pub use decomposer::TaskDecomposer;
pub use orchestrator::Pipeline;
pub use repair::RepairLoop;
pub use synthesizer::CodeSynthesizer;
pub use types::{AttachmentManifest, Breakdown, CodeArtifact, PipelineOutcome, TaskRequest};
