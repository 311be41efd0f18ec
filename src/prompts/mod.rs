//! Prompts and prompt templates for the taskforge pipeline.
//!
//! Two kinds of prompt material live here:
//!
//! - The task breakdown *instruction template*, loaded at runtime from the
//!   template store by logical name so operators can tune it without a
//!   rebuild. A missing template aborts the request before any LLM call.
//! - The synthesis and repair prompts, embedded as `const` templates and
//!   instantiated with `.replace`.

use std::path::{Path, PathBuf};

use crate::error::TemplateError;
use crate::pipeline::types::AttachmentManifest;

/// Logical name of the breakdown instruction template.
pub const TASK_BREAKDOWN_TEMPLATE: &str = "task_breakdown_instructions";

/// Default directory for template resources.
pub const DEFAULT_TEMPLATE_DIR: &str = "prompts";

/// Loads instruction templates from a directory by logical name.
///
/// A logical name `foo` resolves to `<root>/foo.txt`.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    /// Creates a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads a template by logical name.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::NotFound` if no file exists for the name, or
    /// `TemplateError::Io` if the file exists but cannot be read.
    pub fn load(&self, name: &str) -> Result<String, TemplateError> {
        let path = self.root.join(format!("{}.txt", name));
        if !path.exists() {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        Ok(std::fs::read_to_string(&path)?)
    }
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_DIR)
    }
}

/// User prompt template for code synthesis.
///
/// The raw response is handed to the executor as-is, so the prompt insists
/// on bare source text. Attachment paths are part of the prompt because the
/// generated code has no other channel to learn where its inputs live.
const SYNTHESIS_USER_TEMPLATE: &str = r#"You are writing a standalone script to solve a task.

{attachments}Given this step-by-step breakdown of the task:
{breakdown}

Generate code to solve the task:
{task}

Output ONLY the source code of a single runnable script. Do not wrap it in
markdown fences and do not add any commentary before or after the code.
Print the final answer to standard output."#;

/// User prompt template for repairing failing code.
const REPAIR_USER_TEMPLATE: &str = r#"The following code:
{code}

Produced this error when executed:
{stderr}

Please correct the code. Output ONLY the full corrected source code of the
script, with no markdown fences and no commentary."#;

/// Builds the synthesis prompt from the task text, its breakdown, and the
/// attachment manifest.
pub fn build_synthesis_prompt(task: &str, breakdown: &str, attachments: &AttachmentManifest) -> String {
    let attachments_block = if attachments.is_empty() {
        String::new()
    } else {
        let listing = attachments
            .iter()
            .map(|(name, path)| format!("- {} (at path: {})", name, path.display()))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Input files available to your script:\n{}\n\n", listing)
    };

    SYNTHESIS_USER_TEMPLATE
        .replace("{attachments}", &attachments_block)
        .replace("{breakdown}", breakdown)
        .replace("{task}", task)
}

/// Builds the repair prompt from the failing code and its captured stderr.
pub fn build_repair_prompt(code: &str, stderr: &str) -> String {
    REPAIR_USER_TEMPLATE
        .replace("{code}", code)
        .replace("{stderr}", stderr)
}
