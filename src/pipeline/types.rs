//! Data model for the taskforge pipeline.
//!
//! One `TaskRequest` flows through the stages: decomposition produces a
//! `Breakdown`, synthesis a `CodeArtifact`, and the repair loop ends in a
//! `PipelineOutcome`. The request id namespaces every persisted artifact so
//! concurrent requests never share a path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A task to solve, as received from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Unique identifier for this request.
    pub id: Uuid,
    /// Raw natural-language task text. Immutable once received.
    pub text: String,
    /// Timestamp when the request was created.
    pub received_at: DateTime<Utc>,
}

impl TaskRequest {
    /// Creates a new request with a fresh id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// Mapping from attachment file names to their staged locations on disk.
///
/// Built by the caller; read-only to the pipeline. Only names and paths are
/// exposed to the synthesizer (through the prompt), never file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentManifest {
    entries: BTreeMap<String, PathBuf>,
}

impl AttachmentManifest {
    /// Creates an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an attachment under its file name.
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(name.into(), path.into());
    }

    /// Looks up an attachment path by name.
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    /// Iterates over (name, path) pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    /// Returns the attachment names in order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Returns the number of attachments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no attachments were provided.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Step-by-step breakdown of a task, produced once per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breakdown {
    /// The breakdown text as returned by the LLM.
    pub text: String,
    /// Where the breakdown was persisted for audit, if persistence succeeded.
    pub persisted_to: Option<PathBuf>,
}

impl Breakdown {
    /// Creates a breakdown that has not been persisted yet.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            persisted_to: None,
        }
    }
}

/// A generated source-code artifact.
///
/// Exactly one artifact is current at any time within a request; each repair
/// cycle replaces it wholesale. The text is the LLM's raw output with no
/// syntactic validation; broken code surfaces as a non-zero exit status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeArtifact {
    source: String,
}

impl CodeArtifact {
    /// Wraps raw LLM output as a code artifact.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Returns the source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the line count, for logging.
    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }
}

/// Terminal result of a pipeline run.
///
/// `Exhausted` deliberately still yields its text from [`answer_text`]:
/// the original behavior returned the last attempt's stderr as if it were a
/// valid answer, and callers depend on getting *some* text either way. The
/// variant tag is how a caller can tell the cases apart if it wants to.
///
/// [`answer_text`]: PipelineOutcome::answer_text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineOutcome {
    /// An execution attempt exited 0; carries that attempt's stdout.
    Solved {
        stdout: String,
        /// Total execution attempts made (1..=3).
        attempts: u32,
    },
    /// Every attempt failed and the repair budget is spent; carries the
    /// final attempt's stderr.
    Exhausted {
        stderr: String,
        attempts: u32,
    },
}

impl PipelineOutcome {
    /// The text a caller treats as the answer, regardless of variant.
    pub fn answer_text(&self) -> &str {
        match self {
            PipelineOutcome::Solved { stdout, .. } => stdout,
            PipelineOutcome::Exhausted { stderr, .. } => stderr,
        }
    }

    /// True when an execution attempt succeeded.
    pub fn is_solved(&self) -> bool {
        matches!(self, PipelineOutcome::Solved { .. })
    }

    /// Number of execution attempts made.
    pub fn attempts(&self) -> u32 {
        match self {
            PipelineOutcome::Solved { attempts, .. }
            | PipelineOutcome::Exhausted { attempts, .. } => *attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_request_ids_are_unique() {
        let a = TaskRequest::new("task a");
        let b = TaskRequest::new("task a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_manifest_ordering_and_lookup() {
        let mut manifest = AttachmentManifest::new();
        manifest.insert("b.csv", "/tmp/b.csv");
        manifest.insert("a.txt", "/tmp/a.txt");

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.names(), vec!["a.txt", "b.csv"]);
        assert_eq!(manifest.get("b.csv"), Some(Path::new("/tmp/b.csv")));
        assert_eq!(manifest.get("missing"), None);
    }

    #[test]
    fn test_code_artifact() {
        let artifact = CodeArtifact::new("print(1)\nprint(2)\n");
        assert_eq!(artifact.line_count(), 2);
        assert!(artifact.source().starts_with("print(1)"));
    }

    #[test]
    fn test_outcome_answer_text() {
        let solved = PipelineOutcome::Solved {
            stdout: "42\n".to_string(),
            attempts: 1,
        };
        assert!(solved.is_solved());
        assert_eq!(solved.answer_text(), "42\n");
        assert_eq!(solved.attempts(), 1);

        let exhausted = PipelineOutcome::Exhausted {
            stderr: "SyntaxError".to_string(),
            attempts: 3,
        };
        assert!(!exhausted.is_solved());
        assert_eq!(exhausted.answer_text(), "SyntaxError");
        assert_eq!(exhausted.attempts(), 3);
    }
}
