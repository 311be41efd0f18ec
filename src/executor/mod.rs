//! Sandboxed execution of generated code.
//!
//! A [`ScriptExecutor`] stages a code artifact into a uniquely named scratch
//! file and runs it as a fresh child process of the configured interpreter,
//! capturing stdout, stderr, and the exit status. The scratch token must be
//! unique per invocation; callers mint a new UUID for every attempt so
//! concurrent requests and successive repair cycles never share a path.
//!
//! Execution is time-bounded: the child is spawned with `kill_on_drop`, so
//! dropping the wait future on timeout force-terminates it. A non-zero exit
//! is not an error at this layer; it comes back inside [`ExecutionResult`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ExecutorError;
use crate::pipeline::types::CodeArtifact;

/// Outcome of one execution attempt.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Exit code of the child process (-1 when terminated by a signal).
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Wall-clock execution duration.
    pub duration: Duration,
}

impl ExecutionResult {
    /// Creates a new execution result.
    pub fn new(exit_code: i32, stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
        }
    }

    /// True when the child exited with status 0.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait for executing a code artifact in isolation.
///
/// The seam where a container-backed executor would slot in; the pipeline
/// only ever talks to this trait.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs the artifact under the given scratch token and captures its output.
    async fn execute(
        &self,
        code: &CodeArtifact,
        scratch_id: Uuid,
    ) -> Result<ExecutionResult, ExecutorError>;
}

/// Executes code artifacts as interpreter child processes.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    /// Interpreter binary to invoke (e.g., "python3").
    interpreter: String,
    /// File extension for scratch scripts.
    extension: String,
    /// Directory where scratch scripts are staged.
    scratch_dir: PathBuf,
    /// Hard limit on a single execution attempt.
    timeout: Duration,
}

impl ScriptExecutor {
    /// Creates an executor for the given interpreter and scratch directory.
    pub fn new(interpreter: impl Into<String>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            extension: "py".to_string(),
            scratch_dir: scratch_dir.into(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Sets the scratch file extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Sets the execution timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the interpreter binary.
    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// Returns the scratch path for a given token.
    pub fn scratch_path(&self, scratch_id: Uuid) -> PathBuf {
        self.scratch_dir
            .join(format!("scratch-{}.{}", scratch_id, self.extension))
    }

    /// Best-effort scratch cleanup; failures are logged and swallowed.
    async fn cleanup(path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            debug!(path = %path.display(), error = %e, "Failed to remove scratch file");
        }
    }
}

#[async_trait]
impl Executor for ScriptExecutor {
    async fn execute(
        &self,
        code: &CodeArtifact,
        scratch_id: Uuid,
    ) -> Result<ExecutionResult, ExecutorError> {
        let start = Instant::now();
        let path = self.scratch_path(scratch_id);

        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        tokio::fs::write(&path, code.source()).await?;

        info!(
            interpreter = %self.interpreter,
            script = %path.display(),
            lines = code.line_count(),
            "Executing generated script"
        );

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&path)
            .current_dir(&self.scratch_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            let err = ExecutorError::SpawnFailed {
                interpreter: self.interpreter.clone(),
                reason: e.to_string(),
            };
            warn!(error = %err, "Spawn failed");
            err
        })?;

        let timeout_result = tokio::time::timeout(self.timeout, child.wait_with_output()).await;

        let duration = start.elapsed();

        match timeout_result {
            Ok(Ok(output)) => {
                Self::cleanup(&path).await;

                let exit_code = output.status.code().unwrap_or(-1);
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();

                debug!(exit_code, ?duration, "Script completed");

                Ok(ExecutionResult::new(exit_code, stdout, stderr, duration))
            }
            Ok(Err(e)) => {
                Self::cleanup(&path).await;
                Err(ExecutorError::Io(e))
            }
            Err(_) => {
                // Dropping the wait future killed the child via kill_on_drop.
                Self::cleanup(&path).await;
                warn!(?duration, script = %path.display(), "Script timed out");
                Err(ExecutorError::Timeout {
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}
