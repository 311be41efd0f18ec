//! CLI argument parsing and command execution.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::warn;

use crate::executor::ScriptExecutor;
use crate::llm::GeminiClient;
use crate::pipeline::{AttachmentManifest, Pipeline, PipelineConfig, TaskRequest};

/// Solve a natural-language task by generating and executing code.
#[derive(Debug, Parser)]
#[command(name = "taskforge", version, about)]
pub struct Cli {
    /// File containing the task text (e.g., questions.txt).
    #[arg(long, conflicts_with = "task")]
    pub task_file: Option<PathBuf>,

    /// Task text given inline.
    #[arg(long)]
    pub task: Option<String>,

    /// Attachment file made available to the generated code; repeatable.
    /// Each attachment is exposed under its file name.
    #[arg(long = "attach")]
    pub attachments: Vec<PathBuf>,

    /// Model identifier override.
    #[arg(long, env = "TASKFORGE_MODEL")]
    pub model: Option<String>,

    /// Execution timeout per attempt, in seconds.
    #[arg(long)]
    pub exec_timeout_secs: Option<u64>,

    /// Number of repair cycles after the initial attempt.
    #[arg(long)]
    pub repair_budget: Option<u32>,

    /// Log level when RUST_LOG is not set (e.g., "info", "debug").
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Parses CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the pipeline with parsed CLI arguments.
pub async fn run_with_cli(cli: Cli) -> Result<()> {
    let task_text = match (&cli.task, &cli.task_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read task file {}", path.display()))?,
        (None, None) => bail!("Provide a task with --task or --task-file"),
    };

    let mut manifest = AttachmentManifest::new();
    for path in &cli.attachments {
        if !path.exists() {
            bail!("Attachment not found: {}", path.display());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Attachment has no file name: {}", path.display()))?;
        manifest.insert(name, path.clone());
    }

    let mut config = PipelineConfig::from_env()?;
    if let Some(ref model) = cli.model {
        config.model = model.clone();
    }
    if let Some(secs) = cli.exec_timeout_secs {
        config.exec_timeout = Duration::from_secs(secs);
    }
    if let Some(budget) = cli.repair_budget {
        config.repair_budget = budget;
    }
    config.validate()?;

    let llm = Arc::new(GeminiClient::from_env()?);
    let executor = Arc::new(
        ScriptExecutor::new(&config.interpreter, &config.scratch_dir)
            .with_extension(&config.script_extension)
            .with_timeout(config.exec_timeout),
    );
    let pipeline = Pipeline::new(llm, executor, config);

    let outcome = pipeline
        .run(TaskRequest::new(task_text), manifest)
        .await
        .context("Pipeline failed")?;

    if !outcome.is_solved() {
        warn!(
            attempts = outcome.attempts(),
            "Retries exhausted; printing the final attempt's stderr"
        );
    }

    print!("{}", outcome.answer_text());
    Ok(())
}
