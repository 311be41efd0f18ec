//! Pipeline configuration.
//!
//! Covers the knobs for the generate-execute-repair flow: model and sampling
//! settings, the repair budget, execution limits, and the directories used
//! for templates, breakdown audit files, and scratch scripts.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // LLM settings
    /// Model to use for decomposition, synthesis, and repair calls.
    pub model: String,
    /// Temperature for code generation calls.
    pub temperature: f64,
    /// Maximum tokens per LLM response.
    pub max_output_tokens: u32,

    // Retry settings
    /// Number of repair cycles after the initial attempt.
    pub repair_budget: u32,

    // Execution settings
    /// Interpreter used to run generated scripts.
    pub interpreter: String,
    /// Scratch script file extension.
    pub script_extension: String,
    /// Timeout for a single execution attempt.
    pub exec_timeout: Duration,

    // Storage settings
    /// Directory holding instruction templates.
    pub template_dir: PathBuf,
    /// Directory where per-request breakdowns are persisted.
    pub breakdown_dir: PathBuf,
    /// Directory where scratch scripts are staged.
    pub scratch_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            // LLM defaults
            model: String::new(), // client default
            temperature: 0.2,
            max_output_tokens: 8192,

            // Retry defaults: 2 repairs, 3 executions total
            repair_budget: 2,

            // Execution defaults
            interpreter: "python3".to_string(),
            script_extension: "py".to_string(),
            exec_timeout: Duration::from_secs(120),

            // Storage defaults
            template_dir: PathBuf::from("prompts"),
            breakdown_dir: PathBuf::from("./breakdowns"),
            scratch_dir: PathBuf::from("./scratch"),
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TASKFORGE_MODEL`: Model identifier (default: client default)
    /// - `TASKFORGE_TEMPERATURE`: Generation temperature (default: 0.2)
    /// - `TASKFORGE_MAX_OUTPUT_TOKENS`: Max tokens per response (default: 8192)
    /// - `TASKFORGE_REPAIR_BUDGET`: Repair cycles per request (default: 2)
    /// - `TASKFORGE_INTERPRETER`: Script interpreter (default: python3)
    /// - `TASKFORGE_EXEC_TIMEOUT_SECS`: Execution timeout (default: 120)
    /// - `TASKFORGE_TEMPLATE_DIR`: Template directory (default: prompts)
    /// - `TASKFORGE_BREAKDOWN_DIR`: Breakdown audit directory (default: ./breakdowns)
    /// - `TASKFORGE_SCRATCH_DIR`: Scratch directory (default: ./scratch)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a set variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TASKFORGE_MODEL") {
            config.model = val;
        }

        if let Ok(val) = std::env::var("TASKFORGE_TEMPERATURE") {
            config.temperature = parse_env_value(&val, "TASKFORGE_TEMPERATURE")?;
        }

        if let Ok(val) = std::env::var("TASKFORGE_MAX_OUTPUT_TOKENS") {
            config.max_output_tokens = parse_env_value(&val, "TASKFORGE_MAX_OUTPUT_TOKENS")?;
        }

        if let Ok(val) = std::env::var("TASKFORGE_REPAIR_BUDGET") {
            config.repair_budget = parse_env_value(&val, "TASKFORGE_REPAIR_BUDGET")?;
        }

        if let Ok(val) = std::env::var("TASKFORGE_INTERPRETER") {
            config.interpreter = val;
        }

        if let Ok(val) = std::env::var("TASKFORGE_EXEC_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "TASKFORGE_EXEC_TIMEOUT_SECS")?;
            config.exec_timeout = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("TASKFORGE_TEMPLATE_DIR") {
            config.template_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("TASKFORGE_BREAKDOWN_DIR") {
            config.breakdown_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("TASKFORGE_SCRATCH_DIR") {
            config.scratch_dir = PathBuf::from(val);
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the temperature, clamped to the valid range.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Sets the repair budget.
    pub fn with_repair_budget(mut self, repair_budget: u32) -> Self {
        self.repair_budget = repair_budget;
        self
    }

    /// Sets the interpreter and script extension together.
    pub fn with_interpreter(
        mut self,
        interpreter: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        self.interpreter = interpreter.into();
        self.script_extension = extension.into();
        self
    }

    /// Sets the execution timeout.
    pub fn with_exec_timeout(mut self, timeout: Duration) -> Self {
        self.exec_timeout = timeout;
        self
    }

    /// Sets the template directory.
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = dir.into();
        self
    }

    /// Sets the breakdown audit directory.
    pub fn with_breakdown_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.breakdown_dir = dir.into();
        self
    }

    /// Sets the scratch directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Validates configuration consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationFailed(format!(
                "temperature {} out of range [0.0, 2.0]",
                self.temperature
            )));
        }
        if self.interpreter.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "interpreter must not be empty".to_string(),
            ));
        }
        if self.exec_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "exec_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses an environment variable value into the target type.
fn parse_env_value<T: std::str::FromStr>(val: &str, key: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    val.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
