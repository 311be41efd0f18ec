//! Command-line interface for taskforge.
//!
//! Stands in for the outer request-handling layer: reads the task text,
//! stages attachments by file name, runs the pipeline, and prints the
//! resulting answer text.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
