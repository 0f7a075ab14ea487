//! Command-line interface for grouper
//!
//! Parses flags with clap, merges them over the file and environment layers,
//! then replays the event log through the output pipeline.

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;

use crate::config::{LogLevel, OutputConfig, OutputMode};
use crate::engine::ReplayEngine;
use crate::runner::Runner;

mod output;

pub use output::Output;

/// grouper - render Group Policy audit events as console lines or JSON
#[derive(Parser, Debug)]
#[command(name = "grouper", author, version, about, long_about = None)]
pub struct Cli {
    /// Event log to replay (newline-delimited JSON); omit or use '-' for stdin
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub printer: Option<OutputMode>,

    /// Write output to stdout
    #[arg(short, long)]
    pub stdout: bool,

    /// Write output to FILE (disables stdout unless --stdout is also given)
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Minimum severity of diagnostic messages in nice mode
    #[arg(short, long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase diagnostic verbosity on stderr (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the banner and diagnostics
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Runs the pipeline and returns the process exit code.
    pub async fn run(self) -> Result<i32> {
        setup_logging(self.verbose, self.quiet);

        let config = OutputConfig::load(self.config.as_deref(), Some(self.overrides()))?;

        let output = Output::new(self.quiet);
        output.banner(&config);

        let runner = Runner::new(config);
        let outcome = match self.input.as_deref() {
            Some(path) if path.as_os_str() != "-" => runner.run(ReplayEngine::open(path)?).await?,
            _ => runner.run(ReplayEngine::stdin()).await?,
        };

        if outcome.exit_code() != 0 {
            output.error("Run aborted by an analysis fault");
        }
        Ok(outcome.exit_code())
    }

    /// Command-line layer for [`OutputConfig::load`]. Unset flags become nulls
    /// and are pruned before merging.
    fn overrides(&self) -> serde_json::Value {
        let console = if self.stdout {
            Some(true)
        } else if self.file.is_some() {
            Some(false)
        } else {
            None
        };

        json!({
            "mode": self.printer,
            "console": console,
            "file": self.file,
            "log_level": self.log_level,
        })
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => tracing_subscriber::EnvFilter::new("warn"),
        1 => tracing_subscriber::EnvFilter::new("info"),
        2 => tracing_subscriber::EnvFilter::new("debug"),
        _ => tracing_subscriber::EnvFilter::new("trace"),
    });

    // stdout carries the primary output, diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
