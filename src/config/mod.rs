//! Output configuration
//!
//! Settings are layered with figment (see [`OutputConfig::load`]): built-in
//! defaults, an optional config file, `GROUPER_*` environment variables, then
//! command-line overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::message::MessageKind;

mod loader;
mod smart_load;

/// Default dispatcher poll interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "GROUPER_";

/// Output mode; also picks the finding printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Human-readable colored lines
    #[default]
    Nice,
    /// Structured JSON array
    Json,
}

/// Minimum severity of diagnostic messages shown in nice mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Error,
}

impl LogLevel {
    /// Results and terminal messages are always admitted.
    pub fn admits(self, kind: MessageKind) -> bool {
        let severity = match kind {
            MessageKind::Trace => LogLevel::Trace,
            MessageKind::Debug => LogLevel::Debug,
            MessageKind::Info => LogLevel::Info,
            MessageKind::Error => LogLevel::Error,
            MessageKind::Fatal
            | MessageKind::Finish
            | MessageKind::FileResult
            | MessageKind::GpoResult => return true,
        };
        severity >= self
    }
}

/// Resolved output settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// nice or json
    pub mode: OutputMode,

    /// Write primary output to stdout
    pub console: bool,

    /// Write primary output to this file
    pub file: Option<PathBuf>,

    /// Minimum diagnostic severity shown in nice mode
    pub log_level: LogLevel,

    /// How long the dispatcher waits on an empty channel before polling again
    pub poll_interval_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Nice,
            console: true,
            file: None,
            log_level: LogLevel::Info,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl OutputConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Enforces cross-field rules after all layers are merged.
    fn normalize(&mut self) {
        if !self.console && self.file.is_none() {
            tracing::debug!("no output destination enabled, falling back to console");
            self.console = true;
        }
        self.poll_interval_ms = self.poll_interval_ms.max(1);
    }
}
