//! Styled helper lines around the primary output
//!
//! Everything here is cosmetic: the banner shown before a nice-mode run and
//! the notices printed on the emergency path. Message rendering lives in the
//! processors.

use console::style;
use std::fmt;

use crate::config::{OutputConfig, OutputMode};

/// Output handler for the CLI's own chatter
pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// The banner is only for humans: nice mode on the console, not quiet.
    pub fn wants_banner(&self, config: &OutputConfig) -> bool {
        !self.quiet && config.console && config.mode == OutputMode::Nice
    }

    /// Print the startup banner when [`wants_banner`](Self::wants_banner) allows it.
    pub fn banner(&self, config: &OutputConfig) {
        if !self.wants_banner(config) {
            return;
        }
        println!(
            "{} {}",
            style(crate::PKG_NAME).bold().cyan(),
            style(format!("v{}", crate::VERSION)).dim()
        );
        println!("{}", style(crate::PKG_DESCRIPTION).dim());
        if let Some(file) = &config.file {
            println!("  {:<10} {}", style("file").dim(), file.display());
        }
        println!("  {:<10} {:?}", style("level").dim(), config.log_level);
        println!("{}", style("─".repeat(50)).dim());
    }

    /// Print an error message. Errors are shown even in quiet mode.
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✖").red(), message);
    }

    /// First line of the emergency dump.
    pub fn fault_banner(error: &dyn fmt::Display) -> String {
        format!(
            "{} {}",
            style("✖").red().bold(),
            style(format!("Unhandled exception in {}: {}", crate::PKG_NAME, error)).red().bold()
        )
    }

    /// Last line of the emergency dump.
    pub fn emergency_notice() -> String {
        style("Emergency quit, dumped queue to console.").yellow().to_string()
    }
}
