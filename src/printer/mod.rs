//! Renderers for structured findings
//!
//! A [`GpoPrinter`] turns one [`Finding`] into a presentation string. The
//! printer is chosen once from the output mode and shared (`Arc`) with every
//! processor that embeds findings, including the streaming writer thread.

use anyhow::Result;
use std::sync::Arc;

use crate::config::OutputMode;
use crate::message::Finding;

mod json;
mod nice;

pub use json::JsonPrinter;
pub use nice::NicePrinter;

pub trait GpoPrinter: Send + Sync {
    /// Renders `finding` for output.
    fn render(&self, finding: &Finding) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Returns the printer matching `mode`.
pub fn select(mode: OutputMode) -> Arc<dyn GpoPrinter> {
    match mode {
        OutputMode::Nice => Arc::new(NicePrinter::default()),
        OutputMode::Json => Arc::new(JsonPrinter),
    }
}
