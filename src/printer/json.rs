use anyhow::{Context, Result};

use super::GpoPrinter;
use crate::message::Finding;
use crate::shared::json::without_nulls;

/// Machine-oriented printer: pretty JSON with null fields omitted.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPrinter;

impl GpoPrinter for JsonPrinter {
    fn render(&self, finding: &Finding) -> Result<String> {
        serde_json::to_string_pretty(&without_nulls(finding.as_value()))
            .context("Failed to serialize finding")
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
