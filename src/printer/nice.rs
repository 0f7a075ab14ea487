use anyhow::Result;
use serde_json::Value;
use std::fmt::Write;

use super::GpoPrinter;
use crate::message::Finding;

/// Human-oriented printer: an indented key/value outline of the finding.
#[derive(Debug, Clone)]
pub struct NicePrinter {
    indent: usize,
}

impl Default for NicePrinter {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl NicePrinter {
    pub fn with_indent(indent: usize) -> Self {
        Self { indent }
    }

    fn write_value(&self, out: &mut String, value: &Value, depth: usize) -> std::fmt::Result {
        let pad = " ".repeat(depth * self.indent);
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    match child {
                        Value::Null => {}
                        Value::Object(_) | Value::Array(_) if !is_empty(child) => {
                            writeln!(out, "{}{}:", pad, key)?;
                            self.write_value(out, child, depth + 1)?;
                        }
                        _ => writeln!(out, "{}{}: {}", pad, key, scalar(child))?,
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::Object(_) | Value::Array(_) if !is_empty(item) => {
                            writeln!(out, "{}-", pad)?;
                            self.write_value(out, item, depth + 1)?;
                        }
                        _ => writeln!(out, "{}- {}", pad, scalar(item))?,
                    }
                }
            }
            other => writeln!(out, "{}{}", pad, scalar(other))?,
        }
        Ok(())
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Object(_) => "{}".to_string(),
        Value::Array(_) => "[]".to_string(),
        other => other.to_string(),
    }
}

impl GpoPrinter for NicePrinter {
    fn render(&self, finding: &Finding) -> Result<String> {
        let mut out = String::new();
        writeln!(out, "GPO: {}", finding.name().unwrap_or("(unnamed)"))?;
        self.write_value(&mut out, finding.as_value(), 1)?;
        Ok(out.trim_end().to_string())
    }

    fn name(&self) -> &'static str {
        "nice"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_outline() {
        let finding = Finding::new(json!({
            "Name": "Server Baseline",
            "Settings": {"MinimumPasswordLength": 7, "Audit": null},
            "Links": ["OU=Servers", "OU=DCs"]
        }));

        // serde_json maps iterate in key order
        let rendered = NicePrinter::default().render(&finding).unwrap();
        let expected = "\
GPO: Server Baseline
  Links:
    - OU=Servers
    - OU=DCs
  Name: Server Baseline
  Settings:
    MinimumPasswordLength: 7";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_unnamed_and_custom_indent() {
        let finding = Finding::new(json!({"Rules": [{"Sid": "S-1-5-11"}]}));
        let rendered = NicePrinter::with_indent(4).render(&finding).unwrap();
        assert!(rendered.starts_with("GPO: (unnamed)"));
        assert!(rendered.contains("    Rules:\n        -\n            Sid: S-1-5-11"));
    }
}
