use anyhow::{Context, Result};
use console::Style;
use std::sync::Arc;

use super::{Flow, Processor};
use crate::config::LogLevel;
use crate::message::{Message, MessageKind, Payload};
use crate::printer::GpoPrinter;
use crate::sink::OutputSink;

/// Human-readable processor: one colored line per message, written inline.
pub struct TextProcessor {
    printer: Arc<dyn GpoPrinter>,
    min_level: LogLevel,
}

impl TextProcessor {
    pub fn new(printer: Arc<dyn GpoPrinter>, min_level: LogLevel) -> Self {
        Self { printer, min_level }
    }
}

/// Severity to console style table.
pub fn style_for(kind: MessageKind) -> Style {
    match kind {
        MessageKind::Trace => Style::new().dim(),
        MessageKind::Debug => Style::new().white().dim(),
        MessageKind::Info => Style::new().white(),
        MessageKind::Error => Style::new().magenta(),
        MessageKind::Fatal => Style::new().red().bold(),
        MessageKind::FileResult => Style::new().green(),
        MessageKind::GpoResult => Style::new().cyan(),
        MessageKind::Finish => Style::new().white().bold(),
    }
}

impl Processor for TextProcessor {
    fn process(&mut self, message: Message, sink: &mut OutputSink) -> Result<Flow> {
        let kind = message.kind();
        let flow = Flow::after(kind);
        if !self.min_level.admits(kind) {
            return Ok(flow);
        }

        let style = style_for(kind);
        sink.write_line(&message.to_string(), &style)
            .context("Failed to write message line")?;

        if let Payload::GpoResult(finding) = message.payload() {
            let rendered = self.printer.render(finding)?;
            for line in rendered.lines() {
                sink.write_line(line, &style)
                    .context("Failed to write finding")?;
            }
        }

        Ok(flow)
    }

    fn finalize(&mut self, sink: &mut OutputSink) -> Result<()> {
        sink.flush().context("Failed to flush text output")
    }

    fn name(&self) -> &'static str {
        "text"
    }
}
