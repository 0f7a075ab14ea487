use anyhow::{Context, Result};
use std::sync::Arc;

use super::record::{self, RecordStyle};
use super::{Flow, Processor};
use crate::message::Message;
use crate::printer::GpoPrinter;
use crate::sink::OutputSink;

/// Writes every message as one element of a single JSON array.
///
/// Elements are written as they arrive: `[` before the first message, `,`
/// between elements, `]` on the terminal message. Trace and Debug are left out.
pub struct AggregateJsonProcessor {
    printer: Arc<dyn GpoPrinter>,
    started: bool,
    written: usize,
    closed: bool,
}

impl AggregateJsonProcessor {
    pub fn new(printer: Arc<dyn GpoPrinter>) -> Self {
        Self {
            printer,
            started: false,
            written: 0,
            closed: false,
        }
    }

    fn open(&mut self, sink: &mut OutputSink) -> Result<()> {
        if !self.started {
            sink.write_raw("[\n").context("Failed to open JSON array")?;
            self.started = true;
        }
        Ok(())
    }

    fn close(&mut self, sink: &mut OutputSink) -> Result<()> {
        self.open(sink)?;
        if !self.closed {
            sink.write_raw("\n]\n").context("Failed to close JSON array")?;
            sink.flush().context("Failed to flush JSON output")?;
            self.closed = true;
        }
        Ok(())
    }
}

impl Processor for AggregateJsonProcessor {
    fn process(&mut self, message: Message, sink: &mut OutputSink) -> Result<Flow> {
        let flow = Flow::after(message.kind());
        if self.closed {
            tracing::warn!(kind = %message.kind(), "message after end of JSON array dropped");
            return Ok(flow);
        }
        self.open(sink)?;

        match record::render(&message, self.printer.as_ref(), RecordStyle::Aggregate) {
            Ok(Some(record)) => {
                let json = serde_json::to_string_pretty(&record)?;
                if self.written > 0 {
                    sink.write_raw(",\n")?;
                }
                sink.write_raw(&json).context("Failed to write JSON record")?;
                self.written += 1;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(kind = %message.kind(), error = %err, "skipping record that failed to render");
            }
        }

        if flow.is_stop() {
            self.close(sink)?;
        }
        Ok(flow)
    }

    /// Closes the array when the loop ended without a terminal message.
    fn finalize(&mut self, sink: &mut OutputSink) -> Result<()> {
        self.close(sink)
    }

    fn name(&self) -> &'static str {
        "aggregate-json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Finding;
    use crate::printer::JsonPrinter;
    use crate::sink::testing::SharedBuffer;
    use serde_json::{Value, json};

    fn run(messages: Vec<Message>) -> (Vec<Flow>, Value) {
        let buffer = SharedBuffer::default();
        let mut sink = OutputSink::from_writer(buffer.clone());
        let mut processor = AggregateJsonProcessor::new(Arc::new(JsonPrinter));

        let flows = messages
            .into_iter()
            .map(|m| processor.process(m, &mut sink).unwrap())
            .collect();
        processor.finalize(&mut sink).unwrap();

        (flows, serde_json::from_str(&buffer.contents()).unwrap())
    }

    #[test]
    fn test_info_file_result_finish_yields_three_elements() {
        let finding = Finding::new(json!({"Path": "\\\\corp\\SYSVOL\\scripts\\logon.bat"}));
        let (flows, output) = run(vec![
            Message::info("a"),
            Message::file_result("x", finding),
            Message::finish("done"),
        ]);

        assert_eq!(flows, vec![Flow::Continue, Flow::Continue, Flow::Stop]);
        let elements = output.as_array().unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0]["Type"], "Info");
        assert_eq!(elements[0]["Message"], "a");
        assert_eq!(elements[1]["Type"], "FileResult");
        assert_eq!(elements[2]["Type"], "Finish");
    }

    #[test]
    fn test_diagnostics_suppressed() {
        let (_, output) = run(vec![
            Message::trace("t"),
            Message::debug("d"),
            Message::error("e"),
            Message::fatal("f"),
        ]);
        let types: Vec<&str> = output
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["Type"].as_str().unwrap())
            .collect();
        assert_eq!(types, vec!["Error", "Fatal"]);
    }

    #[test]
    fn test_gpo_result_keeps_native_types() {
        let finding = Finding::new(json!({"Name": "Baseline", "Links": 2, "Enforced": false}));
        let (_, output) = run(vec![Message::gpo_result("gpo", finding), Message::finish("done")]);

        let gpo = &output[0]["GpoResult"];
        assert_eq!(gpo["Links"], json!(2));
        assert_eq!(gpo["Enforced"], json!(false));
    }

    #[test]
    fn test_finalize_without_terminal_still_closes() {
        let (_, output) = run(vec![Message::info("only")]);
        assert_eq!(output.as_array().unwrap().len(), 1);

        let (_, output) = run(vec![]);
        assert_eq!(output, json!([]));
    }

    #[test]
    fn test_messages_after_terminal_are_dropped() {
        let (flows, output) = run(vec![Message::finish("done"), Message::info("late")]);
        assert_eq!(flows, vec![Flow::Stop, Flow::Continue]);
        assert_eq!(output.as_array().unwrap().len(), 1);
    }
}
