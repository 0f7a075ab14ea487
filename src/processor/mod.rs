//! Output processing strategies
//!
//! A [`Processor`] consumes one message at a time and tells the dispatcher
//! whether the stream has ended. Three strategies exist:
//!
//! | Strategy | Mode | Destination | Writes |
//! |---|---|---|---|
//! | [`TextProcessor`] | nice | console and/or file | synchronously, one line per message |
//! | [`AggregateJsonProcessor`] | json | console | incrementally, one JSON array |
//! | [`StreamingJsonProcessor`] | json | file | on a dedicated writer thread |
//!
//! The strategy is chosen once by [`select`] and never changes during a run.

use anyhow::Result;
use std::sync::Arc;

use crate::config::{OutputConfig, OutputMode};
use crate::message::{Message, MessageKind};
use crate::printer::GpoPrinter;
use crate::sink::OutputSink;

mod aggregate;
mod record;
mod streaming;
mod text;

pub use aggregate::AggregateJsonProcessor;
pub use streaming::StreamingJsonProcessor;
pub use text::TextProcessor;

/// Whether the dispatch loop keeps going after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl Flow {
    /// `Stop` exactly for terminal kinds.
    pub fn after(kind: MessageKind) -> Self {
        if kind.is_terminal() { Flow::Stop } else { Flow::Continue }
    }

    pub fn is_stop(self) -> bool {
        self == Flow::Stop
    }
}

pub trait Processor: Send {
    /// Consumes `message`, writing through `sink` where the strategy writes inline.
    fn process(&mut self, message: Message, sink: &mut OutputSink) -> Result<Flow>;

    /// Flush or repair step run once after the dispatch loop exits.
    fn finalize(&mut self, _sink: &mut OutputSink) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str;
}

/// Builds the processor for `config` and the sink the dispatcher will own.
pub fn select(
    config: &OutputConfig,
    printer: Arc<dyn GpoPrinter>,
) -> Result<(Box<dyn Processor>, OutputSink)> {
    let selected: (Box<dyn Processor>, OutputSink) = match (config.mode, config.file.as_deref()) {
        (OutputMode::Json, Some(path)) => {
            let processor = StreamingJsonProcessor::create(path, printer)?;
            (Box::new(processor), OutputSink::discard())
        }
        (OutputMode::Json, None) => (
            Box::new(AggregateJsonProcessor::new(printer)),
            OutputSink::console(),
        ),
        (OutputMode::Nice, file) => (
            Box::new(TextProcessor::new(printer, config.log_level)),
            OutputSink::open(config.console, file)?,
        ),
    };

    tracing::debug!(processor = selected.0.name(), "selected output processor");
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer;
    use tempfile::TempDir;

    #[test]
    fn test_flow_after_kind() {
        assert_eq!(Flow::after(MessageKind::Fatal), Flow::Stop);
        assert_eq!(Flow::after(MessageKind::Finish), Flow::Stop);
        assert_eq!(Flow::after(MessageKind::GpoResult), Flow::Continue);
        assert!(!Flow::after(MessageKind::Info).is_stop());
    }

    #[test]
    fn test_select_matrix() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("results.json");

        let nice = OutputConfig::default();
        let (processor, _) = select(&nice, printer::select(nice.mode)).unwrap();
        assert_eq!(processor.name(), "text");

        let json_console = OutputConfig {
            mode: OutputMode::Json,
            ..OutputConfig::default()
        };
        let (processor, _) = select(&json_console, printer::select(json_console.mode)).unwrap();
        assert_eq!(processor.name(), "aggregate-json");

        let json_file = OutputConfig {
            mode: OutputMode::Json,
            console: false,
            file: Some(file.clone()),
            ..OutputConfig::default()
        };
        let (mut processor, mut sink) = select(&json_file, printer::select(json_file.mode)).unwrap();
        assert_eq!(processor.name(), "streaming-json");
        assert!(!sink.has_console());
        processor.finalize(&mut sink).unwrap();
        assert!(file.exists());
    }
}
