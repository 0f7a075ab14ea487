use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, Sender};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::record::{self, RecordStyle};
use super::{Flow, Processor};
use crate::message::Message;
use crate::printer::GpoPrinter;
use crate::sink::OutputSink;

/// Streams JSON records to a file without blocking the dispatch loop.
///
/// Construction truncates the file and writes `[` immediately. `process` only
/// queues the message for a dedicated writer thread and returns the stop
/// decision from the message kind, so it never waits on disk I/O. The writer
/// appends records strictly in submission order and is the only owner of the
/// separator counter.
///
/// The stop decision for the terminal message is returned before its record
/// lands. `finalize` closes the queue and joins the writer before checking the
/// closing bracket, so the file is complete once `finalize` returns.
pub struct StreamingJsonProcessor {
    path: PathBuf,
    requests: Option<Sender<Message>>,
    writer: Option<JoinHandle<WriterReport>>,
}

/// Counters returned by the writer thread when its queue closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterReport {
    pub written: usize,
    pub failures: usize,
    pub closed: bool,
}

impl StreamingJsonProcessor {
    pub fn create(path: impl AsRef<Path>, printer: Arc<dyn GpoPrinter>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("Failed to create JSON output file {}", path.display()))?;
        file.write_all(b"[\n")
            .and_then(|_| file.sync_data())
            .with_context(|| format!("Failed to initialize {}", path.display()))?;

        let (requests, queue) = channel::unbounded();
        let writer = JsonFileWriter {
            file,
            printer,
            report: WriterReport::default(),
        };
        let handle = thread::Builder::new()
            .name("grouper-json-writer".to_string())
            .spawn(move || writer.run(queue))
            .context("Failed to spawn JSON writer thread")?;

        tracing::debug!(path = %path.display(), "streaming JSON output opened");
        Ok(Self {
            path,
            requests: Some(requests),
            writer: Some(handle),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Processor for StreamingJsonProcessor {
    fn process(&mut self, message: Message, _sink: &mut OutputSink) -> Result<Flow> {
        let flow = Flow::after(message.kind());
        match &self.requests {
            Some(requests) => {
                if let Err(err) = requests.send(message) {
                    tracing::error!(kind = %err.0.kind(), "JSON writer has stopped, record lost");
                }
            }
            None => tracing::warn!(kind = %message.kind(), "message after finalize dropped"),
        }
        Ok(flow)
    }

    fn finalize(&mut self, _sink: &mut OutputSink) -> Result<()> {
        drop(self.requests.take());

        if let Some(handle) = self.writer.take() {
            match handle.join() {
                Ok(report) => tracing::debug!(
                    written = report.written,
                    failures = report.failures,
                    closed = report.closed,
                    "JSON writer drained"
                ),
                Err(_) => tracing::error!("JSON writer thread panicked"),
            }
        }

        if repair_closing_bracket(&self.path)? {
            tracing::warn!(path = %self.path.display(), "JSON array was not closed, appended ']'");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "streaming-json"
    }
}

/// Appends `]` unless it is already the last non-whitespace character.
/// Returns whether the file was changed.
fn repair_closing_bracket(path: &Path) -> Result<bool> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to re-read {}", path.display()))?;
    if content.trim_end().ends_with(']') {
        return Ok(false);
    }

    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to reopen {}", path.display()))?;
    file.write_all(b"\n]")?;
    file.sync_data()?;
    Ok(true)
}

struct JsonFileWriter {
    file: File,
    printer: Arc<dyn GpoPrinter>,
    report: WriterReport,
}

impl JsonFileWriter {
    fn run(mut self, queue: Receiver<Message>) -> WriterReport {
        for message in queue.iter() {
            if self.report.closed {
                tracing::warn!(kind = %message.kind(), "message after end of JSON array dropped");
                continue;
            }
            if let Err(err) = self.append(&message) {
                self.report.failures += 1;
                tracing::error!(kind = %message.kind(), error = %err, "Error writing to JSON file");
            }
        }
        self.report
    }

    fn append(&mut self, message: &Message) -> Result<()> {
        let mut dirty = false;

        if let Some(record) = record::render(message, self.printer.as_ref(), RecordStyle::Streaming)? {
            let json = serde_json::to_string_pretty(&record)?;
            if self.report.written > 0 {
                self.file.write_all(b",\n")?;
            }
            self.file.write_all(json.as_bytes())?;
            self.report.written += 1;
            dirty = true;
        }

        if message.is_terminal() {
            self.file.write_all(b"\n]")?;
            self.report.closed = true;
            dirty = true;
        }

        if dirty {
            self.file.sync_data()?;
        }
        Ok(())
    }
}
