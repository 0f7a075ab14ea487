//! Output capability handed to processors by the dispatcher
//!
//! The dispatcher owns exactly one [`OutputSink`] and lends it `&mut` to the
//! active processor for each message, so writes from the dispatch loop are
//! serialized by ownership rather than by a shared lock.

use anyhow::{Context, Result};
use console::Style;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Console and/or file destination for primary output.
pub struct OutputSink {
    console: Option<Box<dyn Write + Send>>,
    styled: bool,
    file: Option<BufWriter<File>>,
}

impl OutputSink {
    /// Styled sink on stdout.
    pub fn console() -> Self {
        Self {
            console: Some(Box::new(io::stdout())),
            styled: true,
            file: None,
        }
    }

    /// Sink that drops everything. Used when a processor writes elsewhere.
    pub fn discard() -> Self {
        Self {
            console: None,
            styled: false,
            file: None,
        }
    }

    /// Unstyled sink over an arbitrary writer.
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            console: Some(Box::new(writer)),
            styled: false,
            file: None,
        }
    }

    /// Opens the configured destinations. The file is truncated.
    pub fn open(console: bool, file: Option<&Path>) -> Result<Self> {
        let mut sink = if console { Self::console() } else { Self::discard() };
        if let Some(path) = file {
            let handle = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("Failed to open output file {}", path.display()))?;
            sink.file = Some(BufWriter::new(handle));
        }
        Ok(sink)
    }

    pub fn has_console(&self) -> bool {
        self.console.is_some()
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    /// Writes one line; `style` applies on a styled console only.
    pub fn write_line(&mut self, line: &str, style: &Style) -> io::Result<()> {
        if let Some(console) = self.console.as_mut() {
            if self.styled {
                writeln!(console, "{}", style.apply_to(line))?;
            } else {
                writeln!(console, "{}", line)?;
            }
        }
        if let Some(file) = self.file.as_mut() {
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }

    /// Writes `text` verbatim to every destination.
    pub fn write_raw(&mut self, text: &str) -> io::Result<()> {
        if let Some(console) = self.console.as_mut() {
            console.write_all(text.as_bytes())?;
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(text.as_bytes())?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        if let Some(console) = self.console.as_mut() {
            console.flush()?;
        }
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}
