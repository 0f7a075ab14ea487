//! Dispatch loop draining the channel into the active processor
//!
//! ```text
//!            ┌──────────── Empty ────────────┐
//!            ▼                               │
//!  ┌────────────────────┐  dequeue(poll)  ┌──┴──────┐
//!  │      Running       │────────────────▶│ channel │
//!  └─────────┬──────────┘                 └─────────┘
//!            │ Flow::Stop | Closed | abort
//!            ▼
//!  ┌────────────────────┐
//!  │      Exiting       │── finalize (not on abort) ──▶ return
//!  └────────────────────┘
//! ```
//!
//! The dispatcher owns the [`OutputSink`] and lends it to the processor for
//! each message, so output from the loop is never interleaved.

use anyhow::Result;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::channel::{Dequeue, MessageReceiver};
use crate::config::OutputConfig;
use crate::printer;
use crate::processor::{self, Flow, Processor};
use crate::sink::OutputSink;

/// Shared flag raised when the producer faults.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Running,
    Exiting,
}

/// How the loop ended and how many messages reached the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A terminal message was processed and the processor finalized.
    Completed { processed: usize },
    /// Every sender went away without a terminal message; the processor was finalized.
    ChannelClosed { processed: usize },
    /// The abort signal was raised; the processor was not finalized.
    Aborted { processed: usize },
}

impl DispatchOutcome {
    pub fn processed(self) -> usize {
        match self {
            DispatchOutcome::Completed { processed }
            | DispatchOutcome::ChannelClosed { processed }
            | DispatchOutcome::Aborted { processed } => processed,
        }
    }
}

pub struct Dispatcher {
    receiver: MessageReceiver,
    processor: Box<dyn Processor>,
    sink: OutputSink,
    poll_interval: Duration,
    state: DispatchState,
}

impl Dispatcher {
    pub fn new(
        receiver: MessageReceiver,
        processor: Box<dyn Processor>,
        sink: OutputSink,
        poll_interval: Duration,
    ) -> Self {
        Self {
            receiver,
            processor,
            sink,
            poll_interval,
            state: DispatchState::Running,
        }
    }

    /// Selects the printer and processor for `config` once, up front.
    pub fn from_config(config: &OutputConfig, receiver: MessageReceiver) -> Result<Self> {
        let printer = printer::select(config.mode);
        let (processor, sink) = processor::select(config, printer)?;
        Ok(Self::new(receiver, processor, sink, config.poll_interval()))
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn processor_name(&self) -> &'static str {
        self.processor.name()
    }

    /// Runs until a terminal message, channel closure, or `abort`.
    ///
    /// Processor errors are logged and never end the loop; finalize errors are
    /// logged and suppressed.
    pub fn run(&mut self, abort: &AbortSignal) -> DispatchOutcome {
        tracing::debug!(
            processor = self.processor.name(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "dispatcher running"
        );
        let mut processed = 0;

        let outcome = loop {
            if abort.is_raised() {
                break DispatchOutcome::Aborted { processed };
            }

            match self.receiver.dequeue(self.poll_interval) {
                Dequeue::Empty => continue,
                Dequeue::Closed if abort.is_raised() => break DispatchOutcome::Aborted { processed },
                Dequeue::Closed => {
                    tracing::warn!("all producers disconnected before a terminal message");
                    break DispatchOutcome::ChannelClosed { processed };
                }
                Dequeue::Message(message) => {
                    let kind = message.kind();
                    let flow = match self.processor.process(message, &mut self.sink) {
                        Ok(flow) => flow,
                        Err(err) => {
                            tracing::error!(
                                processor = self.processor.name(),
                                kind = %kind,
                                error = %err,
                                "processor failed on message"
                            );
                            Flow::after(kind)
                        }
                    };
                    processed += 1;

                    if flow.is_stop() {
                        break DispatchOutcome::Completed { processed };
                    }
                }
            }
        };

        self.state = DispatchState::Exiting;
        match outcome {
            DispatchOutcome::Aborted { .. } => {
                tracing::debug!(processed, "dispatcher aborted");
            }
            DispatchOutcome::Completed { .. } | DispatchOutcome::ChannelClosed { .. } => {
                self.finalize();
                tracing::debug!(processed, "dispatcher finished");
            }
        }
        outcome
    }

    fn finalize(&mut self) {
        if let Err(err) = self.processor.finalize(&mut self.sink) {
            tracing::warn!(processor = self.processor.name(), error = %err, "finalize failed");
        }
        if let Err(err) = self.sink.flush() {
            tracing::warn!(error = %err, "failed to flush output");
        }
    }

    /// Prints every message still queued, in FIFO order, as plain text lines.
    ///
    /// Best effort: the output is not JSON even in JSON mode.
    pub fn emergency_drain(&mut self, out: &mut dyn Write) -> io::Result<usize> {
        let mut dumped = 0;
        for message in self.receiver.drain() {
            writeln!(out, "{}", message)?;
            dumped += 1;
        }
        out.flush()?;
        Ok(dumped)
    }
}
