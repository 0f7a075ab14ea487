//! Top-level composition of producer and dispatcher
//!
//! The analysis engine and the dispatch loop each run on their own blocking
//! thread. A producer fault (an `Err` or a panic) raises the abort signal before
//! the sender is dropped, so the dispatcher stops without finalizing and the
//! runner can dump whatever is still queued.

use anyhow::{Context, Result, anyhow};
use std::any::Any;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};

use crate::channel;
use crate::cli::Output;
use crate::config::OutputConfig;
use crate::dispatcher::{AbortSignal, DispatchOutcome, Dispatcher};
use crate::engine::AnalysisEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The producer returned normally.
    Completed(DispatchOutcome),
    /// The producer faulted; `dumped` messages went out through the emergency path.
    Faulted { dumped: usize },
}

impl RunOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            RunOutcome::Completed(_) => 0,
            RunOutcome::Faulted { .. } => 1,
        }
    }
}

pub struct Runner {
    config: OutputConfig,
    emergency: Box<dyn Write + Send>,
}

impl Runner {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            emergency: Box::new(io::stdout()),
        }
    }

    /// Redirects the emergency dump (stdout by default).
    pub fn with_emergency_output(mut self, out: impl Write + Send + 'static) -> Self {
        self.emergency = Box::new(out);
        self
    }

    pub async fn run<E: AnalysisEngine>(mut self, engine: E) -> Result<RunOutcome> {
        let (sender, receiver) = channel::unbounded();
        let mut dispatcher = Dispatcher::from_config(&self.config, receiver)?;
        tracing::info!(processor = dispatcher.processor_name(), "starting run");

        let abort = AbortSignal::new();

        let producer_abort = abort.clone();
        let producer = tokio::task::spawn_blocking(move || {
            let mut engine = engine;
            let result = match panic::catch_unwind(AssertUnwindSafe(|| engine.execute(&sender))) {
                Ok(result) => result,
                Err(payload) => Err(anyhow!("analysis engine panicked: {}", panic_message(payload.as_ref()))),
            };
            if result.is_err() {
                producer_abort.raise();
            }
            drop(sender);
            result
        });

        let dispatch = tokio::task::spawn_blocking(move || {
            let outcome = dispatcher.run(&abort);
            (dispatcher, outcome)
        });

        let produced = producer.await.context("Analysis engine task failed")?;
        let (mut dispatcher, outcome) = dispatch.await.context("Dispatcher task failed")?;

        match produced {
            Ok(()) => {
                tracing::info!(processed = outcome.processed(), "run completed");
                Ok(RunOutcome::Completed(outcome))
            }
            Err(error) => {
                tracing::error!(error = %format!("{:#}", error), "producer fault");
                let dumped = self.emergency_quit(&mut dispatcher, &error)?;
                Ok(RunOutcome::Faulted { dumped })
            }
        }
    }

    fn emergency_quit(&mut self, dispatcher: &mut Dispatcher, error: &anyhow::Error) -> Result<usize> {
        let out = self.emergency.as_mut();
        writeln!(out, "{}", Output::fault_banner(&format!("{:#}", error)))?;
        let dumped = dispatcher.emergency_drain(out)?;
        writeln!(out, "{}", Output::emergency_notice())?;
        out.flush()?;
        Ok(dumped)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
