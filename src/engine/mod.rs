//! Producer side of the pipeline
//!
//! The analysis itself lives outside this crate. An engine is anything that
//! enqueues zero or more non-terminal messages followed by exactly one
//! terminal message, then returns.

use anyhow::Result;
use thiserror::Error;

use crate::channel::MessageSender;
use crate::message::MessageKind;

mod replay;

pub use replay::{EventRecord, ReplayEngine};

pub trait AnalysisEngine: Send + 'static {
    /// Runs the analysis, publishing every event through `sender`.
    ///
    /// An `Err` (or a panic) is a producer fault: the runner dumps whatever
    /// is still queued and the process exits with code 1.
    fn execute(&mut self, sender: &MessageSender) -> Result<()>;
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed event record on line {line}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} record on line {line} has no payload")]
    MissingPayload { line: usize, kind: MessageKind },
}
