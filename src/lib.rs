//! # grouper
//!
//! Concurrent output pipeline for Group Policy audit findings.
//!
//! An analysis engine publishes [`Message`]s through an unbounded channel; a
//! [`Dispatcher`] drains it on another thread and hands each message to one
//! output processor:
//!
//! - **nice**: colored console lines, optionally mirrored to a file
//! - **json** on stdout: one aggregated JSON array
//! - **json** with `--file`: records streamed to the file by a writer thread
//!
//! ```bash
//! grouper events.jsonl
//! grouper --printer json --file results.json events.jsonl
//! ```

pub mod channel;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod message;
pub mod printer;
pub mod processor;
pub mod runner;
pub mod shared;
pub mod sink;

pub use channel::{MessageReceiver, MessageSender};
pub use cli::Cli;
pub use config::OutputConfig;
pub use dispatcher::{AbortSignal, DispatchOutcome, Dispatcher};
pub use engine::{AnalysisEngine, ReplayEngine};
pub use message::{Finding, Message, MessageKind, Payload};
pub use runner::{RunOutcome, Runner};

/// Result type alias for grouper operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
