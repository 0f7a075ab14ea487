//! Event records flowing from the analysis engine to the output pipeline
//!
//! A [`Message`] is created once by the producer, moved through the channel and
//! consumed by exactly one processor. Nothing in the pipeline mutates it after
//! construction, so every field is private and exposed through getters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured analysis result carried by `FileResult` and `GpoResult` messages.
///
/// The pipeline treats the content as opaque: it is rendered, serialized or
/// embedded, but never inspected for meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Finding(serde_json::Value);

impl Finding {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Best-effort display name, looked up from the common name keys.
    pub fn name(&self) -> Option<&str> {
        ["DisplayName", "Name", "name", "displayName"]
            .iter()
            .find_map(|key| self.0.get(key).and_then(|v| v.as_str()))
    }
}

impl From<serde_json::Value> for Finding {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Fieldless discriminant of a [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Trace,
    Debug,
    Info,
    Error,
    Fatal,
    Finish,
    FileResult,
    GpoResult,
}

impl MessageKind {
    /// `Fatal` and `Finish` end the dispatch loop.
    pub fn is_terminal(self) -> bool {
        match self {
            MessageKind::Fatal | MessageKind::Finish => true,
            MessageKind::Trace
            | MessageKind::Debug
            | MessageKind::Info
            | MessageKind::Error
            | MessageKind::FileResult
            | MessageKind::GpoResult => false,
        }
    }

    /// Diagnostic chatter that structured outputs may leave out.
    pub fn is_diagnostic(self) -> bool {
        matches!(self, MessageKind::Trace | MessageKind::Debug)
    }

    /// Short tag used in console lines, e.g. `[GPO]`.
    pub fn label(self) -> &'static str {
        match self {
            MessageKind::Trace => "Trace",
            MessageKind::Debug => "Debug",
            MessageKind::Info => "Info",
            MessageKind::Error => "Error",
            MessageKind::Fatal => "Fatal",
            MessageKind::Finish => "Finish",
            MessageKind::FileResult => "File",
            MessageKind::GpoResult => "GPO",
        }
    }

    /// Value of the `Type` field in JSON records.
    pub fn type_name(self) -> &'static str {
        match self {
            MessageKind::Trace => "Trace",
            MessageKind::Debug => "Debug",
            MessageKind::Info => "Info",
            MessageKind::Error => "Error",
            MessageKind::Fatal => "Fatal",
            MessageKind::Finish => "Finish",
            MessageKind::FileResult => "FileResult",
            MessageKind::GpoResult => "GpoResult",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Kind-specific body of a message. Only the result kinds carry data.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Trace,
    Debug,
    Info,
    Error,
    Fatal,
    Finish,
    FileResult(Finding),
    GpoResult(Finding),
}

impl Payload {
    pub fn kind(&self) -> MessageKind {
        match self {
            Payload::Trace => MessageKind::Trace,
            Payload::Debug => MessageKind::Debug,
            Payload::Info => MessageKind::Info,
            Payload::Error => MessageKind::Error,
            Payload::Fatal => MessageKind::Fatal,
            Payload::Finish => MessageKind::Finish,
            Payload::FileResult(_) => MessageKind::FileResult,
            Payload::GpoResult(_) => MessageKind::GpoResult,
        }
    }

    /// Builds a payload for `kind`. Result kinds need a finding; the others ignore it.
    /// Returns `None` when a result kind has no finding.
    pub fn from_kind(kind: MessageKind, finding: Option<Finding>) -> Option<Self> {
        let payload = match kind {
            MessageKind::Trace => Payload::Trace,
            MessageKind::Debug => Payload::Debug,
            MessageKind::Info => Payload::Info,
            MessageKind::Error => Payload::Error,
            MessageKind::Fatal => Payload::Fatal,
            MessageKind::Finish => Payload::Finish,
            MessageKind::FileResult => Payload::FileResult(finding?),
            MessageKind::GpoResult => Payload::GpoResult(finding?),
        };
        Some(payload)
    }
}

/// One immutable event record.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    created_at: DateTime<Utc>,
    text: String,
    payload: Payload,
}

impl Message {
    /// Creates a message stamped with the current time.
    pub fn new(payload: Payload, text: impl Into<String>) -> Self {
        Self::at(Utc::now(), payload, text)
    }

    /// Creates a message with an explicit creation time (used when replaying logs).
    pub fn at(created_at: DateTime<Utc>, payload: Payload, text: impl Into<String>) -> Self {
        Self {
            created_at,
            text: text.into(),
            payload,
        }
    }

    pub fn trace(text: impl Into<String>) -> Self {
        Self::new(Payload::Trace, text)
    }

    pub fn debug(text: impl Into<String>) -> Self {
        Self::new(Payload::Debug, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Payload::Info, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Payload::Error, text)
    }

    pub fn fatal(text: impl Into<String>) -> Self {
        Self::new(Payload::Fatal, text)
    }

    pub fn finish(text: impl Into<String>) -> Self {
        Self::new(Payload::Finish, text)
    }

    pub fn file_result(text: impl Into<String>, finding: Finding) -> Self {
        Self::new(Payload::FileResult(finding), text)
    }

    pub fn gpo_result(text: impl Into<String>, finding: Finding) -> Self {
        Self::new(Payload::GpoResult(finding), text)
    }

    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    /// RFC 3339 timestamp used in JSON records.
    pub fn timestamp(&self) -> String {
        self.created_at.to_rfc3339()
    }
}

/// Plain console line: `<timestamp> [<Label>] <text>`.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.created_at.format("%Y-%m-%d %H:%M:%S %:z"),
            self.kind().label(),
            self.text
        )
    }
}
