use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use super::{AnalysisEngine, EngineError};
use crate::channel::MessageSender;
use crate::message::{Finding, Message, MessageKind, Payload};

/// One line of an event log.
///
/// ```json
/// {"kind": "GpoResult", "text": "Default Domain Policy", "payload": {"Name": "..."}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub kind: MessageKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl EventRecord {
    fn into_message(self, line: usize) -> Result<Message, EngineError> {
        let kind = self.kind;
        let payload = Payload::from_kind(kind, self.payload.map(Finding::new))
            .ok_or(EngineError::MissingPayload { line, kind })?;
        Ok(match self.timestamp {
            Some(at) => Message::at(at, payload, self.text),
            None => Message::new(payload, self.text),
        })
    }
}

/// Replays a newline-delimited JSON event log as if it were a live analysis.
///
/// Blank lines are skipped. Replay stops after the first terminal record; a
/// log that ends without one gets a `Finish` message appended.
pub struct ReplayEngine<R> {
    source: R,
    origin: String,
}

impl ReplayEngine<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open event log {}", path.display()))?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl ReplayEngine<BufReader<io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()), "<stdin>")
    }
}

impl<R: BufRead> ReplayEngine<R> {
    pub fn new(source: R, origin: impl Into<String>) -> Self {
        Self {
            source,
            origin: origin.into(),
        }
    }
}

impl<R: BufRead + Send + 'static> AnalysisEngine for ReplayEngine<R> {
    fn execute(&mut self, sender: &MessageSender) -> Result<()> {
        tracing::info!(origin = %self.origin, "replaying event log");
        let mut replayed = 0;

        for (index, line) in (&mut self.source).lines().enumerate() {
            let line_number = index + 1;
            let line = line.with_context(|| format!("Failed to read {} line {}", self.origin, line_number))?;
            if line.trim().is_empty() {
                continue;
            }

            let record: EventRecord = serde_json::from_str(&line)
                .map_err(|source| EngineError::MalformedRecord { line: line_number, source })?;
            let message = record.into_message(line_number)?;
            let terminal = message.is_terminal();

            sender.enqueue(message);
            replayed += 1;

            if terminal {
                tracing::debug!(replayed, "terminal record reached");
                return Ok(());
            }
        }

        tracing::debug!(replayed, "event log ended without a terminal record");
        sender.finish(format!("Replay of {} complete", self.origin));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel;
    use std::io::Cursor;

    fn replay(log: &str) -> (Result<()>, Vec<Message>) {
        let (tx, rx) = channel::unbounded();
        let mut engine = ReplayEngine::new(Cursor::new(log.to_string()), "test");
        let result = engine.execute(&tx);
        drop(tx);
        (result, rx.drain().collect())
    }

    #[test]
    fn test_replays_records_in_order() {
        let log = r#"
{"kind": "Info", "text": "starting"}
{"kind": "GpoResult", "text": "gpo", "payload": {"Name": "Baseline"}}

{"kind": "Finish", "text": "done", "timestamp": "2024-03-01T12:00:00Z"}
"#;
        let (result, messages) = replay(log);
        result.unwrap();

        let kinds: Vec<MessageKind> = messages.iter().map(|m| m.kind()).collect();
        assert_eq!(kinds, vec![MessageKind::Info, MessageKind::GpoResult, MessageKind::Finish]);
        assert_eq!(messages[2].timestamp(), "2024-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_appends_finish_when_missing() {
        let (result, messages) = replay(r#"{"kind": "Error", "text": "oops"}"#);
        result.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].kind(), MessageKind::Finish);
    }

    #[test]
    fn test_stops_after_first_terminal() {
        let log = "{\"kind\": \"Fatal\", \"text\": \"dead\"}\n{\"kind\": \"Info\", \"text\": \"ghost\"}\n";
        let (result, messages) = replay(log);
        result.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind(), MessageKind::Fatal);
    }

    #[test]
    fn test_malformed_line_is_a_fault() {
        let log = "{\"kind\": \"Info\", \"text\": \"ok\"}\nnot json\n";
        let (result, messages) = replay(log);

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::MalformedRecord { line: 2, .. })
        ));
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_result_without_payload_is_a_fault() {
        let (result, _) = replay(r#"{"kind": "FileResult", "text": "no payload"}"#);
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "FileResult record on line 1 has no payload");
    }
}
