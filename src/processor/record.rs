//! JSON record shapes shared by the JSON processors

use anyhow::Result;
use serde_json::{Value, json};

use crate::message::{Message, Payload};
use crate::printer::GpoPrinter;
use crate::shared::json::strip_nulls;

/// Which processor the record is for; the two differ on terminal messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordStyle {
    Aggregate,
    Streaming,
}

/// Renders `message` as one array element, or `None` when it has no element.
///
/// Trace and Debug never produce an element, nor does Finish in streaming
/// style where it only closes the array.
pub(crate) fn render(
    message: &Message,
    printer: &dyn GpoPrinter,
    style: RecordStyle,
) -> Result<Option<Value>> {
    let mut record = match message.payload() {
        Payload::Trace | Payload::Debug => return Ok(None),
        Payload::Info | Payload::Error => base(message),
        Payload::FileResult(finding) => {
            let mut record = base(message);
            record["FileResult"] = finding.as_value().clone();
            record
        }
        Payload::GpoResult(finding) => {
            let rendered = printer.render(finding)?;
            let embedded = match serde_json::from_str::<Value>(&rendered) {
                Ok(value) => value,
                Err(_) => {
                    tracing::debug!(printer = printer.name(), "printer output is not JSON, embedding as text");
                    Value::String(rendered)
                }
            };
            let mut record = base(message);
            record["GpoResult"] = embedded;
            record
        }
        Payload::Fatal => {
            let mut record = base(message);
            if style == RecordStyle::Aggregate {
                record["Error"] = json!("Fatal error occurred");
            }
            record
        }
        Payload::Finish => match style {
            RecordStyle::Aggregate => {
                let mut record = base(message);
                record["Status"] = json!("Completed");
                record
            }
            RecordStyle::Streaming => return Ok(None),
        },
    };

    strip_nulls(&mut record);
    Ok(Some(record))
}

fn base(message: &Message) -> Value {
    json!({
        "Timestamp": message.timestamp(),
        "Type": message.kind().type_name(),
        "Message": message.text(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Finding;
    use crate::printer::{JsonPrinter, NicePrinter};

    #[test]
    fn test_diagnostics_have_no_record() {
        for message in [Message::trace("t"), Message::debug("d")] {
            assert!(render(&message, &JsonPrinter, RecordStyle::Aggregate).unwrap().is_none());
        }
    }

    #[test]
    fn test_info_record_shape() {
        let record = render(&Message::info("scanning SYSVOL"), &JsonPrinter, RecordStyle::Aggregate)
            .unwrap()
            .unwrap();
        assert_eq!(record["Type"], "Info");
        assert_eq!(record["Message"], "scanning SYSVOL");
        assert!(record["Timestamp"].is_string());
    }

    #[test]
    fn test_gpo_result_embedded_as_structure() {
        let finding = Finding::new(json!({"Name": "Baseline", "Version": 3, "Owner": null}));
        let message = Message::gpo_result("gpo", finding);

        let record = render(&message, &JsonPrinter, RecordStyle::Streaming).unwrap().unwrap();
        assert_eq!(record["GpoResult"]["Version"], json!(3));
        assert!(record["GpoResult"].get("Owner").is_none());

        let record = render(&message, &NicePrinter::default(), RecordStyle::Streaming)
            .unwrap()
            .unwrap();
        assert!(record["GpoResult"].as_str().unwrap().starts_with("GPO: Baseline"));
    }

    #[test]
    fn test_file_result_keeps_finding() {
        let finding = Finding::new(json!({"Path": "\\\\corp\\SYSVOL\\Groups.xml", "Cpassword": "j1Uyj3"}));
        let record = render(&Message::file_result("file", finding), &JsonPrinter, RecordStyle::Aggregate)
            .unwrap()
            .unwrap();
        assert_eq!(record["Type"], "FileResult");
        assert_eq!(record["FileResult"]["Cpassword"], "j1Uyj3");
    }

    #[test]
    fn test_terminal_records_differ_by_style() {
        let fatal = Message::fatal("boom");
        let aggregate = render(&fatal, &JsonPrinter, RecordStyle::Aggregate).unwrap().unwrap();
        let streaming = render(&fatal, &JsonPrinter, RecordStyle::Streaming).unwrap().unwrap();
        assert_eq!(aggregate["Error"], "Fatal error occurred");
        assert!(streaming.get("Error").is_none());

        let finish = Message::finish("done");
        let aggregate = render(&finish, &JsonPrinter, RecordStyle::Aggregate).unwrap().unwrap();
        assert_eq!(aggregate["Status"], "Completed");
        assert!(render(&finish, &JsonPrinter, RecordStyle::Streaming).unwrap().is_none());
    }
}
