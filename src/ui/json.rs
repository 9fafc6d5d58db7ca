//! JSON-lines sink: one serialized signal per line, for machine consumers.

use crate::events::{ProgressEvent, ProgressSink};
use std::io::Write;

pub struct JsonLines<W: Write> {
    out: W,
}

impl<W: Write> JsonLines<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ProgressSink for JsonLines<W> {
    fn emit(&mut self, event: &ProgressEvent) {
        match serde_json::to_string(event) {
            Ok(line) => {
                if let Err(err) = writeln!(self.out, "{line}") {
                    tracing::warn!(%err, "failed to write progress event");
                }
            }
            Err(err) => tracing::warn!(%err, "failed to serialize progress event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BuildSummary;

    #[test]
    fn test_each_event_is_one_json_line() {
        let mut sink = JsonLines::new(Vec::new());
        sink.emit(&ProgressEvent::Finished {
            summary: BuildSummary::empty(),
        });
        sink.emit(&ProgressEvent::Finished {
            summary: BuildSummary::empty(),
        });

        let text = String::from_utf8(sink.out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["type"], "finished");
        }
    }
}
