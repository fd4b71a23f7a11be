//! JSON-lines event log reader.

use std::path::Path;

use anyhow::{Context, Result};
use quill_events::{ConversationRecord, StreamEvent};

/// Shape of each line in an event log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineFormat {
    /// `{event, data}` stream envelopes.
    Stream,
    /// Persisted conversation rows.
    Records,
}

/// Read every non-blank line of `path` as an event.
pub fn read_events(path: &Path, format: LineFormat) -> Result<Vec<StreamEvent>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event log: {}", path.display()))?;
    parse_events(&raw, format).with_context(|| format!("Invalid event log: {}", path.display()))
}

/// Parse JSON-lines text. Blank lines are skipped; any other bad line fails.
pub fn parse_events(raw: &str, format: LineFormat) -> Result<Vec<StreamEvent>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| parse_line(line, format).with_context(|| format!("line {}", n + 1)))
        .collect()
}

fn parse_line(line: &str, format: LineFormat) -> Result<StreamEvent> {
    match format {
        LineFormat::Stream => Ok(serde_json::from_str(line)?),
        LineFormat::Records => {
            let record: ConversationRecord = serde_json::from_str(line)?;
            Ok(record.into_event()?)
        }
    }
}
