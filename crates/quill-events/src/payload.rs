//! Typed codecs for item content.
//!
//! `reasoning` and `tool_call` items store a JSON object serialized into the
//! `content` string of their payload. This module is the only place that
//! knows about that encoding: the view engine calls [`ReasoningContent::parse`]
//! and [`ReasoningContent::encode`], and consumers call [`ItemContent::decode`].

use quill_core::ComponentType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PayloadError;

/// Decoded content of a `reasoning` item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningContent {
    /// Accumulated reasoning text.
    pub content: String,
    /// Whether the reasoning block has closed.
    pub is_complete: bool,
}

impl ReasoningContent {
    /// An open reasoning block.
    pub fn pending(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_complete: false,
        }
    }

    /// A closed reasoning block.
    pub fn completed(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_complete: true,
        }
    }

    /// Parse `{content, isComplete}` from an item content string.
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Encode back into an item content string.
    pub fn encode(&self) -> String {
        serde_json::json!({
            "content": self.content,
            "isComplete": self.is_complete,
        })
        .to_string()
    }
}

/// Decoded content of a `tool_call` item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallContent {
    /// Backend-assigned call id.
    pub tool_call_id: String,
    /// Tool name.
    pub tool_name: String,
    /// Raw result, absent while the call is running.
    #[serde(default)]
    pub tool_result: Option<String>,
}

/// One displayable entry of a tool result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultEntry {
    /// Entry text.
    pub content: String,
}

impl ToolCallContent {
    /// Parse from an item content string.
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Whether the call has produced a result.
    pub fn is_finished(&self) -> bool {
        self.tool_result.is_some()
    }

    /// Result normalized into display entries. Empty while running.
    pub fn result_entries(&self) -> Vec<ToolResultEntry> {
        let Some(raw) = self.tool_result.as_deref().filter(|r| !r.is_empty()) else {
            return Vec::new();
        };
        let formatted = format_tool_result(raw);
        serde_json::from_str::<Vec<ToolResultEntry>>(&formatted).unwrap_or_else(|_| {
            vec![ToolResultEntry {
                content: raw.to_owned(),
            }]
        })
    }
}

/// Normalize a tool result string into a JSON array of `{content}` entries.
///
/// Empty input stays empty. A JSON array whose first element is an object
/// with a `content` key is returned verbatim. Anything else is wrapped as
/// `[{"content": raw}]`.
pub fn format_tool_result(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) {
        if items
            .first()
            .and_then(Value::as_object)
            .is_some_and(|obj| obj.contains_key("content"))
        {
            return raw.to_owned();
        }
    }
    serde_json::json!([{ "content": raw }]).to_string()
}

/// Content of an item decoded according to its component type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemContent {
    /// No content yet.
    Empty,
    /// Plain text (markdown and every opaque component type).
    Text(String),
    /// Reasoning block.
    Reasoning(ReasoningContent),
    /// Tool call record.
    ToolCall(ToolCallContent),
}

impl ItemContent {
    /// Decode `content` for the given component type.
    pub fn decode(component_type: &ComponentType, content: Option<&str>) -> Result<Self, PayloadError> {
        let Some(raw) = content else {
            return Ok(Self::Empty);
        };
        match component_type {
            ComponentType::Reasoning => ReasoningContent::parse(raw).map(Self::Reasoning),
            ComponentType::ToolCall => ToolCallContent::parse(raw).map(Self::ToolCall),
            _ => Ok(Self::Text(raw.to_owned())),
        }
    }

    /// Text a plain renderer would show.
    pub fn display_text(&self) -> Option<&str> {
        match self {
            Self::Empty | Self::ToolCall(_) => None,
            Self::Text(text) => Some(text),
            Self::Reasoning(r) => Some(&r.content),
        }
    }
}
