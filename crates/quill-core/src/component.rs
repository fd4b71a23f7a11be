//! The [`ComponentType`] tag carried by every view item.
//!
//! The agent backend is free to introduce new component types at any time, so
//! the enum keeps an [`ComponentType::Other`] escape hatch rather than failing
//! to deserialize. Known types serialize to the exact snake_case strings the
//! frontend expects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rendering tag of a view item.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentType {
    /// Plain markdown text (messages, failures, prompts for user input).
    Markdown,
    /// Model reasoning trace, content is JSON `{content, isComplete}`.
    Reasoning,
    /// Tool call record, content is the JSON-encoded tool payload.
    ToolCall,
    /// Result of a scheduled (recurring) task run.
    ScheduledTaskResult,
    /// Controller card for a scheduled task.
    ScheduledTaskController,
    /// Nested sub-agent conversation.
    SubagentConversation,
    /// Any component type not known to this build.
    Other(String),
}

impl ComponentType {
    /// Wire string for this component type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Markdown => "markdown",
            Self::Reasoning => "reasoning",
            Self::ToolCall => "tool_call",
            Self::ScheduledTaskResult => "scheduled_task_result",
            Self::ScheduledTaskController => "scheduled_task_controller",
            Self::SubagentConversation => "subagent_conversation",
            Self::Other(s) => s,
        }
    }

    /// Whether items of this type are rebuilt wholesale on every update
    /// instead of streamed incrementally.
    pub fn replaces_in_place(&self) -> bool {
        matches!(self, Self::ScheduledTaskResult | Self::SubagentConversation)
    }
}

impl From<&str> for ComponentType {
    fn from(s: &str) -> Self {
        match s {
            "markdown" => Self::Markdown,
            "reasoning" => Self::Reasoning,
            "tool_call" => Self::ToolCall,
            "scheduled_task_result" => Self::ScheduledTaskResult,
            "scheduled_task_controller" => Self::ScheduledTaskController,
            "subagent_conversation" => Self::SubagentConversation,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for ComponentType {
    fn from(s: String) -> Self {
        match Self::from(s.as_str()) {
            Self::Other(_) => Self::Other(s),
            known => known,
        }
    }
}

impl From<ComponentType> for String {
    fn from(ct: ComponentType) -> Self {
        match ct {
            ComponentType::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl FromStr for ComponentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
