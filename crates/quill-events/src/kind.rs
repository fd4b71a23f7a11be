//! The [`EventKind`] enum: every agent stream event the view engine knows.
//!
//! Each variant serializes to the exact snake_case string the agent backend
//! emits. The envelope keeps the raw string so that kinds added by a newer
//! backend still deserialize; [`EventKind::parse`] returns `None` for them and
//! the dispatcher drops them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent stream event kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // -- Lifecycle --
    /// Conversation opened. Carries no displayable content.
    ConversationStarted,
    /// Thread opened, usually echoing the user's query.
    ThreadStarted,
    /// Task began executing. Carries no displayable content.
    TaskStarted,
    /// Task finished. Carries no displayable content.
    TaskCompleted,
    /// Task failed with a message.
    TaskFailed,
    /// Planner failed with a message.
    PlanFailed,
    /// Planner needs input from the user.
    PlanRequireUserInput,
    /// Stream finished. Carries no displayable content.
    Done,

    // -- Text --
    /// Streaming text delta.
    MessageChunk,
    /// Complete (non-streamed) message.
    Message,

    // -- Components --
    /// Structured UI component produced by an agent.
    ComponentGenerator,

    // -- Reasoning --
    /// Reasoning block opened.
    ReasoningStarted,
    /// Reasoning text delta.
    Reasoning,
    /// Reasoning block closed.
    ReasoningCompleted,

    // -- Tools --
    /// Tool invocation started.
    ToolCallStarted,
    /// Tool invocation finished with a result.
    ToolCallCompleted,
}

/// All event kinds in definition order.
pub const ALL_EVENT_KINDS: [EventKind; 16] = [
    EventKind::ConversationStarted,
    EventKind::ThreadStarted,
    EventKind::TaskStarted,
    EventKind::TaskCompleted,
    EventKind::TaskFailed,
    EventKind::PlanFailed,
    EventKind::PlanRequireUserInput,
    EventKind::Done,
    EventKind::MessageChunk,
    EventKind::Message,
    EventKind::ComponentGenerator,
    EventKind::ReasoningStarted,
    EventKind::Reasoning,
    EventKind::ReasoningCompleted,
    EventKind::ToolCallStarted,
    EventKind::ToolCallCompleted,
];

impl EventKind {
    /// Wire string for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConversationStarted => "conversation_started",
            Self::ThreadStarted => "thread_started",
            Self::TaskStarted => "task_started",
            Self::TaskCompleted => "task_completed",
            Self::TaskFailed => "task_failed",
            Self::PlanFailed => "plan_failed",
            Self::PlanRequireUserInput => "plan_require_user_input",
            Self::Done => "done",
            Self::MessageChunk => "message_chunk",
            Self::Message => "message",
            Self::ComponentGenerator => "component_generator",
            Self::ReasoningStarted => "reasoning_started",
            Self::Reasoning => "reasoning",
            Self::ReasoningCompleted => "reasoning_completed",
            Self::ToolCallStarted => "tool_call_started",
            Self::ToolCallCompleted => "tool_call_completed",
        }
    }

    /// Look up a kind by its wire string.
    pub fn parse(s: &str) -> Option<Self> {
        ALL_EVENT_KINDS.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn as_str_matches_serde() {
        for kind in ALL_EVENT_KINDS {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn parse_round_trips_every_kind() {
        for kind in ALL_EVENT_KINDS {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn wire_strings_are_unique() {
        let set: HashSet<&str> = ALL_EVENT_KINDS.iter().map(|k| k.as_str()).collect();
        assert_eq!(set.len(), ALL_EVENT_KINDS.len());
    }

    #[test]
    fn unknown_kind_does_not_parse() {
        assert_eq!(EventKind::parse("portfolio_rebalanced"), None);
        assert_eq!(EventKind::parse(""), None);
    }
}
