//! The record shape delivered by the agent event stream.
//!
//! ```json
//! {"event": "message_chunk",
//!  "data": {"conversationId": "c", "threadId": "t", "taskId": "k",
//!           "itemId": "i", "payload": {"content": "Hello"}}}
//! ```
//!
//! Field names are camelCase; the snake_case spelling used by the Python
//! backend (`conversation_id`, …) is accepted as an alias. The event name is
//! kept as a raw string so unknown kinds never fail deserialization.

use quill_core::{ComponentType, ConversationId, ItemId, TaskId, ThreadId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kind::EventKind;

/// One agent stream record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Raw event kind string.
    pub event: String,
    /// Addressing and payload.
    pub data: EventData,
}

impl StreamEvent {
    /// Build an event of a known kind.
    pub fn new(kind: EventKind, data: EventData) -> Self {
        Self {
            event: kind.as_str().to_owned(),
            data,
        }
    }

    /// The parsed kind, `None` when this build does not know it.
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::parse(&self.event)
    }
}

fn empty<T: From<&'static str>>() -> T {
    T::from("")
}

/// Addressing and payload of a stream record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    /// Owning conversation.
    #[serde(alias = "conversation_id")]
    pub conversation_id: ConversationId,
    /// Owning thread (empty when the backend omits it).
    #[serde(alias = "thread_id", default = "empty")]
    pub thread_id: ThreadId,
    /// Owning task (empty when the backend omits it).
    #[serde(alias = "task_id", default = "empty")]
    pub task_id: TaskId,
    /// Item identity within the task.
    #[serde(alias = "item_id", default = "empty")]
    pub item_id: ItemId,
    /// Event payload, at minimum `{content}` for displayable kinds.
    #[serde(default)]
    pub payload: Value,
    /// Component type, when sent alongside the payload.
    #[serde(
        alias = "component_type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub component_type: Option<ComponentType>,
    /// Agent that produced the event.
    #[serde(alias = "agent_name", default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    /// Speaker role (`user`, `agent`, `system`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Display metadata kept alongside the payload (`task_title` for
    /// scheduled task components).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl EventData {
    /// Address an item with an empty payload.
    pub fn new(
        conversation_id: impl Into<ConversationId>,
        thread_id: impl Into<ThreadId>,
        task_id: impl Into<TaskId>,
        item_id: impl Into<ItemId>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            thread_id: thread_id.into(),
            task_id: task_id.into(),
            item_id: item_id.into(),
            payload: Value::Null,
            component_type: None,
            agent_name: None,
            role: None,
            metadata: None,
        }
    }

    /// Replace the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Set the payload to `{content}`.
    #[must_use]
    pub fn with_content(self, content: &str) -> Self {
        self.with_payload(serde_json::json!({ "content": content }))
    }

    /// Set the component type.
    #[must_use]
    pub fn with_component_type(mut self, component_type: ComponentType) -> Self {
        self.component_type = Some(component_type);
        self
    }

    /// Set the producing agent.
    #[must_use]
    pub fn with_agent_name(mut self, agent_name: &str) -> Self {
        self.agent_name = Some(agent_name.to_owned());
        self
    }

    /// Attach display metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Component type from the envelope, falling back to the payload's
    /// `component_type` / `componentType` field.
    pub fn component_type(&self) -> Option<ComponentType> {
        if let Some(ct) = &self.component_type {
            return Some(ct.clone());
        }
        ["component_type", "componentType"]
            .iter()
            .find_map(|key| self.payload.get(*key).and_then(Value::as_str))
            .map(ComponentType::from)
    }

    /// The payload's textual `content`, if any.
    pub fn content(&self) -> Option<&str> {
        self.payload.get("content").and_then(Value::as_str)
    }
}
