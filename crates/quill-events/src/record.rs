//! Persisted conversation rows.
//!
//! The storage collaborator keeps one row per emitted item with the payload
//! serialized to a JSON string. Rehydrating a page turns those rows back into
//! [`StreamEvent`]s and replays them. Unlike live dispatch this conversion is
//! strict: a row we cannot interpret is reported, not skipped.

use quill_core::{ConversationId, ItemId, TaskId, ThreadId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::envelope::{EventData, StreamEvent};
use crate::errors::RecordError;
use crate::kind::EventKind;

/// One persisted conversation item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Item id.
    pub item_id: ItemId,
    /// Speaker role.
    pub role: String,
    /// Event kind name.
    pub event: String,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Owning thread.
    #[serde(default)]
    pub thread_id: Option<ThreadId>,
    /// Owning task.
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Payload as a JSON string.
    #[serde(default)]
    pub payload: Option<String>,
    /// Producing agent.
    #[serde(default)]
    pub agent_name: Option<String>,
    /// Display metadata as a JSON object string.
    #[serde(default)]
    pub metadata: Option<String>,
}

impl ConversationRecord {
    /// Convert into a stream event.
    pub fn into_event(self) -> Result<StreamEvent, RecordError> {
        let kind = EventKind::parse(&self.event).ok_or(RecordError::UnknownEvent(self.event))?;
        let payload = match self.payload.as_deref() {
            None | Some("") => Value::Null,
            Some(raw) => serde_json::from_str(raw)?,
        };
        let metadata = match self.metadata.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(
                serde_json::from_str::<Map<String, Value>>(raw).map_err(RecordError::Metadata)?,
            ),
        }
        .filter(|map| !map.is_empty());

        let mut data = EventData::new(
            self.conversation_id,
            self.thread_id.unwrap_or_else(|| ThreadId::from("")),
            self.task_id.unwrap_or_else(|| TaskId::from("")),
            self.item_id,
        )
        .with_payload(payload);
        data.agent_name = self.agent_name;
        data.role = Some(self.role);
        data.metadata = metadata;

        Ok(StreamEvent::new(kind, data))
    }
}
