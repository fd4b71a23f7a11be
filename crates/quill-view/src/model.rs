//! View model types.
//!
//! Every level below [`ViewStore`] is held behind an `Arc`. A transition
//! clones the store (a map of `Arc`s) and calls [`Arc::make_mut`] only along
//! the path it touches, so untouched conversations, threads, and tasks keep
//! their pointer identity and earlier snapshots are never mutated. Consumers
//! can compare subtrees with [`Arc::ptr_eq`] to detect change.
//!
//! Maps are `BTreeMap`s so that serialized snapshots are deterministic.

use std::collections::BTreeMap;
use std::sync::Arc;

use quill_core::{ComponentType, ConversationId, ItemId, TaskId, ThreadId};
use quill_events::{ItemContent, PayloadError, ReasoningContent};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root snapshot: conversation id → conversation view.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewStore {
    pub(crate) conversations: BTreeMap<ConversationId, Arc<ConversationView>>,
}

impl ViewStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a conversation.
    pub fn conversation(&self, id: &str) -> Option<&Arc<ConversationView>> {
        self.conversations.get(id)
    }

    /// Iterate over all conversations.
    pub fn conversations(&self) -> impl Iterator<Item = (&ConversationId, &Arc<ConversationView>)> {
        self.conversations.iter()
    }

    /// Thread-owned task at (conversation, thread, task).
    pub fn thread_task(&self, conversation: &str, thread: &str, task: &str) -> Option<&TaskView> {
        self.conversation(conversation)?.thread(thread)?.task(task)
    }

    /// Section-owned task at (conversation, component type, task).
    pub fn section_task(
        &self,
        conversation: &str,
        component_type: &ComponentType,
        task: &str,
    ) -> Option<&TaskView> {
        self.conversation(conversation)?
            .section(component_type)?
            .task(task)
    }

    /// Whether the store holds no conversations.
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

/// One conversation: threads plus conversation-wide sections.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationView {
    pub(crate) threads: BTreeMap<ThreadId, Arc<ThreadView>>,
    pub(crate) sections: BTreeMap<ComponentType, Arc<SectionView>>,
    /// Bumped on every applied event and every replay.
    pub(crate) revision: u64,
}

impl ConversationView {
    /// Look up a thread.
    pub fn thread(&self, id: &str) -> Option<&Arc<ThreadView>> {
        self.threads.get(id)
    }

    /// Iterate over threads.
    pub fn threads(&self) -> impl Iterator<Item = (&ThreadId, &Arc<ThreadView>)> {
        self.threads.iter()
    }

    /// Look up the section for a component type.
    pub fn section(&self, component_type: &ComponentType) -> Option<&Arc<SectionView>> {
        self.sections.get(component_type)
    }

    /// Iterate over sections.
    pub fn sections(&self) -> impl Iterator<Item = (&ComponentType, &Arc<SectionView>)> {
        self.sections.iter()
    }

    /// Monotonic change counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Tasks of one thread.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadView {
    pub(crate) tasks: BTreeMap<TaskId, Arc<TaskView>>,
}

impl ThreadView {
    /// Look up a task.
    pub fn task(&self, id: &str) -> Option<&TaskView> {
        self.tasks.get(id).map(|task| &**task)
    }

    /// Iterate over tasks.
    pub fn tasks(&self) -> impl Iterator<Item = (&TaskId, &Arc<TaskView>)> {
        self.tasks.iter()
    }
}

/// Tasks of one component type across a whole conversation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionView {
    pub(crate) tasks: BTreeMap<TaskId, Arc<TaskView>>,
}

impl SectionView {
    /// Look up a task.
    pub fn task(&self, id: &str) -> Option<&TaskView> {
        self.tasks.get(id).map(|task| &**task)
    }

    /// Iterate over tasks.
    pub fn tasks(&self) -> impl Iterator<Item = (&TaskId, &Arc<TaskView>)> {
        self.tasks.iter()
    }
}

/// Ordered items of one task.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskView {
    pub(crate) items: Vec<Item>,
}

impl TaskView {
    /// Items in arrival order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Look up an item by id.
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|it| it.item_id.as_str() == id)
    }

    /// Index of an item by id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|it| it.item_id.as_str() == id)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the task has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One displayable unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Identity within the owning task.
    pub item_id: ItemId,
    /// Owning task.
    pub task_id: TaskId,
    /// Owning thread (kept for section items too).
    pub thread_id: ThreadId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Rendering tag.
    pub component_type: ComponentType,
    /// Producing agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    /// Display metadata from the event (scheduled task titles).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    /// Content and extra payload fields.
    pub payload: ItemPayload,
}

impl Item {
    /// Raw content string.
    pub fn content(&self) -> Option<&str> {
        self.payload.content.as_deref()
    }

    /// Content decoded according to the component type.
    pub fn decode(&self) -> Result<ItemContent, PayloadError> {
        ItemContent::decode(&self.component_type, self.content())
    }

    /// Reasoning state, if this is a well-formed reasoning item.
    pub fn reasoning(&self) -> Option<ReasoningContent> {
        if self.component_type != ComponentType::Reasoning {
            return None;
        }
        ReasoningContent::parse(self.content()?).ok()
    }
}

/// Item payload: `content` plus any other fields the producer sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPayload {
    /// Textual content (JSON-encoded for reasoning and tool calls).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Remaining payload fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemPayload {
    /// Payload with only a content string.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            extra: Map::new(),
        }
    }

    /// Split a wire payload into content and extra fields.
    ///
    /// A bare JSON string becomes the content; a non-string `content` field
    /// stays among the extras.
    pub fn from_wire(payload: &Value) -> Self {
        match payload {
            Value::Object(map) => {
                let mut extra = map.clone();
                let content = match extra.remove("content") {
                    Some(Value::String(s)) => Some(s),
                    Some(other) => {
                        let _ = extra.insert("content".to_owned(), other);
                        None
                    }
                    None => None,
                };
                Self { content, extra }
            }
            Value::String(s) => Self::text(s.clone()),
            _ => Self::default(),
        }
    }
}
