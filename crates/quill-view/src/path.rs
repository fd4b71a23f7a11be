//! Path resolver: create conversation → thread → task entries on first
//! reference.
//!
//! Each helper returns the innermost level mutably. Entries that already
//! exist are reused; an `Arc` shared with an older snapshot is cloned before
//! it is handed out, so resolving a path never mutates a previous snapshot.

use std::sync::Arc;

use quill_core::{ConversationId, TaskId, ThreadId};

use crate::model::{ConversationView, TaskView, ThreadView, ViewStore};

/// Ensure the conversation exists.
pub fn ensure_conversation<'a>(
    store: &'a mut ViewStore,
    conversation_id: &ConversationId,
) -> &'a mut ConversationView {
    Arc::make_mut(
        store
            .conversations
            .entry(conversation_id.clone())
            .or_default(),
    )
}

/// Ensure the thread exists within a conversation.
pub fn ensure_thread<'a>(
    conversation: &'a mut ConversationView,
    thread_id: &ThreadId,
) -> &'a mut ThreadView {
    Arc::make_mut(conversation.threads.entry(thread_id.clone()).or_default())
}

/// Ensure the full conversation → thread → task path and return the task.
pub fn ensure_path<'a>(
    store: &'a mut ViewStore,
    conversation_id: &ConversationId,
    thread_id: &ThreadId,
    task_id: &TaskId,
) -> &'a mut TaskView {
    let conversation = ensure_conversation(store, conversation_id);
    let thread = ensure_thread(conversation, thread_id);
    Arc::make_mut(thread.tasks.entry(task_id.clone()).or_default())
}
