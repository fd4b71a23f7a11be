//! Batch replay of a conversation's history.
//!
//! Replay folds every event into one working copy and publishes a single new
//! snapshot. Afterwards no thread-owned reasoning item may still read as
//! in progress: history is over, so every spinner must stop.

use std::collections::BTreeMap;
use std::sync::Arc;

use metrics::counter;
use quill_core::{ComponentType, ConversationId, TaskId};
use quill_events::StreamEvent;
use tracing::{debug, info_span};

use crate::dispatch::{Dispatcher, force_complete};
use crate::model::{Item, TaskView, ViewStore};
use crate::path::ensure_conversation;
use crate::telemetry::REPLAYS_TOTAL;

impl Dispatcher {
    /// Replay `events` for `conversation_id` as one transaction.
    ///
    /// With `clear_history` the conversation's previous view is discarded
    /// first. Events addressed to other conversations are applied as usual,
    /// but only the target conversation has its reasoning items completed.
    /// Section-owned reasoning is completed only when the dispatcher was
    /// built with [`Dispatcher::with_section_completion`].
    pub fn replay(
        &self,
        store: &ViewStore,
        conversation_id: &ConversationId,
        events: &[StreamEvent],
        clear_history: bool,
    ) -> ViewStore {
        let _span = info_span!(
            "replay",
            conversation_id = %conversation_id,
            events = events.len(),
            clear_history,
        )
        .entered();

        let mut next = store.clone();
        let previous = next
            .conversation(conversation_id.as_str())
            .map_or(0, |conv| conv.revision());
        if clear_history {
            let _ = next.conversations.remove(conversation_id);
        }

        let applied = events
            .iter()
            .filter(|event| self.apply_in_place(&mut next, event))
            .count();

        let conversation = ensure_conversation(&mut next, conversation_id);
        conversation.revision = previous.max(conversation.revision) + 1;

        let mut completed = 0;
        for thread in conversation.threads.values_mut() {
            if thread.tasks.values().any(|task| has_open_reasoning(task)) {
                completed += complete_open_reasoning(&mut Arc::make_mut(thread).tasks);
            }
        }
        if self.completes_section_reasoning() {
            for section in conversation.sections.values_mut() {
                if section.tasks.values().any(|task| has_open_reasoning(task)) {
                    completed += complete_open_reasoning(&mut Arc::make_mut(section).tasks);
                }
            }
        }

        counter!(REPLAYS_TOTAL).increment(1);
        debug!(
            applied,
            ignored = events.len() - applied,
            completed,
            revision = conversation.revision,
            "replay finished"
        );
        next
    }
}

fn is_open_reasoning(item: &Item) -> bool {
    item.component_type == ComponentType::Reasoning
        && item.reasoning().is_none_or(|reasoning| !reasoning.is_complete)
}

fn has_open_reasoning(task: &TaskView) -> bool {
    task.items.iter().any(is_open_reasoning)
}

fn complete_open_reasoning(tasks: &mut BTreeMap<TaskId, Arc<TaskView>>) -> usize {
    let mut completed = 0;
    for task in tasks.values_mut() {
        if !has_open_reasoning(task) {
            continue;
        }
        for item in Arc::make_mut(task)
            .items
            .iter_mut()
            .filter(|item| is_open_reasoning(item))
        {
            force_complete(item, "replay");
            completed += 1;
        }
    }
    completed
}
