//! Shared handle over the current snapshot.
//!
//! Readers take an `Arc<ViewStore>` and keep it as long as they like. Writers
//! are serialized by a mutex, so a live event and a replay can never both
//! start from the same snapshot and silently drop one another's work.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use quill_core::ConversationId;
use quill_events::StreamEvent;
use thiserror::Error;
use tracing::warn;

use crate::dispatch::Dispatcher;
use crate::model::ViewStore;

/// A replay was computed against a revision that has since moved on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("conversation {conversation_id} is at revision {actual}, expected {expected}")]
pub struct StaleRevision {
    /// Conversation being replayed.
    pub conversation_id: ConversationId,
    /// Revision the caller observed.
    pub expected: u64,
    /// Revision found at commit time.
    pub actual: u64,
}

/// Single-writer, many-reader access to the view model.
#[derive(Debug, Default)]
pub struct ViewHandle {
    dispatcher: Dispatcher,
    current: RwLock<Arc<ViewStore>>,
    writer: Mutex<()>,
}

impl ViewHandle {
    /// Empty view driven by `dispatcher`.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            current: RwLock::new(Arc::new(ViewStore::new())),
            writer: Mutex::new(()),
        }
    }

    /// The dispatcher in use.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<ViewStore> {
        Arc::clone(&self.current.read())
    }

    /// Current revision of a conversation (0 if unknown).
    pub fn revision(&self, conversation_id: &str) -> u64 {
        self.current
            .read()
            .conversation(conversation_id)
            .map_or(0, |conv| conv.revision())
    }

    /// Apply one live event and publish the result.
    pub fn apply(&self, event: &StreamEvent) -> Arc<ViewStore> {
        let _writer = self.writer.lock();
        let base = self.snapshot();
        let mut next = (*base).clone();
        if !self.dispatcher.apply_in_place(&mut next, event) {
            return base;
        }
        self.publish(next)
    }

    /// Replay history unconditionally and publish the result.
    pub fn replay(
        &self,
        conversation_id: &ConversationId,
        events: &[StreamEvent],
        clear_history: bool,
    ) -> Arc<ViewStore> {
        let _writer = self.writer.lock();
        let next = self
            .dispatcher
            .replay(&self.snapshot(), conversation_id, events, clear_history);
        self.publish(next)
    }

    /// Replay history only if the conversation is still at `expected`.
    ///
    /// Callers read [`ViewHandle::revision`] before fetching history; if live
    /// events landed in the meantime the replay is rejected and can be retried.
    pub fn replay_if_unchanged(
        &self,
        conversation_id: &ConversationId,
        expected: u64,
        events: &[StreamEvent],
        clear_history: bool,
    ) -> Result<Arc<ViewStore>, StaleRevision> {
        let _writer = self.writer.lock();
        let base = self.snapshot();
        let actual = base
            .conversation(conversation_id.as_str())
            .map_or(0, |conv| conv.revision());
        if actual != expected {
            warn!(conversation_id = %conversation_id, expected, actual, "rejecting stale replay");
            return Err(StaleRevision {
                conversation_id: conversation_id.clone(),
                expected,
                actual,
            });
        }
        let next = self
            .dispatcher
            .replay(&base, conversation_id, events, clear_history);
        Ok(self.publish(next))
    }

    fn publish(&self, next: ViewStore) -> Arc<ViewStore> {
        let next = Arc::new(next);
        *self.current.write() = Arc::clone(&next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use quill_events::{EventData, EventKind};

    fn message(item: &str) -> StreamEvent {
        StreamEvent::new(
            EventKind::Message,
            EventData::new("c", "t", "k", item).with_content("x"),
        )
    }

    #[test]
    fn ignored_event_keeps_snapshot_identity() {
        let handle = ViewHandle::default();
        let before = handle.apply(&message("a"));
        let done = StreamEvent::new(EventKind::Done, EventData::new("c", "t", "k", "a"));
        let after = handle.apply(&done);
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn held_snapshot_survives_later_writes() {
        let handle = ViewHandle::default();
        let _ = handle.apply(&message("a"));
        let held = handle.snapshot();
        let _ = handle.apply(&message("b"));
        assert_eq!(held.thread_task("c", "t", "k").unwrap().len(), 1);
        assert_eq!(handle.snapshot().thread_task("c", "t", "k").unwrap().len(), 2);
    }

    #[test]
    fn stale_replay_is_rejected() {
        let handle = ViewHandle::default();
        let conv = ConversationId::from("c");
        let observed = handle.revision("c");
        let _ = handle.apply(&message("live"));

        let result = handle.replay_if_unchanged(&conv, observed, &[message("old")], true);
        assert_matches!(result, Err(StaleRevision { expected: 0, actual: 1, .. }));
        assert!(handle.snapshot().thread_task("c", "t", "k").unwrap().item("live").is_some());
    }

    #[test]
    fn fresh_replay_is_committed() {
        let handle = ViewHandle::default();
        let conv = ConversationId::from("c");
        let observed = handle.revision("c");
        let store = handle
            .replay_if_unchanged(&conv, observed, &[message("old")], true)
            .unwrap();
        assert!(Arc::ptr_eq(&store, &handle.snapshot()));
        assert!(handle.revision("c") > observed);
    }

    #[test]
    fn stale_revision_message() {
        let err = StaleRevision {
            conversation_id: ConversationId::from("c"),
            expected: 1,
            actual: 3,
        };
        assert_eq!(err.to_string(), "conversation c is at revision 3, expected 1");
    }
}
