//! Item merge engine.
//!
//! [`merge_item`] folds one incoming item into a task's ordered item list.
//! An item id seen for the first time is appended; otherwise the strategy
//! decides how the existing entry changes. Positions never move.

use quill_events::{PayloadError, ReasoningContent};

use crate::model::{Item, ItemPayload, TaskView};
use crate::telemetry;

/// How an incoming item combines with an existing one of the same id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Concatenate textual content (streaming text deltas).
    Append,
    /// Overwrite the existing item.
    Replace,
    /// Concatenate the `content` of two JSON reasoning payloads; the incoming
    /// `isComplete` wins.
    AppendReasoning,
}

/// What [`merge_item`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No item with this id existed; it was pushed to the end.
    Appended,
    /// The existing item was overwritten at its position.
    Replaced,
    /// Content was concatenated onto the existing item.
    Concatenated,
    /// Reasoning payloads failed to decode; the item was replaced instead.
    ReasoningFallback,
}

/// Merge `item` into `task` using `strategy`.
pub fn merge_item(task: &mut TaskView, item: Item, strategy: MergeStrategy) -> MergeOutcome {
    let Some(index) = task.position(item.item_id.as_str()) else {
        task.items.push(item);
        return MergeOutcome::Appended;
    };
    let existing = &mut task.items[index];

    match strategy {
        MergeStrategy::Replace => {
            *existing = item;
            MergeOutcome::Replaced
        }
        MergeStrategy::Append => append_text(existing, item),
        MergeStrategy::AppendReasoning => append_reasoning(existing, item),
    }
}

fn append_text(existing: &mut Item, incoming: Item) -> MergeOutcome {
    if existing.payload.content.is_none() || incoming.payload.content.is_none() {
        *existing = incoming;
        return MergeOutcome::Replaced;
    }

    let Item {
        payload: ItemPayload { content, extra },
        metadata,
        ..
    } = incoming;
    if let (Some(old), Some(new)) = (existing.payload.content.as_mut(), content) {
        old.push_str(&new);
    }
    existing.payload.extra.extend(extra);
    if metadata.is_some() {
        existing.metadata = metadata;
    }
    MergeOutcome::Concatenated
}

fn append_reasoning(existing: &mut Item, incoming: Item) -> MergeOutcome {
    let old = existing
        .content()
        .ok_or(PayloadError::MissingContent)
        .and_then(ReasoningContent::parse);
    let new = incoming
        .content()
        .ok_or(PayloadError::MissingContent)
        .and_then(ReasoningContent::parse);

    match (old, new) {
        (Ok(mut merged), Ok(delta)) => {
            merged.content.push_str(&delta.content);
            merged.is_complete = delta.is_complete;
            existing.payload.content = Some(merged.encode());
            MergeOutcome::Concatenated
        }
        (Err(error), _) | (_, Err(error)) => {
            telemetry::payload_fallback("append_reasoning", &incoming.item_id, &error);
            *existing = incoming;
            MergeOutcome::ReasoningFallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use quill_core::logging::capture_logs;
    use quill_core::{ComponentType, ConversationId, ItemId, TaskId, ThreadId};

    fn item(id: &str, ct: ComponentType, content: &str) -> Item {
        Item {
            item_id: ItemId::from(id),
            task_id: TaskId::from("k"),
            thread_id: ThreadId::from("t"),
            conversation_id: ConversationId::from("c"),
            component_type: ct,
            agent_name: None,
            metadata: None,
            payload: ItemPayload::text(content),
        }
    }

    fn md(id: &str, content: &str) -> Item {
        item(id, ComponentType::Markdown, content)
    }

    fn reasoning(id: &str, content: &str, done: bool) -> Item {
        let rc = ReasoningContent {
            content: content.into(),
            is_complete: done,
        };
        item(id, ComponentType::Reasoning, &rc.encode())
    }

    fn contents(task: &TaskView) -> Vec<&str> {
        task.items().iter().filter_map(Item::content).collect()
    }

    #[test]
    fn new_id_is_appended_in_arrival_order() {
        let mut task = TaskView::default();
        assert_eq!(merge_item(&mut task, md("a", "A"), MergeStrategy::Replace), MergeOutcome::Appended);
        assert_eq!(merge_item(&mut task, md("b", "B"), MergeStrategy::Append), MergeOutcome::Appended);
        assert_eq!(contents(&task), ["A", "B"]);
    }

    #[test]
    fn append_concatenates_text() {
        let mut task = TaskView::default();
        let _ = merge_item(&mut task, md("x", "Hello"), MergeStrategy::Append);
        let outcome = merge_item(&mut task, md("x", " world"), MergeStrategy::Append);
        assert_eq!(outcome, MergeOutcome::Concatenated);
        assert_eq!(contents(&task), ["Hello world"]);
    }

    #[test]
    fn append_without_existing_text_replaces() {
        let mut task = TaskView::default();
        let mut empty = md("x", "");
        empty.payload.content = None;
        let _ = merge_item(&mut task, empty, MergeStrategy::Append);
        let outcome = merge_item(&mut task, md("x", "late"), MergeStrategy::Append);
        assert_eq!(outcome, MergeOutcome::Replaced);
        assert_eq!(contents(&task), ["late"]);
    }

    #[test]
    fn append_merges_extra_fields() {
        let mut task = TaskView::default();
        let mut first = md("x", "a");
        let _ = first.payload.extra.insert("tone".into(), "calm".into());
        let mut second = md("x", "b");
        let _ = second.payload.extra.insert("lang".into(), "en".into());
        let _ = merge_item(&mut task, first, MergeStrategy::Append);
        let _ = merge_item(&mut task, second, MergeStrategy::Append);

        let merged = &task.items()[0].payload;
        assert_eq!(merged.extra.len(), 2);
    }

    #[test]
    fn append_takes_latest_metadata() {
        let mut task = TaskView::default();
        let mut first = md("x", "a");
        first.metadata = Some(serde_json::Map::from_iter([("task_title".into(), "Draft".into())]));
        let _ = merge_item(&mut task, first, MergeStrategy::Append);
        let _ = merge_item(&mut task, md("x", "b"), MergeStrategy::Append);
        assert_eq!(task.items()[0].metadata.as_ref().unwrap()["task_title"], "Draft");

        let mut third = md("x", "c");
        third.metadata = Some(serde_json::Map::from_iter([("task_title".into(), "Final".into())]));
        let _ = merge_item(&mut task, third, MergeStrategy::Append);
        assert_eq!(task.items()[0].metadata.as_ref().unwrap()["task_title"], "Final");
        assert_eq!(contents(&task), ["abc"]);
    }

    #[test]
    fn replace_preserves_position() {
        let mut task = TaskView::default();
        for (id, c) in [("a", "A"), ("b", "B"), ("c", "C")] {
            let _ = merge_item(&mut task, md(id, c), MergeStrategy::Append);
        }
        let outcome = merge_item(&mut task, md("b", "B'"), MergeStrategy::Replace);
        assert_eq!(outcome, MergeOutcome::Replaced);
        assert_eq!(contents(&task), ["A", "B'", "C"]);
    }

    #[test]
    fn append_reasoning_concatenates_and_takes_latest_flag() {
        let mut task = TaskView::default();
        let _ = merge_item(&mut task, reasoning("r", "Thinking", false), MergeStrategy::AppendReasoning);
        let _ = merge_item(&mut task, reasoning("r", " more", true), MergeStrategy::AppendReasoning);
        let outcome = merge_item(&mut task, reasoning("r", "!", false), MergeStrategy::AppendReasoning);

        assert_eq!(outcome, MergeOutcome::Concatenated);
        assert_eq!(
            task.items()[0].reasoning(),
            Some(ReasoningContent::pending("Thinking more!"))
        );
    }

    #[test]
    fn append_reasoning_falls_back_to_replace() {
        let (logs, _guard) = capture_logs();
        let mut task = TaskView::default();
        let _ = merge_item(&mut task, item("r", ComponentType::Reasoning, "raw text"), MergeStrategy::Replace);

        let outcome = merge_item(&mut task, reasoning("r", "clean", false), MergeStrategy::AppendReasoning);

        assert_eq!(outcome, MergeOutcome::ReasoningFallback);
        assert_eq!(task.len(), 1);
        assert_matches!(task.items()[0].reasoning(), Some(r) if r.content == "clean");
        assert!(logs.has_event(tracing::Level::WARN, "payload decode failed"));
    }

    proptest! {
        #[test]
        fn streamed_chunks_concatenate(chunks in proptest::collection::vec(".{0,8}", 1..16)) {
            let mut task = TaskView::default();
            for chunk in &chunks {
                let _ = merge_item(&mut task, md("x", chunk), MergeStrategy::Append);
            }
            let expected = chunks.concat();
            prop_assert_eq!(task.len(), 1);
            prop_assert_eq!(task.items()[0].content(), Some(expected.as_str()));
        }

        #[test]
        fn item_ids_stay_unique(ids in proptest::collection::vec("[a-d]", 1..32)) {
            let mut task = TaskView::default();
            for (n, id) in ids.iter().enumerate() {
                let strategy = match n % 3 {
                    0 => MergeStrategy::Append,
                    1 => MergeStrategy::Replace,
                    _ => MergeStrategy::AppendReasoning,
                };
                let _ = merge_item(&mut task, reasoning(id, "x", false), strategy);
            }
            let mut seen: Vec<&str> = task.items().iter().map(|i| i.item_id.as_str()).collect();
            let total = seen.len();
            seen.sort_unstable();
            seen.dedup();
            prop_assert_eq!(seen.len(), total);
        }
    }
}
