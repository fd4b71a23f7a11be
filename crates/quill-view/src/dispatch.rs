//! Event dispatcher.
//!
//! [`Dispatcher::plan`] is a pure mapping from one stream event to an
//! [`Action`]: where the item goes, how it merges, and what its payload looks
//! like. [`Dispatcher::apply_event`] executes that plan against a copy of the
//! snapshot.
//!
//! | kind | route | strategy | payload |
//! |---|---|---|---|
//! | `component_generator` (scheduled result / sub-agent) | section | replace | as sent |
//! | `component_generator` (other) | section if section-worthy, else thread | append | as sent |
//! | text and failure kinds | thread | append | forced to markdown |
//! | `reasoning` | routing rule | append-reasoning | `{content, isComplete:false}` |
//! | `reasoning_started` | routing rule | replace | `{content:"", isComplete:false}` |
//! | `reasoning_completed` | existing item only | in place | `isComplete:true` |
//! | `tool_call_*` | routing rule | replace | JSON-encoded payload, forced to `tool_call` |
//! | anything else | dropped | | |

use metrics::counter;
use quill_core::{ComponentType, ConversationId, ItemId, TaskId, ThreadId};
use quill_events::{EventData, EventKind, PayloadError, ReasoningContent, StreamEvent};
use quill_settings::QuillSettings;
use tracing::{debug, trace};

use crate::merge::{MergeStrategy, merge_item};
use crate::model::{Item, ItemPayload, TaskView, ViewStore};
use crate::path::{ensure_conversation, ensure_path};
use crate::section::{SectionPolicy, ensure_section};
use crate::telemetry::{self, EVENTS_APPLIED_TOTAL, EVENTS_IGNORED_TOTAL};

/// Where an item is stored within its conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Thread-owned task.
    Thread {
        /// Owning thread.
        thread_id: ThreadId,
        /// Owning task.
        task_id: TaskId,
    },
    /// Section-owned task.
    Section {
        /// Section key.
        component_type: ComponentType,
        /// Owning task.
        task_id: TaskId,
    },
}

impl Route {
    fn thread(data: &EventData) -> Self {
        Self::Thread {
            thread_id: data.thread_id.clone(),
            task_id: data.task_id.clone(),
        }
    }

    fn section(component_type: ComponentType, data: &EventData) -> Self {
        Self::Section {
            component_type,
            task_id: data.task_id.clone(),
        }
    }
}

/// The dispatch plan for one event.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Merge `item` into the task at `route`.
    Merge {
        /// Target task.
        route: Route,
        /// Merge strategy.
        strategy: MergeStrategy,
        /// Transformed item.
        item: Item,
    },
    /// Mark an existing reasoning item complete.
    CompleteReasoning {
        /// Task holding the item.
        route: Route,
        /// Item to complete.
        item_id: ItemId,
    },
    /// Drop the event.
    Ignore,
}

/// Maps stream events onto view snapshots.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    policy: SectionPolicy,
    complete_section_reasoning: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(SectionPolicy::default())
    }
}

impl Dispatcher {
    /// Dispatcher with the given section policy and default replay behavior.
    pub fn new(policy: SectionPolicy) -> Self {
        Self {
            policy,
            complete_section_reasoning: false,
        }
    }

    /// Dispatcher configured from settings.
    pub fn from_settings(settings: &QuillSettings) -> Self {
        Self::new(SectionPolicy::from_settings(&settings.view))
            .with_section_completion(settings.replay.complete_section_reasoning)
    }

    /// Whether replay also completes section-owned reasoning items.
    #[must_use]
    pub fn with_section_completion(mut self, enabled: bool) -> Self {
        self.complete_section_reasoning = enabled;
        self
    }

    /// The section policy in use.
    pub fn policy(&self) -> &SectionPolicy {
        &self.policy
    }

    pub(crate) fn completes_section_reasoning(&self) -> bool {
        self.complete_section_reasoning
    }

    /// Shared routing rule: section-worthy types go to their section,
    /// everything else to the owning thread.
    pub fn route(&self, component_type: &ComponentType, data: &EventData) -> Route {
        if self.policy.is_section_worthy(component_type) {
            Route::section(component_type.clone(), data)
        } else {
            Route::thread(data)
        }
    }

    /// Plan the effect of one event without touching any snapshot.
    pub fn plan(&self, event: &StreamEvent) -> Action {
        let Some(kind) = event.kind() else {
            return Action::Ignore;
        };
        let data = &event.data;

        match kind {
            EventKind::ComponentGenerator => {
                let component_type = data.component_type().unwrap_or(ComponentType::Markdown);
                let (route, strategy) = if component_type.replaces_in_place() {
                    (
                        Route::section(component_type.clone(), data),
                        MergeStrategy::Replace,
                    )
                } else {
                    (self.route(&component_type, data), MergeStrategy::Append)
                };
                Action::Merge {
                    route,
                    strategy,
                    item: build_item(data, component_type, ItemPayload::from_wire(&data.payload)),
                }
            }
            EventKind::ThreadStarted
            | EventKind::MessageChunk
            | EventKind::Message
            | EventKind::TaskFailed
            | EventKind::PlanFailed
            | EventKind::PlanRequireUserInput => Action::Merge {
                route: Route::thread(data),
                strategy: MergeStrategy::Append,
                item: build_item(
                    data,
                    ComponentType::Markdown,
                    ItemPayload::from_wire(&data.payload),
                ),
            },
            EventKind::Reasoning => {
                let content = ReasoningContent::pending(data.content().unwrap_or_default());
                self.reasoning_merge(data, MergeStrategy::AppendReasoning, &content)
            }
            EventKind::ReasoningStarted => {
                self.reasoning_merge(data, MergeStrategy::Replace, &ReasoningContent::pending(""))
            }
            EventKind::ReasoningCompleted => Action::CompleteReasoning {
                route: self.route(&ComponentType::Reasoning, data),
                item_id: data.item_id.clone(),
            },
            EventKind::ToolCallStarted | EventKind::ToolCallCompleted => Action::Merge {
                route: self.route(&ComponentType::ToolCall, data),
                strategy: MergeStrategy::Replace,
                item: build_item(
                    data,
                    ComponentType::ToolCall,
                    ItemPayload::text(data.payload.to_string()),
                ),
            },
            EventKind::ConversationStarted
            | EventKind::TaskStarted
            | EventKind::TaskCompleted
            | EventKind::Done => Action::Ignore,
        }
    }

    fn reasoning_merge(
        &self,
        data: &EventData,
        strategy: MergeStrategy,
        content: &ReasoningContent,
    ) -> Action {
        Action::Merge {
            route: self.route(&ComponentType::Reasoning, data),
            strategy,
            item: build_item(
                data,
                ComponentType::Reasoning,
                ItemPayload::text(content.encode()),
            ),
        }
    }

    /// Apply one event, returning the next snapshot. `store` is untouched.
    pub fn apply_event(&self, store: &ViewStore, event: &StreamEvent) -> ViewStore {
        let mut next = store.clone();
        let _ = self.apply_in_place(&mut next, event);
        next
    }

    /// Apply one event to a working copy. Returns whether anything changed.
    pub(crate) fn apply_in_place(&self, store: &mut ViewStore, event: &StreamEvent) -> bool {
        let conversation_id = &event.data.conversation_id;

        let changed = match self.plan(event) {
            Action::Merge {
                route,
                strategy,
                item,
            } => {
                let item_id = item.item_id.clone();
                let outcome = merge_item(resolve_mut(store, conversation_id, &route), item, strategy);
                trace!(event = %event.event, item_id = %item_id, ?outcome, "merged item");
                true
            }
            Action::CompleteReasoning { route, item_id } => {
                complete_existing(store, conversation_id, &route, &item_id)
            }
            Action::Ignore => {
                debug!(event = %event.event, "ignoring event");
                counter!(EVENTS_IGNORED_TOTAL).increment(1);
                return false;
            }
        };

        if changed {
            ensure_conversation(store, conversation_id).revision += 1;
            if let Some(kind) = event.kind() {
                counter!(EVENTS_APPLIED_TOTAL, "kind" => kind.as_str()).increment(1);
            }
        }
        changed
    }
}

fn build_item(data: &EventData, component_type: ComponentType, payload: ItemPayload) -> Item {
    Item {
        item_id: data.item_id.clone(),
        task_id: data.task_id.clone(),
        thread_id: data.thread_id.clone(),
        conversation_id: data.conversation_id.clone(),
        component_type,
        agent_name: data.agent_name.clone(),
        metadata: data.metadata.clone(),
        payload,
    }
}

/// Resolve a route for writing, creating missing levels.
fn resolve_mut<'a>(
    store: &'a mut ViewStore,
    conversation_id: &ConversationId,
    route: &Route,
) -> &'a mut TaskView {
    match route {
        Route::Thread { thread_id, task_id } => {
            ensure_path(store, conversation_id, thread_id, task_id)
        }
        Route::Section {
            component_type,
            task_id,
        } => ensure_section(
            ensure_conversation(store, conversation_id),
            component_type,
            task_id,
        ),
    }
}

/// Resolve a route for reading, without creating anything.
fn resolve<'a>(store: &'a ViewStore, conversation_id: &str, route: &Route) -> Option<&'a TaskView> {
    match route {
        Route::Thread { thread_id, task_id } => {
            store.thread_task(conversation_id, thread_id.as_str(), task_id.as_str())
        }
        Route::Section {
            component_type,
            task_id,
        } => store.section_task(conversation_id, component_type, task_id.as_str()),
    }
}

fn complete_existing(
    store: &mut ViewStore,
    conversation_id: &ConversationId,
    route: &Route,
    item_id: &ItemId,
) -> bool {
    let present = resolve(store, conversation_id.as_str(), route)
        .is_some_and(|task| task.position(item_id.as_str()).is_some());
    if !present {
        debug!(item_id = %item_id, "reasoning_completed for unknown item");
        return false;
    }

    let task = resolve_mut(store, conversation_id, route);
    if let Some(item) = task.items.iter_mut().find(|it| it.item_id == *item_id) {
        force_complete(item, "reasoning_completed");
    }
    true
}

/// Rewrite a reasoning item's content with `isComplete: true`.
///
/// Content that is not a reasoning JSON object is kept verbatim as the text.
pub(crate) fn force_complete(item: &mut Item, op: &'static str) {
    let parsed = item
        .content()
        .ok_or(PayloadError::MissingContent)
        .and_then(ReasoningContent::parse);

    let completed = match parsed {
        Ok(mut reasoning) => {
            reasoning.is_complete = true;
            reasoning
        }
        Err(PayloadError::MissingContent) => ReasoningContent::completed(""),
        Err(error) => {
            telemetry::payload_fallback(op, &item.item_id, &error);
            ReasoningContent::completed(item.content().unwrap_or_default())
        }
    };
    item.payload.content = Some(completed.encode());
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn event(kind: EventKind, payload: serde_json::Value) -> StreamEvent {
        StreamEvent::new(kind, EventData::new("c", "t", "k", "i").with_payload(payload))
    }

    fn component(ct: ComponentType) -> StreamEvent {
        StreamEvent::new(
            EventKind::ComponentGenerator,
            EventData::new("c", "t", "k", "i")
                .with_content("{}")
                .with_component_type(ct),
        )
    }

    fn thread_route() -> Route {
        Route::Thread {
            thread_id: ThreadId::from("t"),
            task_id: TaskId::from("k"),
        }
    }

    #[test]
    fn scheduled_results_replace_in_their_section() {
        let d = Dispatcher::default();
        for ct in [
            ComponentType::ScheduledTaskResult,
            ComponentType::SubagentConversation,
        ] {
            assert_matches!(
                d.plan(&component(ct.clone())),
                Action::Merge { route: Route::Section { component_type, .. }, strategy: MergeStrategy::Replace, .. }
                    if component_type == ct
            );
        }
    }

    #[test]
    fn replace_types_go_to_sections_even_when_not_configured() {
        let d = Dispatcher::new(SectionPolicy::new(Vec::new()));
        assert_matches!(
            d.plan(&component(ComponentType::ScheduledTaskResult)),
            Action::Merge { route: Route::Section { .. }, strategy: MergeStrategy::Replace, .. }
        );
    }

    #[test]
    fn other_components_append_by_routing_rule() {
        let chart = ComponentType::from("filtered_line_chart");
        let d = Dispatcher::default();
        assert_matches!(
            d.plan(&component(chart.clone())),
            Action::Merge { route, strategy: MergeStrategy::Append, .. } if route == thread_route()
        );

        let d = Dispatcher::new(SectionPolicy::new([chart.clone()]));
        assert_matches!(
            d.plan(&component(chart)),
            Action::Merge { route: Route::Section { .. }, strategy: MergeStrategy::Append, .. }
        );
    }

    #[test]
    fn component_without_type_is_markdown() {
        let d = Dispatcher::default();
        let ev = event(EventKind::ComponentGenerator, json!({"content": "x"}));
        assert_matches!(
            d.plan(&ev),
            Action::Merge { item, .. } if item.component_type == ComponentType::Markdown
        );
    }

    #[test]
    fn text_kinds_force_markdown_in_thread() {
        let d = Dispatcher::new(SectionPolicy::new([ComponentType::Markdown]));
        for kind in [
            EventKind::ThreadStarted,
            EventKind::MessageChunk,
            EventKind::Message,
            EventKind::TaskFailed,
            EventKind::PlanFailed,
            EventKind::PlanRequireUserInput,
        ] {
            let ev = event(kind, json!({"content": "hi", "component_type": "tool_call"}));
            assert_matches!(
                d.plan(&ev),
                Action::Merge { route, strategy: MergeStrategy::Append, item }
                    if route == thread_route() && item.component_type == ComponentType::Markdown,
                "{kind}"
            );
        }
    }

    #[test]
    fn reasoning_delta_is_wrapped() {
        let d = Dispatcher::default();
        let Action::Merge { item, strategy, .. } =
            d.plan(&event(EventKind::Reasoning, json!({"content": "Thinking"})))
        else {
            panic!("expected merge");
        };
        assert_eq!(strategy, MergeStrategy::AppendReasoning);
        assert_eq!(item.reasoning(), Some(ReasoningContent::pending("Thinking")));
    }

    #[test]
    fn reasoning_started_resets() {
        let d = Dispatcher::default();
        let Action::Merge { item, strategy, .. } =
            d.plan(&event(EventKind::ReasoningStarted, json!({"content": "ignored"})))
        else {
            panic!("expected merge");
        };
        assert_eq!(strategy, MergeStrategy::Replace);
        assert_eq!(item.reasoning(), Some(ReasoningContent::pending("")));
    }

    #[test]
    fn reasoning_follows_routing_rule() {
        let d = Dispatcher::new(SectionPolicy::new([ComponentType::Reasoning]));
        assert_matches!(
            d.plan(&event(EventKind::Reasoning, json!({"content": "x"}))),
            Action::Merge { route: Route::Section { component_type: ComponentType::Reasoning, .. }, .. }
        );
        assert_matches!(
            d.plan(&event(EventKind::ReasoningCompleted, json!(null))),
            Action::CompleteReasoning { route: Route::Section { .. }, .. }
        );
    }

    #[test]
    fn tool_calls_encode_whole_payload() {
        let d = Dispatcher::default();
        let payload = json!({"tool_call_id": "tc-1", "tool_name": "search", "tool_result": "ok"});
        let Action::Merge { item, strategy, .. } =
            d.plan(&event(EventKind::ToolCallCompleted, payload.clone()))
        else {
            panic!("expected merge");
        };
        assert_eq!(strategy, MergeStrategy::Replace);
        assert_eq!(item.component_type, ComponentType::ToolCall);
        let decoded: serde_json::Value = serde_json::from_str(item.content().unwrap()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn lifecycle_and_unknown_kinds_are_ignored() {
        let d = Dispatcher::default();
        for kind in [
            EventKind::ConversationStarted,
            EventKind::TaskStarted,
            EventKind::TaskCompleted,
            EventKind::Done,
        ] {
            assert_eq!(d.plan(&event(kind, json!({"content": "x"}))), Action::Ignore);
        }
        let mut unknown = event(EventKind::Message, json!({"content": "x"}));
        unknown.event = "portfolio_rebalanced".into();
        assert_eq!(d.plan(&unknown), Action::Ignore);
    }

    #[test]
    fn agent_name_is_carried_onto_items() {
        let d = Dispatcher::default();
        let ev = StreamEvent::new(
            EventKind::Message,
            EventData::new("c", "t", "k", "i")
                .with_content("hi")
                .with_agent_name("research"),
        );
        assert_matches!(d.plan(&ev), Action::Merge { item, .. } if item.agent_name.as_deref() == Some("research"));
    }

    #[test]
    fn revision_counts_applied_events_only() {
        let d = Dispatcher::default();
        let mut store = ViewStore::new();
        assert!(d.apply_in_place(&mut store, &event(EventKind::Message, json!({"content": "a"}))));
        assert!(d.apply_in_place(&mut store, &event(EventKind::MessageChunk, json!({"content": "b"}))));
        assert!(!d.apply_in_place(&mut store, &event(EventKind::Done, json!(null))));
        let missing = StreamEvent::new(
            EventKind::ReasoningCompleted,
            EventData::new("c", "t", "k", "nope"),
        );
        assert!(!d.apply_in_place(&mut store, &missing));
        assert_eq!(store.conversation("c").unwrap().revision(), 2);
    }

    #[test]
    fn force_complete_handles_every_content_shape() {
        let d = Dispatcher::default();
        let Action::Merge { mut item, .. } =
            d.plan(&event(EventKind::Reasoning, json!({"content": "x"})))
        else {
            panic!("expected merge");
        };
        force_complete(&mut item, "test");
        assert_eq!(item.reasoning(), Some(ReasoningContent::completed("x")));

        item.payload.content = Some("raw".into());
        force_complete(&mut item, "test");
        assert_eq!(item.reasoning(), Some(ReasoningContent::completed("raw")));

        item.payload.content = None;
        force_complete(&mut item, "test");
        assert_eq!(item.reasoning(), Some(ReasoningContent::completed("")));
    }
}
