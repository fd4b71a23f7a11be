//! # quill-view
//!
//! The conversation view reconciliation engine. It folds a live sequence of
//! agent stream events into an immutable, incrementally-updated view model
//! that UI surfaces render from:
//!
//! - **Model**: [`ViewStore`] → [`ConversationView`] → threads and sections →
//!   [`TaskView`] → [`Item`], shared through `Arc` so every transition is
//!   copy-on-write
//! - **Path resolver**: [`ensure_path`] and friends create entries on first reference
//! - **Section index**: [`SectionPolicy`] and [`ensure_section`] file section-worthy
//!   component types under conversation-wide sections
//! - **Merge engine**: [`merge_item`] appends, replaces in place, or concatenates
//! - **Dispatcher**: [`Dispatcher::apply_event`] maps each event kind to a route,
//!   merge strategy, and payload transform
//! - **Replay**: [`Dispatcher::replay`] applies a full history as one transaction
//! - **Handle**: [`ViewHandle`] serializes writers over a shared snapshot
//!
//! The engine never fails: malformed payloads fall back to defaults (logged
//! and counted), unknown event kinds are dropped.

#![deny(unsafe_code)]

pub mod dispatch;
pub mod handle;
pub mod merge;
pub mod model;
pub mod path;
pub mod replay;
pub mod section;
mod telemetry;

pub use dispatch::{Action, Dispatcher, Route};
pub use handle::{StaleRevision, ViewHandle};
pub use merge::{MergeOutcome, MergeStrategy, merge_item};
pub use model::{ConversationView, Item, ItemPayload, SectionView, TaskView, ThreadView, ViewStore};
pub use path::{ensure_conversation, ensure_path, ensure_thread};
pub use section::{SectionPolicy, ensure_section};
pub use telemetry::{
    EVENTS_APPLIED_TOTAL, EVENTS_IGNORED_TOTAL, PAYLOAD_FALLBACK_TOTAL, REPLAYS_TOTAL,
};
