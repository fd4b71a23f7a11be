//! # quill-core
//!
//! Foundation types shared by every quill crate:
//!
//! - **Branded IDs**: `ConversationId`, `ThreadId`, `TaskId`, `ItemId` as newtypes
//! - **Component types**: [`ComponentType`], the tag that decides how an item renders
//!   and where the view engine files it
//! - **Logging**: `tracing` subscriber setup and in-memory capture for tests

#![deny(unsafe_code)]

pub mod component;
pub mod ids;
pub mod logging;

pub use component::ComponentType;
pub use ids::{ConversationId, ItemId, TaskId, ThreadId};
