//! # quill-events
//!
//! Everything that crosses the wire boundary into the view engine:
//!
//! - **Event kinds**: [`EventKind`], the discriminator of an agent stream record
//! - **Envelope**: [`StreamEvent`] / [`EventData`], the record shape delivered by the stream
//! - **Payload codecs**: typed [`ReasoningContent`] and [`ToolCallContent`] over the
//!   JSON-in-a-string item content, plus [`ItemContent`] for tagged decoding
//! - **Records**: [`ConversationRecord`], a persisted conversation row converted
//!   back into a stream event for history replay

#![deny(unsafe_code)]

pub mod envelope;
pub mod errors;
pub mod kind;
pub mod payload;
pub mod record;

pub use envelope::{EventData, StreamEvent};
pub use errors::{PayloadError, RecordError};
pub use kind::{ALL_EVENT_KINDS, EventKind};
pub use payload::{
    ItemContent, ReasoningContent, ToolCallContent, ToolResultEntry, format_tool_result,
};
pub use record::ConversationRecord;
