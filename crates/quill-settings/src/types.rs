//! Settings type definitions.
//!
//! Field names are camelCase on disk. Every struct carries
//! `#[serde(default)]`, so a partial file only overrides what it names.

use quill_core::ComponentType;
use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "logging": { "level": "info" },
///   "view": { "sectionComponents": ["scheduled_task_result"] },
///   "replay": { "completeSectionReasoning": true }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuillSettings {
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// View model routing.
    pub view: ViewSettings,
    /// Batch replay behavior.
    pub replay: ReplaySettings,
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level passed to the `tracing` env filter.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// View model routing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewSettings {
    /// Component types filed under conversation-wide sections instead of
    /// their owning thread.
    pub section_components: Vec<ComponentType>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            section_components: vec![
                ComponentType::ScheduledTaskResult,
                ComponentType::SubagentConversation,
            ],
        }
    }
}

/// Batch replay behavior.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplaySettings {
    /// Also force section-owned reasoning items to complete after replay.
    /// Thread-owned reasoning is always completed.
    pub complete_section_reasoning: bool,
}
