//! # quill-settings
//!
//! Configuration for the quill view engine, loaded from three layers (in
//! priority order):
//! 1. **Compiled defaults**: [`QuillSettings::default()`]
//! 2. **User file**: `~/.quill/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `QUILL_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{LoggingSettings, QuillSettings, ReplaySettings, ViewSettings};

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::ComponentType;

    #[test]
    fn default_settings_are_valid() {
        let settings = QuillSettings::default();
        assert_eq!(settings.logging.level, "warn");
        assert_eq!(
            settings.view.section_components,
            vec![
                ComponentType::ScheduledTaskResult,
                ComponentType::SubagentConversation
            ]
        );
        assert!(!settings.replay.complete_section_reasoning);
    }
}
