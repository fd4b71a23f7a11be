//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`QuillSettings::default()`]
//! 2. If `~/.quill/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `QUILL_*` environment variable overrides
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use quill_core::ComponentType;
use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::QuillSettings;

/// Resolve the path to the settings file (`~/.quill/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".quill").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<QuillSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<QuillSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn load_file_layer(path: &Path) -> Result<QuillSettings> {
    let defaults = serde_json::to_value(QuillSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment overrides read through `lookup`.
///
/// Invalid values are ignored (the file/default value stays).
pub fn apply_env_overrides(settings: &mut QuillSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("QUILL_LOG_LEVEL").and_then(|v| non_empty(&v)) {
        settings.logging.level = v;
    }
    if let Some(v) = lookup("QUILL_SECTION_COMPONENTS").and_then(|v| parse_component_list(&v)) {
        settings.view.section_components = v;
    }
    if let Some(v) = lookup("QUILL_REPLAY_COMPLETES_SECTIONS").and_then(|v| parse_bool(&v)) {
        settings.replay.complete_section_reasoning = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

fn non_empty(val: &str) -> Option<String> {
    let trimmed = val.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a comma-separated component type list, skipping blank entries.
///
/// An input with no entries at all is rejected so an empty variable cannot
/// silently disable every section.
pub fn parse_component_list(val: &str) -> Option<Vec<ComponentType>> {
    let list: Vec<ComponentType> = val
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ComponentType::from)
        .collect();
    (!list.is_empty()).then_some(list)
}
