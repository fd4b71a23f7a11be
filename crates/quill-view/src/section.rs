//! Section index: a conversation-wide view keyed by (component type, task id).
//!
//! Section-worthy items live only here, never in their owning thread, so
//! cross-thread panels (scheduled task results, sub-agent conversations) can
//! render without walking every thread.

use std::collections::BTreeSet;
use std::sync::Arc;

use quill_core::{ComponentType, TaskId};
use quill_settings::ViewSettings;

use crate::model::{ConversationView, TaskView};

/// The set of component types filed under sections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionPolicy {
    components: BTreeSet<ComponentType>,
}

impl SectionPolicy {
    /// Policy over an explicit set of component types.
    pub fn new(components: impl IntoIterator<Item = ComponentType>) -> Self {
        Self {
            components: components.into_iter().collect(),
        }
    }

    /// Policy from view settings.
    pub fn from_settings(settings: &ViewSettings) -> Self {
        Self::new(settings.section_components.iter().cloned())
    }

    /// Whether items of this type belong in a section.
    pub fn is_section_worthy(&self, component_type: &ComponentType) -> bool {
        self.components.contains(component_type)
    }

    /// Section-worthy component types.
    pub fn components(&self) -> impl Iterator<Item = &ComponentType> {
        self.components.iter()
    }
}

impl Default for SectionPolicy {
    fn default() -> Self {
        Self::from_settings(&ViewSettings::default())
    }
}

/// Ensure the (component type, task id) section task exists and return it.
pub fn ensure_section<'a>(
    conversation: &'a mut ConversationView,
    component_type: &ComponentType,
    task_id: &TaskId,
) -> &'a mut TaskView {
    let section = Arc::make_mut(
        conversation
            .sections
            .entry(component_type.clone())
            .or_default(),
    );
    Arc::make_mut(section.tasks.entry(task_id.clone()).or_default())
}
