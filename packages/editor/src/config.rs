use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::debounce::DEFAULT_DEBOUNCE_DELAY;
use crate::errors::EditorError;
use crate::mode::EditingMode;
use crate::rules::{EditableFields, EditableRule, NonEditableFields};

/// Editor settings as supplied by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    #[serde(rename = "editingMode", alias = "mode")]
    pub mode: EditingMode,

    /// Rule path → `true` or a field descriptor
    pub editable_fields: EditableFields,

    /// Rule path → `true`; wins over `editable_fields`
    pub non_editable_fields: NonEditableFields,

    /// Leaves without any rule are editable
    pub all_fields_editable: bool,

    /// Coalesce rapid changes before validating and notifying
    pub debouncing: bool,

    #[serde(rename = "debounceDelayMs")]
    pub debounce_delay_ms: u64,

    /// Infer number/boolean inputs from the leaf type when no descriptor applies
    pub enable_type_based_rendering: bool,

    /// Initial value of the document-level editing flag
    pub is_editing: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            mode: EditingMode::Inline,
            editable_fields: EditableFields::new(),
            non_editable_fields: NonEditableFields::new(),
            all_fields_editable: true,
            debouncing: true,
            debounce_delay_ms: DEFAULT_DEBOUNCE_DELAY.as_millis() as u64,
            enable_type_based_rendering: true,
            is_editing: false,
        }
    }
}

impl EditorConfig {
    /// Parse host JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Effective debounce delay; zero when debouncing is off
    pub fn debounce_delay(&self) -> Duration {
        if self.debouncing {
            Duration::from_millis(self.debounce_delay_ms)
        } else {
            Duration::ZERO
        }
    }

    pub fn with_mode(mut self, mode: EditingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_editable(mut self, rule: impl Into<String>, entry: EditableRule) -> Self {
        self.editable_fields.insert(rule.into(), entry);
        self
    }

    pub fn with_non_editable(mut self, rule: impl Into<String>) -> Self {
        self.non_editable_fields.insert(rule.into(), true);
        self
    }

    pub fn with_all_fields_editable(mut self, enabled: bool) -> Self {
        self.all_fields_editable = enabled;
        self
    }

    pub fn with_debouncing(mut self, enabled: bool) -> Self {
        self.debouncing = enabled;
        self
    }

    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_type_based_rendering(mut self, enabled: bool) -> Self {
        self.enable_type_based_rendering = enabled;
        self
    }

    pub fn with_editing(mut self, editing: bool) -> Self {
        self.is_editing = editing;
        self
    }
}
