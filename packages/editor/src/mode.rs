//! # Editing Modes
//!
//! | mode                | editing flag | field submit | document submit | cancel | reset |
//! |---------------------|--------------|--------------|-----------------|--------|-------|
//! | `inline`            | no           | yes          | no              | yes    | no    |
//! | `global`            | yes          | no           | yes             | no     | yes   |
//! | `individual`        | yes          | yes          | no              | no     | yes   |
//! | `global-individual` | yes          | yes          | yes             | no     | yes   |
//!
//! In `inline` mode a leaf shows its input only while selected; in the
//! other modes every editable leaf shows its input while the editing flag is on.

use std::collections::BTreeSet;
use std::fmt;

use jsonedit_path::FieldPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::policy::FieldPolicy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditingMode {
    #[default]
    Inline,
    Global,
    Individual,
    GlobalIndividual,
}

impl EditingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EditingMode::Inline => "inline",
            EditingMode::Global => "global",
            EditingMode::Individual => "individual",
            EditingMode::GlobalIndividual => "global-individual",
        }
    }

    /// Whether the document-level editing flag applies
    pub fn uses_editing_flag(self) -> bool {
        self != EditingMode::Inline
    }

    pub fn allows_field_submit(self) -> bool {
        self != EditingMode::Global
    }

    pub fn allows_document_submit(self) -> bool {
        matches!(self, EditingMode::Global | EditingMode::GlobalIndividual)
    }

    pub fn shows_cancel(self) -> bool {
        self == EditingMode::Inline
    }

    pub fn shows_reset(self) -> bool {
        self != EditingMode::Inline
    }

    /// Tag attached to a per-field commit in this mode
    pub fn field_submit_type(self) -> SubmitType {
        match self {
            EditingMode::Inline => SubmitType::Inline,
            _ => SubmitType::Individual,
        }
    }
}

impl fmt::Display for EditingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of commit produced a submit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitType {
    Inline,
    Global,
    Individual,
}

/// Leaves selected for editing in `inline` mode
#[derive(Debug, Clone, Default)]
pub struct InlineSelection {
    selected: BTreeSet<FieldPath>,
}

impl InlineSelection {
    pub fn select(&mut self, path: &FieldPath) -> bool {
        self.selected.insert(path.clone())
    }

    pub fn deselect(&mut self, path: &FieldPath) -> bool {
        self.selected.remove(path)
    }

    pub fn is_selected(&self, path: &FieldPath) -> bool {
        self.selected.contains(path)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldPath> {
        self.selected.iter()
    }
}

/// Buttons next to an input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Controls {
    pub submit: bool,
    pub submit_enabled: bool,
    pub cancel: bool,
    pub reset: bool,
}

/// What the renderer draws for one leaf
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum LeafView {
    /// Static display, optionally with an inline edit affordance
    #[serde(rename_all = "camelCase")]
    ReadOnly {
        value: Option<Value>,
        can_edit_inline: bool,
    },

    /// Input widget
    #[serde(rename_all = "camelCase")]
    Input {
        #[serde(rename = "descriptor")]
        policy: FieldPolicy,
        /// Draft value; null and missing values show as an empty string
        value: Value,
        read_mode_value: Option<Value>,
        validation_message: Option<String>,
        controls: Controls,
    },
}

impl LeafView {
    pub fn is_input(&self) -> bool {
        matches!(self, LeafView::Input { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_names_round_trip() {
        for mode in [
            EditingMode::Inline,
            EditingMode::Global,
            EditingMode::Individual,
            EditingMode::GlobalIndividual,
        ] {
            let json = serde_json::to_value(mode).unwrap();
            assert_eq!(json, json!(mode.as_str()));
            let back: EditingMode = serde_json::from_value(json).unwrap();
            assert_eq!(back, mode);
        }
        assert_eq!(EditingMode::default(), EditingMode::Inline);
    }

    #[test]
    fn test_capabilities_per_mode() {
        assert!(!EditingMode::Global.allows_field_submit());
        assert!(EditingMode::Global.allows_document_submit());
        assert!(EditingMode::Individual.allows_field_submit());
        assert!(!EditingMode::Individual.allows_document_submit());
        assert!(EditingMode::GlobalIndividual.allows_field_submit());
        assert!(EditingMode::GlobalIndividual.allows_document_submit());
        assert!(!EditingMode::Inline.uses_editing_flag());
        assert!(EditingMode::Inline.shows_cancel() && !EditingMode::Inline.shows_reset());
    }

    #[test]
    fn test_submit_type_names() {
        assert_eq!(serde_json::to_value(SubmitType::Individual).unwrap(), json!("individual"));
        assert_eq!(EditingMode::Inline.field_submit_type(), SubmitType::Inline);
        assert_eq!(EditingMode::GlobalIndividual.field_submit_type(), SubmitType::Individual);
    }

    #[test]
    fn test_selection() {
        let mut selection = InlineSelection::default();
        let path = FieldPath::parse("a.0").unwrap();
        assert!(selection.select(&path));
        assert!(!selection.select(&path));
        assert!(selection.is_selected(&path));
        assert!(selection.deselect(&path));
        assert!(selection.is_empty());
    }
}
