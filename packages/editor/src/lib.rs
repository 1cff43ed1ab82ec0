//! # JSON Editor Engine
//!
//! State and policy engine behind a path-addressed JSON editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ path: dotted paths + wildcard rule trie     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: JsonEditor                          │
//! │  - Compile rules, resolve editability       │
//! │  - Committed/draft snapshots + diff         │
//! │  - Debounced validation                     │
//! │  - Per-mode submit protocol                 │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host: renderer widgets + change/submit      │
//! │ listeners                                   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Leaves only**: only scalar leaves are ever editable
//! 2. **Deny wins**: a non-editable rule beats any editable rule for a path
//! 3. **Exact before wildcard**: `items.0.name` beats `items.[].name`
//! 4. **Copies out**: hosts always receive owned copies of the trees
//! 5. **Fail fast**: malformed rules are rejected when registered
//!
//! ## Usage
//!
//! ```rust,ignore
//! use jsonedit_editor::{EditorConfig, EditingMode, JsonEditor};
//! use jsonedit_path::FieldPath;
//! use serde_json::json;
//!
//! let config = EditorConfig::from_json(r#"{
//!     "editingMode": "global",
//!     "isEditing": true,
//!     "editableFields": {
//!         "age": { "type": "number", "validations": { "minValue": 0, "maxValue": 120 } }
//!     }
//! }"#)?;
//!
//! let mut editor = JsonEditor::new(json!({"age": 30}), config)?
//!     .with_listener(|event: &jsonedit_editor::EditorEvent| println!("{:?}", event));
//!
//! let age = FieldPath::parse("age")?;
//! editor.on_leaf_change(&age, json!("45"))?;
//! editor.settle().await;
//! editor.on_document_submit()?;
//! ```

mod config;
mod date;
mod debounce;
mod diff;
mod editor;
mod errors;
mod events;
mod mode;
mod policy;
mod resolver;
mod rules;
mod store;
mod tree;
mod validation;

pub use config::EditorConfig;
pub use date::{format_date, parse_date, parse_date_with, DateFormat};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE_DELAY};
pub use diff::{diff, diff_at, KeyChange, UpdatedKeys};
pub use editor::{JsonEditor, LeafChange, SubmitOutcome};
pub use errors::EditorError;
pub use events::{ChangeEvent, EditorEvent, EditorListener, NoopListener, SubmitEvent};
pub use mode::{Controls, EditingMode, InlineSelection, LeafView, SubmitType};
pub use policy::{FieldKind, FieldPolicy, SelectOption, ValidationRule};
pub use resolver::{DenyReason, Resolution, Resolver};
pub use rules::{
    CompiledRules, ConfigError, EditableFields, EditableRule, FieldDescriptor, NonEditableFields, Validations,
};
pub use store::SnapshotStore;
pub use validation::{display_text, validate, ValidationErrors};

// Re-export path types for convenience
pub use jsonedit_path::{FieldPath, RulePath};
