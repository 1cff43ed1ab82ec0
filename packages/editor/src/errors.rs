//! Error types for the editor

use jsonedit_path::{FieldPath, PathError};
use thiserror::Error;

use crate::mode::EditingMode;
use crate::rules::ConfigError;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Field '{0}' is not editable")]
    NotEditable(FieldPath),

    #[error("Field '{0}' has no input shown; select it or turn editing on first")]
    InputNotShown(FieldPath),

    #[error("Field '{0}' does not exist in the draft")]
    MissingLeaf(FieldPath),

    #[error("{action} is not available in {mode} mode")]
    NotAllowedInMode { action: &'static str, mode: EditingMode },

    #[error("Editing is turned off")]
    NotEditing,

    #[error("Submit blocked by validation errors in {}", join_paths(.0))]
    SubmitBlocked(Vec<FieldPath>),
}

fn join_paths(paths: &[FieldPath]) -> String {
    paths.iter().map(|p| format!("'{}'", p)).collect::<Vec<_>>().join(", ")
}
