//! # Snapshot Store
//!
//! Holds the two copies of the document the editor works on.
//!
//! ```text
//!  host tree ──► committed ──clone──► draft
//!                   ▲                   │ apply_change (every keystroke)
//!                   └── commit_field ───┤
//!                   └── commit_all ─────┘
//!                   ──── reset_field ──► draft
//! ```
//!
//! Values enter the store by move and leave it by reference; callers that
//! hand data to a host clone it first.

use jsonedit_path::FieldPath;
use serde_json::Value;
use tracing::{debug, warn};

use crate::diff::{diff, diff_at, UpdatedKeys};
use crate::tree;

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Last tree the host supplied, used to skip redundant resets
    source: Value,

    /// Last accepted state
    committed: Value,

    /// In-progress edits
    draft: Value,

    /// Bumped on every draft mutation and every commit
    version: u64,
}

impl SnapshotStore {
    pub fn new(tree: Value) -> Self {
        Self {
            committed: tree.clone(),
            draft: tree.clone(),
            source: tree,
            version: 0,
        }
    }

    /// Replace both snapshots when `tree` differs from the last supplied tree.
    ///
    /// Returns whether anything was replaced.
    pub fn replace_if_changed(&mut self, tree: Value) -> bool {
        if tree == self.source {
            debug!("Supplied tree unchanged, keeping snapshots");
            return false;
        }
        self.committed = tree.clone();
        self.draft = tree.clone();
        self.source = tree;
        self.version += 1;
        true
    }

    pub fn committed(&self) -> &Value {
        &self.committed
    }

    pub fn draft(&self) -> &Value {
        &self.draft
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn committed_value(&self, path: &FieldPath) -> Option<&Value> {
        tree::get(&self.committed, path)
    }

    pub fn draft_value(&self, path: &FieldPath) -> Option<&Value> {
        tree::get(&self.draft, path)
    }

    /// Write `value` into the draft at `path`.
    ///
    /// A missing parent container is a no-op (logged), never an error.
    pub fn apply_change(&mut self, path: &FieldPath, value: Value) -> bool {
        if !tree::set(&mut self.draft, path, value) {
            warn!(path = %path, "Draft has no parent container for path, change dropped");
            return false;
        }
        self.version += 1;
        debug!(path = %path, version = self.version, "Draft updated");
        true
    }

    /// Copy the draft value at `path` into the committed tree.
    ///
    /// Returns the changed leaves, or `None` when the path cannot be copied.
    pub fn commit_field(&mut self, path: &FieldPath) -> Option<UpdatedKeys> {
        let Some(value) = self.draft_value(path).cloned() else {
            warn!(path = %path, "Draft has no value at path, nothing to commit");
            return None;
        };

        let changes = diff_at(&self.committed, &self.draft, path);
        if changes.is_empty() {
            return Some(changes);
        }

        if !tree::set(&mut self.committed, path, value) {
            warn!(path = %path, "Committed tree has no parent container for path, commit dropped");
            return None;
        }
        self.version += 1;
        debug!(path = %path, changed = changes.len(), "Field committed");
        Some(changes)
    }

    /// Replace the committed tree with a copy of the draft
    pub fn commit_all(&mut self) -> UpdatedKeys {
        let changes = diff(&self.committed, &self.draft);
        if !changes.is_empty() {
            self.committed = self.draft.clone();
            self.version += 1;
            debug!(changed = changes.len(), "Draft committed");
        }
        changes
    }

    /// Restore the draft value at `path` from the committed tree.
    ///
    /// A slot appended to a draft array is dropped together with any slots
    /// appended after it. Returns whether the draft changed.
    pub fn reset_field(&mut self, path: &FieldPath) -> bool {
        let committed = self.committed_value(path).cloned();
        if committed.as_ref() == self.draft_value(path) {
            return false;
        }

        let restored = match committed {
            Some(value) => tree::set(&mut self.draft, path, value),
            None => {
                tree::remove(&mut self.draft, path).is_some() || tree::truncate(&mut self.draft, path)
            }
        };
        if !restored {
            warn!(path = %path, "Could not restore draft value at path");
            return false;
        }
        self.version += 1;
        debug!(path = %path, "Draft value reset");
        true
    }

    /// Leaves that differ between committed and draft
    pub fn pending_changes(&self) -> UpdatedKeys {
        diff(&self.committed, &self.draft)
    }

    pub fn is_dirty(&self) -> bool {
        self.committed != self.draft
    }

    pub fn is_field_dirty(&self, path: &FieldPath) -> bool {
        self.committed_value(path) != self.draft_value(path)
    }
}
