//! # Tree Diff
//!
//! Reports every leaf path whose value differs between two trees.
//!
//! Mappings and sequences are walked over the union of their keys/indices.
//! A side that is missing is reported as `None` ("undefined"). When a leaf
//! is replaced by a non-empty container (or the reverse), the leaf slot is
//! reported once and every leaf of the container is reported under its own
//! path. Empty containers count as leaves.

use std::collections::BTreeMap;

use jsonedit_path::FieldPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Before/after pair for one changed leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
}

/// Changed leaves keyed by concrete path
pub type UpdatedKeys = BTreeMap<FieldPath, KeyChange>;

/// Every changed leaf between `before` and `after`; empty when they are equal
pub fn diff(before: &Value, after: &Value) -> UpdatedKeys {
    let mut out = UpdatedKeys::new();
    walk(Some(before), Some(after), FieldPath::root(), &mut out);
    out
}

/// Changed leaves at or below `path`
pub fn diff_at(before: &Value, after: &Value, path: &FieldPath) -> UpdatedKeys {
    let mut out = UpdatedKeys::new();
    walk(
        crate::tree::get(before, path),
        crate::tree::get(after, path),
        path.clone(),
        &mut out,
    );
    out
}

fn is_branch(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

fn walk(before: Option<&Value>, after: Option<&Value>, path: FieldPath, out: &mut UpdatedKeys) {
    match (before, after) {
        (Some(Value::Object(a)), Some(Value::Object(b))) if !(a.is_empty() && b.is_empty()) => {
            for (key, value) in a {
                walk(Some(value), b.get(key), path.key(key), out);
            }
            for (key, value) in b {
                if !a.contains_key(key) {
                    walk(None, Some(value), path.key(key), out);
                }
            }
        }
        (Some(Value::Array(a)), Some(Value::Array(b))) if !(a.is_empty() && b.is_empty()) => {
            for index in 0..a.len().max(b.len()) {
                walk(a.get(index), b.get(index), path.index(index), out);
            }
        }
        (before, after) => {
            let before_leaf = before.filter(|value| !is_branch(value));
            let after_leaf = after.filter(|value| !is_branch(value));
            if before_leaf != after_leaf {
                out.insert(
                    path.clone(),
                    KeyChange {
                        before: before_leaf.cloned(),
                        after: after_leaf.cloned(),
                    },
                );
            }
            if let Some(branch) = before.filter(|value| is_branch(value)) {
                walk_one_side(branch, &path, true, out);
            }
            if let Some(branch) = after.filter(|value| is_branch(value)) {
                walk_one_side(branch, &path, false, out);
            }
        }
    }
}

/// Report every leaf under `branch` as removed (`is_before`) or added
fn walk_one_side(branch: &Value, path: &FieldPath, is_before: bool, out: &mut UpdatedKeys) {
    let children: Vec<(FieldPath, &Value)> = match branch {
        Value::Object(map) => map.iter().map(|(key, value)| (path.key(key), value)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, value)| (path.index(index), value))
            .collect(),
        _ => Vec::new(),
    };
    for (child_path, child) in children {
        if is_before {
            walk(Some(child), None, child_path, out);
        } else {
            walk(None, Some(child), child_path, out);
        }
    }
}
