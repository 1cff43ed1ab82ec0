//! Path-addressed access into `serde_json::Value` trees

use jsonedit_path::{FieldPath, Segment};
use serde_json::Value;

fn child<'a>(node: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match (node, segment) {
        (Value::Object(map), segment) => map.get(segment.as_key().as_ref()),
        (Value::Array(items), Segment::Index(index)) => items.get(*index),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    match (node, segment) {
        (Value::Object(map), segment) => map.get_mut(segment.as_key().as_ref()),
        (Value::Array(items), Segment::Index(index)) => items.get_mut(*index),
        _ => None,
    }
}

/// Whether a value is a mapping or a sequence
pub fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Value at `path`, if every segment exists
pub fn get<'a>(tree: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(tree, |node, segment| child(node, segment))
}

fn get_mut<'a>(tree: &'a mut Value, segments: &[Segment]) -> Option<&'a mut Value> {
    segments
        .iter()
        .try_fold(tree, |node, segment| child_mut(node, segment))
}

/// Write `value` at `path`.
///
/// The parent container must already exist; only the final slot may be
/// created (a new mapping key, or an array slot one past the end). Returns
/// `false` without touching the tree when the parent is missing, when the
/// path is the root, or when an array index would leave a gap.
pub fn set(tree: &mut Value, path: &FieldPath, value: Value) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };
    let Some(parent) = get_mut(tree, parents) else {
        return false;
    };

    match (parent, last) {
        (Value::Object(map), segment) => {
            map.insert(segment.as_key().into_owned(), value);
            true
        }
        (Value::Array(items), Segment::Index(index)) if *index < items.len() => {
            items[*index] = value;
            true
        }
        (Value::Array(items), Segment::Index(index)) if *index == items.len() => {
            items.push(value);
            true
        }
        _ => false,
    }
}

/// Remove the value at `path` from its parent mapping.
///
/// Array elements are never removed: that would shift every later index.
pub fn remove(tree: &mut Value, path: &FieldPath) -> Option<Value> {
    let (last, parents) = path.split_last()?;
    match get_mut(tree, parents)? {
        Value::Object(map) => map.shift_remove(last.as_key().as_ref()),
        _ => None,
    }
}

/// Cut the array holding `path` back so the slot at `path` no longer exists.
///
/// Drops the element at `path` and every element after it. Returns `false`
/// when the parent is not an array or the slot is already absent.
pub fn truncate(tree: &mut Value, path: &FieldPath) -> bool {
    let Some((Segment::Index(index), parents)) = path.split_last() else {
        return false;
    };
    match get_mut(tree, parents) {
        Some(Value::Array(items)) if *index < items.len() => {
            items.truncate(*index);
            true
        }
        _ => false,
    }
}

/// Every leaf of the tree with its concrete path, in document order
pub fn leaves(tree: &Value) -> Vec<(FieldPath, &Value)> {
    let mut out = Vec::new();
    collect_leaves(tree, FieldPath::root(), &mut out);
    out
}

fn collect_leaves<'a>(node: &'a Value, path: FieldPath, out: &mut Vec<(FieldPath, &'a Value)>) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                collect_leaves(value, path.key(key), out);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                collect_leaves(value, path.index(index), out);
            }
        }
        leaf => out.push((path, leaf)),
    }
}
