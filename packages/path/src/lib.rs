//! # Path Model
//!
//! Dotted field paths for addressing leaves of nested JSON-like trees, and
//! the wildcard trie used to match concrete paths against editability rules.
//!
//! ```rust,ignore
//! use jsonedit_path::{FieldPath, PathTrie, RulePath};
//!
//! let mut trie = PathTrie::new();
//! trie.insert(RulePath::parse("items.[].name")?, "editable");
//!
//! let hit = trie.resolve_best(&FieldPath::parse("items.3.name")?);
//! assert_eq!(hit.map(|m| *m.value), Some("editable"));
//! ```
//!
//! A path never addresses a key that itself contains `.`.

mod error;
mod path;
mod segment;
mod trie;

pub use error::PathError;
pub use path::{strip_indices, to_segments, FieldPath, RulePath};
pub use segment::{Segment, SEPARATOR, WILDCARD};
pub use trie::{PathTrie, TrieMatch};
