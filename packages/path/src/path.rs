//! # Dotted Paths
//!
//! Two flavours of path share the same dotted text form:
//!
//! - [`FieldPath`]: a concrete path, addressing exactly one node of one tree
//!   (`items.2.name`). Never contains a wildcard.
//! - [`RulePath`]: a path used in an editability rule. May contain `[]`
//!   segments, each standing for any array index (`items.[].name`).
//!
//! The empty string is the root path (zero segments).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{PathError, Segment, SEPARATOR};

fn split_segments(text: &str) -> Result<Vec<Segment>, PathError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    text.split(SEPARATOR)
        .enumerate()
        .map(|(position, raw)| Segment::parse(raw, text, position))
        .collect()
}

fn join_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(&segment.as_key());
    }
    out
}

fn join_without_indices(segments: &[Segment]) -> String {
    let kept: Vec<Segment> = segments
        .iter()
        .filter(|s| !s.is_index() && !s.is_wildcard())
        .cloned()
        .collect();
    join_segments(&kept)
}

/// Decompose a dotted rule-shaped path into its segments.
///
/// Accepts wildcards; use [`FieldPath::parse`] to reject them.
pub fn to_segments(path: &str) -> Result<Vec<Segment>, PathError> {
    split_segments(path)
}

/// Remove every index and wildcard segment from a dotted path.
///
/// `a.2.b` and `a.[].b` both become `a.b`. A path that does not parse is
/// returned verbatim, so this never fails.
pub fn strip_indices(path: &str) -> String {
    match split_segments(path) {
        Ok(segments) => join_without_indices(&segments),
        Err(_) => path.to_string(),
    }
}

/// Concrete path to one node of a tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parse a dotted concrete path
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let segments = split_segments(text)?;
        if segments.iter().any(Segment::is_wildcard) {
            return Err(PathError::WildcardInConcretePath(text.to_string()));
        }
        Ok(Self { segments })
    }

    /// The tree root (zero segments)
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path of a child of this node.
    ///
    /// Wildcards are rejected because they would produce a non-concrete path.
    pub fn child(&self, segment: impl Into<Segment>) -> Result<Self, PathError> {
        let segment = segment.into();
        if segment.is_wildcard() {
            return Err(PathError::WildcardInConcretePath(format!("{}.{}", self, segment)));
        }
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    /// Path of a mapping entry below this node
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::from_text(key));
        Self { segments }
    }

    /// Path of an array element below this node
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// The final segment and the segments leading to it
    pub fn split_last(&self) -> Option<(&Segment, &[Segment])> {
        self.segments.split_last()
    }

    pub fn contains_index(&self) -> bool {
        self.segments.iter().any(Segment::is_index)
    }

    /// Array indices in order of appearance
    pub fn indices(&self) -> Vec<usize> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Index(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    /// Dotted form with every index removed (`a.2.b` → `a.b`)
    pub fn strip_indices(&self) -> String {
        join_without_indices(&self.segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_segments(&self.segments))
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

/// Path used by an editability rule, possibly containing wildcards
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RulePath {
    segments: Vec<Segment>,
}

impl RulePath {
    /// Parse a dotted rule path
    pub fn parse(text: &str) -> Result<Self, PathError> {
        Ok(Self {
            segments: split_segments(text)?,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(Segment::is_wildcard)
    }

    pub fn wildcard_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_wildcard()).count()
    }

    /// Fill each wildcard, left to right, with the given indices
    pub fn concretize(&self, indices: &[usize]) -> Result<FieldPath, PathError> {
        let expected = self.wildcard_count();
        if expected != indices.len() {
            return Err(PathError::IndexCountMismatch {
                path: self.to_string(),
                expected,
                given: indices.len(),
            });
        }

        let mut fill = indices.iter();
        let segments = self
            .segments
            .iter()
            .map(|segment| {
                if segment.is_wildcard() {
                    fill.next().map_or(Segment::Wildcard, |i| Segment::Index(*i))
                } else {
                    segment.clone()
                }
            })
            .collect();

        Ok(FieldPath { segments })
    }

    /// Whether this rule matches the concrete path, segment by segment.
    ///
    /// A wildcard matches array indices only. This is the linear check the
    /// trie replaces; it stays useful as a reference.
    pub fn matches(&self, path: &FieldPath) -> bool {
        self.segments.len() == path.segments.len()
            && self
                .segments
                .iter()
                .zip(&path.segments)
                .all(|(rule, concrete)| match rule {
                    Segment::Wildcard => concrete.is_index(),
                    exact => exact.as_key() == concrete.as_key(),
                })
    }

    /// Ordering key among rules matching the same path: smaller is more specific.
    ///
    /// Fewer wildcards first; on a tie, the rule whose first wildcard comes
    /// later (an exact segment further left) wins.
    pub fn specificity(&self) -> (usize, Vec<bool>) {
        (
            self.wildcard_count(),
            self.segments.iter().map(Segment::is_wildcard).collect(),
        )
    }

    /// Dotted form with every index and wildcard removed
    pub fn strip_indices(&self) -> String {
        join_without_indices(&self.segments)
    }
}

impl fmt::Display for RulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_segments(&self.segments))
    }
}

impl FromStr for RulePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RulePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RulePath> for String {
    fn from(path: RulePath) -> Self {
        path.to_string()
    }
}

impl From<FieldPath> for RulePath {
    fn from(path: FieldPath) -> Self {
        Self {
            segments: path.segments,
        }
    }
}
