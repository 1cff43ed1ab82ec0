//! Path segments
//!
//! A segment is one step through the tree: a mapping key, an array index,
//! or (in rule paths only) the wildcard standing for any array index.

use std::borrow::Cow;
use std::fmt;

use crate::PathError;

/// Separator between segments in the dotted form
pub const SEPARATOR: char = '.';

/// Wildcard token in the dotted form of a rule path
pub const WILDCARD: &str = "[]";

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Mapping key
    Key(String),

    /// Array index (canonical decimal, no leading zeros)
    Index(usize),

    /// Any array index (rule paths only)
    Wildcard,
}

impl Segment {
    /// Classify one raw segment of a dotted path.
    ///
    /// `path` is only used for error reporting.
    pub(crate) fn parse(raw: &str, path: &str, position: usize) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::EmptySegment {
                path: path.to_string(),
                position,
            });
        }

        if raw == WILDCARD {
            return Ok(Segment::Wildcard);
        }

        if raw.contains('[') || raw.contains(']') {
            return Err(PathError::UnsupportedWildcard {
                path: path.to_string(),
                segment: raw.to_string(),
            });
        }

        Ok(Self::from_text(raw))
    }

    /// Classify text as a key or an index, never as a wildcard.
    ///
    /// `"01"` stays a key: only the canonical form of a number is an index.
    pub fn from_text(raw: &str) -> Self {
        let canonical = raw == "0" || (!raw.starts_with('0') && raw.bytes().all(|b| b.is_ascii_digit()));
        if canonical {
            if let Ok(index) = raw.parse::<usize>() {
                return Segment::Index(index);
            }
        }
        Segment::Key(raw.to_string())
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Wildcard)
    }

    /// Text used to look this segment up in a mapping.
    ///
    /// Mappings may have numeric keys, so an index is also a valid key.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            Segment::Key(key) => Cow::Borrowed(key),
            Segment::Index(index) => Cow::Owned(index.to_string()),
            Segment::Wildcard => Cow::Borrowed(WILDCARD),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "{}", index),
            Segment::Wildcard => f.write_str(WILDCARD),
        }
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::from_text(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_text_is_index() {
        assert_eq!(Segment::from_text("0"), Segment::Index(0));
        assert_eq!(Segment::from_text("42"), Segment::Index(42));
    }

    #[test]
    fn test_non_canonical_number_is_key() {
        assert_eq!(Segment::from_text("01"), Segment::Key("01".to_string()));
        assert_eq!(Segment::from_text("-1"), Segment::Key("-1".to_string()));
        assert_eq!(Segment::from_text("1e3"), Segment::Key("1e3".to_string()));
    }

    #[test]
    fn test_bracket_text_must_be_exact_wildcard() {
        assert_eq!(Segment::parse("[]", "a.[]", 1), Ok(Segment::Wildcard));
        assert!(matches!(
            Segment::parse("[*]", "a.[*]", 1),
            Err(PathError::UnsupportedWildcard { .. })
        ));
        assert!(matches!(
            Segment::parse("items[]", "items[]", 0),
            Err(PathError::UnsupportedWildcard { .. })
        ));
    }

    #[test]
    fn test_index_as_key() {
        assert_eq!(Segment::Index(3).as_key(), "3");
        assert_eq!(Segment::Key("name".into()).as_key(), "name");
    }
}
