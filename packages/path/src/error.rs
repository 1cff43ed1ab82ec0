//! Error types for path parsing

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Empty segment at position {position} in path '{path}'")]
    EmptySegment { path: String, position: usize },

    #[error("Unsupported wildcard syntax '{segment}' in path '{path}' (expected '[]')")]
    UnsupportedWildcard { path: String, segment: String },

    #[error("Concrete path '{0}' cannot contain a wildcard segment")]
    WildcardInConcretePath(String),

    #[error("Rule path '{path}' has {expected} wildcard(s) but {given} index(es) were supplied")]
    IndexCountMismatch {
        path: String,
        expected: usize,
        given: usize,
    },
}
