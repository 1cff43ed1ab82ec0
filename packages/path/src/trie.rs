//! # Wildcard Path Trie
//!
//! Indexes rule paths segment by segment so that resolving a concrete path
//! costs time proportional to its depth, not to the number of rules.
//!
//! ```text
//! items ─┬─ [] ── name      ← "items.[].name"
//!        └─ 0 ─── name      ← "items.0.name"
//! ```
//!
//! Resolution walks breadth-first, consuming one concrete segment per level.
//! At each level it follows the exact child for the segment and, when the
//! segment is an array index, the wildcard child as well.

use std::collections::{HashMap, VecDeque};

use crate::{FieldPath, RulePath, Segment};

#[derive(Debug, Clone)]
struct TrieNode<T> {
    exact: HashMap<String, TrieNode<T>>,
    wildcard: Option<Box<TrieNode<T>>>,
    /// Rule ending at this node and its payload
    terminal: Option<(RulePath, T)>,
}

impl<T> TrieNode<T> {
    fn new() -> Self {
        Self {
            exact: HashMap::new(),
            wildcard: None,
            terminal: None,
        }
    }
}

/// A rule found by [`PathTrie::resolve`]
#[derive(Debug, PartialEq)]
pub struct TrieMatch<'a, T> {
    pub rule: &'a RulePath,
    pub value: &'a T,
}

/// Trie of rule paths, each carrying a payload
#[derive(Debug, Clone)]
pub struct PathTrie<T> {
    root: TrieNode<T>,
    len: usize,
}

impl<T> PathTrie<T> {
    pub fn new() -> Self {
        Self {
            root: TrieNode::new(),
            len: 0,
        }
    }

    /// Insert a rule, one branch per segment.
    ///
    /// Inserting the same rule again replaces its payload and returns the
    /// previous one; the trie shape is unchanged.
    pub fn insert(&mut self, rule: RulePath, value: T) -> Option<T> {
        let mut node = &mut self.root;
        for segment in rule.segments() {
            node = match segment {
                Segment::Wildcard => &mut **node.wildcard.get_or_insert_with(|| Box::new(TrieNode::new())),
                exact => node
                    .exact
                    .entry(exact.as_key().into_owned())
                    .or_insert_with(TrieNode::new),
            };
        }

        let previous = node.terminal.replace((rule, value)).map(|(_, v)| v);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Every rule whose full segment sequence matches `path`, most specific first.
    pub fn resolve(&self, path: &FieldPath) -> Vec<TrieMatch<'_, T>> {
        let segments = path.segments();
        let mut matches = Vec::new();
        let mut queue: VecDeque<(&TrieNode<T>, usize)> = VecDeque::new();
        queue.push_back((&self.root, 0));

        while let Some((node, depth)) = queue.pop_front() {
            if depth == segments.len() {
                if let Some((rule, value)) = &node.terminal {
                    matches.push(TrieMatch { rule, value });
                }
                continue;
            }

            let segment = &segments[depth];
            if let Some(child) = node.exact.get(segment.as_key().as_ref()) {
                queue.push_back((child, depth + 1));
            }
            if segment.is_index() {
                if let Some(child) = &node.wildcard {
                    queue.push_back((&**child, depth + 1));
                }
            }
        }

        matches.sort_by_key(|m| m.rule.specificity());
        matches
    }

    /// The most specific rule matching `path`
    pub fn resolve_best(&self, path: &FieldPath) -> Option<TrieMatch<'_, T>> {
        self.resolve(path).into_iter().next()
    }

    /// Number of distinct rules
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.root = TrieNode::new();
        self.len = 0;
    }

    /// All inserted rules, in no particular order
    pub fn rules(&self) -> Vec<&RulePath> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if let Some((rule, _)) = &node.terminal {
                out.push(rule);
            }
            stack.extend(node.exact.values());
            if let Some(child) = &node.wildcard {
                stack.push(&**child);
            }
        }
        out
    }
}

impl<T> Default for PathTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(RulePath, T)> for PathTrie<T> {
    fn from_iter<I: IntoIterator<Item = (RulePath, T)>>(iter: I) -> Self {
        let mut trie = Self::new();
        for (rule, value) in iter {
            trie.insert(rule, value);
        }
        trie
    }
}
