//! Permission tokens.

use std::collections::BTreeSet;
use std::fmt;

/// A set of permission tokens the current actor holds on an entity.
///
/// Ordered so that formatting and comparisons are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet {
    tokens: BTreeSet<String>,
}

impl CapabilitySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token, returning whether it was newly inserted.
    pub fn insert(&mut self, token: impl Into<String>) -> bool {
        self.tokens.insert(token.into())
    }

    /// Remove a token, returning whether it was present.
    pub fn remove(&mut self, token: &str) -> bool {
        self.tokens.remove(token)
    }

    /// Whether the set holds `token`.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Merge every token of `other` into this set.
    pub fn extend_from(&mut self, other: &CapabilitySet) {
        self.tokens.extend(other.tokens.iter().cloned());
    }

    /// The union of both sets.
    pub fn union(&self, other: &CapabilitySet) -> CapabilitySet {
        let mut out = self.clone();
        out.extend_from(other);
        out
    }

    /// Whether the two sets share at least one token.
    pub fn intersects(&self, other: &CapabilitySet) -> bool {
        !self.tokens.is_disjoint(&other.tokens)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Iterate tokens in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(token)?;
        }
        f.write_str("}")
    }
}

impl<S: Into<String>> FromIterator<S> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for CapabilitySet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.tokens.extend(iter.into_iter().map(Into::into));
    }
}

impl<const N: usize> From<[&str; N]> for CapabilitySet {
    fn from(tokens: [&str; N]) -> Self {
        tokens.into_iter().collect()
    }
}

impl From<&str> for CapabilitySet {
    fn from(token: &str) -> Self {
        [token].into_iter().collect()
    }
}

impl From<Vec<String>> for CapabilitySet {
    fn from(tokens: Vec<String>) -> Self {
        tokens.into_iter().collect()
    }
}
