//! Cache Key Module
//!
//! Hierarchical keys addressing one slot in the cache tree.

use std::fmt;

// == Key ==
/// An ordered sequence of segments addressing one cache slot.
///
/// A plain string is a single segment and is never split, so `"a.b"` and
/// `["a", "b"]` are different keys while `"a"` and `["a"]` are the same.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Key(Vec<String>);

impl Key {
    /// Creates a key from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Returns the key segments in order.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true if the key has no segments and thus addresses nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `prefix` addresses this key or one of its containers.
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(vec![key.to_string()])
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(vec![key])
    }
}

impl From<&String> for Key {
    fn from(key: &String) -> Self {
        Self(vec![key.clone()])
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl From<Vec<String>> for Key {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<Vec<&str>> for Key {
    fn from(segments: Vec<&str>) -> Self {
        Self::new(segments)
    }
}

impl From<&[&str]> for Key {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Key {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}
