//! Metadata predicates applied during search.
//!
//! The store only sees the [`MetadataFilter`] trait. [`KeyValueFilter`] is
//! the built-in equality filter; any `Fn(&Metadata) -> bool` closure works
//! as well.

use std::collections::HashMap;

use cadence_core::types::Metadata;

/// Predicate over a song's metadata.
pub trait MetadataFilter: Send + Sync {
    /// Return true if the song should be considered by the search.
    fn matches(&self, metadata: &Metadata) -> bool;
}

impl<F> MetadataFilter for F
where
    F: Fn(&Metadata) -> bool + Send + Sync,
{
    fn matches(&self, metadata: &Metadata) -> bool {
        self(metadata)
    }
}

/// Matches when every key-value pair is present in the metadata with
/// exactly the same value. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueFilter(HashMap<String, String>);

impl KeyValueFilter {
    pub fn new(pairs: HashMap<String, String>) -> Self {
        Self(pairs)
    }

    /// Add a required pair.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, String>> for KeyValueFilter {
    fn from(pairs: HashMap<String, String>) -> Self {
        Self(pairs)
    }
}

impl MetadataFilter for KeyValueFilter {
    fn matches(&self, metadata: &Metadata) -> bool {
        self.0
            .iter()
            .all(|(key, value)| metadata.get(key) == Some(value))
    }
}

/// Matches when the value under `key` starts with `prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixFilter {
    key: String,
    prefix: String,
}

impl PrefixFilter {
    pub fn new(key: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            prefix: prefix.into(),
        }
    }
}

impl MetadataFilter for PrefixFilter {
    fn matches(&self, metadata: &Metadata) -> bool {
        metadata
            .get(&self.key)
            .is_some_and(|v| v.starts_with(&self.prefix))
    }
}
