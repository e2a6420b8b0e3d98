//! Immutable configuration snapshots: one selected revision per active
//! dimension.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::source::{RevisionId, SourceId};

/// A candidate assignment of revisions across active dimensions.
///
/// Configurations are value types: the successor generator and the search
/// controller derive new configurations with [`Configuration::with`] and
/// never mutate an existing one. The backing map is a `BTreeMap` so
/// equality, hashing, and iteration order are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Configuration {
    selected: BTreeMap<SourceId, RevisionId>,
}

impl Configuration {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A copy of this configuration with one dimension (re)assigned.
    #[must_use]
    pub fn with(&self, source: SourceId, revision: RevisionId) -> Self {
        let mut selected = self.selected.clone();
        selected.insert(source, revision);
        Self { selected }
    }

    pub fn get(&self, source: &SourceId) -> Option<&RevisionId> {
        self.selected.get(source)
    }

    pub fn contains(&self, source: &SourceId) -> bool {
        self.selected.contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceId, &RevisionId)> {
        self.selected.iter()
    }

    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.selected.keys()
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        f.write_str("{")?;
        for (source, revision) in &self.selected {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{source}@{revision}")?;
            first = false;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_leaves_original_untouched() {
        let base = Configuration::empty().with(SourceId::new("a"), RevisionId::new("r1"));
        let stepped = base.with(SourceId::new("a"), RevisionId::new("r2"));
        assert_eq!(base.get(&SourceId::new("a")), Some(&RevisionId::new("r1")));
        assert_eq!(
            stepped.get(&SourceId::new("a")),
            Some(&RevisionId::new("r2"))
        );
        assert_ne!(base, stepped);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = Configuration::empty()
            .with(SourceId::new("x"), RevisionId::new("r1"))
            .with(SourceId::new("y"), RevisionId::new("r2"));
        let b = Configuration::empty()
            .with(SourceId::new("y"), RevisionId::new("r2"))
            .with(SourceId::new("x"), RevisionId::new("r1"));
        assert_eq!(a, b);
    }

    #[test]
    fn display_is_sorted() {
        let c = Configuration::empty()
            .with(SourceId::new("b"), RevisionId::new("r2"))
            .with(SourceId::new("a"), RevisionId::new("r1"));
        assert_eq!(c.to_string(), "{a@r1, b@r2}");
    }
}
