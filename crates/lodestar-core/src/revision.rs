//! Revisions, the dependencies they declare, and the ordered timelines that
//! contain them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::errors::CoreError;
use crate::source::{RevisionId, SourceId};
use crate::version::ChronoVersion;

/// A sub-dependency declared by one revision: the dimension it requires and
/// the constraint it imposes on that dimension's selected revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRef {
    pub target: SourceId,
    pub constraint: Constraint,
}

impl DependencyRef {
    pub fn new(target: impl Into<SourceId>, constraint: Constraint) -> Self {
        Self {
            target: target.into(),
            constraint,
        }
    }
}

/// One point within a dimension's timeline.
///
/// The ordinal is assigned by [`Timeline::new`] from history order and is
/// only meaningful within that timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: RevisionId,
    #[serde(skip)]
    pub ordinal: usize,
    /// Version label attached to the revision (tag), if any.
    #[serde(default)]
    pub version: Option<ChronoVersion>,
    /// Content fingerprint of the extraction target at this revision. Two
    /// dimensions whose selected revisions share a fingerprint point at the
    /// same physical content.
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
}

impl Revision {
    pub fn new(id: impl Into<RevisionId>) -> Self {
        Self {
            id: id.into(),
            ordinal: 0,
            version: None,
            fingerprint: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: ChronoVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn with_dependency(mut self, dep: DependencyRef) -> Self {
        self.dependencies.push(dep);
        self
    }
}

/// Provider-supplied metadata about one revision, consumed by the heuristic
/// scorer. Every field is optional; absent facts are median-backfilled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionFacts {
    /// Commit timestamp, seconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Whether the revision carries a release tag.
    #[serde(default)]
    pub tagged: Option<bool>,
    /// Number of known security advisories affecting the revision.
    #[serde(default)]
    pub advisories: Option<u32>,
}

/// One dimension's revision timeline, strictly ordered by history.
///
/// Immutable once constructed; provides O(1) ordinal and token lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TimelineRepr", into = "TimelineRepr")]
pub struct Timeline {
    source: SourceId,
    revisions: Vec<Revision>,
    by_id: HashMap<RevisionId, usize>,
}

/// Serialized form of a timeline (ordinals and the id index are rebuilt on
/// deserialization).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimelineRepr {
    source: SourceId,
    revisions: Vec<Revision>,
}

impl Timeline {
    /// Build a timeline from oldest-to-newest revisions, assigning ordinals.
    pub fn new(source: SourceId, revisions: Vec<Revision>) -> Result<Self, CoreError> {
        if revisions.is_empty() {
            return Err(CoreError::Timeline {
                message: format!("timeline for {source} has no revisions"),
            });
        }
        let mut by_id = HashMap::with_capacity(revisions.len());
        let mut revisions = revisions;
        for (ordinal, rev) in revisions.iter_mut().enumerate() {
            rev.ordinal = ordinal;
            if by_id.insert(rev.id.clone(), ordinal).is_some() {
                return Err(CoreError::Timeline {
                    message: format!("timeline for {source} repeats revision {}", rev.id),
                });
            }
        }
        Ok(Self {
            source,
            revisions,
            by_id,
        })
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    pub fn at(&self, ordinal: usize) -> Option<&Revision> {
        self.revisions.get(ordinal)
    }

    pub fn get(&self, id: &RevisionId) -> Option<&Revision> {
        self.by_id.get(id).map(|&i| &self.revisions[i])
    }

    pub fn latest(&self) -> &Revision {
        // Construction rejects empty timelines.
        self.revisions.last().expect("timeline is never empty")
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Revision> {
        self.revisions.iter()
    }

    /// The immediate timeline neighbors of a revision, one ordinal step away.
    pub fn neighbors(&self, id: &RevisionId) -> (Option<&Revision>, Option<&Revision>) {
        let Some(&ordinal) = self.by_id.get(id) else {
            return (None, None);
        };
        let previous = ordinal.checked_sub(1).and_then(|i| self.revisions.get(i));
        let next = self.revisions.get(ordinal + 1);
        (previous, next)
    }
}

impl TryFrom<TimelineRepr> for Timeline {
    type Error = CoreError;

    fn try_from(repr: TimelineRepr) -> Result<Self, Self::Error> {
        Self::new(repr.source, repr.revisions)
    }
}

impl From<Timeline> for TimelineRepr {
    fn from(timeline: Timeline) -> Self {
        Self {
            source: timeline.source,
            revisions: timeline.revisions,
        }
    }
}
