//! In-memory history provider for tests and fixtures.

use std::collections::{HashMap, HashSet};

use lodestar_core::revision::{RevisionFacts, Timeline};
use lodestar_core::source::{RevisionId, SourceId};

use crate::{ProviderError, RevisionHistory};

/// A provider backed by pre-built timelines.
///
/// Facts default to empty (all-`None`) records when not explicitly set, so
/// scorer backfill paths are exercised without extra wiring. Sources listed
/// via [`InMemoryHistory::poison_facts`] fail fact lookups, simulating a
/// metadata outage without touching the timeline itself.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    timelines: HashMap<SourceId, Timeline>,
    facts: HashMap<(SourceId, RevisionId), RevisionFacts>,
    poisoned: HashSet<SourceId>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_timeline(&mut self, timeline: Timeline) -> &mut Self {
        self.timelines.insert(timeline.source().clone(), timeline);
        self
    }

    pub fn insert_facts(
        &mut self,
        source: impl Into<String>,
        revision: impl Into<String>,
        facts: RevisionFacts,
    ) -> &mut Self {
        self.facts.insert(
            (
                SourceId::new(source.into()),
                RevisionId::new(revision.into()),
            ),
            facts,
        );
        self
    }

    /// Make fact lookups for a source fail with a retryable error.
    pub fn poison_facts(&mut self, source: impl Into<String>) -> &mut Self {
        self.poisoned.insert(SourceId::new(source.into()));
        self
    }
}

impl RevisionHistory for InMemoryHistory {
    async fn timeline(&self, source: &SourceId) -> Result<Timeline, ProviderError> {
        self.timelines
            .get(source)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownSource {
                source_id: source.to_string(),
            })
    }

    async fn facts(
        &self,
        source: &SourceId,
        revision: &RevisionId,
    ) -> Result<RevisionFacts, ProviderError> {
        if self.poisoned.contains(source) {
            return Err(ProviderError::Lookup {
                source_id: source.to_string(),
                message: "metadata unavailable".to_string(),
            });
        }
        Ok(self
            .facts
            .get(&(source.clone(), revision.clone()))
            .cloned()
            .unwrap_or_default())
    }
}
