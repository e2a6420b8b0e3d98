//! Run-scoped dimension index: memoized timelines and revision metadata.
//!
//! Timelines are loaded once per run and never reloaded, so revision
//! references stay referentially stable for the whole search. Provider
//! fan-out is bounded by a semaphore and fully awaited before the search
//! controller consumes any result.

use std::collections::{BTreeSet, HashMap};

use futures_util::future::join_all;
use tokio::sync::Semaphore;

use lodestar_core::config::ProviderConfig;
use lodestar_core::revision::{Revision, RevisionFacts, Timeline};
use lodestar_core::source::{RevisionId, SourceId};
use lodestar_provider::retry::{with_retry, RetryPolicy};
use lodestar_provider::{ProviderError, RevisionHistory};

/// Per-run cache over a revision-history provider.
pub struct DimensionIndex<'p, P> {
    provider: &'p P,
    policy: RetryPolicy,
    max_concurrent: usize,
    timelines: HashMap<SourceId, Timeline>,
    /// `None` marks a failed fact fetch; the scorer backfills it.
    facts: HashMap<(SourceId, RevisionId), Option<RevisionFacts>>,
}

impl<'p, P: RevisionHistory> DimensionIndex<'p, P> {
    pub fn new(provider: &'p P, config: &ProviderConfig) -> Self {
        Self {
            provider,
            policy: RetryPolicy::from_config(config),
            max_concurrent: config.max_concurrent.max(1),
            timelines: HashMap::new(),
            facts: HashMap::new(),
        }
    }

    /// Load one dimension's timeline, memoized for the run.
    pub async fn load(&mut self, source: &SourceId) -> Result<&Timeline, ProviderError> {
        if !self.timelines.contains_key(source) {
            self.load_many([source.clone()]).await?;
        }
        Ok(&self.timelines[source])
    }

    /// Load several timelines with bounded concurrency. Any single failure
    /// fails the batch: a dimension that cannot be enumerated leaves the
    /// whole run without a valid configuration.
    pub async fn load_many(
        &mut self,
        sources: impl IntoIterator<Item = SourceId>,
    ) -> Result<(), ProviderError> {
        let missing: BTreeSet<SourceId> = sources
            .into_iter()
            .filter(|s| !self.timelines.contains_key(s))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let semaphore = Semaphore::new(self.max_concurrent);
        let provider = self.provider;
        let policy = self.policy;
        let fetches = missing.iter().map(|source| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore.acquire().await;
                let timeline = with_retry(policy, &format!("timeline({source})"), || {
                    provider.timeline(source)
                })
                .await?;
                Ok::<(SourceId, Timeline), ProviderError>((source.clone(), timeline))
            }
        });

        for result in join_all(fetches).await {
            let (source, timeline) = result?;
            tracing::debug!("loaded timeline for {source} ({} revisions)", timeline.len());
            self.timelines.insert(source, timeline);
        }
        Ok(())
    }

    pub fn timeline(&self, source: &SourceId) -> Option<&Timeline> {
        self.timelines.get(source)
    }

    pub fn revision(&self, source: &SourceId, id: &RevisionId) -> Option<&Revision> {
        self.timelines.get(source).and_then(|t| t.get(id))
    }

    pub fn revision_at(&self, source: &SourceId, ordinal: usize) -> Option<&Revision> {
        self.timelines.get(source).and_then(|t| t.at(ordinal))
    }

    /// Timeline neighbors of a selected revision, one ordinal step each way.
    pub fn neighbors(
        &self,
        source: &SourceId,
        id: &RevisionId,
    ) -> (Option<&Revision>, Option<&Revision>) {
        match self.timelines.get(source) {
            Some(t) => t.neighbors(id),
            None => (None, None),
        }
    }

    /// Fetch scorer metadata for the given revisions with bounded
    /// concurrency. Failures degrade to an absent record rather than failing
    /// the run; the scorer backfills the gap.
    pub async fn ensure_facts(&mut self, wanted: impl IntoIterator<Item = (SourceId, RevisionId)>) {
        let missing: BTreeSet<(SourceId, RevisionId)> = wanted
            .into_iter()
            .filter(|key| !self.facts.contains_key(key))
            .collect();
        if missing.is_empty() {
            return;
        }

        let semaphore = Semaphore::new(self.max_concurrent);
        let provider = self.provider;
        let policy = self.policy;
        let fetches = missing.iter().map(|(source, revision)| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore.acquire().await;
                let outcome = with_retry(policy, &format!("facts({source}@{revision})"), || {
                    provider.facts(source, revision)
                })
                .await;
                ((source.clone(), revision.clone()), outcome)
            }
        });

        for (key, outcome) in join_all(fetches).await {
            let record = match outcome {
                Ok(facts) => Some(facts),
                Err(e) => {
                    tracing::warn!(
                        "facts for {}@{} unavailable, falling back to median backfill: {e}",
                        key.0,
                        key.1
                    );
                    None
                }
            };
            self.facts.insert(key, record);
        }
    }

    pub fn facts(&self, source: &SourceId, id: &RevisionId) -> Option<&RevisionFacts> {
        self.facts
            .get(&(source.clone(), id.clone()))
            .and_then(|record| record.as_ref())
    }
}
