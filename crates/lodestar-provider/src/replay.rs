//! Record/replay providers for deterministic resolution runs.
//!
//! `Recorder` wraps any provider and captures every response; the captured
//! session serializes to JSON. `ReplayHistory` serves a captured session
//! back, so two runs over the same session see byte-identical provider
//! data.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use lodestar_core::revision::{RevisionFacts, Timeline};
use lodestar_core::source::{RevisionId, SourceId};

use crate::{ProviderError, RevisionHistory};

/// A captured provider session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub timelines: Vec<Timeline>,
    #[serde(default)]
    pub facts: Vec<FactsRecord>,
}

/// One recorded facts response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactsRecord {
    pub source: SourceId,
    pub revision: RevisionId,
    pub facts: RevisionFacts,
}

impl Session {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

/// Wraps a provider and records every successful response.
pub struct Recorder<P> {
    inner: P,
    session: Mutex<Session>,
}

impl<P> Recorder<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            session: Mutex::new(Session::default()),
        }
    }

    /// The session captured so far.
    pub fn session(&self) -> Session {
        self.session.lock().expect("session lock poisoned").clone()
    }
}

impl<P: RevisionHistory + Sync> RevisionHistory for Recorder<P> {
    async fn timeline(&self, source: &SourceId) -> Result<Timeline, ProviderError> {
        let timeline = self.inner.timeline(source).await?;
        let mut session = self.session.lock().expect("session lock poisoned");
        if !session.timelines.iter().any(|t| t.source() == source) {
            session.timelines.push(timeline.clone());
        }
        Ok(timeline)
    }

    async fn facts(
        &self,
        source: &SourceId,
        revision: &RevisionId,
    ) -> Result<RevisionFacts, ProviderError> {
        let facts = self.inner.facts(source, revision).await?;
        let mut session = self.session.lock().expect("session lock poisoned");
        let seen = session
            .facts
            .iter()
            .any(|r| &r.source == source && &r.revision == revision);
        if !seen {
            session.facts.push(FactsRecord {
                source: source.clone(),
                revision: revision.clone(),
                facts: facts.clone(),
            });
        }
        Ok(facts)
    }
}

/// Serves a previously captured session.
#[derive(Debug)]
pub struct ReplayHistory {
    timelines: HashMap<SourceId, Timeline>,
    facts: HashMap<(SourceId, RevisionId), RevisionFacts>,
}

impl ReplayHistory {
    pub fn from_session(session: Session) -> Self {
        let timelines = session
            .timelines
            .into_iter()
            .map(|t| (t.source().clone(), t))
            .collect();
        let facts = session
            .facts
            .into_iter()
            .map(|r| ((r.source, r.revision), r.facts))
            .collect();
        Self { timelines, facts }
    }

    pub fn from_path(path: &Path) -> Result<Self, ProviderError> {
        let content = std::fs::read_to_string(path).map_err(|e| ProviderError::Lookup {
            source_id: path.display().to_string(),
            message: format!("failed to read session: {e}"),
        })?;
        let session = Session::from_json(&content).map_err(|e| ProviderError::Lookup {
            source_id: path.display().to_string(),
            message: format!("failed to parse session: {e}"),
        })?;
        Ok(Self::from_session(session))
    }
}

impl RevisionHistory for ReplayHistory {
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
        self.facts
            .get(&(source.clone(), revision.clone()))
            .cloned()
            .ok_or_else(|| ProviderError::Lookup {
                source_id: source.to_string(),
                message: format!("no recorded facts for {revision}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryHistory;
    use lodestar_core::revision::Revision;

    fn fixture() -> InMemoryHistory {
        let mut p = InMemoryHistory::new();
        p.insert_timeline(
            Timeline::new(
                SourceId::new("example/lib"),
                vec![Revision::new("r0"), Revision::new("r1")],
            )
            .unwrap(),
        );
        p.insert_facts(
            "example/lib",
            "r0",
            RevisionFacts {
                timestamp: Some(1_600_000_000),
                tagged: Some(false),
                advisories: Some(1),
            },
        );
        p
    }

    #[tokio::test]
    async fn record_then_replay_matches() {
        let recorder = Recorder::new(fixture());
        let source = SourceId::new("example/lib");
        let live_timeline = recorder.timeline(&source).await.unwrap();
        let live_facts = recorder.facts(&source, &RevisionId::new("r0")).await.unwrap();

        let json = recorder.session().to_json().unwrap();
        let replay = ReplayHistory::from_session(Session::from_json(&json).unwrap());

        let replayed_timeline = replay.timeline(&source).await.unwrap();
        assert_eq!(replayed_timeline.len(), live_timeline.len());
        assert_eq!(
            replayed_timeline.latest().id,
            live_timeline.latest().id
        );

        let replayed_facts = replay.facts(&source, &RevisionId::new("r0")).await.unwrap();
        assert_eq!(replayed_facts, live_facts);
    }

    #[tokio::test]
    async fn replay_misses_are_errors() {
        let replay = ReplayHistory::from_session(Session::default());
        let result = replay.timeline(&SourceId::new("example/lib")).await;
        assert!(matches!(result, Err(ProviderError::UnknownSource { .. })));
    }
}
