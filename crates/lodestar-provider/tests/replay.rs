use std::io::Write;

use lodestar_core::revision::{Revision, RevisionFacts, Timeline};
use lodestar_core::source::{RevisionId, SourceId};
use lodestar_provider::memory::InMemoryHistory;
use lodestar_provider::replay::{Recorder, ReplayHistory};
use lodestar_provider::RevisionHistory;
use tempfile::NamedTempFile;

fn fixture() -> InMemoryHistory {
    let mut p = InMemoryHistory::new();
    p.insert_timeline(
        Timeline::new(
            SourceId::new("example/lib"),
            vec![
                Revision::new("r0"),
                Revision::new("r1"),
                Revision::new("r2"),
            ],
        )
        .unwrap(),
    );
    p.insert_facts(
        "example/lib",
        "r2",
        RevisionFacts {
            timestamp: Some(1_700_000_000),
            tagged: Some(true),
            advisories: Some(0),
        },
    );
    p
}

#[tokio::test]
async fn session_survives_disk_roundtrip() {
    let recorder = Recorder::new(fixture());
    let source = SourceId::new("example/lib");
    recorder.timeline(&source).await.unwrap();
    recorder
        .facts(&source, &RevisionId::new("r2"))
        .await
        .unwrap();

    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(recorder.session().to_json().unwrap().as_bytes())
        .unwrap();
    tmp.flush().unwrap();

    let replay = ReplayHistory::from_path(tmp.path()).unwrap();
    let timeline = replay.timeline(&source).await.unwrap();
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline.latest().id, RevisionId::new("r2"));

    let facts = replay.facts(&source, &RevisionId::new("r2")).await.unwrap();
    assert_eq!(facts.tagged, Some(true));
}

#[tokio::test]
async fn recording_is_idempotent() {
    let recorder = Recorder::new(fixture());
    let source = SourceId::new("example/lib");
    recorder.timeline(&source).await.unwrap();
    recorder.timeline(&source).await.unwrap();

    let session = recorder.session();
    assert_eq!(session.timelines.len(), 1);
}
