//! Successor enumeration: every configuration reachable by stepping exactly
//! one dimension (or one fingerprint-merged group of dimensions) a single
//! revision along its timeline.

use std::collections::BTreeMap;

use lodestar_core::configuration::Configuration;
use lodestar_core::source::SourceId;
use lodestar_provider::RevisionHistory;

use crate::bounder::ActiveSet;
use crate::index::DimensionIndex;

/// Which way to step along a timeline.
#[derive(Debug, Clone, Copy)]
enum Step {
    Previous,
    Next,
}

/// Enumerate neighbor configurations of `config`.
///
/// Dimensions whose selected revisions share a content fingerprint point at
/// the same physical content through different declared paths; they are
/// merged into one group and always step together, which halves the
/// branching factor for that case without losing any reachable assignment.
/// At most `2 × groups` successors are produced.
pub fn successors<P: RevisionHistory>(
    config: &Configuration,
    active: &ActiveSet,
    index: &DimensionIndex<'_, P>,
) -> Vec<Configuration> {
    let mut singles: Vec<Vec<&SourceId>> = Vec::new();
    let mut merged: BTreeMap<&str, Vec<&SourceId>> = BTreeMap::new();

    for source in active.iter() {
        let Some(selected) = config.get(source) else {
            continue;
        };
        let Some(revision) = index.revision(source, selected) else {
            continue;
        };
        match revision.fingerprint.as_deref() {
            Some(fingerprint) => merged.entry(fingerprint).or_default().push(source),
            None => singles.push(vec![source]),
        }
    }

    let groups = singles.into_iter().chain(merged.into_values());

    let mut out = Vec::new();
    for group in groups {
        for step in [Step::Previous, Step::Next] {
            if let Some(succ) = step_group(config, &group, step, index) {
                out.push(succ);
            }
        }
    }
    out
}

/// Step every dimension in a group one revision in the same direction.
/// Returns `None` when any member is already at the end of its timeline:
/// merged dimensions only ever move together.
fn step_group<P: RevisionHistory>(
    config: &Configuration,
    group: &[&SourceId],
    step: Step,
    index: &DimensionIndex<'_, P>,
) -> Option<Configuration> {
    let mut next = config.clone();
    for &source in group {
        let selected = config.get(source)?;
        let (previous, forward) = index.neighbors(source, selected);
        let neighbor = match step {
            Step::Previous => previous,
            Step::Next => forward,
        }?;
        next = next.with(source.clone(), neighbor.id.clone());
    }
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestar_core::config::ProviderConfig;
    use lodestar_core::revision::{Revision, Timeline};
    use lodestar_core::source::RevisionId;
    use lodestar_provider::memory::InMemoryHistory;

    async fn index_for<'a>(
        p: &'a InMemoryHistory,
        sources: &[&str],
    ) -> DimensionIndex<'a, InMemoryHistory> {
        let mut index = DimensionIndex::new(p, &ProviderConfig::default());
        index
            .load_many(sources.iter().map(|s| SourceId::new(*s)))
            .await
            .unwrap();
        index
    }

    fn active_for(sources: &[&str]) -> ActiveSet {
        let mut active = ActiveSet::default();
        for s in sources {
            active.insert(SourceId::new(*s));
        }
        active
    }

    #[tokio::test]
    async fn interior_revision_steps_both_ways() {
        let mut p = InMemoryHistory::new();
        p.insert_timeline(
            Timeline::new(
                SourceId::new("a"),
                vec![
                    Revision::new("r0"),
                    Revision::new("r1"),
                    Revision::new("r2"),
                ],
            )
            .unwrap(),
        );
        let index = index_for(&p, &["a"]).await;
        let active = active_for(&["a"]);
        let config = Configuration::empty().with(SourceId::new("a"), RevisionId::new("r1"));

        let succ = successors(&config, &active, &index);
        assert_eq!(succ.len(), 2);
        let selected: Vec<_> = succ
            .iter()
            .map(|c| c.get(&SourceId::new("a")).unwrap().clone())
            .collect();
        assert!(selected.contains(&RevisionId::new("r0")));
        assert!(selected.contains(&RevisionId::new("r2")));
    }

    #[tokio::test]
    async fn timeline_ends_prune_moves() {
        let mut p = InMemoryHistory::new();
        p.insert_timeline(
            Timeline::new(
                SourceId::new("a"),
                vec![Revision::new("r0"), Revision::new("r1")],
            )
            .unwrap(),
        );
        let index = index_for(&p, &["a"]).await;
        let active = active_for(&["a"]);

        let at_start = Configuration::empty().with(SourceId::new("a"), RevisionId::new("r0"));
        assert_eq!(successors(&at_start, &active, &index).len(), 1);

        let single = Configuration::empty().with(SourceId::new("a"), RevisionId::new("r0"));
        let mut p2 = InMemoryHistory::new();
        p2.insert_timeline(
            Timeline::new(SourceId::new("a"), vec![Revision::new("r0")]).unwrap(),
        );
        let index2 = index_for(&p2, &["a"]).await;
        assert!(successors(&single, &active, &index2).is_empty());
    }

    #[tokio::test]
    async fn fingerprint_merged_dimensions_move_together() {
        let mut p = InMemoryHistory::new();
        for name in ["a", "b"] {
            p.insert_timeline(
                Timeline::new(
                    SourceId::new(name),
                    vec![
                        Revision::new("r0").with_fingerprint("blob0"),
                        Revision::new("r1").with_fingerprint("blob1"),
                        Revision::new("r2").with_fingerprint("blob2"),
                    ],
                )
                .unwrap(),
            );
        }
        let index = index_for(&p, &["a", "b"]).await;
        let active = active_for(&["a", "b"]);
        // Both dimensions point at the same content.
        let config = Configuration::empty()
            .with(SourceId::new("a"), RevisionId::new("r1"))
            .with(SourceId::new("b"), RevisionId::new("r1"));

        let succ = successors(&config, &active, &index);
        // One merged group, two directions; not four single-dimension moves.
        assert_eq!(succ.len(), 2);
        for s in &succ {
            assert_eq!(
                s.get(&SourceId::new("a")),
                s.get(&SourceId::new("b")),
                "merged dimensions must step in lockstep"
            );
        }
    }

    #[tokio::test]
    async fn distinct_fingerprints_stay_separate() {
        let mut p = InMemoryHistory::new();
        p.insert_timeline(
            Timeline::new(
                SourceId::new("a"),
                vec![
                    Revision::new("r0").with_fingerprint("blob-a0"),
                    Revision::new("r1").with_fingerprint("blob-a1"),
                ],
            )
            .unwrap(),
        );
        p.insert_timeline(
            Timeline::new(
                SourceId::new("b"),
                vec![
                    Revision::new("r0").with_fingerprint("blob-b0"),
                    Revision::new("r1").with_fingerprint("blob-b1"),
                ],
            )
            .unwrap(),
        );
        let index = index_for(&p, &["a", "b"]).await;
        let active = active_for(&["a", "b"]);
        let config = Configuration::empty()
            .with(SourceId::new("a"), RevisionId::new("r0"))
            .with(SourceId::new("b"), RevisionId::new("r0"));

        // Each dimension moves independently: one forward move each.
        let succ = successors(&config, &active, &index);
        assert_eq!(succ.len(), 2);
    }
}
