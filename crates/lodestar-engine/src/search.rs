//! The A* search controller.
//!
//! Single-threaded by design: open/closed-set bookkeeping depends on strict
//! step ordering. The only concurrency in a run is the bounded provider
//! fan-out inside the dimension index, and those calls are fully awaited
//! before the loop consumes their results. Ties in the open set break by
//! lower heuristic, then insertion order, so identical inputs replay to
//! identical outcomes.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lodestar_core::config::EngineConfig;
use lodestar_core::configuration::Configuration;
use lodestar_core::root::RootSpec;
use lodestar_core::source::{RevisionId, SourceId};
use lodestar_provider::RevisionHistory;

use crate::bounder::{ActiveSet, Bounder};
use crate::conflict::ConflictReport;
use crate::errors::ResolveError;
use crate::heuristic::Scorer;
use crate::index::DimensionIndex;
use crate::result::{self, ResolvedGraph};
use crate::successor::successors;
use crate::validate::validate;

/// Checkable cancellation handle, consulted once per loop iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, AtomicOrdering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(AtomicOrdering::SeqCst)
    }
}

/// Terminal outcome of a run. `Unsatisfiable` and `Cancelled` are normal
/// results, not errors.
#[derive(Debug)]
pub enum Outcome {
    Resolved(ResolvedGraph),
    Unsatisfiable(ConflictReport),
    Cancelled,
}

/// One explored configuration with its accumulated path cost and lineage.
struct SearchNode {
    config: Configuration,
    g: f64,
    parent: Option<usize>,
}

/// Open-set entry; ordered so the binary heap pops the lowest f, breaking
/// ties by lower h and then earlier insertion.
struct OpenEntry {
    f: f64,
    h: f64,
    seq: u64,
    node: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Resolve a root constraint set against a revision-history provider.
///
/// Every piece of run state lives inside this call; nothing is shared
/// between runs.
pub async fn resolve<P: RevisionHistory>(
    root: &RootSpec,
    provider: &P,
    config: &EngineConfig,
    cancel: Option<&CancelToken>,
) -> Result<Outcome, ResolveError> {
    let mut index = DimensionIndex::new(provider, &config.provider);
    let mut bounder = Bounder::new(config.discovery.clone());
    let scorer = Scorer::new(config.heuristic.clone());

    let (mut active, initial) = bounder.bound(root, &mut index).await?;
    index.ensure_facts(selection_pairs(&initial)).await;
    tracing::info!(
        "bounded search space: {} dimensions for root `{}`",
        active.len(),
        root.name
    );

    // The anchor records each dimension's initially requested revision; the
    // scorer measures drift against it.
    let mut anchor = initial.clone();

    // Fixed for the whole run: shrinking the unit when the active set grows
    // would leave estimates already queued in the open set above the true
    // remaining cost.
    let unit = cost_unit(&active, &index);

    let deadline = config
        .search
        .timeout_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));

    let mut nodes: Vec<SearchNode> = vec![SearchNode {
        config: initial.clone(),
        g: 0.0,
        parent: None,
    }];
    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        f: 0.0,
        h: 0.0,
        seq: 0,
        node: 0,
    });
    let mut open_best: HashMap<Configuration, f64> = HashMap::from([(initial, 0.0)]);
    let mut closed: HashSet<Configuration> = HashSet::new();
    let mut report = ConflictReport::new();
    let mut seq: u64 = 0;
    let mut expansions: u64 = 0;

    while let Some(entry) = open.pop() {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            tracing::info!("resolution cancelled after {expansions} expansions");
            return Ok(Outcome::Cancelled);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            tracing::info!("resolution deadline reached after {expansions} expansions");
            return Ok(Outcome::Cancelled);
        }

        let mut current = nodes[entry.node].config.clone();
        if closed.contains(&current) {
            continue;
        }

        expansions += 1;
        if expansions > config.search.max_expansions {
            tracing::warn!(
                "expansion budget ({}) exhausted",
                config.search.max_expansions
            );
            return Ok(Outcome::Cancelled);
        }

        let mut validation = validate(root, &current, &active, &index);

        // Lazy constraint discovery: fold any pending dimensions into the
        // active set before this node branches, so successors reflect the
        // current known world.
        if !validation.pending.is_empty() {
            let requirements = validation.pending_requirements();
            let augmented = bounder
                .extend(requirements, &mut active, &current, &mut index)
                .await?;
            for (source, revision) in augmented.iter() {
                if anchor.get(source).is_none() {
                    anchor = anchor.with(source.clone(), revision.clone());
                }
            }
            index.ensure_facts(selection_pairs(&augmented)).await;
            nodes[entry.node].config = augmented.clone();
            current = augmented;
            validation = validate(root, &current, &active, &index);
        }

        report.absorb(&validation);

        if validation.is_goal() {
            let moves = lineage_length(&nodes, entry.node);
            tracing::info!(
                "resolved `{}` after {expansions} expansions ({moves} moves)",
                root.name
            );
            let graph = result::build(root, &current, &validation, &index, moves);
            return Ok(Outcome::Resolved(graph));
        }

        closed.insert(current.clone());

        let branches = successors(&current, &active, &index);
        index
            .ensure_facts(branches.iter().flat_map(selection_pairs))
            .await;

        for branch in branches {
            if closed.contains(&branch) {
                continue;
            }
            let branch_validation = validate(root, &branch, &active, &index);
            let g = nodes[entry.node].g + unit;
            let h = scorer.score(
                &branch,
                &anchor,
                &index,
                !branch_validation.is_goal(),
                unit,
            );
            let f = g + h;
            if open_best.get(&branch).is_some_and(|&best| best <= f) {
                continue;
            }
            open_best.insert(branch.clone(), f);
            nodes.push(SearchNode {
                config: branch,
                g,
                parent: Some(entry.node),
            });
            seq += 1;
            open.push(OpenEntry {
                f,
                h,
                seq,
                node: nodes.len() - 1,
            });
        }
    }

    tracing::info!("search space exhausted after {expansions} expansions; unsatisfiable");
    Ok(Outcome::Unsatisfiable(report))
}

fn selection_pairs(config: &Configuration) -> Vec<(SourceId, RevisionId)> {
    config
        .iter()
        .map(|(source, revision)| (source.clone(), revision.clone()))
        .collect()
}

/// Cost of one move, computed once from the bounded space and held constant
/// for the run. Lazily discovered dimensions do not shrink it, so g may
/// exceed 1 when the space grows mid-search.
fn cost_unit<P: RevisionHistory>(active: &ActiveSet, index: &DimensionIndex<'_, P>) -> f64 {
    let span = active
        .iter()
        .filter_map(|source| index.timeline(source).map(|t| t.len()))
        .max()
        .unwrap_or(1);
    1.0 / ((active.len().max(1) * span.max(1)) as f64)
}

fn lineage_length(nodes: &[SearchNode], terminal: usize) -> usize {
    let mut moves = 0;
    let mut cursor = terminal;
    while let Some(parent) = nodes[cursor].parent {
        moves += 1;
        cursor = parent;
    }
    moves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_flips_once() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn open_entries_pop_lowest_f_first() {
        let mut heap = BinaryHeap::new();
        heap.push(OpenEntry { f: 0.5, h: 0.1, seq: 0, node: 0 });
        heap.push(OpenEntry { f: 0.2, h: 0.1, seq: 1, node: 1 });
        heap.push(OpenEntry { f: 0.9, h: 0.0, seq: 2, node: 2 });
        assert_eq!(heap.pop().unwrap().node, 1);
        assert_eq!(heap.pop().unwrap().node, 0);
        assert_eq!(heap.pop().unwrap().node, 2);
    }

    #[test]
    fn ties_break_by_heuristic_then_insertion() {
        let mut heap = BinaryHeap::new();
        heap.push(OpenEntry { f: 0.5, h: 0.3, seq: 0, node: 0 });
        heap.push(OpenEntry { f: 0.5, h: 0.1, seq: 1, node: 1 });
        heap.push(OpenEntry { f: 0.5, h: 0.1, seq: 2, node: 2 });
        assert_eq!(heap.pop().unwrap().node, 1, "lower h wins");
        assert_eq!(heap.pop().unwrap().node, 2, "then earlier insertion");
        assert_eq!(heap.pop().unwrap().node, 0);
    }

    #[tokio::test]
    async fn cost_unit_reflects_the_bounded_space() {
        use lodestar_core::config::ProviderConfig;
        use lodestar_core::revision::{Revision, Timeline};
        use lodestar_provider::memory::InMemoryHistory;

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
        p.insert_timeline(Timeline::new(SourceId::new("b"), vec![Revision::new("r0")]).unwrap());

        let mut index = DimensionIndex::new(&p, &ProviderConfig::default());
        index
            .load_many([SourceId::new("a"), SourceId::new("b")])
            .await
            .unwrap();
        let mut active = ActiveSet::default();
        active.insert(SourceId::new("a"));
        active.insert(SourceId::new("b"));

        // Two dimensions, longest span three.
        let unit = cost_unit(&active, &index);
        assert!((unit - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn lineage_counts_moves() {
        let nodes = vec![
            SearchNode { config: Configuration::empty(), g: 0.0, parent: None },
            SearchNode { config: Configuration::empty(), g: 0.1, parent: Some(0) },
            SearchNode { config: Configuration::empty(), g: 0.2, parent: Some(1) },
        ];
        assert_eq!(lineage_length(&nodes, 2), 2);
        assert_eq!(lineage_length(&nodes, 0), 0);
    }
}
