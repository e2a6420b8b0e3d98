//! Configuration-space bounding: breadth-first closure over the dimensions
//! reachable from the root constraints.
//!
//! The closure is incremental: the search controller re-enters it with
//! [`Bounder::extend`] whenever validation discovers a pending dimension, so
//! the active set only ever grows within a run.

use std::collections::{BTreeSet, VecDeque};

use lodestar_core::config::DiscoveryBudget;
use lodestar_core::configuration::Configuration;
use lodestar_core::constraint::Constraint;
use lodestar_core::revision::{Revision, Timeline};
use lodestar_core::root::RootSpec;
use lodestar_core::source::SourceId;
use lodestar_provider::RevisionHistory;

use crate::errors::ResolveError;
use crate::index::DimensionIndex;

/// The set of dimensions currently included in the search space.
#[derive(Debug, Clone, Default)]
pub struct ActiveSet {
    sources: BTreeSet<SourceId>,
}

impl ActiveSet {
    pub fn insert(&mut self, source: SourceId) -> bool {
        self.sources.insert(source)
    }

    pub fn contains(&self, source: &SourceId) -> bool {
        self.sources.contains(source)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceId> {
        self.sources.iter()
    }
}

/// Tracks cumulative discovery against the budget across the whole run.
pub struct Bounder {
    budget: DiscoveryBudget,
    revisions_discovered: usize,
}

impl Bounder {
    pub fn new(budget: DiscoveryBudget) -> Self {
        Self {
            budget,
            revisions_discovered: 0,
        }
    }

    /// Compute the initial active set and configuration from the root
    /// constraints.
    pub async fn bound<P: RevisionHistory>(
        &mut self,
        root: &RootSpec,
        index: &mut DimensionIndex<'_, P>,
    ) -> Result<(ActiveSet, Configuration), ResolveError> {
        let mut active = ActiveSet::default();
        let mut config = Configuration::empty();
        let frontier: Vec<(SourceId, Constraint)> = root
            .dependencies
            .iter()
            .map(|(source, constraint)| (source.clone(), constraint.clone()))
            .collect();
        self.close_over(frontier, &mut active, &mut config, index)
            .await?;
        Ok((active, config))
    }

    /// Extend the active set with newly required dimensions discovered
    /// mid-search, returning the given configuration augmented with initial
    /// picks for every dimension the closure added.
    pub async fn extend<P: RevisionHistory>(
        &mut self,
        requirements: Vec<(SourceId, Constraint)>,
        active: &mut ActiveSet,
        config: &Configuration,
        index: &mut DimensionIndex<'_, P>,
    ) -> Result<Configuration, ResolveError> {
        let mut augmented = config.clone();
        self.close_over(requirements, active, &mut augmented, index)
            .await?;
        Ok(augmented)
    }

    async fn close_over<P: RevisionHistory>(
        &mut self,
        frontier: Vec<(SourceId, Constraint)>,
        active: &mut ActiveSet,
        config: &mut Configuration,
        index: &mut DimensionIndex<'_, P>,
    ) -> Result<(), ResolveError> {
        let mut queue: VecDeque<(SourceId, Constraint)> = frontier.into();

        while !queue.is_empty() {
            // Drain one BFS level and prefetch its timelines in parallel.
            let level: Vec<(SourceId, Constraint)> = queue.drain(..).collect();
            let wanted: Vec<SourceId> = level
                .iter()
                .map(|(source, _)| source.clone())
                .filter(|source| !active.contains(source))
                .collect();
            index.load_many(wanted).await?;

            for (source, constraint) in level {
                // The first requirement to reach a dimension picks its
                // initial revision; later requirements are enforced by the
                // validator, not the closure.
                if !active.insert(source.clone()) {
                    // A configuration minted before this dimension was
                    // discovered carries no selection for it yet. Assign one
                    // here, or the node would stay pending on every later
                    // validation.
                    if !config.contains(&source) {
                        let timeline = index
                            .timeline(&source)
                            .expect("active dimensions stay loaded for the run");
                        let pick = pick_initial(timeline, &constraint);
                        let deps = unresolved_deps(pick, active, config);
                        *config = config.with(source, pick.id.clone());
                        queue.extend(deps);
                    }
                    continue;
                }
                if active.len() > self.budget.max_dimensions {
                    return Err(self.over_budget(active));
                }

                let timeline = index
                    .timeline(&source)
                    .expect("timeline loaded by this level's prefetch");
                self.revisions_discovered += timeline.len();
                if self.revisions_discovered > self.budget.max_revisions {
                    return Err(self.over_budget(active));
                }

                let pick = pick_initial(timeline, &constraint);
                tracing::debug!("activated {source} at {}", pick.id);
                let deps = unresolved_deps(pick, active, config);
                *config = config.with(source, pick.id.clone());
                queue.extend(deps);
            }
        }
        Ok(())
    }

    fn over_budget(&self, active: &ActiveSet) -> ResolveError {
        ResolveError::UnboundedClosure {
            dimensions: active.len(),
            revisions: self.revisions_discovered,
        }
    }
}

/// The declared dependencies that still need closure work against this
/// configuration: targets not yet active, or active without a selection.
fn unresolved_deps(
    pick: &Revision,
    active: &ActiveSet,
    config: &Configuration,
) -> Vec<(SourceId, Constraint)> {
    pick.dependencies
        .iter()
        .filter(|dep| !active.contains(&dep.target) || !config.contains(&dep.target))
        .map(|dep| (dep.target.clone(), dep.constraint.clone()))
        .collect()
}

/// The constraint-satisfying revision closest to the requested target: the
/// newest satisfying revision, or the timeline head when nothing satisfies
/// (the validator will flag it).
fn pick_initial<'t>(timeline: &'t Timeline, constraint: &Constraint) -> &'t Revision {
    timeline
        .iter()
        .rev()
        .find(|rev| constraint.satisfied_by(&rev.id, rev.version.as_ref()))
        .unwrap_or_else(|| timeline.latest())
}
