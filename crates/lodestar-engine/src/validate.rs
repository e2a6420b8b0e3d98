//! Pure constraint evaluation over a configuration.
//!
//! The validator performs no search: it classifies every constraint declared
//! by the root and by every selected revision as satisfied, violated, or
//! pending (target dimension not yet active), and leaves all combinatorial
//! work to the controller.

use lodestar_core::configuration::Configuration;
use lodestar_core::constraint::Constraint;
use lodestar_core::root::RootSpec;
use lodestar_core::source::{RevisionId, SourceId};
use lodestar_provider::RevisionHistory;

use crate::bounder::ActiveSet;
use crate::index::DimensionIndex;

/// Who imposed a constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Root,
    Revision { source: SourceId, revision: RevisionId },
}

impl std::fmt::Display for Requester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Revision { source, revision } => write!(f, "{source}@{revision}"),
        }
    }
}

/// One evaluated constraint.
#[derive(Debug, Clone)]
pub struct ConstraintCheck {
    pub requester: Requester,
    pub target: SourceId,
    pub constraint: Constraint,
}

/// Per-configuration record of constraint evaluation.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub satisfied: Vec<ConstraintCheck>,
    pub violated: Vec<ConstraintCheck>,
    pub pending: Vec<ConstraintCheck>,
}

impl ValidationResult {
    /// A configuration is a solution candidate only when nothing is violated
    /// and nothing is pending.
    pub fn is_goal(&self) -> bool {
        self.violated.is_empty() && self.pending.is_empty()
    }

    /// The requirements that must be folded into the active set before this
    /// configuration can branch meaningfully.
    pub fn pending_requirements(&self) -> Vec<(SourceId, Constraint)> {
        self.pending
            .iter()
            .map(|check| (check.target.clone(), check.constraint.clone()))
            .collect()
    }
}

/// Evaluate every constraint imposed by the root and by each selected
/// revision against the configuration's selections.
pub fn validate<P: RevisionHistory>(
    root: &RootSpec,
    config: &Configuration,
    active: &ActiveSet,
    index: &DimensionIndex<'_, P>,
) -> ValidationResult {
    let mut result = ValidationResult::default();

    for (target, constraint) in &root.dependencies {
        classify(
            Requester::Root,
            target,
            constraint,
            config,
            active,
            index,
            &mut result,
        );
    }

    for (source, selected) in config.iter() {
        let Some(revision) = index.revision(source, selected) else {
            continue;
        };
        for dep in &revision.dependencies {
            classify(
                Requester::Revision {
                    source: source.clone(),
                    revision: selected.clone(),
                },
                &dep.target,
                &dep.constraint,
                config,
                active,
                index,
                &mut result,
            );
        }
    }

    result
}

#[allow(clippy::too_many_arguments)]
fn classify<P: RevisionHistory>(
    requester: Requester,
    target: &SourceId,
    constraint: &Constraint,
    config: &Configuration,
    active: &ActiveSet,
    index: &DimensionIndex<'_, P>,
    result: &mut ValidationResult,
) {
    let check = ConstraintCheck {
        requester,
        target: target.clone(),
        constraint: constraint.clone(),
    };

    let selected = match config.get(target) {
        Some(selected) if active.contains(target) => selected,
        // Not yet part of the search space (or active but not yet assigned,
        // which only occurs transiently mid-extension).
        _ => {
            result.pending.push(check);
            return;
        }
    };

    let satisfied = index
        .revision(target, selected)
        .map(|rev| constraint.satisfied_by(&rev.id, rev.version.as_ref()))
        .unwrap_or(false);

    if satisfied {
        result.satisfied.push(check);
    } else {
        result.violated.push(check);
    }
}
