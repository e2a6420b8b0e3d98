//! Diagnostics for unsatisfiable runs.

use std::collections::BTreeMap;
use std::fmt;

use lodestar_core::source::SourceId;

use crate::validate::ValidationResult;

/// All irreconcilable requirements observed while the search exhausted its
/// space, grouped per target dimension.
///
/// The report aggregates across every expanded configuration: a dimension
/// constrained to disjoint ranges by two requesters never shows both
/// violations in a single validation, but both appear here.
#[derive(Debug, Default, Clone)]
pub struct ConflictReport {
    /// target dimension -> distinct (requester, constraint) pairs seen
    /// violated against it.
    demands: BTreeMap<SourceId, Vec<(String, String)>>,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one validation's violations into the report.
    pub fn absorb(&mut self, validation: &ValidationResult) {
        for check in &validation.violated {
            let requester = check.requester.to_string();
            let constraint = check.constraint.to_string();
            let entry = self.demands.entry(check.target.clone()).or_default();
            if !entry.iter().any(|(r, c)| r == &requester && c == &constraint) {
                entry.push((requester, constraint));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.demands.is_empty()
    }

    /// Number of distinct violated requirements across all targets.
    pub fn len(&self) -> usize {
        self.demands.values().map(Vec::len).sum()
    }

    /// The violated requirements recorded against one dimension.
    pub fn demands_on(&self, target: &SourceId) -> &[(String, String)] {
        self.demands
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.demands.is_empty() {
            return write!(f, "No irreconcilable constraints recorded.");
        }
        writeln!(f, "Irreconcilable constraints ({}):", self.len())?;
        for (target, demands) in &self.demands {
            writeln!(f, "  {target}:")?;
            for (requester, constraint) in demands {
                writeln!(f, "    {requester} requires {constraint}")?;
            }
        }
        Ok(())
    }
}
