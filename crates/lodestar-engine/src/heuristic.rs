//! Heuristic scoring: a bounded, dimension-normalized estimate of how far a
//! configuration sits from a fully valid goal.
//!
//! Pipeline: extract one feature row per active dimension, backfill missing
//! features with the median over the active set, min-max normalize each
//! feature to [-1, 1], combine with fixed non-negative weights, squash with
//! a scaled logistic. Admissibility is guaranteed by construction: the
//! squash output is strictly below 1, the result is scaled by one move's
//! cost unit, and a flawed configuration is always at least one move from
//! any goal — so the estimate never exceeds the true remaining cost, and a
//! valid configuration scores exactly 0.

use lodestar_core::config::HeuristicConfig;
use lodestar_core::configuration::Configuration;
use lodestar_provider::RevisionHistory;

use crate::index::DimensionIndex;

const FEATURES: usize = 5;

/// Raw per-dimension feature vector; `None` marks unavailable metadata.
#[derive(Debug, Clone, Copy, Default)]
struct FeatureRow {
    values: [Option<f64>; FEATURES],
}

/// The heuristic scorer. Stateless apart from its configuration; safe to
/// reuse across expansions within a run.
pub struct Scorer {
    config: HeuristicConfig,
}

impl Scorer {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    /// Estimate remaining distance for a configuration, in the same
    /// normalized cost units the controller accumulates as path cost.
    ///
    /// `anchor` is the initial (requested-target) configuration; `flawed`
    /// is whether validation found any violated or pending constraint;
    /// `unit` is the cost of one move.
    pub fn score<P: RevisionHistory>(
        &self,
        config: &Configuration,
        anchor: &Configuration,
        index: &DimensionIndex<'_, P>,
        flawed: bool,
        unit: f64,
    ) -> f64 {
        if !flawed {
            return 0.0;
        }
        let rows = extract(config, anchor, index);
        let risk = combine(&self.config, rows);
        let squashed = squash(self.config.sensitivity, self.config.centering, risk);
        unit * squashed
    }
}

/// Monotone saturating squash into (0, 1).
fn squash(sensitivity: f64, centering: f64, risk: f64) -> f64 {
    1.0 / (1.0 + (-sensitivity * (risk - centering)).exp())
}

fn extract<P: RevisionHistory>(
    config: &Configuration,
    anchor: &Configuration,
    index: &DimensionIndex<'_, P>,
) -> Vec<FeatureRow> {
    let mut rows = Vec::with_capacity(config.len());
    for (source, selected) in config.iter() {
        let mut row = FeatureRow::default();
        let revision = index.revision(source, selected);
        let anchor_revision = anchor
            .get(source)
            .and_then(|id| index.revision(source, id));

        if let (Some(rev), Some(anchor_rev)) = (revision, anchor_revision) {
            row.values[0] = Some((rev.ordinal.abs_diff(anchor_rev.ordinal)) as f64);

            let churn = rev
                .dependencies
                .iter()
                .filter(|d| !anchor_rev.dependencies.iter().any(|a| a.target == d.target))
                .count()
                + anchor_rev
                    .dependencies
                    .iter()
                    .filter(|a| !rev.dependencies.iter().any(|d| d.target == a.target))
                    .count();
            row.values[1] = Some(churn as f64);
        }

        if let Some(facts) = index.facts(source, selected) {
            row.values[2] = facts.tagged.map(|tagged| if tagged { 0.0 } else { 1.0 });
            // Older commits are riskier; negate so larger means older after
            // normalization.
            row.values[3] = facts.timestamp.map(|ts| -(ts as f64));
            row.values[4] = facts.advisories.map(f64::from);
        }

        rows.push(row);
    }
    rows
}

/// Backfill, normalize, and linearly combine rows into a scalar risk in
/// [-1, 1].
fn combine(config: &HeuristicConfig, mut rows: Vec<FeatureRow>) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }

    for feature in 0..FEATURES {
        let present: Vec<f64> = rows.iter().filter_map(|r| r.values[feature]).collect();
        let fill = median(&present).unwrap_or(0.0);
        for row in &mut rows {
            row.values[feature].get_or_insert(fill);
        }
        normalize_column(&mut rows, feature);
    }

    let weights = [
        config.weights.version_jump,
        config.weights.dependency_churn,
        config.weights.untagged,
        config.weights.staleness,
        config.weights.advisories,
    ];
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let sum: f64 = rows
        .iter()
        .map(|row| {
            row.values
                .iter()
                .zip(weights.iter())
                .map(|(value, weight)| value.unwrap_or(0.0) * weight)
                .sum::<f64>()
                / total
        })
        .sum();
    sum / rows.len() as f64
}

/// Min-max scale one (already backfilled) feature column to [-1, 1].
fn normalize_column(rows: &mut [FeatureRow], feature: usize) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for row in rows.iter() {
        if let Some(v) = row.values[feature] {
            min = min.min(v);
            max = max.max(v);
        }
    }
    let span = max - min;
    for row in rows.iter_mut() {
        if let Some(v) = row.values[feature] {
            row.values[feature] = Some(if span > 0.0 {
                2.0 * (v - min) / span - 1.0
            } else {
                0.0
            });
        }
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestar_core::config::ProviderConfig;
    use lodestar_core::revision::{Revision, RevisionFacts, Timeline};
    use lodestar_core::source::{RevisionId, SourceId};
    use lodestar_provider::memory::InMemoryHistory;

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn squash_is_monotone_and_bounded() {
        let mut last = 0.0;
        for i in -10..=10 {
            let s = squash(1.0, 0.0, i as f64 / 5.0);
            assert!(s > 0.0 && s < 1.0);
            assert!(s >= last);
            last = s;
        }
        assert_eq!(squash(1.0, 0.0, 0.0), 0.5);
    }

    async fn three_dim_index(
        advisories: [Option<u32>; 3],
    ) -> (InMemoryHistory, Configuration) {
        let mut p = InMemoryHistory::new();
        let mut config = Configuration::empty();
        for (i, adv) in advisories.iter().enumerate() {
            let source = format!("dim{i}");
            p.insert_timeline(
                Timeline::new(SourceId::new(source.clone()), vec![Revision::new("r0")]).unwrap(),
            );
            p.insert_facts(
                source.clone(),
                "r0",
                RevisionFacts {
                    timestamp: Some(1_000),
                    tagged: Some(true),
                    advisories: *adv,
                },
            );
            config = config.with(SourceId::new(source), RevisionId::new("r0"));
        }
        (p, config)
    }

    #[tokio::test]
    async fn backfill_is_neutral() {
        // A dimension missing its advisory count scores exactly like one
        // carrying the median value, all else equal.
        let (p_full, config) = three_dim_index([Some(0), Some(2), Some(4)]).await;
        let (p_missing, _) = three_dim_index([Some(0), None, Some(4)]).await;

        let provider_config = ProviderConfig::default();
        let scorer = Scorer::new(HeuristicConfig::default());

        let mut index_full = DimensionIndex::new(&p_full, &provider_config);
        let mut index_missing = DimensionIndex::new(&p_missing, &provider_config);
        let sources: Vec<SourceId> = config.sources().cloned().collect();
        index_full.load_many(sources.clone()).await.unwrap();
        index_missing.load_many(sources).await.unwrap();
        let pairs: Vec<_> = config
            .iter()
            .map(|(s, r)| (s.clone(), r.clone()))
            .collect();
        index_full.ensure_facts(pairs.clone()).await;
        index_missing.ensure_facts(pairs).await;

        let full = scorer.score(&config, &config, &index_full, true, 1.0);
        let missing = scorer.score(&config, &config, &index_missing, true, 1.0);
        assert!(
            (full - missing).abs() < 1e-12,
            "backfilled score {missing} != median score {full}"
        );
    }

    #[tokio::test]
    async fn valid_configuration_scores_zero() {
        let (p, config) = three_dim_index([Some(0), Some(0), Some(0)]).await;
        let mut index = DimensionIndex::new(&p, &ProviderConfig::default());
        index
            .load_many(config.sources().cloned().collect::<Vec<_>>())
            .await
            .unwrap();
        let scorer = Scorer::new(HeuristicConfig::default());
        assert_eq!(scorer.score(&config, &config, &index, false, 0.25), 0.0);
    }

    #[tokio::test]
    async fn flawed_score_stays_below_one_move() {
        let (p, config) = three_dim_index([Some(9), Some(9), Some(9)]).await;
        let mut index = DimensionIndex::new(&p, &ProviderConfig::default());
        index
            .load_many(config.sources().cloned().collect::<Vec<_>>())
            .await
            .unwrap();
        let pairs: Vec<_> = config
            .iter()
            .map(|(s, r)| (s.clone(), r.clone()))
            .collect();
        index.ensure_facts(pairs).await;

        let scorer = Scorer::new(HeuristicConfig::default());
        let unit = 0.125;
        let score = scorer.score(&config, &config, &index, true, unit);
        assert!(score > 0.0);
        assert!(score < unit, "estimate {score} must stay below one move {unit}");
    }
}
