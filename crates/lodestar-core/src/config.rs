//! Engine configuration knobs consumed from the host.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Tunable parameters for one resolution run, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub discovery: DiscoveryBudget,

    #[serde(default)]
    pub search: SearchBudget,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub heuristic: HeuristicConfig,
}

/// Limits on configuration-space closure. Exceeding either aborts the run
/// with an unbounded-closure error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryBudget {
    #[serde(default = "default_max_dimensions", rename = "max-dimensions")]
    pub max_dimensions: usize,
    #[serde(default = "default_max_revisions", rename = "max-revisions")]
    pub max_revisions: usize,
}

impl Default for DiscoveryBudget {
    fn default() -> Self {
        Self {
            max_dimensions: default_max_dimensions(),
            max_revisions: default_max_revisions(),
        }
    }
}

fn default_max_dimensions() -> usize {
    256
}

fn default_max_revisions() -> usize {
    65_536
}

/// Limits on the search loop itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchBudget {
    #[serde(default = "default_max_expansions", rename = "max-expansions")]
    pub max_expansions: u64,
    /// Wall-clock limit for the whole run, in milliseconds. `None` means
    /// unlimited.
    #[serde(default, rename = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_expansions: default_max_expansions(),
            timeout_ms: None,
        }
    }
}

fn default_max_expansions() -> u64 {
    100_000
}

/// Limits applied to individual history-provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_call_timeout_ms", rename = "call-timeout-ms")]
    pub call_timeout_ms: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_max_concurrent", rename = "max-concurrent")]
    pub max_concurrent: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
            retries: default_retries(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

fn default_retries() -> u32 {
    2
}

fn default_max_concurrent() -> usize {
    8
}

/// Scaling constants and feature weights for the heuristic scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicConfig {
    /// Steepness of the saturating squash.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    /// Risk value mapped to the squash midpoint.
    #[serde(default)]
    pub centering: f64,
    #[serde(default)]
    pub weights: FeatureWeights,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            centering: 0.0,
            weights: FeatureWeights::default(),
        }
    }
}

fn default_sensitivity() -> f64 {
    1.0
}

/// Linear weights for the per-dimension feature vector. All weights are
/// non-negative so increasing risk never decreases the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureWeights {
    /// Magnitude of the ordinal jump away from the initially requested
    /// revision.
    #[serde(default = "default_weight", rename = "version-jump")]
    pub version_jump: f64,
    /// Count of transitive dependencies added or removed versus the
    /// requested revision.
    #[serde(default = "default_weight", rename = "dependency-churn")]
    pub dependency_churn: f64,
    /// Penalty for revisions without a release tag.
    #[serde(default = "default_weight")]
    pub untagged: f64,
    /// Age of the selected revision relative to the newest in its timeline.
    #[serde(default = "default_weight")]
    pub staleness: f64,
    /// Known security advisories against the selected revision.
    #[serde(default = "default_advisory_weight")]
    pub advisories: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            version_jump: default_weight(),
            dependency_churn: default_weight(),
            untagged: default_weight(),
            staleness: default_weight(),
            advisories: default_advisory_weight(),
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

fn default_advisory_weight() -> f64 {
    2.0
}

impl EngineConfig {
    /// Load configuration from a TOML file, or return defaults if the file
    /// doesn't exist.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CoreError::Config {
            message: format!("failed to parse {}: {e}", path.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::default();
        assert!(config.discovery.max_dimensions > 0);
        assert!(config.search.max_expansions > 0);
        assert!(config.provider.max_concurrent > 0);
        assert!(config.heuristic.sensitivity > 0.0);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
[discovery]
max-dimensions = 16

[heuristic.weights]
advisories = 5.0
"#,
        )
        .unwrap();
        assert_eq!(config.discovery.max_dimensions, 16);
        assert_eq!(config.discovery.max_revisions, 65_536);
        assert_eq!(config.heuristic.weights.advisories, 5.0);
        assert_eq!(config.heuristic.weights.untagged, 1.0);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = EngineConfig::load(Path::new("/nonexistent/lodestar.toml")).unwrap();
        assert_eq!(config.search.max_expansions, 100_000);
    }
}
