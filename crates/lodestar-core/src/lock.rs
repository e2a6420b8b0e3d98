use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::CoreError;

/// Deterministic lock-style record of a resolved configuration, suitable for
/// writing to disk by the persistence collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockSnapshot {
    /// Root project name.
    pub root: String,
    #[serde(default)]
    pub dimension: Vec<LockedDimension>,
}

/// A single resolved dimension with its chosen revision and requesters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedDimension {
    pub source: String,
    pub revision: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Pins of the revisions that imposed constraints on this dimension.
    #[serde(default)]
    pub requesters: Vec<String>,
}

impl LockSnapshot {
    /// Load and parse a snapshot from the given path.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CoreError::Config {
            message: format!("failed to parse lock snapshot: {e}"),
        })
    }

    /// Serialize the snapshot to a pretty-printed TOML string.
    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
