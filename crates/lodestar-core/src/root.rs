//! The root constraint set: what the host project directly requires.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::errors::CoreError;
use crate::source::SourceId;

/// Root constraints supplied by the manifest-translation collaborator:
/// dependency identifier to requested version expression.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootSpec {
    /// Name of the root project, used as the resolved graph's root label.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub dependencies: BTreeMap<SourceId, Constraint>,
}

fn default_name() -> String {
    "root".to_string()
}

impl RootSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: BTreeMap::new(),
        }
    }

    pub fn require(mut self, source: impl Into<String>, constraint: Constraint) -> Self {
        self.dependencies
            .insert(SourceId::new(source), constraint);
        self
    }

    /// Parse a root spec from its TOML form:
    ///
    /// ```toml
    /// name = "app"
    ///
    /// [dependencies]
    /// "git.example.org/team/lib" = ">=1.0 <2.0"
    /// ```
    pub fn parse_toml(content: &str) -> Result<Self, CoreError> {
        toml::from_str(content).map_err(|e| CoreError::Config {
            message: format!("failed to parse root spec: {e}"),
        })
    }
}
