use serde::{Deserialize, Serialize};

/// Stable identifier for one dependency's revision timeline: a source
/// locator such as `git.example.org/team/lib`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A revision token within one timeline (commit hash, tag object id, or any
/// opaque token the history provider understands).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RevisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RevisionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RevisionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A source pinned to an exact revision, parsed from `"locator@token"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourcePin {
    pub source: SourceId,
    pub revision: RevisionId,
}

impl SourcePin {
    /// Parse `"locator@token"` into a pin.
    pub fn parse(s: &str) -> Option<Self> {
        let (locator, token) = s.rsplit_once('@')?;
        if locator.is_empty() || token.is_empty() {
            return None;
        }
        Some(Self {
            source: SourceId::new(locator),
            revision: RevisionId::new(token),
        })
    }
}

impl std::fmt::Display for SourcePin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.source, self.revision)
    }
}
