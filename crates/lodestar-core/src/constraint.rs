//! Version constraints declared against a target dimension's selected
//! revision.
//!
//! A constraint is owned by the revision that declared it and never mutated
//! after that revision is loaded. Textual forms:
//! - `*` — any revision
//! - `@<token>` — exactly the revision with that token
//! - `=1.5` — exactly the version label `1.5`
//! - `>=1.0 <2.0` — a version range (either bound optional)

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::source::RevisionId;
use crate::version::ChronoVersion;

/// One end of a version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: ChronoVersion,
    pub inclusive: bool,
}

/// A predicate over a target dimension's selected revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Constraint {
    /// Any selected revision satisfies the requirement.
    Any,
    /// The selected revision must carry exactly this token.
    Exact(RevisionId),
    /// The selected revision's version label must fall inside the range.
    Range {
        lower: Option<Bound>,
        upper: Option<Bound>,
    },
}

impl Constraint {
    /// Parse the textual constraint forms described in the module docs.
    pub fn parse(spec: &str) -> Result<Self, CoreError> {
        let s = spec.trim();
        if s.is_empty() || s == "*" {
            return Ok(Self::Any);
        }
        if let Some(token) = s.strip_prefix('@') {
            if token.is_empty() {
                return Err(CoreError::Parse {
                    message: format!("constraint `{s}` is missing a revision token"),
                });
            }
            return Ok(Self::Exact(RevisionId::new(token)));
        }
        if let Some(label) = s.strip_prefix('=') {
            let version = ChronoVersion::parse(label)?;
            let bound = Bound {
                version,
                inclusive: true,
            };
            return Ok(Self::Range {
                lower: Some(bound.clone()),
                upper: Some(bound),
            });
        }

        let mut lower: Option<Bound> = None;
        let mut upper: Option<Bound> = None;
        for part in s.split_whitespace() {
            let (slot, bound) = if let Some(rest) = part.strip_prefix(">=") {
                (&mut lower, Bound { version: ChronoVersion::parse(rest)?, inclusive: true })
            } else if let Some(rest) = part.strip_prefix("<=") {
                (&mut upper, Bound { version: ChronoVersion::parse(rest)?, inclusive: true })
            } else if let Some(rest) = part.strip_prefix('>') {
                (&mut lower, Bound { version: ChronoVersion::parse(rest)?, inclusive: false })
            } else if let Some(rest) = part.strip_prefix('<') {
                (&mut upper, Bound { version: ChronoVersion::parse(rest)?, inclusive: false })
            } else {
                return Err(CoreError::Parse {
                    message: format!("unrecognized constraint component `{part}`"),
                });
            };
            if slot.is_some() {
                return Err(CoreError::Parse {
                    message: format!("constraint `{s}` repeats a bound"),
                });
            }
            *slot = Some(bound);
        }
        Ok(Self::Range { lower, upper })
    }

    /// Evaluate the predicate against a candidate revision's token and
    /// optional version label.
    ///
    /// An unlabeled revision satisfies only `Any` and a matching `Exact`;
    /// ranges cannot be checked without a label.
    pub fn satisfied_by(&self, id: &RevisionId, version: Option<&ChronoVersion>) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(token) => token == id,
            Self::Range { lower, upper } => {
                let Some(version) = version else {
                    return false;
                };
                if let Some(bound) = lower {
                    let cmp = version.cmp(&bound.version);
                    if cmp == Ordering::Less || (!bound.inclusive && cmp == Ordering::Equal) {
                        return false;
                    }
                }
                if let Some(bound) = upper {
                    let cmp = version.cmp(&bound.version);
                    if cmp == Ordering::Greater || (!bound.inclusive && cmp == Ordering::Equal) {
                        return false;
                    }
                }
                true
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Exact(token) => write!(f, "@{token}"),
            Self::Range { lower, upper } => match (lower, upper) {
                (Some(lo), Some(hi)) if lo.inclusive && hi.inclusive && lo.version == hi.version => {
                    write!(f, "={}", lo.version)
                }
                (lower, upper) => {
                    let mut parts = Vec::new();
                    if let Some(lo) = lower {
                        let op = if lo.inclusive { ">=" } else { ">" };
                        parts.push(format!("{op}{}", lo.version));
                    }
                    if let Some(hi) = upper {
                        let op = if hi.inclusive { "<=" } else { "<" };
                        parts.push(format!("{op}{}", hi.version));
                    }
                    if parts.is_empty() {
                        return f.write_str("*");
                    }
                    f.write_str(&parts.join(" "))
                }
            },
        }
    }
}

impl TryFrom<String> for Constraint {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Constraint> for String {
    fn from(value: Constraint) -> Self {
        value.to_string()
    }
}
