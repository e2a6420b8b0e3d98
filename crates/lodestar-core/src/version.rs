//! Version-label parsing and comparison for revision timelines.
//!
//! Tags in version-control history are not reliably semver, so the engine
//! carries its own ordering:
//! - Labels are split into segments on `.`, `-`, and `_`
//! - A leading `v` prefix is ignored (`v1.2` == `1.2`)
//! - Numeric segments compare as numbers
//! - Pre-release qualifiers order `dev` < `alpha` < `beta` < `rc` < release
//! - Trailing zero segments are insignificant (`1.0` == `1.0.0`)

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A parsed timeline version label with comparable segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChronoVersion {
    label: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Numeric(u64),
    Qualifier(Qualifier),
    Text(String),
}

/// Well-known pre-release qualifiers with defined ordering.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum Qualifier {
    Dev,
    Alpha,
    Beta,
    Rc,
    Release,
}

impl ChronoVersion {
    pub fn parse(label: &str) -> Result<Self, CoreError> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Parse {
                message: "empty version label".to_string(),
            });
        }
        let body = trimmed
            .strip_prefix('v')
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
            .unwrap_or(trimmed);
        Ok(Self {
            label: trimmed.to_string(),
            segments: split_segments(body),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for ChronoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl TryFrom<String> for ChronoVersion {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ChronoVersion> for String {
    fn from(value: ChronoVersion) -> Self {
        value.label
    }
}

impl PartialEq for ChronoVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ChronoVersion {}

impl Ord for ChronoVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let ord = compare(self.segments.get(i), other.segments.get(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for ChronoVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare(a: Option<&Segment>, b: Option<&Segment>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(s), None) => against_missing(s),
        (None, Some(s)) => against_missing(s).reverse(),
        (Some(a), Some(b)) => between(a, b),
    }
}

/// Compare a present segment against a missing (implicitly-release) one.
fn against_missing(seg: &Segment) -> Ordering {
    match seg {
        Segment::Numeric(0) => Ordering::Equal,
        Segment::Numeric(_) => Ordering::Greater,
        Segment::Qualifier(q) => q.cmp(&Qualifier::Release),
        Segment::Text(_) => Ordering::Less,
    }
}

fn between(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
        (Segment::Qualifier(a), Segment::Qualifier(b)) => a.cmp(b),
        (Segment::Numeric(_), Segment::Qualifier(_)) => Ordering::Greater,
        (Segment::Qualifier(_), Segment::Numeric(_)) => Ordering::Less,
        (Segment::Numeric(_), Segment::Text(_)) => Ordering::Greater,
        (Segment::Text(_), Segment::Numeric(_)) => Ordering::Less,
        (Segment::Text(a), Segment::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Segment::Qualifier(q), Segment::Text(_)) => {
            if *q >= Qualifier::Release {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Segment::Text(_), Segment::Qualifier(q)) => {
            if *q >= Qualifier::Release {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
    }
}

fn split_segments(body: &str) -> Vec<Segment> {
    body.split(['.', '-', '_'])
        .filter(|token| !token.is_empty())
        .map(classify)
        .collect()
}

fn classify(token: &str) -> Segment {
    if let Ok(n) = token.parse::<u64>() {
        return Segment::Numeric(n);
    }
    match token.to_lowercase().as_str() {
        "dev" | "snapshot" | "nightly" => Segment::Qualifier(Qualifier::Dev),
        "alpha" | "a" => Segment::Qualifier(Qualifier::Alpha),
        "beta" | "b" => Segment::Qualifier(Qualifier::Beta),
        "rc" | "pre" => Segment::Qualifier(Qualifier::Rc),
        "final" | "release" | "ga" => Segment::Qualifier(Qualifier::Release),
        _ => Segment::Text(token.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ChronoVersion {
        ChronoVersion::parse(s).unwrap()
    }

    #[test]
    fn numeric_ordering() {
        assert!(v("1.0") < v("2.0"));
        assert!(v("1.0.1") < v("1.1.0"));
        assert!(v("1.9") < v("1.10"));
    }

    #[test]
    fn v_prefix_ignored() {
        assert_eq!(v("v1.2.0"), v("1.2.0"));
        assert!(v("v1.2") < v("v1.3"));
    }

    #[test]
    fn qualifier_ladder() {
        assert!(v("1.0-dev") < v("1.0-alpha"));
        assert!(v("1.0-alpha") < v("1.0-beta"));
        assert!(v("1.0-beta") < v("1.0-rc"));
        assert!(v("1.0-rc") < v("1.0"));
        assert!(v("1.0") == v("1.0-final"));
    }

    #[test]
    fn trailing_zeros_insignificant() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert!(v("1.0.0.1") > v("1.0"));
    }

    #[test]
    fn text_suffix_sorts_before_release() {
        assert!(v("1.0.0-hotfix") < v("1.0.0"));
    }

    #[test]
    fn underscore_separator() {
        assert!(v("2_1") < v("2_2"));
    }

    #[test]
    fn empty_label_rejected() {
        assert!(ChronoVersion::parse("  ").is_err());
    }

    #[test]
    fn display_preserves_label() {
        assert_eq!(v("v1.2.0").to_string(), "v1.2.0");
    }
}
