// src/models/core.rs

use anyhow::{anyhow, Error};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Identifier of a pooled string, assigned in first-seen order within a run.
pub type StringId = usize;

/// Identifier of a cluster. This is the id of the cluster's current
/// union-find root; it is stable for lookups within a snapshot of the index
/// but carries no meaning across runs.
pub type ClusterId = usize;

/// How a pair of strings came to be united.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethodType {
    /// Bilingual column pair from a source extract.
    Translation,
    /// Identical after normalization.
    Normalized,
    /// Curated always-match constraint.
    AlwaysMatch,
    /// Confirmed match fed back from a prior review file.
    ReviewDecision,
    /// Single similarity edge at or above the edge threshold.
    Edge,
    /// Aggregate cross-cluster similarity at or above the group threshold.
    Group,
    /// Assigned to the nearest trusted seed string.
    Voronoi,
}

impl MatchMethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethodType::Translation => "translation",
            MatchMethodType::Normalized => "normalized",
            MatchMethodType::AlwaysMatch => "always_match",
            MatchMethodType::ReviewDecision => "review_decision",
            MatchMethodType::Edge => "edge",
            MatchMethodType::Group => "group",
            MatchMethodType::Voronoi => "voronoi",
        }
    }
}

impl fmt::Display for MatchMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when a proposed union would put a never-match pair in the
/// same cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Reject the union and record it.
    #[default]
    Strict,
    /// Commit the union; the violation is still recorded, never dropped.
    Ignore,
}

impl FromStr for ConflictPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(ConflictPolicy::Strict),
            "ignore" => Ok(ConflictPolicy::Ignore),
            other => Err(anyhow!(
                "unknown conflict policy '{}' (expected 'strict' or 'ignore')",
                other
            )),
        }
    }
}

/// An unordered similarity pair produced by the oracle. `string_1` is
/// always the lexicographically smaller endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityEdge {
    pub string_1: String,
    pub string_2: String,
    pub score: f64,
}

impl SimilarityEdge {
    pub fn new(a: impl Into<String>, b: impl Into<String>, score: f64) -> Self {
        let (a, b) = (a.into(), b.into());
        let (string_1, string_2) = if a <= b { (a, b) } else { (b, a) };
        SimilarityEdge {
            string_1,
            string_2,
            score,
        }
    }
}

/// A committed union, kept for the audit artifact.
#[derive(Debug, Clone, Serialize)]
pub struct UnitedPair {
    pub string_1: String,
    pub string_2: String,
    pub method: MatchMethodType,
    pub score: Option<f64>,
}

impl UnitedPair {
    pub fn new(
        a: impl Into<String>,
        b: impl Into<String>,
        method: MatchMethodType,
        score: Option<f64>,
    ) -> Self {
        UnitedPair {
            string_1: a.into(),
            string_2: b.into(),
            method,
            score,
        }
    }
}

/// A union that ran into a never-match constraint. Under strict policy
/// the union was rejected (`committed == false`); under ignore it went
/// ahead and this records the violation. `score` is the similarity of the
/// proposed union, or `None` when the pair was already co-clustered before
/// prediction started.
#[derive(Debug, Clone, Serialize)]
pub struct NeverMatchHit {
    pub string_1: String,
    pub string_2: String,
    pub score: Option<f64>,
    pub never_string_1: String,
    pub never_string_2: String,
    pub committed: bool,
}

/// A pair present (transitively) in both the always-match and never-match
/// inputs.
#[derive(Debug, Clone, Serialize)]
pub struct ConstraintConflict {
    pub string_1: String,
    pub string_2: String,
}

/// Curated constraints folded together from the manual match files and any
/// prior review decisions.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    /// Groups of strings that must end up in the same cluster. The first
    /// string of each group is pinned as the preferred cluster label.
    pub always_groups: Vec<Vec<String>>,
    /// Pairs of strings that must never share a cluster.
    pub never_pairs: Vec<(String, String)>,
}

impl ConstraintSet {
    pub fn is_empty(&self) -> bool {
        self.always_groups.is_empty() && self.never_pairs.is_empty()
    }

    /// Fold confirmed review decisions into the constraint sets.
    pub fn extend_from_decisions(
        &mut self,
        confirmed: Vec<(String, String)>,
        rejected: Vec<(String, String)>,
    ) {
        self.always_groups
            .extend(confirmed.into_iter().map(|(a, b)| vec![a, b]));
        self.never_pairs.extend(rejected);
    }
}

/// An unresolved near-threshold pair, ranked for human adjudication. The
/// `decision` column is left blank for the reviewer.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewCandidate {
    pub string_1: String,
    pub string_2: String,
    pub score: f64,
    pub count_1: u64,
    pub count_2: u64,
    pub priority: f64,
    pub decision: String,
}

/// Everything the predictor did to the partition, for audit output.
#[derive(Debug, Clone, Default)]
pub struct PredictionReport {
    pub united: Vec<UnitedPair>,
    pub never_hits: Vec<NeverMatchHit>,
    pub conflicts: Vec<ConstraintConflict>,
}

impl PredictionReport {
    /// Unions rejected under strict policy.
    pub fn rejected(&self) -> impl Iterator<Item = &NeverMatchHit> {
        self.never_hits.iter().filter(|h| !h.committed)
    }
}

/// Normalized unordered text pair, used as a set key for never-match and
/// already-decided lookups.
pub fn unordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Build the set of unordered never pairs, including the pairwise
/// separation implied by a `separate_strings` set.
pub fn never_pair_set(
    constraints: &ConstraintSet,
    separate_strings: Option<&HashSet<String>>,
) -> HashSet<(String, String)> {
    let mut set: HashSet<(String, String)> = constraints
        .never_pairs
        .iter()
        .map(|(a, b)| unordered_pair(a, b))
        .collect();
    if let Some(separate) = separate_strings {
        let mut ordered: Vec<&String> = separate.iter().collect();
        ordered.sort();
        for (i, a) in ordered.iter().enumerate() {
            for b in &ordered[i + 1..] {
                set.insert(unordered_pair(a, b));
            }
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_edge_orders_endpoints() {
        let e = SimilarityEdge::new("b corp", "a corp", 0.7);
        assert_eq!(e.string_1, "a corp");
        assert_eq!(e.string_2, "b corp");
    }

    #[test]
    fn test_conflict_policy_parsing() {
        assert_eq!(
            "strict".parse::<ConflictPolicy>().unwrap(),
            ConflictPolicy::Strict
        );
        assert_eq!(
            "IGNORE".parse::<ConflictPolicy>().unwrap(),
            ConflictPolicy::Ignore
        );
        assert!("drop".parse::<ConflictPolicy>().is_err());
    }

    #[test]
    fn test_never_pair_set_includes_separate_strings() {
        let constraints = ConstraintSet {
            always_groups: vec![],
            never_pairs: vec![("x".into(), "y".into())],
        };
        let separate: HashSet<String> =
            ["a".to_string(), "b".to_string(), "c".to_string()].into();
        let set = never_pair_set(&constraints, Some(&separate));
        assert!(set.contains(&("x".to_string(), "y".to_string())));
        assert!(set.contains(&("a".to_string(), "b".to_string())));
        assert!(set.contains(&("a".to_string(), "c".to_string())));
        assert!(set.contains(&("b".to_string(), "c".to_string())));
        assert_eq!(set.len(), 4);
    }
}
