// src/matching/predictor.rs - constraint-aware greedy clustering

use anyhow::{bail, Result};
use log::{debug, warn};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::clustering::ClusterIndex;
use crate::models::core::{
    ClusterId, ConflictPolicy, ConstraintConflict, ConstraintSet, MatchMethodType, NeverMatchHit,
    PredictionReport, SimilarityEdge, StringId, UnitedPair,
};
use crate::pool::StringPool;

#[derive(Debug, Clone, Copy)]
pub struct PredictorConfig {
    /// Minimum score for uniting an individual pair.
    pub t_edge: f64,
    /// Minimum mean cross-cluster score for uniting a cluster pair.
    pub t_group: f64,
    pub conflict_policy: ConflictPolicy,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        PredictorConfig {
            t_edge: 0.5,
            t_group: 0.6,
            conflict_policy: ConflictPolicy::Strict,
        }
    }
}

/// Refines the partition from the similarity graph, under the curated
/// constraints. Hard constraints always win over model scores.
#[derive(Debug, Clone)]
pub struct MatchPredictor {
    config: PredictorConfig,
}

/// Tracks, per current cluster root, the never-match obligations of its
/// members, so a proposed union can be checked without rescanning the
/// constraint list. Entries are (member, opponent) string-id pairs; a
/// union of clusters A and B is blocked when some opponent of A currently
/// lives in B.
#[derive(Debug, Default)]
struct NeverIndex {
    by_root: HashMap<ClusterId, Vec<(StringId, StringId)>>,
}

impl NeverIndex {
    fn build(index: &ClusterIndex, never_ids: &[(StringId, StringId)]) -> Self {
        let mut by_root: HashMap<ClusterId, Vec<(StringId, StringId)>> = HashMap::new();
        for &(a, b) in never_ids {
            by_root.entry(index.find_id(a)).or_default().push((a, b));
            by_root.entry(index.find_id(b)).or_default().push((b, a));
        }
        NeverIndex { by_root }
    }

    fn blocking_pair(
        &self,
        index: &ClusterIndex,
        root_a: ClusterId,
        root_b: ClusterId,
    ) -> Option<(StringId, StringId)> {
        if let Some(entries) = self.by_root.get(&root_a) {
            for &(member, opponent) in entries {
                if index.find_id(opponent) == root_b {
                    return Some((member, opponent));
                }
            }
        }
        None
    }

    fn merge(&mut self, old_a: ClusterId, old_b: ClusterId, new_root: ClusterId) {
        let mut merged = self.by_root.remove(&old_a).unwrap_or_default();
        if old_b != old_a {
            merged.extend(self.by_root.remove(&old_b).unwrap_or_default());
        }
        if !merged.is_empty() {
            self.by_root.insert(new_root, merged);
        }
    }
}

impl MatchPredictor {
    pub fn new(config: PredictorConfig) -> Self {
        MatchPredictor { config }
    }

    /// Apply constraints and the similarity graph to the partition.
    ///
    /// 1. Cross-validate always-match against never-match.
    /// 2. Apply always-match unions unconditionally, pinning each group's
    ///    first string as its label.
    /// 3. Unite each edge at or above `t_edge`, subject to never-match.
    /// 4. Unite cluster pairs whose mean cross-cluster score reaches
    ///    `t_group`, iterated to fixpoint.
    pub fn predict(
        &self,
        index: &mut ClusterIndex,
        edges: &[SimilarityEdge],
        constraints: &ConstraintSet,
        separate_strings: Option<&HashSet<String>>,
    ) -> Result<PredictionReport> {
        let mut report = PredictionReport::default();

        let conflicts = find_constraint_conflicts(constraints);
        if !conflicts.is_empty() {
            match self.config.conflict_policy {
                ConflictPolicy::Strict => {
                    let listing = conflicts
                        .iter()
                        .map(|(a, b)| format!("({:?}, {:?})", a, b))
                        .collect::<Vec<_>>()
                        .join(", ");
                    bail!(
                        "always-match and never-match constraints conflict for: {}",
                        listing
                    );
                }
                ConflictPolicy::Ignore => {
                    for (a, b) in conflicts {
                        warn!(
                            "constraint conflict for ({:?}, {:?}): always-match wins",
                            a, b
                        );
                        report.conflicts.push(ConstraintConflict {
                            string_1: a,
                            string_2: b,
                        });
                    }
                }
            }
        }

        for group in &constraints.always_groups {
            if let Some(first) = group.first() {
                index.pin_label(first);
            }
            for (a, b) in index.unite_group(group) {
                report
                    .united
                    .push(UnitedPair::new(a, b, MatchMethodType::AlwaysMatch, None));
            }
        }

        let mut never_ids: Vec<(StringId, StringId)> = Vec::new();
        for (a, b) in &constraints.never_pairs {
            let ia = index.intern(a);
            let ib = index.intern(b);
            never_ids.push((ia, ib));
        }
        if let Some(separate) = separate_strings {
            let mut ordered: Vec<&String> = separate.iter().collect();
            ordered.sort();
            let ids: Vec<StringId> = ordered.iter().map(|s| index.intern(s)).collect();
            for i in 0..ids.len() {
                for j in (i + 1)..ids.len() {
                    never_ids.push((ids[i], ids[j]));
                }
            }
        }
        // Translation, normalization, and voronoi unions run before
        // prediction and can already have put a never-match pair in one
        // cluster; that is a constraint violation like any other.
        let mut violated: Vec<(StringId, StringId)> = never_ids
            .iter()
            .copied()
            .filter(|&(a, b)| index.find_id(a) == index.find_id(b))
            .collect();
        violated.sort_unstable();
        violated.dedup();
        if !violated.is_empty() {
            match self.config.conflict_policy {
                ConflictPolicy::Strict => {
                    let listing = violated
                        .iter()
                        .map(|&(a, b)| {
                            format!(
                                "({:?}, {:?})",
                                index.pool().text_of(a),
                                index.pool().text_of(b)
                            )
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    bail!("never-match pairs already share a cluster: {}", listing);
                }
                ConflictPolicy::Ignore => {
                    for (a, b) in violated {
                        let s1 = index.pool().text_of(a).to_string();
                        let s2 = index.pool().text_of(b).to_string();
                        warn!(
                            "never-match pair ({:?}, {:?}) already shared a cluster before prediction",
                            s1, s2
                        );
                        report.never_hits.push(NeverMatchHit {
                            string_1: s1.clone(),
                            string_2: s2.clone(),
                            score: None,
                            never_string_1: s1,
                            never_string_2: s2,
                            committed: true,
                        });
                    }
                }
            }
        }
        let mut never = NeverIndex::build(index, &never_ids);

        // Edge pass, in deterministic descending-score order.
        let mut sorted: Vec<&SimilarityEdge> = edges.iter().collect();
        sorted.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| (&a.string_1, &a.string_2).cmp(&(&b.string_1, &b.string_2)))
        });
        for edge in sorted {
            if edge.score < self.config.t_edge {
                break;
            }
            let (Some(root_a), Some(root_b)) =
                (index.find(&edge.string_1), index.find(&edge.string_2))
            else {
                continue;
            };
            if root_a == root_b {
                continue;
            }
            self.try_unite(
                index,
                &mut never,
                &mut report,
                root_a,
                root_b,
                edge.string_1.as_str(),
                edge.string_2.as_str(),
                edge.score,
                MatchMethodType::Edge,
            );
        }

        self.group_pass(index, edges, &mut never, &mut report);

        debug!(
            "prediction united {} pairs ({} never-match hits, {} conflicts)",
            report.united.len(),
            report.never_hits.len(),
            report.conflicts.len()
        );
        Ok(report)
    }

    /// Aggregate weak cross-cluster evidence: unite cluster pairs whose
    /// mean edge score reaches `t_group`, repeating until no pair
    /// qualifies. Termination follows from the cluster count strictly
    /// decreasing on every merge.
    fn group_pass(
        &self,
        index: &mut ClusterIndex,
        edges: &[SimilarityEdge],
        never: &mut NeverIndex,
        report: &mut PredictionReport,
    ) {
        let mut attempted: HashSet<(StringId, StringId)> = HashSet::new();
        loop {
            let mut sums: HashMap<(ClusterId, ClusterId), (f64, usize)> = HashMap::new();
            for edge in edges {
                let (Some(ra), Some(rb)) =
                    (index.find(&edge.string_1), index.find(&edge.string_2))
                else {
                    continue;
                };
                if ra == rb {
                    continue;
                }
                let key = (ra.min(rb), ra.max(rb));
                let entry = sums.entry(key).or_insert((0.0, 0));
                entry.0 += edge.score;
                entry.1 += 1;
            }

            let anchors = cluster_anchors(index);
            let mut candidates: Vec<(f64, (StringId, StringId), String, String, ClusterId, ClusterId)> =
                sums.into_iter()
                    .filter_map(|((ra, rb), (sum, n))| {
                        let mean = sum / n as f64;
                        if mean < self.config.t_group {
                            return None;
                        }
                        let (key_a, label_a) = anchors.get(&ra)?.clone();
                        let (key_b, label_b) = anchors.get(&rb)?.clone();
                        let pair_key = (key_a.min(key_b), key_a.max(key_b));
                        let (label_a, label_b, ra, rb) = if label_a <= label_b {
                            (label_a, label_b, ra, rb)
                        } else {
                            (label_b, label_a, rb, ra)
                        };
                        Some((mean, pair_key, label_a, label_b, ra, rb))
                    })
                    .collect();
            candidates.sort_by(|a, b| {
                b.0.total_cmp(&a.0)
                    .then_with(|| (&a.2, &a.3).cmp(&(&b.2, &b.3)))
            });

            let mut merged_any = false;
            for (mean, pair_key, label_a, label_b, ra, rb) in candidates {
                // Stale if either cluster merged earlier this round.
                if index.find_id(ra) != ra || index.find_id(rb) != rb {
                    continue;
                }
                if !attempted.insert(pair_key) {
                    continue;
                }
                if self.try_unite(
                    index,
                    never,
                    report,
                    ra,
                    rb,
                    &label_a,
                    &label_b,
                    mean,
                    MatchMethodType::Group,
                ) {
                    merged_any = true;
                }
            }
            if !merged_any {
                break;
            }
        }
    }

    /// Assign every non-seed string to its most similar seed, when that
    /// similarity reaches `threshold`. Anchors ambiguous strings to
    /// known-good entities before free clustering runs on the remainder.
    pub fn voronoi(
        &self,
        index: &mut ClusterIndex,
        edges: &[SimilarityEdge],
        seeds: &HashSet<String>,
        threshold: f64,
    ) -> Vec<UnitedPair> {
        // Best seed per non-seed string; score ties go to the
        // lexicographically smaller seed.
        let mut best: HashMap<&str, (f64, &str)> = HashMap::new();
        for edge in edges {
            let s1_seed = seeds.contains(&edge.string_1);
            let s2_seed = seeds.contains(&edge.string_2);
            let (other, seed) = match (s1_seed, s2_seed) {
                (true, false) => (edge.string_2.as_str(), edge.string_1.as_str()),
                (false, true) => (edge.string_1.as_str(), edge.string_2.as_str()),
                _ => continue,
            };
            match best.get(other) {
                Some(&(score, current))
                    if edge.score < score || (edge.score == score && seed >= current) => {}
                _ => {
                    best.insert(other, (edge.score, seed));
                }
            }
        }

        let mut assignments: Vec<(&str, f64, &str)> = best
            .into_iter()
            .filter(|(_, (score, _))| *score >= threshold)
            .map(|(other, (score, seed))| (other, score, seed))
            .collect();
        assignments.sort_by(|a, b| a.0.cmp(b.0));

        let mut united = Vec::new();
        for (other, score, seed) in assignments {
            if index.unite(other, seed) {
                united.push(UnitedPair::new(
                    other,
                    seed,
                    MatchMethodType::Voronoi,
                    Some(score),
                ));
            }
        }
        united
    }

    #[allow(clippy::too_many_arguments)]
    fn try_unite(
        &self,
        index: &mut ClusterIndex,
        never: &mut NeverIndex,
        report: &mut PredictionReport,
        root_a: ClusterId,
        root_b: ClusterId,
        string_1: &str,
        string_2: &str,
        score: f64,
        method: MatchMethodType,
    ) -> bool {
        if let Some((member, opponent)) = never.blocking_pair(index, root_a, root_b) {
            let never_string_1 = index.pool().text_of(member).to_string();
            let never_string_2 = index.pool().text_of(opponent).to_string();
            let committed = self.config.conflict_policy == ConflictPolicy::Ignore;
            warn!(
                "union of ({:?}, {:?}) at {:.3} hits never-match ({:?}, {:?}); {}",
                string_1,
                string_2,
                score,
                never_string_1,
                never_string_2,
                if committed { "committed anyway" } else { "rejected" }
            );
            report.never_hits.push(NeverMatchHit {
                string_1: string_1.to_string(),
                string_2: string_2.to_string(),
                score: Some(score),
                never_string_1,
                never_string_2,
                committed,
            });
            if !committed {
                return false;
            }
        }

        index.unite(string_1, string_2);
        let new_root = index
            .find(string_1)
            .expect("string was just united, so it must be pooled");
        never.merge(root_a, root_b, new_root);
        report
            .united
            .push(UnitedPair::new(string_1, string_2, method, Some(score)));
        true
    }
}

/// Per cluster root: the smallest member id and the lexicographically
/// smallest member text. The id is stable under merges (the merged
/// cluster keeps the smaller minimum), so it keys the attempted-pair
/// guard; the text gives deterministic ordering and audit labels.
fn cluster_anchors(index: &ClusterIndex) -> HashMap<ClusterId, (StringId, String)> {
    let mut anchors: HashMap<ClusterId, (StringId, String)> = HashMap::new();
    for (id, text) in index.pool().iter() {
        let root = index.find_id(id);
        match anchors.entry(root) {
            // Pool iteration is in id order, so the first member seen
            // carries the cluster's minimum id.
            Entry::Vacant(slot) => {
                slot.insert((id, text.to_string()));
            }
            Entry::Occupied(mut slot) => {
                let (_, current) = slot.get_mut();
                if text < current.as_str() {
                    *current = text.to_string();
                }
            }
        }
    }
    anchors
}

/// Pairs that are transitively always-matched yet also never-matched.
fn find_constraint_conflicts(constraints: &ConstraintSet) -> Vec<(String, String)> {
    let mut scratch = ClusterIndex::new(StringPool::new());
    for group in &constraints.always_groups {
        scratch.unite_group(group);
    }
    constraints
        .never_pairs
        .iter()
        .filter(|(a, b)| scratch.equiv(a, b))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(strings: &[&str]) -> ClusterIndex {
        let mut pool = StringPool::new();
        pool.add(strings.iter().copied());
        ClusterIndex::new(pool)
    }

    fn predictor(t_edge: f64, t_group: f64, policy: ConflictPolicy) -> MatchPredictor {
        MatchPredictor::new(PredictorConfig {
            t_edge,
            t_group,
            conflict_policy: policy,
        })
    }

    #[test]
    fn test_edges_above_threshold_unite() {
        let mut index = index_of(&["a", "b", "c"]);
        let edges = vec![
            SimilarityEdge::new("a", "b", 0.9),
            SimilarityEdge::new("a", "c", 0.3),
        ];
        let p = predictor(0.5, 0.6, ConflictPolicy::Strict);
        let report = p
            .predict(&mut index, &edges, &ConstraintSet::default(), None)
            .unwrap();

        assert!(index.equiv("a", "b"));
        assert!(!index.equiv("a", "c"));
        assert_eq!(report.united.len(), 1);
        assert_eq!(report.united[0].method, MatchMethodType::Edge);
        assert_eq!(report.united[0].score, Some(0.9));
    }

    #[test]
    fn test_always_match_wins_without_any_edge() {
        let mut index = index_of(&["a", "b"]);
        let constraints = ConstraintSet {
            always_groups: vec![vec!["a".into(), "b".into()]],
            never_pairs: vec![],
        };
        let p = predictor(0.5, 0.6, ConflictPolicy::Strict);
        let report = p.predict(&mut index, &[], &constraints, None).unwrap();
        assert!(index.equiv("a", "b"));
        assert_eq!(report.united[0].method, MatchMethodType::AlwaysMatch);
    }

    #[test]
    fn test_transitive_never_match_rejected_under_strict() {
        let mut index = index_of(&["Acme Inc", "Acme Corp", "Acme Consulting"]);
        let constraints = ConstraintSet {
            always_groups: vec![vec!["Acme Inc".into(), "Acme Corp".into()]],
            never_pairs: vec![("Acme Inc".into(), "Acme Consulting".into())],
        };
        let edges = vec![SimilarityEdge::new("Acme Corp", "Acme Consulting", 0.9)];
        let p = predictor(0.5, 2.0, ConflictPolicy::Strict);
        let report = p.predict(&mut index, &edges, &constraints, None).unwrap();

        assert!(index.equiv("Acme Inc", "Acme Corp"));
        assert!(!index.equiv("Acme Corp", "Acme Consulting"));
        assert_eq!(report.rejected().count(), 1);
        let hit = &report.never_hits[0];
        assert!(!hit.committed);
        assert_eq!(hit.never_string_1, "Acme Inc");
        assert_eq!(hit.never_string_2, "Acme Consulting");
    }

    #[test]
    fn test_transitive_never_match_committed_under_ignore() {
        let mut index = index_of(&["Acme Inc", "Acme Corp", "Acme Consulting"]);
        let constraints = ConstraintSet {
            always_groups: vec![vec!["Acme Inc".into(), "Acme Corp".into()]],
            never_pairs: vec![("Acme Inc".into(), "Acme Consulting".into())],
        };
        let edges = vec![SimilarityEdge::new("Acme Corp", "Acme Consulting", 0.9)];
        let p = predictor(0.5, 2.0, ConflictPolicy::Ignore);
        let report = p.predict(&mut index, &edges, &constraints, None).unwrap();

        assert!(index.equiv("Acme Corp", "Acme Consulting"));
        assert_eq!(report.never_hits.len(), 1);
        assert!(report.never_hits[0].committed);
    }

    #[test]
    fn test_preexisting_never_match_union_fails_under_strict() {
        // United before prediction, e.g. by a normalization pass.
        let mut index = index_of(&["Mr. John Smith", "John Smith"]);
        index.unite("Mr. John Smith", "John Smith");
        let constraints = ConstraintSet {
            always_groups: vec![],
            never_pairs: vec![("Mr. John Smith".into(), "John Smith".into())],
        };
        let p = predictor(0.5, 0.6, ConflictPolicy::Strict);
        let err = p
            .predict(&mut index, &[], &constraints, None)
            .unwrap_err();
        assert!(err.to_string().contains("already share a cluster"));
        assert!(err.to_string().contains("John Smith"));
    }

    #[test]
    fn test_preexisting_never_match_union_recorded_under_ignore() {
        let mut index = index_of(&["Mr. John Smith", "John Smith"]);
        index.unite("Mr. John Smith", "John Smith");
        let constraints = ConstraintSet {
            always_groups: vec![],
            never_pairs: vec![("Mr. John Smith".into(), "John Smith".into())],
        };
        let p = predictor(0.5, 0.6, ConflictPolicy::Ignore);
        let report = p.predict(&mut index, &[], &constraints, None).unwrap();

        assert!(index.equiv("Mr. John Smith", "John Smith"));
        assert_eq!(report.never_hits.len(), 1);
        let hit = &report.never_hits[0];
        assert!(hit.committed);
        // No union was proposed, so there is no similarity score.
        assert_eq!(hit.score, None);
        assert_eq!(hit.never_string_1, "Mr. John Smith");
        assert_eq!(hit.never_string_2, "John Smith");
    }

    #[test]
    fn test_direct_constraint_conflict_fails_strict_run() {
        let mut index = index_of(&["a", "b"]);
        let constraints = ConstraintSet {
            always_groups: vec![vec!["a".into(), "b".into()]],
            never_pairs: vec![("a".into(), "b".into())],
        };
        let p = predictor(0.5, 0.6, ConflictPolicy::Strict);
        let err = p
            .predict(&mut index, &[], &constraints, None)
            .unwrap_err();
        assert!(err.to_string().contains("\"a\""));
        assert!(err.to_string().contains("\"b\""));
    }

    #[test]
    fn test_direct_constraint_conflict_recorded_under_ignore() {
        let mut index = index_of(&["a", "b"]);
        let constraints = ConstraintSet {
            always_groups: vec![vec!["a".into(), "b".into()]],
            never_pairs: vec![("a".into(), "b".into())],
        };
        let p = predictor(0.5, 0.6, ConflictPolicy::Ignore);
        let report = p.predict(&mut index, &[], &constraints, None).unwrap();
        // Always-match wins; the conflict is recorded, not dropped.
        assert!(index.equiv("a", "b"));
        assert_eq!(report.conflicts.len(), 1);
    }

    #[test]
    fn test_group_pass_aggregates_weak_edges() {
        let mut index = index_of(&["a1", "a2", "b1", "b2"]);
        index.unite("a1", "a2");
        index.unite("b1", "b2");
        // No single edge reaches t_edge, but the mean does reach t_group.
        let edges = vec![
            SimilarityEdge::new("a1", "b1", 0.55),
            SimilarityEdge::new("a2", "b2", 0.55),
        ];
        let p = predictor(0.7, 0.5, ConflictPolicy::Strict);
        let report = p
            .predict(&mut index, &edges, &ConstraintSet::default(), None)
            .unwrap();

        assert!(index.equiv("a1", "b1"));
        assert_eq!(report.united.len(), 1);
        assert_eq!(report.united[0].method, MatchMethodType::Group);
        assert_eq!(report.united[0].score, Some(0.55));
    }

    #[test]
    fn test_group_pass_respects_never_match() {
        let mut index = index_of(&["a1", "a2", "b1", "b2"]);
        index.unite("a1", "a2");
        index.unite("b1", "b2");
        let constraints = ConstraintSet {
            always_groups: vec![],
            never_pairs: vec![("a1".into(), "b2".into())],
        };
        let edges = vec![
            SimilarityEdge::new("a1", "b1", 0.55),
            SimilarityEdge::new("a2", "b2", 0.55),
        ];
        let p = predictor(0.7, 0.5, ConflictPolicy::Strict);
        let report = p.predict(&mut index, &edges, &constraints, None).unwrap();

        assert!(!index.equiv("a1", "b1"));
        assert_eq!(report.rejected().count(), 1);
    }

    #[test]
    fn test_rejected_cluster_pair_is_not_reattempted_after_merge() {
        // Round 1 rejects beta-omega, then merges alpha into beta's
        // cluster, which changes the cluster's anchor text. The blocked
        // pair must still count as attempted in round 2.
        let mut index = index_of(&["beta", "omega", "alpha"]);
        let constraints = ConstraintSet {
            always_groups: vec![],
            never_pairs: vec![("beta".into(), "omega".into())],
        };
        let edges = vec![
            SimilarityEdge::new("beta", "omega", 0.8),
            SimilarityEdge::new("alpha", "beta", 0.7),
        ];
        let p = predictor(0.99, 0.6, ConflictPolicy::Strict);
        let report = p.predict(&mut index, &edges, &constraints, None).unwrap();

        assert!(index.equiv("alpha", "beta"));
        assert!(!index.equiv("beta", "omega"));
        assert_eq!(report.never_hits.len(), 1);
    }

    #[test]
    fn test_separate_strings_never_merge_with_each_other() {
        let mut index = index_of(&["seed a", "seed b", "other"]);
        let separate: HashSet<String> = ["seed a".to_string(), "seed b".to_string()].into();
        let edges = vec![
            SimilarityEdge::new("seed a", "seed b", 0.99),
            SimilarityEdge::new("seed a", "other", 0.8),
        ];
        let p = predictor(0.5, 2.0, ConflictPolicy::Strict);
        p.predict(&mut index, &edges, &ConstraintSet::default(), Some(&separate))
            .unwrap();

        assert!(!index.equiv("seed a", "seed b"));
        assert!(index.equiv("seed a", "other"));
    }

    #[test]
    fn test_edge_order_does_not_change_partition() {
        let edges = vec![
            SimilarityEdge::new("a", "b", 0.8),
            SimilarityEdge::new("b", "c", 0.7),
            SimilarityEdge::new("d", "e", 0.9),
            SimilarityEdge::new("c", "d", 0.3),
        ];
        let mut reversed = edges.clone();
        reversed.reverse();

        let p = predictor(0.5, 2.0, ConflictPolicy::Strict);
        let mut first = index_of(&["a", "b", "c", "d", "e"]);
        p.predict(&mut first, &edges, &ConstraintSet::default(), None)
            .unwrap();
        let mut second = index_of(&["a", "b", "c", "d", "e"]);
        p.predict(&mut second, &reversed, &ConstraintSet::default(), None)
            .unwrap();

        assert_eq!(first.to_mapping(), second.to_mapping());
    }

    #[test]
    fn test_voronoi_assigns_to_nearest_seed_above_threshold() {
        let mut index = index_of(&["Seed One", "Seed Two", "close to one", "far away"]);
        let seeds: HashSet<String> = ["Seed One".to_string(), "Seed Two".to_string()].into();
        let edges = vec![
            SimilarityEdge::new("close to one", "Seed One", 0.9),
            SimilarityEdge::new("close to one", "Seed Two", 0.6),
            SimilarityEdge::new("far away", "Seed One", 0.2),
        ];
        let p = predictor(0.5, 0.6, ConflictPolicy::Strict);
        let united = p.voronoi(&mut index, &edges, &seeds, 0.75);

        assert!(index.equiv("close to one", "Seed One"));
        assert!(!index.equiv("close to one", "Seed Two"));
        assert!(!index.equiv("far away", "Seed One"));
        assert_eq!(united.len(), 1);
        assert_eq!(united[0].method, MatchMethodType::Voronoi);
    }
}
