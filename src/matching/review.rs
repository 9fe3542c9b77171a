// src/matching/review.rs - ranked human-review queue

use std::collections::HashSet;

use crate::clustering::ClusterIndex;
use crate::models::core::{unordered_pair, ReviewCandidate, SimilarityEdge};

/// Ranks unresolved near-threshold pairs for manual adjudication.
///
/// Priority is sqrt(count_1 * count_2) * score * (1 - score): pairs that
/// affect many source rows and sit where the model is least confident rise
/// to the top; pairs the model is nearly certain about (score near 0 or 1)
/// rank low regardless of frequency.
#[derive(Debug, Clone, Default)]
pub struct ReviewQueueBuilder {
    /// Drop candidates at or below this priority.
    pub min_priority: Option<f64>,
    /// Drop candidates the model already scores above this bound.
    pub max_score: Option<f64>,
}

impl ReviewQueueBuilder {
    pub fn build(
        &self,
        index: &ClusterIndex,
        candidates: &[SimilarityEdge],
        never_pairs: &HashSet<(String, String)>,
    ) -> Vec<ReviewCandidate> {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut queue: Vec<ReviewCandidate> = candidates
            .iter()
            .filter(|edge| {
                // Already decided, one way or the other.
                !index.equiv(&edge.string_1, &edge.string_2)
                    && !never_pairs.contains(&unordered_pair(&edge.string_1, &edge.string_2))
            })
            .filter(|edge| seen.insert(unordered_pair(&edge.string_1, &edge.string_2)))
            .map(|edge| {
                let count_1 = index.pool().count_of_str(&edge.string_1);
                let count_2 = index.pool().count_of_str(&edge.string_2);
                let priority =
                    ((count_1 * count_2) as f64).sqrt() * edge.score * (1.0 - edge.score);
                ReviewCandidate {
                    string_1: edge.string_1.clone(),
                    string_2: edge.string_2.clone(),
                    score: edge.score,
                    count_1,
                    count_2,
                    priority,
                    decision: String::new(),
                }
            })
            .filter(|c| self.min_priority.map_or(true, |min| c.priority > min))
            .filter(|c| self.max_score.map_or(true, |max| c.score <= max))
            .collect();

        queue.sort_by(|a, b| {
            b.priority
                .total_cmp(&a.priority)
                .then_with(|| (&a.string_1, &a.string_2).cmp(&(&b.string_1, &b.string_2)))
        });
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::StringPool;

    fn index_with_counts(counts: &[(&str, usize)]) -> ClusterIndex {
        let mut pool = StringPool::new();
        for (s, n) in counts {
            pool.add(std::iter::repeat(*s).take(*n));
        }
        ClusterIndex::new(pool)
    }

    #[test]
    fn test_priority_formula_boundaries() {
        let index = index_with_counts(&[("a", 4), ("b", 4), ("c", 100), ("d", 100)]);
        let builder = ReviewQueueBuilder::default();
        let queue = builder.build(
            &index,
            &[
                SimilarityEdge::new("a", "b", 0.5),
                SimilarityEdge::new("c", "d", 1.0),
                SimilarityEdge::new("c", "a", 0.0),
            ],
            &HashSet::new(),
        );

        // score 0.5 with counts (4,4): sqrt(16) * 0.5 * 0.5 = 1.0
        let mid = queue.iter().find(|c| c.string_1 == "a" && c.string_2 == "b").unwrap();
        assert!((mid.priority - 1.0).abs() < 1e-12);
        // Certain pairs have priority 0 regardless of frequency.
        for c in queue.iter().filter(|c| c.score == 0.0 || c.score == 1.0) {
            assert_eq!(c.priority, 0.0);
        }
    }

    #[test]
    fn test_priority_cutoff_keeps_only_ambiguous_frequent_pairs() {
        // At score 0.5, priority = sqrt(c1*c2) / 4. Counts chosen to give
        // priorities [0.5, ~1.22, 3.0, ~0.9]; with cutoff 1 only the two
        // above it survive, highest first.
        let index = index_with_counts(&[
            ("p", 2),
            ("q", 2), // sqrt(4)/4    = 0.5
            ("r", 6),
            ("s", 4), // sqrt(24)/4  ~= 1.22
            ("t", 12),
            ("u", 12), // sqrt(144)/4 = 3.0
            ("v", 13),
            ("w", 1), // sqrt(13)/4  ~= 0.90
        ]);
        let edges = vec![
            SimilarityEdge::new("p", "q", 0.5),
            SimilarityEdge::new("r", "s", 0.5),
            SimilarityEdge::new("t", "u", 0.5),
            SimilarityEdge::new("v", "w", 0.5),
        ];
        let builder = ReviewQueueBuilder {
            min_priority: Some(1.0),
            max_score: None,
        };
        let queue = builder.build(&index, &edges, &HashSet::new());

        assert_eq!(queue.len(), 2);
        assert_eq!((queue[0].string_1.as_str(), queue[0].string_2.as_str()), ("t", "u"));
        assert!((queue[0].priority - 3.0).abs() < 1e-12);
        assert_eq!((queue[1].string_1.as_str(), queue[1].string_2.as_str()), ("r", "s"));
    }

    #[test]
    fn test_max_score_excludes_confident_pairs() {
        let index = index_with_counts(&[("a", 9), ("b", 9), ("c", 9)]);
        let builder = ReviewQueueBuilder {
            min_priority: None,
            max_score: Some(0.8),
        };
        let queue = builder.build(
            &index,
            &[
                SimilarityEdge::new("a", "b", 0.9),
                SimilarityEdge::new("a", "c", 0.6),
            ],
            &HashSet::new(),
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].score, 0.6);
    }

    #[test]
    fn test_decided_pairs_are_excluded() {
        let mut index = index_with_counts(&[("a", 1), ("b", 1), ("c", 1), ("d", 1)]);
        index.unite("a", "b");
        let never: HashSet<(String, String)> =
            [unordered_pair("c", "d")].into_iter().collect();
        let builder = ReviewQueueBuilder::default();
        let queue = builder.build(
            &index,
            &[
                SimilarityEdge::new("a", "b", 0.5),
                SimilarityEdge::new("c", "d", 0.5),
                SimilarityEdge::new("a", "c", 0.5),
            ],
            &never,
        );
        assert_eq!(queue.len(), 1);
        assert_eq!((queue[0].string_1.as_str(), queue[0].string_2.as_str()), ("a", "c"));
        assert!(queue[0].decision.is_empty());
    }
}
