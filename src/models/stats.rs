// src/models/stats.rs

use serde::Serialize;

/// Summary counters for one linking run, logged at completion and stamped
/// into the audit artifact.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkingStats {
    pub strings_pooled: usize,
    pub rows_skipped_blank: u64,
    pub edges_materialized: usize,
    pub clusters: usize,
    pub pairs_united: usize,
    pub unions_rejected: usize,
    pub constraint_conflicts: usize,
    pub review_candidates: usize,
}
