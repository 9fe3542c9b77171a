// src/matching/mod.rs - end-to-end linking pipeline

pub mod normalizer;
pub mod oracle;
pub mod predictor;
pub mod review;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use log::info;
use std::collections::HashSet;

use crate::clustering::ClusterIndex;
use crate::models::core::{
    never_pair_set, unordered_pair, ConflictPolicy, ConstraintSet, MatchMethodType,
    PredictionReport, ReviewCandidate, SimilarityEdge, UnitedPair,
};
use crate::pool::StringPool;
use normalizer::Normalizer;
use oracle::SimilarityOracle;
use predictor::{MatchPredictor, PredictorConfig};
use review::ReviewQueueBuilder;

/// Full configuration surface of one linking run.
#[derive(Debug, Clone)]
pub struct LinkingConfig {
    /// Pairwise match threshold.
    pub t_edge: f64,
    /// Aggregate cluster-pair threshold.
    pub t_group: f64,
    /// Lower thresholds for the review candidate pass.
    pub review_t_edge: f64,
    pub review_t_group: f64,
    /// Minimum score for materializing a similarity edge at all.
    pub min_edge_score: f64,
    pub conflict_policy: ConflictPolicy,
    /// Voronoi seed assignment threshold; seeds are also kept separated
    /// from each other during free clustering.
    pub voronoi_threshold: f64,
    /// Review queue filters.
    pub review_min_priority: Option<f64>,
    pub review_max_score: Option<f64>,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        // Edge/group defaults follow the production linking scripts.
        LinkingConfig {
            t_edge: 0.5,
            t_group: 0.6,
            review_t_edge: 0.3,
            review_t_group: 0.4,
            min_edge_score: 0.2,
            conflict_policy: ConflictPolicy::Strict,
            voronoi_threshold: 0.75,
            review_min_priority: None,
            review_max_score: None,
        }
    }
}

/// Terminal state of a run: the finalized partition plus everything the
/// output artifacts need.
#[derive(Debug)]
pub struct LinkingOutcome {
    pub index: ClusterIndex,
    pub united: Vec<UnitedPair>,
    pub report: PredictionReport,
    pub review_queue: Vec<ReviewCandidate>,
    pub edges_materialized: usize,
}

/// Run the whole flow: pool the raw names, seed unions from translations
/// and normalization, embed and materialize the similarity graph, anchor
/// to seeds if given, predict, and build the review queue.
///
/// Everything before the embedding call is cheap and non-destructive, so a
/// failed or interrupted oracle call can simply be retried by rerunning.
pub fn run_linking_pipeline(
    oracle: &dyn SimilarityOracle,
    config: &LinkingConfig,
    raw_names: Vec<String>,
    translations: &[(String, String)],
    normalizer: &Normalizer,
    constraints: &ConstraintSet,
    seeds: Option<&HashSet<String>>,
    progress: Option<&ProgressBar>,
) -> Result<LinkingOutcome> {
    let mut pool = StringPool::new();
    pool.add(raw_names);
    info!("pooled {} unique strings", pool.len());

    let mut index = ClusterIndex::new(pool);
    let mut united: Vec<UnitedPair> = Vec::new();

    // Bilingual versions of the same record field denote the same entity.
    for (a, b) in index.unite_pairs(translations.iter().map(|(a, b)| (a.as_str(), b.as_str()))) {
        united.push(UnitedPair::new(a, b, MatchMethodType::Translation, None));
    }

    for (a, b) in index.unite_by_key(|s| normalizer.normalize(s)) {
        united.push(UnitedPair::new(a, b, MatchMethodType::Normalized, None));
    }
    info!(
        "{} clusters after translation and normalization unions",
        index.cluster_count()
    );

    // The only expensive step; everything above is reconstructible.
    let edge_cutoff = config.min_edge_score.min(config.review_t_edge);
    let edges = oracle::materialize_edges(oracle, index.pool(), edge_cutoff, progress)
        .context("failed to materialize similarity edges")?;
    info!("materialized {} similarity edges", edges.len());

    let predictor = MatchPredictor::new(PredictorConfig {
        t_edge: config.t_edge,
        t_group: config.t_group,
        conflict_policy: config.conflict_policy,
    });

    if let Some(seeds) = seeds {
        let assigned = predictor.voronoi(&mut index, &edges, seeds, config.voronoi_threshold);
        info!("voronoi pass anchored {} strings to seeds", assigned.len());
        united.extend(assigned);
    }

    let report = predictor.predict(&mut index, &edges, constraints, seeds)?;
    united.extend(report.united.iter().cloned());
    info!(
        "{} clusters after prediction ({} unions, {} never-match hits)",
        index.cluster_count(),
        report.united.len(),
        report.never_hits.len()
    );

    // Review pass: rerun prediction with the wider thresholds on a scratch
    // copy; whatever it would unite beyond the production partition is a
    // candidate for human review.
    let review_predictor = MatchPredictor::new(PredictorConfig {
        t_edge: config.review_t_edge,
        t_group: config.review_t_group,
        conflict_policy: ConflictPolicy::Ignore,
    });
    let mut scratch = index.clone();
    let review_report = review_predictor.predict(&mut scratch, &edges, constraints, seeds)?;
    let candidates: Vec<SimilarityEdge> = review_report
        .united
        .iter()
        .filter_map(|pair| {
            pair.score
                .map(|score| SimilarityEdge::new(pair.string_1.clone(), pair.string_2.clone(), score))
        })
        .collect();

    let builder = ReviewQueueBuilder {
        min_priority: config.review_min_priority,
        max_score: config.review_max_score,
    };
    let mut never = never_pair_set(constraints, seeds);
    // A union that hit a never-match constraint in either pass is already
    // decided; it must not come back as a review candidate.
    for hit in report.never_hits.iter().chain(&review_report.never_hits) {
        never.insert(unordered_pair(&hit.string_1, &hit.string_2));
    }
    let review_queue = builder.build(&index, &candidates, &never);
    info!("review queue holds {} candidates", review_queue.len());

    Ok(LinkingOutcome {
        edges_materialized: edges.len(),
        index,
        united,
        report,
        review_queue,
    })
}
