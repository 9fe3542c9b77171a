use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

use linker_lib::io;
use linker_lib::matching::normalizer::{Normalizer, Universe};
use linker_lib::matching::oracle::TrigramOracle;
use linker_lib::matching::{run_linking_pipeline, LinkingConfig};
use linker_lib::models::core::{ConflictPolicy, ConstraintSet};
use linker_lib::models::stats::LinkingStats;

/// Cluster raw registry name strings into canonical entities and emit the
/// linking tables.
#[derive(Parser, Debug)]
#[command(name = "link_names")]
struct Cli {
    /// Source extract CSV.
    #[arg(long)]
    extract: PathBuf,

    /// Record identifier column in the extract.
    #[arg(long)]
    id_column: String,

    /// Name columns, in fallback priority order (English first, then
    /// French, per the registry exports).
    #[arg(long, value_delimiter = ',', required = true)]
    name_columns: Vec<String>,

    /// Bilingual column pair whose values are pre-united as translations,
    /// e.g. EN_CLIENT_ORG_CORP_NM_AN,FR_CLIENT_ORG_CORP_NM.
    #[arg(long, value_delimiter = ',')]
    translation_columns: Option<Vec<String>>,

    /// String universe being linked: 'org' or 'person'. Selects the
    /// normalizer preset.
    #[arg(long, default_value = "org")]
    universe: String,

    /// Custom removal regex for the normalizer, replacing the universe
    /// preset's set. Repeat the flag for multiple patterns.
    #[arg(long = "removal-pattern")]
    removal_patterns: Vec<String>,

    /// Curated always-match JSON (array of string groups).
    #[arg(long)]
    always_match: Option<PathBuf>,

    /// Curated never-match JSON (array of string pairs).
    #[arg(long)]
    never_match: Option<PathBuf>,

    /// Prior review queue CSV with decisions filled in.
    #[arg(long)]
    review_decisions: Option<PathBuf>,

    /// Trusted seed strings JSON for voronoi anchoring.
    #[arg(long)]
    seeds: Option<PathBuf>,

    /// Pairwise match threshold.
    #[arg(long, default_value_t = 0.5)]
    t_edge: f64,

    /// Aggregate cluster-pair threshold.
    #[arg(long, default_value_t = 0.6)]
    t_group: f64,

    /// Pairwise threshold for the review candidate pass.
    #[arg(long, default_value_t = 0.3)]
    review_t_edge: f64,

    /// Aggregate threshold for the review candidate pass.
    #[arg(long, default_value_t = 0.4)]
    review_t_group: f64,

    /// Minimum score for materializing a similarity edge.
    #[arg(long, default_value_t = 0.2)]
    min_edge_score: f64,

    /// Voronoi seed assignment threshold.
    #[arg(long, default_value_t = 0.75)]
    voronoi_threshold: f64,

    /// 'strict' or 'ignore'.
    #[arg(long, default_value = "strict")]
    conflict_policy: String,

    /// Keep only review candidates strictly above this priority.
    #[arg(long)]
    review_min_priority: Option<f64>,

    /// Keep only review candidates at or below this score.
    #[arg(long)]
    review_max_score: Option<f64>,

    /// Directory for the output artifacts.
    #[arg(long, default_value = "linked")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let run_id = Uuid::new_v4().to_string();
    let started = Instant::now();
    info!("starting linking run {} at {}", run_id, Utc::now());

    let universe: Universe = cli.universe.parse()?;
    let conflict_policy: ConflictPolicy = cli.conflict_policy.parse()?;
    let normalizer = if cli.removal_patterns.is_empty() {
        Normalizer::for_universe(universe)
    } else {
        let patterns: Vec<&str> = cli.removal_patterns.iter().map(String::as_str).collect();
        Normalizer::new(universe.case_rule(), &patterns)?
    };

    let extract = io::read_extract(&cli.extract, &cli.id_column, &cli.name_columns)?;
    info!(
        "read {} records ({} blank rows skipped) from {}",
        extract.records.len(),
        extract.skipped_rows,
        cli.extract.display()
    );

    let translations = match &cli.translation_columns {
        Some(cols) => {
            anyhow::ensure!(
                cols.len() == 2,
                "--translation-columns takes exactly two column names, got {}",
                cols.len()
            );
            io::read_translation_pairs(&cli.extract, &cols[0], &cols[1])?
        }
        None => Vec::new(),
    };
    if !translations.is_empty() {
        info!("found {} distinct bilingual name pairs", translations.len());
    }

    let mut constraints = ConstraintSet::default();
    if let Some(path) = &cli.always_match {
        constraints.always_groups = io::read_always_groups(path)?;
    }
    if let Some(path) = &cli.never_match {
        constraints.never_pairs = io::read_never_pairs(path)?;
    }
    if let Some(path) = &cli.review_decisions {
        let (confirmed, rejected, ignored) = io::read_review_decisions(path)?;
        info!(
            "folded in review decisions: {} confirmed, {} rejected, {} ignored",
            confirmed.len(),
            rejected.len(),
            ignored
        );
        constraints.extend_from_decisions(confirmed, rejected);
    }

    let seeds: Option<HashSet<String>> = match &cli.seeds {
        Some(path) => Some(io::read_seed_strings(path)?),
        None => None,
    };

    let config = LinkingConfig {
        t_edge: cli.t_edge,
        t_group: cli.t_group,
        review_t_edge: cli.review_t_edge,
        review_t_group: cli.review_t_group,
        min_edge_score: cli.min_edge_score,
        conflict_policy,
        voronoi_threshold: cli.voronoi_threshold,
        review_min_priority: cli.review_min_priority,
        review_max_score: cli.review_max_score,
    };

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] embedding and scoring: {pos} strings")
            .context("failed to set progress bar style")?,
    );

    let oracle = TrigramOracle::default();
    let outcome = run_linking_pipeline(
        &oracle,
        &config,
        extract.pooled.clone(),
        &translations,
        &normalizer,
        &constraints,
        seeds.as_ref(),
        Some(&progress),
    )?;
    progress.finish_and_clear();

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("failed to create output directory {}", cli.out_dir.display()))?;
    io::write_mapping(&cli.out_dir.join("matches.csv"), &outcome.index)?;
    io::write_united_pairs(&cli.out_dir.join("united_pairs.csv"), &run_id, &outcome.united)?;
    io::write_never_hits(
        &cli.out_dir.join("constraint_hits.csv"),
        &run_id,
        &outcome.report.never_hits,
    )?;
    io::write_review_queue(&cli.out_dir.join("review_queue.csv"), &outcome.review_queue)?;
    io::write_record_linking(
        &cli.out_dir.join("record_linking.csv"),
        &extract.records,
        &outcome.index,
    )?;

    let stats = LinkingStats {
        strings_pooled: outcome.index.pool().len(),
        rows_skipped_blank: extract.skipped_rows,
        edges_materialized: outcome.edges_materialized,
        clusters: outcome.index.cluster_count(),
        pairs_united: outcome.united.len(),
        unions_rejected: outcome.report.rejected().count(),
        constraint_conflicts: outcome.report.conflicts.len(),
        review_candidates: outcome.review_queue.len(),
    };
    info!(
        "run {} finished in {:.1}s: {}",
        run_id,
        started.elapsed().as_secs_f64(),
        serde_json::to_string(&stats)?
    );
    Ok(())
}
