// src/io/mod.rs - extract, constraint, and artifact files

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use crate::clustering::ClusterIndex;
use crate::models::core::{NeverMatchHit, ReviewCandidate, UnitedPair};

/// Name-bearing rows pulled from one source extract.
#[derive(Debug, Default)]
pub struct Extract {
    /// Every non-blank name value, across all configured columns, in row
    /// order. Feeds the string pool.
    pub pooled: Vec<String>,
    /// (record id, name) per row, taking the first non-blank name column
    /// in priority order. Feeds the per-record linking table.
    pub records: Vec<(String, String)>,
    /// Rows whose name columns were all blank. Counted, never fatal.
    pub skipped_rows: u64,
}

fn column_index(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .with_context(|| format!("column '{}' not found in {}", name, path.display()))
}

/// Read (record id, raw name) pairs from a CSV extract. `name_columns` are
/// tried in order per row; typically the English name first with the
/// French one as fallback.
pub fn read_extract(path: &Path, id_column: &str, name_columns: &[String]) -> Result<Extract> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open extract {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let id_idx = column_index(&headers, id_column, path)?;
    let name_idxs = name_columns
        .iter()
        .map(|c| column_index(&headers, c, path))
        .collect::<Result<Vec<_>>>()?;

    let mut extract = Extract::default();
    for row in reader.records() {
        let row = row.with_context(|| format!("malformed row in {}", path.display()))?;
        let record_id = row.get(id_idx).unwrap_or("").trim().to_string();

        let mut primary: Option<String> = None;
        for &idx in &name_idxs {
            let value = row.get(idx).unwrap_or("").trim();
            if value.is_empty() {
                continue;
            }
            extract.pooled.push(value.to_string());
            if primary.is_none() {
                primary = Some(value.to_string());
            }
        }
        match primary {
            Some(name) => extract.records.push((record_id, name)),
            None => extract.skipped_rows += 1,
        }
    }
    debug!(
        "{}: {} names pooled, {} records, {} blank rows skipped",
        path.display(),
        extract.pooled.len(),
        extract.records.len(),
        extract.skipped_rows
    );
    Ok(extract)
}

/// Distinct bilingual pairs from two columns of an extract, to be
/// pre-united as translations of the same entity.
pub fn read_translation_pairs(
    path: &Path,
    column_a: &str,
    column_b: &str,
) -> Result<Vec<(String, String)>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open extract {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let a_idx = column_index(&headers, column_a, path)?;
    let b_idx = column_index(&headers, column_b, path)?;

    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for row in reader.records() {
        let row = row?;
        let a = row.get(a_idx).unwrap_or("").trim();
        let b = row.get(b_idx).unwrap_or("").trim();
        if a.is_empty() || b.is_empty() || a == b {
            continue;
        }
        if seen.insert((a.to_string(), b.to_string())) {
            pairs.push((a.to_string(), b.to_string()));
        }
    }
    Ok(pairs)
}

/// Curated always-match file: a JSON array of string groups.
pub fn read_always_groups(path: &Path) -> Result<Vec<Vec<String>>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open always-match file {}", path.display()))?;
    let groups: Vec<Vec<String>> = serde_json::from_reader(file)
        .with_context(|| format!("malformed always-match file {}", path.display()))?;
    Ok(groups)
}

/// Curated never-match file: a JSON array of string pairs.
pub fn read_never_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open never-match file {}", path.display()))?;
    let raw: Vec<Vec<String>> = serde_json::from_reader(file)
        .with_context(|| format!("malformed never-match file {}", path.display()))?;
    let mut pairs = Vec::with_capacity(raw.len());
    for entry in raw {
        match <[String; 2]>::try_from(entry) {
            Ok([a, b]) => pairs.push((a, b)),
            Err(entry) => bail!(
                "never-match entries must be pairs; {} has one of {} strings",
                path.display(),
                entry.len()
            ),
        }
    }
    Ok(pairs)
}

/// Trusted seed strings for the voronoi pass: a JSON array of strings.
pub fn read_seed_strings(path: &Path) -> Result<HashSet<String>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open seed file {}", path.display()))?;
    let seeds: Vec<String> = serde_json::from_reader(file)
        .with_context(|| format!("malformed seed file {}", path.display()))?;
    Ok(seeds.into_iter().collect())
}

/// A prior review queue with the decision column filled in. `match` rows
/// become always-match constraints, `no_match` rows never-match; anything
/// else (including still-blank rows) is ignored.
pub fn read_review_decisions(
    path: &Path,
) -> Result<(Vec<(String, String)>, Vec<(String, String)>, u64)> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open review file {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let s1_idx = column_index(&headers, "string_1", path)?;
    let s2_idx = column_index(&headers, "string_2", path)?;
    let decision_idx = column_index(&headers, "decision", path)?;

    let mut confirmed = Vec::new();
    let mut rejected = Vec::new();
    let mut ignored = 0u64;
    for row in reader.records() {
        let row = row?;
        let pair = (
            row.get(s1_idx).unwrap_or("").trim().to_string(),
            row.get(s2_idx).unwrap_or("").trim().to_string(),
        );
        if pair.0.is_empty() || pair.1.is_empty() {
            ignored += 1;
            continue;
        }
        match row
            .get(decision_idx)
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "match" => confirmed.push(pair),
            "no_match" => rejected.push(pair),
            "" => ignored += 1,
            other => {
                warn!("ignoring review decision {:?} for {:?}", other, pair);
                ignored += 1;
            }
        }
    }
    Ok((confirmed, rejected, ignored))
}

#[derive(Debug, Serialize)]
struct MappingRow<'a> {
    raw_name: &'a str,
    canonical_name: &'a str,
}

/// Artifact (a): raw string -> canonical label for every pooled string.
pub fn write_mapping(path: &Path, index: &ClusterIndex) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for (raw, canonical) in index.to_mapping() {
        writer.serialize(MappingRow {
            raw_name: &raw,
            canonical_name: &canonical,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct UnitedPairRow<'a> {
    run_id: &'a str,
    string_1: &'a str,
    string_2: &'a str,
    method: &'a str,
    score: Option<f64>,
}

/// Artifact (b): every union performed, with its method and contributing
/// score, for audit.
pub fn write_united_pairs(path: &Path, run_id: &str, united: &[UnitedPair]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for pair in united {
        writer.serialize(UnitedPairRow {
            run_id,
            string_1: &pair.string_1,
            string_2: &pair.string_2,
            method: pair.method.as_str(),
            score: pair.score,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct NeverHitRow<'a> {
    run_id: &'a str,
    string_1: &'a str,
    string_2: &'a str,
    score: Option<f64>,
    never_string_1: &'a str,
    never_string_2: &'a str,
    committed: bool,
}

/// Audit sidecar: unions that hit a never-match constraint, whether
/// rejected (strict) or committed anyway (ignore).
pub fn write_never_hits(path: &Path, run_id: &str, hits: &[NeverMatchHit]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for hit in hits {
        writer.serialize(NeverHitRow {
            run_id,
            string_1: &hit.string_1,
            string_2: &hit.string_2,
            score: hit.score,
            never_string_1: &hit.never_string_1,
            never_string_2: &hit.never_string_2,
            committed: hit.committed,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Artifact (c): the ranked review queue. Columns match what
/// `read_review_decisions` expects back, with the decision column blank.
pub fn write_review_queue(path: &Path, queue: &[ReviewCandidate]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for candidate in queue {
        writer.serialize(candidate)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct RecordLinkRow<'a> {
    record_id: &'a str,
    raw_name: &'a str,
    canonical_name: &'a str,
}

/// Artifact (d): record id -> canonical label, joined by raw-name lookup.
pub fn write_record_linking(
    path: &Path,
    records: &[(String, String)],
    index: &ClusterIndex,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for (record_id, raw) in records {
        let cluster = index
            .find(raw)
            .with_context(|| format!("record {} carries unpooled name {:?}", record_id, raw))?;
        let canonical = index
            .representative_label(cluster)
            .with_context(|| format!("cluster for {:?} has no label", raw))?;
        writer.serialize(RecordLinkRow {
            record_id,
            raw_name: raw,
            canonical_name: canonical,
        })?;
    }
    writer.flush()?;
    Ok(())
}
