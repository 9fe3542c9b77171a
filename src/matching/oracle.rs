// src/matching/oracle.rs - embedding similarity boundary

use anyhow::{bail, Result};
use indicatif::ProgressBar;

use crate::models::core::SimilarityEdge;
use crate::pool::StringPool;

/// Fixed-length numeric vector for one string. The engine never assumes a
/// particular dimensionality.
pub type Embedding = Vec<f32>;

/// External embedding/similarity model. Scores must be symmetric and lie
/// in [0,1], higher meaning more likely the same entity; both properties
/// are enforced at the boundary when edges are materialized.
pub trait SimilarityOracle {
    fn embed(&self, strings: &[&str]) -> Result<Vec<Embedding>>;
    fn score(&self, a: &Embedding, b: &Embedding) -> Result<f64>;
}

/// Tolerance for the symmetry check; scoring the pair in either direction
/// must agree to well below any threshold granularity.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Embed the whole pool and materialize the sparse similarity graph: every
/// unordered pair scoring at or above `min_score`.
///
/// Malformed scores (outside [0,1], non-finite, or asymmetric) are
/// rejected with an error rather than clamped; silently repairing them
/// would corrupt the clustering thresholds downstream.
///
/// This is the brute-force cross-product strategy; it is the pool-sized
/// batch call the pipeline treats as retryable, and nothing before it is
/// destructive.
pub fn materialize_edges(
    oracle: &dyn SimilarityOracle,
    pool: &StringPool,
    min_score: f64,
    progress: Option<&ProgressBar>,
) -> Result<Vec<SimilarityEdge>> {
    let strings: Vec<&str> = pool.iter().map(|(_, t)| t).collect();
    let embeddings = oracle.embed(&strings)?;
    if embeddings.len() != strings.len() {
        bail!(
            "oracle returned {} embeddings for {} strings",
            embeddings.len(),
            strings.len()
        );
    }

    let mut edges = Vec::new();
    for i in 0..strings.len() {
        for j in (i + 1)..strings.len() {
            let forward = oracle.score(&embeddings[i], &embeddings[j])?;
            if !forward.is_finite() || !(0.0..=1.0).contains(&forward) {
                bail!(
                    "oracle produced score {} outside [0,1] for pair ({:?}, {:?})",
                    forward,
                    strings[i],
                    strings[j]
                );
            }
            let backward = oracle.score(&embeddings[j], &embeddings[i])?;
            if (forward - backward).abs() > SYMMETRY_TOLERANCE {
                bail!(
                    "oracle is not symmetric for pair ({:?}, {:?}): {} vs {}",
                    strings[i],
                    strings[j],
                    forward,
                    backward
                );
            }
            if forward >= min_score {
                edges.push(SimilarityEdge::new(strings[i], strings[j], forward));
            }
        }
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }
    Ok(edges)
}

/// Reference oracle: hashed character-trigram count vectors scored by
/// cosine similarity. Deterministic and self-contained; a stand-in for a
/// trained similarity model, and what the tests run against.
#[derive(Debug, Clone)]
pub struct TrigramOracle {
    dims: usize,
}

impl Default for TrigramOracle {
    fn default() -> Self {
        TrigramOracle { dims: 256 }
    }
}

impl TrigramOracle {
    pub fn new(dims: usize) -> Self {
        TrigramOracle { dims }
    }

    fn embed_one(&self, s: &str) -> Embedding {
        let mut v = vec![0f32; self.dims];
        let padded = format!("  {}  ", s.to_lowercase());
        let chars: Vec<char> = padded.chars().collect();
        for window in chars.windows(3) {
            let trigram: String = window.iter().collect();
            let slot = (fnv1a(trigram.as_bytes()) as usize) % self.dims;
            v[slot] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl SimilarityOracle for TrigramOracle {
    fn embed(&self, strings: &[&str]) -> Result<Vec<Embedding>> {
        Ok(strings.iter().map(|s| self.embed_one(s)).collect())
    }

    fn score(&self, a: &Embedding, b: &Embedding) -> Result<f64> {
        if a.len() != b.len() {
            bail!(
                "embedding dimensionality mismatch: {} vs {}",
                a.len(),
                b.len()
            );
        }
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        // Unit non-negative vectors; guard float round-off at the ends.
        Ok(f64::from(dot).clamp(0.0, 1.0))
    }
}

/// FNV-1a, fixed here so trigram slots are stable across runs and builds.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
