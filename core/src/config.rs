use crate::Position;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Probability that the random surfer gets bored and jumps to a random page.
pub const BORED: f64 = 0.15;
/// Power iteration stops once successive distributions differ by less than this.
pub const EPSILON: f64 = 0.0001;
pub const MAX_ITERATIONS: usize = 1000;
/// Largest node table the link parser will fill.
pub const MAX_NUMBER_OF_DOCS: usize = 2_000_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ranking: RankingConfig,
    pub walk: WalkConfig,
    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Collection size used for idf; falls back to the collection's own count.
    pub num_docs: Option<u32>,
    /// Query terms whose idf is below this are skipped during ranking.
    pub idf_threshold: f64,
    /// Weight of the cosine score in combined ranking; the rest goes to authority.
    pub blend_alpha: f64,
    /// Exact position gap between consecutive phrase terms; 1 means adjacent.
    pub phrase_distance: Position,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { num_docs: None, idf_threshold: 0.0, blend_alpha: 0.1, phrase_distance: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    pub bored: f64,
    pub seed: u64,
    /// Cap on endpoint walk length.
    pub max_steps: usize,
    /// Walks per rayon task; each chunk owns one RNG stream.
    pub chunk_size: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self { bored: BORED, seed: 0x5eed, max_steps: MAX_ITERATIONS, chunk_size: 4096 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub bored: f64,
    pub epsilon: f64,
    pub max_iterations: usize,
    /// The dense solver allocates n*n floats; larger graphs are refused.
    pub max_nodes: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self { bored: BORED, epsilon: EPSILON, max_iterations: MAX_ITERATIONS, max_nodes: 10_000 }
    }
}

/// Reads a JSON config file. Missing sections and fields take their defaults.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    let cfg: Config = serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
