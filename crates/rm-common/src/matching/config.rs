use tracing::warn;

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

/// Parses a finite float; `NaN` and infinities are rejected.
fn parse_finite(raw: &str) -> Option<f32> {
    raw.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

fn env_finite(name: &str) -> Option<f32> {
    let raw = std::env::var(name).ok()?;
    let value = parse_finite(&raw);
    if value.is_none() {
        warn!(var = name, value = %raw, "ignoring non-finite or malformed value");
    }
    value
}

/// Tunables of the hybrid (dense + overlap) scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridConfig {
    /// Weight of the embedding similarity in the combined score.
    pub dense_weight: f32,
    /// Weight of the normalized overlap in the combined score.
    pub overlap_weight: f32,
    /// Minimum number of shared skills for an occupation to be ranked.
    pub min_overlap: usize,
    /// Top score below this is reported as `uncertain`.
    pub threshold: f32,
    pub default_top_k: usize,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            dense_weight: 0.3,
            overlap_weight: 0.7,
            min_overlap: 2,
            threshold: 0.30,
            default_top_k: 5,
        }
    }
}

impl HybridConfig {
    /// Rejects non-finite or negative blend weights and a non-finite threshold.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("dense_weight", self.dense_weight),
            ("overlap_weight", self.overlap_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("hybrid {name} must be finite and non-negative, got {value}"));
            }
        }
        if !self.threshold.is_finite() {
            return Err(format!("hybrid threshold must be finite, got {}", self.threshold));
        }
        Ok(())
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            dense_weight: env_finite("RM_HYBRID_DENSE_WEIGHT").unwrap_or(defaults.dense_weight),
            overlap_weight: env_finite("RM_HYBRID_OVERLAP_WEIGHT")
                .unwrap_or(defaults.overlap_weight),
            min_overlap: env_parse("RM_HYBRID_MIN_OVERLAP").unwrap_or(defaults.min_overlap),
            threshold: env_finite("RM_HYBRID_THRESHOLD").unwrap_or(defaults.threshold),
            default_top_k: env_parse("RM_HYBRID_TOP_K")
                .filter(|k: &usize| *k > 0)
                .unwrap_or(defaults.default_top_k),
        }
    }
}

/// Tunables of the sparse (co-occurrence cosine) scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseConfig {
    /// Minimum number of distinct input skills before ranking is attempted.
    pub min_skills: usize,
    /// Top score below this is reported as `indecis`.
    pub threshold: f32,
    pub default_top_k: usize,
}

impl Default for SparseConfig {
    fn default() -> Self {
        Self {
            min_skills: 3,
            threshold: 0.30,
            default_top_k: 3,
        }
    }
}

impl SparseConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.threshold.is_finite() {
            return Err(format!("sparse threshold must be finite, got {}", self.threshold));
        }
        Ok(())
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_skills: env_parse("RM_SPARSE_MIN_SKILLS").unwrap_or(defaults.min_skills),
            threshold: env_finite("RM_SPARSE_THRESHOLD").unwrap_or(defaults.threshold),
            default_top_k: env_parse("RM_SPARSE_TOP_K")
                .filter(|k: &usize| *k > 0)
                .unwrap_or(defaults.default_top_k),
        }
    }
}
