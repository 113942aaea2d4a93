use serde::{Deserialize, Serialize};

use crate::matching::ScorerKind;

/// Largest `top_k` a caller may ask for.
pub const MAX_TOP_K: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictRequest {
    pub skills: Vec<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub scorer: Option<ScorerKind>,
}

impl PredictRequest {
    pub fn scorer(&self) -> ScorerKind {
        self.scorer.unwrap_or_default()
    }

    /// Requested `top_k` clamped to `1..=MAX_TOP_K`.
    pub fn top_k(&self) -> Option<usize> {
        self.top_k.map(|k| k.clamp(1, MAX_TOP_K))
    }
}
