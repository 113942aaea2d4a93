pub mod config;
pub mod hybrid;
pub mod matcher;
pub mod ranking;
pub mod result;
pub mod sparse;

use serde::{Deserialize, Serialize};
use strum::AsRefStr;

pub use config::{HybridConfig, SparseConfig};
pub use hybrid::{HybridScorer, WeightedSkill};
pub use matcher::Matcher;
pub use result::{MatchResult, MatchStatus, ScoredCandidate};
pub use sparse::SparseScorer;

/// Which scoring strategy answers a request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScorerKind {
    /// Embedding similarity blended with skill overlap.
    #[default]
    Hybrid,
    /// Cosine against the occupation × skill co-occurrence matrix.
    Sparse,
}

/// A scoring strategy. Every implementation ends in the shared
/// [`MatchStatus`] taxonomy and never fails for well-typed input.
pub trait Scorer: Send + Sync {
    fn kind(&self) -> ScorerKind;

    fn default_top_k(&self) -> usize;

    /// Ranks occupations for `codes`, keeping at most `top_k` (at least one).
    fn score(&self, codes: &[String], top_k: usize) -> MatchResult;
}
