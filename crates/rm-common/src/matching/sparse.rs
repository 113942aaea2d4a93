use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use super::{
    config::SparseConfig,
    ranking::{classify, select_top_k},
    result::{MatchResult, MatchStatus, ScoredCandidate},
    Scorer, ScorerKind,
};
use crate::normalize::normalize_codes;
use crate::sparse::SparseBundle;

/// Cosine between the multi-hot input row and every occupation row of the
/// co-occurrence matrix.
pub struct SparseScorer {
    bundle: Arc<SparseBundle>,
    config: SparseConfig,
}

impl SparseScorer {
    pub fn new(bundle: Arc<SparseBundle>, config: SparseConfig) -> Self {
        Self { bundle, config }
    }

    pub fn config(&self) -> &SparseConfig {
        &self.config
    }
}

impl Scorer for SparseScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Sparse
    }

    fn default_top_k(&self) -> usize {
        self.config.default_top_k
    }

    fn score(&self, codes: &[String], top_k: usize) -> MatchResult {
        let codes = normalize_codes(codes);

        let mut columns = BTreeSet::new();
        let mut recognized = Vec::new();
        let mut unrecognized = Vec::new();
        for code in &codes {
            match self.bundle.column_of(code) {
                Some(col) => {
                    columns.insert(col);
                    recognized.push(code.clone());
                }
                None => unrecognized.push(code.clone()),
            }
        }

        if codes.len() < self.config.min_skills {
            let mut result = MatchResult::unranked(MatchStatus::NeedsMoreSkills)
                .with_reason(format!(
                    "at least {} distinct skills are required, got {}",
                    self.config.min_skills,
                    codes.len()
                ))
                .with_skills(recognized, unrecognized);
            result.min_required = Some(self.config.min_skills);
            return result;
        }

        if columns.is_empty() {
            return MatchResult::unranked(MatchStatus::NoKnownSkills)
                .with_skills(recognized, unrecognized);
        }

        // multi-hot row with unit L2 norm
        let weight = 1.0 / (columns.len() as f32).sqrt();
        let columns: Vec<usize> = columns.into_iter().collect();
        let scores = self.bundle.matrix().dot_multi_hot(&columns, weight);

        debug!(
            input = codes.len(),
            mapped_columns = columns.len(),
            occupations = scores.len(),
            "sparse scores computed"
        );

        let occupations = self.bundle.occupation_codes();
        let ranked: Vec<ScoredCandidate> =
            select_top_k(scores.into_iter().enumerate().collect(), occupations, top_k.max(1))
                .into_iter()
                .map(|(idx, score)| {
                    let code = occupations[idx].as_str();
                    ScoredCandidate {
                        code: code.to_string(),
                        label: self.bundle.occupation_label(code).to_string(),
                        score,
                    }
                })
                .collect();

        let top_score = ranked.first().map(|c| c.score).unwrap_or(f32::NEG_INFINITY);
        let status = classify(
            top_score,
            self.config.threshold,
            MatchStatus::Ok,
            MatchStatus::Indecis,
        );

        MatchResult::ranked(status, self.config.threshold, ranked)
            .with_skills(recognized, unrecognized)
    }
}
