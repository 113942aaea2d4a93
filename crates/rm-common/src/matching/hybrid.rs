use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use super::{
    config::HybridConfig,
    ranking::{classify, select_top_k},
    result::{MatchResult, MatchStatus, ScoredCandidate},
    Scorer, ScorerKind,
};
use crate::catalog::ReferenceCatalog;
use crate::encoder::{Embedding, ProfileEncoder};
use crate::normalize::normalize_code;

/// An input skill with its weight in the profile.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSkill {
    pub code: String,
    pub weight: f32,
}

impl WeightedSkill {
    pub fn new(code: impl Into<String>, weight: f32) -> Self {
        Self {
            code: code.into(),
            weight,
        }
    }
}

/// Blends embedding similarity with raw skill overlap:
///
/// `combined = dense_weight * (v_p · v_j) + overlap_weight * overlap / max(1, max_overlap)`
///
/// where `max_overlap` is taken over every occupation for the current request.
/// Only occupations sharing at least `min_overlap` skills are ranked.
pub struct HybridScorer {
    catalog: Arc<ReferenceCatalog>,
    encoder: Arc<dyn ProfileEncoder>,
    occupation_vectors: OnceLock<Vec<Embedding>>,
    config: HybridConfig,
}

impl HybridScorer {
    pub fn new(
        catalog: Arc<ReferenceCatalog>,
        encoder: Arc<dyn ProfileEncoder>,
        config: HybridConfig,
    ) -> Self {
        Self {
            catalog,
            encoder,
            occupation_vectors: OnceLock::new(),
            config,
        }
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    /// Computes the occupation vectors now instead of on the first request.
    pub fn warm_up(&self) -> usize {
        self.occupation_vectors().len()
    }

    /// Occupation vectors depend only on the vocabulary, so they are encoded
    /// once per process.
    fn occupation_vectors(&self) -> &[Embedding] {
        self.occupation_vectors.get_or_init(|| {
            let count = self.catalog.vocabulary().occupation_count();
            info!(
                occupations = count,
                encoder = self.encoder.name(),
                "encoding occupation vectors"
            );
            self.encoder.encode_jobs(count)
        })
    }

    /// Scores weighted skills. A code given several times keeps the weight of
    /// its first occurrence and counts once.
    pub fn score_weighted(&self, skills: &[WeightedSkill], top_k: usize) -> MatchResult {
        let vocab = self.catalog.vocabulary();
        let codes: Vec<&str> = skills.iter().map(|s| s.code.as_str()).collect();
        let resolution = vocab.resolve_skills(&codes);
        let recognized_codes = resolution.recognized_codes();
        let unrecognized = resolution.unrecognized.clone();

        if resolution.recognized.is_empty() {
            return MatchResult::unranked(MatchStatus::Undefined)
                .with_skills(recognized_codes, unrecognized);
        }

        let mut weight_of: HashMap<String, f32> = HashMap::with_capacity(skills.len());
        for skill in skills {
            weight_of
                .entry(normalize_code(&skill.code))
                .or_insert(skill.weight);
        }
        let indices = resolution.recognized_indices();
        let weights: Vec<f32> = resolution
            .recognized
            .iter()
            .map(|s| weight_of.get(&s.code).copied().unwrap_or(1.0))
            .collect();

        let profile = self.encoder.encode_profile(&indices, &weights);
        let occupation_vectors = self.occupation_vectors();

        let input: HashSet<&str> = resolution
            .recognized
            .iter()
            .map(|s| s.code.as_str())
            .collect();
        let occupations = vocab.occupation_codes();
        let job_skills = self.catalog.job_skills();
        let overlaps: Vec<usize> = occupations
            .iter()
            .map(|occupation| job_skills.overlap(occupation, &input))
            .collect();
        let normalizer = overlaps.iter().copied().max().unwrap_or(0).max(1) as f32;

        let candidates: Vec<(usize, f32)> = overlaps
            .iter()
            .enumerate()
            .filter(|(_, overlap)| **overlap >= self.config.min_overlap)
            .map(|(idx, overlap)| {
                let dense = occupation_vectors
                    .get(idx)
                    .map(|job| self.encoder.similarity(&profile, job))
                    .unwrap_or(0.0);
                let combined = self.config.dense_weight * dense
                    + self.config.overlap_weight * (*overlap as f32 / normalizer);
                (idx, combined)
            })
            .collect();

        debug!(
            recognized = indices.len(),
            max_overlap = normalizer,
            candidates = candidates.len(),
            "hybrid candidates filtered"
        );

        if candidates.is_empty() {
            return MatchResult::unranked(MatchStatus::Empty)
                .with_skills(recognized_codes, unrecognized);
        }

        let ranked: Vec<ScoredCandidate> = select_top_k(candidates, occupations, top_k.max(1))
            .into_iter()
            .map(|(idx, score)| {
                let code = occupations[idx].as_str();
                ScoredCandidate {
                    code: code.to_string(),
                    label: vocab.occupation_label(code).to_string(),
                    score,
                }
            })
            .collect();

        let top_score = ranked.first().map(|c| c.score).unwrap_or(f32::NEG_INFINITY);
        let status = classify(
            top_score,
            self.config.threshold,
            MatchStatus::Ok,
            MatchStatus::Uncertain,
        );

        MatchResult::ranked(status, self.config.threshold, ranked)
            .with_skills(recognized_codes, unrecognized)
    }
}

impl Scorer for HybridScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Hybrid
    }

    fn default_top_k(&self) -> usize {
        self.config.default_top_k
    }

    fn score(&self, codes: &[String], top_k: usize) -> MatchResult {
        let skills: Vec<WeightedSkill> = codes
            .iter()
            .map(|code| WeightedSkill::new(code.clone(), 1.0))
            .collect();
        self.score_weighted(&skills, top_k)
    }
}
