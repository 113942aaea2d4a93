use std::sync::Arc;

use tracing::info;

use super::{
    config::{HybridConfig, SparseConfig},
    hybrid::HybridScorer,
    result::MatchResult,
    sparse::SparseScorer,
    Scorer, ScorerKind,
};
use crate::artifacts::Artifacts;
use crate::catalog::ReferenceCatalog;
use crate::normalize::normalize_code;
use crate::sparse::SparseBundle;

/// Entry point for callers: owns both scorers over one artifact snapshot.
///
/// Immutable after construction; share it behind an `Arc` and call it from
/// any number of requests concurrently.
pub struct Matcher {
    catalog: Arc<ReferenceCatalog>,
    bundle: Arc<SparseBundle>,
    hybrid: HybridScorer,
    sparse: SparseScorer,
    fingerprint: String,
}

impl Matcher {
    pub fn new(artifacts: &Artifacts, hybrid: HybridConfig, sparse: SparseConfig) -> Self {
        Self {
            catalog: artifacts.catalog.clone(),
            bundle: artifacts.bundle.clone(),
            hybrid: HybridScorer::new(
                artifacts.catalog.clone(),
                artifacts.encoder.clone(),
                hybrid,
            ),
            sparse: SparseScorer::new(artifacts.bundle.clone(), sparse),
            fingerprint: artifacts.fingerprint().to_string(),
        }
    }

    /// Encodes the occupation vectors before the first request.
    pub fn warm_up(&self) {
        let occupations = self.hybrid.warm_up();
        info!(occupations, fingerprint = %self.fingerprint, "matcher ready");
    }

    pub fn scorer(&self, kind: ScorerKind) -> &dyn Scorer {
        match kind {
            ScorerKind::Hybrid => &self.hybrid,
            ScorerKind::Sparse => &self.sparse,
        }
    }

    /// Direct access for callers with per-skill weights.
    pub fn hybrid(&self) -> &HybridScorer {
        &self.hybrid
    }

    /// Ranks occupations for `codes` with the chosen scorer. `top_k` defaults
    /// to the scorer's configured value.
    pub fn match_skills(&self, kind: ScorerKind, codes: &[String], top_k: Option<usize>) -> MatchResult {
        let scorer = self.scorer(kind);
        let top_k = top_k.unwrap_or_else(|| scorer.default_top_k());
        let result = scorer.score(codes, top_k);

        info!(
            scorer = kind.as_ref(),
            status = result.status.as_ref(),
            input = codes.len(),
            recognized = result.recognized_skills.len(),
            ranked = result.ranked.len(),
            top_score = ?result.top_score(),
            "match computed"
        );

        result
    }

    /// Label of an input skill: catalog first, then bundle, then the code.
    pub fn skill_label(&self, raw: &str) -> String {
        let code = normalize_code(raw);
        let vocab_label = self.catalog.vocabulary().skill_label(&code);
        if vocab_label != code {
            return vocab_label.to_string();
        }
        self.bundle.skill_label(&code).to_string()
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    /// Short hash identifying the artifact snapshot behind every result.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogRow;
    use crate::encoder::EncoderConfig;
    use crate::matching::MatchStatus;

    fn matcher() -> Matcher {
        let rows = vec![
            CatalogRow::new("S1", Some("Souder"), "J1", Some("Soudeur")),
            CatalogRow::new("S2", None, "J1", Some("Soudeur")),
            CatalogRow::new("S2", None, "J2", None),
            CatalogRow::new("S3", None, "J2", None),
        ];
        let catalog = ReferenceCatalog::from_rows(&rows).unwrap();
        let artifacts = Artifacts::from_catalog(catalog, "hash", EncoderConfig::default(), None)
            .unwrap();
        Matcher::new(&artifacts, HybridConfig::default(), SparseConfig::default())
    }

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dispatches_to_the_requested_scorer() {
        let matcher = matcher();
        let input = codes(&["S1", "S2"]);

        let hybrid = matcher.match_skills(ScorerKind::Hybrid, &input, None);
        let sparse = matcher.match_skills(ScorerKind::Sparse, &input, None);

        assert_eq!(hybrid.status, MatchStatus::Ok);
        assert_eq!(hybrid.ranked[0].code, "J1");
        assert_eq!(sparse.status, MatchStatus::NeedsMoreSkills);
    }

    #[test]
    fn empty_input_statuses_per_scorer() {
        let matcher = matcher();

        assert_eq!(
            matcher.match_skills(ScorerKind::Hybrid, &[], None).status,
            MatchStatus::Undefined
        );
        assert_eq!(
            matcher.match_skills(ScorerKind::Sparse, &[], None).status,
            MatchStatus::NeedsMoreSkills
        );
    }

    #[test]
    fn weighted_scoring_is_reachable() {
        let matcher = matcher();
        let skills = [
            crate::matching::WeightedSkill::new("S1", 2.0),
            crate::matching::WeightedSkill::new("S2", 0.5),
        ];

        let result = matcher.hybrid().score_weighted(&skills, 3);

        assert_eq!(result.status, MatchStatus::Ok);
        assert_eq!(result.recognized_skills, codes(&["S1", "S2"]));
    }

    #[test]
    fn skill_labels_fall_back_to_code() {
        let matcher = matcher();

        assert_eq!(matcher.skill_label(" S1 "), "Souder");
        assert_eq!(matcher.skill_label("S2"), "S2");
        assert_eq!(matcher.skill_label("unknown"), "unknown");
    }

    #[test]
    fn fingerprint_is_stable_for_same_catalog() {
        assert_eq!(matcher().fingerprint(), matcher().fingerprint());
        assert_eq!(matcher().fingerprint().len(), 16);
    }
}
