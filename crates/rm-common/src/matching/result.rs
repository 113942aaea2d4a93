use serde::{Deserialize, Serialize};
use strum::AsRefStr;

/// Outcome classification shared by every scorer. Callers branch on it to
/// decide between showing results and asking for more input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchStatus {
    /// Ranking present and the best score clears the threshold.
    Ok,
    /// Hybrid scorer: ranking present but below the threshold.
    Uncertain,
    /// Sparse scorer: ranking present but below the threshold.
    Indecis,
    /// Fewer distinct skills than the scorer requires.
    NeedsMoreSkills,
    /// Hybrid scorer: no input skill is in the vocabulary.
    Undefined,
    /// Sparse scorer: no input skill maps to a matrix column.
    NoKnownSkills,
    /// Skills were recognized but no occupation has enough overlap.
    Empty,
}

impl MatchStatus {
    /// Whether the caller should prompt the user for more or other skills.
    pub fn needs_more_input(self) -> bool {
        matches!(
            self,
            MatchStatus::NeedsMoreSkills
                | MatchStatus::Undefined
                | MatchStatus::NoKnownSkills
                | MatchStatus::Empty
        )
    }

    /// Whether the status carries a (possibly low-confidence) ranking.
    pub fn has_ranking(self) -> bool {
        matches!(
            self,
            MatchStatus::Ok | MatchStatus::Uncertain | MatchStatus::Indecis
        )
    }

    pub fn default_reason(self) -> &'static str {
        match self {
            MatchStatus::Ok => "best match clears the confidence threshold",
            MatchStatus::Uncertain | MatchStatus::Indecis => {
                "best score is below the confidence threshold"
            }
            MatchStatus::NeedsMoreSkills => "not enough distinct skills to rank occupations",
            MatchStatus::Undefined | MatchStatus::NoKnownSkills => "no input skill is recognized",
            MatchStatus::Empty => "no occupation matches the selected skills",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredCandidate {
    pub code: String,
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub status: MatchStatus,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_required: Option<usize>,
    pub top1: Option<ScoredCandidate>,
    pub ranked: Vec<ScoredCandidate>,
    pub recognized_skills: Vec<String>,
    pub unrecognized_skills: Vec<String>,
}

impl MatchResult {
    /// Result without ranking (every status outside `ok`/`uncertain`/`indecis`).
    pub fn unranked(status: MatchStatus) -> Self {
        Self {
            status,
            reason: status.default_reason().to_string(),
            threshold: None,
            min_required: None,
            top1: None,
            ranked: Vec::new(),
            recognized_skills: Vec::new(),
            unrecognized_skills: Vec::new(),
        }
    }

    /// Ranked result; `top1` is the first candidate.
    pub fn ranked(status: MatchStatus, threshold: f32, ranked: Vec<ScoredCandidate>) -> Self {
        Self {
            status,
            reason: status.default_reason().to_string(),
            threshold: Some(threshold),
            min_required: None,
            top1: ranked.first().cloned(),
            ranked,
            recognized_skills: Vec::new(),
            unrecognized_skills: Vec::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_skills(mut self, recognized: Vec<String>, unrecognized: Vec<String>) -> Self {
        self.recognized_skills = recognized;
        self.unrecognized_skills = unrecognized;
        self
    }

    pub fn top_score(&self) -> Option<f32> {
        self.top1.as_ref().map(|c| c.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_serialize_as_snake_case() {
        let json = serde_json::to_string(&MatchStatus::NeedsMoreSkills).unwrap();
        assert_eq!(json, "\"needs_more_skills\"");
        assert_eq!(MatchStatus::NoKnownSkills.as_ref(), "no_known_skills");
        assert_eq!(MatchStatus::Indecis.as_ref(), "indecis");
    }

    #[test]
    fn input_and_ranking_flags_partition_statuses() {
        let all = [
            MatchStatus::Ok,
            MatchStatus::Uncertain,
            MatchStatus::Indecis,
            MatchStatus::NeedsMoreSkills,
            MatchStatus::Undefined,
            MatchStatus::NoKnownSkills,
            MatchStatus::Empty,
        ];

        for status in all {
            assert_ne!(status.needs_more_input(), status.has_ranking(), "{status:?}");
        }
    }

    #[test]
    fn ranked_result_exposes_top1() {
        let ranked = vec![
            ScoredCandidate {
                code: "J1".into(),
                label: "Soudeur".into(),
                score: 0.8,
            },
            ScoredCandidate {
                code: "J2".into(),
                label: "J2".into(),
                score: 0.1,
            },
        ];

        let result = MatchResult::ranked(MatchStatus::Ok, 0.3, ranked);

        assert_eq!(result.top1.as_ref().map(|c| c.code.as_str()), Some("J1"));
        assert_eq!(result.top_score(), Some(0.8));
        assert_eq!(result.threshold, Some(0.3));
    }

    #[test]
    fn unranked_result_omits_threshold_in_json() {
        let result = MatchResult::unranked(MatchStatus::Undefined);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "undefined");
        assert!(json.get("threshold").is_none());
        assert_eq!(json["ranked"], serde_json::json!([]));
    }
}
