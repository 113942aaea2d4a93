use serde::{Deserialize, Serialize};

use crate::matching::{MatchResult, ScorerKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabeledCode {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    pub scorer: ScorerKind,
    /// Input skills in request order, each with its label.
    pub input_skills: Vec<LabeledCode>,
    pub recognized_skills: Vec<LabeledCode>,
    pub result: MatchResult,
    /// Fingerprint of the artifact snapshot that produced `result`.
    pub snapshot: String,
}
