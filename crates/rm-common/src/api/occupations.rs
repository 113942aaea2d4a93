use serde::{Deserialize, Serialize};

use super::LabeledCode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OccupationSummary {
    pub code: String,
    pub label: String,
    pub skill_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OccupationSkills {
    pub code: String,
    pub label: String,
    pub skills: Vec<LabeledCode>,
}
