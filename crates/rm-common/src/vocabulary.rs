use std::collections::HashMap;

use crate::normalize::normalize_codes;

/// A skill code found in the vocabulary together with its row index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSkill {
    pub code: String,
    pub index: usize,
}

/// Outcome of resolving user input against the vocabulary.
///
/// `recognized` follows the order of first appearance and holds each code once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillResolution {
    pub recognized: Vec<ResolvedSkill>,
    pub unrecognized: Vec<String>,
}

impl SkillResolution {
    pub fn recognized_codes(&self) -> Vec<String> {
        self.recognized.iter().map(|s| s.code.clone()).collect()
    }

    pub fn recognized_indices(&self) -> Vec<usize> {
        self.recognized.iter().map(|s| s.index).collect()
    }
}

/// Dense code ↔ index table with labels, for one kind of code.
#[derive(Debug, Clone, Default)]
struct CodeTable {
    codes: Vec<String>,
    index: HashMap<String, usize>,
    labels: HashMap<String, String>,
}

impl CodeTable {
    fn insert(&mut self, code: String, label: Option<String>) -> usize {
        if let Some(&idx) = self.index.get(&code) {
            // first non-empty label wins
            if let Some(label) = label.filter(|l| !l.trim().is_empty()) {
                self.labels.entry(code).or_insert(label);
            }
            return idx;
        }

        let idx = self.codes.len();
        if let Some(label) = label.filter(|l| !l.trim().is_empty()) {
            self.labels.insert(code.clone(), label);
        }
        self.index.insert(code.clone(), idx);
        self.codes.push(code);
        idx
    }

    fn label<'a>(&'a self, code: &'a str) -> &'a str {
        self.labels.get(code).map(String::as_str).unwrap_or(code)
    }
}

/// Bidirectional mapping between codes and dense indices for skills and
/// occupations. Indices are assigned in order of first insertion and cover
/// `[0, len)` without gaps.
#[derive(Debug, Clone, Default)]
pub struct VocabularyIndex {
    skills: CodeTable,
    occupations: CodeTable,
}

impl VocabularyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a skill (already canonical) and returns its index.
    pub fn insert_skill(&mut self, code: impl Into<String>, label: Option<String>) -> usize {
        self.skills.insert(code.into(), label)
    }

    /// Registers an occupation (already canonical) and returns its index.
    pub fn insert_occupation(&mut self, code: impl Into<String>, label: Option<String>) -> usize {
        self.occupations.insert(code.into(), label)
    }

    pub fn skill_count(&self) -> usize {
        self.skills.codes.len()
    }

    pub fn occupation_count(&self) -> usize {
        self.occupations.codes.len()
    }

    pub fn skill_index(&self, code: &str) -> Option<usize> {
        self.skills.index.get(code).copied()
    }

    pub fn occupation_index(&self, code: &str) -> Option<usize> {
        self.occupations.index.get(code).copied()
    }

    pub fn skill_code(&self, index: usize) -> Option<&str> {
        self.skills.codes.get(index).map(String::as_str)
    }

    pub fn occupation_code(&self, index: usize) -> Option<&str> {
        self.occupations.codes.get(index).map(String::as_str)
    }

    /// Skill codes in index order.
    pub fn skill_codes(&self) -> &[String] {
        &self.skills.codes
    }

    /// Occupation codes in index order.
    pub fn occupation_codes(&self) -> &[String] {
        &self.occupations.codes
    }

    /// Label of a skill, or the code itself when none is stored.
    pub fn skill_label<'a>(&'a self, code: &'a str) -> &'a str {
        self.skills.label(code)
    }

    /// Label of an occupation, or the code itself when none is stored.
    pub fn occupation_label<'a>(&'a self, code: &'a str) -> &'a str {
        self.occupations.label(code)
    }

    /// Canonicalizes the input codes and splits them into recognized and
    /// unrecognized skills. Unknown codes are reported, never rejected.
    pub fn resolve_skills<S: AsRef<str>>(&self, codes: &[S]) -> SkillResolution {
        let mut resolution = SkillResolution::default();

        for code in normalize_codes(codes) {
            match self.skill_index(&code) {
                Some(index) => resolution.recognized.push(ResolvedSkill { code, index }),
                None => resolution.unrecognized.push(code),
            }
        }

        resolution
    }
}
