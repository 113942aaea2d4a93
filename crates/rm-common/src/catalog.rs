use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{read_json, ArtifactError};
use crate::normalize::normalize_code;
use crate::vocabulary::VocabularyIndex;

/// A code as it appears in the reference export: either text or a number
/// that went through a float column (`123.0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCode {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawCode {
    pub fn canonical(&self) -> String {
        match self {
            RawCode::Int(value) => value.to_string(),
            RawCode::Float(value) => normalize_code(&value.to_string()),
            RawCode::Text(value) => normalize_code(value),
        }
    }
}

impl From<&str> for RawCode {
    fn from(value: &str) -> Self {
        RawCode::Text(value.to_string())
    }
}

/// One row of the skill × occupation reference table (one skill attached to
/// one occupation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub code_ogr_competence: RawCode,
    #[serde(default)]
    pub libelle_competence: Option<String>,
    pub code_rome: RawCode,
    #[serde(default)]
    pub libelle_rome: Option<String>,
}

impl CatalogRow {
    pub fn new(
        skill: &str,
        skill_label: Option<&str>,
        occupation: &str,
        occupation_label: Option<&str>,
    ) -> Self {
        Self {
            code_ogr_competence: skill.into(),
            libelle_competence: skill_label.map(str::to_string),
            code_rome: occupation.into(),
            libelle_rome: occupation_label.map(str::to_string),
        }
    }
}

/// Dense form of the adjacency: the skills historically attached to each
/// occupation.
#[derive(Debug, Clone, Default)]
pub struct JobSkills {
    by_occupation: HashMap<String, BTreeSet<String>>,
    empty: BTreeSet<String>,
}

impl JobSkills {
    pub fn insert(&mut self, occupation: String, skill: String) {
        self.by_occupation
            .entry(occupation)
            .or_default()
            .insert(skill);
    }

    /// Skills of an occupation; unknown occupations have none.
    pub fn skills_of(&self, occupation: &str) -> &BTreeSet<String> {
        self.by_occupation.get(occupation).unwrap_or(&self.empty)
    }

    /// Number of distinct input skills the occupation shares with `input`.
    pub fn overlap(&self, occupation: &str, input: &HashSet<&str>) -> usize {
        let skills = self.skills_of(occupation);
        if skills.len() < input.len() {
            skills.iter().filter(|s| input.contains(s.as_str())).count()
        } else {
            input.iter().filter(|s| skills.contains(**s)).count()
        }
    }

    pub fn occupation_count(&self) -> usize {
        self.by_occupation.len()
    }
}

/// Vocabulary and dense adjacency built from the reference rows.
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    vocabulary: VocabularyIndex,
    job_skills: JobSkills,
    row_count: usize,
}

impl ReferenceCatalog {
    /// Builds the catalog. Codes are canonicalized before indexing; rows with
    /// an empty skill or occupation code are skipped.
    pub fn from_rows(rows: &[CatalogRow]) -> Result<Self, ArtifactError> {
        let mut vocabulary = VocabularyIndex::new();
        let mut job_skills = JobSkills::default();
        let mut row_count = 0usize;

        for row in rows {
            let skill = row.code_ogr_competence.canonical();
            let occupation = row.code_rome.canonical();
            if skill.is_empty() || occupation.is_empty() {
                continue;
            }

            vocabulary.insert_skill(skill.clone(), row.libelle_competence.clone());
            vocabulary.insert_occupation(occupation.clone(), row.libelle_rome.clone());
            job_skills.insert(occupation, skill);
            row_count += 1;
        }

        if row_count == 0 {
            return Err(ArtifactError::Empty("reference catalog has no usable rows".into()));
        }

        Ok(Self {
            vocabulary,
            job_skills,
            row_count,
        })
    }

    pub fn vocabulary(&self) -> &VocabularyIndex {
        &self.vocabulary
    }

    pub fn job_skills(&self) -> &JobSkills {
        &self.job_skills
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// `(code, label)` for every occupation, sorted by code.
    pub fn occupations(&self) -> Vec<(String, String)> {
        let mut out: Vec<_> = self
            .vocabulary
            .occupation_codes()
            .iter()
            .map(|code| (code.clone(), self.vocabulary.occupation_label(code).to_string()))
            .collect();
        out.sort();
        out
    }
}

/// Loads the reference table from a JSON array of [`CatalogRow`].
pub fn load_catalog(path: &Path) -> Result<ReferenceCatalog, ArtifactError> {
    let rows: Vec<CatalogRow> = read_json(path)?;
    let catalog = ReferenceCatalog::from_rows(&rows)?;

    info!(
        path = %path.display(),
        rows = catalog.row_count(),
        skills = catalog.vocabulary().skill_count(),
        occupations = catalog.vocabulary().occupation_count(),
        "reference catalog loaded"
    );

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn rows() -> Vec<CatalogRow> {
        vec![
            CatalogRow::new("S1", Some("Souder"), "J1", Some("Soudeur")),
            CatalogRow::new("S2", Some("Lire un plan"), "J1", Some("Soudeur")),
            CatalogRow::new("S2", None, "J2", Some("Chaudronnier")),
            CatalogRow::new("S3", Some("Plier une tôle"), "J2", None),
        ]
    }

    #[test]
    fn builds_vocabulary_in_first_appearance_order() {
        let catalog = ReferenceCatalog::from_rows(&rows()).unwrap();
        let vocab = catalog.vocabulary();

        assert_eq!(vocab.skill_codes(), &["S1", "S2", "S3"]);
        assert_eq!(vocab.occupation_codes(), &["J1", "J2"]);
        assert_eq!(vocab.skill_label("S2"), "Lire un plan");
        assert_eq!(vocab.occupation_label("J2"), "Chaudronnier");
        assert_eq!(catalog.row_count(), 4);
    }

    #[test]
    fn builds_dense_adjacency() {
        let catalog = ReferenceCatalog::from_rows(&rows()).unwrap();
        let adjacency = catalog.job_skills();

        let j1: Vec<_> = adjacency.skills_of("J1").iter().cloned().collect();
        assert_eq!(j1, vec!["S1", "S2"]);
        assert!(adjacency.skills_of("J9").is_empty());

        let input: HashSet<&str> = ["S2", "S3", "S7"].into_iter().collect();
        assert_eq!(adjacency.overlap("J1", &input), 1);
        assert_eq!(adjacency.overlap("J2", &input), 2);
    }

    #[test]
    fn canonicalizes_noisy_codes() {
        let noisy = vec![
            CatalogRow {
                code_ogr_competence: RawCode::Float(101.0),
                libelle_competence: None,
                code_rome: RawCode::Text(" M1805 ".into()),
                libelle_rome: None,
            },
            CatalogRow {
                code_ogr_competence: RawCode::Text("101.0".into()),
                libelle_competence: Some("Coder".into()),
                code_rome: RawCode::Text("M1805".into()),
                libelle_rome: None,
            },
            CatalogRow {
                code_ogr_competence: RawCode::Int(102),
                libelle_competence: None,
                code_rome: RawCode::Text("M1805".into()),
                libelle_rome: None,
            },
        ];

        let catalog = ReferenceCatalog::from_rows(&noisy).unwrap();

        assert_eq!(catalog.vocabulary().skill_codes(), &["101", "102"]);
        assert_eq!(catalog.vocabulary().skill_label("101"), "Coder");
        assert_eq!(catalog.job_skills().skills_of("M1805").len(), 2);
    }

    #[test]
    fn rejects_catalog_without_usable_rows() {
        let rows = vec![CatalogRow::new(" ", None, "J1", None)];
        let err = ReferenceCatalog::from_rows(&rows).unwrap_err();
        assert!(matches!(err, ArtifactError::Empty(_)));
    }

    #[test]
    fn loads_catalog_from_json_with_numeric_codes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"code_ogr_competence": 12.0, "libelle_competence": "Accueillir", "code_rome": "G1101", "libelle_rome": "Accueil touristique"}},
                {{"code_ogr_competence": "13", "code_rome": "G1101"}}
            ]"#
        )
        .unwrap();

        let catalog = load_catalog(file.path()).unwrap();

        assert_eq!(catalog.vocabulary().skill_codes(), &["12", "13"]);
        assert_eq!(
            catalog.occupations(),
            vec![("G1101".to_string(), "Accueil touristique".to_string())]
        );
    }

    #[test]
    fn missing_catalog_file_is_an_io_error() {
        let err = load_catalog(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }
}
