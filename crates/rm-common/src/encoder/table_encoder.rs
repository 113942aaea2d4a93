use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::{l2_normalize, Embedding, EmbeddingSource, ProfileEncoder};
use crate::error::{read_json, ArtifactError};
use crate::vocabulary::VocabularyIndex;

#[derive(Debug, Deserialize)]
struct TableWeights {
    #[serde(default)]
    version: Option<String>,
    skill_emb: Vec<Vec<f32>>,
    job_emb: Vec<Vec<f32>>,
}

/// Encoder backed by embedding tables exported from a trained model.
///
/// Row `i` of `skill_emb` is the vector of skill index `i`, row `j` of
/// `job_emb` the vector of occupation index `j`. A profile is the weighted
/// mean of its skill rows, L2-normalized.
#[derive(Debug, Clone)]
pub struct TableEncoder {
    version: String,
    dimension: usize,
    skill_emb: Vec<Vec<f32>>,
    job_emb: Vec<Vec<f32>>,
    weights_digest: String,
}

impl TableEncoder {
    pub fn new(
        skill_emb: Vec<Vec<f32>>,
        job_emb: Vec<Vec<f32>>,
        version: impl Into<String>,
    ) -> Result<Self, ArtifactError> {
        let dimension = skill_emb
            .first()
            .map(Vec::len)
            .filter(|d| *d > 0)
            .ok_or_else(|| ArtifactError::Empty("encoder has no skill embeddings".into()))?;

        if job_emb.is_empty() {
            return Err(ArtifactError::Empty("encoder has no occupation embeddings".into()));
        }

        for (name, table) in [("skill_emb", &skill_emb), ("job_emb", &job_emb)] {
            if let Some((row, vec)) = table.iter().enumerate().find(|(_, v)| v.len() != dimension) {
                return Err(ArtifactError::Shape(format!(
                    "{name} row {row} has {} components, expected {dimension}",
                    vec.len()
                )));
            }
        }

        let weights_digest = digest_tables(&skill_emb, &job_emb);

        Ok(Self {
            version: version.into(),
            dimension,
            skill_emb,
            job_emb,
            weights_digest,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let weights: TableWeights = read_json(path)?;
        let encoder = Self::new(
            weights.skill_emb,
            weights.job_emb,
            weights.version.unwrap_or_else(|| "unversioned".into()),
        )?;

        info!(
            path = %path.display(),
            skills = encoder.skill_emb.len(),
            occupations = encoder.job_emb.len(),
            dimension = encoder.dimension,
            "encoder tables loaded"
        );

        Ok(encoder)
    }

    /// Fails when the tables do not cover the vocabulary exactly.
    pub fn check_vocabulary(&self, vocabulary: &VocabularyIndex) -> Result<(), ArtifactError> {
        if self.skill_emb.len() != vocabulary.skill_count() {
            return Err(ArtifactError::Shape(format!(
                "encoder has {} skill rows, vocabulary has {} skills",
                self.skill_emb.len(),
                vocabulary.skill_count()
            )));
        }
        if self.job_emb.len() != vocabulary.occupation_count() {
            return Err(ArtifactError::Shape(format!(
                "encoder has {} occupation rows, vocabulary has {} occupations",
                self.job_emb.len(),
                vocabulary.occupation_count()
            )));
        }
        Ok(())
    }
}

fn digest_tables(skill_emb: &[Vec<f32>], job_emb: &[Vec<f32>]) -> String {
    let mut hasher = Sha256::new();
    for table in [skill_emb, job_emb] {
        hasher.update((table.len() as u64).to_le_bytes());
        for value in table.iter().flatten() {
            hasher.update(value.to_bits().to_le_bytes());
        }
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

impl ProfileEncoder for TableEncoder {
    fn name(&self) -> &'static str {
        "table"
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn weights_digest(&self) -> Option<&str> {
        Some(&self.weights_digest)
    }

    fn encode_profile(&self, skills: &[usize], weights: &[f32]) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];
        let mut total_weight = 0.0f32;

        for (pos, &skill) in skills.iter().enumerate() {
            let Some(row) = self.skill_emb.get(skill) else {
                warn!(skill, "skill index outside encoder table; ignored");
                continue;
            };
            let weight = weights.get(pos).copied().unwrap_or(1.0);
            for (acc, value) in vector.iter_mut().zip(row) {
                *acc += weight * value;
            }
            total_weight += weight;
        }

        if total_weight > 0.0 {
            for v in vector.iter_mut() {
                *v /= total_weight;
            }
        }
        l2_normalize(&mut vector);

        Embedding::new(vector, self.dimension, EmbeddingSource::Profile)
    }

    fn encode_job(&self, job: usize) -> Embedding {
        let mut vector = self
            .job_emb
            .get(job)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dimension]);
        l2_normalize(&mut vector);

        Embedding::new(vector, self.dimension, EmbeddingSource::Occupation)
    }
}
