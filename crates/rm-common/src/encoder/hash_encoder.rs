use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};

use super::{l2_normalize, Embedding, EmbeddingSource, EncoderConfig, ProfileEncoder};
use crate::catalog::ReferenceCatalog;

/// Fixed seed so that vectors are reproducible across processes.
/// Changing it changes every embedding: bump `version()` with it.
const HASH_SEED_K0: u64 = 0x0123_4567_89ab_cdef;
const HASH_SEED_K1: u64 = 0xfedc_ba98_7654_3210;

/// Feature-hashing encoder.
///
/// A profile is the signed hash projection of its skills; an occupation is the
/// projection of the skills attached to it in the reference catalog, so the
/// dot product tracks weighted skill overlap. Needs no trained weights.
pub struct HashEncoder {
    config: EncoderConfig,
    occupation_skills: Vec<Vec<usize>>,
}

impl HashEncoder {
    pub fn new(config: EncoderConfig, occupation_skills: Vec<Vec<usize>>) -> Self {
        let mut cfg = config;
        cfg.dimension = cfg.dimension.max(1);
        Self {
            config: cfg,
            occupation_skills,
        }
    }

    pub fn from_catalog(config: EncoderConfig, catalog: &ReferenceCatalog) -> Self {
        let vocab = catalog.vocabulary();
        let occupation_skills = vocab
            .occupation_codes()
            .iter()
            .map(|occupation| {
                catalog
                    .job_skills()
                    .skills_of(occupation)
                    .iter()
                    .filter_map(|skill| vocab.skill_index(skill))
                    .collect()
            })
            .collect();

        Self::new(config, occupation_skills)
    }

    fn hash_token(&self, token: &str) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        token.hash(&mut hasher);
        hasher.finish()
    }

    fn accumulate(&self, vector: &mut [f32], token: &str, weight: f32) {
        let idx = (self.hash_token(token) % self.config.dimension as u64) as usize;
        // sign hashing: even → +weight, odd → -weight
        let sign = if self.hash_token(&format!("{token}_sign")) % 2 == 0 {
            1.0
        } else {
            -1.0
        };
        vector[idx] += sign * weight;
    }

    fn finish(&self, mut vector: Vec<f32>, source: EmbeddingSource) -> Embedding {
        l2_normalize(&mut vector);
        Embedding::new(vector, self.config.dimension, source)
    }
}

impl ProfileEncoder for HashEncoder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn version(&self) -> &str {
        "hash-v1"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn encode_profile(&self, skills: &[usize], weights: &[f32]) -> Embedding {
        let mut vector = vec![0.0f32; self.config.dimension];
        for (pos, skill) in skills.iter().enumerate() {
            let weight = weights.get(pos).copied().unwrap_or(1.0);
            self.accumulate(&mut vector, &format!("skill:{skill}"), weight);
        }
        self.finish(vector, EmbeddingSource::Profile)
    }

    fn encode_job(&self, job: usize) -> Embedding {
        let mut vector = vec![0.0f32; self.config.dimension];
        match self.occupation_skills.get(job).filter(|skills| !skills.is_empty()) {
            Some(skills) => {
                for skill in skills {
                    self.accumulate(&mut vector, &format!("skill:{skill}"), 1.0);
                }
            }
            None => self.accumulate(&mut vector, &format!("occupation:{job}"), 1.0),
        }
        self.finish(vector, EmbeddingSource::Occupation)
    }
}
