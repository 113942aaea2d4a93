pub mod config;
pub mod embedding;
pub mod hash_encoder;
pub mod similarity;
pub mod table_encoder;

use std::path::Path;
use std::sync::Arc;

pub use config::EncoderConfig;
pub use embedding::{Embedding, EmbeddingSource};
pub use hash_encoder::HashEncoder;
pub use similarity::{dot, l2_normalize};
pub use table_encoder::TableEncoder;
use tracing::{info, warn};

use crate::catalog::ReferenceCatalog;
use crate::error::ArtifactError;

/// Opaque, already-fitted encoder turning skill indices into a profile vector
/// and occupation indices into occupation vectors.
///
/// Implementations:
/// - HashEncoder: feature hashing over the occupation's skills (deterministic, no training)
/// - TableEncoder: embedding tables exported from a trained model
///
/// Both return unit-norm vectors of `dimension()` components.
pub trait ProfileEncoder: Send + Sync {
    /// Implementation name ("hash", "table").
    fn name(&self) -> &'static str;

    /// Version of the fitted artifact.
    fn version(&self) -> &str;

    fn dimension(&self) -> usize;

    /// Digest of fitted weights, for encoders loaded from an artifact.
    fn weights_digest(&self) -> Option<&str> {
        None
    }

    /// Encodes a set of skill indices, each with its weight (missing weights
    /// count as 1.0).
    fn encode_profile(&self, skills: &[usize], weights: &[f32]) -> Embedding;

    fn encode_job(&self, job: usize) -> Embedding;

    /// Encodes occupations `0..count`. Default implementation loops.
    fn encode_jobs(&self, count: usize) -> Vec<Embedding> {
        (0..count).map(|job| self.encode_job(job)).collect()
    }

    /// Cosine similarity of two unit-norm embeddings, in [-1, 1].
    fn similarity(&self, a: &Embedding, b: &Embedding) -> f32 {
        if a.dimension != b.dimension {
            warn!(
                source_a = ?a.source,
                source_b = ?b.source,
                a_dimension = a.dimension,
                b_dimension = b.dimension,
                "embedding dimension mismatch; returning zero similarity"
            );
            return 0.0;
        }
        dot(&a.vector, &b.vector)
    }
}

/// Builds the encoder named `name`.
///
/// `"table"` needs `weights_path` and fails when the artifact is missing or
/// does not match the catalog. Unknown names fall back to `"hash"`.
pub fn create_encoder(
    name: &str,
    config: EncoderConfig,
    catalog: &ReferenceCatalog,
    weights_path: Option<&Path>,
) -> Result<Arc<dyn ProfileEncoder>, ArtifactError> {
    let encoder: Arc<dyn ProfileEncoder> = match name {
        "table" => {
            let path = weights_path.ok_or_else(|| {
                ArtifactError::Empty("encoder weights path is required for the table encoder".into())
            })?;
            let encoder = TableEncoder::load(path)?;
            encoder.check_vocabulary(catalog.vocabulary())?;
            Arc::new(encoder)
        }
        "hash" => Arc::new(HashEncoder::from_catalog(config, catalog)),
        other => {
            warn!(encoder = other, "unknown encoder; falling back to hash");
            Arc::new(HashEncoder::from_catalog(config, catalog))
        }
    };

    info!(
        encoder = encoder.name(),
        version = encoder.version(),
        dimension = encoder.dimension(),
        "profile encoder ready"
    );

    Ok(encoder)
}
