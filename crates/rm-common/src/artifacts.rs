use std::path::PathBuf;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::catalog::{load_catalog, ReferenceCatalog};
use crate::encoder::{create_encoder, EncoderConfig, ProfileEncoder};
use crate::error::ArtifactError;
use crate::sparse::{load_sparse_bundle, SparseBundle};

/// Where the read-only artifacts live on disk.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub catalog: PathBuf,
    /// Prebuilt occupation × skill matrix. Derived from the catalog when unset.
    pub sparse_bundle: Option<PathBuf>,
    pub encoder_name: String,
    pub encoder_weights: Option<PathBuf>,
    pub encoder: EncoderConfig,
}

/// Every artifact a [`crate::Matcher`] needs, loaded once at startup and
/// shared read-only.
#[derive(Clone)]
pub struct Artifacts {
    pub catalog: Arc<ReferenceCatalog>,
    pub bundle: Arc<SparseBundle>,
    pub encoder: Arc<dyn ProfileEncoder>,
    fingerprint: String,
}

impl Artifacts {
    /// Loads the artifacts. Any missing or malformed file is fatal.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let catalog = load_catalog(&paths.catalog)?;
        let bundle = match &paths.sparse_bundle {
            Some(path) => load_sparse_bundle(path)?,
            None => SparseBundle::from_catalog(&catalog)?,
        };

        Self::from_parts(
            catalog,
            bundle,
            &paths.encoder_name,
            paths.encoder.clone(),
            paths.encoder_weights.as_deref(),
        )
    }

    /// Builds the artifacts from an in-memory catalog, deriving the sparse
    /// bundle from it.
    pub fn from_catalog(
        catalog: ReferenceCatalog,
        encoder_name: &str,
        encoder: EncoderConfig,
        encoder_weights: Option<&std::path::Path>,
    ) -> Result<Self, ArtifactError> {
        let bundle = SparseBundle::from_catalog(&catalog)?;
        Self::from_parts(catalog, bundle, encoder_name, encoder, encoder_weights)
    }

    fn from_parts(
        catalog: ReferenceCatalog,
        bundle: SparseBundle,
        encoder_name: &str,
        encoder: EncoderConfig,
        encoder_weights: Option<&std::path::Path>,
    ) -> Result<Self, ArtifactError> {
        let encoder = create_encoder(encoder_name, encoder, &catalog, encoder_weights)?;
        let fingerprint = fingerprint(&catalog, &bundle, encoder.as_ref());

        info!(
            skills = catalog.vocabulary().skill_count(),
            occupations = catalog.vocabulary().occupation_count(),
            bundle_occupations = bundle.occupation_codes().len(),
            bundle_skills = bundle.skill_count(),
            %fingerprint,
            "artifacts loaded"
        );

        Ok(Self {
            catalog: Arc::new(catalog),
            bundle: Arc::new(bundle),
            encoder,
            fingerprint,
        })
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// First 16 hex digits of a SHA-256 over everything that can change a
/// ranking: vocabularies, dense adjacency, bundle rows and columns, encoder
/// identity and weights.
fn fingerprint(
    catalog: &ReferenceCatalog,
    bundle: &SparseBundle,
    encoder: &dyn ProfileEncoder,
) -> String {
    let mut hasher = Sha256::new();
    let vocabulary = catalog.vocabulary();

    for code in vocabulary.skill_codes() {
        update_field(&mut hasher, b"s", code.as_bytes());
    }
    for occupation in vocabulary.occupation_codes() {
        update_field(&mut hasher, b"o", occupation.as_bytes());
        for skill in catalog.job_skills().skills_of(occupation) {
            update_field(&mut hasher, b"a", skill.as_bytes());
        }
    }

    let (_, n_cols) = bundle.matrix().shape();
    hasher.update((n_cols as u64).to_le_bytes());
    for (row, code) in bundle.occupation_codes().iter().enumerate() {
        update_field(&mut hasher, b"r", code.as_bytes());
        let (cols, values) = bundle.matrix().row(row);
        hasher.update((cols.len() as u64).to_le_bytes());
        for (col, value) in cols.iter().zip(values) {
            hasher.update((*col as u64).to_le_bytes());
            hasher.update(value.to_bits().to_le_bytes());
        }
    }
    for (code, col) in bundle.skill_columns() {
        update_field(&mut hasher, b"c", code.as_bytes());
        hasher.update((col as u64).to_le_bytes());
    }

    update_field(&mut hasher, b"e", encoder.name().as_bytes());
    update_field(&mut hasher, b"v", encoder.version().as_bytes());
    hasher.update((encoder.dimension() as u64).to_le_bytes());
    if let Some(weights) = encoder.weights_digest() {
        update_field(&mut hasher, b"w", weights.as_bytes());
    }

    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

fn update_field(hasher: &mut Sha256, tag: &[u8], value: &[u8]) {
    hasher.update(tag);
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogRow;
    use std::io::Write;

    fn catalog(extra: bool) -> ReferenceCatalog {
        let mut rows = vec![
            CatalogRow::new("S1", None, "J1", None),
            CatalogRow::new("S2", None, "J2", None),
        ];
        if extra {
            rows.push(CatalogRow::new("S3", None, "J2", None));
        }
        ReferenceCatalog::from_rows(&rows).unwrap()
    }

    #[test]
    fn fingerprint_tracks_vocabulary() {
        let a = Artifacts::from_catalog(catalog(false), "hash", EncoderConfig::default(), None)
            .unwrap();
        let b = Artifacts::from_catalog(catalog(false), "hash", EncoderConfig::default(), None)
            .unwrap();
        let c = Artifacts::from_catalog(catalog(true), "hash", EncoderConfig::default(), None)
            .unwrap();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
        assert!(a.fingerprint().chars().all(|c| c.is_ascii_hexdigit()));
    }

    fn build(rows: &[(&str, &str)]) -> Artifacts {
        let rows: Vec<CatalogRow> = rows
            .iter()
            .map(|(skill, occupation)| CatalogRow::new(skill, None, occupation, None))
            .collect();
        let catalog = ReferenceCatalog::from_rows(&rows).unwrap();
        Artifacts::from_catalog(catalog, "hash", EncoderConfig::default(), None).unwrap()
    }

    #[test]
    fn fingerprint_tracks_adjacency_with_fixed_vocabulary() {
        // same skill and occupation codes, in the same order
        let sparse = build(&[("S1", "J1"), ("S2", "J2")]);
        let dense = build(&[("S1", "J1"), ("S2", "J1"), ("S1", "J2")]);

        assert_eq!(
            sparse.catalog.vocabulary().skill_codes(),
            dense.catalog.vocabulary().skill_codes()
        );
        assert_eq!(
            sparse.catalog.vocabulary().occupation_codes(),
            dense.catalog.vocabulary().occupation_codes()
        );
        assert_ne!(sparse.fingerprint(), dense.fingerprint());
    }

    #[test]
    fn fingerprint_tracks_table_encoder_weights() {
        let catalog = || {
            ReferenceCatalog::from_rows(&[CatalogRow::new("S1", None, "J1", None)]).unwrap()
        };
        let weights = |value: f32| {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(
                file,
                r#"{{"version": "v1", "skill_emb": [[1.0, {value}]], "job_emb": [[1.0, 0.0]]}}"#
            )
            .unwrap();
            file
        };
        let (a, b) = (weights(0.0), weights(0.5));

        let first = Artifacts::from_catalog(
            catalog(),
            "table",
            EncoderConfig::default(),
            Some(a.path()),
        )
        .unwrap();
        let second = Artifacts::from_catalog(
            catalog(),
            "table",
            EncoderConfig::default(),
            Some(b.path()),
        )
        .unwrap();

        assert_ne!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn table_encoder_without_weights_is_fatal() {
        let err = Artifacts::from_catalog(catalog(false), "table", EncoderConfig::default(), None)
            .err()
            .unwrap();

        assert!(matches!(err, ArtifactError::Empty(_)));
    }

    #[test]
    fn missing_catalog_file_is_fatal() {
        let paths = ArtifactPaths {
            catalog: PathBuf::from("/nonexistent/catalog.json"),
            sparse_bundle: None,
            encoder_name: "hash".into(),
            encoder_weights: None,
            encoder: EncoderConfig::default(),
        };

        let err = Artifacts::load(&paths).err().unwrap();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn loads_catalog_and_derives_bundle() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"code_ogr_competence": 101, "libelle_competence": "Souder", "code_rome": "H2913", "libelle_rome": "Soudeur"}},
                {{"code_ogr_competence": "102", "libelle_competence": null, "code_rome": "H2913", "libelle_rome": "Soudeur"}}
            ]"#
        )
        .unwrap();
        let paths = ArtifactPaths {
            catalog: file.path().to_path_buf(),
            sparse_bundle: None,
            encoder_name: "hash".into(),
            encoder_weights: None,
            encoder: EncoderConfig::default(),
        };

        let artifacts = Artifacts::load(&paths).unwrap();

        assert_eq!(artifacts.bundle.occupation_codes(), ["H2913".to_string()]);
        assert_eq!(artifacts.bundle.skill_count(), 2);
        assert_eq!(artifacts.encoder.name(), "hash");
    }
}
