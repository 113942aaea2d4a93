use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading the shared artifacts at startup.
///
/// Scoring itself never fails; only the one-time load does, and any of these
/// aborts startup.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("inconsistent artifact shape: {0}")]
    Shape(String),
    #[error("artifact is empty: {0}")]
    Empty(String),
}

impl ArtifactError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArtifactError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        ArtifactError::Json {
            path: path.into(),
            source,
        }
    }
}

/// Reads and deserializes a JSON artifact.
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(
    path: &std::path::Path,
) -> Result<T, ArtifactError> {
    let file = std::fs::File::open(path).map_err(|err| ArtifactError::io(path, err))?;
    let reader = std::io::BufReader::new(file);
    serde_json::from_reader(reader).map_err(|err| ArtifactError::json(path, err))
}
