pub mod api;
pub mod artifacts;
pub mod catalog;
pub mod encoder;
pub mod error;
pub mod logging;
pub mod matching;
pub mod normalize;
pub mod sparse;
pub mod vocabulary;

pub use artifacts::{ArtifactPaths, Artifacts};
pub use catalog::{CatalogRow, JobSkills, ReferenceCatalog};
pub use error::ArtifactError;
pub use matching::{MatchResult, MatchStatus, Matcher, ScoredCandidate, ScorerKind};
pub use sparse::{SparseBundle, SparseMatrix};
pub use vocabulary::VocabularyIndex;
