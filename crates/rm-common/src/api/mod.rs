pub mod occupations;
pub mod predict_request;
pub mod predict_response;

pub use occupations::{OccupationSkills, OccupationSummary};
pub use predict_request::PredictRequest;
pub use predict_response::{LabeledCode, PredictResponse};
