use axum::{extract::State, Json};
use rm_common::api::{LabeledCode, PredictRequest, PredictResponse};

use crate::error::ApiError;
use crate::SharedState;

/// Upper bound on skills per request.
const MAX_INPUT_SKILLS: usize = 500;

pub async fn predict(
    State(state): State<SharedState>,
    Json(payload): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    if payload.skills.len() > MAX_INPUT_SKILLS {
        return Err(ApiError::BadRequest(format!(
            "at most {MAX_INPUT_SKILLS} skills per request, got {}",
            payload.skills.len()
        )));
    }

    let matcher = &state.matcher;
    let scorer = payload.scorer();
    let result = matcher.match_skills(scorer, &payload.skills, payload.top_k());

    let label = |code: &String| LabeledCode {
        code: code.clone(),
        label: matcher.skill_label(code),
    };

    Ok(Json(PredictResponse {
        scorer,
        input_skills: payload.skills.iter().map(label).collect(),
        recognized_skills: result.recognized_skills.iter().map(label).collect(),
        snapshot: matcher.fingerprint().to_string(),
        result,
    }))
}
