use axum::{
    extract::{Path, State},
    Json,
};
use rm_common::api::{LabeledCode, OccupationSkills, OccupationSummary};
use rm_common::normalize::normalize_code;

use crate::error::ApiError;
use crate::SharedState;

pub async fn list_occupations(State(state): State<SharedState>) -> Json<Vec<OccupationSummary>> {
    let catalog = state.matcher.catalog();

    let occupations = catalog
        .occupations()
        .into_iter()
        .map(|(code, label)| OccupationSummary {
            skill_count: catalog.job_skills().skills_of(&code).len(),
            code,
            label,
        })
        .collect();

    Json(occupations)
}

pub async fn occupation_skills(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<OccupationSkills>, ApiError> {
    let catalog = state.matcher.catalog();
    let vocabulary = catalog.vocabulary();
    let code = normalize_code(&code);

    if vocabulary.occupation_index(&code).is_none() {
        return Err(ApiError::NotFound(format!("unknown occupation {code}")));
    }

    let skills = catalog
        .job_skills()
        .skills_of(&code)
        .iter()
        .map(|skill| LabeledCode {
            code: skill.clone(),
            label: vocabulary.skill_label(skill).to_string(),
        })
        .collect();

    Ok(Json(OccupationSkills {
        label: vocabulary.occupation_label(&code).to_string(),
        code,
        skills,
    }))
}
