use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn predict(payload: Value) -> (StatusCode, Value) {
    let app = rm_api::create_router(rm_api::test_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn hybrid_is_the_default_scorer() {
    let (status, body) = predict(json!({ "skills": ["101", "102", "103"] })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scorer"], "hybrid");
    assert_eq!(body["result"]["status"], "ok");
    assert_eq!(body["result"]["top1"]["code"], "H2913");
    assert_eq!(body["result"]["top1"]["label"], "Soudeur");
    // K2111 shares no skill and is filtered out
    assert_eq!(body["result"]["ranked"].as_array().unwrap().len(), 2);
    assert_eq!(body["input_skills"][0]["label"], "Souder à l'arc");
}

#[tokio::test]
async fn hybrid_without_known_skills_is_undefined() {
    let (status, body) = predict(json!({ "skills": ["999", "998"] })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["status"], "undefined");
    assert_eq!(body["result"]["top1"], Value::Null);
    assert_eq!(body["input_skills"][0]["label"], "999");
    assert_eq!(body["recognized_skills"], json!([]));
}

#[tokio::test]
async fn hybrid_below_min_overlap_is_empty() {
    let (_, body) = predict(json!({ "skills": ["101", "201"] })).await;

    assert_eq!(body["result"]["status"], "empty");
    assert_eq!(body["result"]["ranked"], json!([]));
}

#[tokio::test]
async fn sparse_needs_three_distinct_skills() {
    let (status, body) = predict(json!({
        "skills": ["101", "101.0", "102"],
        "scorer": "sparse"
    }))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["status"], "needs_more_skills");
    assert_eq!(body["result"]["min_required"], 3);
}

#[tokio::test]
async fn sparse_ranks_by_cosine() {
    let (_, body) = predict(json!({
        "skills": ["101", "102", "103", "999"],
        "scorer": "sparse",
        "top_k": 1
    }))
    .await;

    assert_eq!(body["result"]["status"], "ok");
    assert_eq!(body["result"]["top1"]["code"], "H2913");
    assert_eq!(body["result"]["ranked"].as_array().unwrap().len(), 1);
    assert_eq!(body["result"]["unrecognized_skills"], json!(["999"]));
    assert_eq!(body["recognized_skills"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn sparse_unknown_skills_are_reported() {
    let (_, body) = predict(json!({
        "skills": ["901", "902", "903"],
        "scorer": "sparse"
    }))
    .await;

    assert_eq!(body["result"]["status"], "no_known_skills");
}

#[tokio::test]
async fn unknown_scorer_is_rejected() {
    let (status, _) = predict(json!({ "skills": ["101"], "scorer": "neural" })).await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn responses_carry_the_snapshot_fingerprint() {
    let expected = rm_api::test_state().matcher.fingerprint().to_string();

    let (_, body) = predict(json!({ "skills": ["101"] })).await;

    assert_eq!(body["snapshot"], expected.as_str());
}
