//! HTTP request handlers.

use axum::{
    extract::{Query, State},
    Extension, Json,
};

use crate::api::types::*;
use crate::auth::ApiKeyInfo;
use crate::domain::StoryRequest;
use crate::error::{StoryGuardError, StoryGuardResult};
use crate::AppState;

/// Write a story and run it through both guardrails.
///
/// POST /v1/stories/evaluate
#[utoipa::path(
    post,
    path = "/v1/stories/evaluate",
    request_body = EvaluateStoryRequest,
    responses(
        (status = 200, description = "Evaluation complete", body = EvaluateStoryResponse),
        (status = 400, description = "Invalid request")
    ),
    tag = "stories"
)]
pub async fn evaluate_story(
    State(state): State<AppState>,
    caller: Option<Extension<ApiKeyInfo>>,
    Json(request): Json<EvaluateStoryRequest>,
) -> StoryGuardResult<Json<EvaluateStoryResponse>> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(StoryGuardError::BadRequest(
            "Prompt must not be empty".to_string(),
        ));
    }

    let policy = state
        .policy
        .resolve(request.age, request.allowed_topics.as_deref())?;
    let story_request = StoryRequest::new(prompt, policy);
    let client_id = caller
        .as_ref()
        .map(|Extension(info)| info.client_id.as_str())
        .unwrap_or("anonymous");

    tracing::info!(
        request_id = %story_request.id,
        client_id = %client_id,
        age = story_request.policy.min_age,
        disallowed = ?story_request.policy.disallowed_topics,
        "Evaluating story request"
    );

    let outcome = state.orchestrator.evaluate(&story_request).await;

    Ok(Json(EvaluateStoryResponse::from_outcome(
        story_request.id,
        &outcome,
    )))
}

/// Show the policy that applies to a reader age.
///
/// GET /v1/policy
#[utoipa::path(
    get,
    path = "/v1/policy",
    params(PolicyQuery),
    responses(
        (status = 200, description = "Resolved policy", body = PolicyResponse),
        (status = 400, description = "Age outside the supported range")
    ),
    tag = "policy"
)]
pub async fn get_policy(
    State(state): State<AppState>,
    Query(query): Query<PolicyQuery>,
) -> StoryGuardResult<Json<PolicyResponse>> {
    let policy = state.policy.resolve(query.age, None)?;
    Ok(Json(PolicyResponse::from(&policy)))
}

/// Health check endpoint.
///
/// GET /v1/health
#[utoipa::path(
    get,
    path = "/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.model.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
