//! Route definitions for the API.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::auth::{require_api_key, ApiKeyValidator};
use crate::AppState;

/// Security scheme modifier for OpenAPI.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::evaluate_story,
        handlers::get_policy,
        handlers::health_check,
    ),
    components(schemas(
        crate::api::types::EvaluateStoryRequest,
        crate::api::types::EvaluateStoryResponse,
        crate::api::types::OutcomeKind,
        crate::api::types::PolicyResponse,
        crate::api::types::HealthResponse,
        crate::domain::TopicTag,
        crate::domain::ErrorKind,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "stories", description = "Story generation behind topic and moderation guardrails"),
        (name = "policy", description = "Age and topic policy lookup"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Storyguard API",
        version = "0.1.0",
        description = "Guardrail gateway for AI-generated children's stories",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the API router with optional authentication.
pub fn build_router(
    state: AppState,
    auth_enabled: bool,
    api_key_validator: ApiKeyValidator,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let story_routes = Router::new()
        .route("/v1/stories/evaluate", post(handlers::evaluate_story))
        .route("/v1/policy", get(handlers::get_policy));

    let story_routes = if auth_enabled {
        story_routes.layer(middleware::from_fn_with_state(
            api_key_validator,
            require_api_key,
        ))
    } else {
        story_routes
    };

    // Public routes (no auth required)
    let public_routes = Router::new().route("/v1/health", get(handlers::health_check));

    Router::new()
        .merge(story_routes)
        .merge(public_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
