//! Storyguard - guardrail gateway for AI-generated children's stories.
//!
//! Each request races a topic gate against story generation, then runs a
//! moderation pass on the story before it is released to the reader.

use std::sync::Arc;

use tokio::net::TcpListener;

mod api;
mod auth;
mod config;
mod domain;
mod engine;
mod error;
mod logging;

use crate::api::build_router;
use crate::auth::ApiKeyValidator;
use crate::config::{Config, PolicySettings};
use crate::engine::{
    ChatClient, ChatModerator, ChatStoryGenerator, ChatTopicClassifier, GuardrailOrchestrator,
    OrchestratorSettings,
};
use crate::error::StoryGuardError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The guardrail orchestrator.
    pub orchestrator: Arc<GuardrailOrchestrator>,
    /// Age/topic matrix used to build each request's policy.
    pub policy: Arc<PolicySettings>,
    /// Model name reported by the health check.
    pub model: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    logging::init();

    tracing::info!("Starting Storyguard v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    config.policy.validate()?;
    config.guardrail.validate()?;
    if config.llm.api_key.is_empty() {
        return Err(StoryGuardError::Config(
            "llm.api_key is required (set STORYGUARD__LLM__API_KEY)".to_string(),
        )
        .into());
    }

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        model = %config.llm.model,
        classifier_failure = ?config.guardrail.classifier_failure,
        call_timeout_secs = config.guardrail.call_timeout_secs,
        auth_enabled = %config.auth.enabled,
        "Configuration loaded"
    );

    // Build the guardrail orchestrator
    let client = Arc::new(ChatClient::new(config.llm.clone()).map_err(|e| {
        tracing::error!(error = %e, "Failed to create HTTP client");
        anyhow::anyhow!("HTTP client error: {}", e)
    })?);

    let orchestrator = Arc::new(GuardrailOrchestrator::new(
        Box::new(ChatStoryGenerator::new(
            client.clone(),
            config.llm.story_temperature,
        )),
        Box::new(ChatTopicClassifier::new(client.clone())),
        Box::new(ChatModerator::new(client)),
        OrchestratorSettings::from(&config.guardrail),
    ));

    let api_key_validator = ApiKeyValidator::new(config.auth.api_keys.clone());

    let state = AppState {
        orchestrator,
        policy: Arc::new(config.policy.clone()),
        model: config.llm.model.clone(),
    };

    if config.auth.enabled {
        if api_key_validator.is_empty() {
            tracing::warn!("Authentication enabled but no API keys configured");
        }
        tracing::info!(
            api_keys = api_key_validator.len(),
            "Authentication enabled"
        );
    } else {
        tracing::warn!("Authentication is DISABLED - enable for production");
    }

    let app = build_router(state, config.auth.enabled, api_key_validator);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
