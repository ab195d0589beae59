//! Contracts for the three external services the orchestrator coordinates.
//!
//! Every call receives a cancellation token. Implementations should stop
//! work and return `ServiceError::Cancelled` once it fires; the orchestrator
//! never waits for that to happen.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::TopicTag;
use crate::error::ServiceError;

/// Writes a story for a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate story text for `prompt`, pitched at a reader of `age_hint`.
    async fn generate(
        &self,
        prompt: &str,
        age_hint: u8,
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError>;
}

/// Topic gate run against the prompt before any story exists.
#[async_trait]
pub trait TopicClassifier: Send + Sync {
    /// Return the raw classifier reply, expected to be `allowed` or `not_allowed`.
    async fn classify(
        &self,
        prompt: &str,
        disallowed: &BTreeSet<TopicTag>,
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError>;
}

/// Post-generation moderation pass.
#[async_trait]
pub trait ContentModerator: Send + Sync {
    /// Score `content` against `rubric`, returning the raw reply.
    ///
    /// The rubric already embeds the content; it is passed separately so
    /// implementations can log or meter it.
    async fn score(
        &self,
        content: &str,
        rubric: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError>;
}
