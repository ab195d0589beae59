//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{ErrorKind, Outcome, PolicyConfig, TopicTag};

// ==================== Evaluate Story ====================

/// Request to write and vet a story.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EvaluateStoryRequest {
    /// What the story should be about.
    pub prompt: String,
    /// Reader age. Defaults to the configured default age.
    #[serde(default)]
    pub age: Option<u8>,
    /// Topics to allow for this request, replacing the configured row for the age.
    #[serde(default)]
    pub allowed_topics: Option<Vec<TopicTag>>,
}

/// Final state of an evaluation as seen by API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Delivered,
    BlockedByTopic,
    BlockedByModeration,
    Failed,
}

/// Response from story evaluation.
#[derive(Debug, Serialize, ToSchema)]
pub struct EvaluateStoryResponse {
    /// Correlation id, also present in server logs.
    pub request_id: Uuid,
    pub outcome: OutcomeKind,
    /// Text to show the reader: the story, a refusal, or an apology.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluateStoryResponse {
    pub fn from_outcome(request_id: Uuid, outcome: &Outcome) -> Self {
        let message = outcome.user_message().to_string();
        let (kind, story, moderation_score, error_kind) = match outcome {
            Outcome::Delivered(body) => (OutcomeKind::Delivered, Some(body.clone()), None, None),
            Outcome::BlockedByTopic => (OutcomeKind::BlockedByTopic, None, None, None),
            Outcome::BlockedByModeration(score) => {
                (OutcomeKind::BlockedByModeration, None, Some(*score), None)
            }
            Outcome::Failed(kind) => (OutcomeKind::Failed, None, None, Some(*kind)),
        };

        Self {
            request_id,
            outcome: kind,
            message,
            story,
            moderation_score,
            error_kind,
            evaluated_at: Utc::now(),
        }
    }
}

// ==================== Policy ====================

/// Query parameters for policy lookup.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PolicyQuery {
    /// Reader age. Defaults to the configured default age.
    #[serde(default)]
    pub age: Option<u8>,
}

/// Policy that would apply to a request for the given age.
#[derive(Debug, Serialize, ToSchema)]
pub struct PolicyResponse {
    pub age: u8,
    pub allowed_topics: Vec<TopicTag>,
    pub disallowed_topics: Vec<TopicTag>,
}

impl From<&PolicyConfig> for PolicyResponse {
    fn from(policy: &PolicyConfig) -> Self {
        Self {
            age: policy.min_age,
            allowed_topics: policy.allowed_topics(),
            disallowed_topics: policy.disallowed_topics.iter().copied().collect(),
        }
    }
}

// ==================== Health ====================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Model used by the guardrail services.
    pub model: String,
    /// Timestamp.
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_response_hides_error_text() {
        let response =
            EvaluateStoryResponse::from_outcome(Uuid::new_v4(), &Outcome::Failed(ErrorKind::Timeout));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["error_kind"], "timeout");
        assert_eq!(json["message"], crate::domain::FAILURE_APOLOGY);
        assert!(json.get("story").is_none());
    }

    #[test]
    fn test_moderation_block_carries_score() {
        let response =
            EvaluateStoryResponse::from_outcome(Uuid::new_v4(), &Outcome::BlockedByModeration(4));
        assert_eq!(response.outcome, OutcomeKind::BlockedByModeration);
        assert_eq!(response.moderation_score, Some(4));
        assert_eq!(response.message, crate::domain::MODERATION_REFUSAL);
    }

    #[test]
    fn test_policy_response_lists_both_sides() {
        let policy = PolicyConfig::from_allowed(9, &[TopicTag::Death]);
        let response = PolicyResponse::from(&policy);
        assert_eq!(response.allowed_topics, vec![TopicTag::Death]);
        assert_eq!(response.disallowed_topics.len(), 4);
    }
}
