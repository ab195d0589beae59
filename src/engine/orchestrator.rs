//! Guardrail Orchestrator - races the topic gate against story generation.
//!
//! This is the central component. It launches the classifier and the
//! generator together, reacts to whichever finishes first, and runs the
//! moderation pass on any story that survives the race.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{ClassifierFailurePolicy, GuardrailConfig};
use crate::domain::{ClassifierVerdict, GeneratedText, ModerationScore, Outcome, StoryRequest};
use crate::engine::rubric;
use crate::engine::{ContentModerator, TextGenerator, TopicClassifier};
use crate::error::ServiceError;

/// Tunables for the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    pub classifier_failure: ClassifierFailurePolicy,
    /// Upper bound on each external call.
    pub call_timeout: Duration,
}

impl From<&GuardrailConfig> for OrchestratorSettings {
    fn from(config: &GuardrailConfig) -> Self {
        Self {
            classifier_failure: config.classifier_failure,
            call_timeout: Duration::from_secs(config.call_timeout_secs),
        }
    }
}

/// Where the topic gate stands while generation is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Pending,
    Allowed,
    /// Classifier failed and the failure policy let generation continue.
    Unavailable,
}

/// Orchestrates the topic gate, story generation and moderation pass.
///
/// Holds no per-request state, so one instance serves any number of
/// concurrent evaluations.
pub struct GuardrailOrchestrator {
    generator: Box<dyn TextGenerator>,
    classifier: Box<dyn TopicClassifier>,
    moderator: Box<dyn ContentModerator>,
    settings: OrchestratorSettings,
}

impl GuardrailOrchestrator {
    /// Create a new orchestrator with the given services.
    pub fn new(
        generator: Box<dyn TextGenerator>,
        classifier: Box<dyn TopicClassifier>,
        moderator: Box<dyn ContentModerator>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            generator,
            classifier,
            moderator,
            settings,
        }
    }

    /// Evaluate a story request through both guardrails.
    ///
    /// Pipeline:
    /// 1. Race the topic gate against generation
    /// 2. Block immediately if the gate says `not_allowed` first
    /// 3. Score the generated story
    /// 4. Deliver below the block threshold, refuse at or above it
    pub async fn evaluate(&self, request: &StoryRequest) -> Outcome {
        // Cancels every branch still holding a token once we return.
        let evaluation = CancellationToken::new();
        let _branches = evaluation.clone().drop_guard();

        let outcome = match self.race(request, &evaluation).await {
            Ok(text) => self.moderate(request, text, &evaluation).await,
            Err(outcome) => outcome,
        };

        tracing::info!(
            request_id = %request.id,
            outcome = %outcome,
            "Evaluation complete"
        );
        outcome
    }

    /// Run the classifier and generator concurrently until a story exists or
    /// the request is resolved without one.
    async fn race(
        &self,
        request: &StoryRequest,
        evaluation: &CancellationToken,
    ) -> Result<GeneratedText, Outcome> {
        let gate_token = evaluation.child_token();
        let generation_token = evaluation.child_token();

        let gate = with_timeout(
            self.settings.call_timeout,
            self.classifier.classify(
                &request.text,
                &request.policy.disallowed_topics,
                &gate_token,
            ),
        );
        let generation = with_timeout(
            self.settings.call_timeout,
            self.generator
                .generate(&request.text, request.policy.min_age, &generation_token),
        );
        tokio::pin!(gate, generation);

        let mut gate_state = GateState::Pending;

        let generated = loop {
            tokio::select! {
                // The gate is inspected first so a ready `not_allowed` wins ties.
                biased;

                result = &mut gate, if gate_state == GateState::Pending => {
                    match result.and_then(|raw| ClassifierVerdict::parse(&raw)) {
                        Ok(ClassifierVerdict::NotAllowed) => {
                            generation_token.cancel();
                            tracing::info!(
                                request_id = %request.id,
                                "Topical guardrail triggered"
                            );
                            return Err(Outcome::BlockedByTopic);
                        }
                        Ok(ClassifierVerdict::Allowed) => {
                            tracing::debug!(request_id = %request.id, "Topic gate passed");
                            gate_state = GateState::Allowed;
                        }
                        Err(e) => match self.settings.classifier_failure {
                            ClassifierFailurePolicy::FailOpen => {
                                tracing::warn!(
                                    request_id = %request.id,
                                    error = %e,
                                    "Topic gate failed, continuing with generation"
                                );
                                gate_state = GateState::Unavailable;
                            }
                            ClassifierFailurePolicy::FailClosed => {
                                generation_token.cancel();
                                tracing::warn!(
                                    request_id = %request.id,
                                    error = %e,
                                    "Topic gate failed, aborting evaluation"
                                );
                                return Err(Outcome::Failed(e.kind()));
                            }
                        },
                    }
                }

                result = &mut generation => break result,
            }
        };

        if gate_state == GateState::Pending {
            gate_token.cancel();
            tracing::debug!(
                request_id = %request.id,
                "Generation finished before the topic gate, moderation decides"
            );
        }

        match generated {
            Ok(body) => Ok(GeneratedText { body }),
            Err(e) => {
                tracing::error!(
                    request_id = %request.id,
                    error = %e,
                    gate = ?gate_state,
                    "Story generation failed"
                );
                Err(Outcome::Failed(e.kind()))
            }
        }
    }

    /// Score the story and turn the score into an outcome.
    async fn moderate(
        &self,
        request: &StoryRequest,
        text: GeneratedText,
        evaluation: &CancellationToken,
    ) -> Outcome {
        let rubric = rubric::moderation_rubric(&request.policy, &text.body);
        let token = evaluation.child_token();

        let score = with_timeout(
            self.settings.call_timeout,
            self.moderator.score(&text.body, &rubric, &token),
        )
        .await
        .and_then(|raw| ModerationScore::parse(&raw));

        match score {
            Ok(score) if score.is_blocking() => {
                tracing::info!(
                    request_id = %request.id,
                    score = score.value(),
                    "Moderation guardrail flagged story"
                );
                Outcome::BlockedByModeration(score.value())
            }
            Ok(score) => {
                tracing::debug!(
                    request_id = %request.id,
                    score = score.value(),
                    "Passed moderation"
                );
                Outcome::Delivered(text.body)
            }
            Err(e) => {
                tracing::error!(
                    request_id = %request.id,
                    error = %e,
                    "Moderation failed"
                );
                Outcome::Failed(e.kind())
            }
        }
    }
}

/// Bound an external call, mapping expiry to `ServiceError::Timeout`.
async fn with_timeout<F>(limit: Duration, call: F) -> Result<String, ServiceError>
where
    F: Future<Output = Result<String, ServiceError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(ServiceError::Timeout(limit)))
}
