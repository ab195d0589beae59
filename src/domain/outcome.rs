//! Values produced during an evaluation and the final outcome.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ServiceError;

/// Refusal shown when the topic gate blocks a request.
pub const TOPIC_REFUSAL: &str = "Sorry, I cannot write about that.";

/// Refusal shown when the moderation pass blocks a generated story.
pub const MODERATION_REFUSAL: &str = "Sorry, I don't feel comfortable writing about that.";

/// Apology shown for any failed evaluation. Raw error text never reaches the reader.
pub const FAILURE_APOLOGY: &str =
    "Sorry, something went wrong while writing your story. Please try again.";

/// Verdict of the topic gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierVerdict {
    Allowed,
    NotAllowed,
}

impl ClassifierVerdict {
    /// Parse the classifier's raw reply.
    ///
    /// Accepts `allowed` and `not_allowed` (or `not allowed`), ignoring case,
    /// quotes and trailing punctuation. Anything else is malformed.
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let normalized = raw
            .trim()
            .trim_matches(|c: char| c == '\'' || c == '"' || c == '.' || c == '`')
            .trim()
            .to_lowercase();

        match normalized.as_str() {
            "allowed" => Ok(ClassifierVerdict::Allowed),
            "not_allowed" | "not allowed" => Ok(ClassifierVerdict::NotAllowed),
            _ => Err(ServiceError::MalformedVerdict(raw.to_string())),
        }
    }
}

/// Story text returned by the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedText {
    pub body: String,
}

/// Severity score from the moderation pass, always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModerationScore(u8);

impl ModerationScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    /// Scores at or above this value block delivery.
    pub const BLOCK_THRESHOLD: u8 = 3;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&value)
            .then_some(ModerationScore(value))
    }

    /// Parse the moderator's raw reply. Malformed output is an error, never a pass.
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        raw.trim()
            .parse::<u8>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| ServiceError::MalformedScore(raw.to_string()))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_blocking(&self) -> bool {
        self.0 >= Self::BLOCK_THRESHOLD
    }
}

/// Why an evaluation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// An external call failed (network, auth, rate limit, bad status).
    Service,
    /// The moderator did not answer with an integer in 1..=5.
    MalformedScore,
    /// The topic classifier answered with something other than a verdict.
    MalformedVerdict,
    /// An external call exceeded its time budget.
    Timeout,
    /// A race branch was cancelled. Internal only.
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Service => write!(f, "service"),
            ErrorKind::MalformedScore => write!(f, "malformed_score"),
            ErrorKind::MalformedVerdict => write!(f, "malformed_verdict"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Final result of evaluating a story request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The story passed both guardrails.
    Delivered(String),
    /// The topic gate rejected the request.
    BlockedByTopic,
    /// The moderation pass scored the story at or above the threshold.
    BlockedByModeration(u8),
    /// Evaluation could not complete.
    Failed(ErrorKind),
}

impl Outcome {
    /// Text to show the reader for this outcome.
    pub fn user_message(&self) -> &str {
        match self {
            Outcome::Delivered(body) => body,
            Outcome::BlockedByTopic => TOPIC_REFUSAL,
            Outcome::BlockedByModeration(_) => MODERATION_REFUSAL,
            Outcome::Failed(_) => FAILURE_APOLOGY,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Delivered(_) => write!(f, "delivered"),
            Outcome::BlockedByTopic => write!(f, "blocked_by_topic"),
            Outcome::BlockedByModeration(_) => write!(f, "blocked_by_moderation"),
            Outcome::Failed(_) => write!(f, "failed"),
        }
    }
}
