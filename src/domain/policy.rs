//! Per-request content policy.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::domain::TopicTag;

/// Content policy for one evaluation.
///
/// Built fresh for every request and passed down by value; nothing in the
/// engine looks policy up from shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Topics the story must not touch.
    pub disallowed_topics: BTreeSet<TopicTag>,
    /// Age of the youngest intended reader.
    pub min_age: u8,
}

impl PolicyConfig {
    pub fn new(min_age: u8, disallowed_topics: impl IntoIterator<Item = TopicTag>) -> Self {
        Self {
            disallowed_topics: disallowed_topics.into_iter().collect(),
            min_age,
        }
    }

    /// Build a policy from the topics that are allowed; every other topic is
    /// disallowed.
    pub fn from_allowed(min_age: u8, allowed: &[TopicTag]) -> Self {
        Self::new(
            min_age,
            TopicTag::ALL
                .into_iter()
                .filter(|topic| !allowed.contains(topic)),
        )
    }

    pub fn is_disallowed(&self, topic: TopicTag) -> bool {
        self.disallowed_topics.contains(&topic)
    }

    /// Allowed topics in canonical order.
    pub fn allowed_topics(&self) -> Vec<TopicTag> {
        TopicTag::ALL
            .into_iter()
            .filter(|topic| !self.is_disallowed(*topic))
            .collect()
    }
}

/// A single story request: the reader's prompt plus the policy it is judged
/// against.
#[derive(Debug, Clone)]
pub struct StoryRequest {
    /// Correlation id for logs.
    pub id: Uuid,
    pub text: String,
    pub policy: PolicyConfig,
}

impl StoryRequest {
    pub fn new(text: impl Into<String>, policy: PolicyConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            policy,
        }
    }
}
