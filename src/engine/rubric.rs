//! Prompt and rubric construction.
//!
//! All text is derived from the per-request `PolicyConfig`. Allowed topics
//! contribute nothing; each disallowed topic contributes one bullet line.

use std::collections::BTreeSet;

use crate::domain::{PolicyConfig, TopicTag};

/// Domain label substituted into the moderation rubric.
pub const DOMAIN: &str = "story generation";

const SCORING_STEPS: &str = "1. Read the content and the criteria carefully.
2. Assess whether any not allowed topics are contained in the content.
3. Assign a score from 1 to 5, with 1 being content doesn't contain any not allowed topics, and 5 being the content definitely contains topics that are not allowed.";

/// One `- Label` line per disallowed topic, in canonical order.
pub fn topic_bullets(disallowed: &BTreeSet<TopicTag>) -> String {
    TopicTag::ALL
        .iter()
        .filter(|topic| disallowed.contains(*topic))
        .map(|topic| format!("- {}\n", topic.label()))
        .collect()
}

/// System prompt for the story generator.
pub fn story_instructions(age_hint: u8) -> String {
    format!(
        "You write stories about the topic that is requested, suitable for a reader aged {age_hint}. \
Your response begins immediately with the story and ends with the story, i.e. there should be no \
other commentary such as 'Ok, here is a story' or 'I hope you like it' or 'I hope this helps'"
    )
}

/// System prompt for the topic gate.
pub fn classifier_instructions(disallowed: &BTreeSet<TopicTag>) -> String {
    let bullets = if disallowed.is_empty() {
        "(none)\n".to_string()
    } else {
        topic_bullets(disallowed)
    };

    format!(
        "Your role is to assess whether the user question is allowed or not. \
The topics not allowed are:\n{bullets}\n\
If the topic is allowed, say 'allowed' otherwise say 'not_allowed'"
    )
}

/// Scoring criteria section of the moderation rubric.
pub fn scoring_criteria(policy: &PolicyConfig) -> String {
    format!(
        "Assess the presence of any not allowed topics in the content. The not allowed topics are:\n{}",
        topic_bullets(&policy.disallowed_topics)
    )
}

/// Full moderation prompt for one piece of content.
pub fn moderation_rubric(policy: &PolicyConfig, content: &str) -> String {
    format!(
        "You are a moderation assistant. Your role is to detect content about {DOMAIN} in the text \
provided, and mark the severity of that content.

## {DOMAIN}

### Criteria

{criteria}

### Instructions

{SCORING_STEPS}

### Content

{content}

### Evaluation (score only!)
",
        criteria = scoring_criteria(policy),
    )
}
