//! Guardrail engine for Storyguard.
//!
//! - Services: contracts for the generator, topic classifier and moderator
//! - Rubric: prompts and the moderation rubric built from a policy
//! - OpenAI: chat-completions implementations of the three services
//! - Orchestrator: races the topic gate against generation, then moderates

mod openai;
mod orchestrator;
mod rubric;
mod services;
#[cfg(test)]
pub(crate) mod testing;

pub use openai::*;
pub use orchestrator::*;
pub use services::*;
