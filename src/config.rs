//! Configuration module for Storyguard.
//!
//! Loads configuration from YAML files and environment variables.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

use crate::auth::ConfiguredApiKey;
use crate::domain::{PolicyConfig, TopicTag};
use crate::error::{StoryGuardError, StoryGuardResult};

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub guardrail: GuardrailConfig,
    #[serde(default)]
    pub policy: PolicySettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// API key authentication.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_keys: Vec<ConfiguredApiKey>,
}

/// Chat-completions backend shared by all three guardrail services.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature for story generation. Guardrail calls always use 0.
    #[serde(default = "default_story_temperature")]
    pub story_temperature: f32,
    /// Transport-level timeout for a single HTTP request.
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_story_temperature() -> f32 {
    0.5
}

fn default_http_timeout() -> u64 {
    60
}

/// What to do when the topic classifier itself fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierFailurePolicy {
    /// Keep generating; the moderation pass is the safety net.
    #[default]
    FailOpen,
    /// Abort the evaluation with `Failed`.
    FailClosed,
}

/// Guardrail orchestration settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GuardrailConfig {
    #[serde(default)]
    pub classifier_failure: ClassifierFailurePolicy,
    /// Upper bound on each external call, in seconds.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

fn default_call_timeout() -> u64 {
    30
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            classifier_failure: ClassifierFailurePolicy::default(),
            call_timeout_secs: default_call_timeout(),
        }
    }
}

impl GuardrailConfig {
    /// Reject settings that would fail every evaluation.
    pub fn validate(&self) -> StoryGuardResult<()> {
        if self.call_timeout_secs == 0 {
            return Err(StoryGuardError::Config(
                "guardrail.call_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Topics allowed for one reader age.
#[derive(Debug, Clone, Deserialize)]
pub struct AgeTopics {
    pub age: u8,
    #[serde(default)]
    pub allowed: Vec<TopicTag>,
}

/// Age/topic matrix used to build a `PolicyConfig` per request.
///
/// Ages without an entry allow no sensitive topics.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicySettings {
    #[serde(default = "default_age")]
    pub default_age: u8,
    #[serde(default = "default_youngest_age")]
    pub youngest_age: u8,
    #[serde(default = "default_oldest_age")]
    pub oldest_age: u8,
    #[serde(default)]
    pub allowed_topics: Vec<AgeTopics>,
}

fn default_age() -> u8 {
    7
}

fn default_youngest_age() -> u8 {
    5
}

fn default_oldest_age() -> u8 {
    10
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            default_age: default_age(),
            youngest_age: default_youngest_age(),
            oldest_age: default_oldest_age(),
            allowed_topics: Vec::new(),
        }
    }
}

impl PolicySettings {
    /// Topics the matrix allows for `age`.
    pub fn allowed_for(&self, age: u8) -> Vec<TopicTag> {
        self.allowed_topics
            .iter()
            .filter(|row| row.age == age)
            .flat_map(|row| row.allowed.iter().copied())
            .collect()
    }

    /// Resolve the policy for one request.
    ///
    /// A missing age falls back to `default_age`. An explicit allowed list
    /// replaces the matrix row for that age.
    pub fn resolve(
        &self,
        age: Option<u8>,
        allowed_override: Option<&[TopicTag]>,
    ) -> StoryGuardResult<PolicyConfig> {
        let age = age.unwrap_or(self.default_age);
        if !(self.youngest_age..=self.oldest_age).contains(&age) {
            return Err(StoryGuardError::BadRequest(format!(
                "Age {} is outside the supported range {}-{}",
                age, self.youngest_age, self.oldest_age
            )));
        }

        let policy = match allowed_override {
            Some(allowed) => PolicyConfig::from_allowed(age, allowed),
            None => PolicyConfig::from_allowed(age, &self.allowed_for(age)),
        };
        Ok(policy)
    }

    /// Check the matrix itself is consistent.
    pub fn validate(&self) -> StoryGuardResult<()> {
        if self.youngest_age > self.oldest_age {
            return Err(StoryGuardError::Config(format!(
                "youngest_age {} is greater than oldest_age {}",
                self.youngest_age, self.oldest_age
            )));
        }
        if !(self.youngest_age..=self.oldest_age).contains(&self.default_age) {
            return Err(StoryGuardError::Config(format!(
                "default_age {} is outside {}-{}",
                self.default_age, self.youngest_age, self.oldest_age
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (STORYGUARD_*)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            // Start with default config
            .add_source(File::with_name("config/default").required(false))
            // Layer on local overrides
            .add_source(File::with_name("config/local").required(false))
            // Layer on environment variables with STORYGUARD_ prefix
            .add_source(
                Environment::with_prefix("STORYGUARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PolicySettings {
        PolicySettings {
            allowed_topics: vec![
                AgeTopics {
                    age: 9,
                    allowed: vec![TopicTag::Death],
                },
                AgeTopics {
                    age: 10,
                    allowed: vec![TopicTag::Death, TopicTag::Politics],
                },
            ],
            ..PolicySettings::default()
        }
    }

    #[test]
    fn test_default_policy_settings() {
        let settings = PolicySettings::default();
        assert_eq!(settings.default_age, 7);
        assert_eq!(settings.youngest_age, 5);
        assert_eq!(settings.oldest_age, 10);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_resolve_uses_matrix_row() {
        let policy = settings().resolve(Some(10), None).unwrap();
        assert_eq!(policy.min_age, 10);
        assert_eq!(
            policy.allowed_topics(),
            vec![TopicTag::Death, TopicTag::Politics]
        );
    }

    #[test]
    fn test_resolve_defaults_to_default_age_with_nothing_allowed() {
        let policy = settings().resolve(None, None).unwrap();
        assert_eq!(policy.min_age, 7);
        assert!(policy.allowed_topics().is_empty());
    }

    #[test]
    fn test_resolve_override_replaces_row() {
        let policy = settings()
            .resolve(Some(9), Some(&[TopicTag::Guns][..]))
            .unwrap();
        assert_eq!(policy.allowed_topics(), vec![TopicTag::Guns]);
        assert!(policy.is_disallowed(TopicTag::Death));
    }

    #[test]
    fn test_resolve_rejects_age_out_of_range() {
        assert!(settings().resolve(Some(4), None).is_err());
        assert!(settings().resolve(Some(11), None).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_band() {
        let settings = PolicySettings {
            youngest_age: 10,
            oldest_age: 5,
            ..PolicySettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_guardrail_defaults_fail_open() {
        let config = GuardrailConfig::default();
        assert_eq!(config.classifier_failure, ClassifierFailurePolicy::FailOpen);
        assert_eq!(config.call_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_call_timeout_rejected() {
        let config = GuardrailConfig {
            call_timeout_secs: 0,
            ..GuardrailConfig::default()
        };
        assert!(matches!(config.validate(), Err(StoryGuardError::Config(_))));
    }
}
