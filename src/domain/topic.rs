//! Topic catalogue used by the topic gate and the moderation rubric.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A sensitive story topic that a policy can allow or disallow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TopicTag {
    Guns,
    Death,
    Politics,
    /// Extreme violence. Mild peril is not covered.
    Violence,
    Drugs,
}

impl TopicTag {
    /// Every topic, in the order they appear in prompts.
    pub const ALL: [TopicTag; 5] = [
        TopicTag::Guns,
        TopicTag::Death,
        TopicTag::Politics,
        TopicTag::Violence,
        TopicTag::Drugs,
    ];

    /// Label used when listing the topic in a prompt or rubric.
    pub fn label(&self) -> &'static str {
        match self {
            TopicTag::Guns => "Guns",
            TopicTag::Death => "Death",
            TopicTag::Politics => "Politics",
            TopicTag::Violence => "Extreme violence",
            TopicTag::Drugs => "Drugs",
        }
    }
}

impl std::fmt::Display for TopicTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopicTag::Guns => write!(f, "guns"),
            TopicTag::Death => write!(f, "death"),
            TopicTag::Politics => write!(f, "politics"),
            TopicTag::Violence => write!(f, "violence"),
            TopicTag::Drugs => write!(f, "drugs"),
        }
    }
}

impl std::str::FromStr for TopicTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "guns" => Ok(TopicTag::Guns),
            "death" => Ok(TopicTag::Death),
            "politics" => Ok(TopicTag::Politics),
            "violence" | "extreme violence" => Ok(TopicTag::Violence),
            "drugs" => Ok(TopicTag::Drugs),
            _ => Err(format!("Unknown topic: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_serialization() {
        let json = serde_json::to_string(&TopicTag::Violence).unwrap();
        assert_eq!(json, "\"violence\"");
    }

    #[test]
    fn test_topic_from_str_accepts_label() {
        assert_eq!("Extreme violence".parse::<TopicTag>(), Ok(TopicTag::Violence));
        assert_eq!(" GUNS ".parse::<TopicTag>(), Ok(TopicTag::Guns));
        assert!("dragons".parse::<TopicTag>().is_err());
    }
}
