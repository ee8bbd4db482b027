//! Known model registry
//!
//! The OpenAI-compatible adapter only accepts models listed here; the
//! capability decides which sampling parameters a request carries.

use cardsmith_common::Provider;
use serde_json::{json, Map, Value};

/// OpenAI chat models
pub const OPENAI_CHAT_MODELS: &[&str] = &[
    "gpt-3.5-turbo",
    "gpt-4",
    "gpt-4-turbo",
    "gpt-4.1",
    "gpt-4.1-mini",
    "gpt-4.1-nano",
    "gpt-4o",
    "gpt-4o-mini",
];

/// OpenAI reasoning models
pub const OPENAI_REASONING_MODELS: &[&str] = &["o1", "o1-mini", "o3", "o3-mini", "o4-mini"];

/// Claude models
pub const CLAUDE_MODELS: &[&str] = &[
    "claude-sonnet-4-5-20250929",
    "claude-sonnet-4-20250514",
    "claude-haiku-4-5-20251001",
    "claude-opus-4-5-20251101",
];

/// Sampling temperature for regular chat models
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Reasoning effort hint sent to reasoning models
pub const DEFAULT_REASONING_EFFORT: &str = "medium";

/// What kind of sampling parameters a model accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelCapability {
    /// Regular chat model (temperature based)
    Chat,
    /// Reasoning model (reasoning effort instead of temperature)
    Reasoning,
}

impl ModelCapability {
    /// Write the capability-specific sampling fields into a request body
    pub fn apply_sampling(&self, body: &mut Map<String, Value>) {
        match self {
            Self::Chat => {
                body.insert("temperature".to_string(), json!(DEFAULT_TEMPERATURE));
            }
            Self::Reasoning => {
                body.insert("reasoning_effort".to_string(), json!(DEFAULT_REASONING_EFFORT));
            }
        }
    }
}

/// Look up an OpenAI model's capability
pub fn openai_capability(model: &str) -> Option<ModelCapability> {
    if OPENAI_CHAT_MODELS.contains(&model) {
        Some(ModelCapability::Chat)
    } else if OPENAI_REASONING_MODELS.contains(&model) {
        Some(ModelCapability::Reasoning)
    } else {
        None
    }
}

/// Models offered for a provider
pub fn models_for(provider: Provider) -> Vec<&'static str> {
    match provider {
        Provider::OpenAi => OPENAI_CHAT_MODELS
            .iter()
            .chain(OPENAI_REASONING_MODELS.iter())
            .copied()
            .collect(),
        Provider::Claude => CLAUDE_MODELS.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_capability_lookup() {
        assert_eq!(openai_capability("gpt-4o"), Some(ModelCapability::Chat));
        assert_eq!(openai_capability("o3-mini"), Some(ModelCapability::Reasoning));
        assert_eq!(openai_capability("gpt-2"), None);
        assert_eq!(openai_capability("claude-sonnet-4-20250514"), None);
    }

    #[test]
    fn test_sampling_strategy() {
        let mut chat = Map::new();
        ModelCapability::Chat.apply_sampling(&mut chat);
        assert_eq!(chat.get("temperature"), Some(&json!(0.7)));
        assert!(!chat.contains_key("reasoning_effort"));

        let mut reasoning = Map::new();
        ModelCapability::Reasoning.apply_sampling(&mut reasoning);
        assert!(!reasoning.contains_key("temperature"));
        assert_eq!(reasoning.get("reasoning_effort"), Some(&json!("medium")));
    }

    #[test]
    fn test_models_for_provider() {
        let openai = models_for(Provider::OpenAi);
        assert!(openai.contains(&"gpt-4o"));
        assert!(openai.contains(&"o1"));
        assert_eq!(models_for(Provider::Claude).len(), CLAUDE_MODELS.len());
    }
}
