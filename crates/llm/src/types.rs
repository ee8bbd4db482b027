use cardsmith_common::{FlashcardType, Provider, Result, Settings, DEFAULT_FLASHCARDS_COUNT};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Everything needed to generate one batch of flashcards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Note text the cards are generated from
    pub text: String,

    /// Provider backend
    pub provider: Provider,

    /// API key for the provider
    pub api_key: String,

    /// Model name (e.g., "gpt-4o", "claude-sonnet-4-5-20250929")
    pub model: String,

    /// Template selector
    pub flashcard_type: FlashcardType,

    /// Number of cards the model is asked for
    pub count: u32,

    /// Free-text instructions appended to the system prompt
    pub additional_instructions: String,

    /// Maximum output tokens
    pub max_tokens: u32,

    /// Stream tokens as they arrive
    pub stream: bool,
}

impl GenerationRequest {
    /// Build a request from effective settings
    ///
    /// Count and token values go through the settings fallback, so invalid
    /// persisted numbers never reach the provider.
    pub fn from_settings(settings: &Settings, text: impl Into<String>) -> Result<Self> {
        settings.ensure_credentials()?;

        Ok(Self {
            text: text.into(),
            provider: settings.provider,
            api_key: settings.api_key().to_string(),
            model: settings.model().to_string(),
            flashcard_type: settings.flashcard_type,
            count: settings.effective_count(),
            additional_instructions: settings.additional_prompt.clone(),
            max_tokens: settings.effective_max_tokens(),
            stream: settings.streaming,
        })
    }

    /// Copy of this request targeting another type and count
    ///
    /// A zero count falls back to the default, like the settings count.
    pub fn for_item(&self, flashcard_type: FlashcardType, count: u32) -> Self {
        let count = if count == 0 {
            warn!(
                "Preset item count must be positive, using default {}",
                DEFAULT_FLASHCARDS_COUNT
            );
            DEFAULT_FLASHCARDS_COUNT
        } else {
            count
        };
        Self {
            flashcard_type,
            count,
            ..self.clone()
        }
    }
}

/// Provider-neutral completion call handed to an adapter
#[derive(Debug, Clone)]
pub struct CompletionCall {
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
    pub user_text: String,
    pub max_tokens: u32,
    pub stream: bool,
}

/// One unit of generated output
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
}

impl TextFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for TextFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for TextFragment {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TextFragment {
    fn from(text: String) -> Self {
        Self { text }
    }
}

/// Lazily produced, single-pass fragment sequence
pub type FragmentStream = BoxStream<'static, Result<TextFragment>>;
