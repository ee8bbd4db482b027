use crate::error::CardsmithError;
use crate::types::{FlashcardType, Preset, Provider};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Card count used when the configured value is unusable
pub const DEFAULT_FLASHCARDS_COUNT: u32 = 3;

/// Output token cap used when the configured value is unusable
pub const DEFAULT_MAX_TOKENS: u32 = 300;

/// Environment variable prefix for settings overrides
pub const ENV_PREFIX: &str = "CARDSMITH";

/// Cardsmith settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Selected provider
    pub provider: Provider,

    /// OpenAI API key
    pub openai_api_key: String,

    /// OpenAI model name
    pub openai_model: String,

    /// Claude API key
    pub claude_api_key: String,

    /// Claude model name
    pub claude_model: String,

    /// Default flashcard type
    pub flashcard_type: FlashcardType,

    /// Number of cards per generation (non-positive values fall back to 3)
    pub flashcards_count: i64,

    /// Free-text instructions appended to the prompt
    pub additional_prompt: String,

    /// Maximum output tokens (non-positive values fall back to 300)
    pub max_tokens: i64,

    /// Stream tokens as they arrive
    pub streaming: bool,

    /// Tag inserted before generated cards
    pub tag: String,

    /// OpenAI-compatible endpoint
    pub openai_base_url: String,

    /// Anthropic-compatible endpoint
    pub claude_base_url: String,

    /// Saved presets
    pub presets: Vec<Preset>,

    /// Log level
    pub log_level: String,

    /// Log directory (console only when unset)
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::Claude,
            openai_api_key: String::new(),
            openai_model: "gpt-4o".to_string(),
            claude_api_key: String::new(),
            claude_model: "claude-sonnet-4-5-20250929".to_string(),
            flashcard_type: FlashcardType::Basic,
            flashcards_count: DEFAULT_FLASHCARDS_COUNT as i64,
            additional_prompt: String::new(),
            max_tokens: DEFAULT_MAX_TOKENS as i64,
            streaming: true,
            tag: "#flashcards".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            claude_base_url: "https://api.anthropic.com/v1".to_string(),
            presets: Vec::new(),
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

/// Interactive overrides merged on top of persisted settings
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub flashcard_type: Option<FlashcardType>,
    pub flashcards_count: Option<i64>,
    pub additional_prompt: Option<String>,
    pub max_tokens: Option<i64>,
    pub streaming: Option<bool>,
    pub tag: Option<String>,
}

impl Settings {
    /// Load settings from defaults, an optional TOML file and `CARDSMITH_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self, CardsmithError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = config::Config::try_from(&Settings::default()).map_err(config_error)?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            if !path.exists() {
                return Err(CardsmithError::configuration(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            debug!("Loading settings file: {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        );

        let mut settings: Settings = builder
            .build()
            .map_err(config_error)?
            .try_deserialize()
            .map_err(config_error)?;

        settings.apply_key_fallbacks();
        settings.validate()?;

        Ok(settings)
    }

    /// Load settings from environment variables and .env file only
    pub fn from_env() -> Result<Self, CardsmithError> {
        Self::load(None)
    }

    /// Fill empty API keys from the providers' conventional variables
    fn apply_key_fallbacks(&mut self) {
        if self.openai_api_key.is_empty() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                self.openai_api_key = key;
            }
        }
        if self.claude_api_key.is_empty() {
            if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
                self.claude_api_key = key;
            }
        }
    }

    /// Merge interactive overrides, returning the effective settings
    pub fn with_overrides(&self, overrides: &Overrides) -> Self {
        let mut merged = self.clone();

        if let Some(provider) = overrides.provider {
            merged.provider = provider;
        }
        if let Some(model) = &overrides.model {
            match merged.provider {
                Provider::OpenAi => merged.openai_model = model.clone(),
                Provider::Claude => merged.claude_model = model.clone(),
            }
        }
        if let Some(flashcard_type) = overrides.flashcard_type {
            merged.flashcard_type = flashcard_type;
        }
        if let Some(count) = overrides.flashcards_count {
            merged.flashcards_count = count;
        }
        if let Some(extra) = &overrides.additional_prompt {
            merged.additional_prompt = extra.clone();
        }
        if let Some(max_tokens) = overrides.max_tokens {
            merged.max_tokens = max_tokens;
        }
        if let Some(streaming) = overrides.streaming {
            merged.streaming = streaming;
        }
        if let Some(tag) = &overrides.tag {
            merged.tag = tag.clone();
        }

        merged
    }

    /// API key for the selected provider
    pub fn api_key(&self) -> &str {
        match self.provider {
            Provider::OpenAi => &self.openai_api_key,
            Provider::Claude => &self.claude_api_key,
        }
    }

    /// Model for the selected provider
    pub fn model(&self) -> &str {
        match self.provider {
            Provider::OpenAi => &self.openai_model,
            Provider::Claude => &self.claude_model,
        }
    }

    /// Check that a generation can be dispatched with these settings
    pub fn ensure_credentials(&self) -> Result<(), CardsmithError> {
        if self.api_key().trim().is_empty() {
            return Err(CardsmithError::configuration(format!(
                "{} API key is not set in settings",
                self.provider
            )));
        }
        if self.model().trim().is_empty() {
            return Err(CardsmithError::configuration(
                "Please select a model to use in the settings",
            ));
        }
        Ok(())
    }

    /// Card count, falling back to the default for non-positive values
    pub fn effective_count(&self) -> u32 {
        positive_or_default(self.flashcards_count, DEFAULT_FLASHCARDS_COUNT, "flashcards_count")
    }

    /// Maximum output tokens, falling back to the default for non-positive values
    pub fn effective_max_tokens(&self) -> u32 {
        positive_or_default(self.max_tokens, DEFAULT_MAX_TOKENS, "max_tokens")
    }

    /// Find preset by id or name
    pub fn find_preset(&self, id_or_name: &str) -> Option<&Preset> {
        self.presets
            .iter()
            .find(|p| p.id == id_or_name)
            .or_else(|| self.presets.iter().find(|p| p.name.eq_ignore_ascii_case(id_or_name)))
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), CardsmithError> {
        if self.tag.trim().is_empty() {
            return Err(CardsmithError::configuration("Flashcards tag cannot be empty"));
        }

        for (name, url) in [
            ("openai_base_url", &self.openai_base_url),
            ("claude_base_url", &self.claude_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CardsmithError::configuration(format!(
                    "{} must start with http:// or https://",
                    name
                )));
            }
        }

        let mut seen = HashSet::new();
        for preset in &self.presets {
            if !seen.insert(preset.id.as_str()) {
                return Err(CardsmithError::configuration(format!(
                    "Duplicate preset id: {}",
                    preset.id
                )));
            }
        }

        Ok(())
    }
}

fn positive_or_default(value: i64, default: u32, field: &str) -> u32 {
    match u32::try_from(value) {
        Ok(v) if v > 0 => v,
        _ => {
            warn!(
                "Invalid {} value {}, defaulting to {}",
                field, value, default
            );
            default
        }
    }
}

fn config_error(e: config::ConfigError) -> CardsmithError {
    CardsmithError::configuration(format!("Failed to load settings: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PresetItem;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.provider, Provider::Claude);
        assert_eq!(settings.openai_model, "gpt-4o");
        assert_eq!(settings.effective_count(), 3);
        assert_eq!(settings.effective_max_tokens(), 300);
        assert_eq!(settings.tag, "#flashcards");
        assert!(settings.streaming);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let mut settings = Settings::default();
        settings.flashcards_count = 0;
        settings.max_tokens = -20;
        assert_eq!(settings.effective_count(), DEFAULT_FLASHCARDS_COUNT);
        assert_eq!(settings.effective_max_tokens(), DEFAULT_MAX_TOKENS);

        settings.max_tokens = 1024;
        assert_eq!(settings.effective_max_tokens(), 1024);
    }

    #[test]
    fn test_overrides_target_selected_provider() {
        let settings = Settings::default();
        let merged = settings.with_overrides(&Overrides {
            provider: Some(Provider::OpenAi),
            model: Some("gpt-4.1".to_string()),
            flashcards_count: Some(5),
            ..Default::default()
        });
        assert_eq!(merged.provider, Provider::OpenAi);
        assert_eq!(merged.model(), "gpt-4.1");
        assert_eq!(merged.claude_model, settings.claude_model);
        assert_eq!(merged.effective_count(), 5);
    }

    #[test]
    fn test_ensure_credentials() {
        let mut settings = Settings::default();
        settings.claude_api_key = String::new();
        assert!(matches!(
            settings.ensure_credentials(),
            Err(CardsmithError::Configuration(_))
        ));

        settings.claude_api_key = "sk-ant-test".to_string();
        assert!(settings.ensure_credentials().is_ok());

        settings.claude_model = String::new();
        assert!(settings.ensure_credentials().is_err());
    }

    #[test]
    fn test_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());

        let mut invalid = Settings::default();
        invalid.tag = " ".to_string();
        assert!(invalid.validate().is_err());

        let mut duplicated = Settings::default();
        let preset = Preset::new("A", vec![PresetItem::new(FlashcardType::Basic, 1)]);
        duplicated.presets = vec![preset.clone(), preset];
        assert!(duplicated.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
provider = "openai"
openai_api_key = "sk-file"
flashcards_count = 4

[[presets]]
id = "lang"
name = "Language drill"
items = [
    {{ flashcard_type = "Basic (Cantonese)", count = 2 }},
    {{ flashcard_type = "Cloze (Cantonese)", count = 3 }},
]
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.provider, Provider::OpenAi);
        assert_eq!(settings.api_key(), "sk-file");
        assert_eq!(settings.effective_count(), 4);
        assert_eq!(settings.max_tokens, 300);

        let preset = settings.find_preset("language drill").unwrap();
        assert_eq!(preset.id, "lang");
        assert_eq!(preset.items[1].flashcard_type, FlashcardType::ClozeCantonese);
        assert!(settings.find_preset("lang").is_some());
    }

    #[test]
    fn test_load_missing_file_is_configuration_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/cardsmith.toml")));
        assert!(matches!(result, Err(CardsmithError::Configuration(_))));
    }
}
