use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CardsmithError;

/// Language-model provider backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI-compatible chat completions API
    #[serde(alias = "OpenAI")]
    OpenAi,
    /// Anthropic-compatible messages API
    #[serde(alias = "anthropic")]
    Claude,
}

impl Provider {
    /// Identifier used in settings and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Claude => "claude",
        }
    }

    /// Human readable provider name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Claude => "Claude",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = CardsmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "claude" | "anthropic" => Ok(Self::Claude),
            other => Err(CardsmithError::configuration(format!(
                "Unknown provider '{}', expected 'openai' or 'claude'",
                other
            ))),
        }
    }
}

/// Flashcard type selecting a prompt template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlashcardType {
    #[default]
    #[serde(rename = "Basic")]
    Basic,
    #[serde(rename = "Basic (and reversed card)", alias = "BasicReversed")]
    BasicReversed,
    #[serde(rename = "Cloze")]
    Cloze,
    #[serde(rename = "Basic (Cantonese)", alias = "BasicCantonese")]
    BasicCantonese,
    #[serde(rename = "Cloze (Cantonese)", alias = "ClozeCantonese")]
    ClozeCantonese,
    #[serde(rename = "Sentence (Cantonese)", alias = "SentenceCantonese")]
    SentenceCantonese,
}

impl FlashcardType {
    /// All flashcard types in menu order
    pub const ALL: [FlashcardType; 6] = [
        Self::Basic,
        Self::BasicReversed,
        Self::Cloze,
        Self::BasicCantonese,
        Self::ClozeCantonese,
        Self::SentenceCantonese,
    ];

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::BasicReversed => "Basic (and reversed card)",
            Self::Cloze => "Cloze",
            Self::BasicCantonese => "Basic (Cantonese)",
            Self::ClozeCantonese => "Cloze (Cantonese)",
            Self::SentenceCantonese => "Sentence (Cantonese)",
        }
    }

    /// Short identifier usable on the command line
    pub fn key(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::BasicReversed => "basic-reversed",
            Self::Cloze => "cloze",
            Self::BasicCantonese => "basic-cantonese",
            Self::ClozeCantonese => "cloze-cantonese",
            Self::SentenceCantonese => "sentence-cantonese",
        }
    }

    /// Resolve any label, falling back to Basic for unknown values
    ///
    /// Separator strings from older settings (e.g. "?") land here too.
    pub fn resolve(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for FlashcardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FlashcardType {
    type Err = CardsmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| {
                t.label().eq_ignore_ascii_case(wanted)
                    || t.key().eq_ignore_ascii_case(wanted)
                    || format!("{:?}", t).eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| {
                CardsmithError::configuration(format!("Unknown flashcard type '{}'", wanted))
            })
    }
}

/// One step of a preset: generate `count` cards of `flashcard_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetItem {
    pub flashcard_type: FlashcardType,
    pub count: u32,
}

impl PresetItem {
    pub fn new(flashcard_type: FlashcardType, count: u32) -> Self {
        Self {
            flashcard_type,
            count,
        }
    }

    /// Label used in logs and batch errors
    pub fn label(&self) -> String {
        format!("{} x{}", self.flashcard_type, self.count)
    }
}

/// Named, ordered list of preset items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Stable identifier (generated when omitted)
    #[serde(default = "new_preset_id")]
    pub id: String,

    /// Display name
    pub name: String,

    /// Items processed in order
    #[serde(default)]
    pub items: Vec<PresetItem>,
}

fn new_preset_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Preset {
    /// Create new preset with a fresh identifier
    pub fn new(name: impl Into<String>, items: Vec<PresetItem>) -> Self {
        Self {
            id: new_preset_id(),
            name: name.into(),
            items,
        }
    }

    /// Total number of cards requested across all items
    pub fn total_cards(&self) -> u32 {
        self.items.iter().map(|item| item.count).sum()
    }
}
