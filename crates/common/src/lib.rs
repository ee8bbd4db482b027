pub mod config;
pub mod error;
pub mod logger;
pub mod types;

// Re-export commonly used types
pub use config::{Overrides, Settings, DEFAULT_FLASHCARDS_COUNT, DEFAULT_MAX_TOKENS};
pub use error::CardsmithError;
pub use types::{FlashcardType, Preset, PresetItem, Provider};
pub type Result<T> = std::result::Result<T, CardsmithError>;
