//! Cardsmith LLM Integration
//!
//! Prompt templates, provider adapters and the flashcard generation pipeline

mod adapter;
mod anthropic;
mod generator;
mod models;
mod openai;
mod preset;
mod prompts;
mod sse;
mod transport;
mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use adapter::{create_adapter, ProviderAdapter};
pub use anthropic::{AnthropicAdapter, ANTHROPIC_VERSION};
pub use generator::{relay, strip_comments, FlashcardGenerator, FragmentSink};
pub use models::{
    models_for, openai_capability, ModelCapability, CLAUDE_MODELS, OPENAI_CHAT_MODELS,
    OPENAI_REASONING_MODELS,
};
pub use openai::{OpenAiAdapter, OPENAI_TIMEOUT};
pub use preset::{PresetBatch, PresetRun, PresetSummary};
pub use prompts::{select_template, select_template_by_label, system_prompt, with_additional_instructions};
pub use sse::{decode_events, EventStream, SseDecoder, SseEvent};
pub use transport::{HttpRequest, ReqwestTransport, Transport};
pub use types::{CompletionCall, FragmentStream, GenerationRequest, TextFragment};

pub use cardsmith_common::{FlashcardType, Preset, PresetItem, Provider};
