use cardsmith_common::{CardsmithError, Preset, Provider, Result, Settings};
use futures::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::adapter::{create_adapter, ProviderAdapter};
use crate::preset::PresetRun;
use crate::prompts::system_prompt;
use crate::transport::Transport;
use crate::types::{CompletionCall, FragmentStream, GenerationRequest, TextFragment};

static HTML_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--.*-->\n?").expect("valid HTML comment pattern"));

/// Remove `<!-- ... -->` annotations (and one trailing newline) from note text
pub fn strip_comments(text: &str) -> String {
    HTML_COMMENT.replace_all(text, "").into_owned()
}

/// Receiver of generated fragments (the document being written)
pub trait FragmentSink {
    /// Called once per fragment, in emission order
    fn fragment(&mut self, fragment: &TextFragment) -> Result<()>;

    /// Called before a preset item's fragments
    fn begin_batch(&mut self, _index: usize, _label: &str) -> Result<()> {
        Ok(())
    }

    /// Called after a preset item's fragments were all relayed
    fn end_batch(&mut self, _index: usize) -> Result<()> {
        Ok(())
    }
}

impl FragmentSink for String {
    fn fragment(&mut self, fragment: &TextFragment) -> Result<()> {
        self.push_str(fragment.as_str());
        Ok(())
    }
}

/// Drain a fragment stream into a sink, returning the number of fragments
pub async fn relay<S: FragmentSink + ?Sized>(mut fragments: FragmentStream, sink: &mut S) -> Result<usize> {
    let mut count = 0;
    while let Some(fragment) = fragments.next().await {
        sink.fragment(&fragment?)?;
        count += 1;
    }
    Ok(count)
}

/// Flashcard generation pipeline
pub struct FlashcardGenerator {
    openai: Arc<dyn ProviderAdapter>,
    claude: Arc<dyn ProviderAdapter>,
}

impl FlashcardGenerator {
    /// Create generator using the endpoints configured in settings
    pub fn new(transport: Arc<dyn Transport>, settings: &Settings) -> Self {
        Self::with_base_urls(transport, &settings.openai_base_url, &settings.claude_base_url)
    }

    /// Create generator with explicit endpoints
    pub fn with_base_urls(transport: Arc<dyn Transport>, openai_url: &str, claude_url: &str) -> Self {
        Self {
            openai: create_adapter(Provider::OpenAi, transport.clone(), openai_url),
            claude: create_adapter(Provider::Claude, transport, claude_url),
        }
    }

    /// Adapter serving a provider
    pub fn adapter(&self, provider: Provider) -> &Arc<dyn ProviderAdapter> {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Claude => &self.claude,
        }
    }

    /// Start one generation and return its fragment stream
    ///
    /// Configuration and model errors are raised here, before any request is
    /// sent. Provider failures surface either here or from the stream.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<FragmentStream> {
        if request.api_key.trim().is_empty() {
            return Err(CardsmithError::configuration(format!(
                "{} API key is not set",
                request.provider
            )));
        }
        if request.model.trim().is_empty() {
            return Err(CardsmithError::configuration("No model selected"));
        }

        let adapter = self.adapter(request.provider);
        adapter.validate_model(&request.model)?;

        let user_text = strip_comments(&request.text);
        let system_prompt = system_prompt(
            request.flashcard_type,
            request.count,
            &request.additional_instructions,
        );

        info!(
            "Generating {} {} flashcards with {} ({})",
            request.count, request.flashcard_type, request.provider, request.model
        );
        debug!(
            "Prompt length: {} chars, note length: {} chars, stream: {}",
            system_prompt.len(),
            user_text.len(),
            request.stream
        );

        adapter
            .complete(CompletionCall {
                api_key: request.api_key.clone(),
                model: request.model.clone(),
                system_prompt,
                user_text,
                max_tokens: request.max_tokens,
                stream: request.stream,
            })
            .await
    }

    /// Run a preset item by item on top of a base request
    pub fn preset_run<'g>(&'g self, preset: &'g Preset, base: GenerationRequest) -> PresetRun<'g> {
        PresetRun::new(self, preset, base)
    }
}
