use async_stream::try_stream;
use async_trait::async_trait;
use cardsmith_common::{CardsmithError, Provider, Result};
use futures::stream::{self, StreamExt};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::adapter::ProviderAdapter;
use crate::models::{openai_capability, ModelCapability};
use crate::transport::{HttpRequest, Transport};
use crate::types::{CompletionCall, FragmentStream, TextFragment};

/// Whole-request time budget for OpenAI-compatible calls
pub const OPENAI_TIMEOUT: Duration = Duration::from_secs(60);

const STREAM_DONE: &str = "[DONE]";

/// OpenAI-compatible chat completions adapter
pub struct OpenAiAdapter {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl OpenAiAdapter {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    fn capability(&self, model: &str) -> Result<ModelCapability> {
        openai_capability(model).ok_or_else(|| CardsmithError::invalid_model(model))
    }

    /// Build the chat completion body
    fn build_body(&self, call: &CompletionCall, capability: ModelCapability) -> Value {
        let mut body = Map::new();
        body.insert("model".to_string(), json!(call.model));
        body.insert("max_completion_tokens".to_string(), json!(call.max_tokens));
        body.insert("frequency_penalty".to_string(), json!(0));
        body.insert("presence_penalty".to_string(), json!(0));
        body.insert("top_p".to_string(), json!(1.0));
        capability.apply_sampling(&mut body);
        body.insert(
            "messages".to_string(),
            json!([
                { "role": "system", "content": call.system_prompt },
                { "role": "user", "content": call.user_text },
            ]),
        );
        body.insert("response_format".to_string(), json!({ "type": "text" }));
        body.insert("stream".to_string(), json!(call.stream));
        Value::Object(body)
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn validate_model(&self, model: &str) -> Result<()> {
        self.capability(model).map(|_| ())
    }

    async fn complete(&self, call: CompletionCall) -> Result<FragmentStream> {
        let capability = self.capability(&call.model)?;
        let body = self.build_body(&call, capability);

        debug!(
            "OpenAI request - Model: {}, Capability: {:?}, Stream: {}, Max tokens: {}",
            call.model, capability, call.stream, call.max_tokens
        );

        let request = HttpRequest::new(format!("{}/chat/completions", self.base_url), body)
            .header("Authorization", format!("Bearer {}", call.api_key))
            .timeout(OPENAI_TIMEOUT);

        if !call.stream {
            let response = self.transport.post_json(request).await?;
            return Ok(single_response(&response));
        }

        let mut events = self.transport.post_stream(request).await?;
        let fragments = try_stream! {
            while let Some(event) = events.next().await {
                let event = event?;
                if event.data.trim() == STREAM_DONE {
                    break;
                }
                let chunk: Value = serde_json::from_str(&event.data).map_err(|e| {
                    CardsmithError::transport(format!("Failed to parse stream payload: {}", e))
                })?;
                if let Some(error) = chunk.get("error") {
                    Err(CardsmithError::transport(format!("OpenAI stream error: {}", error)))?;
                }
                yield TextFragment::new(delta_text(&chunk));
            }
        };

        Ok(fragments.boxed())
    }
}

/// Fragments for a non-streaming response
///
/// The trimmed message text is emitted even when empty; an empty or missing
/// message then fails the sequence with an empty-response error.
fn single_response(response: &Value) -> FragmentStream {
    let content = response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    if content.is_empty() {
        return stream::iter(vec![
            Ok(TextFragment::default()),
            Err(CardsmithError::empty_response(Provider::OpenAi.display_name())),
        ])
        .boxed();
    }

    stream::once(async move { Ok(TextFragment::new(content)) }).boxed()
}

/// Incremental text carried by a stream chunk (empty when absent)
fn delta_text(chunk: &Value) -> &str {
    chunk
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
}
