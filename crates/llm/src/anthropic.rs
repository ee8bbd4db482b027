use async_stream::try_stream;
use async_trait::async_trait;
use cardsmith_common::{CardsmithError, Provider, Result};
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::adapter::ProviderAdapter;
use crate::models::DEFAULT_TEMPERATURE;
use crate::transport::{HttpRequest, Transport};
use crate::types::{CompletionCall, FragmentStream, TextFragment};

/// Messages API version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic-compatible messages adapter
pub struct AnthropicAdapter {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    fn build_body(&self, call: &CompletionCall) -> Value {
        json!({
            "model": call.model,
            "max_tokens": call.max_tokens,
            "temperature": DEFAULT_TEMPERATURE,
            "system": call.system_prompt,
            "messages": [
                { "role": "user", "content": call.user_text }
            ],
            "stream": call.stream,
        })
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> Provider {
        Provider::Claude
    }

    async fn complete(&self, call: CompletionCall) -> Result<FragmentStream> {
        debug!(
            "Claude request - Model: {}, Stream: {}, Max tokens: {}",
            call.model, call.stream, call.max_tokens
        );

        // No explicit timeout: the transport default applies
        let request = HttpRequest::new(format!("{}/messages", self.base_url), self.build_body(&call))
            .header("x-api-key", call.api_key.as_str())
            .header("anthropic-version", ANTHROPIC_VERSION);

        if !call.stream {
            let response = self.transport.post_json(request).await?;
            return first_text_block(&response);
        }

        let mut events = self.transport.post_stream(request).await?;
        let fragments = try_stream! {
            while let Some(event) = events.next().await {
                let event = event?;
                let payload: Value = serde_json::from_str(&event.data).map_err(|e| {
                    CardsmithError::transport(format!("Failed to parse stream payload: {}", e))
                })?;

                match payload.get("type").and_then(Value::as_str) {
                    Some("content_block_delta") => {
                        if let Some(text) = text_delta(&payload) {
                            yield TextFragment::new(text);
                        }
                    }
                    Some("error") => {
                        Err(CardsmithError::transport(format!(
                            "Claude stream error: {}",
                            payload.get("error").unwrap_or(&Value::Null)
                        )))?;
                    }
                    _ => {}
                }
            }
        };

        Ok(fragments.boxed())
    }
}

/// Fragments for a non-streaming response: the first block's text, if it is a text block
fn first_text_block(response: &Value) -> Result<FragmentStream> {
    let blocks = response
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| CardsmithError::transport("Malformed response: missing content"))?;

    let text = blocks.first().and_then(|block| {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => block.get("text").and_then(Value::as_str).map(str::to_string),
            _ => None,
        }
    });

    Ok(match text {
        Some(text) => stream::once(async move { Ok(TextFragment::new(text)) }).boxed(),
        None => stream::empty().boxed(),
    })
}

fn text_delta(payload: &Value) -> Option<&str> {
    let delta = payload.get("delta")?;
    if delta.get("type").and_then(Value::as_str) != Some("text_delta") {
        return None;
    }
    delta.get("text").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::sse::SseEvent;

    fn call(stream: bool) -> CompletionCall {
        CompletionCall {
            api_key: "sk-ant-test".to_string(),
            model: "claude-sonnet-4-5-20250929".to_string(),
            system_prompt: "system".to_string(),
            user_text: "note".to_string(),
            max_tokens: 512,
            stream,
        }
    }

    async fn texts(stream: FragmentStream) -> Vec<String> {
        stream.map(|f| f.unwrap().text).collect().await
    }

    #[tokio::test]
    async fn test_request_shape() {
        let transport = Arc::new(MockTransport::new().with_json(json!({
            "content": [{ "type": "text", "text": "START\nBasic\nQ\nBack: A\nEND" }]
        })));
        let adapter = AnthropicAdapter::new(transport.clone(), "http://mock");

        let fragments = texts(adapter.complete(call(false)).await.unwrap()).await;
        assert_eq!(fragments, vec!["START\nBasic\nQ\nBack: A\nEND"]);

        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "http://mock/messages");
        assert_eq!(request.timeout, None);
        assert!(request
            .headers
            .contains(&("x-api-key".to_string(), "sk-ant-test".to_string())));
        assert!(request
            .headers
            .contains(&("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string())));
        assert_eq!(request.body["system"], "system");
        assert_eq!(request.body["max_tokens"], json!(512));
        assert_eq!(request.body["temperature"], json!(0.7));
        assert_eq!(request.body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(request.body["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_non_text_first_block_yields_nothing() {
        let transport = Arc::new(MockTransport::new().with_json(json!({
            "content": [
                { "type": "tool_use", "id": "toolu_1", "name": "x", "input": {} },
                { "type": "text", "text": "ignored" }
            ]
        })));
        let adapter = AnthropicAdapter::new(transport, "http://mock");

        let fragments = texts(adapter.complete(call(false)).await.unwrap()).await;
        assert!(fragments.is_empty());
    }

    #[tokio::test]
    async fn test_missing_content_is_transport_error() {
        let transport = Arc::new(MockTransport::new().with_json(json!({ "id": "msg_1" })));
        let adapter = AnthropicAdapter::new(transport, "http://mock");

        let result = adapter.complete(call(false)).await;
        assert!(matches!(result, Err(CardsmithError::ProviderTransport(_))));
    }

    #[tokio::test]
    async fn test_stream_only_text_deltas() {
        let transport = Arc::new(MockTransport::new().with_events(vec![
            SseEvent::new(Some("message_start"), r#"{"type":"message_start","message":{}}"#),
            SseEvent::new(Some("content_block_start"), r#"{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#),
            SseEvent::new(Some("ping"), r#"{"type":"ping"}"#),
            SseEvent::new(Some("content_block_delta"), r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"START\n"}}"#),
            SseEvent::new(Some("content_block_delta"), r#"{"type":"content_block_delta","index":0,"delta":{"type":"input_json_delta","partial_json":"{}"}}"#),
            SseEvent::new(Some("content_block_delta"), r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Cloze\n"}}"#),
            SseEvent::new(Some("content_block_delta"), r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"END"}}"#),
            SseEvent::new(Some("message_stop"), r#"{"type":"message_stop"}"#),
        ]));
        let adapter = AnthropicAdapter::new(transport, "http://mock");

        let fragments = texts(adapter.complete(call(true)).await.unwrap()).await;
        assert_eq!(fragments, vec!["START\n", "Cloze\n", "END"]);
    }

    #[tokio::test]
    async fn test_stream_error_event_fails() {
        let transport = Arc::new(MockTransport::new().with_events(vec![SseEvent::new(
            Some("error"),
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        )]));
        let adapter = AnthropicAdapter::new(transport, "http://mock");

        let results: Vec<Result<TextFragment>> =
            adapter.complete(call(true)).await.unwrap().collect().await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(CardsmithError::ProviderTransport(_))));
    }
}
