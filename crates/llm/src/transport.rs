use async_trait::async_trait;
use cardsmith_common::{CardsmithError, Result};
use futures::StreamExt;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::sse::{decode_events, EventStream};

/// JSON POST request issued by a provider adapter
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
    /// Whole-request time budget (transport default when `None`)
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
            timeout: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP seam between adapters and the network
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and parse the full JSON response
    async fn post_json(&self, request: HttpRequest) -> Result<Value>;

    /// Send the request and decode the response body as server-sent events
    async fn post_stream(&self, request: HttpRequest) -> Result<EventStream>;
}

/// reqwest based transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create new transport
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
        Ok(Self { client })
    }

    async fn send(&self, request: HttpRequest) -> Result<reqwest::Response> {
        let timeout = request.timeout;
        debug!("POST {} (timeout: {:?})", request.url, timeout);

        let mut builder = self.client.post(&request.url).json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CardsmithError::transport(format!("HTTP {}: {}", status, body)));
        }

        Ok(response)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, request: HttpRequest) -> Result<Value> {
        let timeout = request.timeout;
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))
    }

    async fn post_stream(&self, request: HttpRequest) -> Result<EventStream> {
        let timeout = request.timeout;
        let response = self.send(request).await?;
        let body = response.bytes_stream().map(move |chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| map_reqwest_error(e, timeout))
        });
        Ok(decode_events(body))
    }
}

fn map_reqwest_error(error: reqwest::Error, timeout: Option<Duration>) -> CardsmithError {
    if error.is_timeout() {
        CardsmithError::ProviderTimeout(timeout.unwrap_or_default())
    } else if error.is_decode() {
        CardsmithError::transport(format!("Malformed response: {}", error))
    } else {
        CardsmithError::transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::new("https://example.test/v1", json!({"a": 1}))
            .header("x-api-key", "secret")
            .timeout(Duration::from_secs(60));
        assert_eq!(request.headers, vec![("x-api-key".to_string(), "secret".to_string())]);
        assert_eq!(request.timeout, Some(Duration::from_secs(60)));
        assert_eq!(request.body["a"], 1);
    }

    #[test]
    fn test_transport_creation() {
        assert!(ReqwestTransport::new().is_ok());
    }

    /// Serve one connection: read the request head, then write `response` (if any)
    async fn serve_once(response: Option<&'static str>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            match response {
                Some(response) => {
                    socket.write_all(response.as_bytes()).await.unwrap();
                    let _ = socket.shutdown().await;
                }
                // Hold the connection open without answering
                None => tokio::time::sleep(Duration::from_secs(5)).await,
            }
        });
        format!("http://{}/v1", addr)
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        let url = serve_once(None).await;
        let transport = ReqwestTransport::new().unwrap();
        let request = HttpRequest::new(url, json!({})).timeout(Duration::from_millis(200));

        let err = transport.post_json(request).await.unwrap_err();
        match &err {
            CardsmithError::ProviderTimeout(budget) => {
                assert_eq!(*budget, Duration::from_millis(200))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_provider_failure());
        assert!(err.to_string().contains("200ms"));
    }

    #[tokio::test]
    async fn test_error_status_keeps_body() {
        let url = serve_once(Some(
            "HTTP/1.1 401 Unauthorized\r\ncontent-length: 5\r\nconnection: close\r\n\r\nnokey",
        ))
        .await;
        let transport = ReqwestTransport::new().unwrap();

        let err = transport
            .post_json(HttpRequest::new(url, json!({})))
            .await
            .unwrap_err();
        match err {
            CardsmithError::ProviderTransport(message) => {
                assert!(message.contains("401"), "{message}");
                assert!(message.ends_with("nokey"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stream_body_is_decoded_as_events() {
        let url = serve_once(Some(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n\
             event: content_block_delta\ndata: {\"n\":1}\n\n\
             data: [DONE]\n\n",
        ))
        .await;
        let transport = ReqwestTransport::new().unwrap();

        let events: Vec<_> = transport
            .post_stream(HttpRequest::new(url, json!({"stream": true})))
            .await
            .unwrap()
            .collect()
            .await;
        let events: Vec<_> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event.as_deref(), Some("content_block_delta"));
        assert_eq!(events[0].data, "{\"n\":1}");
        assert_eq!(events[1].data, "[DONE]");
    }
}
