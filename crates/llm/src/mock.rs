//! In-memory transport for tests

use async_trait::async_trait;
use cardsmith_common::{CardsmithError, Result};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::sse::{EventStream, SseEvent};
use crate::transport::{HttpRequest, Transport};

/// Canned reply served by the mock
#[derive(Debug, Clone)]
pub enum MockReply {
    Json(Value),
    Events(Vec<SseEvent>),
    Fail(String),
}

/// Transport that records requests and serves queued replies in order
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<HttpRequest>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a full JSON response
    pub fn with_json(self, value: Value) -> Self {
        self.push(MockReply::Json(value));
        self
    }

    /// Queue a server-sent event stream
    pub fn with_events(self, events: Vec<SseEvent>) -> Self {
        self.push(MockReply::Events(events));
        self
    }

    /// Queue a transport failure
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(MockReply::Fail(message.into()));
        self
    }

    pub fn push(&self, reply: MockReply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    /// Number of requests sent so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most recent request
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().ok()?.last().cloned()
    }

    /// All requests in send order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn next_reply(&self, request: HttpRequest) -> Result<MockReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .ok_or_else(|| CardsmithError::transport("No mock reply queued"))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(&self, request: HttpRequest) -> Result<Value> {
        match self.next_reply(request)? {
            MockReply::Json(value) => Ok(value),
            MockReply::Events(_) => Err(CardsmithError::transport("Mock reply is a stream")),
            MockReply::Fail(message) => Err(CardsmithError::transport(message)),
        }
    }

    async fn post_stream(&self, request: HttpRequest) -> Result<EventStream> {
        match self.next_reply(request)? {
            MockReply::Events(events) => Ok(stream::iter(events.into_iter().map(Ok)).boxed()),
            MockReply::Json(_) => Err(CardsmithError::transport("Mock reply is not a stream")),
            MockReply::Fail(message) => Err(CardsmithError::transport(message)),
        }
    }
}
