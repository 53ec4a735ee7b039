//! Test doubles for the transport and session
//!
//! Script responses on a [`MockTransport`], hand it to the code under test
//! behind an `Arc`, then assert on call counts and captured requests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Instant;

use super::{HttpRequest, RawResponse, Transport};
use crate::error::ApiError;
use crate::session::AuthProvider;

/// Mock transport replaying scripted responses in order.
///
/// # Example
/// ```ignore
/// let transport = Arc::new(
///     MockTransport::new()
///         .respond(500, "boom")
///         .respond(200, r#"{"data": []}"#),
/// );
/// ```
#[derive(Default)]
pub struct MockTransport {
    /// Responses consumed one per call
    script: Mutex<VecDeque<Result<RawResponse, ApiError>>>,
    /// Response repeated once the script runs out
    fallback: Mutex<Option<RawResponse>>,
    /// Every request seen, with the (possibly paused) clock time it arrived
    captured: Mutex<Vec<(Instant, HttpRequest)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body
    pub fn respond(self, status: u16, body: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(RawResponse::new(status, body)));
        self
    }

    /// Queue a connection-level failure
    pub fn fail_network(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(ApiError::Network(message.to_string())));
        self
    }

    /// Answer every unscripted call with this response
    pub fn always(self, status: u16, body: &str) -> Self {
        *self.fallback.lock().unwrap() = Some(RawResponse::new(status, body));
        self
    }

    pub fn call_count(&self) -> usize {
        self.captured.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.captured
            .lock()
            .unwrap()
            .iter()
            .map(|(_, req)| req.clone())
            .collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.captured
            .lock()
            .unwrap()
            .iter()
            .map(|(at, _)| *at)
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &HttpRequest) -> Result<RawResponse, ApiError> {
        // Suspend once so concurrent callers are all in flight before any resolves
        tokio::task::yield_now().await;

        self.captured
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));

        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        match self.fallback.lock().unwrap().clone() {
            Some(response) => Ok(response),
            None => Err(ApiError::Network("mock script exhausted".to_string())),
        }
    }
}

/// In-memory session that counts teardowns
#[derive(Default)]
pub struct MockSession {
    token: Mutex<Option<String>>,
    teardowns: AtomicUsize,
}

impl MockSession {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
            teardowns: AtomicUsize::new(0),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn teardown_count(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

impl AuthProvider for MockSession {
    fn auth_header(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap()
            .as_ref()
            .map(|t| format!("Bearer {}", t))
    }

    fn teardown(&self) {
        *self.token.lock().unwrap() = None;
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}
