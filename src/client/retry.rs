//! Bounded retries with exponential backoff
//!
//! One logical request becomes at most `max_attempts` network attempts.
//! Server errors and network failures are retried after
//! `base_delay * 2^attempt_index`; client errors, an expired session and
//! undecodable bodies fail on the spot since repeating them cannot help.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use reqwest::StatusCode;
use serde_json::Value;

use super::{HttpRequest, RawResponse, Transport};
use crate::config::RetryConfig;
use crate::error::ApiError;
use crate::session::AuthProvider;

/// Attempt budget and backoff base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay(),
        }
    }
}

impl RetryPolicy {
    /// Wait after the failed attempt with index `attempt_index`
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt_index))
    }
}

/// Result of classifying one attempt
enum Attempt {
    Done(Option<Value>),
    Retry(ApiError),
    Fail(ApiError),
}

/// Executes requests with retries, session teardown on 401, and body decoding
pub struct RetryingClient<T: Transport> {
    transport: T,
    policy: RetryPolicy,
    auth: Arc<dyn AuthProvider>,
    login_endpoint: String,
}

impl<T: Transport> RetryingClient<T> {
    pub fn new(
        transport: T,
        policy: RetryPolicy,
        auth: Arc<dyn AuthProvider>,
        login_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            policy,
            auth,
            login_endpoint: login_endpoint.into(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    /// Whether `endpoint` is the login endpoint (query string ignored)
    pub fn is_login_endpoint(&self, endpoint: &str) -> bool {
        let path = endpoint.split('?').next().unwrap_or(endpoint);
        path.trim_matches('/') == self.login_endpoint.trim_matches('/')
    }

    /// Send `request` for `endpoint`, retrying transient failures.
    ///
    /// Returns the decoded body with any `data` envelope removed, or `None`
    /// when the response carried no body.
    pub async fn execute(
        &self,
        endpoint: &str,
        request: &HttpRequest,
    ) -> Result<Option<Value>, ApiError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..max_attempts {
            debug!(
                "{} {} (attempt {}/{})",
                request.method,
                endpoint,
                attempt + 1,
                max_attempts
            );

            let outcome = match self.transport.send(request).await {
                Ok(response) => self.classify(endpoint, response),
                Err(err) if err.is_retryable() => Attempt::Retry(err),
                Err(err) => Attempt::Fail(err),
            };

            match outcome {
                Attempt::Done(value) => return Ok(value),
                Attempt::Fail(err) => {
                    debug!("{} {} failed: {}", request.method, endpoint, err);
                    return Err(err);
                }
                Attempt::Retry(err) => {
                    if attempt + 1 < max_attempts {
                        let delay = self.policy.delay_for(attempt);
                        warn!(
                            "{} {} failed ({}), retrying in {:?}",
                            request.method, endpoint, err, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        let last = last_error.unwrap_or_else(|| ApiError::Network("no attempt made".to_string()));
        error!(
            "{} {} failed after {} attempts: {}",
            request.method,
            endpoint,
            max_attempts,
            last
        );
        Err(ApiError::RequestFailed {
            attempts: max_attempts,
            last: Box::new(last),
        })
    }

    fn classify(&self, endpoint: &str, response: RawResponse) -> Attempt {
        let status = response.status;
        match status {
            StatusCode::NO_CONTENT => Attempt::Done(None),
            status if status.is_success() => match decode_body(&response.body) {
                Ok(value) => Attempt::Done(value),
                Err(err) => Attempt::Fail(err),
            },
            StatusCode::UNAUTHORIZED if !self.is_login_endpoint(endpoint) => {
                warn!("{} returned 401, ending session", endpoint);
                self.auth.teardown();
                Attempt::Fail(ApiError::Unauthorized)
            }
            status if status.is_client_error() => Attempt::Fail(ApiError::Client {
                status: status.as_u16(),
                message: error_message(status, &response.body),
            }),
            status if status.is_server_error() => Attempt::Retry(ApiError::Server {
                status: status.as_u16(),
                message: error_message(status, &response.body),
            }),
            status => Attempt::Fail(ApiError::InvalidResponse(format!(
                "Unexpected status code: {}",
                status
            ))),
        }
    }
}

/// Decode a success body, unwrapping a `{ "data": ... }` envelope
fn decode_body(body: &str) -> Result<Option<Value>, ApiError> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    match value {
        Value::Object(mut envelope) if envelope.contains_key("data") => {
            Ok(envelope.remove("data"))
        }
        other => Ok(Some(other)),
    }
}

/// Server-provided message: a JSON `message`/`error` field, else the raw text
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for field in ["message", "error"] {
            if let Some(Value::String(msg)) = map.get(field) {
                return msg.clone();
            }
        }
    }

    let text = body.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        text.to_string()
    }
}
