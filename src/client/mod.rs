//! HTTP plumbing for the booking backend

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

use crate::error::ApiError;

pub mod http;
#[cfg(test)]
pub mod mock;
pub mod retry;

pub use http::HttpTransport;
pub use retry::{RetryPolicy, RetryingClient};

/// A fully built request, ready to go on the wire
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Status and body text of a response, before any decoding
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: body.into(),
        }
    }
}

/// Sends one request and returns whatever came back.
///
/// Only failures to get a response at all are errors here; HTTP error
/// statuses are returned as responses and classified by [`RetryingClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<RawResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &HttpRequest) -> Result<RawResponse, ApiError> {
        (**self).send(request).await
    }
}
