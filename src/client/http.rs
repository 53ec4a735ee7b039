//! reqwest-backed transport

use async_trait::async_trait;
use reqwest::Client;

use super::{HttpRequest, RawResponse, Transport};
use crate::error::ApiError;

/// Transport over a shared reqwest client.
///
/// No request timeout is set: an unresponsive backend is bounded only by the
/// retry budget or by the caller cancelling.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("hallbook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &HttpRequest) -> Result<RawResponse, ApiError> {
        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());

        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(ApiError::from)?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::from)?;

        Ok(RawResponse { status, body })
    }
}
