//! Booking API service: auth, cache, retry and invalidation in one call
//!
//! Every caller goes through [`ApiService::request`]. Reads are answered from
//! the response cache when possible; successful writes evict whatever cached
//! reads they may have made stale.
//!
//! Concurrent reads of the same uncached key are not coalesced: each one
//! misses and goes to the network.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheStats, InvalidationOutcome, InvalidationRules, RequestKey, ResponseCache};
use crate::client::{HttpRequest, HttpTransport, RetryPolicy, RetryingClient, Transport};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::session::AuthProvider;

pub mod endpoints;

pub use endpoints::{ApprovalFilter, Resource};

/// Method, body and extra headers for one request. Defaults to a bare GET.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` as the JSON payload
    pub fn json<B: Serialize>(self, body: &B) -> Result<Self> {
        Ok(self.body(serde_json::to_value(body)?))
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn is_read(&self) -> bool {
        self.method == Method::GET
    }
}

/// Public entry point for talking to the booking backend.
///
/// Owns the response cache for its lifetime; construct one per session and
/// share it behind an `Arc`.
pub struct ApiService<T: Transport = HttpTransport> {
    base_url: String,
    client: RetryingClient<T>,
    cache: Mutex<ResponseCache>,
    rules: InvalidationRules,
}

impl ApiService<HttpTransport> {
    /// Service over the real HTTP transport
    pub fn from_config(config: &Config, auth: Arc<dyn AuthProvider>) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(HttpTransport::new()?, auth, config))
    }
}

impl<T: Transport> ApiService<T> {
    pub fn new(transport: T, auth: Arc<dyn AuthProvider>, config: &Config) -> Self {
        let policy = RetryPolicy::from(&config.retry);
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client: RetryingClient::new(transport, policy, auth, config.login_endpoint.clone()),
            cache: Mutex::new(ResponseCache::new()),
            rules: InvalidationRules::default(),
        }
    }

    /// Replace the invalidation table
    pub fn with_rules(mut self, rules: InvalidationRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform one logical request.
    ///
    /// Returns the decoded body (with any `data` envelope removed), or `None`
    /// for responses without a body.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Option<Value>> {
        let is_read = options.is_read();
        let key = RequestKey::new(endpoint);

        if is_read {
            let cached = self.cache().get(&key);
            if let Some(value) = cached {
                debug!("Cache hit: {}", endpoint);
                return Ok(Some(value));
            }
            debug!("Cache miss: {}", endpoint);
        }

        let request = self.build_request(endpoint, options)?;
        let result = self.client.execute(endpoint, &request).await?;

        if is_read {
            if let Some(ref value) = result {
                self.cache().set(key, value);
                debug!("Cached: {}", endpoint);
            }
        } else {
            self.rules.invalidate(endpoint, &mut self.cache());
        }

        Ok(result)
    }

    /// Like [`request`](Self::request), decoding the result into `R`
    pub async fn request_as<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Option<R>> {
        match self.request(endpoint, options).await? {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                ApiError::InvalidResponse(format!("Unexpected shape for {}: {}", endpoint, e))
                    .into()
            }),
            None => Ok(None),
        }
    }

    /// Like [`request`](Self::request), abandoned as soon as `cancel` fires.
    ///
    /// A write cancelled mid-flight may still have reached the server; its
    /// invalidation is skipped, so callers should refresh affected views.
    pub async fn request_cancellable(
        &self,
        endpoint: &str,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Cancelled: {}", endpoint);
                Err(ApiError::Cancelled.into())
            }
            result = self.request(endpoint, options) => result,
        }
    }

    pub async fn get(&self, endpoint: &str) -> Result<Option<Value>> {
        self.request(endpoint, RequestOptions::get()).await
    }

    pub async fn post(&self, endpoint: &str, body: Value) -> Result<Option<Value>> {
        self.request(endpoint, RequestOptions::post().body(body)).await
    }

    pub async fn put(&self, endpoint: &str, body: Value) -> Result<Option<Value>> {
        self.request(endpoint, RequestOptions::put().body(body)).await
    }

    pub async fn patch(&self, endpoint: &str, body: Value) -> Result<Option<Value>> {
        self.request(endpoint, RequestOptions::patch().body(body)).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Option<Value>> {
        self.request(endpoint, RequestOptions::delete()).await
    }

    /// Apply the invalidation rules for a write made outside this service
    pub fn invalidate(&self, endpoint: &str) -> InvalidationOutcome {
        self.rules.invalidate(endpoint, &mut self.cache())
    }

    pub fn clear_cache(&self) -> usize {
        self.cache().clear()
    }

    /// Copy of the cached value for `key`, without touching the network
    pub fn cached(&self, key: &str) -> Option<Value> {
        self.cache().get(&RequestKey::new(key))
    }

    pub fn cached_keys(&self) -> Vec<RequestKey> {
        self.cache().keys()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }

    /// End the session and forget everything cached under it
    pub fn logout(&self) {
        self.client.auth().teardown();
        let dropped = self.clear_cache();
        debug!("Logged out, dropped {} cached entries", dropped);
    }

    fn cache(&self) -> MutexGuard<'_, ResponseCache> {
        // Entries are plain values; a panic elsewhere cannot leave one half-written
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn build_request(&self, endpoint: &str, options: RequestOptions) -> Result<HttpRequest> {
        let auth = self.client.auth();
        let header = auth.auth_header();

        if header.is_none() && !self.client.is_login_endpoint(endpoint) {
            warn!("No session for {}, signing out", endpoint);
            auth.teardown();
            return Err(ApiError::Unauthorized.into());
        }

        let mut headers = options.headers;
        if let Some(header) = header {
            let value = HeaderValue::from_str(&header).map_err(|_| {
                ApiError::InvalidRequest("stored token is not a valid header value".to_string())
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let body = match options.body {
            Some(ref body) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                Some(serde_json::to_vec(body)?)
            }
            None => None,
        };

        Ok(HttpRequest {
            method: options.method,
            url: format!("{}/{}", self.base_url, endpoint.trim_start_matches('/')),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockSession, MockTransport};
    use crate::error::Error;
    use serde::Deserialize;
    use serde_json::json;

    fn service(
        transport: &Arc<MockTransport>,
        session: &Arc<MockSession>,
    ) -> ApiService<Arc<MockTransport>> {
        let config = Config {
            api_url: "http://halls.test/".to_string(),
            ..Config::default()
        };
        ApiService::new(transport.clone(), session.clone(), &config)
    }

    fn signed_in() -> Arc<MockSession> {
        Arc::new(MockSession::with_token("tok"))
    }

    #[tokio::test]
    async fn test_second_read_served_from_cache() {
        let transport = Arc::new(
            MockTransport::new().respond(200, r#"{"data": [{"id": 1, "name": "Main Hall"}]}"#),
        );
        let api = service(&transport, &signed_in());

        let first = api.get("api/hall/all-hall").await.unwrap();
        let second = api.get("api/hall/all-hall").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, Some(json!([{"id": 1, "name": "Main Hall"}])));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_is_independent_copy() {
        let transport = Arc::new(MockTransport::new().respond(200, r#"{"capacity": 80}"#));
        let api = service(&transport, &signed_in());

        let mut first = api.get("api/hall/7").await.unwrap().unwrap();
        first["capacity"] = json!(0);

        let second = api.get("api/hall/7").await.unwrap().unwrap();
        assert_eq!(second, json!({"capacity": 80}));
    }

    #[tokio::test]
    async fn test_query_text_distinguishes_keys() {
        let transport = Arc::new(MockTransport::new().always(200, "[]"));
        let api = service(&transport, &signed_in());

        api.approvals(ApprovalFilter::All).await.unwrap();
        api.approvals(ApprovalFilter::Internal).await.unwrap();
        api.approvals(ApprovalFilter::All).await.unwrap();

        assert_eq!(transport.call_count(), 2);
        assert!(api.cached("api/booking/approvals?filter=internal").is_some());
    }

    #[tokio::test]
    async fn test_writes_are_never_cached() {
        let transport = Arc::new(MockTransport::new().always(200, r#"{"id": 4}"#));
        let api = service(&transport, &signed_in());

        api.post("api/hall/create", json!({"name": "Annex"}))
            .await
            .unwrap();
        api.post("api/hall/create", json!({"name": "Annex"}))
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 2);
        assert!(api.cached("api/hall/create").is_none());
    }

    #[tokio::test]
    async fn test_write_invalidates_mapped_list() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(200, r#"[{"id": 123, "name": "Old"}]"#)
                .respond(200, r#"{"id": 123}"#)
                .respond(200, r#"[{"id": 123, "name": "New"}]"#),
        );
        let api = service(&transport, &signed_in());

        api.list(Resource::Hall).await.unwrap();
        api.patch("api/hall/123", json!({"name": "New"}))
            .await
            .unwrap();
        let after = api.list(Resource::Hall).await.unwrap();

        assert_eq!(after, Some(json!([{"id": 123, "name": "New"}])));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unmapped_write_empties_cache() {
        let transport = Arc::new(MockTransport::new().always(200, "[]"));
        let api = service(&transport, &signed_in());

        api.list(Resource::Hall).await.unwrap();
        api.list(Resource::School).await.unwrap();
        api.put("api/settings/theme", json!({"dark": true}))
            .await
            .unwrap();

        assert_eq!(api.cache_stats().entries, 0);
    }

    #[tokio::test]
    async fn test_booking_approval_scenario() {
        let transport = Arc::new(MockTransport::new().always(200, "[]"));
        let api = service(&transport, &signed_in());

        api.my_requests().await.unwrap();
        api.hall_conflicts("9").await.unwrap();
        api.list(Resource::Hall).await.unwrap();
        assert!(api.cached("api/booking/conflicts/hall/9").is_some());

        api.request("api/booking/123/approve", RequestOptions::put())
            .await
            .unwrap();

        assert!(api.cached("api/booking/my-requests").is_none());
        assert!(api.cached("api/booking/conflicts/hall/9").is_none());
        assert!(api.cached("api/hall/all-hall").is_some());
    }

    #[tokio::test]
    async fn test_missing_token_short_circuits() {
        let transport = Arc::new(MockTransport::new().always(200, "[]"));
        let session = Arc::new(MockSession::anonymous());
        let api = service(&transport, &session);

        let err = api.list(Resource::Employee).await.unwrap_err();

        assert!(matches!(err, Error::Api(ApiError::Unauthorized)));
        assert_eq!(transport.call_count(), 0);
        assert_eq!(session.teardown_count(), 1);
    }

    #[tokio::test]
    async fn test_login_allowed_without_token() {
        let transport = Arc::new(MockTransport::new().respond(200, r#"{"data": {"token": "t"}}"#));
        let session = Arc::new(MockSession::anonymous());
        let api = service(&transport, &session);

        let result = api
            .post("api/auth/login", json!({"email": "a@b.c", "password": "x"}))
            .await
            .unwrap();

        assert_eq!(result, Some(json!({"token": "t"})));
        assert_eq!(session.teardown_count(), 0);
        let sent = &transport.requests()[0];
        assert!(sent.headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_request_headers_and_url() {
        let transport = Arc::new(MockTransport::new().always(200, "{}"));
        let api = service(&transport, &signed_in());

        api.post("api/booking/create", json!({"hall": 2}))
            .await
            .unwrap();
        api.request(
            "api/hall/upload",
            RequestOptions::post()
                .body(json!("raw"))
                .header(CONTENT_TYPE, HeaderValue::from_static("text/plain")),
        )
        .await
        .unwrap();
        api.get("api/school/all-schools").await.unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].url, "http://halls.test/api/booking/create");
        assert_eq!(sent[0].headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(sent[0].headers[CONTENT_TYPE], "application/json");
        assert_eq!(sent[0].body.as_deref(), Some(br#"{"hall":2}"#.as_slice()));
        assert_eq!(sent[1].headers[CONTENT_TYPE], "text/plain");
        assert!(sent[2].headers.get(CONTENT_TYPE).is_none());
        assert!(sent[2].body.is_none());
    }

    #[tokio::test]
    async fn test_not_found_surfaces_status_without_caching() {
        let transport = Arc::new(MockTransport::new().respond(404, "no such hall"));
        let api = service(&transport, &signed_in());

        let err = api.get("api/hall/999").await.unwrap_err();

        assert_eq!(err.as_api().and_then(ApiError::status), Some(404));
        assert_eq!(transport.call_count(), 1);
        assert!(api.cached("api/hall/999").is_none());
    }

    #[tokio::test]
    async fn test_failed_write_does_not_invalidate() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(200, "[]")
                .respond(422, r#"{"message": "capacity must be positive"}"#),
        );
        let api = service(&transport, &signed_in());

        api.list(Resource::Hall).await.unwrap();
        let err = api
            .patch("api/hall/1", json!({"capacity": -1}))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("capacity must be positive"));
        assert!(api.cached("api/hall/all-hall").is_some());
    }

    #[tokio::test]
    async fn test_no_content_read_is_absent_and_uncached() {
        let transport = Arc::new(MockTransport::new().always(204, ""));
        let api = service(&transport, &signed_in());

        assert!(api.get("api/booking/conflicts").await.unwrap().is_none());
        assert!(api.get("api/booking/conflicts").await.unwrap().is_none());
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_response_tears_down_once() {
        let transport = Arc::new(MockTransport::new().respond(401, ""));
        let session = signed_in();
        let api = service(&transport, &session);

        let err = api.my_requests().await.unwrap_err();

        assert!(matches!(err, Error::Api(ApiError::Unauthorized)));
        assert_eq!(session.teardown_count(), 1);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_request_as_typed() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Hall {
            id: u32,
            name: String,
        }

        let transport = Arc::new(
            MockTransport::new().respond(200, r#"{"data": [{"id": 1, "name": "Main"}]}"#),
        );
        let api = service(&transport, &signed_in());

        let halls: Option<Vec<Hall>> = api
            .request_as(endpoints::ALL_HALLS, RequestOptions::get())
            .await
            .unwrap();
        assert_eq!(
            halls,
            Some(vec![Hall {
                id: 1,
                name: "Main".to_string()
            }])
        );

        let wrong: Result<Option<Vec<u32>>> = api
            .request_as(endpoints::ALL_HALLS, RequestOptions::get())
            .await;
        assert!(matches!(
            wrong,
            Err(Error::Api(ApiError::InvalidResponse(_)))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_request() {
        let transport = Arc::new(MockTransport::new().always(200, "[]"));
        let api = service(&transport, &signed_in());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = api
            .request_cancellable(endpoints::ALL_HALLS, RequestOptions::get(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api(ApiError::Cancelled)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let transport = Arc::new(MockTransport::new().always(500, "down"));
        let api = service(&transport, &signed_in());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let err = api
            .request_cancellable(endpoints::ALL_HALLS, RequestOptions::get(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api(ApiError::Cancelled)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_identical_reads_both_fetch() {
        let transport = Arc::new(MockTransport::new().always(200, "[]"));
        let api = service(&transport, &signed_in());

        let (a, b) = tokio::join!(api.list(Resource::Hall), api.list(Resource::Hall));
        assert_eq!(a.unwrap(), Some(json!([])));
        assert_eq!(b.unwrap(), Some(json!([])));

        assert_eq!(transport.call_count(), 2);
        assert!(api.cached(endpoints::ALL_HALLS).is_some());

        api.list(Resource::Hall).await.unwrap();
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_cache() {
        let transport = Arc::new(MockTransport::new().always(200, "[]"));
        let session = signed_in();
        let api = service(&transport, &session);

        api.list(Resource::Department).await.unwrap();
        api.logout();

        assert_eq!(session.teardown_count(), 1);
        assert_eq!(api.cache_stats().entries, 0);
    }

    #[tokio::test]
    async fn test_manual_invalidate() {
        let transport = Arc::new(MockTransport::new().always(200, "[]"));
        let api = service(&transport, &signed_in());

        api.list(Resource::Employee).await.unwrap();
        let outcome = api.invalidate("api/employee/15");

        assert_eq!(
            outcome,
            InvalidationOutcome::Targeted {
                removed: vec![RequestKey::new("api/employee/all-employees")]
            }
        );
        assert!(api.cached_keys().is_empty());
    }
}
