use crate::error::{RefreshError, SessionError};
use crate::navigator::{Navigator, redirect_unless_on_auth_page};
use crate::refresh::{ParsedRefresh, RefreshOutcome, RefreshState, parse_refresh_body};
use crate::store::{SessionKey, SessionStore};
use crate::token::BearerToken;
use bytes::Bytes;
use http::StatusCode;
use parking_lot::Mutex;
use ragchat_http::{HttpClient, HttpError, HttpResponse};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Authenticated request gateway.
///
/// Wraps an [`HttpClient`] with bearer-token injection and transparent
/// recovery from expired access tokens:
///
/// 1. Each request carries `Authorization: Bearer <token>` when a token is
///    stored, overwriting any caller-supplied authorization header.
/// 2. A 401 response triggers a token refresh against `POST /auth/refresh`.
///    Refreshes are single-flight: when many requests fail at once, exactly
///    one refresh call reaches the endpoint and every other request waits
///    for its outcome.
/// 3. On success the original request is replayed once with the fresh token.
///    A replayed request that receives another 401 is returned as-is.
/// 4. On unrecoverable failure (no refresh token, refresh rejected) the
///    session is cleared and the [`Navigator`] is signalled.
///
/// Transport errors never trigger a refresh; they propagate immediately.
///
/// Cheap to clone; all clones share the session store and refresh state.
#[derive(Clone)]
pub struct AuthGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    http: HttpClient,
    base_url: String,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    refresh: Mutex<RefreshState>,
}

/// Immutable request description, kept so a request can be replayed
/// byte-for-byte after a token refresh.
struct RequestParts {
    method: http::Method,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    content_type: Option<&'static str>,
}

impl AuthGateway {
    /// Create a gateway for `base_url` (scheme + authority, no trailing slash
    /// required).
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            inner: Arc::new(GatewayInner {
                http,
                base_url,
                store,
                navigator,
                refresh: Mutex::new(RefreshState::default()),
            }),
        }
    }

    /// The session store behind this gateway
    #[must_use]
    pub fn store(&self) -> &dyn SessionStore {
        self.inner.store.as_ref()
    }

    /// The configured API base URL (no trailing slash)
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The underlying HTTP client, for unauthenticated calls
    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.inner.http
    }

    /// Start building a GET request for `path` (relative to the base URL)
    #[must_use]
    pub fn get(&self, path: &str) -> GatewayRequest {
        self.request(http::Method::GET, path)
    }

    /// Start building a POST request
    #[must_use]
    pub fn post(&self, path: &str) -> GatewayRequest {
        self.request(http::Method::POST, path)
    }

    /// Start building a PUT request
    #[must_use]
    pub fn put(&self, path: &str) -> GatewayRequest {
        self.request(http::Method::PUT, path)
    }

    /// Start building a PATCH request
    #[must_use]
    pub fn patch(&self, path: &str) -> GatewayRequest {
        self.request(http::Method::PATCH, path)
    }

    /// Start building a DELETE request
    #[must_use]
    pub fn delete(&self, path: &str) -> GatewayRequest {
        self.request(http::Method::DELETE, path)
    }

    fn request(&self, method: http::Method, path: &str) -> GatewayRequest {
        let url = if path.starts_with('/') {
            format!("{}{path}", self.inner.base_url)
        } else {
            format!("{}/{path}", self.inner.base_url)
        };
        GatewayRequest {
            gateway: self.clone(),
            parts: RequestParts {
                method,
                url,
                headers: Vec::new(),
                body: None,
                content_type: None,
            },
            query: Vec::new(),
        }
    }

    /// Remove all credentials from the session store
    pub fn clear_session(&self) {
        for key in SessionKey::ALL {
            self.inner.store.remove(key);
        }
    }

    /// Remove all credentials and signal the navigator (unless the user is
    /// already on an auth page)
    pub fn end_session(&self) {
        self.clear_session();
        redirect_unless_on_auth_page(self.inner.navigator.as_ref());
    }

    async fn execute(
        &self,
        parts: &RequestParts,
        token: Option<&str>,
    ) -> Result<HttpResponse, HttpError> {
        let mut builder = self.inner.http.request(parts.method.clone(), &parts.url);

        if let Some(content_type) = parts.content_type {
            builder = builder.header("content-type", content_type);
        }

        for (name, value) in &parts.headers {
            // The stored token always wins over a caller-supplied one.
            if token.is_some() && name.eq_ignore_ascii_case("authorization") {
                continue;
            }
            builder = builder.header(name, value);
        }

        if let Some(token) = token {
            builder = builder.header("authorization", &format!("Bearer {token}"));
        }

        if let Some(body) = &parts.body {
            builder = builder.body_bytes(body.clone());
        }

        builder.send().await
    }

    /// Run the single-flight refresh protocol after a 401.
    ///
    /// `original` is the 401 response that started recovery; it is only
    /// consumed when recovery is impossible (no refresh token), in which case
    /// its status error is what the leader surfaces.
    async fn obtain_fresh_token(
        &self,
        original: HttpResponse,
    ) -> Result<BearerToken, SessionError> {
        // Checking the flag and enqueueing happen under one lock so that two
        // requests can never both become the leader.
        let waiter = {
            let mut state = self.inner.refresh.lock();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };

        if let Some(rx) = waiter {
            tracing::debug!("refresh already in flight; waiting for its outcome");
            return match rx.await {
                Ok(Ok(token)) => Ok(token),
                Ok(Err(err)) => Err(SessionError::Refresh(err)),
                Err(_) => Err(SessionError::Refresh(RefreshError::Interrupted)),
            };
        }

        // Leader path. The guard releases waiters with `Interrupted` if this
        // future is dropped mid-refresh.
        let mut guard = AbortGuard {
            gateway: self.clone(),
            armed: true,
        };
        let outcome = self.run_refresh().await;
        guard.armed = false;
        drop(guard);

        self.finish_refresh(&outcome);

        match outcome {
            Ok(token) => Ok(token),
            Err(RefreshError::MissingRefreshToken) => {
                // Waiters all received MissingRefreshToken; the leader alone
                // holds the original response and fails with its 401.
                let err = match original.checked_bytes().await {
                    Err(e) => e,
                    // 401 is never a success status; body read cannot say Ok
                    Ok(_) => HttpError::HttpStatus {
                        status: StatusCode::UNAUTHORIZED,
                        body_preview: String::new(),
                        content_type: None,
                    },
                };
                Err(SessionError::Http(err))
            }
            Err(err) => Err(SessionError::Refresh(err)),
        }
    }

    /// Clear the in-flight flag and broadcast the outcome to all waiters.
    fn finish_refresh(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut state = self.inner.refresh.lock();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };
        for tx in waiters {
            // A dropped waiter already has its answer (cancellation)
            let _ = tx.send(outcome.clone());
        }
    }

    /// Perform one refresh cycle: call the endpoint, persist the new tokens.
    ///
    /// Unrecoverable outcomes tear the session down before returning.
    async fn run_refresh(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.inner.store.get(SessionKey::RefreshToken) else {
            tracing::warn!("401 with no refresh token in store; ending session");
            self.end_session();
            return Err(RefreshError::MissingRefreshToken);
        };

        tracing::debug!("access token rejected; refreshing");

        match self.call_refresh_endpoint(&refresh_token).await {
            Ok(parsed) => {
                self.inner
                    .store
                    .set(SessionKey::AccessToken, parsed.access.clone());
                if let Some(rotated) = parsed.rotated_refresh
                    && rotated != refresh_token
                {
                    self.inner.store.set(SessionKey::RefreshToken, rotated);
                }
                tracing::debug!("token refresh succeeded");
                Ok(BearerToken::new(parsed.access))
            }
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed; ending session");
                self.end_session();
                Err(err)
            }
        }
    }

    async fn call_refresh_endpoint(
        &self,
        refresh_token: &str,
    ) -> Result<ParsedRefresh, RefreshError> {
        let url = format!("{}/auth/refresh", self.inner.base_url);
        let endpoint_err = |e: HttpError| RefreshError::Endpoint(Arc::new(e));

        let response = self
            .inner
            .http
            .post(&url)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .map_err(endpoint_err)?
            .send()
            .await
            .map_err(endpoint_err)?;

        let body = response.checked_bytes().await.map_err(endpoint_err)?;
        let value: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| endpoint_err(HttpError::Json(e)))?;

        parse_refresh_body(&value).ok_or(RefreshError::NoUsableToken)
    }
}

/// Releases waiters and clears the in-flight flag if the leader future is
/// dropped before completing its refresh.
struct AbortGuard {
    gateway: AuthGateway,
    armed: bool,
}

impl Drop for AbortGuard {
    fn drop(&mut self) {
        if self.armed {
            self.gateway
                .finish_refresh(&Err(RefreshError::Interrupted));
        }
    }
}

/// Request builder for authenticated calls
///
/// Created by [`AuthGateway::get`], [`AuthGateway::post`], etc. The request
/// description is retained internally so it can be replayed after a token
/// refresh.
#[must_use = "GatewayRequest does nothing until .send() is called"]
pub struct GatewayRequest {
    gateway: AuthGateway,
    parts: RequestParts,
    query: Vec<(String, String)>,
}

impl GatewayRequest {
    /// Add a header to the request
    ///
    /// An `authorization` header is ignored whenever the session store holds
    /// an access token; the gateway's token always wins.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.parts.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Append query string pairs to the request URL
    pub fn query(mut self, pairs: &[(&str, &str)]) -> Self {
        self.query.extend(
            pairs
                .iter()
                .map(|(name, value)| ((*name).to_owned(), (*value).to_owned())),
        );
        self
    }

    /// Set a JSON request body
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Http(HttpError::Json)` if serialization fails.
    pub fn json<T: serde::Serialize>(mut self, body: &T) -> Result<Self, SessionError> {
        let bytes = serde_json::to_vec(body).map_err(HttpError::Json)?;
        self.parts.body = Some(Bytes::from(bytes));
        self.parts.content_type = Some("application/json");
        Ok(self)
    }

    /// Set a raw bytes request body
    pub fn body_bytes(mut self, body: Bytes) -> Self {
        self.parts.body = Some(body);
        self
    }

    /// Send the request, refreshing the access token and replaying once if
    /// the first attempt is rejected with 401.
    ///
    /// Like the underlying client, returns `Ok(response)` for every HTTP
    /// status, including a 401 on the replay.
    ///
    /// # Errors
    ///
    /// - `SessionError::Http` for build/transport failures, and for the
    ///   original 401 when no refresh token exists
    /// - `SessionError::Refresh` when the refresh cycle fails
    pub async fn send(self) -> Result<HttpResponse, SessionError> {
        let mut parts = self.parts;
        if !self.query.is_empty() {
            let qs = serde_urlencoded::to_string(&self.query).map_err(HttpError::FormEncode)?;
            parts.url = format!("{}?{qs}", parts.url);
        }
        let gateway = self.gateway;

        let token = gateway.inner.store.get(SessionKey::AccessToken);
        let response = gateway.execute(&parts, token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!(url = %parts.url, "request rejected with 401; starting recovery");
        let fresh = gateway.obtain_fresh_token(response).await?;

        // One recovery attempt per logical call: a second 401 passes through.
        let replayed = gateway.execute(&parts, Some(fresh.expose())).await?;
        Ok(replayed)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::navigator::tests::RecordingNavigator;
    use crate::store::MemorySessionStore;
    use httpmock::prelude::*;
    use ragchat_http::{HttpClientBuilder, HttpClientConfig};
    use serde_json::json;
    use std::time::Duration;

    fn seeded_store(access: Option<&str>, refresh: Option<&str>) -> Arc<MemorySessionStore> {
        let store = MemorySessionStore::new();
        if let Some(access) = access {
            store.set(SessionKey::AccessToken, access.to_owned());
        }
        if let Some(refresh) = refresh {
            store.set(SessionKey::RefreshToken, refresh.to_owned());
        }
        store.set(SessionKey::UserProfile, "{\"id\":\"u1\"}".to_owned());
        Arc::new(store)
    }

    fn gateway_at(
        base_url: &str,
        store: Arc<MemorySessionStore>,
        navigator: Arc<RecordingNavigator>,
    ) -> AuthGateway {
        let http = HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .build()
            .expect("test client should build");
        AuthGateway::new(http, base_url, store, navigator)
    }

    fn refresh_success_mock(server: &MockServer, delay: Duration) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(POST)
                .path("/auth/refresh")
                .json_body(json!({ "refreshToken": "R1" }));
            then.status(200)
                .json_body(json!({ "accessToken": "T2", "refreshToken": "R2" }))
                .delay(delay);
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_401s_trigger_single_refresh() {
        let server = MockServer::start();
        let refresh = refresh_success_mock(&server, Duration::from_millis(200));
        server.mock(|when, then| {
            when.method(GET)
                .path("/rag/data")
                .header("authorization", "Bearer T1");
            then.status(401).json_body(json!({ "message": "expired" }));
        });
        let accept_new = server.mock(|when, then| {
            when.method(GET)
                .path("/rag/data")
                .header("authorization", "Bearer T2");
            then.status(200).body("ok");
        });

        let store = seeded_store(Some("T1"), Some("R1"));
        let navigator = Arc::new(RecordingNavigator::at("/chat"));
        let gateway = gateway_at(&server.base_url(), store.clone(), navigator);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let gateway = gateway.clone();
            handles.push(tokio::spawn(async move {
                gateway.get("/rag/data").send().await
            }));
        }

        for handle in handles {
            let response = handle.await.unwrap().expect("request should succeed");
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(refresh.calls(), 1, "exactly one refresh for the burst");
        assert!(accept_new.calls() >= 20, "every request replayed with T2");
        assert_eq!(
            store.get(SessionKey::AccessToken),
            Some("T2".to_owned()),
            "new access token persisted"
        );
        assert_eq!(
            store.get(SessionKey::RefreshToken),
            Some("R2".to_owned()),
            "rotated refresh token persisted"
        );
    }

    #[tokio::test]
    async fn test_replay_401_is_final() {
        let server = MockServer::start();
        let refresh = refresh_success_mock(&server, Duration::ZERO);
        let protected = server.mock(|when, then| {
            when.method(GET).path("/rag/data");
            then.status(401).json_body(json!({ "message": "still no" }));
        });

        let store = seeded_store(Some("T1"), Some("R1"));
        let navigator = Arc::new(RecordingNavigator::at("/chat"));
        let gateway = gateway_at(&server.base_url(), store, navigator);

        let response = gateway.get("/rag/data").send().await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "second 401 is returned, not retried"
        );
        assert_eq!(protected.calls(), 2, "original attempt plus one replay");
        assert_eq!(refresh.calls(), 1, "one refresh cycle per logical call");
    }

    #[tokio::test]
    async fn test_missing_refresh_token_surfaces_original_401() {
        let server = MockServer::start();
        let refresh = server.mock(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(200);
        });
        server.mock(|when, then| {
            when.method(GET).path("/rag/data");
            then.status(401).json_body(json!({ "message": "expired" }));
        });

        let store = seeded_store(Some("T1"), None);
        let navigator = Arc::new(RecordingNavigator::at("/chat"));
        let gateway = gateway_at(&server.base_url(), store.clone(), navigator.clone());

        let err = gateway.get("/rag/data").send().await.unwrap_err();
        match err {
            SessionError::Http(HttpError::HttpStatus {
                status,
                body_preview,
                ..
            }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body_preview.contains("expired"));
            }
            other => panic!("expected the original 401, got: {other:?}"),
        }

        assert_eq!(refresh.calls(), 0, "no refresh attempted without a token");
        for key in SessionKey::ALL {
            assert_eq!(store.get(key), None, "session cleared");
        }
        assert_eq!(navigator.redirect_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_refresh_failure_fails_all_waiters() {
        let server = MockServer::start();
        let refresh = server.mock(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(500)
                .json_body(json!({ "message": "nope" }))
                .delay(Duration::from_millis(300));
        });
        server.mock(|when, then| {
            when.method(GET).path("/rag/data");
            then.status(401);
        });

        let store = seeded_store(Some("T1"), Some("R1"));
        let navigator = Arc::new(RecordingNavigator::at("/chat"));
        let gateway = gateway_at(&server.base_url(), store.clone(), navigator.clone());

        let mut handles = Vec::new();
        for _ in 0..5 {
            let gateway = gateway.clone();
            handles.push(tokio::spawn(async move {
                gateway.get("/rag/data").send().await
            }));
        }

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(
                matches!(
                    err,
                    SessionError::Refresh(RefreshError::Endpoint(_))
                ),
                "every request observes the shared refresh error, got: {err:?}"
            );
        }

        assert_eq!(refresh.calls(), 1);
        for key in SessionKey::ALL {
            assert_eq!(store.get(key), None, "session cleared");
        }
        assert_eq!(navigator.redirect_count(), 1, "leader signals once");
    }

    #[tokio::test]
    async fn test_snake_case_refresh_keeps_old_refresh_token() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(200).json_body(json!({ "access_token": "T2" }));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/rag/data")
                .header("authorization", "Bearer T1");
            then.status(401);
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/rag/data")
                .header("authorization", "Bearer T2");
            then.status(200);
        });

        let store = seeded_store(Some("T1"), Some("R1"));
        let navigator = Arc::new(RecordingNavigator::at("/chat"));
        let gateway = gateway_at(&server.base_url(), store.clone(), navigator);

        let response = gateway.get("/rag/data").send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.get(SessionKey::AccessToken), Some("T2".to_owned()));
        assert_eq!(
            store.get(SessionKey::RefreshToken),
            Some("R1".to_owned()),
            "absent rotation keeps the stored refresh token"
        );
    }

    #[tokio::test]
    async fn test_usable_token_required_even_on_2xx() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(200).json_body(json!({ "unexpected": true }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/rag/data");
            then.status(401);
        });

        let store = seeded_store(Some("T1"), Some("R1"));
        let navigator = Arc::new(RecordingNavigator::at("/chat"));
        let gateway = gateway_at(&server.base_url(), store.clone(), navigator.clone());

        let err = gateway.get("/rag/data").send().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Refresh(RefreshError::NoUsableToken)
        ));
        for key in SessionKey::ALL {
            assert_eq!(store.get(key), None);
        }
        assert_eq!(navigator.redirect_count(), 1);
    }

    #[tokio::test]
    async fn test_redirect_suppressed_on_login_page() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/rag/data");
            then.status(401);
        });

        let store = seeded_store(Some("T1"), None);
        let navigator = Arc::new(RecordingNavigator::at("/login"));
        let gateway = gateway_at(&server.base_url(), store.clone(), navigator.clone());

        let err = gateway.get("/rag/data").send().await.unwrap_err();
        assert!(matches!(err, SessionError::Http(_)));
        assert_eq!(navigator.redirect_count(), 0, "no redirect loop from /login");
        for key in SessionKey::ALL {
            assert_eq!(store.get(key), None, "session still cleared");
        }
    }

    #[tokio::test]
    async fn test_transport_error_bypasses_refresh() {
        // Nothing listens on port 1.
        let store = seeded_store(Some("T1"), Some("R1"));
        let navigator = Arc::new(RecordingNavigator::at("/chat"));
        let gateway = gateway_at("http://127.0.0.1:1", store.clone(), navigator.clone());

        let err = gateway.get("/rag/data").send().await.unwrap_err();
        assert!(
            matches!(err, SessionError::Http(HttpError::Transport(_))),
            "got: {err:?}"
        );
        assert_eq!(
            store.get(SessionKey::AccessToken),
            Some("T1".to_owned()),
            "credentials untouched on transport failure"
        );
        assert_eq!(navigator.redirect_count(), 0);
    }

    #[tokio::test]
    async fn test_stored_token_overwrites_caller_authorization() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rag/data")
                .header("authorization", "Bearer T1");
            then.status(200);
        });

        let store = seeded_store(Some("T1"), Some("R1"));
        let navigator = Arc::new(RecordingNavigator::at("/chat"));
        let gateway = gateway_at(&server.base_url(), store, navigator);

        let response = gateway
            .get("/rag/data")
            .header("authorization", "Bearer stale")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        mock.assert();
    }

    #[tokio::test]
    async fn test_query_pairs_appended() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/usage")
                .query_param("limit", "5")
                .query_param("offset", "10");
            then.status(200).body("[]");
        });

        let store = seeded_store(Some("T1"), Some("R1"));
        let navigator = Arc::new(RecordingNavigator::at("/chat"));
        let gateway = gateway_at(&server.base_url(), store, navigator);

        gateway
            .get("/usage")
            .query(&[("limit", "5"), ("offset", "10")])
            .send()
            .await
            .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_json_body_replayed_after_refresh() {
        let server = MockServer::start();
        refresh_success_mock(&server, Duration::ZERO);
        server.mock(|when, then| {
            when.method(POST)
                .path("/rag/query")
                .header("authorization", "Bearer T1")
                .json_body(json!({ "question": "why?" }));
            then.status(401);
        });
        let accept_new = server.mock(|when, then| {
            when.method(POST)
                .path("/rag/query")
                .header("authorization", "Bearer T2")
                .header("content-type", "application/json")
                .json_body(json!({ "question": "why?" }));
            then.status(200).json_body(json!({ "answer": "because" }));
        });

        let store = seeded_store(Some("T1"), Some("R1"));
        let navigator = Arc::new(RecordingNavigator::at("/chat"));
        let gateway = gateway_at(&server.base_url(), store, navigator);

        let response = gateway
            .post("/rag/query")
            .json(&json!({ "question": "why?" }))
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        accept_new.assert();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_request_end_to_end() {
        // Two near-simultaneous requests with an expired token; the refresh
        // answers with a new access token only, no rotation.
        let server = MockServer::start();
        let refresh = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/refresh")
                .json_body(json!({ "refreshToken": "R1" }));
            then.status(200)
                .json_body(json!({ "accessToken": "T2" }))
                .delay(Duration::from_millis(200));
        });
        let reject_old = server.mock(|when, then| {
            when.method(GET)
                .path("/rag/data")
                .header("authorization", "Bearer T1");
            then.status(401);
        });
        let accept_new = server.mock(|when, then| {
            when.method(GET)
                .path("/rag/data")
                .header("authorization", "Bearer T2");
            then.status(200).body("ok");
        });

        let store = seeded_store(Some("T1"), Some("R1"));
        let navigator = Arc::new(RecordingNavigator::at("/chat"));
        let gateway = gateway_at(&server.base_url(), store.clone(), navigator.clone());

        let first = tokio::spawn({
            let gateway = gateway.clone();
            async move { gateway.get("/rag/data").send().await }
        });
        let second = tokio::spawn({
            let gateway = gateway.clone();
            async move { gateway.get("/rag/data").send().await }
        });

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);

        assert_eq!(refresh.calls(), 1, "one refresh shared by both requests");
        assert_eq!(reject_old.calls(), 2, "both first attempts carried T1");
        assert_eq!(accept_new.calls(), 2, "both replays carried T2");

        assert_eq!(store.get(SessionKey::AccessToken), Some("T2".to_owned()));
        assert_eq!(
            store.get(SessionKey::RefreshToken),
            Some("R1".to_owned()),
            "no rotation in the response keeps the stored refresh token"
        );
        assert_eq!(navigator.redirect_count(), 0);
    }

    #[tokio::test]
    async fn test_request_without_stored_token_sends_no_auth_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/public");
            then.status(200);
        });

        let store = Arc::new(MemorySessionStore::new());
        let navigator = Arc::new(RecordingNavigator::at("/chat"));
        let gateway = gateway_at(&server.base_url(), store, navigator);

        let response = gateway.get("/public").send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        mock.assert();
    }
}
