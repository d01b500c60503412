use crate::builder::HttpClientBuilder;
use crate::config::TransportSecurity;
use crate::error::HttpError;
use crate::request::RequestBuilder;
use crate::response::ResponseBody;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use tower::util::BoxCloneSyncService;

/// Type-erased service the client drives requests through.
///
/// `BoxCloneSyncService` keeps the client `Clone + Send + Sync` without
/// exposing the concrete tower stack in the public type.
pub(crate) type SharedService =
    BoxCloneSyncService<Request<Full<Bytes>>, Response<ResponseBody>, HttpError>;

/// HTTP client with a reqwest-like API
///
/// Cheap to clone; all clones share the same connection pool.
///
/// # Semantics
///
/// - `send()` returns `Ok(response)` for ALL HTTP statuses (including 4xx/5xx)
/// - `send()` returns `Err` only for transport/timeout/TLS errors
/// - Non-2xx is converted to an error only via `error_for_status()`,
///   `checked_bytes()`, `json()` or `text()`
///
/// # Example
///
/// ```ignore
/// use ragchat_http::HttpClient;
///
/// let client = HttpClient::builder()
///     .timeout(std::time::Duration::from_secs(10))
///     .build()?;
///
/// let data: MyData = client
///     .get("https://example.com/api")
///     .send()
///     .await?
///     .json()
///     .await?;
/// ```
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) service: SharedService,
    pub(crate) max_body_size: usize,
    pub(crate) transport_security: TransportSecurity,
}

impl HttpClient {
    /// Create a client with default configuration
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails.
    pub fn new() -> Result<Self, HttpError> {
        Self::builder().build()
    }

    /// Create a builder for customized configuration
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Start building a GET request
    #[must_use]
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::GET, url)
    }

    /// Start building a POST request
    #[must_use]
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::POST, url)
    }

    /// Start building a PUT request
    #[must_use]
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::PUT, url)
    }

    /// Start building a PATCH request
    #[must_use]
    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::PATCH, url)
    }

    /// Start building a DELETE request
    #[must_use]
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::DELETE, url)
    }

    /// Start building a request with an explicit method
    #[must_use]
    pub fn request(&self, method: http::Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(
            self.service.clone(),
            self.max_body_size,
            method,
            url.to_owned(),
            self.transport_security,
        )
    }
}
