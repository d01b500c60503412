use ragchat_http::HttpError;
use ragchat_session::SessionError;
use thiserror::Error;

/// Errors surfaced by the typed API client
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    /// Gateway failure: transport, terminal status, or refresh cycle
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Response JSON did not match the expected shape
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// An auth response carried no usable token pair
    #[error("authentication response contained no token pair")]
    MissingTokens,
}

impl From<HttpError> for ApiError {
    fn from(err: HttpError) -> Self {
        ApiError::Session(SessionError::Http(err))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_http_errors_fold_into_session() {
        let err = ApiError::from(HttpError::Timeout(std::time::Duration::from_secs(30)));
        assert!(matches!(
            err,
            ApiError::Session(SessionError::Http(HttpError::Timeout(_)))
        ));
    }
}
