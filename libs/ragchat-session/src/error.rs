use ragchat_http::HttpError;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the authenticated request gateway
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SessionError {
    /// Transport or terminal HTTP status error from the underlying client
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Token refresh cycle failed
    #[error(transparent)]
    Refresh(#[from] RefreshError),
}

/// Failure of a token refresh cycle.
///
/// Clonable so a single refresh outcome can be broadcast to every request
/// waiting on the in-flight refresh.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum RefreshError {
    /// No refresh token in the session store; recovery is impossible
    #[error("no refresh token in session store")]
    MissingRefreshToken,

    /// The refresh endpoint call itself failed (transport or non-2xx)
    #[error("token refresh request failed: {0}")]
    Endpoint(#[source] Arc<HttpError>),

    /// The refresh endpoint answered 2xx but no usable access token was found
    #[error("refresh response contained no usable access token")]
    NoUsableToken,

    /// The in-flight refresh was dropped before completing
    #[error("refresh interrupted before completion")]
    Interrupted,
}
