use crate::error::RefreshError;
use crate::token::BearerToken;
use serde_json::Value;
use tokio::sync::oneshot;

/// Outcome broadcast to requests waiting on an in-flight refresh
pub(crate) type RefreshOutcome = Result<BearerToken, RefreshError>;

/// Shared refresh coordination state.
///
/// The flag and the waiter queue live behind one mutex so that checking
/// `refreshing` and enqueueing a waiter is a single atomic step; two requests
/// observing a 401 at the same instant can never both become the leader.
#[derive(Default)]
pub(crate) struct RefreshState {
    pub refreshing: bool,
    pub waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Token material extracted from a refresh response
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedRefresh {
    /// The new access token (always present, non-empty)
    pub access: String,
    /// Rotated refresh token, when the server sent one
    pub rotated_refresh: Option<String>,
}

/// Extract tokens from a refresh response body.
///
/// The backend has shipped both camelCase and snake_case payloads, so each
/// token is probed in a fixed order:
///
/// 1. access token: `accessToken`, then `access_token`
/// 2. refresh token: `refreshToken`, then `refresh_token`; absent means the
///    caller keeps its current refresh token
///
/// Empty strings count as absent. Returns `None` when no usable access token
/// is found, which callers must treat as a failed refresh even on a 2xx
/// response.
pub(crate) fn parse_refresh_body(body: &Value) -> Option<ParsedRefresh> {
    let access = string_field(body, &["accessToken", "access_token"])?;
    let rotated_refresh = string_field(body, &["refreshToken", "refresh_token"]);
    Some(ParsedRefresh {
        access,
        rotated_refresh,
    })
}

fn string_field(value: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| value.get(name).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
