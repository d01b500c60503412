//! User administration.

use crate::error::ApiError;
use crate::extract;
use crate::types::UserAccount;
use ragchat_session::AuthGateway;
use serde_json::Value;

/// User listing endpoint (requires an administrative role)
pub struct UsersApi<'a> {
    gateway: &'a AuthGateway,
}

impl<'a> UsersApi<'a> {
    pub(crate) fn new(gateway: &'a AuthGateway) -> Self {
        Self { gateway }
    }

    /// `GET /users`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Session` for transport, status, or refresh
    /// failures, and `ApiError::Json` for an unrecognized payload.
    pub async fn list(&self) -> Result<Vec<UserAccount>, ApiError> {
        let payload: Value = self.gateway.get("/users").send().await?.json().await?;
        extract::list(&payload, &["users"])
    }
}
