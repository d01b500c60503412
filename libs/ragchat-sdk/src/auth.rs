//! Login, registration, profile, and logout.

use crate::error::ApiError;
use crate::extract;
use crate::types::UserProfile;
use ragchat_session::{AuthGateway, SessionKey};
use serde::Deserialize;
use serde_json::{Value, json};

/// Profile payload as the backend sends it; `userId` is an older spelling of
/// the id field.
#[derive(Debug, Deserialize)]
struct ProfileWire {
    #[serde(alias = "userId")]
    id: String,
    email: String,
    #[serde(default)]
    role: Option<String>,
}

impl From<ProfileWire> for UserProfile {
    fn from(wire: ProfileWire) -> Self {
        UserProfile {
            id: wire.id,
            email: wire.email,
            role: wire.role,
        }
    }
}

/// Authentication endpoints.
///
/// Successful login and registration persist the returned token pair and
/// profile into the gateway's session store, so subsequent calls through the
/// same gateway are authenticated.
pub struct AuthApi<'a> {
    gateway: &'a AuthGateway,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(gateway: &'a AuthGateway) -> Self {
        Self { gateway }
    }

    /// `POST /auth/login`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MissingTokens` when the backend answers 2xx but the
    /// payload carries no access token; nothing is persisted in that case.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<UserProfile>, ApiError> {
        let payload: Value = self
            .gateway
            .post("/auth/login")
            .json(&json!({ "email": email, "password": password }))?
            .send()
            .await?
            .json()
            .await?;

        self.establish_session(&payload).await
    }

    /// `POST /auth/register`
    ///
    /// # Errors
    ///
    /// Same contract as [`login`](Self::login).
    pub async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserProfile>, ApiError> {
        let payload: Value = self
            .gateway
            .post("/auth/register")
            .json(&json!({ "email": email, "password": password }))?
            .send()
            .await?
            .json()
            .await?;

        self.establish_session(&payload).await
    }

    /// `GET /auth/profile`
    ///
    /// The fetched profile replaces the cached one in the session store.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Json` when the payload lacks the id or email field.
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        let payload: Value = self
            .gateway
            .get("/auth/profile")
            .send()
            .await?
            .json()
            .await?;

        let wire: ProfileWire =
            serde_json::from_value(payload.get("user").unwrap_or(&payload).clone())?;
        let profile = UserProfile::from(wire);
        self.cache_profile(&profile);
        Ok(profile)
    }

    /// `POST /auth/logout`, then drop the local session.
    ///
    /// The endpoint call is best effort: the local session is cleared whether
    /// or not the backend acknowledged the logout.
    pub async fn logout(&self) {
        let result = self.gateway.post("/auth/logout").send().await;
        if let Err(err) = result {
            tracing::debug!(error = %err, "logout call failed; clearing session anyway");
        }
        self.gateway.clear_session();
    }

    /// Persist tokens and profile from a login/register payload.
    async fn establish_session(&self, payload: &Value) -> Result<Option<UserProfile>, ApiError> {
        let Some(access) = extract::string_field(payload, &["accessToken", "access_token"]) else {
            return Err(ApiError::MissingTokens);
        };
        let Some(refresh) = extract::string_field(payload, &["refreshToken", "refresh_token"])
        else {
            return Err(ApiError::MissingTokens);
        };

        let store = self.gateway.store();
        store.set(SessionKey::AccessToken, access);
        store.set(SessionKey::RefreshToken, refresh);

        // The profile rides along on most deployments; fall back to the
        // profile endpoint when it does not.
        let embedded = payload.get("user").unwrap_or(payload).clone();
        if let Ok(wire) = serde_json::from_value::<ProfileWire>(embedded) {
            let profile = UserProfile::from(wire);
            self.cache_profile(&profile);
            return Ok(Some(profile));
        }

        match self.profile().await {
            Ok(profile) => Ok(Some(profile)),
            Err(err) => {
                tracing::debug!(error = %err, "profile fetch after login failed");
                Ok(None)
            }
        }
    }

    fn cache_profile(&self, profile: &UserProfile) {
        if let Ok(encoded) = serde_json::to_string(profile) {
            self.gateway.store().set(SessionKey::UserProfile, encoded);
        }
    }
}
