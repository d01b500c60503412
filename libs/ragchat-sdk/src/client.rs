use crate::auth::AuthApi;
use crate::conversations::ConversationsApi;
use crate::projects::ProjectsApi;
use crate::rag::RagApi;
use crate::usage::UsageApi;
use crate::users::UsersApi;
use ragchat_session::AuthGateway;

/// Typed client for the ragchat backend.
///
/// Groups the backend's endpoints into small API surfaces reachable from one
/// handle:
///
/// ```no_run
/// use ragchat_http::HttpClientBuilder;
/// use ragchat_sdk::RagChatClient;
/// use ragchat_session::{AuthGateway, MemorySessionStore, NoopNavigator};
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let http = HttpClientBuilder::new().build()?;
/// let gateway = AuthGateway::new(
///     http,
///     "https://api.example.com",
///     Arc::new(MemorySessionStore::new()),
///     Arc::new(NoopNavigator),
/// );
/// let client = RagChatClient::new(gateway);
///
/// client.auth().login("a@example.com", "secret").await?;
/// let reply = client.rag().ask("What does the deploy script do?").await?;
/// println!("{}", reply.answer);
/// # Ok(())
/// # }
/// ```
///
/// Cheap to clone; clones share the gateway and its session.
#[derive(Clone)]
pub struct RagChatClient {
    gateway: AuthGateway,
}

impl RagChatClient {
    /// Wrap an authenticated gateway
    #[must_use]
    pub fn new(gateway: AuthGateway) -> Self {
        Self { gateway }
    }

    /// The gateway behind this client, for raw calls
    #[must_use]
    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    /// Login, registration, profile, and logout
    #[must_use]
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(&self.gateway)
    }

    /// Question answering over the indexed knowledge base
    #[must_use]
    pub fn rag(&self) -> RagApi<'_> {
        RagApi::new(&self.gateway)
    }

    /// Conversation history management
    #[must_use]
    pub fn conversations(&self) -> ConversationsApi<'_> {
        ConversationsApi::new(&self.gateway)
    }

    /// Projects, memberships, and attached knowledge sources
    #[must_use]
    pub fn projects(&self) -> ProjectsApi<'_> {
        ProjectsApi::new(&self.gateway)
    }

    /// Token-usage records and statistics
    #[must_use]
    pub fn usage(&self) -> UsageApi<'_> {
        UsageApi::new(&self.gateway)
    }

    /// User administration
    #[must_use]
    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(&self.gateway)
    }
}
