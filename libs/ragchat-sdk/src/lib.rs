#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Typed client for the ragchat RAG backend
//!
//! Built on [`ragchat_session::AuthGateway`], so every call is
//! bearer-authenticated and transparently recovers from expired access
//! tokens. The API is grouped by backend area: auth, rag, conversations,
//! projects, usage, users. See [`RagChatClient`] for a usage example.
//!
//! The backend has shipped more than one JSON shape for several endpoints
//! (enveloped vs. bare lists, camelCase vs. snake_case fields); the SDK
//! absorbs that drift instead of surfacing it to callers.

mod auth;
mod client;
mod conversations;
mod error;
mod extract;
mod projects;
mod rag;
mod types;
mod usage;
mod users;

pub use auth::AuthApi;
pub use client::RagChatClient;
pub use conversations::ConversationsApi;
pub use error::ApiError;
pub use projects::ProjectsApi;
pub use rag::RagApi;
pub use types::{
    ChatRole, Conversation, ConversationMessage, ConversationWithMessages, CreateProjectRequest,
    HistoryMessage, MemberRole, MemberUser, MessageMetadata, NotionPage, Project, ProjectDetail,
    ProjectMember, RagQueryRequest, RagQueryResponse, Source, SwaggerDocument, TokenTotals,
    TokenUsage, TokenUsageStats, UpdateProjectRequest, UserAccount, UserProfile,
};
pub use usage::UsageApi;
pub use users::UsersApi;
