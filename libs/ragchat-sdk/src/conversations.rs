//! Conversation history management.

use crate::error::ApiError;
use crate::types::{
    Conversation, ConversationEnvelope, ConversationWithMessages, ConversationsEnvelope,
    DeleteEnvelope,
};
use ragchat_session::AuthGateway;
use serde_json::json;

/// Conversation endpoints
pub struct ConversationsApi<'a> {
    gateway: &'a AuthGateway,
}

impl<'a> ConversationsApi<'a> {
    pub(crate) fn new(gateway: &'a AuthGateway) -> Self {
        Self { gateway }
    }

    /// `POST /conversations`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Session` for transport, status, or refresh
    /// failures, and `ApiError::Json` for an unrecognized payload.
    pub async fn create(&self, title: Option<&str>) -> Result<Conversation, ApiError> {
        let body = match title {
            Some(title) => json!({ "title": title }),
            None => json!({}),
        };
        let envelope: ConversationEnvelope<Conversation> = self
            .gateway
            .post("/conversations")
            .json(&body)?
            .send()
            .await?
            .json()
            .await?;
        Ok(envelope.conversation)
    }

    /// `GET /conversations`
    ///
    /// # Errors
    ///
    /// Same contract as [`create`](Self::create).
    pub async fn list(&self) -> Result<Vec<Conversation>, ApiError> {
        let envelope: ConversationsEnvelope = self
            .gateway
            .get("/conversations")
            .send()
            .await?
            .json()
            .await?;
        Ok(envelope.conversations)
    }

    /// `GET /conversations/{id}`, including the message history
    ///
    /// # Errors
    ///
    /// Same contract as [`create`](Self::create).
    pub async fn get(&self, id: &str) -> Result<ConversationWithMessages, ApiError> {
        let envelope: ConversationEnvelope<ConversationWithMessages> = self
            .gateway
            .get(&format!("/conversations/{id}"))
            .send()
            .await?
            .json()
            .await?;
        Ok(envelope.conversation)
    }

    /// `PATCH /conversations/{id}/title`
    ///
    /// # Errors
    ///
    /// Same contract as [`create`](Self::create).
    pub async fn rename(&self, id: &str, title: &str) -> Result<Conversation, ApiError> {
        let envelope: ConversationEnvelope<Conversation> = self
            .gateway
            .patch(&format!("/conversations/{id}/title"))
            .json(&json!({ "title": title }))?
            .send()
            .await?
            .json()
            .await?;
        Ok(envelope.conversation)
    }

    /// `DELETE /conversations/{id}`; returns the backend's confirmation
    /// message
    ///
    /// # Errors
    ///
    /// Same contract as [`create`](Self::create).
    pub async fn delete(&self, id: &str) -> Result<String, ApiError> {
        let envelope: DeleteEnvelope = self
            .gateway
            .delete(&format!("/conversations/{id}"))
            .send()
            .await?
            .json()
            .await?;
        Ok(envelope.message)
    }
}
