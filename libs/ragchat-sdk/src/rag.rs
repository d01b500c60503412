//! Question answering over the indexed knowledge base.

use crate::error::ApiError;
use crate::types::{RagQueryRequest, RagQueryResponse};
use ragchat_session::AuthGateway;

/// Retrieval-augmented query endpoint
pub struct RagApi<'a> {
    gateway: &'a AuthGateway,
}

impl<'a> RagApi<'a> {
    pub(crate) fn new(gateway: &'a AuthGateway) -> Self {
        Self { gateway }
    }

    /// `POST /rag/query`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Session` for transport, status, or refresh
    /// failures, and `ApiError::Json` for an unrecognized answer payload.
    pub async fn query(&self, request: &RagQueryRequest) -> Result<RagQueryResponse, ApiError> {
        let response = self
            .gateway
            .post("/rag/query")
            .json(request)?
            .send()
            .await?
            .json()
            .await?;
        Ok(response)
    }

    /// Ask a standalone question with no conversation context
    ///
    /// # Errors
    ///
    /// Same contract as [`query`](Self::query).
    pub async fn ask(&self, question: &str) -> Result<RagQueryResponse, ApiError> {
        self.query(&RagQueryRequest::question(question)).await
    }
}
