//! Wire types of the ragchat backend.
//!
//! All payloads are camelCase JSON; unknown fields are ignored so the SDK
//! tolerates additive backend changes.

use serde::{Deserialize, Serialize};

/// A retrieved source chunk backing an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub page_title: String,
    pub page_url: String,
    pub score: f64,
    pub chunk_text: String,
}

/// Token counts for one model call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTotals {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of conversation history sent along with a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Request body of `POST /rag/query`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RagQueryRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_history: Option<Vec<HistoryMessage>>,
}

impl RagQueryRequest {
    /// A plain question with no conversation context
    #[must_use]
    pub fn question(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            conversation_id: None,
            conversation_history: None,
        }
    }
}

/// Response body of `POST /rag/query`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagQueryResponse {
    #[serde(default)]
    pub success: bool,
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub question: String,
    pub conversation_id: Option<String>,
    pub rewritten_query: Option<String>,
    pub usage: Option<TokenTotals>,
    pub max_score: Option<f64>,
    pub threshold: Option<f64>,
}

/// Conversation summary
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: Option<String>,
    pub message_count: Option<u64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Retrieval metadata attached to an assistant message
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(default)]
    pub sources: Vec<Source>,
    pub usage: Option<TokenTotals>,
    pub rewritten_query: Option<String>,
}

/// A stored message of a conversation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub metadata: Option<MessageMetadata>,
    pub created_at: String,
}

/// Conversation with its full message history
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationWithMessages {
    pub id: String,
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
    pub created_at: String,
    pub updated_at: String,
}

/// `{ success, conversation }` envelope
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConversationEnvelope<T> {
    #[allow(dead_code)]
    pub success: bool,
    pub conversation: T,
}

/// `{ success, conversations }` envelope
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConversationsEnvelope {
    #[allow(dead_code)]
    pub success: bool,
    pub conversations: Vec<Conversation>,
}

/// `{ success, message }` envelope
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeleteEnvelope {
    #[allow(dead_code)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Project summary
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Role of a project member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Member,
    ProjectManager,
}

/// Minimal user reference embedded in a membership
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

/// A project membership
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: String,
    pub user_id: String,
    pub role: MemberRole,
    pub user: Option<MemberUser>,
}

/// Project with its members and attached knowledge sources
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub members: Vec<ProjectMember>,
    #[serde(default)]
    pub notion_pages: Vec<NotionPage>,
    #[serde(default)]
    pub swagger_documents: Vec<SwaggerDocument>,
    pub created_at: String,
    pub updated_at: String,
}

/// A Notion page available to (or attached to) a project
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotionPage {
    pub id: String,
    pub page_id: String,
    pub title: Option<String>,
    pub database_id: Option<String>,
    pub url: Option<String>,
}

/// A Swagger document available to (or attached to) a project
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwaggerDocument {
    pub id: String,
    pub key: String,
    pub swagger_url: Option<String>,
}

/// Body of `POST /projects`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `PATCH /projects/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One token-usage record
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub id: String,
    pub user_id: String,
    pub conversation_id: Option<String>,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub created_at: String,
}

/// Aggregated token-usage statistics.
///
/// Not deserialized directly; built by the tolerant field mapping in
/// [`crate::extract`] because the backend has shipped several field spellings.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenUsageStats {
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_tokens: u64,
    pub usage_count: u64,
    pub average_tokens: f64,
}

/// A user account (admin listing)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,
    pub email: String,
    pub role: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// The signed-in user's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: Option<String>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rag_request_omits_absent_context() {
        let request = RagQueryRequest::question("what is retrieval?");
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(encoded, json!({ "question": "what is retrieval?" }));
    }

    #[test]
    fn test_rag_request_includes_history() {
        let request = RagQueryRequest {
            question: "and then?".to_owned(),
            conversation_id: Some("c1".to_owned()),
            conversation_history: Some(vec![HistoryMessage {
                role: ChatRole::User,
                content: "what is retrieval?".to_owned(),
            }]),
        };
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(encoded["conversationId"], "c1");
        assert_eq!(encoded["conversationHistory"][0]["role"], "user");
    }

    #[test]
    fn test_rag_response_tolerates_minimal_payload() {
        let response: RagQueryResponse =
            serde_json::from_value(json!({ "answer": "42" })).unwrap();
        assert_eq!(response.answer, "42");
        assert!(response.sources.is_empty());
        assert_eq!(response.usage, None);
    }

    #[test]
    fn test_rag_response_full_payload() {
        let response: RagQueryResponse = serde_json::from_value(json!({
            "success": true,
            "answer": "because",
            "question": "why?",
            "sources": [{
                "pageTitle": "Design notes",
                "pageUrl": "https://notion.so/x",
                "score": 0.87,
                "chunkText": "…"
            }],
            "rewrittenQuery": "why is that",
            "usage": { "promptTokens": 10, "completionTokens": 5, "totalTokens": 15 },
            "maxScore": 0.87,
            "threshold": 0.5
        }))
        .unwrap();
        assert!(response.success);
        assert_eq!(response.sources[0].page_title, "Design notes");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_member_role_wire_form() {
        let role: MemberRole = serde_json::from_value(json!("project_manager")).unwrap();
        assert_eq!(role, MemberRole::ProjectManager);
    }

    #[test]
    fn test_conversation_tolerates_null_title() {
        let conversation: Conversation = serde_json::from_value(json!({
            "id": "c1",
            "title": null,
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(conversation.title, None);
        assert_eq!(conversation.message_count, None);
    }
}
