//! Token-usage records and statistics.

use crate::error::ApiError;
use crate::extract;
use crate::types::{TokenUsage, TokenUsageStats};
use chrono::{DateTime, Utc};
use ragchat_session::AuthGateway;
use serde_json::Value;

/// Token-usage endpoints
pub struct UsageApi<'a> {
    gateway: &'a AuthGateway,
}

impl<'a> UsageApi<'a> {
    pub(crate) fn new(gateway: &'a AuthGateway) -> Self {
        Self { gateway }
    }

    /// `GET /token-usage` — paginated usage records, newest first
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Session` for transport, status, or refresh
    /// failures, and `ApiError::Json` for an unrecognized payload.
    pub async fn list(&self, limit: u32, offset: u32) -> Result<Vec<TokenUsage>, ApiError> {
        let payload: Value = self
            .gateway
            .get("/token-usage")
            .query(&[("limit", &limit.to_string()), ("offset", &offset.to_string())])
            .send()
            .await?
            .json()
            .await?;
        extract::list(&payload, &[])
    }

    /// `GET /token-usage/stats` — aggregate totals for the signed-in user
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list). Unknown stats field spellings
    /// degrade to zeroed values rather than failing.
    pub async fn stats(&self) -> Result<TokenUsageStats, ApiError> {
        let payload: Value = self
            .gateway
            .get("/token-usage/stats")
            .send()
            .await?
            .json()
            .await?;
        Ok(extract::usage_stats(&payload))
    }

    /// `GET /token-usage/conversation/{id}`
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn by_conversation(&self, conversation_id: &str) -> Result<Vec<TokenUsage>, ApiError> {
        let payload: Value = self
            .gateway
            .get(&format!("/token-usage/conversation/{conversation_id}"))
            .send()
            .await?
            .json()
            .await?;
        extract::list(&payload, &[])
    }

    /// `GET /token-usage/date-range`
    ///
    /// # Errors
    ///
    /// Same contract as [`list`](Self::list).
    pub async fn by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TokenUsage>, ApiError> {
        let payload: Value = self
            .gateway
            .get("/token-usage/date-range")
            .query(&[
                ("startDate", &start.to_rfc3339()),
                ("endDate", &end.to_rfc3339()),
            ])
            .send()
            .await?
            .json()
            .await?;
        extract::list(&payload, &[])
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::auth::tests::signed_in_client;
    use chrono::TimeZone;
    use chrono::Utc;
    use httpmock::prelude::*;
    use serde_json::json;

    fn usage_record(id: &str, total: u64) -> serde_json::Value {
        json!({
            "id": id,
            "userId": "u1",
            "conversationId": "c1",
            "promptTokens": total / 2,
            "completionTokens": total - total / 2,
            "totalTokens": total,
            "createdAt": "2025-06-01T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_list_sends_pagination() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/token-usage")
                .query_param("limit", "25")
                .query_param("offset", "50");
            then.status(200)
                .json_body(json!({ "usage": [usage_record("t1", 30)] }));
        });

        let client = signed_in_client(&server.base_url());
        let records = client.usage().list(25, 50).await.unwrap();

        mock.assert();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_tokens, 30);
    }

    #[tokio::test]
    async fn test_stats_survives_field_spelling_drift() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/token-usage/stats");
            then.status(200).json_body(json!({ "data": {
                "total_prompt_tokens": 400,
                "total_completion_tokens": 100,
                "total_tokens": 500,
                "usage_count": 25
            }}));
        });

        let client = signed_in_client(&server.base_url());
        let stats = client.usage().stats().await.unwrap();
        assert_eq!(stats.total_tokens, 500);
        assert!((stats.average_tokens - 20.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_by_conversation_accepts_bare_array() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/token-usage/conversation/c1");
            then.status(200)
                .json_body(json!([usage_record("t1", 30), usage_record("t2", 12)]));
        });

        let client = signed_in_client(&server.base_url());
        let records = client.usage().by_conversation("c1").await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_date_range_uses_rfc3339_params() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/token-usage/date-range")
                .query_param("startDate", "2025-06-01T00:00:00+00:00")
                .query_param("endDate", "2025-06-30T00:00:00+00:00");
            then.status(200).json_body(json!({ "usage": [] }));
        });

        let client = signed_in_client(&server.base_url());
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap();
        let records = client.usage().by_date_range(start, end).await.unwrap();

        mock.assert();
        assert!(records.is_empty());
    }
}
