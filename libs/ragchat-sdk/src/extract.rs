//! Tolerant payload extraction.
//!
//! Several backend endpoints have shipped more than one response shape for
//! the same data. Rather than probing ad hoc at every call site, the SDK
//! resolves the variants here with a fixed, documented order.

use crate::error::ApiError;
use crate::types::TokenUsageStats;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Resolve a list payload.
///
/// Lookup order:
/// 1. the payload itself, when it is a bare array
/// 2. each of `named` keys, in order
/// 3. the generic `data`, then `items` keys
/// 4. the first array-valued field of the object
///
/// A payload matching none of these yields an empty list, mirroring how the
/// web client treated unrecognized shapes.
///
/// # Errors
///
/// Returns `ApiError::Json` when the located array's elements do not
/// deserialize into `T`.
pub(crate) fn list<T: DeserializeOwned>(
    payload: &Value,
    named: &[&str],
) -> Result<Vec<T>, ApiError> {
    let Some(items) = locate_array(payload, named) else {
        tracing::debug!("list payload had no recognizable array; treating as empty");
        return Ok(Vec::new());
    };

    items
        .iter()
        .map(|item| serde_json::from_value(item.clone()))
        .collect::<Result<Vec<T>, _>>()
        .map_err(ApiError::Json)
}

fn locate_array<'a>(payload: &'a Value, named: &[&str]) -> Option<&'a Vec<Value>> {
    if let Value::Array(items) = payload {
        return Some(items);
    }
    let object = payload.as_object()?;

    for key in named.iter().copied().chain(["data", "items"]) {
        if let Some(Value::Array(items)) = object.get(key) {
            return Some(items);
        }
    }

    object.values().find_map(Value::as_array)
}

/// Build usage statistics from a stats payload.
///
/// The stats object may arrive bare or wrapped under `stats` or `data`.
/// Each field is probed camelCase first, then snake_case, then the short
/// historical spelling; the average falls back to `total / count` when no
/// explicit average is present. Missing fields default to zero.
// Precision loss in the computed average is acceptable for a display
// statistic.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn usage_stats(payload: &Value) -> TokenUsageStats {
    let stats = payload
        .get("stats")
        .or_else(|| payload.get("data"))
        .unwrap_or(payload);

    let count = |names: &[&str]| -> u64 {
        names
            .iter()
            .find_map(|name| stats.get(name).and_then(Value::as_u64))
            .unwrap_or(0)
    };

    let total_prompt_tokens = count(&["totalPromptTokens", "total_prompt_tokens", "promptTokens"]);
    let total_completion_tokens = count(&[
        "totalCompletionTokens",
        "total_completion_tokens",
        "completionTokens",
    ]);
    let total_tokens = count(&["totalTokens", "total_tokens"]);
    let usage_count = count(&["usageCount", "usage_count", "count"]);

    let average_tokens = ["averageTokensPerQuery", "averageTokens", "average_tokens"]
        .iter()
        .find_map(|name| stats.get(name).and_then(Value::as_f64))
        .unwrap_or_else(|| {
            if usage_count > 0 {
                total_tokens as f64 / usage_count as f64
            } else {
                0.0
            }
        });

    TokenUsageStats {
        total_prompt_tokens,
        total_completion_tokens,
        total_tokens,
        usage_count,
        average_tokens,
    }
}

/// First non-empty string among `names`, probed in order.
///
/// Shared by the auth flows for camelCase/snake_case token and id fields.
pub(crate) fn string_field(payload: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| payload.get(name).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
