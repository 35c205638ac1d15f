//! Types exchanged with the thread store and published to the sidebar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::ThreadId;

/// One message-or-exchange entry returned by the thread store.
///
/// Only `threadId` is required. Fields the sidebar does not interpret are kept
/// in `extra` so the record can be handed back to the chat view untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    /// Thread this record belongs to.
    pub thread_id: ThreadId,
    /// Explicit thread title, when the store keeps one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// User message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Assistant response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Free-form content, any JSON value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    /// Activity time (RFC 3339 string or epoch milliseconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    /// Creation time, used when `timestamp` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    /// Everything else the store sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatRecord {
    /// Create an empty record for a thread.
    #[must_use]
    pub fn new(thread_id: impl Into<ThreadId>) -> Self {
        Self {
            thread_id: thread_id.into(),
            title: None,
            message: None,
            response: None,
            content: None,
            timestamp: None,
            created_at: None,
            extra: Map::new(),
        }
    }

    /// Set the user message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the assistant response.
    #[must_use]
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Set the explicit title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set free-form content.
    #[must_use]
    pub fn with_content(mut self, content: Value) -> Self {
        self.content = Some(content);
        self
    }

    /// Set the activity time.
    #[must_use]
    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(Value::String(at.to_rfc3339()));
        self
    }

    /// Activity time of the record: `timestamp`, else `createdAt`.
    ///
    /// Unparseable values count as absent.
    #[must_use]
    pub fn activity_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_ref()
            .and_then(parse_time)
            .or_else(|| self.created_at.as_ref().and_then(parse_time))
    }

    /// Decode a store payload leniently.
    ///
    /// Entries that are not objects or lack a usable `threadId` are skipped.
    #[must_use]
    pub fn decode_lenient(values: Vec<Value>) -> Vec<Self> {
        let total = values.len();
        let records: Vec<Self> = values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Self>(value) {
                Ok(record) if !record.thread_id.is_blank() => Some(record),
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!("Skipping malformed chat record: {e}");
                    None
                }
            })
            .collect();

        if records.len() < total {
            tracing::warn!(
                "Skipped {} of {} chat records without a usable threadId",
                total - records.len(),
                total
            );
        }
        records
    }
}

/// Parse a timestamp given as RFC 3339 text or epoch milliseconds.
fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Deduplicated display record for one thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    /// Thread identifier.
    pub thread_id: ThreadId,
    /// Display title.
    pub title: String,
    /// Last activity, used for ordering.
    pub timestamp: DateTime<Utc>,
}

impl ThreadSummary {
    /// Summary for a thread that only exists locally.
    #[must_use]
    pub fn new_chat(thread_id: ThreadId, title: impl Into<String>) -> Self {
        Self {
            thread_id,
            title: title.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_keeps_unknown_fields() {
        let record: ChatRecord = serde_json::from_value(json!({
            "threadId": "t1",
            "message": "hi",
            "role": "user",
        }))
        .unwrap();
        assert_eq!(record.thread_id.as_str(), "t1");
        assert_eq!(record.extra.get("role"), Some(&json!("user")));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["role"], json!("user"));
        assert_eq!(back["threadId"], json!("t1"));
        assert!(back.get("response").is_none());
    }

    #[test]
    fn test_activity_time_sources() {
        let rfc = ChatRecord {
            timestamp: Some(json!("2024-05-01T10:00:00Z")),
            ..ChatRecord::new("a")
        };
        assert_eq!(
            rfc.activity_time().map(|t| t.to_rfc3339()),
            Some("2024-05-01T10:00:00+00:00".to_string())
        );

        let millis = ChatRecord {
            created_at: Some(json!(1_714_557_600_000_i64)),
            ..ChatRecord::new("b")
        };
        assert_eq!(
            millis.activity_time().map(|t| t.timestamp()),
            Some(1_714_557_600)
        );

        let garbage = ChatRecord {
            timestamp: Some(json!("yesterday")),
            ..ChatRecord::new("c")
        };
        assert!(garbage.activity_time().is_none());
    }

    #[test]
    fn test_decode_lenient_skips_bad_entries() {
        let records = ChatRecord::decode_lenient(vec![
            json!({"threadId": "t1", "message": "ok"}),
            json!({"message": "no thread"}),
            json!({"threadId": "   "}),
            json!("not an object"),
            json!({"threadId": "t2", "content": {"parts": [1, 2]}}),
        ]);
        let ids: Vec<&str> = records.iter().map(|r| r.thread_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = ThreadSummary::new_chat(ThreadId::new("t1"), "New Chat");
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["threadId"], json!("t1"));
        assert_eq!(value["title"], json!("New Chat"));
        assert!(value["timestamp"].is_string());
    }
}
