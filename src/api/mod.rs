//! Request and response payloads for the backend REST API.
//!
//! One record per wire shape; the client methods in [`client`] own path and
//! query construction. Unknown response fields are ignored so backend
//! additions do not break deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod client;

pub use client::{ApiClient, ApiError, HistoryFetch};

#[derive(Serialize)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub user_id: String,
    pub full_name: String,
}

/// Acknowledgement shape shared by signup, bot create/update, and history
/// restart. Only some operations fill each field.
#[derive(Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
}

#[derive(Serialize)]
pub struct AskRequest {
    pub user_id: String,
    pub bot_id: String,
    pub message: String,
}

/// Reply to a sent chat message. The backend answers `{"response": ...}` on
/// success and `{"error": ...}` when the bot cannot be resolved; neither
/// carries a message id.
#[derive(Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One persisted exchange from the chat history store. The stored documents
/// carry routing fields (chat id, user id, bot id) this client has no use
/// for; serde drops them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatRecord {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub response: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// The history store writes naive UTC timestamps without an offset; newer
/// records may carry a proper RFC 3339 string. Accept both, and never let a
/// malformed timestamp poison the surrounding record.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    Ok(raw
        .parse::<chrono::NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_parses_identity() {
        let json = r#"{"message": "Login successful", "user_id": "u1", "full_name": "Ada Lovelace"}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.user_id, "u1");
        assert_eq!(response.full_name, "Ada Lovelace");
    }

    #[test]
    fn ask_response_parses_reply_text() {
        let response: AskResponse =
            serde_json::from_str(r#"{"response": "Hello! How can I help?"}"#).unwrap();
        assert_eq!(response.response.as_deref(), Some("Hello! How can I help?"));
        assert!(response.error.is_none());
    }

    #[test]
    fn ask_response_parses_backend_error_shape() {
        let response: AskResponse = serde_json::from_str(r#"{"error": "Bot not found"}"#).unwrap();
        assert!(response.response.is_none());
        assert_eq!(response.error.as_deref(), Some("Bot not found"));
    }

    #[test]
    fn chat_record_ignores_routing_fields() {
        let json = r#"{
            "chat_id": "u1_b1",
            "user_id": "u1",
            "bot_id": "b1",
            "message": "hello",
            "response": "hi",
            "timestamp": "2024-05-01T12:00:00Z"
        }"#;
        let record: ChatRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.message, "hello");
        assert_eq!(record.response, "hi");
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn chat_record_accepts_offset_less_timestamps() {
        // The history store serializes naive UTC datetimes.
        let json = r#"{"message": "hello", "response": "hi", "timestamp": "2024-05-01T12:00:00"}"#;
        let record: ChatRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.timestamp.unwrap().to_rfc3339(),
            "2024-05-01T12:00:00+00:00"
        );
    }

    #[test]
    fn chat_record_tolerates_unparseable_timestamp() {
        let json = r#"{"message": "hello", "response": "hi", "timestamp": "not a date"}"#;
        let record: ChatRecord = serde_json::from_str(json).unwrap();
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn chat_record_tolerates_missing_timestamp() {
        let record: ChatRecord =
            serde_json::from_str(r#"{"message": "hello", "response": "hi"}"#).unwrap();
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn signup_request_serializes_all_fields() {
        let request = SignupRequest {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["full_name"], "Ada Lovelace");
        assert_eq!(value["confirm_password"], "hunter22");
    }
}
