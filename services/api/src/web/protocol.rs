//! services/api/src/web/protocol.rs
//!
//! Defines the JSON bodies exchanged between the browser client and the API server.

use chrono::{DateTime, Utc};
use lexibot_core::ChatReply;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

//=========================================================================================
// Bodies Sent FROM the Client TO the Server
//=========================================================================================
// NOTE: `POST /chat` parses its body by hand so that type errors become
// validation failures; this struct only documents the expected shape.
//=========================================================================================

/// A chat message from the user.
#[derive(Deserialize, Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    /// 1 to 10,000 characters, not blank.
    pub message: String,
    /// Supply the same id on every turn to keep multi-turn context.
    pub conversation_id: Option<String>,
    /// `legal_assistant` enables the stricter legal-only directives.
    pub context: Option<String>,
}

//=========================================================================================
// Bodies Sent FROM the Server TO the Client
//=========================================================================================

/// A successful chat exchange.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponseBody {
    pub success: bool,
    pub response: String,
    /// Wall-clock milliseconds spent handling the request.
    pub processing_time: u64,
    pub conversation_id: Option<String>,
}

impl From<ChatReply> for ChatResponseBody {
    fn from(reply: ChatReply) -> Self {
        Self {
            success: true,
            response: reply.response,
            processing_time: reply.processing_time_ms,
            conversation_id: reply.conversation_id,
        }
    }
}

/// Every failure response uses this shape.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixable_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Seconds until the rate-limit window resets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorBody {
    pub fn new(error: &str, message: impl Into<String>, fixable_reason: Option<String>) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            message: message.into(),
            fixable_reason,
            field: None,
            retry_after: None,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthConfigBody {
    pub gemini_full_check: bool,
    pub cache_ttl: String,
}

/// Service and generation-model health.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponseBody {
    /// `healthy`, `degraded` or `unhealthy`.
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub server: String,
    /// `operational`, `error` or `unknown`.
    #[serde(rename = "geminiAI")]
    pub gemini_ai: String,
    pub gemini_check_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_error: Option<String>,
    pub health_config: HealthConfigBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_response_uses_camel_case() {
        let body = ChatResponseBody::from(ChatReply {
            response: "hi".to_string(),
            processing_time_ms: 12,
            conversation_id: None,
        });
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({
                "success": true,
                "response": "hi",
                "processingTime": 12,
                "conversationId": null
            })
        );
    }

    #[test]
    fn error_body_omits_absent_fields() {
        let body = ErrorBody::new("Not Found", "Route GET /x not found", None);
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["success"], false);
        assert!(value.get("fixableReason").is_none());
        assert!(value.get("retryAfter").is_none());
    }
}
