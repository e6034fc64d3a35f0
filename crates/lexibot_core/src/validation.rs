//! Checks and normalizes the body of an incoming chat request.

use serde_json::Value;

use crate::domain::ChatInput;
use crate::ports::{ChatError, ChatResult};

/// Upper bound on the raw (untrimmed) message length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 10_000;

/// Validates a parsed request body. `None` means no body was sent.
///
/// Rules are applied in order and the first failure is returned.
pub fn validate_chat_input(body: Option<&Value>) -> ChatResult<ChatInput> {
    let body = match body {
        None | Some(Value::Null) => {
            return Err(ChatError::validation("Request body is required", None))
        }
        Some(body) => body,
    };

    let message = match body.get("message") {
        None | Some(Value::Null) => {
            return Err(ChatError::validation("Message is required", Some("message")))
        }
        Some(Value::String(message)) => message,
        Some(_) => {
            return Err(ChatError::validation("Message must be a string", Some("message")))
        }
    };

    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(ChatError::validation("Message cannot be empty", Some("message")));
    }

    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ChatError::validation(
            "Message is too long (max 10,000 characters)",
            Some("message"),
        ));
    }

    let conversation_id = optional_string(
        body,
        "conversationId",
        "Conversation ID must be a string",
    )?;
    let context = optional_string(body, "context", "Context must be a string")?;

    Ok(ChatInput {
        message: trimmed.to_string(),
        conversation_id,
        context,
    })
}

/// Reads an optional string field. Missing, null and empty values all become `None`.
fn optional_string(
    body: &Value,
    field: &'static str,
    type_error: &str,
) -> ChatResult<Option<String>> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ChatError::validation(type_error, Some(field))),
    }
}
