//! crates/lexibot_core/src/ports.rs
//!
//! Defines the error taxonomy and the service contract for the external
//! generation model. The trait forms the boundary of the hexagonal architecture,
//! keeping the core independent of any particular LLM client.

use async_trait::async_trait;

use crate::domain::{GenerationConfig, Turn};

//=========================================================================================
// Chat Error Taxonomy
//=========================================================================================

/// Every failure the chat pipeline can produce.
///
/// Each variant carries enough information to build the HTTP response without
/// any further inspection: a status code and, where actionable, a remediation hint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// The caller sent input that failed validation.
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<&'static str>,
    },

    /// The upstream generation service failed or returned something unusable.
    #[error("{message}")]
    Api {
        message: String,
        status_code: u16,
        fixable_reason: Option<String>,
    },

    /// The deployment is misconfigured.
    #[error("{message}")]
    Configuration {
        message: String,
        fixable_reason: Option<String>,
    },

    /// Anything that does not fit the tags above.
    #[error("An unexpected error occurred: {0}")]
    Internal(String),
}

impl ChatError {
    pub fn validation(message: impl Into<String>, field: Option<&'static str>) -> Self {
        ChatError::Validation {
            message: message.into(),
            field,
        }
    }

    pub fn api(
        message: impl Into<String>,
        status_code: u16,
        fixable_reason: impl Into<String>,
    ) -> Self {
        ChatError::Api {
            message: message.into(),
            status_code,
            fixable_reason: Some(fixable_reason.into()),
        }
    }

    pub fn configuration(message: impl Into<String>, fixable_reason: impl Into<String>) -> Self {
        ChatError::Configuration {
            message: message.into(),
            fixable_reason: Some(fixable_reason.into()),
        }
    }

    /// The session for a generation call could not be set up.
    pub fn session_failure() -> Self {
        Self::api(
            "Failed to start chat session",
            500,
            "This might be a temporary issue. Please try again in a moment",
        )
    }

    /// The generation call succeeded but carried no usable text.
    pub fn extraction_failure() -> Self {
        Self::api(
            "Failed to extract response text",
            500,
            "The AI response couldn't be processed. Please try again",
        )
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ChatError::Validation { .. } => 400,
            ChatError::Api { status_code, .. } => *status_code,
            ChatError::Configuration { .. } | ChatError::Internal(_) => 500,
        }
    }

    pub fn fixable_reason(&self) -> Option<String> {
        match self {
            ChatError::Validation { field, .. } => {
                Some(format!("Please provide a valid {}", field.unwrap_or("input")))
            }
            ChatError::Api { fixable_reason, .. }
            | ChatError::Configuration { fixable_reason, .. } => fixable_reason.clone(),
            ChatError::Internal(_) => None,
        }
    }

    /// A short label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Validation { .. } => "ValidationError",
            ChatError::Api { .. } => "APIError",
            ChatError::Configuration { .. } => "ConfigurationError",
            ChatError::Internal(_) => "Unclassified",
        }
    }
}

/// A convenience type alias for `Result<T, ChatError>`.
pub type ChatResult<T> = Result<T, ChatError>;

/// Maps a failed send to an `Api` error by inspecting the failure text.
///
/// `transport_failed` is set by adapters that can tell a timeout or dropped
/// connection apart from an error the service reported. Rules are checked in
/// order and the first match wins.
pub fn classify_send_failure(signal: &str, transport_failed: bool) -> ChatError {
    let lower = signal.to_ascii_lowercase();

    if signal.contains("API_KEY_INVALID") || lower.contains("api key not valid") {
        ChatError::api(
            "Invalid API key",
            401,
            "Please check your GEMINI_API_KEY in the .env file. Get a valid key from https://aistudio.google.com/",
        )
    } else if lower.contains("quota") {
        ChatError::api(
            "API quota exceeded",
            429,
            "Your Gemini API quota has been exceeded. Check your billing settings or try again later",
        )
    } else if signal.contains("PERMISSION_DENIED") {
        ChatError::api(
            "Permission denied",
            403,
            "Your API key doesn't have permission for this request. Check your API key settings",
        )
    } else if signal.contains("RATE_LIMIT_EXCEEDED") {
        ChatError::api(
            "Rate limit exceeded",
            429,
            "Too many requests. Please wait a moment before trying again",
        )
    } else if transport_failed || lower.contains("timeout") || signal.contains("ECONNRESET") {
        ChatError::api(
            "Request timeout",
            504,
            "The AI service is taking too long to respond. Please try again with a shorter message",
        )
    } else {
        ChatError::api(
            "AI service error",
            502,
            "There's an issue with the AI service. Please try again in a moment",
        )
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Runs one exchange: a session scoped to `instruction`, seeded with
    /// `history`, receives `message`. Returns the raw generated text.
    ///
    /// Implementations make a single attempt and never retry.
    async fn send(
        &self,
        instruction: &str,
        history: &[Turn],
        message: &str,
        config: &GenerationConfig,
    ) -> ChatResult<String>;

    /// Checks that a generation request can be constructed, without calling out.
    async fn verify_client(&self) -> ChatResult<()>;

    /// Issues a minimal real generation call.
    async fn ping(&self) -> ChatResult<()>;
}
