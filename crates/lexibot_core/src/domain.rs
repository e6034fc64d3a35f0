//! crates/lexibot_core/src/domain.rs
//!
//! Defines the pure, core data structures for the chat service.
//! These structs are independent of any HTTP framework or wire format.

use chrono::{DateTime, Utc};

/// Which side of a conversation produced a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// A single role-tagged message in a conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A chat request that has passed validation.
///
/// `message` is already trimmed. Absent or empty optional fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatInput {
    pub message: String,
    pub conversation_id: Option<String>,
    pub context: Option<String>,
}

/// The in-memory history kept for one caller-supplied conversation id.
#[derive(Debug, Clone)]
pub struct ConversationRecord {
    pub id: String,
    /// Insertion order is turn order.
    pub history: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub context: Option<String>,
}

/// Sampling parameters forwarded to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    /// Kept for parity with the native Gemini API; the OpenAI-compatible
    /// surface has no equivalent and adapters may ignore it.
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            max_output_tokens: 2048,
        }
    }
}

/// The successful outcome of one chat exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub processing_time_ms: u64,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Operational,
    Error,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Operational => "operational",
            HealthStatus::Error => "error",
            HealthStatus::Unknown => "unknown",
        }
    }
}

/// Which probe produced a health result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheckKind {
    /// Only verifies that a generation request can be built.
    ModelInit,
    /// Issues a real, quota-consuming generation call.
    FullGeneration,
}

impl HealthCheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthCheckKind::ModelInit => "model-init",
            HealthCheckKind::FullGeneration => "full-generation",
        }
    }
}

/// The result of probing the generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub error: Option<String>,
    pub check_kind: HealthCheckKind,
}
