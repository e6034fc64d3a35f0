pub mod chat;
pub mod conversation;
pub mod domain;
pub mod health;
pub mod ports;
pub mod prompt;
pub mod rate_limit;
pub mod sanitize;
pub mod validation;

pub use chat::ChatService;
pub use conversation::ConversationStore;
pub use domain::{
    ChatInput, ChatReply, ConversationRecord, GenerationConfig, HealthCheckKind, HealthReport,
    HealthStatus, Role, Turn,
};
pub use health::{HealthCache, HealthCheckMode};
pub use ports::{ChatError, ChatResult, GenerationService};
pub use rate_limit::{Admission, RateLimiter};
