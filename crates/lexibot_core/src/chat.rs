//! crates/lexibot_core/src/chat.rs
//!
//! The chat request pipeline: validate, load history, compose the instruction,
//! generate, sanitize, record the turn. Rate limiting happens before a request
//! gets here; error translation happens after it leaves.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{error, info, warn};

use crate::conversation::ConversationStore;
use crate::domain::{ChatInput, ChatReply, GenerationConfig};
use crate::ports::{ChatError, ChatResult, GenerationService};
use crate::prompt::compose_instruction;
use crate::sanitize::sanitize_response;
use crate::validation::validate_chat_input;

/// How many characters of the user's message go into log lines.
const LOG_PREVIEW_CHARS: usize = 100;

pub struct ChatService {
    generation: Arc<dyn GenerationService>,
    conversations: Arc<ConversationStore>,
    config: GenerationConfig,
}

impl ChatService {
    pub fn new(
        generation: Arc<dyn GenerationService>,
        conversations: Arc<ConversationStore>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            generation,
            conversations,
            config,
        }
    }

    /// Handles one chat request body. `None` means the request had no body.
    ///
    /// Errors are returned untranslated. The conversation is only written after
    /// a successful generation.
    pub async fn handle_chat(
        &self,
        body: Option<&Value>,
        client_id: &str,
    ) -> ChatResult<ChatReply> {
        let started = Instant::now();

        let input = match validate_chat_input(body) {
            Ok(input) => input,
            Err(err) => {
                log_failure(&err, None, started.elapsed());
                return Err(err);
            }
        };

        info!(
            client = %client_id,
            input = %preview(&input.message),
            message_chars = input.message.chars().count(),
            conversation_id = input.conversation_id.as_deref().unwrap_or("none"),
            context = input.context.as_deref().unwrap_or("none"),
            "new chat request"
        );

        match self.converse(&input).await {
            Ok(response) => {
                let elapsed = started.elapsed();
                info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    input_chars = input.message.chars().count(),
                    response_chars = response.chars().count(),
                    performance = performance_label(elapsed),
                    "chat completed"
                );
                Ok(ChatReply {
                    response,
                    processing_time_ms: elapsed.as_millis() as u64,
                    conversation_id: input.conversation_id,
                })
            }
            Err(err) => {
                log_failure(&err, Some(&input.message), started.elapsed());
                Err(err)
            }
        }
    }

    async fn converse(&self, input: &ChatInput) -> ChatResult<String> {
        let instruction = compose_instruction(input.context.as_deref());

        let Some(id) = input.conversation_id.as_deref() else {
            let raw = self
                .generation
                .send(&instruction, &[], &input.message, &self.config)
                .await?;
            return Ok(sanitize_response(&raw));
        };

        // Held until the turn is recorded so that concurrent turns on the
        // same conversation see each other's history.
        let _guard = self.conversations.lock(id).await;

        let history = self
            .conversations
            .get(id)
            .map(|record| record.history)
            .unwrap_or_default();
        if !history.is_empty() {
            info!(conversation_id = %id, messages = history.len(), "loaded conversation history");
        }

        let raw = self
            .generation
            .send(&instruction, &history, &input.message, &self.config)
            .await?;
        let response = sanitize_response(&raw);

        self.conversations.upsert(id, input.context.as_deref());
        let saved = self
            .conversations
            .append(id, &input.message, &response)
            .unwrap_or_default();
        info!(conversation_id = %id, messages = saved, "saved conversation");

        Ok(response)
    }
}

fn preview(message: &str) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(LOG_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn performance_label(elapsed: Duration) -> &'static str {
    match elapsed.as_millis() {
        0..=1999 => "fast",
        2000..=4999 => "normal",
        _ => "slow",
    }
}

fn log_failure(err: &ChatError, message: Option<&str>, elapsed: Duration) {
    let message = message.map(preview).unwrap_or_else(|| "N/A".to_string());
    let fixable_reason = err.fixable_reason().unwrap_or_default();
    let elapsed_ms = elapsed.as_millis() as u64;

    match err {
        ChatError::Validation { field, .. } => warn!(
            elapsed_ms,
            input = %message,
            kind = err.kind(),
            field = field.unwrap_or("unknown"),
            status = err.status_code(),
            error = %err,
            fixable_reason = %fixable_reason,
            "chat request rejected"
        ),
        _ => error!(
            elapsed_ms,
            input = %message,
            kind = err.kind(),
            status = err.status_code(),
            error = %err,
            fixable_reason = %fixable_reason,
            "chat request failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, Turn};
    use crate::prompt::LEGAL_ASSISTANT_CONTEXT;
    use crate::sanitize::FALLBACK_RESPONSE;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every call and answers from a fixed script.
    struct ScriptedGeneration {
        reply: ChatResult<String>,
        calls: Mutex<Vec<(String, Vec<Turn>, String)>>,
    }

    impl ScriptedGeneration {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: ChatError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Vec<Turn>, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationService for ScriptedGeneration {
        async fn send(
            &self,
            instruction: &str,
            history: &[Turn],
            message: &str,
            _config: &GenerationConfig,
        ) -> ChatResult<String> {
            self.calls.lock().unwrap().push((
                instruction.to_string(),
                history.to_vec(),
                message.to_string(),
            ));
            self.reply.clone()
        }

        async fn verify_client(&self) -> ChatResult<()> {
            Ok(())
        }

        async fn ping(&self) -> ChatResult<()> {
            Ok(())
        }
    }

    fn service(generation: Arc<ScriptedGeneration>) -> (ChatService, Arc<ConversationStore>) {
        let store = Arc::new(ConversationStore::default());
        let service = ChatService::new(generation, store.clone(), GenerationConfig::default());
        (service, store)
    }

    #[tokio::test]
    async fn stateless_turn_creates_no_record() {
        let generation = ScriptedGeneration::replying("**Hello** there");
        let (service, store) = service(generation.clone());

        let reply = service
            .handle_chat(Some(&json!({ "message": "Hello" })), "127.0.0.1")
            .await
            .unwrap();

        assert_eq!(reply.response, "Hello there");
        assert_eq!(reply.conversation_id, None);
        assert!(store.is_empty());
        assert!(generation.calls()[0].1.is_empty());
    }

    #[tokio::test]
    async fn second_turn_sees_the_first() {
        let generation = ScriptedGeneration::replying("An answer");
        let (service, store) = service(generation.clone());
        let body = json!({ "message": "  First question ", "conversationId": "c1" });

        service.handle_chat(Some(&body), "client").await.unwrap();
        let body = json!({ "message": "Follow up", "conversationId": "c1" });
        service.handle_chat(Some(&body), "client").await.unwrap();

        let calls = generation.calls();
        assert_eq!(
            calls[1].1,
            vec![Turn::user("First question"), Turn::model("An answer")]
        );
        assert_eq!(store.get("c1").unwrap().history.len(), 4);
    }

    #[tokio::test]
    async fn validation_failure_never_reaches_generation() {
        let generation = ScriptedGeneration::replying("unused");
        let (service, _) = service(generation.clone());

        let err = service
            .handle_chat(Some(&json!({ "message": "   " })), "client")
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert!(generation.calls().is_empty());
    }

    #[tokio::test]
    async fn generation_failure_leaves_no_conversation() {
        let generation = ScriptedGeneration::failing(crate::ports::classify_send_failure(
            "Resource has been exhausted (e.g. check quota).",
            false,
        ));
        let (service, store) = service(generation);

        let err = service
            .handle_chat(Some(&json!({ "message": "hi", "conversationId": "c1" })), "client")
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 429);
        assert!(err.fixable_reason().is_some_and(|r| !r.is_empty()));
        assert!(!store.contains("c1"));
    }

    #[tokio::test]
    async fn empty_generation_falls_back() {
        let generation = ScriptedGeneration::replying("<script>alert(1)</script>");
        let (service, _) = service(generation);

        let reply = service
            .handle_chat(Some(&json!({ "message": "hi" })), "client")
            .await
            .unwrap();
        assert_eq!(reply.response, FALLBACK_RESPONSE);
    }

    #[tokio::test]
    async fn context_flag_shapes_the_instruction_and_is_stored() {
        let generation = ScriptedGeneration::replying("ok");
        let (service, store) = service(generation.clone());
        let body = json!({
            "message": "What is bail?",
            "conversationId": "c9",
            "context": LEGAL_ASSISTANT_CONTEXT
        });

        service.handle_chat(Some(&body), "client").await.unwrap();

        assert!(generation.calls()[0].0.contains("redirect the conversation"));
        let record = store.get("c9").unwrap();
        assert_eq!(record.context.as_deref(), Some(LEGAL_ASSISTANT_CONTEXT));
        assert_eq!(record.history[0].role, Role::User);
    }

    #[test]
    fn preview_truncates_long_messages() {
        let long = "x".repeat(150);
        let shown = preview(&long);
        assert_eq!(shown.len(), LOG_PREVIEW_CHARS + 3);
        assert!(shown.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn performance_labels() {
        assert_eq!(performance_label(Duration::from_millis(10)), "fast");
        assert_eq!(performance_label(Duration::from_millis(2500)), "normal");
        assert_eq!(performance_label(Duration::from_secs(6)), "slow");
    }
}
