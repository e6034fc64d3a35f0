//! services/api/src/adapters/gemini_llm.rs
//!
//! This module contains the adapter for the chat generation model.
//! It implements the `GenerationService` port from the `core` crate by talking
//! to Gemini through its OpenAI-compatible chat-completion endpoint.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use lexibot_core::{
    domain::{GenerationConfig, Role, Turn},
    ports::{classify_send_failure, ChatError, ChatResult, GenerationService},
};
use std::time::Duration;
use tracing::{debug, error};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerationService` using Gemini's OpenAI-compatible API.
#[derive(Clone)]
pub struct GeminiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GeminiChatAdapter {
    /// Creates a new `GeminiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds a client pointed at `api_base` and wraps it.
    ///
    /// The client makes exactly one attempt per call; upstream failures are
    /// reported to the caller instead of being retried.
    pub fn from_credentials(api_key: &str, api_base: &str, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);
        let client = Client::with_config(config).with_backoff(single_attempt());
        Self::new(client, model)
    }

    /// Assembles the whole session: instruction, prior turns, then the new message.
    fn build_request(
        &self,
        instruction: &str,
        history: &[Turn],
        message: &str,
        config: &GenerationConfig,
    ) -> Result<CreateChatCompletionRequest, OpenAIError> {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(history.len() + 2);

        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(instruction)
                .build()?
                .into(),
        );

        for turn in history {
            let entry: ChatCompletionRequestMessage = match turn.role {
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.text.as_str())
                    .build()?
                    .into(),
                Role::Model => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.text.as_str())
                    .build()?
                    .into(),
            };
            messages.push(entry);
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(message)
                .build()?
                .into(),
        );

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(config.temperature)
            .top_p(config.top_p)
            .max_tokens(config.max_output_tokens)
            .n(1)
            .build()
    }
}

/// A backoff policy whose elapsed-time budget is spent before the first retry.
fn single_attempt() -> ExponentialBackoff {
    ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..Default::default()
    }
}

/// Timeouts and dropped connections surface as transport errors rather than
/// as a message from the service.
fn is_transport_failure(err: &OpenAIError) -> bool {
    matches!(err, OpenAIError::Reqwest(inner) if inner.is_timeout() || inner.is_connect())
}

//=========================================================================================
// `GenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerationService for GeminiChatAdapter {
    async fn send(
        &self,
        instruction: &str,
        history: &[Turn],
        message: &str,
        config: &GenerationConfig,
    ) -> ChatResult<String> {
        let request = self
            .build_request(instruction, history, message, config)
            .map_err(|e| {
                error!(error = %e, "failed to build chat session");
                ChatError::session_failure()
            })?;

        debug!(
            model = %self.model,
            history = history.len(),
            "sending message to generation service"
        );

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| {
                error!(error = %e, "generation request failed");
                classify_send_failure(&e.to_string(), is_transport_failure(&e))
            })?;

        // Extract the text content from the first choice in the response.
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                error!("generation response contained no text content");
                ChatError::extraction_failure()
            })?;

        debug!(chars = text.chars().count(), "raw generation response received");
        Ok(text)
    }

    async fn verify_client(&self) -> ChatResult<()> {
        if self.model.trim().is_empty() {
            return Err(ChatError::configuration(
                "No generation model configured",
                "Set GEMINI_MODEL to a valid model name",
            ));
        }
        self.build_request("health", &[], "ping", &GenerationConfig::default())
            .map(|_| ())
            .map_err(|e| {
                error!(error = %e, "model initialization check failed");
                ChatError::session_failure()
            })
    }

    async fn ping(&self) -> ChatResult<()> {
        self.send("health", &[], "ping", &GenerationConfig::default())
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, response::Json, Router};
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn adapter() -> GeminiChatAdapter {
        GeminiChatAdapter::from_credentials(
            "test-key",
            "http://127.0.0.1:9",
            "gemini-2.5-pro".to_string(),
        )
    }

    async fn overloaded(
        State(hits): State<Arc<AtomicUsize>>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        hits.fetch_add(1, Ordering::SeqCst);
        let body = json!({
            "error": {
                "message": "The model is overloaded.",
                "code": 503,
                "status": "UNAVAILABLE"
            }
        });
        (StatusCode::SERVICE_UNAVAILABLE, Json(body))
    }

    /// Serves 503 for every request and returns the base URL plus a hit counter.
    async fn spawn_overloaded_upstream() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new().fallback(overloaded).with_state(hits.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), hits)
    }

    #[test]
    fn request_orders_instruction_history_then_message() {
        let history = vec![Turn::user("q1"), Turn::model("a1")];
        let request = adapter()
            .build_request("be Lexi", &history, "q2", &GenerationConfig::default())
            .unwrap();

        assert_eq!(request.model, "gemini-2.5-pro");
        assert_eq!(request.messages.len(), 4);
        assert!(matches!(request.messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(request.messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(request.messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(request.messages[3], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn request_carries_sampling_parameters() {
        let request = adapter()
            .build_request("x", &[], "y", &GenerationConfig::default())
            .unwrap();
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.top_p, Some(0.9));
    }

    #[tokio::test]
    async fn verify_client_does_not_call_out() {
        assert!(adapter().verify_client().await.is_ok());

        let blank =
            GeminiChatAdapter::from_credentials("k", "http://127.0.0.1:9", " ".to_string());
        let err = blank.verify_client().await.unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn upstream_server_errors_are_not_retried() {
        let (base, hits) = spawn_overloaded_upstream().await;
        let adapter =
            GeminiChatAdapter::from_credentials("test-key", &base, "gemini-2.5-pro".to_string());

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            adapter.send("be Lexi", &[], "hello", &GenerationConfig::default()),
        )
        .await
        .expect("a single failed attempt should return promptly");

        let err = result.unwrap_err();
        assert_eq!(err.status_code(), 502);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn full_probe_reports_upstream_failure_after_one_attempt() {
        let (base, hits) = spawn_overloaded_upstream().await;
        let adapter =
            GeminiChatAdapter::from_credentials("test-key", &base, "gemini-2.5-pro".to_string());

        let result = tokio::time::timeout(Duration::from_secs(5), adapter.ping())
            .await
            .expect("ping should not wait on retries");

        assert!(result.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
