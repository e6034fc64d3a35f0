pub mod gemini_llm;

pub use gemini_llm::GeminiChatAdapter;
