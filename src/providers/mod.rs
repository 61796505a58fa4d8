//! HTTP clients for the supported chat and embedding backends.

pub mod embedder;
pub mod factory;
pub mod gemini;
pub mod ollama;
pub mod openai;

pub use embedder::OpenAiEmbedder;
pub use factory::HttpModelFactory;
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
