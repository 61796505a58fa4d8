//! # Model Lever
//!
//! Question answering over documents that have already been extracted from a
//! PDF into text, tables and page images.
//!
//! ## Core Concepts
//!
//! - **Summarization**: every table, text chunk and image is summarized by the
//!   chat model the user selects (OpenAI, Google Gemini or Ollama)
//! - **Multi-vector index**: summaries are embedded for search while the raw
//!   payloads are kept in a separate store, linked by a `rec_id`
//! - **Answering**: text mode grounds a text model in the retrieved payloads,
//!   image mode sends the best matching image to a vision model
//!
//! ## Example
//!
//! ```rust,ignore
//! use model_lever::*;
//! use std::path::Path;
//!
//! let lever = ModelLever::from_config(&PipelineConfig::from_env())?;
//! let mut ctx = PipelineContext::new(
//!     ModelSelection::parse("Ollama", "llama3:latest")?,
//!     ProcessingApproach::ExtractFromPdf,
//! );
//!
//! let content = load_extracted_content(Path::new("report/extracted.json")).await?;
//! lever.index_content(&mut ctx, &content).await?;
//!
//! let answer = lever.ask(&ctx, "What's the total revenue?").await?;
//! ```

pub mod answer;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod llm;
pub mod retriever;
pub mod schema;
pub mod session;
pub mod store;
pub mod summarizer;
pub mod utils;

#[cfg(feature = "providers")]
pub mod providers;

pub use answer::{answer_from_image, answer_from_text, QueryAnswerer};
pub use config::{
    AnswerSettings, EmbeddingSettings, ModelSelection, PipelineConfig, ProcessingApproach,
    Provider, ProviderSettings,
};
pub use embedding::{EmbeddingProvider, HashingEmbedder};
pub use error::{ModelLeverError, Result};
pub use ingestion::load_extracted_content;
pub use llm::{ChatMessage, ChatModel, ModelFactory, MultimodalInput};
pub use retriever::{MultiVectorRetriever, RetrieverBuilder};
pub use schema::*;
pub use session::{ModelLever, PipelineContext};
pub use store::{InMemoryPayloadStore, InMemoryVectorStore, ScoredDocument};
pub use summarizer::{summarize_image, ContentSummarizer, ImageSummarizer};
pub use utils::{encode_image_base64, image_data_uri};

#[cfg(feature = "providers")]
pub use providers::{GeminiClient, HttpModelFactory, OllamaClient, OpenAiClient, OpenAiEmbedder};
