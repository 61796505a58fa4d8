use std::path::PathBuf;

use thiserror::Error;

use crate::schema::MediaType;

#[derive(Error, Debug)]
pub enum ModelLeverError {
    #[error("Unknown model provider '{0}': expected one of \"OpenAI\", \"Google Gemini\", \"Ollama\"")]
    UnknownProvider(String),

    #[error("Unknown processing approach '{0}'")]
    UnknownProcessingApproach(String),

    #[error("Missing credentials for {provider}: set {variable}")]
    MissingCredentials { provider: String, variable: String },

    #[error("Summary set for {media_type} media has {payload} payload entries but {summary} summaries")]
    SummaryLengthMismatch {
        media_type: MediaType,
        payload: usize,
        summary: usize,
    },

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid image data: {0}")]
    InvalidImageData(String),

    #[error("{provider} request failed: {message}")]
    ModelRequest { provider: String, message: String },

    #[error("Embedding error ({provider}): {message}")]
    Embedding { provider: String, message: String },

    #[error("No retriever has been built for this session")]
    RetrieverNotBuilt,

    #[error("Retrieval returned no results for query: {0}")]
    NoRetrievalResults(String),

    #[cfg(feature = "providers")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelLeverError {
    pub(crate) fn model_request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelRequest {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelLeverError>;
