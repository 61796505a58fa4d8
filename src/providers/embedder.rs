use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{
    default_embedding_dimensions, EmbeddingSettings, ProviderSettings, DEFAULT_EMBEDDING_MODEL,
    OPENAI_BASE_URL,
};
use crate::embedding::EmbeddingProvider;
use crate::error::{ModelLeverError, Result};

const PROVIDER: &str = "OpenAI";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// The fixed embedding backend for summaries.
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    /// Sent to the API only when a width was asked for explicitly.
    requested_dimensions: Option<usize>,
}

impl OpenAiEmbedder {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ModelLeverError::Embedding {
                provider: PROVIDER.into(),
                message: "API key must not be empty".into(),
            });
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: default_embedding_dimensions(DEFAULT_EMBEDDING_MODEL),
            requested_dimensions: None,
        })
    }

    pub fn from_settings(providers: &ProviderSettings, embedding: &EmbeddingSettings) -> Result<Self> {
        let embedder = Self::new(providers.openai_key()?)?
            .with_base_url(providers.openai_base_url.clone())
            .with_model(embedding.model.clone());
        Ok(match embedding.dimensions {
            Some(dimensions) => embedder.with_dimensions(dimensions),
            None => embedder,
        })
    }

    /// Also resets the expected width to the model's own, unless one was
    /// requested with [`with_dimensions`](Self::with_dimensions).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        if self.requested_dimensions.is_none() {
            self.dimensions = default_embedding_dimensions(&self.model);
        }
        self
    }

    /// Asks the API for vectors of this width.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self.requested_dimensions = Some(dimensions);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ModelLeverError::Embedding {
                provider: PROVIDER.into(),
                message: "API returned empty response".into(),
            })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Embedding {} texts with {}", texts.len(), self.model);

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
            dimensions: self.requested_dimensions,
        };
        let url = format!("{}/embeddings", self.base_url);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!("Embedding request failed with {}", status);
            return Err(ModelLeverError::Embedding {
                provider: PROVIDER.into(),
                message: format!("API returned {}: {}", status, body),
            });
        }

        let body: EmbeddingResponse = res.json().await?;
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
