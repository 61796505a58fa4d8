//! In-memory vector store over summary documents and the payload store that
//! maps document ids back to original content.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use tokio::sync::RwLock;

use crate::embedding::EmbeddingProvider;
use crate::error::{ModelLeverError, Result};
use crate::schema::IndexedDocument;

#[derive(Debug, Clone)]
struct StoredDocument {
    document: IndexedDocument,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: IndexedDocument,
    pub score: f32,
}

/// Cosine similarity; 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A single named collection of embedded documents, searched by linear scan.
pub struct InMemoryVectorStore {
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
    documents: RwLock<Vec<StoredDocument>>,
}

impl InMemoryVectorStore {
    pub fn new(collection: impl Into<String>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            collection: collection.into(),
            embedder,
            documents: RwLock::new(Vec::new()),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Embeds `documents` in one batch and appends them. Returns their ids.
    pub async fn add_documents(&self, documents: Vec<IndexedDocument>) -> Result<Vec<String>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = documents.iter().map(|d| d.page_content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != documents.len() {
            return Err(ModelLeverError::Embedding {
                provider: self.embedder.name().to_string(),
                message: format!(
                    "expected {} embeddings, got {}",
                    documents.len(),
                    embeddings.len()
                ),
            });
        }

        let expected = self.embedder.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            return Err(ModelLeverError::Embedding {
                provider: self.embedder.name().to_string(),
                message: format!("expected {} dimensions, got {}", expected, bad.len()),
            });
        }

        let ids = documents.iter().map(|d| d.id().to_string()).collect();
        let mut store = self.documents.write().await;
        store.extend(
            documents
                .into_iter()
                .zip(embeddings)
                .map(|(document, embedding)| StoredDocument { document, embedding }),
        );
        debug!(
            "Collection '{}' now holds {} documents",
            self.collection,
            store.len()
        );
        Ok(ids)
    }

    /// The `k` documents most similar to `query`, best first. Ties keep
    /// insertion order.
    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        if k == 0 || self.is_empty().await {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let store = self.documents.read().await;
        let mut scored: Vec<ScoredDocument> = store
            .iter()
            .map(|stored| ScoredDocument {
                document: stored.document.clone(),
                score: cosine_similarity(&stored.embedding, &query_embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }
}

/// Original payloads keyed by document id.
#[derive(Debug, Default)]
pub struct InMemoryPayloadStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryPayloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mset(&self, pairs: Vec<(String, String)>) {
        let mut entries = self.entries.write().await;
        entries.extend(pairs);
    }

    /// One slot per key, `None` where the key is absent.
    pub async fn mget(&self, keys: &[&str]) -> Vec<Option<String>> {
        let entries = self.entries.read().await;
        keys.iter().map(|key| entries.get(*key).cloned()).collect()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
