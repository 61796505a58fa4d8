//! Multi-vector retrieval: search runs over summaries, results are the
//! original payloads the summaries were generated from.

use std::sync::Arc;

use log::{debug, info};
use uuid::Uuid;

use crate::config::EmbeddingSettings;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::schema::{IndexedDocument, SummarizedContent, SummarySet, ID_KEY};
use crate::store::{InMemoryPayloadStore, InMemoryVectorStore};

pub const DEFAULT_TOP_K: usize = 4;

pub struct MultiVectorRetriever {
    vector_store: InMemoryVectorStore,
    payload_store: InMemoryPayloadStore,
    id_key: &'static str,
    top_k: usize,
}

impl MultiVectorRetriever {
    pub fn new(collection: impl Into<String>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            vector_store: InMemoryVectorStore::new(collection, embedder),
            payload_store: InMemoryPayloadStore::new(),
            id_key: ID_KEY,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn id_key(&self) -> &str {
        self.id_key
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn vector_store(&self) -> &InMemoryVectorStore {
        &self.vector_store
    }

    pub fn payload_store(&self) -> &InMemoryPayloadStore {
        &self.payload_store
    }

    /// Indexes one summary set: its documents go to the vector store in one
    /// batch, then its payloads to the payload store in one batch. Empty sets
    /// are a no-op. Returns the generated ids in entry order.
    pub async fn add_summary_set(&self, set: &SummarySet) -> Result<Vec<String>> {
        if set.is_empty() {
            debug!("Skipping empty {} summary set", set.media_type());
            return Ok(Vec::new());
        }

        let ids: Vec<String> = (0..set.len()).map(|_| Uuid::new_v4().to_string()).collect();
        let documents: Vec<IndexedDocument> = set
            .entries()
            .zip(&ids)
            .map(|((payload, summary), id)| {
                IndexedDocument::new(id.clone(), set.media_type(), summary, payload)
            })
            .collect();

        self.vector_store.add_documents(documents).await?;
        self.payload_store
            .mset(ids.iter().cloned().zip(set.payload().iter().cloned()).collect())
            .await;

        Ok(ids)
    }

    /// Original payloads of the best matching summaries, best first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<String>> {
        let hits = self.vector_store.similarity_search(query, self.top_k).await?;
        let ids: Vec<&str> = hits.iter().map(|hit| hit.document.id()).collect();
        let payloads: Vec<String> = self
            .payload_store
            .mget(&ids)
            .await
            .into_iter()
            .flatten()
            .collect();
        debug!(
            "Retrieved {} payloads for query '{}' ({} hits)",
            payloads.len(),
            query,
            hits.len()
        );
        Ok(payloads)
    }
}

/// Builds a [`MultiVectorRetriever`] from summarized content.
pub struct RetrieverBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    collection: String,
    top_k: usize,
}

impl RetrieverBuilder {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let defaults = EmbeddingSettings::default();
        Self {
            embedder,
            collection: defaults.collection,
            top_k: defaults.top_k,
        }
    }

    pub fn from_settings(embedder: Arc<dyn EmbeddingProvider>, settings: &EmbeddingSettings) -> Self {
        Self {
            embedder,
            collection: settings.collection.clone(),
            top_k: settings.top_k,
        }
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub async fn build(&self, summaries: &SummarizedContent) -> Result<MultiVectorRetriever> {
        let retriever = MultiVectorRetriever::new(self.collection.clone(), Arc::clone(&self.embedder))
            .with_top_k(self.top_k);
        self.build_into(&retriever, summaries).await?;
        Ok(retriever)
    }

    /// Indexes every non-empty set in text, table, image order. A failure
    /// part way leaves already indexed sets in place.
    pub async fn build_into(
        &self,
        retriever: &MultiVectorRetriever,
        summaries: &SummarizedContent,
    ) -> Result<()> {
        for (label, set) in summaries.sets() {
            let ids = retriever.add_summary_set(set).await?;
            info!("Indexed {} entries from {}", ids.len(), label);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::FailingEmbedder;
    use crate::embedding::HashingEmbedder;
    use crate::error::ModelLeverError;
    use crate::schema::MediaType;

    fn builder() -> RetrieverBuilder {
        RetrieverBuilder::new(Arc::new(HashingEmbedder::default()))
    }

    #[tokio::test]
    async fn test_empty_content_builds_empty_retriever() {
        let retriever = builder().build(&SummarizedContent::empty()).await.unwrap();

        assert!(retriever.vector_store().is_empty().await);
        assert!(retriever.payload_store().is_empty().await);
        assert!(retriever.retrieve("what's the total revenue").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_every_document_has_matching_payload() {
        let retriever = builder().build(&SummarizedContent::empty()).await.unwrap();
        let set = SummarySet::new(
            MediaType::Text,
            vec!["Revenue: $10M".into(), "Headcount: 120".into()],
            vec!["total revenue of ten million".into(), "employee headcount".into()],
        )
        .unwrap();

        let ids = retriever.add_summary_set(&set).await.unwrap();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        for (id, payload) in ids.iter().zip(set.payload()) {
            assert_eq!(retriever.payload_store().get(id).await.as_ref(), Some(payload));
        }
    }

    #[tokio::test]
    async fn test_image_documents_carry_source() {
        let retriever = builder().build(&SummarizedContent::empty()).await.unwrap();
        let set = SummarySet::new(
            MediaType::Image,
            vec!["figures/revenue.jpg".into()],
            vec!["bar chart of quarterly revenue".into()],
        )
        .unwrap();
        retriever.add_summary_set(&set).await.unwrap();

        let hits = retriever
            .vector_store()
            .similarity_search("quarterly revenue", 1)
            .await
            .unwrap();
        assert_eq!(hits[0].document.metadata.source.as_deref(), Some("figures/revenue.jpg"));
        assert_eq!(hits[0].document.metadata.media_type, MediaType::Image);
    }

    #[tokio::test]
    async fn test_top_k_limits_results() {
        let set = SummarySet::new(
            MediaType::Text,
            (0..6).map(|i| format!("payload {}", i)).collect(),
            (0..6).map(|i| format!("revenue line {}", i)).collect(),
        )
        .unwrap();
        let content = SummarizedContent {
            text_summaries: set,
            ..SummarizedContent::empty()
        };

        let retriever = builder().build(&content).await.unwrap();
        assert_eq!(retriever.retrieve("revenue").await.unwrap().len(), DEFAULT_TOP_K);

        let narrow = builder().top_k(1).build(&content).await.unwrap();
        assert_eq!(narrow.retrieve("revenue").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_set_keeps_earlier_sets_indexed() {
        let embedder = Arc::new(FailingEmbedder::on_batch(2));
        let builder = RetrieverBuilder::new(embedder.clone());
        let retriever = MultiVectorRetriever::new("summaries", embedder);

        let content = SummarizedContent {
            text_summaries: SummarySet::new(
                MediaType::Text,
                vec!["Revenue: $10M".into()],
                vec!["total revenue".into()],
            )
            .unwrap(),
            table_summaries: SummarySet::new(
                MediaType::Text,
                vec!["Q1 | Q2\n4M | 6M".into()],
                vec!["quarterly revenue table".into()],
            )
            .unwrap(),
            ..SummarizedContent::empty()
        };
        let err = builder.build_into(&retriever, &content).await.unwrap_err();

        assert!(matches!(err, ModelLeverError::Embedding { .. }));
        assert_eq!(retriever.vector_store().len().await, 1);
        assert_eq!(retriever.payload_store().len().await, 1);
        assert_eq!(
            retriever.retrieve("total revenue").await.unwrap(),
            vec!["Revenue: $10M".to_string()]
        );
    }
}
