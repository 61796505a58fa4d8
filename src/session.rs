//! The explicit per-session context and the pipeline that acts on it.

use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::answer::QueryAnswerer;
use crate::config::{AnswerSettings, EmbeddingSettings, ModelSelection, ProcessingApproach};
use crate::embedding::EmbeddingProvider;
use crate::error::{ModelLeverError, Result};
use crate::llm::model::{ChatModel, ModelFactory};
use crate::retriever::{MultiVectorRetriever, RetrieverBuilder};
use crate::schema::{ExtractedContent, SummarizedContent};
use crate::summarizer::{ContentSummarizer, ImageSummarizer};

/// What one user has chosen and built so far.
pub struct PipelineContext {
    pub selection: ModelSelection,
    pub approach: ProcessingApproach,
    retriever: Option<Arc<MultiVectorRetriever>>,
}

impl PipelineContext {
    pub fn new(selection: ModelSelection, approach: ProcessingApproach) -> Self {
        Self {
            selection,
            approach,
            retriever: None,
        }
    }

    pub fn retriever(&self) -> Result<&Arc<MultiVectorRetriever>> {
        self.retriever.as_ref().ok_or(ModelLeverError::RetrieverNotBuilt)
    }

    pub fn has_retriever(&self) -> bool {
        self.retriever.is_some()
    }

    pub fn set_retriever(&mut self, retriever: MultiVectorRetriever) {
        self.retriever = Some(Arc::new(retriever));
    }
}

pub struct ModelLever {
    factory: Arc<dyn ModelFactory>,
    embedder: Arc<dyn EmbeddingProvider>,
    answer: AnswerSettings,
    embedding: EmbeddingSettings,
}

impl ModelLever {
    pub fn new(factory: Arc<dyn ModelFactory>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            factory,
            embedder,
            answer: AnswerSettings::default(),
            embedding: EmbeddingSettings::default(),
        }
    }

    /// HTTP providers for chat and OpenAI embeddings, configured from `config`.
    #[cfg(feature = "providers")]
    pub fn from_config(config: &crate::config::PipelineConfig) -> Result<Self> {
        use crate::providers::{HttpModelFactory, OpenAiEmbedder};

        let embedder = OpenAiEmbedder::from_settings(&config.providers, &config.embedding)?;
        Ok(Self::new(
            Arc::new(HttpModelFactory::new(config.providers.clone())),
            Arc::new(embedder),
        )
        .with_answer_settings(config.answer.clone())
        .with_embedding_settings(config.embedding.clone()))
    }

    pub fn with_answer_settings(mut self, answer: AnswerSettings) -> Self {
        self.answer = answer;
        self
    }

    pub fn with_embedding_settings(mut self, embedding: EmbeddingSettings) -> Self {
        self.embedding = embedding;
        self
    }

    /// The summarization model the context selects.
    pub fn create_model(&self, ctx: &PipelineContext) -> Result<Arc<dyn ChatModel>> {
        self.factory.create(&ctx.selection)
    }

    pub async fn summarize(
        &self,
        ctx: &PipelineContext,
        content: &ExtractedContent,
    ) -> Result<SummarizedContent> {
        let model = self.create_model(ctx)?;
        ContentSummarizer::new(model).summarize(content).await
    }

    pub async fn summarize_image(&self, ctx: &PipelineContext, path: &Path) -> Result<String> {
        let model = self.create_model(ctx)?;
        ImageSummarizer::new(model).summarize(path).await
    }

    /// Indexes `summaries` and stores the retriever in `ctx`, replacing any
    /// earlier one. On failure `ctx` keeps its previous retriever.
    pub async fn build_retriever(
        &self,
        ctx: &mut PipelineContext,
        summaries: &SummarizedContent,
    ) -> Result<()> {
        let retriever = RetrieverBuilder::from_settings(Arc::clone(&self.embedder), &self.embedding)
            .build(summaries)
            .await?;
        ctx.set_retriever(retriever);
        Ok(())
    }

    /// Summarize then index.
    pub async fn index_content(
        &self,
        ctx: &mut PipelineContext,
        content: &ExtractedContent,
    ) -> Result<SummarizedContent> {
        let summaries = self.summarize(ctx, content).await?;
        self.build_retriever(ctx, &summaries).await?;
        info!(
            "Indexed {} summaries with {}",
            summaries.total_len(),
            ctx.selection.model
        );
        Ok(summaries)
    }

    /// Only the answer model for the context's approach is created.
    pub async fn ask(&self, ctx: &PipelineContext, question: &str) -> Result<String> {
        let retriever = ctx.retriever()?;
        let selection = match ctx.approach {
            ProcessingApproach::ExtractFromPdf => &self.answer.text_model,
            ProcessingApproach::ImageBased => &self.answer.image_model,
        };
        let model = self.factory.create(selection)?;
        QueryAnswerer::new(ctx.approach, model)
            .answer(retriever, question)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use crate::embedding::testing::FailingEmbedder;
    use crate::embedding::HashingEmbedder;
    use crate::llm::mock::MockModelFactory;
    use crate::schema::{MediaType, SummarySet};

    fn lever(factory: Arc<MockModelFactory>) -> ModelLever {
        ModelLever::new(factory, Arc::new(HashingEmbedder::default()))
    }

    #[tokio::test]
    async fn test_ask_before_indexing_fails() {
        let lever = lever(Arc::new(MockModelFactory::echo()));
        let ctx = PipelineContext::new(
            ModelSelection::new(Provider::Ollama, "llama3"),
            ProcessingApproach::ExtractFromPdf,
        );

        let err = lever.ask(&ctx, "revenue?").await.unwrap_err();
        assert!(matches!(err, ModelLeverError::RetrieverNotBuilt));
    }

    #[tokio::test]
    async fn test_index_then_ask_uses_answer_model() {
        let factory = Arc::new(MockModelFactory::echo());
        let lever = lever(factory.clone());
        let mut ctx = PipelineContext::new(
            ModelSelection::new(Provider::OpenAi, "gpt-4o"),
            ProcessingApproach::ExtractFromPdf,
        );

        let content = ExtractedContent {
            table_elements: vec!["Revenue: $10M".into()],
            ..Default::default()
        };
        lever.index_content(&mut ctx, &content).await.unwrap();
        assert!(ctx.has_retriever());

        let answer = lever.ask(&ctx, "what's the total revenue").await.unwrap();
        assert!(answer.contains("Revenue: $10M"));

        let calls = factory.log().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].provider, Provider::OpenAi);
        assert_eq!(calls[1].provider, Provider::Ollama);
        assert_eq!(calls[1].model, "llama3:latest");
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_retriever() {
        let factory = Arc::new(MockModelFactory::echo());
        let lever = ModelLever::new(factory, Arc::new(FailingEmbedder::on_batch(3)));
        let mut ctx = PipelineContext::new(
            ModelSelection::new(Provider::Ollama, "llama3"),
            ProcessingApproach::ExtractFromPdf,
        );

        let first = SummarizedContent {
            text_summaries: SummarySet::new(
                MediaType::Text,
                vec!["Revenue: $10M".into()],
                vec!["total revenue".into()],
            )
            .unwrap(),
            ..SummarizedContent::empty()
        };
        lever.build_retriever(&mut ctx, &first).await.unwrap();
        let previous = Arc::clone(ctx.retriever().unwrap());

        let second = SummarizedContent {
            text_summaries: SummarySet::new(
                MediaType::Text,
                vec!["Headcount: 120".into()],
                vec!["employee headcount".into()],
            )
            .unwrap(),
            table_summaries: SummarySet::new(
                MediaType::Text,
                vec!["Cash | 2M".into()],
                vec!["cash position".into()],
            )
            .unwrap(),
            ..SummarizedContent::empty()
        };
        let err = lever.build_retriever(&mut ctx, &second).await.unwrap_err();

        assert!(matches!(err, ModelLeverError::Embedding { .. }));
        let current = ctx.retriever().unwrap();
        assert!(Arc::ptr_eq(current, &previous));
        assert_eq!(current.vector_store().len().await, 1);
        assert_eq!(
            current.retrieve("revenue").await.unwrap(),
            vec!["Revenue: $10M".to_string()]
        );
    }
}
