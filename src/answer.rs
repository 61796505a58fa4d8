use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use crate::config::ProcessingApproach;
use crate::error::{ModelLeverError, Result};
use crate::llm::message::{generate_prompt, MultimodalInput};
use crate::llm::model::ChatModel;
use crate::llm::prompts::{image_answer_prompt, text_answer_prompt};
use crate::retriever::MultiVectorRetriever;
use crate::utils::encode_image_base64;

/// Answers questions against a built retriever with the one model the
/// approach needs: a text model grounded in retrieved text and tables, or a
/// vision model shown the best matching image.
pub struct QueryAnswerer {
    approach: ProcessingApproach,
    model: Arc<dyn ChatModel>,
}

impl QueryAnswerer {
    pub fn new(approach: ProcessingApproach, model: Arc<dyn ChatModel>) -> Self {
        Self { approach, model }
    }

    pub fn approach(&self) -> ProcessingApproach {
        self.approach
    }

    pub async fn answer(&self, retriever: &MultiVectorRetriever, question: &str) -> Result<String> {
        match self.approach {
            ProcessingApproach::ExtractFromPdf => {
                answer_from_text(retriever, self.model.as_ref(), question).await
            }
            ProcessingApproach::ImageBased => {
                answer_from_image(retriever, self.model.as_ref(), question).await
            }
        }
    }
}

/// Grounds `model` in every retrieved payload.
pub async fn answer_from_text(
    retriever: &MultiVectorRetriever,
    model: &dyn ChatModel,
    question: &str,
) -> Result<String> {
    let context = retriever.retrieve(question).await?;
    debug!("Answering from {} retrieved passages", context.len());
    let prompt = text_answer_prompt(&context.join("\n\n"), question);
    model.invoke(&prompt).await
}

/// Uses only the first retrieved payload, which must be an image path, and
/// always sends the generic multimodal prompt.
pub async fn answer_from_image(
    retriever: &MultiVectorRetriever,
    model: &dyn ChatModel,
    question: &str,
) -> Result<String> {
    let results = retriever.retrieve(question).await?;
    let image_path = results
        .first()
        .ok_or_else(|| ModelLeverError::NoRetrievalResults(question.to_string()))?;
    info!("Answering from image {}", image_path);

    let image_data = encode_image_base64(Path::new(image_path)).await?;
    let input = MultimodalInput::new(image_answer_prompt(question), image_data);
    model.chat(generate_prompt(&input)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use crate::embedding::HashingEmbedder;
    use crate::llm::mock::MockChatModel;
    use crate::schema::{MediaType, SummarySet};

    async fn text_retriever() -> MultiVectorRetriever {
        let retriever = MultiVectorRetriever::new("summaries", Arc::new(HashingEmbedder::default()));
        let set = SummarySet::new(
            MediaType::Text,
            vec!["Total revenue for FY2023: $10M".into()],
            vec!["total revenue figure".into()],
        )
        .unwrap();
        retriever.add_summary_set(&set).await.unwrap();
        retriever
    }

    #[tokio::test]
    async fn test_text_mode_grounds_prompt_in_payload() {
        let text_model = Arc::new(MockChatModel::echo(Provider::Ollama, "llama3:latest"));
        let answerer = QueryAnswerer::new(ProcessingApproach::ExtractFromPdf, text_model.clone());

        let answer = answerer
            .answer(&text_retriever().await, "what's the total revenue")
            .await
            .unwrap();

        assert!(answer.contains("Total revenue for FY2023: $10M"));
        assert!(answer.ends_with("Question: what's the total revenue"));
        assert_eq!(text_model.log().len(), 1);
    }

    #[tokio::test]
    async fn test_image_mode_without_results_fails() {
        let retriever = MultiVectorRetriever::new("summaries", Arc::new(HashingEmbedder::default()));
        let model = Arc::new(MockChatModel::echo(Provider::GoogleGemini, "gemini"));
        let answerer = QueryAnswerer::new(ProcessingApproach::ImageBased, model.clone());

        let err = answerer
            .answer(&retriever, "revenue?")
            .await
            .unwrap_err();

        assert!(matches!(err, ModelLeverError::NoRetrievalResults(q) if q == "revenue?"));
        assert!(model.log().is_empty());
    }
}
