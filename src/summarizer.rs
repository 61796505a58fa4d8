//! Per-item summarization of extracted tables, paragraphs and images.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::error::{ModelLeverError, Result};
use crate::llm::message::MultimodalInput;
use crate::llm::model::ChatModel;
use crate::llm::prompts::{content_summary_prompt, IMAGE_ANALYST_PROMPT, IMAGE_DESCRIBE_PROMPT};
use crate::schema::{ExtractedContent, MediaType, SummarizedContent, SummarySet};
use crate::utils::encode_image_base64;

pub struct ImageSummarizer {
    model: Arc<dyn ChatModel>,
    instruction: String,
}

impl ImageSummarizer {
    /// Uses the financial analyst instruction.
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            instruction: IMAGE_ANALYST_PROMPT.to_string(),
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub async fn summarize(&self, path: &Path) -> Result<String> {
        let image_data = encode_image_base64(path).await?;
        debug!(
            "Summarizing image {} with {} ({})",
            path.display(),
            self.model.model_name(),
            self.model.provider()
        );
        self.model
            .invoke_multimodal(&MultimodalInput::new(self.instruction.clone(), image_data))
            .await
    }
}

/// Summarizes one image with the financial analyst instruction.
pub async fn summarize_image(model: Arc<dyn ChatModel>, path: &Path) -> Result<String> {
    ImageSummarizer::new(model).summarize(path).await
}

/// Runs one model call per table, paragraph and image, in that order and
/// strictly one after another.
pub struct ContentSummarizer {
    model: Arc<dyn ChatModel>,
}

impl ContentSummarizer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn summarize(&self, content: &ExtractedContent) -> Result<SummarizedContent> {
        let image_payload = image_payloads(&content.image_paths)?;
        let table_summaries = self.summarize_texts(&content.table_elements).await?;
        let text_summaries = self.summarize_texts(&content.text_elements).await?;

        let images = ImageSummarizer::new(Arc::clone(&self.model))
            .with_instruction(IMAGE_DESCRIBE_PROMPT);
        let mut image_summaries = Vec::with_capacity(content.image_paths.len());
        for path in &content.image_paths {
            image_summaries.push(images.summarize(path).await?);
        }

        info!(
            "The size of text summary is {}, table summary is {}, image summary is {}",
            text_summaries.len(),
            table_summaries.len(),
            image_summaries.len()
        );

        Ok(SummarizedContent {
            text_summaries: SummarySet::new(
                MediaType::Text,
                content.text_elements.clone(),
                text_summaries,
            )?,
            table_summaries: SummarySet::new(
                MediaType::Text,
                content.table_elements.clone(),
                table_summaries,
            )?,
            image_summaries: SummarySet::new(MediaType::Image, image_payload, image_summaries)?,
        })
    }

    async fn summarize_texts(&self, items: &[String]) -> Result<Vec<String>> {
        let mut summaries = Vec::with_capacity(items.len());
        for item in items {
            summaries.push(self.model.invoke(&content_summary_prompt(item)).await?);
        }
        Ok(summaries)
    }
}

/// Image payloads are re-opened at answer time, so they must round-trip
/// through `String` exactly.
fn image_payloads(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|path| {
            path.to_str().map(str::to_owned).ok_or_else(|| {
                ModelLeverError::InvalidImageData(format!(
                    "image path is not valid UTF-8: {}",
                    path.display()
                ))
            })
        })
        .collect()
}
