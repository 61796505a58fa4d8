use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelLeverError, Result};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

pub const DEFAULT_TEXT_ANSWER_MODEL: &str = "llama3:latest";
pub const DEFAULT_IMAGE_ANSWER_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Label the UI uses for the text/table processing approach.
pub const EXTRACT_FROM_PDF_LABEL: &str = "Extract data from PDF file";
pub const IMAGE_BASED_LABEL: &str = "Convert PDF pages to images";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "OpenAI")]
    OpenAi,
    #[serde(rename = "Google Gemini")]
    GoogleGemini,
    #[serde(rename = "Ollama")]
    Ollama,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::GoogleGemini, Provider::Ollama];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::GoogleGemini => "Google Gemini",
            Provider::Ollama => "Ollama",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ModelLeverError;

    fn from_str(s: &str) -> Result<Self> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| ModelLeverError::UnknownProvider(s.to_string()))
    }
}

/// Which content the question answerer works against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingApproach {
    /// Answer from extracted text and tables.
    #[default]
    ExtractFromPdf,
    /// Answer from page images.
    ImageBased,
}

impl FromStr for ProcessingApproach {
    type Err = ModelLeverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            EXTRACT_FROM_PDF_LABEL => Ok(ProcessingApproach::ExtractFromPdf),
            IMAGE_BASED_LABEL => Ok(ProcessingApproach::ImageBased),
            other => Err(ModelLeverError::UnknownProcessingApproach(other.to_string())),
        }
    }
}

/// The user's summarization model choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub provider: Provider,
    pub model: String,
}

impl ModelSelection {
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Parses the provider name as selected in the UI. Unknown names fail here
    /// rather than on first invocation.
    pub fn parse(provider: &str, model: impl Into<String>) -> Result<Self> {
        Ok(Self::new(provider.parse()?, model))
    }
}

/// Endpoints and credentials for the three chat providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub ollama_base_url: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: OPENAI_BASE_URL.to_string(),
            gemini_api_key: None,
            gemini_base_url: GEMINI_BASE_URL.to_string(),
            ollama_base_url: OLLAMA_BASE_URL.to_string(),
        }
    }
}

impl ProviderSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: env_var("OPENAI_API_KEY"),
            openai_base_url: env_var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            gemini_api_key: env_var("GEMINI_API_KEY").or_else(|| env_var("GOOGLE_API_KEY")),
            gemini_base_url: env_var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            ollama_base_url: env_var("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
        }
    }

    pub fn openai_key(&self) -> Result<&str> {
        required(self.openai_api_key.as_deref(), Provider::OpenAi, "OPENAI_API_KEY")
    }

    pub fn gemini_key(&self) -> Result<&str> {
        required(self.gemini_api_key.as_deref(), Provider::GoogleGemini, "GEMINI_API_KEY")
    }
}

/// Fixed models used to answer questions, independent of the summarization
/// selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSettings {
    pub text_model: ModelSelection,
    pub image_model: ModelSelection,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            text_model: ModelSelection::new(Provider::Ollama, DEFAULT_TEXT_ANSWER_MODEL),
            image_model: ModelSelection::new(Provider::GoogleGemini, DEFAULT_IMAGE_ANSWER_MODEL),
        }
    }
}

impl AnswerSettings {
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(model) = env_var("MODEL_LEVER_TEXT_ANSWER_MODEL") {
            settings.text_model.model = model;
        }
        if let Some(model) = env_var("MODEL_LEVER_IMAGE_ANSWER_MODEL") {
            settings.image_model.model = model;
        }
        settings
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub model: String,
    /// Vector width; derived from `model` when unset.
    #[serde(default)]
    pub dimensions: Option<usize>,
    pub collection: String,
    pub top_k: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: None,
            collection: "summaries".to_string(),
            top_k: 4,
        }
    }
}

impl EmbeddingSettings {
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(model) = env_var("MODEL_LEVER_EMBEDDING_MODEL") {
            settings.model = model;
        }
        settings.dimensions = env_var("MODEL_LEVER_EMBEDDING_DIMENSIONS").and_then(|v| v.parse().ok());
        settings
    }
}

/// Output width of the OpenAI embedding models; 1536 for anything unknown.
pub fn default_embedding_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub providers: ProviderSettings,
    pub answer: AnswerSettings,
    pub embedding: EmbeddingSettings,
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self {
            providers: ProviderSettings::from_env(),
            answer: AnswerSettings::from_env(),
            embedding: EmbeddingSettings::from_env(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required<'a>(value: Option<&'a str>, provider: Provider, variable: &str) -> Result<&'a str> {
    value.ok_or_else(|| ModelLeverError::MissingCredentials {
        provider: provider.to_string(),
        variable: variable.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parses_ui_names() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("Google Gemini".parse::<Provider>().unwrap(), Provider::GoogleGemini);
        assert_eq!("Ollama".parse::<Provider>().unwrap(), Provider::Ollama);
    }

    #[test]
    fn test_unknown_provider_fails_at_selection() {
        let err = ModelSelection::parse("Anthropic", "claude").unwrap_err();
        assert!(matches!(err, ModelLeverError::UnknownProvider(name) if name == "Anthropic"));
    }

    #[test]
    fn test_processing_approach_labels() {
        assert_eq!(
            EXTRACT_FROM_PDF_LABEL.parse::<ProcessingApproach>().unwrap(),
            ProcessingApproach::ExtractFromPdf
        );
        assert_eq!(
            IMAGE_BASED_LABEL.parse::<ProcessingApproach>().unwrap(),
            ProcessingApproach::ImageBased
        );
        assert!("Something else".parse::<ProcessingApproach>().is_err());
    }

    #[test]
    fn test_missing_key_reports_variable() {
        let settings = ProviderSettings::default();
        match settings.openai_key() {
            Err(ModelLeverError::MissingCredentials { provider, variable }) => {
                assert_eq!(provider, "OpenAI");
                assert_eq!(variable, "OPENAI_API_KEY");
            }
            other => panic!("expected missing credentials, got {:?}", other),
        }
    }

    #[test]
    fn test_default_answer_models() {
        let answer = AnswerSettings::default();
        assert_eq!(answer.text_model.provider, Provider::Ollama);
        assert_eq!(answer.text_model.model, "llama3:latest");
        assert_eq!(answer.image_model.provider, Provider::GoogleGemini);
        assert_eq!(answer.image_model.model, "gemini-1.5-flash-latest");
    }

    #[test]
    fn test_embedding_dimensions_follow_model() {
        assert_eq!(default_embedding_dimensions(DEFAULT_EMBEDDING_MODEL), 1536);
        assert_eq!(default_embedding_dimensions("text-embedding-3-small"), 1536);
        assert_eq!(default_embedding_dimensions("text-embedding-3-large"), 3072);
        assert_eq!(EmbeddingSettings::default().dimensions, None);
    }
}
