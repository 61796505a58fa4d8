use std::sync::Arc;

use log::debug;

use crate::config::{ModelSelection, Provider, ProviderSettings};
use crate::error::Result;
use crate::llm::model::{ChatModel, ModelFactory};
use crate::providers::{GeminiClient, OllamaClient, OpenAiClient};

/// Builds HTTP-backed chat models. No request is made until the model is
/// first invoked.
#[derive(Debug, Clone, Default)]
pub struct HttpModelFactory {
    settings: ProviderSettings,
}

impl HttpModelFactory {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }

    pub fn from_env() -> Self {
        Self::new(ProviderSettings::from_env())
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }
}

impl ModelFactory for HttpModelFactory {
    fn create(&self, selection: &ModelSelection) -> Result<Arc<dyn ChatModel>> {
        debug!("Creating {} model {}", selection.provider, selection.model);
        let model: Arc<dyn ChatModel> = match selection.provider {
            Provider::OpenAi => Arc::new(
                OpenAiClient::new(self.settings.openai_key()?, selection.model.clone())
                    .with_base_url(self.settings.openai_base_url.clone()),
            ),
            Provider::GoogleGemini => Arc::new(
                GeminiClient::new(self.settings.gemini_key()?, selection.model.clone())
                    .with_base_url(self.settings.gemini_base_url.clone()),
            ),
            Provider::Ollama => Arc::new(
                OllamaClient::new(selection.model.clone())
                    .with_base_url(self.settings.ollama_base_url.clone()),
            ),
        };
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelLeverError;

    fn settings_with_keys() -> ProviderSettings {
        ProviderSettings {
            openai_api_key: Some("sk-test".into()),
            gemini_api_key: Some("g-test".into()),
            ..ProviderSettings::default()
        }
    }

    #[test]
    fn test_creates_each_provider() {
        let factory = HttpModelFactory::new(settings_with_keys());
        for provider in Provider::ALL {
            let model = factory
                .create(&ModelSelection::new(provider, "some-model"))
                .unwrap();
            assert_eq!(model.provider(), provider);
            assert_eq!(model.model_name(), "some-model");
        }
    }

    #[test]
    fn test_ollama_needs_no_credentials() {
        let factory = HttpModelFactory::default();
        assert!(factory
            .create(&ModelSelection::new(Provider::Ollama, "llama3:latest"))
            .is_ok());
    }

    #[test]
    fn test_gemini_without_key_fails_at_creation() {
        let factory = HttpModelFactory::default();
        let err = factory
            .create(&ModelSelection::new(Provider::GoogleGemini, "gemini-1.5-flash-latest"))
            .err()
            .unwrap();
        assert!(matches!(err, ModelLeverError::MissingCredentials { .. }));
    }
}
