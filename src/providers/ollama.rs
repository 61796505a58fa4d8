use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{Provider, OLLAMA_BASE_URL};
use crate::error::{ModelLeverError, Result};
use crate::llm::message::{ChatMessage, Role};
use crate::llm::model::ChatModel;
use crate::utils::parse_data_uri;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OllamaMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaMessage>,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

/// Local Ollama server speaking `/api/chat`.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: OLLAMA_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Ollama takes images as raw base64 next to the message text.
pub fn build_request(model: &str, messages: &[ChatMessage]) -> Result<OllamaChatRequest> {
    let messages = messages
        .iter()
        .map(|message| -> Result<OllamaMessage> {
            let images = message
                .image_urls()
                .into_iter()
                .map(|url| parse_data_uri(url).map(|(_, data)| data.to_string()))
                .collect::<Result<Vec<_>>>()?;
            Ok(OllamaMessage {
                role: message.role,
                content: message.text(),
                images,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(OllamaChatRequest {
        model: model.to_string(),
        messages,
        stream: false,
    })
}

#[async_trait]
impl ChatModel for OllamaClient {
    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = build_request(&self.model, &messages)?;
        debug!("Ollama request to {} at {}", self.model, self.base_url);

        let url = format!("{}/api/chat", self.base_url);
        let res = self.client.post(&url).json(&request).send().await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(ModelLeverError::model_request(
                Provider::Ollama.as_str(),
                format!("Ollama returned {}: {}", status, err_text),
            ));
        }

        let body: OllamaChatResponse = res.json().await?;
        Ok(body.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::message::{generate_prompt, MultimodalInput};
    use serde_json::json;

    #[test]
    fn test_images_move_to_images_field() {
        let messages = generate_prompt(&MultimodalInput::new("describe", "QUJD"));
        let request = build_request("llava", &messages).unwrap();

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "llava",
                "messages": [
                    {"role": "system", "content": "describe"},
                    {"role": "user", "content": "", "images": ["QUJD"]}
                ],
                "stream": false
            })
        );
    }

    #[test]
    fn test_response_deserializes() {
        let body = json!({"model": "llama3", "message": {"role": "assistant", "content": "ok"}, "done": true});
        let response: OllamaChatResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.message.content, "ok");
    }
}
