use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{Provider, GEMINI_BASE_URL};
use crate::error::{ModelLeverError, Result};
use crate::llm::message::{ChatMessage, ContentPart, MessageContent, Role};
use crate::llm::model::ChatModel;
use crate::utils::parse_data_uri;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn generate_content(&self, payload: &GenerateContentRequest) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let res = self.client.post(&url).json(payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(ModelLeverError::model_request(
                Provider::GoogleGemini.as_str(),
                format!("Gemini API Error (status {}): {}", status, err_text),
            ));
        }

        let body: GenerateContentResponse = res.json().await?;
        let candidate = body
            .candidates
            .ok_or_else(|| {
                ModelLeverError::model_request(Provider::GoogleGemini.as_str(), "No candidates returned")
            })?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ModelLeverError::model_request(Provider::GoogleGemini.as_str(), "Empty candidates list")
            })?;

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text),
                Part::InlineData { .. } => None,
            })
            .collect();

        if text.is_empty() {
            return Err(ModelLeverError::model_request(
                Provider::GoogleGemini.as_str(),
                "Model returned non-text content",
            ));
        }
        Ok(text)
    }
}

fn to_parts(content: &MessageContent) -> Result<Vec<Part>> {
    match content {
        MessageContent::Text(text) => Ok(vec![Part::Text { text: text.clone() }]),
        MessageContent::Parts(parts) => parts.iter().map(to_part).collect(),
    }
}

fn to_part(part: &ContentPart) -> Result<Part> {
    match part {
        ContentPart::Text { text } => Ok(Part::Text { text: text.clone() }),
        ContentPart::ImageUrl { image_url } => {
            let (mime_type, data) = parse_data_uri(image_url.url())?;
            Ok(Part::InlineData {
                inline_data: Blob {
                    mime_type: mime_type.to_string(),
                    data: data.to_string(),
                },
            })
        }
    }
}

/// System messages become the system instruction; the rest become contents
/// with Gemini's `user`/`model` roles.
pub fn build_request(messages: &[ChatMessage]) -> Result<GenerateContentRequest> {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for message in messages {
        let parts = to_parts(&message.content)?;
        match message.role {
            Role::System => system_parts.extend(parts),
            Role::Human => contents.push(Content {
                role: Some("user".to_string()),
                parts,
            }),
            Role::Assistant => contents.push(Content {
                role: Some("model".to_string()),
                parts,
            }),
        }
    }

    let system_instruction = if system_parts.is_empty() {
        None
    } else {
        Some(Content {
            role: None,
            parts: system_parts,
        })
    };

    Ok(GenerateContentRequest {
        contents,
        system_instruction,
    })
}

#[async_trait]
impl ChatModel for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::GoogleGemini
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let payload = build_request(&messages)?;
        debug!(
            "Gemini request to {} with {} contents",
            self.model,
            payload.contents.len()
        );
        self.generate_content(&payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::message::{generate_prompt, MultimodalInput};
    use serde_json::json;

    #[test]
    fn test_generic_prompt_maps_to_inline_data() {
        let messages = generate_prompt(&MultimodalInput::new("describe", "QUJD"));
        let request = build_request(&messages).unwrap();

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [
                    {"role": "user", "parts": [{"inlineData": {"mimeType": "image/jpeg", "data": "QUJD"}}]}
                ],
                "systemInstruction": {"parts": [{"text": "describe"}]}
            })
        );
    }

    #[test]
    fn test_text_prompt_has_no_system_instruction() {
        let request = build_request(&[ChatMessage::human("hello")]).unwrap();
        assert!(request.system_instruction.is_none());
        assert_eq!(request.contents[0].parts, vec![Part::Text { text: "hello".into() }]);
    }

    #[test]
    fn test_response_parts_deserialize() {
        let body = json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "Revenue "}, {"text": "was $10M"}]}}]});
        let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
        let parts = &response.candidates.unwrap()[0].content.parts;
        assert_eq!(parts.len(), 2);
    }
}
