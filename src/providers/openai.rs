use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{Provider, OPENAI_BASE_URL};
use crate::error::{ModelLeverError, Result};
use crate::llm::message::{ChatMessage, ContentPart, ImageUrl, MessageContent};
use crate::llm::model::ChatModel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Image parts are always sent as `{"url": ...}` objects, which is the only
/// form the chat completions API accepts.
pub fn build_request(model: &str, messages: Vec<ChatMessage>) -> ChatCompletionRequest {
    let messages = messages
        .into_iter()
        .map(|message| match message.content {
            MessageContent::Parts(parts) => ChatMessage {
                role: message.role,
                content: MessageContent::Parts(
                    parts
                        .into_iter()
                        .map(|part| match part {
                            ContentPart::ImageUrl { image_url } => ContentPart::ImageUrl {
                                image_url: ImageUrl::Object {
                                    url: image_url.url().to_string(),
                                },
                            },
                            text => text,
                        })
                        .collect(),
                ),
            },
            content => ChatMessage {
                role: message.role,
                content,
            },
        })
        .collect();

    ChatCompletionRequest {
        model: model.to_string(),
        messages,
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = build_request(&self.model, messages);
        debug!(
            "OpenAI request to {} with {} messages",
            self.model,
            request.messages.len()
        );

        let url = format!("{}/chat/completions", self.base_url);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await?;
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ModelLeverError::model_request(
                Provider::OpenAi.as_str(),
                format!("API returned {}: {}", status, detail),
            ));
        }

        let body: ChatCompletionResponse = res.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ModelLeverError::model_request(Provider::OpenAi.as_str(), "No message content returned")
            })
    }
}
