//! Chat messages and the two multimodal prompt shapes.
//!
//! Gemini and Ollama take the generic shape from [`generate_prompt`]: the
//! instruction as a list of text parts in the system message and the image as
//! a bare data-URI string. OpenAI chat models need the structured shape filled
//! from [`OpenAiImagePromptTemplate`]: a plain-string system message and an
//! `image_url` object carrying a `url` field.

use serde::{Deserialize, Serialize};

use crate::config::Provider;
use crate::llm::prompts::render;
use crate::utils::image_data_uri;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "user")]
    Human,
    #[serde(rename = "assistant")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageUrl {
    Inline(String),
    Object { url: String },
}

impl ImageUrl {
    pub fn url(&self) -> &str {
        match self {
            ImageUrl::Inline(url) => url,
            ImageUrl::Object { url } => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Concatenated text of the message, ignoring image parts.
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn image_urls(&self) -> Vec<&str> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::ImageUrl { image_url } => Some(image_url.url()),
                    ContentPart::Text { .. } => None,
                })
                .collect(),
        }
    }
}

/// The two fields every multimodal prompt is filled from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultimodalInput {
    pub prompt_data: String,
    pub image_data: String,
}

impl MultimodalInput {
    pub fn new(prompt_data: impl Into<String>, image_data: impl Into<String>) -> Self {
        Self {
            prompt_data: prompt_data.into(),
            image_data: image_data.into(),
        }
    }
}

/// Generic multimodal prompt for Gemini and Ollama.
pub fn generate_prompt(input: &MultimodalInput) -> Vec<ChatMessage> {
    let system = ChatMessage {
        role: Role::System,
        content: MessageContent::Parts(vec![ContentPart::Text {
            text: input.prompt_data.clone(),
        }]),
    };
    let human = ChatMessage {
        role: Role::Human,
        content: MessageContent::Parts(vec![ContentPart::ImageUrl {
            image_url: ImageUrl::Inline(image_data_uri(&input.image_data)),
        }]),
    };
    vec![system, human]
}

/// Reusable system + image template for OpenAI chat models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiImagePromptTemplate {
    system_template: String,
    image_url_template: String,
}

impl Default for OpenAiImagePromptTemplate {
    fn default() -> Self {
        Self {
            system_template: "{promptData}".to_string(),
            image_url_template: "data:image/jpeg;base64,{imageData}".to_string(),
        }
    }
}

impl OpenAiImagePromptTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_variables(&self) -> [&'static str; 2] {
        ["promptData", "imageData"]
    }

    pub fn format(&self, input: &MultimodalInput) -> Vec<ChatMessage> {
        let vars = [
            ("promptData", input.prompt_data.as_str()),
            ("imageData", input.image_data.as_str()),
        ];
        let system = ChatMessage::system(render(&self.system_template, &vars));
        let human = ChatMessage {
            role: Role::Human,
            content: MessageContent::Parts(vec![ContentPart::ImageUrl {
                image_url: ImageUrl::Object {
                    url: render(&self.image_url_template, &vars),
                },
            }]),
        };
        vec![system, human]
    }
}

/// Picks the prompt shape the provider's API accepts.
pub fn build_multimodal_prompt(provider: Provider, input: &MultimodalInput) -> Vec<ChatMessage> {
    match provider {
        Provider::OpenAi => OpenAiImagePromptTemplate::new().format(input),
        Provider::GoogleGemini | Provider::Ollama => generate_prompt(input),
    }
}
