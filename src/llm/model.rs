use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ModelSelection, Provider};
use crate::error::Result;
use crate::llm::message::{build_multimodal_prompt, ChatMessage, MultimodalInput};

/// A chat model behind one of the supported providers.
///
/// Implementations only translate [`ChatMessage`]s to their wire format in
/// [`chat`](ChatModel::chat) and return the reply as plain text. Prompt shape
/// selection for multimodal calls is shared through
/// [`invoke_multimodal`](ChatModel::invoke_multimodal).
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn provider(&self) -> Provider;

    fn model_name(&self) -> &str;

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Single human turn carrying `prompt`.
    async fn invoke(&self, prompt: &str) -> Result<String> {
        self.chat(vec![ChatMessage::human(prompt)]).await
    }

    async fn invoke_multimodal(&self, input: &MultimodalInput) -> Result<String> {
        let messages = build_multimodal_prompt(self.provider(), input);
        self.chat(messages).await
    }
}

/// Turns a model selection into a callable handle.
pub trait ModelFactory: Send + Sync {
    fn create(&self, selection: &ModelSelection) -> Result<Arc<dyn ChatModel>>;
}
