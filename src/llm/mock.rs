//! In-process chat models for tests and offline runs.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::{ModelSelection, Provider};
use crate::error::Result;
use crate::llm::message::ChatMessage;
use crate::llm::model::{ChatModel, ModelFactory};

pub type Responder = Arc<dyn Fn(&[ChatMessage]) -> Result<String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub provider: Provider,
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// Shared record of every call made through mock models.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<RecordedCall>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: RecordedCall) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Replies with the text of every message it receives, one per line.
pub fn echo_responder() -> Responder {
    Arc::new(|messages: &[ChatMessage]| -> Result<String> {
        Ok(messages
            .iter()
            .map(ChatMessage::text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    })
}

pub struct MockChatModel {
    provider: Provider,
    model: String,
    responder: Responder,
    log: CallLog,
}

impl MockChatModel {
    pub fn echo(provider: Provider, model: impl Into<String>) -> Self {
        Self::with_responder(provider, model, echo_responder())
    }

    pub fn with_reply(provider: Provider, model: impl Into<String>, reply: impl Into<String>) -> Self {
        let reply = reply.into();
        let responder: Responder =
            Arc::new(move |_: &[ChatMessage]| -> Result<String> { Ok(reply.clone()) });
        Self::with_responder(provider, model, responder)
    }

    pub fn with_responder(provider: Provider, model: impl Into<String>, responder: Responder) -> Self {
        Self {
            provider,
            model: model.into(),
            responder,
            log: CallLog::new(),
        }
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let reply = (self.responder)(&messages);
        self.log.push(RecordedCall {
            provider: self.provider,
            model: self.model.clone(),
            messages,
        });
        reply
    }
}

/// Builds a [`MockChatModel`] for any selection, all sharing one [`CallLog`].
pub struct MockModelFactory {
    responder: Responder,
    log: CallLog,
}

impl MockModelFactory {
    pub fn echo() -> Self {
        Self::with_responder(echo_responder())
    }

    pub fn with_responder(responder: Responder) -> Self {
        Self {
            responder,
            log: CallLog::new(),
        }
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }
}

impl ModelFactory for MockModelFactory {
    fn create(&self, selection: &ModelSelection) -> Result<Arc<dyn ChatModel>> {
        let model = MockChatModel::with_responder(
            selection.provider,
            selection.model.clone(),
            Arc::clone(&self.responder),
        )
        .with_log(self.log.clone());
        Ok(Arc::new(model))
    }
}
