//! Chat-completion client for the hosted model.


use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OpenAiConfig;
use crate::openai::ApiClient;

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
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

#[derive(Debug, Clone)]
pub struct ChatClient {
    api: ApiClient,
    model: String,
}

impl ChatClient {
    #[inline]
    pub fn new(api: ApiClient, model: impl Into<String>) -> Self {
        Self {
            api,
            model: model.into(),
        }
    }

    #[inline]
    pub fn from_config(config: &OpenAiConfig, api_key: &str) -> Result<Self> {
        let api = ApiClient::new(config, api_key)?;
        Ok(Self::new(api, config.chat_model.clone()))
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the conversation and return the text of the first choice
    pub fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!(
            "Requesting chat completion from {} with {} messages",
            self.model,
            messages.len()
        );

        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        let response: ChatResponse = self
            .api
            .post_json(CHAT_COMPLETIONS_PATH, &request)
            .context("Chat completion request failed")?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| anyhow::anyhow!("Chat completion returned no choices"))
    }
}
