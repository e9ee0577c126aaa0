//! OpenAI-compatible chat-completions backend.

use super::TextCompletion;
use crate::config::CompletionConfig;
use crate::core::{Message, Role};
use crate::errors::CompletionError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const MAX_ERROR_BODY: usize = 512;

/// Calls `POST {base_url}/chat/completions` once per generation.
pub struct OpenAiCompletion {
    config: CompletionConfig,
    /// Pre-computed `"Bearer <key>"` header value.
    auth_header: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
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

impl OpenAiCompletion {
    /// Creates a backend, reading the API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::NotConfigured`] if the key is missing or the
    /// HTTP client cannot be built.
    pub fn from_config(config: CompletionConfig) -> Result<Self, CompletionError> {
        let api_key = config.api_key().ok_or_else(|| {
            CompletionError::NotConfigured(format!("{} is not set", config.api_key_env))
        })?;
        Self::with_api_key(config, &api_key)
    }

    /// Creates a backend with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::NotConfigured`] if the timeout is invalid or
    /// the HTTP client cannot be built.
    pub fn with_api_key(config: CompletionConfig, api_key: &str) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(config.timeout()?)
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| CompletionError::NotConfigured(e.to_string()))?;

        Ok(Self {
            config,
            auth_header: format!("Bearer {api_key}"),
            client,
        })
    }

    fn build_request<'a>(&'a self, messages: &'a [Message]) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: wire_role(m.role()),
                    content: m.text(),
                })
                .collect(),
            temperature: self.config.temperature,
        }
    }
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::System => "system",
        Role::Assistant => "assistant",
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[async_trait]
impl TextCompletion for OpenAiCompletion {
    async fn generate(&self, messages: &[Message]) -> Result<Message, CompletionError> {
        let request = self.build_request(messages);
        debug!(model = %self.config.model, messages = messages.len(), "sending completion request");

        let response = self
            .client
            .post(self.config.chat_url())
            .header("Authorization", &self.auth_header)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: truncate(body),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::Malformed("response has no content".to_string()))?;

        Ok(Message::assistant(content))
    }
}

impl std::fmt::Debug for OpenAiCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompletion")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}
