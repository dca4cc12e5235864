//! OpenAI chat completions client

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{ChatModel, ChatRequest};
use crate::http_client;
use crate::{Result, VacaigentError};

pub struct OpenAiModel {
    client: ClientWithMiddleware,
    api_key: String,
    model: String,
    handle: String,
    base_url: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

impl OpenAiModel {
    pub fn new(
        client: ClientWithMiddleware,
        api_key: String,
        model: &str,
        base_url: &str,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            api_key,
            model: model.to_string(),
            handle: format!("openai/{model}"),
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature,
        }
    }

    /// Reasoning models only accept the default temperature
    fn temperature(&self) -> Option<f32> {
        let fixed = self.model.starts_with("gpt-5")
            || (self.model.starts_with('o')
                && self.model[1..].starts_with(|c: char| c.is_ascii_digit()));
        (!fixed).then_some(self.temperature)
    }

    fn error(&self, message: impl Into<String>) -> VacaigentError {
        VacaigentError::llm(&self.handle, message)
    }
}

#[async_trait]
impl ChatModel for OpenAiModel {
    fn name(&self) -> &str {
        &self.handle
    }

    #[instrument(skip_all, fields(model = %self.handle))]
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: self.temperature(),
        };

        debug!(prompt_chars = request.prompt.len(), "calling OpenAI");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.error(format!("request failed: {}", http_client::send_error(e))))?;

        if !response.status().is_success() {
            let detail = http_client::error_detail(response).await;
            warn!("OpenAI request failed: {}", detail);
            return Err(self.error(detail));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| self.error(format!("invalid response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| self.error("no choices in response"))?;

        match choice.message.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => {
                let reason = choice
                    .message
                    .refusal
                    .or(choice.finish_reason)
                    .unwrap_or_else(|| "no content".to_string());
                Err(self.error(format!("empty response ({reason})")))
            }
        }
    }
}
