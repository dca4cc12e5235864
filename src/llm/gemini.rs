//! Google Gemini `generateContent` client

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{ChatModel, ChatRequest};
use crate::http_client;
use crate::{Result, VacaigentError};

pub struct GeminiModel {
    client: ClientWithMiddleware,
    api_key: String,
    model: String,
    handle: String,
    base_url: String,
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiModel {
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
            handle: format!("gemini/{model}"),
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature,
        }
    }

    fn error(&self, message: impl Into<String>) -> VacaigentError {
        VacaigentError::llm(&self.handle, message)
    }
}

#[async_trait]
impl ChatModel for GeminiModel {
    fn name(&self) -> &str {
        &self.handle
    }

    #[instrument(skip_all, fields(model = %self.handle))]
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &request.system,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        debug!(prompt_chars = request.prompt.len(), "calling Gemini");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.error(format!("request failed: {}", http_client::send_error(e))))?;

        if !response.status().is_success() {
            let detail = http_client::error_detail(response).await;
            warn!("Gemini request failed: {}", detail);
            return Err(self.error(detail));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| self.error(format!("invalid response: {e}")))?;

        let candidate = parsed.candidates.into_iter().next();
        let text: String = candidate
            .as_ref()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .or_else(|| candidate.and_then(|c| c.finish_reason))
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(self.error(format!("empty response ({reason})")));
        }

        Ok(text)
    }
}
