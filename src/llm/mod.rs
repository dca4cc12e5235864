//! Hosted chat model clients
//!
//! Models are addressed by a `provider/model` handle such as
//! `gemini/gemini-2.5-flash` or `openai/gpt-5-mini`.

pub mod gemini;
pub mod openai;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::http_client;
use crate::settings::{self, Settings};
use crate::{Result, VacaigentError};

pub use gemini::GeminiModel;
pub use openai::OpenAiModel;

/// A single-turn prompt
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub prompt: String,
}

/// Something that turns a prompt into text
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The `provider/model` handle
    fn name(&self) -> &str;

    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gemini => f.write_str("gemini"),
            Provider::OpenAi => f.write_str("openai"),
        }
    }
}

/// Parsed model handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: Provider,
    pub model: String,
}

impl FromStr for ModelSpec {
    type Err = VacaigentError;

    fn from_str(handle: &str) -> Result<Self> {
        let handle = handle.trim();
        let (provider, model) = match handle.split_once('/') {
            Some((prefix, model)) => {
                let provider = match prefix.to_ascii_lowercase().as_str() {
                    "gemini" | "google" => Provider::Gemini,
                    "openai" => Provider::OpenAi,
                    other => {
                        return Err(VacaigentError::config(format!(
                            "Unsupported model provider '{other}'"
                        )));
                    }
                };
                (provider, model)
            }
            None if handle.starts_with("gemini") => (Provider::Gemini, handle),
            None if handle.starts_with("gpt")
                || (handle.starts_with('o')
                    && handle[1..].starts_with(|c: char| c.is_ascii_digit())) =>
            {
                (Provider::OpenAi, handle)
            }
            None => {
                return Err(VacaigentError::config(format!(
                    "Cannot infer provider for model '{handle}'; use provider/model"
                )));
            }
        };

        if model.is_empty() {
            return Err(VacaigentError::config(format!(
                "Model handle '{handle}' has no model name"
            )));
        }

        Ok(Self {
            provider,
            model: model.to_string(),
        })
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Instantiate the client for a model handle, taking its key from `settings`
pub fn build_model(
    spec: &ModelSpec,
    settings: &Settings,
    config: &LlmConfig,
) -> Result<Arc<dyn ChatModel>> {
    let client = http_client::build_client(
        Duration::from_secs(config.timeout_seconds.into()),
        config.max_retries,
    )?;

    let model: Arc<dyn ChatModel> = match spec.provider {
        Provider::Gemini => {
            let key = settings
                .gemini_api_key
                .clone()
                .ok_or(VacaigentError::MissingKeys {
                    keys: vec![settings::GEMINI_API_KEY],
                })?;
            Arc::new(GeminiModel::new(
                client,
                key,
                &spec.model,
                &config.gemini_base_url,
                config.temperature,
            ))
        }
        Provider::OpenAi => {
            let key = settings
                .openai_api_key
                .clone()
                .ok_or(VacaigentError::MissingKeys {
                    keys: vec![settings::OPENAI_API_KEY],
                })?;
            Arc::new(OpenAiModel::new(
                client,
                key,
                &spec.model,
                &config.openai_base_url,
                config.temperature,
            ))
        }
    };

    tracing::debug!(model = model.name(), "model client ready");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("gemini/gemini-2.5-flash", Provider::Gemini, "gemini-2.5-flash")]
    #[case("google/gemini-2.0-flash", Provider::Gemini, "gemini-2.0-flash")]
    #[case("openai/gpt-5-mini", Provider::OpenAi, "gpt-5-mini")]
    #[case("gpt-4o", Provider::OpenAi, "gpt-4o")]
    #[case("o3-mini", Provider::OpenAi, "o3-mini")]
    #[case("gemini-2.5-pro", Provider::Gemini, "gemini-2.5-pro")]
    fn test_parse_model_handles(
        #[case] handle: &str,
        #[case] provider: Provider,
        #[case] model: &str,
    ) {
        let spec: ModelSpec = handle.parse().unwrap();
        assert_eq!(spec.provider, provider);
        assert_eq!(spec.model, model);
    }

    #[rstest]
    #[case("anthropic/claude")]
    #[case("llama3")]
    #[case("openai/")]
    fn test_reject_unknown_handles(#[case] handle: &str) {
        assert!(handle.parse::<ModelSpec>().is_err());
    }

    #[test]
    fn test_display_round_trips_prefix() {
        let spec: ModelSpec = "gpt-5-mini".parse().unwrap();
        assert_eq!(spec.to_string(), "openai/gpt-5-mini");
    }

    #[test]
    fn test_build_model_requires_provider_key() {
        let spec: ModelSpec = "openai/gpt-5-mini".parse().unwrap();
        let settings = Settings::default();
        let err = build_model(&spec, &settings, &LlmConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Missing required API keys: OPENAI_API_KEY");
    }

    #[test]
    fn test_build_model_uses_handle_as_name() {
        let spec: ModelSpec = "gemini/gemini-2.5-flash".parse().unwrap();
        let settings = Settings {
            gemini_api_key: Some("key".into()),
            ..Settings::default()
        };
        let model = build_model(&spec, &settings, &LlmConfig::default()).unwrap();
        assert_eq!(model.name(), "gemini/gemini-2.5-flash");
    }
}
