//! Error types and handling for the `VacAIgent` service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the `VacAIgent` service
#[derive(Error, Debug)]
pub enum VacaigentError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// One or more required provider secrets are not set
    #[error("Missing required API keys: {}", .keys.join(", "))]
    MissingKeys { keys: Vec<&'static str> },

    /// Input validation errors
    #[error("{message}")]
    Validation { message: String },

    /// Model provider errors
    #[error("LLM error ({model}): {message}")]
    Llm { model: String, message: String },

    /// Research tool errors
    #[error("Tool error ({tool}): {message}")]
    Tool { tool: String, message: String },

    /// Crew execution errors
    #[error("Crew error: {message}")]
    Crew { message: String },

    /// Both the primary and the fallback model failed
    #[error("Both {primary_model} and {fallback_model} failed. Primary: {primary}. Fallback: {fallback}")]
    Fallback {
        primary_model: String,
        fallback_model: String,
        primary: Box<VacaigentError>,
        fallback: Box<VacaigentError>,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl VacaigentError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new model provider error
    pub fn llm<M: Into<String>, S: Into<String>>(model: M, message: S) -> Self {
        Self::Llm {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Create a new tool error
    pub fn tool<T: Into<String>, S: Into<String>>(tool: T, message: S) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a new crew error
    pub fn crew<S: Into<String>>(message: S) -> Self {
        Self::Crew {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// HTTP status used when this error escapes a request handler
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            VacaigentError::Validation { .. } => StatusCode::BAD_REQUEST,
            VacaigentError::Llm { .. }
            | VacaigentError::Tool { .. }
            | VacaigentError::Fallback { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            VacaigentError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            VacaigentError::MissingKeys { .. } => {
                format!("{self}. Set them in the environment or a .env file.")
            }
            VacaigentError::Validation { message } => message.clone(),
            VacaigentError::Llm { .. } | VacaigentError::Fallback { .. } => {
                "The language model could not produce a trip plan. Please check your API keys or try again."
                    .to_string()
            }
            VacaigentError::Tool { .. } => {
                "Unable to reach the research services. Please check your internet connection."
                    .to_string()
            }
            VacaigentError::Crew { message } => message.clone(),
            VacaigentError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            VacaigentError::General { message } => message.clone(),
        }
    }
}

impl IntoResponse for VacaigentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = VacaigentError::config("missing section");
        assert!(matches!(config_err, VacaigentError::Config { .. }));

        let llm_err = VacaigentError::llm("gemini/gemini-2.5-flash", "quota exceeded");
        assert!(matches!(llm_err, VacaigentError::Llm { .. }));

        let validation_err = VacaigentError::validation("bad dates");
        assert!(matches!(validation_err, VacaigentError::Validation { .. }));
    }

    #[test]
    fn test_missing_keys_message_lists_keys_in_order() {
        let err = VacaigentError::MissingKeys {
            keys: vec!["GEMINI_API_KEY", "BROWSERLESS_API_KEY"],
        };
        assert_eq!(
            err.to_string(),
            "Missing required API keys: GEMINI_API_KEY, BROWSERLESS_API_KEY"
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = VacaigentError::validation("End date must be after start date");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "End date must be after start date");
    }

    #[test]
    fn test_fallback_message_names_both_errors() {
        let err = VacaigentError::Fallback {
            primary_model: "gemini/gemini-2.5-flash".into(),
            fallback_model: "openai/gpt-5-mini".into(),
            primary: Box::new(VacaigentError::llm("gemini/gemini-2.5-flash", "quota")),
            fallback: Box::new(VacaigentError::llm("openai/gpt-5-mini", "timeout")),
        };
        let text = err.to_string();
        assert!(text.contains("quota"));
        assert!(text.contains("timeout"));
    }

    #[test]
    fn test_user_messages() {
        let config_err = VacaigentError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let validation_err = VacaigentError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: VacaigentError = io_err.into();
        assert!(matches!(err, VacaigentError::Io { .. }));
    }
}
