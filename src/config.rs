//! Configuration management for the `VacAIgent` service
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings. Provider secrets
//! are not configured here; see [`crate::settings`].

use crate::VacaigentError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `VacAIgent` service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VacaigentConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Model provider settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Research tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Progress stream pacing
    #[serde(default)]
    pub stream: StreamConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Upper bound for a single request, crew runs included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
    /// PEM certificate chain; TLS is enabled when both paths are set
    #[serde(default)]
    pub tls_cert_path: Option<String>,
    /// PEM private key
    #[serde(default)]
    pub tls_key_path: Option<String>,
}

/// Model provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model handle used first, as `provider/model`
    #[serde(default = "default_primary_model")]
    pub primary_model: String,
    /// Model handle used when the primary run fails
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
    /// Base URL for the Gemini API
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,
    /// Base URL for the OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Research tool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Run web search and page scraping before each research task
    #[serde(default = "default_tools_enabled")]
    pub enabled: bool,
    /// Base URL for the Serper search API
    #[serde(default = "default_serper_base_url")]
    pub serper_base_url: String,
    /// Base URL for the Browserless API
    #[serde(default = "default_browserless_base_url")]
    pub browserless_base_url: String,
    /// Number of organic search results to keep
    #[serde(default = "default_search_results")]
    pub search_results: u32,
    /// Maximum number of characters kept from a scraped page
    #[serde(default = "default_max_scrape_chars")]
    pub max_scrape_chars: usize,
    /// Request timeout in seconds
    #[serde(default = "default_tools_timeout")]
    pub timeout_seconds: u32,
}

/// Pacing of the canned progress streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Pause between the SSE preamble lines
    #[serde(default = "default_sse_step_delay")]
    pub sse_step_delay_ms: u64,
    /// Pause between WebSocket demo messages
    #[serde(default = "default_ws_interval")]
    pub ws_interval_ms: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP collector endpoint; export is off when unset
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_request_timeout() -> u32 {
    900
}

fn default_primary_model() -> String {
    "gemini/gemini-2.5-flash".to_string()
}

fn default_fallback_model() -> String {
    "openai/gpt-5-mini".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_llm_timeout() -> u32 {
    180
}

fn default_max_retries() -> u32 {
    2
}

fn default_tools_enabled() -> bool {
    true
}

fn default_serper_base_url() -> String {
    "https://google.serper.dev".to_string()
}

fn default_browserless_base_url() -> String {
    "https://chrome.browserless.io".to_string()
}

fn default_search_results() -> u32 {
    5
}

fn default_max_scrape_chars() -> usize {
    4000
}

fn default_tools_timeout() -> u32 {
    30
}

fn default_sse_step_delay() -> u64 {
    1000
}

fn default_ws_interval() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            request_timeout_seconds: default_request_timeout(),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            primary_model: default_primary_model(),
            fallback_model: default_fallback_model(),
            gemini_base_url: default_gemini_base_url(),
            openai_base_url: default_openai_base_url(),
            temperature: default_temperature(),
            timeout_seconds: default_llm_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: default_tools_enabled(),
            serper_base_url: default_serper_base_url(),
            browserless_base_url: default_browserless_base_url(),
            search_results: default_search_results(),
            max_scrape_chars: default_max_scrape_chars(),
            timeout_seconds: default_tools_timeout(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sse_step_delay_ms: default_sse_step_delay(),
            ws_interval_ms: default_ws_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl VacaigentConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. VACAIGENT__SERVER__PORT=9000
        builder = builder.add_source(
            Environment::with_prefix("VACAIGENT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: VacaigentConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vacaigent").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.llm.primary_model.is_empty() {
            self.llm.primary_model = default_primary_model();
        }
        if self.llm.fallback_model.is_empty() {
            self.llm.fallback_model = default_fallback_model();
        }
        if self.llm.gemini_base_url.is_empty() {
            self.llm.gemini_base_url = default_gemini_base_url();
        }
        if self.llm.openai_base_url.is_empty() {
            self.llm.openai_base_url = default_openai_base_url();
        }
        if self.llm.timeout_seconds == 0 {
            self.llm.timeout_seconds = default_llm_timeout();
        }
        if self.tools.serper_base_url.is_empty() {
            self.tools.serper_base_url = default_serper_base_url();
        }
        if self.tools.browserless_base_url.is_empty() {
            self.tools.browserless_base_url = default_browserless_base_url();
        }
        if self.tools.timeout_seconds == 0 {
            self.tools.timeout_seconds = default_tools_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(VacaigentError::config("Server port cannot be 0").into());
        }

        if self.llm.timeout_seconds > 600 {
            return Err(
                VacaigentError::config("LLM request timeout cannot exceed 600 seconds").into(),
            );
        }

        if self.llm.max_retries > 10 {
            return Err(VacaigentError::config("LLM max retries cannot exceed 10").into());
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(
                VacaigentError::config("LLM temperature must be between 0.0 and 2.0").into(),
            );
        }

        if self.tools.search_results == 0 || self.tools.search_results > 20 {
            return Err(
                VacaigentError::config("Search results must be between 1 and 20").into(),
            );
        }

        if self.tools.timeout_seconds > 300 {
            return Err(
                VacaigentError::config("Tool request timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.stream.ws_interval_ms > 60_000 || self.stream.sse_step_delay_ms > 60_000 {
            return Err(
                VacaigentError::config("Stream pacing cannot exceed 60000 ms").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(VacaigentError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(VacaigentError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Gemini API base URL", &self.llm.gemini_base_url),
            ("OpenAI API base URL", &self.llm.openai_base_url),
            ("Serper API base URL", &self.tools.serper_base_url),
            ("Browserless API base URL", &self.tools.browserless_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(VacaigentError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.server.tls_cert_path.is_some() != self.server.tls_key_path.is_some() {
            return Err(VacaigentError::config(
                "TLS requires both tls_cert_path and tls_key_path",
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VacaigentConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.primary_model, "gemini/gemini-2.5-flash");
        assert_eq!(config.llm.fallback_model, "openai/gpt-5-mini");
        assert_eq!(config.stream.ws_interval_ms, 2000);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.otlp_endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = VacaigentConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = VacaigentConfig::default();
        config.llm.timeout_seconds = 900;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_rejects_non_http_url() {
        let mut config = VacaigentConfig::default();
        config.tools.serper_base_url = "ftp://google.serper.dev".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Serper API base URL"));
    }

    #[test]
    fn test_config_validation_requires_tls_pair() {
        let mut config = VacaigentConfig::default();
        config.server.tls_cert_path = Some("cert.pem".to_string());
        assert!(config.validate().is_err());
        config.server.tls_key_path = Some("key.pem".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_defaults_fills_blanks() {
        let mut config = VacaigentConfig::default();
        config.llm.primary_model.clear();
        config.logging.format.clear();
        config.apply_defaults();
        assert_eq!(config.llm.primary_model, "gemini/gemini-2.5-flash");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("vacaigent-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9100\n\n[llm]\nprimary_model = \"openai/gpt-4o\"\n",
        )
        .unwrap();

        let config = VacaigentConfig::load_from_path(Some(path)).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.llm.primary_model, "openai/gpt-4o");
        // untouched sections keep their defaults
        assert_eq!(config.tools.search_results, 5);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = VacaigentConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("vacaigent"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
