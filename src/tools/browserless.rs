//! Page text extraction through the Browserless `/scrape` API

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::ScrapeTool;
use crate::http_client::{self, truncate};
use crate::{Result, VacaigentError};

const TOOL_NAME: &str = "Scrape website content";

#[derive(Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    data: Vec<SelectorResult>,
}

#[derive(Deserialize)]
struct SelectorResult {
    #[serde(default)]
    results: Vec<ElementResult>,
}

#[derive(Deserialize)]
struct ElementResult {
    #[serde(default)]
    text: String,
}

pub struct BrowserlessScrape {
    client: ClientWithMiddleware,
    token: String,
    base_url: String,
    max_chars: usize,
}

impl BrowserlessScrape {
    pub fn new(client: ClientWithMiddleware, token: String, base_url: &str, max_chars: usize) -> Self {
        Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_chars,
        }
    }

    /// Error text is shown to users and logged, so the token never appears in it
    fn failure(&self, message: String) -> VacaigentError {
        let encoded = urlencoding::encode(&self.token);
        let message = if self.token.is_empty() {
            message
        } else {
            message.replace(encoded.as_ref(), "***").replace(&self.token, "***")
        };
        VacaigentError::tool(TOOL_NAME, message)
    }
}

/// Collapse runs of whitespace and blank lines
fn normalize(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ScrapeTool for BrowserlessScrape {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    #[instrument(skip(self))]
    async fn scrape(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .post(format!(
                "{}/scrape?token={}",
                self.base_url,
                urlencoding::encode(&self.token)
            ))
            .json(&json!({
                "url": url,
                "elements": [{"selector": "body"}]
            }))
            .send()
            .await
            .map_err(|e| {
                self.failure(format!("request failed: {}", http_client::send_error(e)))
            })?;

        if !response.status().is_success() {
            let detail = http_client::error_detail(response).await;
            return Err(self.failure(detail));
        }

        let parsed: ScrapeResponse = response
            .json()
            .await
            .map_err(|e| self.failure(format!("invalid response: {}", e.without_url())))?;

        let text = parsed
            .data
            .iter()
            .flat_map(|selector| selector.results.iter())
            .map(|element| normalize(&element.text))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(truncate(&text, self.max_chars).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::build_client;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  a   b \n\n\n  c  "), "a b\nc");
    }

    #[tokio::test]
    async fn test_scrape_returns_truncated_body_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scrape"))
            .and(query_param("token", "bl-token"))
            .and(body_partial_json(json!({"url": "https://a.example"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "selector": "body",
                    "results": [{"text": "Welcome   to\n\n Krabi beaches", "html": "<p>..</p>"}]
                }]
            })))
            .mount(&server)
            .await;

        let scrape = BrowserlessScrape::new(
            build_client(Duration::from_secs(5), 0).unwrap(),
            "bl-token".into(),
            &server.uri(),
            12,
        );
        let text = scrape.scrape("https://a.example").await.unwrap();
        assert_eq!(text, "Welcome to\nK");
    }

    #[tokio::test]
    async fn test_failed_request_does_not_leak_token() {
        let scrape = BrowserlessScrape::new(
            build_client(Duration::from_secs(2), 0).unwrap(),
            "bl-secret/token".into(),
            "http://127.0.0.1:1",
            100,
        );
        let err = scrape.scrape("https://a.example").await.unwrap_err().to_string();
        assert!(err.starts_with("Tool error (Scrape website content): request failed"));
        assert!(!err.contains("bl-secret"));
    }

    #[tokio::test]
    async fn test_invalid_body_does_not_leak_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scrape"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let scrape = BrowserlessScrape::new(
            build_client(Duration::from_secs(5), 0).unwrap(),
            "bl-secret-token".into(),
            &server.uri(),
            100,
        );
        let err = scrape.scrape("https://a.example").await.unwrap_err().to_string();
        assert!(err.contains("invalid response"));
        assert!(!err.contains("bl-secret-token"));
    }
}
