//! Google search through the Serper API

use std::fmt;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::SearchTool;
use crate::http_client;
use crate::{Result, VacaigentError};

const TOOL_NAME: &str = "Search the internet";

/// One organic search result
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

impl fmt::Display for SearchHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Title: {}\nLink: {}\nSnippet: {}\n-----------------",
            self.title, self.link, self.snippet
        )
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

pub struct SerperSearch {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    results: u32,
}

impl SerperSearch {
    pub fn new(client: ClientWithMiddleware, api_key: String, base_url: &str, results: u32) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            results,
        }
    }
}

#[async_trait]
impl SearchTool for SerperSearch {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&SearchRequest {
                q: query,
                num: self.results,
            })
            .send()
            .await
            .map_err(|e| {
                VacaigentError::tool(
                    TOOL_NAME,
                    format!("request failed: {}", http_client::send_error(e)),
                )
            })?;

        if !response.status().is_success() {
            let detail = http_client::error_detail(response).await;
            return Err(VacaigentError::tool(TOOL_NAME, detail));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| VacaigentError::tool(TOOL_NAME, format!("invalid response: {e}")))?;

        let hits: Vec<SearchHit> = parsed
            .organic
            .into_iter()
            .filter(|hit| !hit.link.is_empty())
            .take(self.results as usize)
            .collect();

        debug!("{} search results", hits.len());
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::build_client;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_keeps_top_organic_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("X-API-KEY", "serper-key"))
            .and(body_json(json!({"q": "Rome events", "num": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "searchParameters": {"q": "Rome events"},
                "organic": [
                    {"title": "A", "link": "https://a.example", "snippet": "first", "position": 1},
                    {"title": "No link", "snippet": "skipped"},
                    {"title": "B", "link": "https://b.example", "snippet": "second", "position": 2},
                    {"title": "C", "link": "https://c.example", "snippet": "third", "position": 3}
                ]
            })))
            .mount(&server)
            .await;

        let search = SerperSearch::new(
            build_client(Duration::from_secs(5), 0).unwrap(),
            "serper-key".into(),
            &server.uri(),
            2,
        );
        let hits = search.search("Rome events").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].link, "https://a.example");
        assert_eq!(hits[1].title, "B");
        assert!(hits[0].to_string().contains("Snippet: first"));
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Unauthorized."})))
            .mount(&server)
            .await;

        let search = SerperSearch::new(
            build_client(Duration::from_secs(5), 0).unwrap(),
            "bad".into(),
            &server.uri(),
            5,
        );
        let err = search.search("x").await.unwrap_err();
        assert!(err.to_string().contains("Unauthorized."));
    }
}
