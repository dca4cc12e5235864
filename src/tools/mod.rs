//! Research tools available to the agents

pub mod browserless;
pub mod serper;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ToolsConfig;
use crate::http_client;
use crate::models::{CrewEvent, ProgressSender, report};
use crate::settings::Settings;
use crate::Result;

pub use browserless::BrowserlessScrape;
pub use serper::{SearchHit, SerperSearch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Search,
    Scrape,
}

/// Web search
#[async_trait]
pub trait SearchTool: Send + Sync {
    fn name(&self) -> &str;
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// Fetch the readable text of a page
#[async_trait]
pub trait ScrapeTool: Send + Sync {
    fn name(&self) -> &str;
    async fn scrape(&self, url: &str) -> Result<String>;
}

/// The tools a crew run may use; either may be absent
#[derive(Clone, Default)]
pub struct Toolbox {
    pub search: Option<Arc<dyn SearchTool>>,
    pub scrape: Option<Arc<dyn ScrapeTool>>,
}

impl Toolbox {
    /// Build the hosted tools for which a key is configured
    pub fn from_settings(settings: &Settings, config: &ToolsConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self::default());
        }

        let client = http_client::build_client(
            Duration::from_secs(config.timeout_seconds.into()),
            1,
        )?;

        let search = settings.serper_api_key.clone().map(|key| {
            Arc::new(SerperSearch::new(
                client.clone(),
                key,
                &config.serper_base_url,
                config.search_results,
            )) as Arc<dyn SearchTool>
        });
        let scrape = settings.browserless_api_key.clone().map(|key| {
            Arc::new(BrowserlessScrape::new(
                client,
                key,
                &config.browserless_base_url,
                config.max_scrape_chars,
            )) as Arc<dyn ScrapeTool>
        });

        Ok(Self { search, scrape })
    }

    /// Search for `query` and scrape the top hit, as far as `allowed` permits.
    ///
    /// Tool failures are reported and skipped; `None` means nothing was found.
    pub async fn research(
        &self,
        allowed: &[ToolKind],
        query: &str,
        progress: Option<&ProgressSender>,
    ) -> Option<String> {
        let search = self
            .search
            .as_ref()
            .filter(|_| allowed.contains(&ToolKind::Search))?;

        report(
            progress,
            CrewEvent::ToolUsed {
                tool: search.name().to_string(),
                input: query.to_string(),
            },
        );

        let hits = match search.search(query).await {
            Ok(hits) if !hits.is_empty() => hits,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!("{} failed for '{}': {}", search.name(), query, e);
                report(
                    progress,
                    CrewEvent::ToolFailed {
                        tool: search.name().to_string(),
                        error: e.to_string(),
                    },
                );
                return None;
            }
        };

        let mut notes = String::from("Web search results:\n");
        for hit in &hits {
            notes.push_str(&hit.to_string());
            notes.push('\n');
        }

        if let Some(scrape) = self
            .scrape
            .as_ref()
            .filter(|_| allowed.contains(&ToolKind::Scrape))
        {
            let url = &hits[0].link;
            report(
                progress,
                CrewEvent::ToolUsed {
                    tool: scrape.name().to_string(),
                    input: url.clone(),
                },
            );
            match scrape.scrape(url).await {
                Ok(text) if !text.is_empty() => {
                    notes.push_str(&format!("\nContent of {url}:\n{text}\n"));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("{} failed for '{}': {}", scrape.name(), url, e);
                    report(
                        progress,
                        CrewEvent::ToolFailed {
                            tool: scrape.name().to_string(),
                            error: e.to_string(),
                        },
                    );
                }
            }
        }

        Some(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VacaigentError;
    use tokio::sync::mpsc;

    struct FixedSearch(Vec<SearchHit>);

    #[async_trait]
    impl SearchTool for FixedSearch {
        fn name(&self) -> &str {
            "search"
        }
        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenScrape;

    #[async_trait]
    impl ScrapeTool for BrokenScrape {
        fn name(&self) -> &str {
            "scrape"
        }
        async fn scrape(&self, _url: &str) -> Result<String> {
            Err(VacaigentError::tool("scrape", "HTTP 503"))
        }
    }

    fn hit() -> SearchHit {
        SearchHit {
            title: "Krabi guide".into(),
            link: "https://example.com/krabi".into(),
            snippet: "Beaches and cliffs".into(),
        }
    }

    #[tokio::test]
    async fn test_research_without_search_tool_is_none() {
        let toolbox = Toolbox::default();
        assert!(toolbox.research(&[ToolKind::Search], "krabi", None).await.is_none());
    }

    #[tokio::test]
    async fn test_research_respects_agent_tools() {
        let toolbox = Toolbox {
            search: Some(Arc::new(FixedSearch(vec![hit()]))),
            scrape: None,
        };
        assert!(toolbox.research(&[], "krabi", None).await.is_none());
        let notes = toolbox
            .research(&[ToolKind::Search], "krabi", None)
            .await
            .unwrap();
        assert!(notes.contains("Krabi guide"));
    }

    #[tokio::test]
    async fn test_scrape_failure_keeps_search_notes() {
        let toolbox = Toolbox {
            search: Some(Arc::new(FixedSearch(vec![hit()]))),
            scrape: Some(Arc::new(BrokenScrape)),
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notes = toolbox
            .research(&[ToolKind::Search, ToolKind::Scrape], "krabi", Some(&tx))
            .await
            .unwrap();
        assert!(notes.contains("https://example.com/krabi"));

        drop(tx);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert!(events.iter().any(|e| matches!(e, CrewEvent::ToolFailed { tool, .. } if tool == "scrape")));
    }

    #[test]
    fn test_disabled_tools_build_empty_toolbox() {
        let config = ToolsConfig {
            enabled: false,
            ..ToolsConfig::default()
        };
        let settings = Settings {
            serper_api_key: Some("s".into()),
            ..Settings::default()
        };
        let toolbox = Toolbox::from_settings(&settings, &config).unwrap();
        assert!(toolbox.search.is_none());
        assert!(toolbox.scrape.is_none());
    }
}
