//! Tavily news search client.

use super::{http_client, transport_error, SearchCapability};
use crate::config::SearchConfig;
use crate::error::{PipelineError, Result};
use crate::models::SearchHit;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const CAPABILITY: &str = "search";

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
    topic: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Client for the Tavily search API.
pub struct TavilyClient {
    config: SearchConfig,
    api_key: String,
    http_client: reqwest::Client,
}

impl TavilyClient {
    pub fn new(config: SearchConfig, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let http_client = http_client(config.timeout_seconds)?;
        Ok(Self {
            config,
            api_key: api_key.into(),
            http_client,
        })
    }
}

#[async_trait]
impl SearchCapability for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let url = format!("{}/search", self.config.api_base.trim_end_matches('/'));
        let request = SearchRequest {
            query,
            max_results,
            search_depth: &self.config.search_depth,
            topic: "news",
        };

        debug!("Searching: {:?} (max {})", query, max_results);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                transport_error(
                    CAPABILITY,
                    &self.config.api_base,
                    self.config.timeout_seconds,
                    e,
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::unavailable(
                CAPABILITY,
                format!("API error {}: {}", status, body),
            ));
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            PipelineError::unavailable(CAPABILITY, format!("unreadable response: {}", e))
        })?;

        let mut hits = parsed.results;
        hits.truncate(max_results);
        Ok(hits)
    }
}
