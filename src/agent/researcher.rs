//! News research step.

use crate::error::Result;
use crate::models::{SearchHit, Topic};
use crate::providers::SearchCapability;
use std::sync::Arc;
use tracing::{info, warn};

/// Gathers news for a topic into one text blob.
pub struct Researcher {
    search: Arc<dyn SearchCapability>,
    max_results: usize,
}

impl Researcher {
    pub fn new(search: Arc<dyn SearchCapability>, max_results: usize) -> Self {
        Self {
            search,
            max_results,
        }
    }

    /// Search query sent for a topic.
    pub fn query_for(topic: &Topic) -> String {
        format!("latest news and top stories about {}", topic)
    }

    /// Run the search and aggregate the hits.
    ///
    /// Returns an empty string when the search found nothing; search
    /// failures are returned as errors.
    pub async fn research(&self, topic: &Topic) -> Result<String> {
        let query = Self::query_for(topic);
        let hits = self.search.search(&query, self.max_results).await?;

        if hits.is_empty() {
            warn!("No news found for '{}'", topic);
        } else {
            info!("Research complete: {} results for '{}'", hits.len(), topic);
        }

        Ok(aggregate_hits(&hits))
    }
}

/// Join search hits into the blob handed to the analyst.
pub fn aggregate_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "Title: {}\nURL: {}\nContent: {}",
                hit.title.trim(),
                hit.url.trim(),
                hit.content.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
