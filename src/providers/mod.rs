//! Clients for the external services the pipeline depends on.
//!
//! Each service sits behind a capability trait so the pipeline can be wired
//! with real HTTP clients in `main` and with test doubles in tests.

pub mod openai;
pub mod resend;
pub mod tavily;

pub use openai::OpenAIClient;
pub use resend::ResendClient;
pub use tavily::TavilyClient;

use crate::error::Result;
use crate::models::SearchHit;
use async_trait::async_trait;
use serde_json::Value;

/// News search.
#[async_trait]
pub trait SearchCapability: Send + Sync {
    /// Run one query, returning at most `max_results` hits.
    ///
    /// An empty vector means the search succeeded and found nothing.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// JSON Schema handed to the model along with a prompt.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: Value,
}

/// Structured language-model inference.
#[async_trait]
pub trait InferenceCapability: Send + Sync {
    /// Ask for a JSON value conforming to `schema`.
    ///
    /// Implementations return the raw JSON; callers still validate it.
    async fn complete_structured(
        &self,
        system: &str,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<Value>;
}

/// A single outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Email delivery.
#[async_trait]
pub trait MailCapability: Send + Sync {
    /// Send the email, returning the provider's delivery identifier.
    async fn send(&self, email: &OutgoingEmail) -> Result<String>;
}

/// Map a reqwest transport error to a capability failure.
pub(crate) fn transport_error(
    capability: &'static str,
    base_url: &str,
    timeout_seconds: u64,
    e: reqwest::Error,
) -> crate::error::PipelineError {
    let message = if e.is_timeout() {
        format!("request timed out after {}s", timeout_seconds)
    } else if e.is_connect() {
        format!("cannot connect to {}", base_url)
    } else {
        format!("failed to send request: {}", e)
    };
    crate::error::PipelineError::unavailable(capability, message)
}

/// Build an HTTP client with the given timeout.
pub(crate) fn http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .build()
        .context("Failed to create HTTP client")
}
