//! OpenAI-compatible chat completions with structured output.
//!
//! Requests use `response_format = json_schema` with `strict: true`, so the
//! model is constrained to the schema. The reply is still only parsed as
//! JSON here; shape validation happens in the analyst.

use super::{http_client, transport_error, InferenceCapability, OutputSchema};
use crate::config::ModelConfig;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

const CAPABILITY: &str = "inference";

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completions request.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: Value,
}

/// Chat completions response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Client for an OpenAI-compatible API.
pub struct OpenAIClient {
    config: ModelConfig,
    api_key: String,
    http_client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(config: ModelConfig, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let http_client = http_client(config.timeout_seconds)?;
        Ok(Self {
            config,
            api_key: api_key.into(),
            http_client,
        })
    }

    fn build_request(&self, system: &str, prompt: &str, schema: &OutputSchema) -> ChatRequest {
        ChatRequest {
            model: self.config.name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.config.temperature,
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "strict": true,
                    "schema": schema.schema,
                }
            }),
        }
    }
}

/// Pull the structured JSON out of a chat completions response.
fn extract_structured(response: ChatResponse) -> Result<Value> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| PipelineError::SchemaViolation("response contained no choices".into()))?;

    if let Some(refusal) = message.refusal {
        return Err(PipelineError::SchemaViolation(format!(
            "model refused: {}",
            refusal
        )));
    }

    let content = message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| PipelineError::SchemaViolation("response content was empty".into()))?;

    serde_json::from_str(&content)
        .map_err(|e| PipelineError::SchemaViolation(format!("response is not JSON: {}", e)))
}

#[async_trait]
impl InferenceCapability for OpenAIClient {
    async fn complete_structured(
        &self,
        system: &str,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<Value> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let request = self.build_request(system, prompt, schema);

        debug!(
            "Sending structured request to {} (schema {})",
            self.config.name, schema.name
        );

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

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            PipelineError::unavailable(CAPABILITY, format!("unreadable response: {}", e))
        })?;

        extract_structured(chat_response)
    }
}
