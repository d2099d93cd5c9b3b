//! Resend email API client.

use super::{http_client, transport_error, MailCapability, OutgoingEmail};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const CAPABILITY: &str = "mail";

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl<'a> From<&'a OutgoingEmail> for SendRequest<'a> {
    fn from(email: &'a OutgoingEmail) -> Self {
        Self {
            from: &email.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

/// Client for the Resend API.
pub struct ResendClient {
    api_base: String,
    api_key: String,
    timeout_seconds: u64,
    http_client: reqwest::Client,
}

impl ResendClient {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        timeout_seconds: u64,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            timeout_seconds,
            http_client: http_client(timeout_seconds)?,
        })
    }
}

#[async_trait]
impl MailCapability for ResendClient {
    async fn send(&self, email: &OutgoingEmail) -> Result<String> {
        let url = format!("{}/emails", self.api_base.trim_end_matches('/'));

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&SendRequest::from(email))
            .send()
            .await
            .map_err(|e| transport_error(CAPABILITY, &self.api_base, self.timeout_seconds, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::unavailable(
                CAPABILITY,
                format!("API error {}: {}", status, body),
            ));
        }

        let parsed: SendResponse = response.json().await.map_err(|e| {
            PipelineError::unavailable(CAPABILITY, format!("unreadable response: {}", e))
        })?;

        Ok(parsed.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_shape() {
        let email = OutgoingEmail {
            from: "bot@example.com".to_string(),
            to: "me@example.com".to_string(),
            subject: "Daily AI BI Report: NVIDIA".to_string(),
            html: "<h1>Hi</h1>".to_string(),
        };

        let body = serde_json::to_value(SendRequest::from(&email)).unwrap();
        assert_eq!(body["from"], "bot@example.com");
        assert_eq!(body["to"][0], "me@example.com");
        assert_eq!(body["subject"], "Daily AI BI Report: NVIDIA");
        assert_eq!(body["html"], "<h1>Hi</h1>");
    }
}
