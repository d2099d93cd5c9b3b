//! Email notifier.
//!
//! Missing credentials turn the notifier into a logged no-op, and send
//! failures are logged and reported, so email never fails a topic.

use super::DeliveryOutcome;
use crate::config::MailCredentials;
use crate::error::PipelineError;
use crate::models::{Report, ReportFormat, Topic};
use crate::providers::{MailCapability, OutgoingEmail};
use crate::report::generator::escape_html;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Sends finished reports by email.
pub struct EmailNotifier {
    mail: Option<Arc<dyn MailCapability>>,
    credentials: MailCredentials,
    subject_prefix: String,
}

impl EmailNotifier {
    /// `mail` is `None` when no mail client could be built (no API key).
    pub fn new(
        mail: Option<Arc<dyn MailCapability>>,
        credentials: MailCredentials,
        subject_prefix: impl Into<String>,
    ) -> Self {
        Self {
            mail,
            credentials,
            subject_prefix: subject_prefix.into(),
        }
    }

    pub fn subject_for(&self, topic: &Topic) -> String {
        format!("{}: {}", self.subject_prefix, topic)
    }

    pub async fn notify(&self, topic: &Topic, report: &Report) -> DeliveryOutcome {
        let (mail, sender, recipient) = match (
            self.mail.as_ref(),
            self.credentials.sender.as_ref(),
            self.credentials.recipient.as_ref(),
        ) {
            (Some(mail), Some(sender), Some(recipient)) if self.credentials.api_key.is_some() => {
                (mail, sender, recipient)
            }
            _ => {
                let missing = self.credentials.missing();
                let reason = if missing.is_empty() {
                    "mail client unavailable".to_string()
                } else {
                    format!("missing {}", missing.join(", "))
                };
                warn!(
                    "{}; skipping email for '{}'",
                    PipelineError::DegradedConfig(reason.clone()),
                    topic
                );
                return DeliveryOutcome::Skipped { reason };
            }
        };

        let email = OutgoingEmail {
            from: sender.clone(),
            to: recipient.clone(),
            subject: self.subject_for(topic),
            html: email_body(report),
        };

        match mail.send(&email).await {
            Ok(id) => {
                info!("Sent report for '{}' to {} (id {})", topic, recipient, id);
                DeliveryOutcome::Sent {
                    id,
                    recipient: recipient.clone(),
                }
            }
            Err(e) => {
                error!("Failed to send email for '{}': {}", topic, e);
                DeliveryOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// HTML body for a report; non-HTML reports are sent preformatted.
fn email_body(report: &Report) -> String {
    match report.format {
        ReportFormat::Html => report.body.clone(),
        ReportFormat::Markdown | ReportFormat::Json => {
            format!("<pre>{}</pre>", escape_html(&report.body))
        }
    }
}
