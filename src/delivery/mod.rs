//! Report delivery: email or a file on disk.

pub mod email;
pub mod file;

pub use email::EmailNotifier;
pub use file::FilePersister;

use crate::error::Result;
use crate::models::{Report, Topic};
use std::fmt;
use std::path::PathBuf;

/// What happened to a finished report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The mail API accepted the email.
    Sent { id: String, recipient: String },
    /// Email delivery was skipped because credentials are missing.
    Skipped { reason: String },
    /// The mail API rejected the email or could not be reached.
    Failed { reason: String },
    /// The report was written to disk.
    Written { path: PathBuf },
}

impl DeliveryOutcome {
    /// True when the mail API rejected the email or could not be reached.
    pub fn is_failure(&self) -> bool {
        matches!(self, DeliveryOutcome::Failed { .. })
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Sent { id, recipient } => {
                write!(f, "emailed to {} (id {})", recipient, id)
            }
            DeliveryOutcome::Skipped { reason } => write!(f, "email skipped: {}", reason),
            DeliveryOutcome::Failed { reason } => write!(f, "email failed: {}", reason),
            DeliveryOutcome::Written { path } => write!(f, "saved to {}", path.display()),
        }
    }
}

/// The delivery step configured for this run.
pub enum Delivery {
    Email(EmailNotifier),
    File(FilePersister),
}

impl Delivery {
    /// Deliver a report.
    ///
    /// Email problems never return `Err`; they come back as
    /// [`DeliveryOutcome::Skipped`] or [`DeliveryOutcome::Failed`]. A file
    /// that cannot be written is an error.
    pub async fn deliver(&self, topic: &Topic, report: &Report) -> Result<DeliveryOutcome> {
        match self {
            Delivery::Email(notifier) => Ok(notifier.notify(topic, report).await),
            Delivery::File(persister) => persister
                .persist(topic, report)
                .map(|path| DeliveryOutcome::Written { path }),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Delivery::Email(_) => "email",
            Delivery::File(_) => "file",
        }
    }
}
