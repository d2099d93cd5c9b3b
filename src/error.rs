//! Error types for pipeline steps.
//!
//! Every step returns [`PipelineError`]. The orchestrator treats any error
//! that reaches it as the end of the current topic's run; the degraded-config
//! and chart-failure kinds are handled inside their steps and only logged.

use std::path::PathBuf;
use thiserror::Error;

/// Failure raised by a pipeline step.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The search or inference service could not be reached or returned an error.
    #[error("{capability} unavailable: {message}")]
    CapabilityUnavailable {
        capability: &'static str,
        message: String,
    },

    /// Structured output did not match the expected shape.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// The report could not be rendered from the data at hand.
    #[error("render error: {0}")]
    RenderError(String),

    /// Delivery credentials are missing. Logged, never escalated.
    #[error("degraded configuration: {0}")]
    DegradedConfig(String),

    /// Chart rendering failed. Absorbed by the visualizer.
    #[error("chart generation failed: {0}")]
    ArtifactGenerationFailure(String),

    /// The report file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A run-state field was written twice.
    #[error("run state field `{0}` already set")]
    StateViolation(&'static str),
}

impl PipelineError {
    pub fn unavailable(capability: &'static str, message: impl Into<String>) -> Self {
        Self::CapabilityUnavailable {
            capability,
            message: message.into(),
        }
    }

    /// Short label used in log lines and the batch summary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CapabilityUnavailable { .. } => "capability-unavailable",
            Self::SchemaViolation(_) => "schema-violation",
            Self::RenderError(_) => "render-error",
            Self::DegradedConfig(_) => "degraded-config",
            Self::ArtifactGenerationFailure(_) => "artifact-generation-failure",
            Self::Persistence { .. } => "persistence",
            Self::StateViolation(_) => "state-violation",
        }
    }
}

/// Result alias for pipeline steps.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display() {
        let err = PipelineError::unavailable("search", "connection refused");
        assert_eq!(err.to_string(), "search unavailable: connection refused");
        assert_eq!(err.kind(), "capability-unavailable");
    }

    #[test]
    fn test_persistence_display_includes_path() {
        let err = PipelineError::Persistence {
            path: PathBuf::from("out/report.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("out/report.md"));
        assert!(msg.contains("denied"));
    }
}
