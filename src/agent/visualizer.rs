//! Sentiment chart step.
//!
//! Charts are drawn by a fixed renderer driven only by the score and the
//! topic. A failed chart is logged and reported as absent; it never fails
//! the topic.

use crate::delivery::file::sanitize_topic;
use crate::error::{PipelineError, Result};
use crate::models::{AnalysisReport, ChartArtifact};
use crate::report::chart::render_sentiment_gauge;
use std::path::PathBuf;
use tracing::{info, warn};

/// `sentiment_chart_{topic}.svg`, one file per topic in the output directory.
pub fn chart_filename(topic: &str) -> String {
    format!("sentiment_chart_{}.svg", sanitize_topic(topic))
}

/// Renders the sentiment gauge for an analysis.
pub struct Visualizer {
    output_dir: PathBuf,
}

impl Visualizer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Render the chart, returning `None` on any failure.
    pub fn visualize(&self, report: &AnalysisReport) -> Option<ChartArtifact> {
        match self.try_visualize(report) {
            Ok(chart) => {
                info!("Chart written to {}", chart.path().display());
                Some(chart)
            }
            Err(e) => {
                warn!("No chart for '{}': {}", report.topic, e);
                None
            }
        }
    }

    fn try_visualize(&self, report: &AnalysisReport) -> Result<ChartArtifact> {
        let score = report.sentiment_score.ok_or_else(|| {
            PipelineError::ArtifactGenerationFailure("analysis has no sentiment_score".into())
        })?;

        let svg = render_sentiment_gauge(score, &report.topic)?;

        let write_failed =
            |e: std::io::Error| PipelineError::ArtifactGenerationFailure(e.to_string());
        std::fs::create_dir_all(&self.output_dir).map_err(write_failed)?;

        let path = self.output_dir.join(chart_filename(&report.topic));
        std::fs::write(&path, svg).map_err(write_failed)?;

        Ok(ChartArtifact::new(path))
    }
}
