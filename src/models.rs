//! Data models for the briefing pipeline.
//!
//! This module contains the records threaded through a topic's run: the
//! topic itself, search hits, the validated analysis, the optional chart,
//! the rendered report, and the [`RunState`] that carries them between steps.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Inclusive bounds for `AnalysisReport::sentiment_score`.
pub const SCORE_MIN: i64 = -10;
pub const SCORE_MAX: i64 = 10;

/// The subject driving one pipeline run. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    /// Create a topic from user or config input, trimming surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Topic {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Topic::new(&value).ok_or_else(|| "topic must not be empty".to_string())
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

/// Split a comma-separated topic list, dropping blank entries.
pub fn parse_topic_list<S: AsRef<str>>(items: &[S]) -> Vec<Topic> {
    items
        .iter()
        .flat_map(|item| item.as_ref().split(','))
        .filter_map(|item| Topic::new(item))
        .collect()
}

/// A single result returned by the search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// Validated sentiment analysis for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub topic: String,
    pub overall_sentiment: String,
    pub key_findings: Vec<String>,
    pub potential_impact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<i8>,
}

impl AnalysisReport {
    /// Replace the topic with the one that drove the run.
    pub fn with_topic(mut self, topic: &Topic) -> Self {
        self.topic = topic.as_str().to_string();
        self
    }
}

/// Analysis exactly as the inference service returned it, before validation.
///
/// Deserialization enforces field presence and types; unknown fields are
/// rejected so a drifting response surfaces as a schema violation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawAnalysis {
    pub topic: String,
    pub overall_sentiment: String,
    pub key_findings: Vec<String>,
    pub potential_impact: String,
    #[serde(default)]
    pub sentiment_score: Option<i64>,
}

impl TryFrom<RawAnalysis> for AnalysisReport {
    type Error = PipelineError;

    fn try_from(raw: RawAnalysis) -> Result<Self> {
        let sentiment_score = match raw.sentiment_score {
            None => None,
            Some(score) if (SCORE_MIN..=SCORE_MAX).contains(&score) => {
                // Range check above guarantees the conversion succeeds.
                i8::try_from(score).ok()
            }
            Some(score) => {
                return Err(PipelineError::SchemaViolation(format!(
                    "sentiment_score {} outside [{}, {}]",
                    score, SCORE_MIN, SCORE_MAX
                )))
            }
        };

        Ok(Self {
            topic: raw.topic,
            overall_sentiment: raw.overall_sentiment,
            key_findings: raw.key_findings,
            potential_impact: raw.potential_impact,
            sentiment_score,
        })
    }
}

/// Reference to a generated chart image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact(PathBuf);

impl ChartArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File name alone. Charts and reports share the output directory, so
    /// this is the link target from inside a report.
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

/// Output format for the rendered report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown (default for files)
    #[default]
    Markdown,
    /// HTML (default for email)
    Html,
    /// JSON
    Json,
}

impl ReportFormat {
    /// File extension used when persisting this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
        }
    }
}

/// A rendered report, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub format: ReportFormat,
    pub body: String,
}

/// Record threaded through one topic's run.
///
/// Each field is written once, in pipeline order. Reading a field that no
/// earlier step has produced is a [`PipelineError::RenderError`].
#[derive(Debug)]
pub struct RunState {
    topic: Topic,
    search_results: Option<String>,
    analysis_report: Option<AnalysisReport>,
    chart_path: Option<Option<ChartArtifact>>,
    final_report: Option<Report>,
}

fn fill<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<()> {
    if slot.is_some() {
        return Err(PipelineError::StateViolation(field));
    }
    *slot = Some(value);
    Ok(())
}

fn missing(field: &str) -> PipelineError {
    PipelineError::RenderError(format!("`{}` has not been produced yet", field))
}

impl RunState {
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            search_results: None,
            analysis_report: None,
            chart_path: None,
            final_report: None,
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn set_search_results(&mut self, results: String) -> Result<()> {
        fill(&mut self.search_results, results, "search_results")
    }

    pub fn search_results(&self) -> Result<&str> {
        self.search_results
            .as_deref()
            .ok_or_else(|| missing("search_results"))
    }

    pub fn set_analysis_report(&mut self, report: AnalysisReport) -> Result<()> {
        fill(&mut self.analysis_report, report, "analysis_report")
    }

    pub fn analysis_report(&self) -> Result<&AnalysisReport> {
        self.analysis_report
            .as_ref()
            .ok_or_else(|| missing("analysis_report"))
    }

    pub fn set_chart_path(&mut self, chart: Option<ChartArtifact>) -> Result<()> {
        fill(&mut self.chart_path, chart, "chart_path")
    }

    /// The chart, if the visualizer ran and produced one.
    pub fn chart_path(&self) -> Option<&ChartArtifact> {
        self.chart_path.as_ref().and_then(Option::as_ref)
    }

    pub fn set_final_report(&mut self, report: Report) -> Result<()> {
        fill(&mut self.final_report, report, "final_report")
    }

    pub fn final_report(&self) -> Result<&Report> {
        self.final_report
            .as_ref()
            .ok_or_else(|| missing("final_report"))
    }
}
