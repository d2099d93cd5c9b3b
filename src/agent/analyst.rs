//! Structured sentiment analysis step.
//!
//! The analyst asks the model for JSON matching [`analysis_schema`], then
//! parses it into [`RawAnalysis`] and validates it into an
//! [`AnalysisReport`]. Nothing the model returns reaches later steps
//! without passing through that boundary.

use crate::error::{PipelineError, Result};
use crate::models::{AnalysisReport, RawAnalysis, Topic, SCORE_MAX, SCORE_MIN};
use crate::providers::{InferenceCapability, OutputSchema};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You are a business intelligence analyst. \
Read the news provided and produce a concise structured analysis. \
Base every finding on the supplied content only.";

/// Produces an [`AnalysisReport`] from research text.
pub struct Analyst {
    inference: Arc<dyn InferenceCapability>,
}

impl Analyst {
    pub fn new(inference: Arc<dyn InferenceCapability>) -> Self {
        Self { inference }
    }

    /// Analyze the research for a topic. Does not retry.
    pub async fn analyze(&self, topic: &Topic, research: &str) -> Result<AnalysisReport> {
        let prompt = build_prompt(topic, research);
        debug!("Analyst prompt is {} bytes", prompt.len());

        let value = self
            .inference
            .complete_structured(SYSTEM_PROMPT, &prompt, &analysis_schema())
            .await?;

        let report = parse_analysis(value, topic)?;
        info!(
            "Analysis complete for '{}': {} ({} findings)",
            topic,
            report.overall_sentiment,
            report.key_findings.len()
        );
        Ok(report)
    }
}

/// JSON Schema for the analysis record.
///
/// Every property is listed as required because strict structured output
/// demands it; the optional score is expressed as a nullable integer.
pub fn analysis_schema() -> OutputSchema {
    OutputSchema {
        name: "analysis_report",
        schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "topic": { "type": "string" },
                "overall_sentiment": {
                    "type": "string",
                    "description": "Overall sentiment, e.g. positive, negative, neutral or mixed"
                },
                "key_findings": {
                    "type": "array",
                    "items": { "type": "string" }
                },
                "potential_impact": { "type": "string" },
                "sentiment_score": {
                    "type": ["integer", "null"],
                    "description": format!(
                        "Sentiment from {} (very negative) to {} (very positive)",
                        SCORE_MIN, SCORE_MAX
                    )
                }
            },
            "required": [
                "topic",
                "overall_sentiment",
                "key_findings",
                "potential_impact",
                "sentiment_score"
            ]
        }),
    }
}

/// Build the user prompt for a topic.
pub fn build_prompt(topic: &Topic, research: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Analyze the following news content about '{}' and generate a structured analysis report.\n\n",
        topic
    ));
    prompt.push_str("=== NEWS CONTENT ===\n\n");
    if research.trim().is_empty() {
        prompt.push_str("(The search returned no articles.)\n");
    } else {
        prompt.push_str(research);
        prompt.push('\n');
    }
    prompt.push_str("\n=== END OF NEWS CONTENT ===\n");
    prompt
}

/// Validate model output and pin the topic to the one that drove the run.
pub fn parse_analysis(value: Value, topic: &Topic) -> Result<AnalysisReport> {
    let raw: RawAnalysis = serde_json::from_value(value)
        .map_err(|e| PipelineError::SchemaViolation(e.to_string()))?;

    if raw.topic != topic.as_str() {
        debug!("Model echoed topic {:?}; overwriting", raw.topic);
    }

    Ok(AnalysisReport::try_from(raw)?.with_topic(topic))
}
