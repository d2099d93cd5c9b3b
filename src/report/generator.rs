//! Report generation.
//!
//! This module renders a validated analysis (plus the optional chart) into
//! Markdown, HTML, or JSON. Rendering is pure: the same inputs always give
//! byte-identical output.
//!
//! Markdown and JSON refer to the chart by file name, relative to the report
//! in the output directory. HTML embeds the gauge inline so an emailed
//! report does not point at a file on this machine.

use super::chart::render_sentiment_gauge;
use crate::error::{PipelineError, Result};
use crate::models::{AnalysisReport, ChartArtifact, Report, ReportFormat, SCORE_MAX, SCORE_MIN};
use serde::Serialize;

const NO_CHART_NOTICE: &str = "No chart was produced for this report.";
const NO_FINDINGS_NOTICE: &str = "No key findings were reported.";

/// Render a report in the requested format.
pub fn render_report(
    report: &AnalysisReport,
    chart: Option<&ChartArtifact>,
    format: ReportFormat,
) -> Result<Report> {
    validate(report)?;

    let body = match format {
        ReportFormat::Markdown => generate_markdown_report(report, chart),
        ReportFormat::Html => generate_html_report(report, chart)?,
        ReportFormat::Json => generate_json_report(report, chart)?,
    };

    Ok(Report { format, body })
}

/// Reject analyses that would render an incomplete report.
fn validate(report: &AnalysisReport) -> Result<()> {
    let required = [
        ("topic", &report.topic),
        ("overall_sentiment", &report.overall_sentiment),
        ("potential_impact", &report.potential_impact),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(PipelineError::RenderError(format!(
                "analysis field `{}` is empty",
                field
            )));
        }
    }

    if let Some(score) = report.sentiment_score {
        if !(SCORE_MIN..=SCORE_MAX).contains(&i64::from(score)) {
            return Err(PipelineError::RenderError(format!(
                "sentiment_score {} outside [{}, {}]",
                score, SCORE_MIN, SCORE_MAX
            )));
        }
    }

    Ok(())
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalysisReport, chart: Option<&ChartArtifact>) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "# Business Intelligence Report: {}\n\n",
        report.topic
    ));

    // Sentiment
    output.push_str("## Overall Sentiment Analysis\n\n");
    output.push_str(&format!("**Sentiment:** {}\n", report.overall_sentiment));
    if let Some(score) = report.sentiment_score {
        output.push_str(&format!(
            "\n**Sentiment Score:** {} (scale {} to {})\n",
            score, SCORE_MIN, SCORE_MAX
        ));
    }
    output.push('\n');

    // Findings
    output.push_str("## Key Findings\n\n");
    if report.key_findings.is_empty() {
        output.push_str(&format!("_{}_\n", NO_FINDINGS_NOTICE));
    } else {
        for finding in &report.key_findings {
            output.push_str(&format!("- {}\n", single_line(finding)));
        }
    }
    output.push('\n');

    // Impact
    output.push_str("## Potential Impact\n\n");
    output.push_str(report.potential_impact.trim());
    output.push_str("\n\n");

    // Chart
    output.push_str("## Sentiment Chart\n\n");
    match chart {
        Some(chart) => output.push_str(&format!(
            "![Sentiment chart]({})\n\n",
            chart.file_name()
        )),
        None => output.push_str(&format!("_{}_\n\n", NO_CHART_NOTICE)),
    }

    output.push_str("---\n\n");
    output.push_str("*Report generated by newsbrief*\n");

    output
}

/// Generate an HTML report suitable for an email body.
pub fn generate_html_report(
    report: &AnalysisReport,
    chart: Option<&ChartArtifact>,
) -> Result<String> {
    let mut output = String::new();

    output.push_str(&format!(
        "<h1>Business Intelligence Report: {}</h1>\n",
        escape_html(&report.topic)
    ));

    output.push_str("<h2>Overall Sentiment Analysis</h2>\n");
    output.push_str(&format!(
        "<p><b>Sentiment:</b> {}</p>\n",
        escape_html(&report.overall_sentiment)
    ));
    if let Some(score) = report.sentiment_score {
        output.push_str(&format!(
            "<p><b>Sentiment Score:</b> {} (scale {} to {})</p>\n",
            score, SCORE_MIN, SCORE_MAX
        ));
    }

    output.push_str("<h2>Key Findings</h2>\n");
    if report.key_findings.is_empty() {
        output.push_str(&format!("<p><i>{}</i></p>\n", NO_FINDINGS_NOTICE));
    } else {
        output.push_str("<ul>\n");
        for finding in &report.key_findings {
            output.push_str(&format!("<li>{}</li>\n", escape_html(finding.trim())));
        }
        output.push_str("</ul>\n");
    }

    output.push_str("<h2>Potential Impact</h2>\n");
    output.push_str(&format!(
        "<p>{}</p>\n",
        escape_html(report.potential_impact.trim())
    ));

    output.push_str("<h2>Sentiment Chart</h2>\n");
    match (chart, report.sentiment_score) {
        (Some(_), Some(score)) => {
            let svg = render_sentiment_gauge(score, &report.topic)
                .map_err(|e| PipelineError::RenderError(e.to_string()))?;
            output.push_str("<div>\n");
            output.push_str(&svg);
            output.push_str("</div>\n");
        }
        (Some(chart), None) => output.push_str(&format!(
            "<p><img src=\"{}\" alt=\"Sentiment chart\"/></p>\n",
            escape_html(&chart.file_name())
        )),
        (None, _) => output.push_str(&format!("<p><i>{}</i></p>\n", NO_CHART_NOTICE)),
    }

    Ok(output)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    analysis: &'a AnalysisReport,
    chart_path: Option<String>,
}

/// Generate a JSON report.
pub fn generate_json_report(
    report: &AnalysisReport,
    chart: Option<&ChartArtifact>,
) -> Result<String> {
    let json = JsonReport {
        analysis: report,
        chart_path: chart.map(ChartArtifact::file_name),
    };
    serde_json::to_string_pretty(&json).map_err(|e| PipelineError::RenderError(e.to_string()))
}

/// Escape text for HTML and SVG output.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Collapse a finding onto one line so it stays a single bullet.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
