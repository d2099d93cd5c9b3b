//! SVG sentiment gauge.
//!
//! Draws a horizontal scale from the lowest to the highest score, with the
//! negative half red, the positive half green, and a marker at the score.

use super::generator::escape_html;
use crate::error::{PipelineError, Result};
use crate::models::{SCORE_MAX, SCORE_MIN};

const WIDTH: i64 = 600;
const HEIGHT: i64 = 170;
const SCALE_LEFT: i64 = 50;
const SCALE_RIGHT: i64 = 550;
const SCALE_TOP: i64 = 70;
const SCALE_HEIGHT: i64 = 30;

/// X coordinate of a score on the scale.
fn score_x(score: i64) -> i64 {
    let span = SCORE_MAX - SCORE_MIN;
    SCALE_LEFT + (score - SCORE_MIN) * (SCALE_RIGHT - SCALE_LEFT) / span
}

/// Render the gauge for `score`, titled with `title`.
pub fn render_sentiment_gauge(score: i8, title: &str) -> Result<String> {
    let score = i64::from(score);
    if !(SCORE_MIN..=SCORE_MAX).contains(&score) {
        return Err(PipelineError::ArtifactGenerationFailure(format!(
            "score {} outside [{}, {}]",
            score, SCORE_MIN, SCORE_MAX
        )));
    }

    let mid = score_x(0);
    let marker = score_x(score);
    let (bar_x, bar_width) = if marker >= mid {
        (mid, marker - mid)
    } else {
        (marker, mid - marker)
    };
    let bar_color = match score {
        s if s > 0 => "#2e7d32",
        s if s < 0 => "#c62828",
        _ => "#757575",
    };
    let label_y = SCALE_TOP + SCALE_HEIGHT + 20;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = WIDTH,
        h = HEIGHT
    ));
    svg.push_str(&format!(
        "  <rect width=\"{}\" height=\"{}\" fill=\"#ffffff\"/>\n",
        WIDTH, HEIGHT
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"30\" font-family=\"sans-serif\" font-size=\"16\" text-anchor=\"middle\">Sentiment: {}</text>\n",
        WIDTH / 2,
        escape_html(title)
    ));

    // Background halves.
    svg.push_str(&format!(
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#ffcdd2\"/>\n",
        SCALE_LEFT,
        SCALE_TOP,
        mid - SCALE_LEFT,
        SCALE_HEIGHT
    ));
    svg.push_str(&format!(
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#c8e6c9\"/>\n",
        mid,
        SCALE_TOP,
        SCALE_RIGHT - mid,
        SCALE_HEIGHT
    ));

    // Score bar and marker.
    svg.push_str(&format!(
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>\n",
        bar_x,
        SCALE_TOP + 8,
        bar_width,
        SCALE_HEIGHT - 16,
        bar_color
    ));
    svg.push_str(&format!(
        "  <line x1=\"{x}\" y1=\"{}\" x2=\"{x}\" y2=\"{}\" stroke=\"#212121\" stroke-width=\"3\"/>\n",
        SCALE_TOP - 6,
        SCALE_TOP + SCALE_HEIGHT + 6,
        x = marker
    ));

    // Axis labels.
    for (value, anchor) in [(SCORE_MIN, "start"), (0, "middle"), (SCORE_MAX, "end")] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-family=\"sans-serif\" font-size=\"12\" text-anchor=\"{}\">{}</text>\n",
            score_x(value),
            label_y,
            anchor,
            value
        ));
    }
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" font-family=\"sans-serif\" font-size=\"14\" font-weight=\"bold\" text-anchor=\"middle\">Score: {}</text>\n",
        WIDTH / 2,
        label_y + 30,
        score
    ));
    svg.push_str("</svg>\n");

    Ok(svg)
}
