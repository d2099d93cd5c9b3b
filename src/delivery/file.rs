//! Report file persistence.

use crate::error::{PipelineError, Result};
use crate::models::{Report, Topic};
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use tracing::info;

/// Characters that are not allowed in file names on common platforms.
const ILLEGAL_FILENAME_CHARS: &[char] = &['/', '\\', '*', '?', ':', '"', '<', '>', '|'];

/// Longest sanitized topic, in bytes, embedded in a file name. Leaves room
/// for the prefix, date and extension under the common 255-byte limit.
pub const MAX_TOPIC_BYTES: usize = 100;

/// Writes reports to date-stamped files.
pub struct FilePersister {
    output_dir: PathBuf,
}

impl FilePersister {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write the report stamped with today's local date.
    pub fn persist(&self, topic: &Topic, report: &Report) -> Result<PathBuf> {
        self.persist_on(topic, report, Local::now().date_naive())
    }

    /// Write the report stamped with `date`, replacing any existing file.
    pub fn persist_on(&self, topic: &Topic, report: &Report, date: NaiveDate) -> Result<PathBuf> {
        let path = self
            .output_dir
            .join(report_filename(topic, date, report.format.extension()));

        let to_error = |source| PipelineError::Persistence {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.output_dir).map_err(to_error)?;
        std::fs::write(&path, &report.body).map_err(to_error)?;

        info!("Report for '{}' saved to {}", topic, path.display());
        Ok(path)
    }
}

/// Make a topic safe to embed in a file name.
pub fn sanitize_topic(topic: &str) -> String {
    let kept: String = topic
        .chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c) && !c.is_control())
        .collect();
    let mut joined = kept.split_whitespace().collect::<Vec<_>>().join("_");

    if joined.len() > MAX_TOPIC_BYTES {
        let mut end = MAX_TOPIC_BYTES;
        while !joined.is_char_boundary(end) {
            end -= 1;
        }
        joined.truncate(end);
        joined.truncate(joined.trim_end_matches('_').len());
    }

    if joined.is_empty() {
        "untitled".to_string()
    } else {
        joined
    }
}

/// `report_{topic}_{YYYY-MM-DD}.{ext}`
pub fn report_filename(topic: &Topic, date: NaiveDate, extension: &str) -> String {
    format!(
        "report_{}_{}.{}",
        sanitize_topic(topic.as_str()),
        date.format("%Y-%m-%d"),
        extension
    )
}
