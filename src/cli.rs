//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::DeliveryMode;
use crate::models::ReportFormat;
use clap::Parser;
use std::path::PathBuf;

/// newsbrief - LLM-powered daily news briefings
///
/// Searches the news for each topic, asks a language model for a structured
/// sentiment analysis, and emails the report or writes it to disk.
///
/// Examples:
///   newsbrief
///   newsbrief --topics "NVIDIA stock performance,Solar power"
///   newsbrief --delivery file --chart --output-dir reports
///   newsbrief --interactive
///   newsbrief --dry-run
///   newsbrief --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Topics to research (comma-separated)
    ///
    /// Falls back to the config file's default topics when unset.
    #[arg(
        short,
        long,
        value_name = "TOPICS",
        value_delimiter = ',',
        env = "TOPICS_TO_RESEARCH"
    )]
    pub topics: Option<Vec<String>>,

    /// Prompt for a single topic, run once and write the report to a file
    #[arg(short, long)]
    pub interactive: bool,

    /// Model used for analysis
    #[arg(short, long, env = "NEWSBRIEF_MODEL")]
    pub model: Option<String>,

    /// Temperature for LLM responses (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds for every external call
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum number of search results per topic
    #[arg(long, value_name = "COUNT")]
    pub max_results: Option<usize>,

    /// How to deliver finished reports
    #[arg(long, value_name = "MODE")]
    pub delivery: Option<DeliveryMode>,

    /// Report format (defaults to html for email, markdown for files)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Directory for report files and charts
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Render a sentiment chart for each topic
    #[arg(long, conflicts_with = "no_chart")]
    pub chart: bool,

    /// Skip chart rendering even if the config enables it
    #[arg(long, conflicts_with = "chart")]
    pub no_chart: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .newsbrief.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the resolved topics and pipeline without calling any service
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .newsbrief.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // The search API caps a single query at 20 results.
        if let Some(max_results) = self.max_results {
            if !(1..=20).contains(&max_results) {
                return Err("Max results must be between 1 and 20".to_string());
            }
        }

        if let Some(ref dir) = self.output_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!(
                    "Output path is not a directory: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general] verbose` from the config file; `--quiet`
    /// still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            topics: None,
            interactive: false,
            model: None,
            temperature: None,
            timeout: None,
            max_results: None,
            delivery: None,
            format: None,
            output_dir: None,
            chart: false,
            no_chart: false,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_topic_delimiter() {
        let args = Args::try_parse_from([
            "newsbrief",
            "--topics",
            "NVIDIA stock performance,Solar power",
        ])
        .unwrap();
        assert_eq!(
            args.topics,
            Some(vec![
                "NVIDIA stock performance".to_string(),
                "Solar power".to_string()
            ])
        );
    }

    #[test]
    fn test_parse_value_enums() {
        let args = Args::try_parse_from([
            "newsbrief",
            "--delivery",
            "file",
            "--format",
            "json",
            "--chart",
        ])
        .unwrap();
        assert_eq!(args.delivery, Some(DeliveryMode::File));
        assert_eq!(args.format, Some(ReportFormat::Json));
        assert!(args.chart);
    }

    #[test]
    fn test_chart_flags_conflict() {
        assert!(Args::try_parse_from(["newsbrief", "--chart", "--no-chart"]).is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        args.max_results = Some(0);
        assert!(args.validate().is_err());

        args.max_results = Some(21);
        assert!(args.validate().is_err());

        args.max_results = Some(5);
        args.temperature = Some(3.0);
        assert!(args.validate().is_err());

        args.temperature = Some(0.0);
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        args.timeout = Some(30);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
