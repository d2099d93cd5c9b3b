//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.newsbrief.toml` files, plus the credentials that only ever come
//! from the environment.

use crate::models::ReportFormat;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".newsbrief.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Inference model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Search service settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Report delivery settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Pipeline shape and topics.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory that receives report files and charts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            verbose: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_model_api_base")]
    pub api_base: String,

    /// Temperature for generation.
    #[serde(default)]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_base: default_model_api_base(),
            temperature: 0.0,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_model_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout() -> u64 {
    120
}

/// News search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the search API.
    #[serde(default = "default_search_api_base")]
    pub api_base: String,

    /// Maximum number of results requested per topic.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Search depth ("basic" or "advanced").
    #[serde(default = "default_search_depth")]
    pub search_depth: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_base: default_search_api_base(),
            max_results: default_max_results(),
            search_depth: default_search_depth(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_search_api_base() -> String {
    "https://api.tavily.com".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_search_depth() -> String {
    "basic".to_string()
}

/// How a finished report leaves the process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Email the report through the mail API
    #[default]
    Email,
    /// Write the report to a date-stamped file
    File,
}

/// Report delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Email or file.
    #[serde(default)]
    pub mode: DeliveryMode,

    /// Report format. Defaults to HTML for email and Markdown for files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,

    /// Base URL of the mail API.
    #[serde(default = "default_mail_api_base")]
    pub mail_api_base: String,

    /// Subject prefix; the topic is appended.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            mode: DeliveryMode::default(),
            format: None,
            mail_api_base: default_mail_api_base(),
            subject_prefix: default_subject_prefix(),
        }
    }
}

fn default_mail_api_base() -> String {
    "https://api.resend.com".to_string()
}

fn default_subject_prefix() -> String {
    "Daily AI BI Report".to_string()
}

impl DeliveryConfig {
    /// The format actually used for rendering.
    pub fn effective_format(&self) -> ReportFormat {
        self.format.unwrap_or(match self.mode {
            DeliveryMode::Email => ReportFormat::Html,
            DeliveryMode::File => ReportFormat::Markdown,
        })
    }
}

/// Pipeline shape and default topics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Render a sentiment chart between analysis and writing.
    #[serde(default)]
    pub chart: bool,

    /// Topics used when neither `--topics` nor `TOPICS_TO_RESEARCH` is set.
    #[serde(default = "default_topics")]
    pub default_topics: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chart: false,
            default_topics: default_topics(),
        }
    }
}

fn default_topics() -> Vec<String> {
    vec![
        "NVIDIA stock performance",
        "Latest advancements in autonomous driving",
        "Market trends in renewable energy",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
            self.search.timeout_seconds = timeout;
        }

        if let Some(max_results) = args.max_results {
            self.search.max_results = max_results;
        }

        if let Some(ref output_dir) = args.output_dir {
            self.general.output_dir = output_dir.clone();
        }

        if let Some(mode) = args.delivery {
            self.delivery.mode = mode;
        }
        if let Some(format) = args.format {
            self.delivery.format = Some(format);
        }

        // Interactive runs always end in a file on disk.
        if args.interactive {
            self.delivery.mode = DeliveryMode::File;
        }

        if args.chart {
            self.pipeline.chart = true;
        } else if args.no_chart {
            self.pipeline.chart = false;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check the merged configuration. Values from the file get the same
    /// bounds as their command-line counterparts.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            bail!(
                "model.temperature must be between 0.0 and 2.0, got {}",
                self.model.temperature
            );
        }
        if self.model.timeout_seconds == 0 {
            bail!("model.timeout_seconds must be at least 1");
        }
        if self.search.timeout_seconds == 0 {
            bail!("search.timeout_seconds must be at least 1");
        }
        // The search API caps a single query at 20 results.
        if !(1..=20).contains(&self.search.max_results) {
            bail!(
                "search.max_results must be between 1 and 20, got {}",
                self.search.max_results
            );
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

/// Credentials for the mail API. Any missing value disables email delivery.
#[derive(Debug, Clone, Default)]
pub struct MailCredentials {
    pub api_key: Option<String>,
    pub sender: Option<String>,
    pub recipient: Option<String>,
}

impl MailCredentials {
    /// Names of the environment variables that are missing, in a stable order.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.is_none() {
            missing.push("RESEND_API_KEY");
        }
        if self.sender.is_none() {
            missing.push("EMAIL_SENDER_ADDRESS");
        }
        if self.recipient.is_none() {
            missing.push("EMAIL_RECIPIENT_ADDRESS");
        }
        missing
    }
}

/// Secrets read once from the environment at startup.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub openai_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub mail: MailCredentials,
}

impl Secrets {
    /// Read secrets from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read secrets through an arbitrary lookup. Blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            tavily_api_key: get("TAVILY_API_KEY"),
            mail: MailCredentials {
                api_key: get("RESEND_API_KEY"),
                sender: get("EMAIL_SENDER_ADDRESS"),
                recipient: get("EMAIL_RECIPIENT_ADDRESS"),
            },
        }
    }
}
