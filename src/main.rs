//! newsbrief - AI-powered daily news briefings
//!
//! A CLI tool that searches the news for each configured topic, asks a
//! language model for a structured sentiment analysis, and emails the
//! report or writes it to disk.
//!
//! Exit codes:
//!   0 - Run finished (individual topic failures are logged, not fatal)
//!   1 - Invalid arguments, or --init-config refused to overwrite

mod agent;
mod cli;
mod config;
mod delivery;
mod error;
mod models;
mod pipeline;
mod providers;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DeliveryMode, Secrets, CONFIG_FILE_NAME};
use delivery::{Delivery, EmailNotifier, FilePersister};
use indicatif::{ProgressBar, ProgressStyle};
use models::{parse_topic_list, Topic};
use pipeline::{BatchSummary, Pipeline};
use providers::{MailCapability, OpenAIClient, ResendClient, TavilyClient};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a local .env file
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // The config file can raise verbosity, so it is read before logging starts.
    let loaded = load_config(&args).map(|(mut config, source)| {
        config.merge_with_args(&args);
        (config, source)
    });
    let config_verbose = matches!(&loaded, Ok((config, _)) if config.general.verbose);

    // Initialize logging
    init_logging(args.log_level(config_verbose));

    info!("newsbrief v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    if dotenv_loaded {
        debug!("Loaded environment from .env");
    }

    // Topic failures are handled inside the run; anything reaching here
    // stopped the run before it started and is reported the same way.
    let result = match loaded {
        Ok((config, source)) => {
            source.log();
            run(args, config).await
        }
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        error!("Run aborted: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
    }

    Ok(())
}

/// Handle --init-config: generate a default .newsbrief.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the model, topics, delivery, and more.");
    Ok(())
}

/// Initialize logging at `level`. `RUST_LOG` wins when set.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Resolve topics, build the pipeline, and run it.
async fn run(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    config.validate().context("Invalid configuration")?;

    let topics = if args.interactive {
        match prompt_topic(&mut std::io::stdin().lock(), &mut std::io::stdout())? {
            Some(topic) => vec![topic],
            None => {
                println!("No topic entered. Nothing to do.");
                return Ok(());
            }
        }
    } else {
        resolve_topics(&args, &config)
    };

    if topics.is_empty() {
        warn!("No topics to research");
        return Ok(());
    }

    let secrets = Secrets::from_env();

    // Handle --dry-run: show the plan and exit
    if args.dry_run {
        handle_dry_run(&topics, &config, &secrets);
        return Ok(());
    }

    let pipeline = build_pipeline(&config, &secrets)?;

    println!("📰 Starting briefing run");
    println!("   Model: {}", config.model.name);
    println!("   Pipeline: {}", pipeline.describe());
    println!("   Topics: {}", topics.len());

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(topics.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        pb
    };

    let summary = pipeline.run_batch(&topics, &progress).await;
    print_summary(&summary, start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Where the configuration came from. Logged once logging is up.
enum ConfigSource {
    File(PathBuf),
    Defaults,
    InvalidDefault(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::InvalidDefault(e) => {
                warn!("Failed to load config: {:#}; using defaults", e)
            }
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::File(PathBuf::from(CONFIG_FILE_NAME)))),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::InvalidDefault(e))),
    }
}

/// Topics from `--topics`/`TOPICS_TO_RESEARCH`, else the configured defaults.
fn resolve_topics(args: &Args, config: &Config) -> Vec<Topic> {
    if let Some(ref list) = args.topics {
        let topics = parse_topic_list(list);
        if !topics.is_empty() {
            return topics;
        }
    }

    info!("No topics supplied via --topics or TOPICS_TO_RESEARCH; using default topics");
    parse_topic_list(&config.pipeline.default_topics)
}

/// Ask for one topic. Returns `None` on blank input or EOF.
fn prompt_topic<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<Topic>> {
    write!(output, "Enter a topic to research: ").context("Failed to write prompt")?;
    output.flush().context("Failed to flush prompt")?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read topic from stdin")?;

    Ok(Topic::new(line))
}

/// Handle --dry-run: print what would run, make no external calls.
fn handle_dry_run(topics: &[Topic], config: &Config, secrets: &Secrets) {
    println!("\n🔍 Dry run: no search, model, or mail calls will be made.\n");

    let mut steps = vec!["research", "analyze"];
    if config.pipeline.chart {
        steps.push("chart");
    }
    steps.push("write");
    steps.push(match config.delivery.mode {
        DeliveryMode::Email => "email",
        DeliveryMode::File => "file",
    });

    println!("   Pipeline: {}", steps.join(" → "));
    println!("   Format: {:?}", config.delivery.effective_format());
    println!("   Output dir: {}", config.general.output_dir.display());
    println!("   Model: {}", config.model.name);

    let key_status = |present: bool| if present { "set" } else { "MISSING" };
    println!(
        "   OPENAI_API_KEY: {}",
        key_status(secrets.openai_api_key.is_some())
    );
    println!(
        "   TAVILY_API_KEY: {}",
        key_status(secrets.tavily_api_key.is_some())
    );
    if config.delivery.mode == DeliveryMode::Email {
        let missing = secrets.mail.missing();
        if missing.is_empty() {
            println!("   Email: configured");
        } else {
            println!("   Email: will be skipped (missing {})", missing.join(", "));
        }
    }

    println!("\n   Topics ({}):", topics.len());
    for topic in topics {
        println!("     • {}", topic);
    }

    println!("\n✅ Dry run complete.");
}

/// Construct every client once and wire them into the pipeline.
fn build_pipeline(config: &Config, secrets: &Secrets) -> Result<Pipeline> {
    let openai_key = secrets
        .openai_api_key
        .as_deref()
        .context("OPENAI_API_KEY environment variable not set")?;
    let tavily_key = secrets
        .tavily_api_key
        .as_deref()
        .context("TAVILY_API_KEY environment variable not set")?;

    let search = Arc::new(TavilyClient::new(config.search.clone(), tavily_key)?);
    let inference = Arc::new(OpenAIClient::new(config.model.clone(), openai_key)?);

    let researcher = agent::Researcher::new(search, config.search.max_results);
    let analyst = agent::Analyst::new(inference);
    let visualizer = config
        .pipeline
        .chart
        .then(|| agent::Visualizer::new(&config.general.output_dir));

    let delivery = match config.delivery.mode {
        DeliveryMode::Email => {
            let mail: Option<Arc<dyn MailCapability>> = match secrets.mail.api_key {
                Some(ref key) => Some(Arc::new(ResendClient::new(
                    config.delivery.mail_api_base.clone(),
                    key.clone(),
                    config.model.timeout_seconds,
                )?)),
                None => None,
            };
            Delivery::Email(EmailNotifier::new(
                mail,
                secrets.mail.clone(),
                config.delivery.subject_prefix.clone(),
            ))
        }
        DeliveryMode::File => Delivery::File(FilePersister::new(&config.general.output_dir)),
    };

    Ok(Pipeline::new(
        researcher,
        analyst,
        visualizer,
        config.delivery.effective_format(),
        delivery,
    ))
}

/// Print the end-of-run summary.
fn print_summary(summary: &BatchSummary, duration: f64) {
    println!("\n📊 Run Summary:");
    println!("   Topics processed: {}", summary.total());

    let undelivered = summary.delivery_failures().count();
    println!("   Succeeded: {}", summary.succeeded.len() - undelivered);
    for outcome in summary
        .succeeded
        .iter()
        .filter(|o| !o.delivery.is_failure())
    {
        println!("     ✅ {}: {}", outcome.topic, outcome.delivery);
    }
    if undelivered > 0 {
        println!("   Report produced, delivery failed: {}", undelivered);
        for outcome in summary.delivery_failures() {
            println!("     ⚠️  {}: {}", outcome.topic, outcome.delivery);
        }
    }
    if !summary.failed.is_empty() {
        println!("   Failed: {}", summary.failed.len());
        for (topic, e) in &summary.failed {
            println!("     ❌ {}: {}", topic, e);
        }
    }
    println!("   Duration: {:.1}s", duration);
    println!("\n✅ All briefing tasks complete.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    #[test]
    fn test_prompt_topic_trims_input() {
        let mut input = Cursor::new("  Solar power \n");
        let mut output = Vec::new();

        let topic = prompt_topic(&mut input, &mut output).unwrap();

        assert_eq!(topic.unwrap().as_str(), "Solar power");
        assert_eq!(String::from_utf8(output).unwrap(), "Enter a topic to research: ");
    }

    #[test]
    fn test_prompt_topic_blank_or_eof_is_none() {
        for raw in ["   \n", ""] {
            let mut input = Cursor::new(raw);
            assert!(prompt_topic(&mut input, &mut Vec::<u8>::new()).unwrap().is_none());
        }
    }

    #[test]
    fn test_config_file_verbose_and_bounds() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[general]\nverbose = true\n\n[search]\nmax_results = 0").unwrap();

        let args = Args::try_parse_from([
            "newsbrief",
            "--config",
            file.path().to_str().unwrap(),
        ])
        .unwrap();
        let (config, source) = load_config(&args).unwrap();

        assert!(matches!(source, ConfigSource::File(_)));
        assert!(config.general.verbose);
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_topics_prefers_args() {
        let args =
            Args::try_parse_from(["newsbrief", "--topics", " EVs , ,Solar power"]).unwrap();
        let topics = resolve_topics(&args, &Config::default());
        let names: Vec<&str> = topics.iter().map(Topic::as_str).collect();
        assert_eq!(names, vec!["EVs", "Solar power"]);
    }

    #[test]
    fn test_resolve_topics_falls_back_to_defaults() {
        let mut args = Args::try_parse_from(["newsbrief"]).unwrap();
        args.topics = None;
        let topics = resolve_topics(&args, &Config::default());
        assert_eq!(topics.len(), 3);
        assert_eq!(topics[0].as_str(), "NVIDIA stock performance");

        args.topics = Some(vec![" ".to_string()]);
        assert_eq!(resolve_topics(&args, &Config::default()).len(), 3);
    }

    #[test]
    fn test_build_pipeline_requires_credentials() {
        let config = Config::default();
        let err = build_pipeline(&config, &Secrets::default()).err().unwrap();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let secrets = Secrets {
            openai_api_key: Some("sk-test".to_string()),
            ..Secrets::default()
        };
        let err = build_pipeline(&config, &secrets).err().unwrap();
        assert!(err.to_string().contains("TAVILY_API_KEY"));
    }

    #[test]
    fn test_build_pipeline_without_mail_credentials() {
        let mut config = Config::default();
        config.pipeline.chart = true;
        let secrets = Secrets {
            openai_api_key: Some("sk-test".to_string()),
            tavily_api_key: Some("tvly-test".to_string()),
            ..Secrets::default()
        };

        let pipeline = build_pipeline(&config, &secrets).unwrap();
        assert_eq!(
            pipeline.describe(),
            "research → analyze → chart → write → email (Html)"
        );
    }
}
