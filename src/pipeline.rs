//! Per-topic orchestration.
//!
//! A topic runs researcher → analyst → (visualizer) → writer → delivery,
//! each step awaited before the next. Any error ends that topic only; the
//! batch always runs every topic.

use crate::agent::{Analyst, Researcher, Visualizer};
use crate::delivery::{Delivery, DeliveryOutcome};
use crate::error::{PipelineError, Result};
use crate::models::{ChartArtifact, ReportFormat, RunState, Topic};
use crate::report::render_report;
use indicatif::ProgressBar;
use tracing::{error, info, warn};

/// Result of a topic that made it through every step.
#[derive(Debug)]
pub struct TopicOutcome {
    pub topic: Topic,
    pub chart: Option<ChartArtifact>,
    pub delivery: DeliveryOutcome,
}

/// Outcome of a whole batch.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub succeeded: Vec<TopicOutcome>,
    pub failed: Vec<(Topic, PipelineError)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Topics that produced a report the notifier then failed to send.
    pub fn delivery_failures(&self) -> impl Iterator<Item = &TopicOutcome> {
        self.succeeded.iter().filter(|o| o.delivery.is_failure())
    }
}

/// The assembled pipeline.
pub struct Pipeline {
    researcher: Researcher,
    analyst: Analyst,
    visualizer: Option<Visualizer>,
    format: ReportFormat,
    delivery: Delivery,
}

impl Pipeline {
    pub fn new(
        researcher: Researcher,
        analyst: Analyst,
        visualizer: Option<Visualizer>,
        format: ReportFormat,
        delivery: Delivery,
    ) -> Self {
        Self {
            researcher,
            analyst,
            visualizer,
            format,
            delivery,
        }
    }

    /// Human-readable list of steps, for dry runs.
    pub fn describe(&self) -> String {
        let mut steps = vec!["research", "analyze"];
        if self.visualizer.is_some() {
            steps.push("chart");
        }
        steps.push("write");
        steps.push(self.delivery.describe());
        format!("{} ({:?})", steps.join(" → "), self.format)
    }

    /// Run every step for one topic.
    pub async fn run_topic(&self, topic: Topic) -> Result<TopicOutcome> {
        let mut state = RunState::new(topic);

        info!("Researching '{}'", state.topic());
        let research = self.researcher.research(state.topic()).await?;
        state.set_search_results(research)?;

        info!("Analyzing '{}'", state.topic());
        let analysis = self
            .analyst
            .analyze(state.topic(), state.search_results()?)
            .await?;
        state.set_analysis_report(analysis)?;

        if let Some(ref visualizer) = self.visualizer {
            let chart = visualizer.visualize(state.analysis_report()?);
            state.set_chart_path(chart)?;
        }

        let report = render_report(state.analysis_report()?, state.chart_path(), self.format)?;
        state.set_final_report(report)?;

        let delivery = self
            .delivery
            .deliver(state.topic(), state.final_report()?)
            .await?;

        Ok(TopicOutcome {
            topic: state.topic().clone(),
            chart: state.chart_path().cloned(),
            delivery,
        })
    }

    /// Run every topic in order, logging failures and moving on.
    pub async fn run_batch(&self, topics: &[Topic], progress: &ProgressBar) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for topic in topics {
            progress.set_message(topic.to_string());
            info!("Processing topic: '{}'", topic);

            match self.run_topic(topic.clone()).await {
                Ok(outcome) => {
                    if outcome.delivery.is_failure() {
                        warn!("Report for '{}' not delivered: {}", topic, outcome.delivery);
                    } else {
                        info!("Finished '{}': {}", topic, outcome.delivery);
                    }
                    summary.succeeded.push(outcome);
                }
                Err(e) => {
                    error!(
                        "Workflow for topic '{}' failed ({}): {}",
                        topic,
                        e.kind(),
                        e
                    );
                    summary.failed.push((topic.clone(), e));
                }
            }

            progress.inc(1);
        }

        progress.finish_and_clear();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailCredentials;
    use crate::delivery::{EmailNotifier, FilePersister};
    use crate::models::SearchHit;
    use crate::providers::{
        InferenceCapability, MailCapability, OutgoingEmail, OutputSchema, SearchCapability,
    };
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Fails for topic "X", otherwise returns one hit.
    struct FlakySearch {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchCapability for FlakySearch {
        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
            self.queries.lock().unwrap().push(query.to_string());
            if query.ends_with(" X") {
                return Err(PipelineError::unavailable("search", "connection refused"));
            }
            Ok(vec![SearchHit {
                title: "Headline".to_string(),
                url: "https://news.example/1".to_string(),
                content: "Something happened.".to_string(),
            }])
        }
    }

    /// Answers with a fixed analysis whose topic never matches the input.
    struct FixedInference {
        score: Value,
    }

    #[async_trait]
    impl InferenceCapability for FixedInference {
        async fn complete_structured(
            &self,
            _system: &str,
            _prompt: &str,
            _schema: &OutputSchema,
        ) -> Result<Value> {
            Ok(json!({
                "topic": "something else",
                "overall_sentiment": "positive",
                "key_findings": ["f1", "f2"],
                "potential_impact": "Broad upside.",
                "sentiment_score": self.score
            }))
        }
    }

    /// Answers with the next score in line, one per call.
    struct ScriptedInference {
        scores: Mutex<VecDeque<i64>>,
    }

    #[async_trait]
    impl InferenceCapability for ScriptedInference {
        async fn complete_structured(
            &self,
            _system: &str,
            _prompt: &str,
            _schema: &OutputSchema,
        ) -> Result<Value> {
            let score = self.scores.lock().unwrap().pop_front();
            Ok(json!({
                "topic": "ignored",
                "overall_sentiment": "mixed",
                "key_findings": ["f1"],
                "potential_impact": "Some.",
                "sentiment_score": score
            }))
        }
    }

    #[derive(Default)]
    struct RecordingMail {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: bool,
    }

    #[async_trait]
    impl MailCapability for RecordingMail {
        async fn send(&self, email: &OutgoingEmail) -> Result<String> {
            self.sent.lock().unwrap().push(email.clone());
            if self.fail {
                return Err(PipelineError::unavailable("mail", "API error 500"));
            }
            Ok("msg_1".to_string())
        }
    }

    fn full_credentials() -> MailCredentials {
        MailCredentials {
            api_key: Some("re_test".to_string()),
            sender: Some("bot@example.com".to_string()),
            recipient: Some("me@example.com".to_string()),
        }
    }

    fn search() -> Arc<FlakySearch> {
        Arc::new(FlakySearch {
            queries: Mutex::new(Vec::new()),
        })
    }

    fn file_pipeline(
        search: Arc<FlakySearch>,
        score: Value,
        visualizer: Option<Visualizer>,
        dir: &TempDir,
    ) -> Pipeline {
        Pipeline::new(
            Researcher::new(search, 5),
            Analyst::new(Arc::new(FixedInference { score })),
            visualizer,
            ReportFormat::Markdown,
            Delivery::File(FilePersister::new(dir.path())),
        )
    }

    fn topics(names: &[&str]) -> Vec<Topic> {
        names.iter().filter_map(|n| Topic::new(n)).collect()
    }

    fn written_path(outcome: &TopicOutcome) -> std::path::PathBuf {
        match &outcome.delivery {
            DeliveryOutcome::Written { path } => path.clone(),
            other => panic!("expected a written report, got {:?}", other),
        }
    }

    fn written(outcome: &TopicOutcome) -> String {
        std::fs::read_to_string(written_path(outcome)).unwrap()
    }

    /// Resolve the report's chart link the way a Markdown viewer would.
    fn linked_chart(outcome: &TopicOutcome) -> String {
        let report = written(outcome);
        let link = report
            .lines()
            .find_map(|l| l.strip_prefix("![Sentiment chart]("))
            .and_then(|l| l.strip_suffix(')'))
            .unwrap()
            .to_string();
        let report_path = written_path(outcome);
        std::fs::read_to_string(report_path.parent().unwrap().join(link)).unwrap()
    }

    #[tokio::test]
    async fn test_scenario_a_report_contents() {
        let dir = TempDir::new().unwrap();
        let pipeline = file_pipeline(search(), json!(6), None, &dir);

        let outcome = pipeline
            .run_topic(Topic::new("NVIDIA stock performance").unwrap())
            .await
            .unwrap();
        let report = written(&outcome);

        assert!(report.starts_with("# Business Intelligence Report: NVIDIA stock performance"));
        assert!(report.contains("**Sentiment Score:** 6"));
        assert_eq!(report.lines().filter(|l| l.starts_with("- ")).count(), 2);
        assert!(!report.contains("something else"));
    }

    #[tokio::test]
    async fn test_scenario_b_failed_topic_does_not_stop_batch() {
        let dir = TempDir::new().unwrap();
        let search = search();
        let pipeline = file_pipeline(search.clone(), json!(2), None, &dir);

        let summary = pipeline
            .run_batch(&topics(&["X", "Solar power"]), &ProgressBar::hidden())
            .await;

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0.as_str(), "X");
        assert!(matches!(
            summary.failed[0].1,
            PipelineError::CapabilityUnavailable { .. }
        ));
        assert_eq!(summary.succeeded.len(), 1);
        assert_eq!(summary.succeeded[0].topic.as_str(), "Solar power");
        assert_eq!(search.queries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_scenario_c_chart_failure_still_reports() {
        let dir = TempDir::new().unwrap();
        let not_a_dir = tempfile::NamedTempFile::new().unwrap();
        let pipeline = file_pipeline(
            search(),
            json!(4),
            Some(Visualizer::new(not_a_dir.path())),
            &dir,
        );

        let outcome = pipeline
            .run_topic(Topic::new("Solar power").unwrap())
            .await
            .unwrap();

        assert!(outcome.chart.is_none());
        let report = written(&outcome);
        assert!(report.contains("No chart was produced"));
        assert!(!report.contains("!["));
    }

    #[tokio::test]
    async fn test_chart_variant_references_chart() {
        let dir = TempDir::new().unwrap();
        let pipeline = file_pipeline(
            search(),
            json!(-3),
            Some(Visualizer::new(dir.path())),
            &dir,
        );

        let outcome = pipeline
            .run_topic(Topic::new("Solar power").unwrap())
            .await
            .unwrap();

        let chart = outcome.chart.clone().unwrap();
        assert!(chart.path().exists());
        assert!(written(&outcome).contains(&format!("]({})", chart.file_name())));
        assert!(linked_chart(&outcome).contains("Score: -3"));
    }

    #[tokio::test]
    async fn test_batch_charts_belong_to_their_topic() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("reports");
        let pipeline = Pipeline::new(
            Researcher::new(search(), 5),
            Analyst::new(Arc::new(ScriptedInference {
                scores: Mutex::new(VecDeque::from([7, -5])),
            })),
            Some(Visualizer::new(&out)),
            ReportFormat::Markdown,
            Delivery::File(FilePersister::new(&out)),
        );

        let summary = pipeline
            .run_batch(&topics(&["Alpha", "Beta"]), &ProgressBar::hidden())
            .await;

        assert_eq!(summary.succeeded.len(), 2);
        for (outcome, score) in summary.succeeded.iter().zip([7, -5]) {
            let chart = linked_chart(outcome);
            assert!(chart.contains(&format!("Sentiment: {}", outcome.topic)));
            assert!(chart.contains(&format!("Score: {}", score)));
        }
    }

    #[tokio::test]
    async fn test_schema_violation_skips_topic() {
        let dir = TempDir::new().unwrap();
        let pipeline = file_pipeline(search(), json!(15), None, &dir);

        let summary = pipeline
            .run_batch(&topics(&["Solar power"]), &ProgressBar::hidden())
            .await;

        assert!(summary.succeeded.is_empty());
        assert!(matches!(summary.failed[0].1, PipelineError::SchemaViolation(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_email_delivery_and_degraded_config() {
        let mail = Arc::new(RecordingMail::default());
        let credentials = MailCredentials {
            api_key: Some("re_test".to_string()),
            sender: Some("bot@example.com".to_string()),
            recipient: None,
        };
        let pipeline = Pipeline::new(
            Researcher::new(search(), 5),
            Analyst::new(Arc::new(FixedInference { score: json!(1) })),
            None,
            ReportFormat::Html,
            Delivery::Email(EmailNotifier::new(
                Some(mail.clone()),
                credentials,
                "Daily AI BI Report",
            )),
        );

        let summary = pipeline
            .run_batch(&topics(&["Solar power"]), &ProgressBar::hidden())
            .await;

        assert_eq!(summary.succeeded.len(), 1);
        assert!(matches!(
            summary.succeeded[0].delivery,
            DeliveryOutcome::Skipped { .. }
        ));
        assert!(mail.sent.lock().unwrap().is_empty());
        assert_eq!(summary.delivery_failures().count(), 0);
    }

    #[tokio::test]
    async fn test_send_failure_is_reported_separately() {
        let mail = Arc::new(RecordingMail {
            fail: true,
            ..Default::default()
        });
        let pipeline = Pipeline::new(
            Researcher::new(search(), 5),
            Analyst::new(Arc::new(FixedInference { score: json!(1) })),
            None,
            ReportFormat::Html,
            Delivery::Email(EmailNotifier::new(
                Some(mail.clone()),
                full_credentials(),
                "Daily AI BI Report",
            )),
        );

        let summary = pipeline
            .run_batch(&topics(&["Solar power", "EVs"]), &ProgressBar::hidden())
            .await;

        assert!(summary.failed.is_empty());
        assert_eq!(summary.succeeded.len(), 2);
        assert_eq!(summary.delivery_failures().count(), 2);
        assert_eq!(mail.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_describe() {
        let dir = TempDir::new().unwrap();
        let pipeline = file_pipeline(search(), json!(0), Some(Visualizer::new(dir.path())), &dir);
        assert_eq!(
            pipeline.describe(),
            "research → analyze → chart → write → file (Markdown)"
        );
    }

    #[test]
    fn test_run_topic_blocking() {
        let dir = TempDir::new().unwrap();
        let pipeline = file_pipeline(search(), Value::Null, None, &dir);

        let outcome =
            tokio_test::block_on(pipeline.run_topic(Topic::new("Rust adoption").unwrap()))
                .unwrap();

        let report = written(&outcome);
        assert!(report.contains("# Business Intelligence Report: Rust adoption"));
        assert!(!report.contains("Sentiment Score"));
    }
}
