//! Narrative analysis of an executive's KPIs and of a month's uploaded
//! performance files. The rule-based path is deterministic; the generative
//! path asks an external text generator and falls back to the rules on any
//! failure.

mod fallback;
mod generator;
mod prompt;
mod response;

pub use fallback::{executive_fallback, performance_fallback};
pub use generator::CommandGenerator;
pub use prompt::{executive_prompt, performance_prompt};
pub use response::extract_json_block;

use crate::config::AnalysisConfig;
use crate::errors::AppResult;
use crate::models::{AnalysisResult, EvidenceFile, Executive, Month, PerformanceAnalysis};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

pub type GeneratorFuture<'a> = Pin<Box<dyn Future<Output = AppResult<String>> + Send + 'a>>;

/// Turns a prompt into free text. Implementations may fail or time out; the
/// analyzer never lets such failures reach its caller.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> GeneratorFuture<'a>;
}

#[derive(Clone, Default)]
pub enum Analyzer {
    #[default]
    RuleBased,
    Generative(Arc<dyn TextGenerator>),
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RuleBased => f.write_str("Analyzer::RuleBased"),
            Self::Generative(_) => f.write_str("Analyzer::Generative(..)"),
        }
    }
}

impl Analyzer {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        match config {
            AnalysisConfig::RuleBased => Self::RuleBased,
            AnalysisConfig::Generative {
                program,
                args,
                timeout_seconds,
            } => Self::Generative(Arc::new(CommandGenerator::new(
                program.clone(),
                args.clone(),
                Duration::from_secs(*timeout_seconds),
            ))),
        }
    }

    pub fn is_generative(&self) -> bool {
        matches!(self, Self::Generative(_))
    }

    pub async fn analyze_executive(&self, executive: &Executive) -> AnalysisResult {
        let Self::Generative(generator) = self else {
            return executive_fallback(executive);
        };

        let span = tracing::info_span!("executive_analysis", request_id = %Uuid::new_v4(), executive_id = %executive.id);
        let outcome = async {
            let text = generator.generate(&executive_prompt(executive)).await?;
            response::executive_result(&text, executive)
        }
        .instrument(span)
        .await;

        outcome.unwrap_or_else(|error| {
            tracing::warn!(executive_id = %executive.id, error = %error, "generative analysis failed; using rule-based result");
            executive_fallback(executive)
        })
    }

    pub async fn analyze_performance_files(&self, files: &[EvidenceFile], month: Month) -> PerformanceAnalysis {
        let Self::Generative(generator) = self else {
            return performance_fallback(files, month);
        };

        let span = tracing::info_span!("performance_analysis", request_id = %Uuid::new_v4(), month = %month);
        let outcome = async {
            let text = generator.generate(&performance_prompt(files, month)).await?;
            response::performance_result(&text)
        }
        .instrument(span)
        .await;

        outcome.unwrap_or_else(|error| {
            tracing::warn!(month = %month, error = %error, "generative analysis failed; using rule-based result");
            performance_fallback(files, month)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Analyzer, GeneratorFuture, TextGenerator};
    use crate::catalog::Catalog;
    use crate::config::AnalysisConfig;
    use crate::errors::AppError;
    use crate::models::{ActionPlanStatus, EvidenceFile, Month, Priority};
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Canned {
        reply: Result<String, String>,
        calls: AtomicUsize,
    }

    impl Canned {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err("service unavailable".to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl TextGenerator for Canned {
        fn generate<'a>(&'a self, _prompt: &'a str) -> GeneratorFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.clone().map_err(AppError::Analysis);
            Box::pin(async move { reply })
        }
    }

    fn month() -> Month {
        "2026-01".parse().expect("valid month")
    }

    #[tokio::test]
    async fn rule_based_is_the_default_and_never_calls_out() {
        let catalog = Catalog::sample();
        let cha = catalog.executive_by_id("cha-gwi-hun").expect("seeded");

        let analyzer = Analyzer::from_config(&AnalysisConfig::default());
        assert!(!analyzer.is_generative());

        let result = analyzer.analyze_executive(cha).await;
        assert!(result.summary.contains("88.7%"));
        assert_eq!(result.recommendations.len(), 3);
        assert_eq!(result.action_plans.len(), 2);
    }

    #[tokio::test]
    async fn failing_generator_yields_fallback() {
        let catalog = Catalog::sample();
        let cha = catalog.executive_by_id("cha-gwi-hun").expect("seeded");
        let generator = Canned::failing();
        let analyzer = Analyzer::Generative(generator.clone());

        let result = analyzer.analyze_executive(cha).await;
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.action_plans.len(), 2);
        assert!(result.action_plans[0].id.starts_with("plan-default-"));
    }

    #[tokio::test]
    async fn garbage_reply_yields_fallback() {
        let catalog = Catalog::sample();
        let cha = catalog.executive_by_id("cha-gwi-hun").expect("seeded");

        for reply in ["no json here", "{ not: valid json }", r#"{"summary": 42}"#] {
            let analyzer = Analyzer::Generative(Canned::ok(reply));
            let result = analyzer.analyze_executive(cha).await;
            assert!(
                result.action_plans.iter().all(|plan| plan.id.starts_with("plan-default-")),
                "reply {:?} should fall back",
                reply
            );
            assert_eq!(result.recommendations.len(), 3);
        }
    }

    #[tokio::test]
    async fn valid_reply_is_mapped_with_defaults() {
        let catalog = Catalog::sample();
        let cha = catalog.executive_by_id("cha-gwi-hun").expect("seeded");
        let reply = r#"Here is the analysis:
```json
{
  "summary": "Sales is close to target.",
  "insights": ["Revenue up"],
  "actionPlans": [
    {"title": "Recover project completion", "priority": "high", "dueDate": "2026-02-15"},
    {"description": "weekly check-in"}
  ]
}
```"#;
        let analyzer = Analyzer::Generative(Canned::ok(reply));
        let before = Utc::now();
        let result = analyzer.analyze_executive(cha).await;

        assert_eq!(result.summary, "Sales is close to target.");
        assert_eq!(result.insights, vec!["Revenue up"]);
        assert!(result.recommendations.is_empty());
        assert_eq!(result.action_plans.len(), 2);

        let first = &result.action_plans[0];
        assert!(first.id.starts_with("plan-") && !first.id.starts_with("plan-default-"));
        assert_eq!(first.kpi_id, "kpi-1");
        assert_eq!(first.priority, Priority::High);
        assert_eq!(first.due_date.date_naive().to_string(), "2026-02-15");
        assert_eq!(first.status, ActionPlanStatus::Pending);

        let second = &result.action_plans[1];
        assert_eq!(second.title, "");
        assert_eq!(second.description, "weekly check-in");
        assert_eq!(second.priority, Priority::Medium);
        assert!(second.due_date >= before - Duration::seconds(1));
        assert!(second.due_date <= Utc::now() + Duration::seconds(1));
    }

    #[tokio::test]
    async fn performance_reply_defaults_deadline_to_thirty_days() {
        let files = vec![EvidenceFile::for_upload("2026-01", 0, "sales.xlsx", "application/vnd.ms-excel", 2048)];
        let reply = r#"{"summary":"ok","strengths":["a"],"weaknesses":[],"actionPlans":[{"title":"t","priority":"low"}]}"#;
        let analyzer = Analyzer::Generative(Canned::ok(reply));

        let analysis = analyzer.analyze_performance_files(&files, month()).await;
        assert_eq!(analysis.summary, "ok");
        assert_eq!(analysis.strengths, vec!["a"]);
        assert!(analysis.recommendations.is_empty());
        assert_eq!(analysis.action_plans.len(), 1);
        assert_eq!(analysis.action_plans[0].priority, Priority::Low);
        let expected = (Utc::now() + Duration::days(30)).date_naive();
        assert!((analysis.action_plans[0].deadline - expected).num_days().abs() <= 1);
    }

    #[tokio::test]
    async fn failing_generator_yields_file_fallback() {
        let analyzer = Analyzer::Generative(Canned::failing());
        let analysis = analyzer.analyze_performance_files(&[], month()).await;
        assert_eq!(analysis.strengths.len(), 3);
        assert_eq!(analysis.weaknesses.len(), 3);
        assert_eq!(analysis.recommendations.len(), 4);
        assert_eq!(analysis.action_plans.len(), 3);
    }
}
