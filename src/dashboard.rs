use crate::aggregation::{
    self, department_heatmap, department_view, executive_summary, CompanyOverview, DepartmentHeatmap,
    DepartmentView, ExecutiveSummary, TaskStats,
};
use crate::analysis::Analyzer;
use crate::catalog::{department_by_slug, departments, Catalog};
use crate::config::{AppConfig, StorageConfig};
use crate::db::{KeyValueStore, MemoryStore, SqliteStore};
use crate::errors::{AppError, AppResult};
use crate::models::{AnalysisResult, Executive, Feedback, FeedbackInput, Kpi, Month, PerformanceAnalysis};
use crate::persistence::{resolve_target, Persistence};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutiveDashboard {
    pub month: Month,
    pub executive: Executive,
    pub summary: ExecutiveSummary,
}

/// Read models for every dashboard page, assembled from the catalog and the
/// month's stored feedback, targets and custom KPIs.
pub struct Dashboard {
    catalog: Catalog,
    persistence: Persistence,
    analyzer: Analyzer,
}

impl Dashboard {
    pub fn new(catalog: Catalog, store: Arc<dyn KeyValueStore>, analyzer: Analyzer) -> Self {
        Self {
            catalog,
            persistence: Persistence::new(store),
            analyzer,
        }
    }

    /// Sample catalog over the configured store and analyzer.
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.storage {
            StorageConfig::Memory => Arc::new(MemoryStore::new()),
            StorageConfig::Sqlite { path } => Arc::new(SqliteStore::new(path)?),
        };
        let analyzer = Analyzer::from_config(&config.analysis);
        tracing::info!(generative = analyzer.is_generative(), "dashboard opened");
        Ok(Self::new(Catalog::sample(), store, analyzer))
    }

    pub fn from_config_file(path: &Path) -> AppResult<Self> {
        let config = AppConfig::load(path).map_err(|error| AppError::Config(format!("{:#}", error)))?;
        Self::open(&config)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    /// Base plus custom KPIs with the month's target overrides and feedback applied.
    fn resolve_kpis(&self, executive: &Executive, month: Month) -> Vec<Kpi> {
        let targets = self.persistence.monthly_targets(month);
        executive
            .kpis
            .iter()
            .cloned()
            .chain(self.persistence.custom_kpis_for(&executive.id))
            .map(|mut kpi| {
                kpi.target = resolve_target(&targets, &executive.id, &kpi);
                self.persistence.update_kpi_with_feedback(&kpi, month)
            })
            .collect()
    }

    fn resolved_executive(&self, executive_id: &str, month: Month) -> Option<Executive> {
        let executive = self.catalog.executive_by_id(executive_id)?;
        Some(Executive {
            kpis: self.resolve_kpis(executive, month),
            ..executive.clone()
        })
    }

    pub fn executive_kpis(&self, executive_id: &str, month: Month) -> Option<Vec<Kpi>> {
        self.resolved_executive(executive_id, month)
            .map(|executive| executive.kpis)
    }

    pub fn executive_dashboard(&self, executive_id: &str, month: Month) -> Option<ExecutiveDashboard> {
        let executive = self.resolved_executive(executive_id, month)?;
        Some(ExecutiveDashboard {
            month,
            summary: executive_summary(&executive),
            executive,
        })
    }

    pub fn department_dashboard(&self, slug: &str, month: Month) -> Option<DepartmentView> {
        let department = department_by_slug(slug)?;
        let kpis = self
            .catalog
            .executives_in_department(department.name)
            .into_iter()
            .flat_map(|executive| self.resolve_kpis(executive, month))
            .collect();
        Some(department_view(department, kpis))
    }

    pub fn department_heatmaps(&self) -> Vec<DepartmentHeatmap> {
        departments()
            .iter()
            .map(|department| department_heatmap(self.catalog.executives(), department.name))
            .collect()
    }

    pub fn company_overview(&self) -> CompanyOverview {
        aggregation::company_overview(&self.catalog)
    }

    pub fn task_stats(&self) -> TaskStats {
        aggregation::task_stats(self.catalog.tasks())
    }

    fn is_known_kpi(&self, kpi_id: &str) -> bool {
        self.catalog
            .executives()
            .iter()
            .any(|executive| executive.kpis.iter().any(|kpi| kpi.id == kpi_id))
            || self
                .persistence
                .custom_kpis()
                .values()
                .any(|kpis| kpis.iter().any(|kpi| kpi.id == kpi_id))
    }

    /// Stores feedback for a catalog or custom KPI. Unknown KPIs and invalid
    /// forms are errors; storage failures yield `Ok(None)`.
    pub fn save_feedback(&self, kpi_id: &str, month: Month, input: FeedbackInput) -> AppResult<Option<Feedback>> {
        if !self.is_known_kpi(kpi_id) {
            return Err(AppError::NotFound(format!("KPI {} does not exist", kpi_id)));
        }
        self.persistence.save_feedback(kpi_id, month, input)
    }

    pub async fn analyze_executive(&self, executive_id: &str, month: Month) -> Option<AnalysisResult> {
        let executive = self.resolved_executive(executive_id, month)?;
        Some(self.analyzer.analyze_executive(&executive).await)
    }

    pub async fn analyze_performance_files(&self, month: Month) -> PerformanceAnalysis {
        let files = self.persistence.performance_files(month);
        self.analyzer.analyze_performance_files(&files, month).await
    }
}

#[cfg(test)]
mod tests {
    use super::Dashboard;
    use crate::analysis::Analyzer;
    use crate::catalog::Catalog;
    use crate::config::{AppConfig, StorageConfig};
    use crate::db::{MemoryStore, UnavailableStore};
    use crate::errors::AppError;
    use crate::models::{FeedbackInput, KpiPeriod, Month, NewKpi};
    use std::sync::Arc;

    fn month() -> Month {
        "2026-01".parse().expect("valid month")
    }

    fn dashboard() -> Dashboard {
        Dashboard::new(Catalog::sample(), Arc::new(MemoryStore::new()), Analyzer::RuleBased)
    }

    fn note(text: &str) -> FeedbackInput {
        FeedbackInput {
            root_cause: Some(text.to_string()),
            ..FeedbackInput::default()
        }
    }

    #[test]
    fn executive_kpis_merge_custom_targets_and_feedback() {
        let dashboard = dashboard();
        let persistence = dashboard.persistence();
        let custom = persistence
            .add_custom_kpi(
                "cha-gwi-hun",
                NewKpi {
                    name: "재구매율".to_string(),
                    category: "영업".to_string(),
                    unit: "%".to_string(),
                    period: KpiPeriod::Monthly,
                    target: 40.0,
                },
            )
            .expect("custom");
        persistence
            .set_monthly_target("cha-gwi-hun", "kpi-1", month(), 90.0)
            .expect("override");
        dashboard
            .save_feedback("kpi-2", month(), note("fewer leads"))
            .expect("valid")
            .expect("stored");

        let kpis = dashboard.executive_kpis("cha-gwi-hun", month()).expect("known");
        assert_eq!(kpis.len(), 6);
        assert_eq!(kpis[0].target, 90.0);
        assert_eq!(kpis[1].feedback.as_ref().and_then(|f| f.root_cause.as_deref()), Some("fewer leads"));
        assert_eq!(kpis[5].id, custom.id);
        assert!(kpis.iter().all(|kpi| kpi.month == Some(month())));

        assert!(dashboard.executive_kpis("nobody", month()).is_none());
    }

    #[test]
    fn unknown_kpi_feedback_is_not_found() {
        let err = dashboard()
            .save_feedback("kpi-404", month(), note("x"))
            .expect_err("unknown");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn department_pages_resolve_by_slug() {
        let dashboard = dashboard();
        let sales = dashboard.department_dashboard("sales", month()).expect("known");
        assert_eq!(sales.kpis.len(), 10);
        assert_eq!(sales.on_track_count, 5);

        let quality = dashboard.department_dashboard("quality", month()).expect("known");
        assert!(quality.kpis.is_empty());
        assert_eq!(quality.average_achievement, 0.0);

        assert!(dashboard.department_dashboard("finance", month()).is_none());
        assert_eq!(dashboard.department_heatmaps().len(), 3);
    }

    #[test]
    fn pages_render_without_storage() {
        let dashboard = Dashboard::new(Catalog::sample(), Arc::new(UnavailableStore), Analyzer::RuleBased);
        let view = dashboard.executive_dashboard("oh-hyo-sung", month()).expect("known");
        assert_eq!(view.executive.kpis.len(), 5);
        assert!(view.executive.kpis.iter().all(|kpi| kpi.feedback.is_none()));
        assert_eq!(view.summary.status_counts.at_risk, 3);
        assert_eq!(dashboard.save_feedback("kpi-6", month(), note("x")).expect("swallowed"), None);
    }

    #[test]
    fn open_uses_configured_sqlite_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig {
            storage: StorageConfig::Sqlite {
                path: dir.path().join("kpi.db"),
            },
            ..AppConfig::default()
        };
        let dashboard = Dashboard::open(&config).expect("open");
        dashboard
            .save_feedback("kpi-1", month(), note("persisted"))
            .expect("valid")
            .expect("stored");
        drop(dashboard);

        let reopened = Dashboard::open(&config).expect("reopen");
        assert!(reopened.persistence().get_feedback("kpi-1", month()).is_some());
        assert_eq!(reopened.task_stats().total, 9);
        assert_eq!(reopened.company_overview().executive_count, 2);
    }

    #[test]
    fn unreadable_config_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dashboard.yaml");
        std::fs::write(&path, "storage: [not, a, mapping]\n").expect("write");
        let err = Dashboard::from_config_file(&path).err().expect("invalid config");
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn analysis_uses_resolved_kpis() {
        let dashboard = dashboard();
        dashboard
            .persistence()
            .set_monthly_target("cha-gwi-hun", "kpi-1", month(), 87.0)
            .expect("override");
        let result = dashboard
            .analyze_executive("cha-gwi-hun", month())
            .await
            .expect("known");
        assert!(result.summary.contains("91.3%"));
        assert!(dashboard.analyze_executive("nobody", month()).await.is_none());

        let files = dashboard.analyze_performance_files(month()).await;
        assert!(files.summary.contains("총 0개의 파일"));
    }
}
