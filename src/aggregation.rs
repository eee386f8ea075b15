use crate::catalog::Catalog;
use crate::models::{Department, Executive, Kpi, KpiStatus, RevenueTarget, Task, TaskStatus};
use serde::Serialize;

/// Positions scored on a department heat-map row.
const HEATMAP_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceBand {
    OnTarget,
    Watch,
    Critical,
}

impl PerformanceBand {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Self::OnTarget
        } else if percentage >= 70.0 {
            Self::Watch
        } else {
            Self::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::A
        } else if score >= 70.0 {
            Self::B
        } else {
            Self::C
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub on_track: usize,
    pub at_risk: usize,
    pub behind: usize,
}

impl StatusCounts {
    pub fn not_on_track(&self) -> usize {
        self.at_risk + self.behind
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutiveSummary {
    pub executive_id: String,
    pub name: String,
    pub position: String,
    pub department: Option<String>,
    pub kpi_count: usize,
    pub average_achievement: f64,
    pub status_counts: StatusCounts,
    pub band: PerformanceBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentHeatmap {
    pub department: String,
    pub scores: [f64; HEATMAP_COLUMNS],
    pub overall: f64,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyOverview {
    pub executive_count: usize,
    pub kpi_count: usize,
    pub average_achievement: f64,
    pub band: PerformanceBand,
    pub revenue: RevenueTarget,
    pub revenue_progress: f64,
    pub revenue_band: PerformanceBand,
    pub executives: Vec<ExecutiveSummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub delayed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentView {
    pub department: Department,
    pub kpis: Vec<Kpi>,
    pub average_achievement: f64,
    pub on_track_count: usize,
}

fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Mean achievement percentage. An empty set averages to 0%.
pub fn average_achievement(kpis: &[Kpi]) -> f64 {
    mean(kpis.iter().map(Kpi::achievement_percentage))
}

/// Counts of the status each KPI was authored with.
pub fn status_counts(kpis: &[Kpi]) -> StatusCounts {
    kpis.iter().fold(StatusCounts::default(), |mut counts, kpi| {
        match kpi.status {
            KpiStatus::OnTrack => counts.on_track += 1,
            KpiStatus::AtRisk => counts.at_risk += 1,
            KpiStatus::Behind => counts.behind += 1,
        }
        counts
    })
}

pub fn executive_summary(executive: &Executive) -> ExecutiveSummary {
    let average = average_achievement(&executive.kpis);
    ExecutiveSummary {
        executive_id: executive.id.clone(),
        name: executive.name.clone(),
        position: executive.position.clone(),
        department: executive.department.clone(),
        kpi_count: executive.kpis.len(),
        average_achievement: average,
        status_counts: status_counts(&executive.kpis),
        band: PerformanceBand::from_percentage(average),
    }
}

/// Heat-map row for every executive whose department contains
/// `department_name`. Column `i` is the mean achievement of the i-th KPI over
/// the executives that have one; a column nobody fills scores 0.
pub fn department_heatmap(executives: &[Executive], department_name: &str) -> DepartmentHeatmap {
    let members: Vec<&Executive> = executives
        .iter()
        .filter(|executive| {
            executive
                .department
                .as_deref()
                .is_some_and(|department| department.contains(department_name))
        })
        .collect();

    let mut scores = [0.0; HEATMAP_COLUMNS];
    for (position, score) in scores.iter_mut().enumerate() {
        *score = mean(
            members
                .iter()
                .filter_map(|executive| executive.kpis.get(position))
                .map(Kpi::achievement_percentage),
        );
    }
    let overall = mean(scores);

    DepartmentHeatmap {
        department: department_name.to_string(),
        scores,
        overall,
        grade: Grade::from_score(overall),
    }
}

/// Mean of per-executive averages, so every executive weighs the same
/// regardless of KPI count.
pub fn company_average(executives: &[Executive]) -> f64 {
    mean(executives.iter().map(|executive| average_achievement(&executive.kpis)))
}

pub fn company_overview(catalog: &Catalog) -> CompanyOverview {
    company_overview_for(catalog.executives(), catalog.company_revenue())
}

pub(crate) fn company_overview_for(executives: &[Executive], revenue: &RevenueTarget) -> CompanyOverview {
    let average = company_average(executives);
    let revenue_progress = revenue.progress();
    CompanyOverview {
        executive_count: executives.len(),
        kpi_count: executives.iter().map(|executive| executive.kpis.len()).sum(),
        average_achievement: average,
        band: PerformanceBand::from_percentage(average),
        revenue: revenue.clone(),
        revenue_progress,
        revenue_band: PerformanceBand::from_percentage(revenue_progress),
        executives: executives.iter().map(executive_summary).collect(),
    }
}

pub fn task_stats(tasks: &[Task]) -> TaskStats {
    tasks.iter().fold(
        TaskStats {
            total: tasks.len(),
            ..TaskStats::default()
        },
        |mut stats, task| {
            match task.status {
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Delayed => stats.delayed += 1,
            }
            stats
        },
    )
}

pub fn department_view(department: Department, kpis: Vec<Kpi>) -> DepartmentView {
    let average_achievement = average_achievement(&kpis);
    let on_track_count = kpis
        .iter()
        .filter(|kpi| kpi.status == KpiStatus::OnTrack)
        .count();
    DepartmentView {
        department,
        kpis,
        average_achievement,
        on_track_count,
    }
}
