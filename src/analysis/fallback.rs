use crate::aggregation::average_achievement;
use crate::models::{
    ActionPlan, ActionPlanStatus, AnalysisResult, EvidenceFile, Executive, ImprovementPlan, Kpi,
    KpiStatus, Month, PerformanceAnalysis, Priority, Trend,
};
use chrono::{Duration, Utc};

const MAX_FALLBACK_PLANS: usize = 3;
const PLAN_HORIZON_DAYS: i64 = 30;

/// Deterministic analysis of an executive's KPIs.
pub fn executive_fallback(executive: &Executive) -> AnalysisResult {
    let kpis = &executive.kpis;
    let struggling: Vec<&Kpi> = kpis.iter().filter(|kpi| kpi.status != KpiStatus::OnTrack).collect();
    let rising = kpis.iter().filter(|kpi| kpi.trend == Trend::Up).count();

    let mut insights = vec![
        format!("{}개의 KPI가 상승 추세를 보이고 있습니다.", rising),
        format!("{}개의 KPI가 주의가 필요합니다.", struggling.len()),
    ];
    let lowest = kpis.iter().min_by(|left, right| {
        left.achievement_percentage()
            .total_cmp(&right.achievement_percentage())
    });
    if let Some(lowest) = lowest {
        insights.push(format!("가장 낮은 달성률을 보이는 KPI는 {}입니다.", lowest.name));
    }

    let now = Utc::now();
    let due_date = now + Duration::days(PLAN_HORIZON_DAYS);
    let action_plans = struggling
        .iter()
        .take(MAX_FALLBACK_PLANS)
        .enumerate()
        .map(|(index, kpi)| ActionPlan {
            id: format!("plan-default-{}-{}", now.timestamp_millis(), index),
            kpi_id: kpi.id.clone(),
            title: format!("{} 개선 계획", kpi.name),
            description: format!(
                "{}의 현재 달성률이 {:.1}%로 목표 달성을 위해 추가적인 노력이 필요합니다.",
                kpi.name,
                kpi.achievement_percentage()
            ),
            priority: if kpi.status == KpiStatus::Behind {
                Priority::High
            } else {
                Priority::Medium
            },
            due_date,
            status: ActionPlanStatus::Pending,
        })
        .collect();

    AnalysisResult {
        summary: format!(
            "{} {}의 전체 KPI 달성률은 평균 {:.1}%입니다. {}개의 KPI가 목표 달성에 어려움을 겪고 있습니다.",
            executive.name,
            executive.position,
            average_achievement(kpis),
            struggling.len()
        ),
        insights,
        recommendations: vec![
            "목표 달성률이 낮은 KPI에 대한 집중적인 개선 계획 수립이 필요합니다.".to_string(),
            "상승 추세를 보이는 KPI의 성공 요인을 분석하여 다른 KPI에 적용하세요.".to_string(),
            "정기적인 모니터링과 피드백 루프를 구축하여 실시간 대응이 가능하도록 하세요.".to_string(),
        ],
        action_plans,
    }
}

/// Deterministic assessment of a month's uploaded performance files.
pub fn performance_fallback(files: &[EvidenceFile], month: Month) -> PerformanceAnalysis {
    let today = Utc::now().date_naive();
    let plan = |title: &str, description: &str, priority: Priority, days: i64| ImprovementPlan {
        title: title.to_string(),
        description: description.to_string(),
        priority,
        deadline: today + Duration::days(days),
    };

    PerformanceAnalysis {
        summary: format!(
            "{}월 성과자료로 총 {}개의 파일이 업로드되었습니다. 파일 유형과 크기를 분석하여 성과를 평가하고 개선 방안을 제시합니다.",
            month,
            files.len()
        ),
        strengths: vec![
            "성과자료가 체계적으로 정리되어 있어 분석이 용이합니다".to_string(),
            "다양한 형식의 파일(Excel, PDF 등)을 통해 다각도로 성과를 확인할 수 있습니다".to_string(),
            "정기적인 성과 관리 프로세스가 잘 구축되어 있습니다".to_string(),
        ],
        weaknesses: vec![
            "일부 지표의 목표 대비 달성률이 낮아 추가적인 개선이 필요합니다".to_string(),
            "성과 데이터의 시각화가 부족하여 직관적인 파악이 어려울 수 있습니다".to_string(),
            "과거 대비 성장 추세 분석이 필요합니다".to_string(),
        ],
        recommendations: vec![
            "목표 달성률이 낮은 지표에 대한 집중적인 개선 계획 수립".to_string(),
            "성과 데이터를 시각화하여 대시보드에 반영".to_string(),
            "월별 성과 추이 분석을 통한 트렌드 파악".to_string(),
            "부서별 협업을 통한 성과 향상 방안 모색".to_string(),
        ],
        action_plans: vec![
            plan(
                "목표 달성률 개선 프로젝트",
                "달성률이 낮은 KPI에 대한 원인 분석 및 개선 계획 수립",
                Priority::High,
                30,
            ),
            plan(
                "성과 데이터 시각화",
                "차트 및 그래프를 활용한 직관적인 성과 표시",
                Priority::Medium,
                45,
            ),
            plan(
                "월별 성과 추이 분석",
                "과거 데이터와 비교하여 성장 추세 분석",
                Priority::Medium,
                60,
            ),
        ],
    }
}
