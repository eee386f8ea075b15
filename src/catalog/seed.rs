use crate::models::{
    Executive, Kpi, KpiPeriod, KpiStatus, Priority, RevenueTarget, Task, TaskStatus, Trend,
};
use chrono::NaiveDate;

#[allow(clippy::too_many_arguments)]
fn kpi(
    id: &str,
    name: &str,
    target: f64,
    current: f64,
    unit: &str,
    trend: Trend,
    status: KpiStatus,
    category: &str,
    period: KpiPeriod,
) -> Kpi {
    Kpi {
        id: id.to_string(),
        name: name.to_string(),
        target,
        current,
        unit: unit.to_string(),
        trend,
        status,
        category: category.to_string(),
        period,
        month: None,
        feedback: None,
    }
}

pub(super) fn executives() -> Vec<Executive> {
    use KpiPeriod::{Monthly, Quarterly};
    use KpiStatus::{AtRisk, Behind, OnTrack};
    use Trend::{Down, Stable, Up};

    vec![
        Executive {
            id: "cha-gwi-hun".to_string(),
            name: "차귀훈".to_string(),
            position: "본부장".to_string(),
            department: Some("영업본부".to_string()),
            kpis: vec![
                kpi("kpi-1", "매출 목표 달성률", 100.0, 87.0, "%", Up, OnTrack, "매출", Monthly),
                kpi("kpi-2", "신규 고객 확보", 50.0, 42.0, "건", Up, OnTrack, "영업", Monthly),
                kpi("kpi-3", "고객 만족도", 90.0, 85.0, "점", Stable, AtRisk, "서비스", Monthly),
                kpi("kpi-4", "프로젝트 완료율", 95.0, 78.0, "%", Down, Behind, "운영", Monthly),
                kpi("kpi-5", "팀 생산성", 120.0, 115.0, "%", Up, OnTrack, "인사", Monthly),
            ],
        },
        Executive {
            id: "oh-hyo-sung".to_string(),
            name: "오효성".to_string(),
            position: "이사".to_string(),
            department: Some("영업본부".to_string()),
            kpis: vec![
                kpi("kpi-6", "매출 목표 달성률", 100.0, 92.0, "%", Up, OnTrack, "매출", Monthly),
                kpi("kpi-7", "신규 파트너십", 20.0, 18.0, "건", Up, OnTrack, "영업", Monthly),
                kpi("kpi-8", "시장 점유율", 25.0, 22.0, "%", Up, AtRisk, "마케팅", Quarterly),
                kpi("kpi-9", "브랜드 인지도", 80.0, 75.0, "점", Stable, AtRisk, "마케팅", Quarterly),
                kpi("kpi-10", "고객 유지율", 95.0, 91.0, "%", Down, AtRisk, "고객관리", Monthly),
            ],
        },
    ]
}

#[allow(clippy::too_many_arguments)]
fn task(
    id: &str,
    title: &str,
    department: &str,
    owner: &str,
    end: (i32, u32, u32),
    progress: u8,
    status: TaskStatus,
    priority: Priority,
    description: &str,
) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        department: department.to_string(),
        owner: owner.to_string(),
        start_date: date(2026, 1, 15),
        end_date: date(end.0, end.1, end.2),
        progress,
        status,
        priority,
        description: Some(description.to_string()),
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

pub(super) fn immediate_tasks() -> Vec<Task> {
    use Priority::{High, Medium};
    use TaskStatus::{InProgress, Pending};

    vec![
        task("task-1", "CRM 시스템 구축", "영업본부", "오효성", (2026, 3, 31), 0, Pending, High, "혁신위우시 활용"),
        task("task-2", "생산·전력 10명 배용", "생산본부", "최홍영", (2026, 2, 28), 0, Pending, High, "2.0개 간수제 도입"),
        task("task-3", "ISO 22716 인증 준비", "품질본부", "최준영", (2026, 6, 30), 0, Pending, Medium, "1.0MP 인증"),
        task("task-4", "신규 고객 5개사 확보", "영업본부", "차귀훈", (2026, 3, 31), 0, Pending, High, "Q1 목표"),
        task("task-5", "설비 가동률 40% 달성", "생산본부", "최홍영", (2026, 2, 28), 30, InProgress, High, "현재 30%"),
        task("task-6", "정부 지원금 1억 원 확보", "경영관리", "신영민", (2026, 6, 30), 10, InProgress, Medium, "제조혁신비우처"),
        task("task-7", "신제품 6종 개발", "연구소", "이창훈", (2026, 6, 30), 0, Pending, High, "57번기 목표"),
        task("task-8", "주요 거래처 매출 20% 확대", "영업본부", "차귀훈", (2026, 3, 31), 0, Pending, Medium, "110PS 고부"),
        task("task-9", "생산 리드타임 30% 단축", "생산본부", "최홍영", (2026, 4, 30), 0, Pending, High, "24일~21일"),
    ]
}

/// Company-wide 2026 revenue goal, in KRW.
pub(super) fn company_revenue() -> RevenueTarget {
    RevenueTarget {
        target: 200_000_000_000.0,
        current: 174_000_000_000.0,
        unit: "원".to_string(),
    }
}
