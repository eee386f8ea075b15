use crate::models::{EvidenceFile, Executive, KpiStatus, Month, Trend};
use std::fmt::Write;

fn status_label(status: KpiStatus) -> &'static str {
    match status {
        KpiStatus::OnTrack => "정상",
        KpiStatus::AtRisk => "주의",
        KpiStatus::Behind => "위험",
    }
}

fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "상승",
        Trend::Down => "하락",
        Trend::Stable => "유지",
    }
}

pub fn executive_prompt(executive: &Executive) -> String {
    let mut prompt = format!(
        "다음은 {} {}의 KPI 데이터입니다:\n\n",
        executive.name, executive.position
    );
    for kpi in &executive.kpis {
        let _ = writeln!(
            prompt,
            "- {}: 목표 {}{}, 현재 {}{} (달성률 {:.1}%)\n  상태: {}\n  추세: {}",
            kpi.name,
            kpi.target,
            kpi.unit,
            kpi.current,
            kpi.unit,
            kpi.achievement_percentage(),
            status_label(kpi.status),
            trend_label(kpi.trend),
        );
    }
    prompt.push_str(
        r#"
위 데이터를 분석하여 다음 형식으로 JSON 응답을 제공해주세요:
{
  "summary": "전체 요약 (2-3문장)",
  "insights": ["인사이트 1", "인사이트 2", "인사이트 3"],
  "recommendations": ["권장사항 1", "권장사항 2", "권장사항 3"],
  "actionPlans": [
    {
      "title": "실행 계획 제목",
      "description": "상세 설명",
      "priority": "high|medium|low",
      "dueDate": "YYYY-MM-DD"
    }
  ]
}
"#,
    );
    prompt
}

/// One `- name (type, X.XXKB)` line per file.
pub fn file_listing(files: &[EvidenceFile]) -> String {
    files
        .iter()
        .map(|file| format!("- {} ({}, {:.2}KB)", file.name, file.mime_type, file.size as f64 / 1024.0))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn performance_prompt(files: &[EvidenceFile], month: Month) -> String {
    format!(
        r#"다음은 {month}월 코빅스 성과자료 파일 목록입니다:

{listing}

이 파일들을 기반으로 다음을 분석해주세요:

1. **전체 요약**: 업로드된 성과자료를 종합한 전체적인 성과 평가 (2-3문장)
2. **주요 강점**: 잘 수행된 영역이나 긍정적인 지표 (3-5개)
3. **개선 필요 영역**: 부족하거나 개선이 필요한 부분 (3-5개)
4. **개선 권장사항**: 구체적인 개선 방안 제시 (3-5개)
5. **향후 개선 행동 계획**: 우선순위별 실행 계획 (3-5개)

다음 JSON 형식으로 응답해주세요:
{{
  "summary": "전체 요약 내용",
  "strengths": ["강점 1", "강점 2"],
  "weaknesses": ["개선점 1", "개선점 2"],
  "recommendations": ["권장사항 1", "권장사항 2"],
  "actionPlans": [
    {{
      "title": "행동 계획 제목",
      "description": "상세 설명",
      "priority": "high|medium|low",
      "deadline": "YYYY-MM-DD"
    }}
  ]
}}
"#,
        month = month,
        listing = file_listing(files),
    )
}

#[cfg(test)]
mod tests {
    use super::{executive_prompt, file_listing, performance_prompt};
    use crate::catalog::Catalog;
    use crate::models::EvidenceFile;

    #[test]
    fn executive_prompt_lists_every_kpi() {
        let catalog = Catalog::sample();
        let cha = catalog.executive_by_id("cha-gwi-hun").expect("seeded");
        let prompt = executive_prompt(cha);
        assert!(prompt.starts_with("다음은 차귀훈 본부장의 KPI 데이터입니다:"));
        assert!(prompt.contains("- 매출 목표 달성률: 목표 100%, 현재 87% (달성률 87.0%)"));
        assert!(prompt.contains("상태: 위험"));
        assert!(prompt.contains("\"dueDate\""));
    }

    #[test]
    fn file_listing_shows_kilobytes_with_two_decimals() {
        let files = vec![
            EvidenceFile::for_upload("2026-01", 0, "sales.xlsx", "application/vnd.ms-excel", 1536),
            EvidenceFile::for_upload("2026-01", 1, "memo.txt", "text/plain", 100),
        ];
        assert_eq!(
            file_listing(&files),
            "- sales.xlsx (application/vnd.ms-excel, 1.50KB)\n- memo.txt (text/plain, 0.10KB)"
        );
        let prompt = performance_prompt(&files, "2026-01".parse().expect("valid month"));
        assert!(prompt.contains("다음은 2026-01월 코빅스 성과자료 파일 목록입니다:"));
        assert!(prompt.contains("\"deadline\""));
    }
}
