use crate::errors::{AppError, AppResult};
use crate::models::{
    ActionPlan, ActionPlanStatus, AnalysisResult, Executive, ImprovementPlan, PerformanceAnalysis,
    Priority,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"));

/// Everything from the first `{` to the last `}` of a free-text reply, parsed.
pub fn extract_json_block(text: &str) -> AppResult<Value> {
    let block = JSON_BLOCK
        .find(text)
        .ok_or_else(|| AppError::Analysis("reply contained no JSON object".to_string()))?;
    serde_json::from_str(block.as_str())
        .map_err(|error| AppError::Analysis(format!("reply JSON did not parse: {}", error)))
}

fn nullable(kind: &str) -> Value {
    json!({ "type": [kind, "null"] })
}

fn string_list() -> Value {
    json!({ "type": ["array", "null"], "items": { "type": "string" } })
}

fn plan_schema(date_field: &str) -> Value {
    json!({
        "type": ["array", "null"],
        "items": {
            "type": "object",
            "properties": {
                "title": nullable("string"),
                "description": nullable("string"),
                "priority": nullable("string"),
                date_field: nullable("string"),
            }
        }
    })
}

fn executive_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": nullable("string"),
            "insights": string_list(),
            "recommendations": string_list(),
            "actionPlans": plan_schema("dueDate"),
        }
    })
}

fn performance_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": nullable("string"),
            "strengths": string_list(),
            "weaknesses": string_list(),
            "recommendations": string_list(),
            "actionPlans": plan_schema("deadline"),
        }
    })
}

/// Field types only; absent fields are filled in during mapping.
fn validate(value: &Value, schema: &Value) -> AppResult<()> {
    let compiled = jsonschema::JSONSchema::compile(schema)
        .map_err(|error| AppError::Internal(format!("invalid reply schema: {}", error)))?;
    let errors: Vec<String> = compiled
        .validate(value)
        .err()
        .map(|errors| {
            errors
                .map(|error| {
                    let path = error.instance_path.to_string();
                    if path.is_empty() {
                        error.to_string()
                    } else {
                        format!("{}: {}", path, error)
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Analysis(format!(
            "reply did not match schema: {}",
            errors.join("; ")
        )))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlan {
    title: Option<String>,
    description: Option<String>,
    priority: Option<String>,
    due_date: Option<String>,
    deadline: Option<String>,
}

impl RawPlan {
    fn priority(&self) -> Priority {
        match self.priority.as_deref().map(str::trim) {
            Some("high") => Priority::High,
            Some("low") => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExecutiveAnalysis {
    summary: Option<String>,
    insights: Option<Vec<String>>,
    recommendations: Option<Vec<String>>,
    action_plans: Option<Vec<RawPlan>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPerformanceAnalysis {
    summary: Option<String>,
    strengths: Option<Vec<String>>,
    weaknesses: Option<Vec<String>>,
    recommendations: Option<Vec<String>>,
    action_plans: Option<Vec<RawPlan>>,
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    parse_date(raw).and_then(|date| date.and_hms_opt(0, 0, 0)).map(|naive| naive.and_utc())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|instant| instant.date_naive()))
}

fn decode<T: for<'de> Deserialize<'de>>(text: &str, schema: &Value) -> AppResult<T> {
    let value = extract_json_block(text)?;
    validate(&value, schema)?;
    serde_json::from_value(value).map_err(|error| AppError::Analysis(error.to_string()))
}

pub(super) fn executive_result(text: &str, executive: &Executive) -> AppResult<AnalysisResult> {
    let raw: RawExecutiveAnalysis = decode(text, &executive_schema())?;
    let now = Utc::now();
    let kpi_id = executive.kpis.first().map(|kpi| kpi.id.clone()).unwrap_or_default();

    let action_plans = raw
        .action_plans
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, plan)| ActionPlan {
            id: format!("plan-{}-{}", now.timestamp_millis(), index),
            kpi_id: kpi_id.clone(),
            priority: plan.priority(),
            due_date: plan.due_date.as_deref().and_then(parse_instant).unwrap_or(now),
            title: plan.title.unwrap_or_default(),
            description: plan.description.unwrap_or_default(),
            status: ActionPlanStatus::Pending,
        })
        .collect();

    Ok(AnalysisResult {
        summary: raw.summary.unwrap_or_default(),
        insights: raw.insights.unwrap_or_default(),
        recommendations: raw.recommendations.unwrap_or_default(),
        action_plans,
    })
}

pub(super) fn performance_result(text: &str) -> AppResult<PerformanceAnalysis> {
    let raw: RawPerformanceAnalysis = decode(text, &performance_schema())?;
    let default_deadline = (Utc::now() + Duration::days(30)).date_naive();

    let action_plans = raw
        .action_plans
        .unwrap_or_default()
        .into_iter()
        .map(|plan| ImprovementPlan {
            priority: plan.priority(),
            deadline: plan.deadline.as_deref().and_then(parse_date).unwrap_or(default_deadline),
            title: plan.title.unwrap_or_default(),
            description: plan.description.unwrap_or_default(),
        })
        .collect();

    Ok(PerformanceAnalysis {
        summary: raw.summary.unwrap_or_default(),
        strengths: raw.strengths.unwrap_or_default(),
        weaknesses: raw.weaknesses.unwrap_or_default(),
        recommendations: raw.recommendations.unwrap_or_default(),
        action_plans,
    })
}

#[cfg(test)]
mod tests {
    use super::{extract_json_block, parse_date, parse_instant, performance_result};
    use crate::errors::AppError;

    #[test]
    fn extracts_from_first_brace_to_last() {
        let value = extract_json_block("prefix {\"a\": {\"b\": 1}} suffix").expect("json");
        assert_eq!(value, serde_json::json!({"a": {"b": 1}}));
        assert!(matches!(extract_json_block("nothing"), Err(AppError::Analysis(_))));
    }

    #[test]
    fn schema_rejects_wrong_field_types() {
        let err = performance_result(r#"{"strengths": "not a list"}"#).expect_err("type mismatch");
        assert!(err.to_string().contains("/strengths"));
    }

    #[test]
    fn nulls_are_treated_as_missing() {
        let analysis = performance_result(r#"{"summary": null, "actionPlans": [{"title": "x", "deadline": "2026-05-01"}]}"#)
            .expect("valid");
        assert_eq!(analysis.summary, "");
        assert_eq!(analysis.action_plans[0].deadline.to_string(), "2026-05-01");
    }

    #[test]
    fn dates_accept_plain_and_rfc3339_forms() {
        assert_eq!(parse_date("2026-02-15").map(|d| d.to_string()).as_deref(), Some("2026-02-15"));
        assert_eq!(
            parse_date("2026-02-15T10:00:00Z").map(|d| d.to_string()).as_deref(),
            Some("2026-02-15")
        );
        assert!(parse_instant("2026-02-15").is_some());
        assert!(parse_instant("next week").is_none());
    }
}
