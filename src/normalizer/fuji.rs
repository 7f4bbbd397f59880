use serde_json::Value;

use super::checks::string_values;
use super::{NormalizeError, Normalized};
use crate::models::{Backend, Category, CheckResult, CheckStatus};

/// Prefix of F-UJI's own metric identifiers (`FsF-F1-01D`).
const METRIC_PREFIX: &str = "FsF-";

/// Normalize an F-UJI `evaluate` response.
pub fn normalize(payload: &Value) -> Result<Normalized, NormalizeError> {
    let obj = payload.as_object().ok_or(NormalizeError::NotAnObject {
        backend: Backend::Fuji,
    })?;
    let results = obj
        .get("results")
        .and_then(Value::as_array)
        .ok_or(NormalizeError::MissingField {
            backend: Backend::Fuji,
            field: "results",
        })?;

    let mut out = Normalized::default();
    for (idx, metric) in results.iter().enumerate() {
        match parse_metric(metric) {
            Some(check) => out.checks.push(check),
            None => out.warn(Backend::Fuji, format!("skipped malformed metric #{idx}")),
        }
    }
    Ok(out)
}

fn parse_metric(metric: &Value) -> Option<CheckResult> {
    let identifier = metric.get("metric_identifier").and_then(Value::as_str)?;
    let (principle, category) = principle_of(identifier, metric)?;

    let title = metric
        .get("metric_name")
        .and_then(Value::as_str)
        .unwrap_or(identifier);

    let earned = metric.pointer("/score/earned").and_then(Value::as_f64);
    let total = metric
        .pointer("/score/total")
        .and_then(Value::as_f64)
        .filter(|t| *t > 0.0);

    let status = match metric.get("test_status").and_then(Value::as_str) {
        Some(s) => CheckStatus::parse(s),
        None => match (earned, total) {
            (Some(e), Some(t)) if e >= t => CheckStatus::Pass,
            (Some(_), Some(_)) => CheckStatus::Fail,
            _ => CheckStatus::Indeterminate,
        },
    };

    let check = match (earned, total) {
        (Some(earned), Some(total)) => {
            CheckResult::new(Backend::Fuji, principle, category, title, status, earned, total)
        }
        _ => CheckResult::binary(Backend::Fuji, principle, category, title, status),
    };

    let mut sources = vec![identifier.to_string()];
    sources.extend(string_values(metric.get("test_debug")));
    Some(check.with_sources(sources))
}

/// `FsF-R1.1-01M` → (`R1.1`, Reusable). Identifiers outside F-UJI's own
/// scheme are kept whole; without an explicit category they stay uncategorised.
fn principle_of(identifier: &str, metric: &Value) -> Option<(String, Option<Category>)> {
    let explicit = metric
        .get("category_id")
        .or_else(|| metric.get("category"))
        .and_then(Value::as_str)
        .and_then(Category::from_name);

    match identifier.strip_prefix(METRIC_PREFIX) {
        Some(rest) => {
            let principle = rest.split('-').next().filter(|p| !p.is_empty())?;
            let category = explicit.or_else(|| Category::from_principle(principle));
            Some((principle.to_string(), category))
        }
        None if identifier.trim().is_empty() => None,
        None => Some((identifier.to_string(), explicit)),
    }
}
