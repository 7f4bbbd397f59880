//! Parser for the `checks` array shared by FOOPS! and the structure checker.
//!
//! ```text
//! { "principle_id": "F1", "category_id": "Findable", "title": "...",
//!   "status": "ok" | "error" | "pass" | ..., "explanation": "..." | [..],
//!   "total_passed_tests": 1, "total_tests_run": 2 }
//! ```

use serde_json::Value;

use super::Normalized;
use crate::models::{Backend, Category, CheckResult, CheckStatus};

/// Parse every entry of `entries`, skipping (with a warning) those without
/// a principle id. Entries whose category cannot be resolved are kept as
/// indeterminate.
pub(super) fn parse_checks(backend: Backend, entries: &[Value], out: &mut Normalized) {
    for (idx, entry) in entries.iter().enumerate() {
        match parse_check(backend, entry) {
            Some(check) => out.checks.push(check),
            None => out.warn(backend, format!("skipped malformed check #{idx}")),
        }
    }
}

fn parse_check(backend: Backend, entry: &Value) -> Option<CheckResult> {
    let principle = entry
        .get("principle_id")
        .or_else(|| entry.get("id"))
        .and_then(Value::as_str)?
        .trim();
    if principle.is_empty() {
        return None;
    }

    let category = entry
        .get("category_id")
        .and_then(Value::as_str)
        .and_then(Category::from_name)
        .or_else(|| Category::from_principle(principle));

    let title = entry
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(principle);

    let status = entry
        .get("status")
        .and_then(Value::as_str)
        .map(CheckStatus::parse)
        .unwrap_or(CheckStatus::Indeterminate);

    let passed = entry.get("total_passed_tests").and_then(Value::as_f64);
    let run = entry.get("total_tests_run").and_then(Value::as_f64);

    let check = match (passed, run) {
        (Some(passed), Some(run)) if run > 0.0 => {
            CheckResult::new(backend, principle, category, title, status, passed, run)
        }
        _ => CheckResult::binary(backend, principle, category, title, status),
    };

    Some(check.with_sources(string_values(entry.get("explanation"))))
}

/// Collect strings from a string or an array of strings.
pub(super) fn string_values(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_falls_back_to_principle() {
        let mut out = Normalized::default();
        parse_checks(
            Backend::Foops,
            &[json!({"principle_id": "R1.1", "status": "ok"})],
            &mut out,
        );
        assert_eq!(out.checks[0].category, Some(Category::Reusable));
        assert_eq!(out.checks[0].title, "R1.1");
    }

    #[test]
    fn test_unknown_principle_kept_verbatim() {
        let mut out = Normalized::default();
        parse_checks(
            Backend::Foops,
            &[json!({"principle_id": "OM4.1", "category_id": "Reusable", "status": "error"})],
            &mut out,
        );
        assert_eq!(out.checks[0].principle_id, "OM4.1");
        assert_eq!(out.checks[0].status, CheckStatus::Fail);
    }

    #[test]
    fn test_uncategorisable_entry_kept_indeterminate() {
        let mut out = Normalized::default();
        parse_checks(
            Backend::Foops,
            &[json!({"principle_id": "X9", "status": "ok"}), json!({"status": "ok"})],
            &mut out,
        );
        assert_eq!(out.checks.len(), 1);
        assert_eq!(out.checks[0].principle_id, "X9");
        assert_eq!(out.checks[0].category, None);
        assert_eq!(out.checks[0].status, CheckStatus::Indeterminate);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_missing_status_is_indeterminate() {
        let mut out = Normalized::default();
        parse_checks(Backend::Structure, &[json!({"principle_id": "F1"})], &mut out);
        assert_eq!(out.checks[0].status, CheckStatus::Indeterminate);
    }
}
