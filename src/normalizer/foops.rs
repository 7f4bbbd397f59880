use serde_json::Value;

use super::checks::parse_checks;
use super::{NormalizeError, Normalized};
use crate::models::Backend;

/// Normalize a FOOPS! `assessOntology` response.
///
/// FOOPS! reports partial results per check through `total_passed_tests` /
/// `total_tests_run`, which become fractional scores.
pub fn normalize(payload: &Value) -> Result<Normalized, NormalizeError> {
    let obj = payload.as_object().ok_or(NormalizeError::NotAnObject {
        backend: Backend::Foops,
    })?;
    let entries = obj
        .get("checks")
        .and_then(Value::as_array)
        .ok_or(NormalizeError::MissingField {
            backend: Backend::Foops,
            field: "checks",
        })?;

    let mut out = Normalized::default();
    parse_checks(Backend::Foops, entries, &mut out);
    Ok(out)
}
