use serde_json::Value;

use super::checks::parse_checks;
use super::{NormalizeError, Normalized};
use crate::models::Backend;

/// Normalize the local structure checker's output.
pub fn normalize(payload: &Value) -> Result<Normalized, NormalizeError> {
    let entries = payload
        .get("checks")
        .and_then(Value::as_array)
        .ok_or(NormalizeError::MissingField {
            backend: Backend::Structure,
            field: "checks",
        })?;

    let mut out = Normalized::default();
    parse_checks(Backend::Structure, entries, &mut out);
    Ok(out)
}
