use serde_json::{Map, Value};

use super::checks::parse_checks;
use super::{NormalizeError, Normalized};
use crate::manifest::is_present;
use crate::models::{Backend, Category, CheckResult, CheckStatus};

/// A check derived from the presence of SOMEF metadata categories.
struct Derived {
    principle: &'static str,
    category: Category,
    title: &'static str,
    /// Any of these keys satisfies the check.
    keys: &'static [&'static str],
}

const DERIVED: [Derived; 9] = [
    Derived {
        principle: "F1",
        category: Category::Findable,
        title: "Software has a persistent identifier",
        keys: &["identifier"],
    },
    Derived {
        principle: "F2",
        category: Category::Findable,
        title: "Software has a description",
        keys: &["description"],
    },
    Derived {
        principle: "F3",
        category: Category::Findable,
        title: "Software metadata links to its code repository",
        keys: &["code_repository"],
    },
    Derived {
        principle: "A1",
        category: Category::Accessible,
        title: "Installation instructions are provided",
        keys: &["installation"],
    },
    Derived {
        principle: "I1",
        category: Category::Interoperable,
        title: "Software requirements are declared",
        keys: &["requirements"],
    },
    Derived {
        principle: "R1",
        category: Category::Reusable,
        title: "Software documentation is available",
        keys: &["documentation", "readme_url"],
    },
    Derived {
        principle: "R1.1",
        category: Category::Reusable,
        title: "Software declares a license",
        keys: &["license"],
    },
    Derived {
        principle: "R1.2",
        category: Category::Reusable,
        title: "Software provenance is documented (authors or releases)",
        keys: &["authors", "owner", "releases"],
    },
    Derived {
        principle: "R1.3",
        category: Category::Reusable,
        title: "Software can be cited",
        keys: &["citation"],
    },
];

/// Normalize a SOMEF extraction.
///
/// The response is a map from metadata category to extracted values. Checks
/// are derived from which categories were found; an explicit `checks` array
/// in the response is appended as-is.
pub fn normalize(payload: &Value) -> Result<Normalized, NormalizeError> {
    let obj = payload.as_object().ok_or(NormalizeError::NotAnObject {
        backend: Backend::Somef,
    })?;

    let mut out = Normalized::default();
    for derived in &DERIVED {
        let found: Vec<&str> = derived
            .keys
            .iter()
            .copied()
            .filter(|k| obj.get(*k).is_some_and(is_present))
            .collect();
        let status = if found.is_empty() {
            CheckStatus::Fail
        } else {
            CheckStatus::Pass
        };
        let check = CheckResult::binary(
            Backend::Somef,
            derived.principle,
            derived.category,
            derived.title,
            status,
        )
        .with_sources(evidence(obj, &found));
        out.checks.push(check);
    }

    if let Some(extra) = obj.get("checks").and_then(Value::as_array) {
        parse_checks(Backend::Somef, extra, &mut out);
    }
    Ok(out)
}

/// Where SOMEF found each category: its `source` fields, else the key name.
fn evidence(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let mut sources = Vec::new();
    for key in keys {
        let before = sources.len();
        if let Some(Value::Array(items)) = obj.get(*key) {
            for item in items {
                if let Some(src) = item.get("source").and_then(Value::as_str) {
                    if !sources.iter().any(|s| s == src) {
                        sources.push(src.to_string());
                    }
                }
            }
        }
        if sources.len() == before {
            sources.push(format!("somef:{key}"));
        }
    }
    sources
}
