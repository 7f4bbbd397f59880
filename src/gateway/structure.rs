//! Local checks over an entity's declared RO-Crate metadata.
//!
//! Runs synchronously on the manifest properties, so it never fails
//! transiently. Results use the same `checks` shape as FOOPS! responses.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Assessor, GatewayError, RawResult};
use crate::manifest::is_present;
use crate::models::{Backend, Entity};

/// Encoding formats accepted as open, long-term formats.
const OPEN_FORMATS: [&str; 14] = [
    "text/plain",
    "text/csv",
    "text/tab-separated-values",
    "text/markdown",
    "text/turtle",
    "text/html",
    "application/json",
    "application/ld+json",
    "application/xml",
    "application/rdf+xml",
    "application/pdf",
    "image/png",
    "image/svg+xml",
    "application/x-hdf5",
];

pub struct StructureChecker;

#[async_trait]
impl Assessor for StructureChecker {
    fn backend(&self) -> Backend {
        Backend::Structure
    }

    async fn assess(&self, entity: &Entity) -> Result<RawResult, GatewayError> {
        Ok(RawResult {
            backend: Backend::Structure,
            payload: check_entity(entity),
        })
    }
}

/// Evaluate the crate-metadata checks for one entity.
pub fn check_entity(entity: &Entity) -> Value {
    let declares = |key: &str| entity.properties.get(key).is_some_and(is_present);
    let any = |keys: &[&str]| keys.iter().any(|&k| declares(k));
    let all = |keys: &[&str]| keys.iter().all(|&k| declares(k));

    let mut checks = vec![
        check(
            "F1",
            "Findable",
            "Resource declares an identifier",
            !entity.id.trim().is_empty(),
            "metadata: @id",
        ),
        check(
            "F2",
            "Findable",
            "Descriptive core metadata (name, description) is present",
            all(&["name", "description"]),
            "metadata: name, description",
        ),
        check(
            "F2",
            "Findable",
            "Discovery metadata (keywords, datePublished) is present",
            all(&["keywords", "datePublished"]),
            "metadata: keywords, datePublished",
        ),
        check(
            "A1.1",
            "Accessible",
            "Identifier is resolvable over http(s)",
            entity.url.is_some() || entity.repository_url.is_some(),
            "metadata: @id, url, identifier",
        ),
        check(
            "A1.2",
            "Accessible",
            "Access conditions are stated (license, conditionsOfAccess or copyrightHolder)",
            any(&["license", "conditionsOfAccess", "copyrightHolder"]),
            "metadata: license, conditionsOfAccess, copyrightHolder",
        ),
        check(
            "I1",
            "Interoperable",
            "Format or profile is declared (encodingFormat, conformsTo)",
            any(&["encodingFormat", "conformsTo"]),
            "metadata: encodingFormat, conformsTo",
        ),
        check(
            "R1.1",
            "Reusable",
            "License information is given in an appropriate metadata element",
            entity.license.is_some(),
            &format!("license: {}", entity.license.as_deref().unwrap_or("not declared")),
        ),
        check(
            "R1.2",
            "Reusable",
            "Provenance metadata (author or creator, datePublished) is present",
            any(&["author", "creator"]) && declares("datePublished"),
            "metadata: author, creator, datePublished",
        ),
    ];

    if entity.is_root {
        checks.push(check(
            "I3",
            "Interoperable",
            "Crate parts are linked with machine-readable references",
            declares("hasPart"),
            "metadata: hasPart",
        ));
    } else {
        checks.push(check(
            "F3",
            "Findable",
            "File size and type (contentSize, encodingFormat) are given",
            all(&["contentSize", "encodingFormat"]),
            "metadata: contentSize, encodingFormat",
        ));
        checks.push(open_format_check(entity));
    }

    json!({ "checks": checks })
}

fn check(principle: &str, category: &str, title: &str, passed: bool, evidence: &str) -> Value {
    json!({
        "principle_id": principle,
        "category_id": category,
        "title": title,
        "status": if passed { "pass" } else { "fail" },
        "explanation": [evidence],
    })
}

/// R1.3: only decidable when an encoding format is declared.
fn open_format_check(entity: &Entity) -> Value {
    let format = entity
        .properties
        .get("encodingFormat")
        .and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => items.iter().find_map(|i| i.as_str().map(str::to_string)),
            _ => None,
        });

    let status = match format.as_deref() {
        Some(f) if OPEN_FORMATS.contains(&f.trim().to_ascii_lowercase().as_str()) => "pass",
        Some(_) => "fail",
        None => "indeterminate",
    };

    json!({
        "principle_id": "R1.3",
        "category_id": "Reusable",
        "title": "Data is stored in an open, community-recognised format",
        "status": status,
        "explanation": [format!("encodingFormat: {}", format.as_deref().unwrap_or("not declared"))],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::entity;
    use crate::models::EntityKind;

    fn statuses(payload: &Value) -> Vec<(String, String)> {
        payload["checks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| {
                (
                    c["title"].as_str().unwrap().to_string(),
                    c["status"].as_str().unwrap().to_string(),
                )
            })
            .collect()
    }

    fn status_of(payload: &Value, principle: &str) -> Vec<String> {
        payload["checks"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|c| c["principle_id"] == principle)
            .map(|c| c["status"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_license_and_provenance() {
        let mut e = entity("data.csv", EntityKind::File);
        e.properties = json!({
            "name": "Data",
            "license": {"@id": "https://spdx.org/licenses/MIT"},
            "author": {"@id": "#alice"},
            "datePublished": "2024-01-01"
        })
        .as_object()
        .cloned()
        .unwrap();
        e.license = Some("https://spdx.org/licenses/MIT".to_string());

        let payload = check_entity(&e);
        assert_eq!(status_of(&payload, "R1.1"), vec!["pass"]);
        let r11 = payload["checks"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["principle_id"] == "R1.1")
            .unwrap();
        assert_eq!(r11["explanation"][0], "license: https://spdx.org/licenses/MIT");
        assert_eq!(status_of(&payload, "R1.2"), vec!["pass"]);
        assert_eq!(status_of(&payload, "F3"), vec!["fail"]);
    }

    #[test]
    fn test_bare_entity_fails_interoperability() {
        let mut e = entity("blob", EntityKind::File);
        e.url = None;
        e.repository_url = None;
        e.description = None;
        e.properties = json!({"name": "blob"}).as_object().cloned().unwrap();

        let payload = check_entity(&e);
        assert_eq!(status_of(&payload, "I1"), vec!["fail"]);
        assert_eq!(status_of(&payload, "A1.1"), vec!["fail"]);
        assert_eq!(status_of(&payload, "R1.1"), vec!["fail"]);
        assert!(status_of(&payload, "I3").is_empty());
    }

    #[test]
    fn test_declared_format_satisfies_i1() {
        let mut e = entity("table", EntityKind::File);
        e.properties.insert("encodingFormat".into(), json!("text/csv"));
        assert_eq!(status_of(&check_entity(&e), "I1"), vec!["pass"]);
    }

    #[test]
    fn test_open_format_indeterminate_without_format() {
        let e = entity("blob", EntityKind::File);
        let payload = check_entity(&e);
        assert_eq!(status_of(&payload, "R1.3"), vec!["indeterminate"]);
    }

    #[test]
    fn test_open_format_recognised() {
        let mut e = entity("table", EntityKind::File);
        e.properties.insert("encodingFormat".into(), json!("text/csv"));
        assert_eq!(status_of(&check_entity(&e), "R1.3"), vec!["pass"]);

        e.properties.insert("encodingFormat".into(), json!("application/x-matlab-data"));
        assert_eq!(status_of(&check_entity(&e), "R1.3"), vec!["fail"]);
    }

    #[test]
    fn test_root_skips_file_level_checks() {
        let mut e = entity("./", EntityKind::File);
        e.is_root = true;
        e.properties.insert("hasPart".into(), json!([{"@id": "a"}]));
        let payload = check_entity(&e);
        assert!(status_of(&payload, "F3").is_empty());
        assert!(status_of(&payload, "R1.3").is_empty());
        assert_eq!(status_of(&payload, "I3"), vec!["pass"]);

        e.properties.remove("hasPart");
        assert_eq!(status_of(&check_entity(&e), "I3"), vec!["fail"]);
        assert!(statuses(&payload).iter().all(|(t, _)| !t.is_empty()));
    }

    #[tokio::test]
    async fn test_checker_never_fails() {
        let e = entity("x", EntityKind::File);
        let raw = StructureChecker.assess(&e).await.unwrap();
        assert_eq!(raw.backend, Backend::Structure);
        assert!(raw.payload["checks"].is_array());
    }
}
