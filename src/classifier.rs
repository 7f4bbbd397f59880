use std::sync::OnceLock;

use regex::Regex;

use crate::manifest::RawEntity;
use crate::models::{Entity, EntityKind};

/// Type names that mark an entity as software when it also carries a download URL.
const SOFTWARE_TYPES: [&str; 3] = [
    "SoftwareSourceCode",
    "SoftwareApplication",
    "ComputationalWorkflow",
];

/// Type fragments that mark an entity as a vocabulary.
const ONTOLOGY_TYPES: [&str; 5] = [
    "Ontology",
    "DefinedTermSet",
    "ConceptScheme",
    "Vocabulary",
    "owl:Ontology",
];

/// Properties that may carry a retrievable identifier, in lookup order.
const IDENTIFIER_PROPERTIES: [&str; 3] = ["url", "identifier", "sameAs"];

fn vocabulary_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https?://(www\.)?(w3id\.org|purl\.org)/").expect("static regex is valid")
    })
}

fn code_host_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https?://(www\.)?(github\.com|gitlab\.com|bitbucket\.org)/[^/]+/[^/]+")
            .expect("static regex is valid")
    })
}

fn doi_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(doi:|https?://(dx\.)?doi\.org/)10\.\d{4,9}/\S+$")
            .expect("static regex is valid")
    })
}

/// Classify every raw part of a manifest. Nothing is dropped.
pub fn classify_all(parts: &[RawEntity]) -> Vec<Entity> {
    parts.iter().map(classify).collect()
}

/// Classify one raw entity into an assessment kind.
///
/// Precedence:
/// 1. install or code-repository URL → software
/// 2. ontology-like type with a w3id/purl identifier → ontology
/// 3. retrievable identifier URL plus a description → dataset
/// 4. anything else → file
pub fn classify(raw: &RawEntity) -> Entity {
    let description = raw.property("description").map(str::to_string);

    let (kind, url, repository_url) = if let Some(repo) = software_locator(raw) {
        (EntityKind::Software, None, Some(repo))
    } else if let Some(vocab) = vocabulary_url(raw) {
        (EntityKind::Ontology, Some(vocab), None)
    } else if let Some(url) = retrievable_url(raw).filter(|_| description.is_some()) {
        (EntityKind::Dataset, Some(url), None)
    } else {
        (EntityKind::File, retrievable_url(raw), None)
    };

    let mut entity = Entity {
        id: raw.id.clone(),
        name: raw.property("name").map(str::to_string),
        kind,
        url,
        repository_url,
        license: raw.property("license").map(str::to_string),
        description,
        is_root: false,
        under_specified: None,
        properties: raw.properties.clone(),
    };
    entity.under_specified = under_specified_reason(&entity);
    entity
}

/// The crate's root data entity, assessed on its own metadata only.
pub fn classify_root(root: &RawEntity) -> Entity {
    let mut entity = classify(root);
    entity.kind = EntityKind::File;
    entity.url = retrievable_url(root);
    entity.repository_url = None;
    entity.is_root = true;
    entity.under_specified = under_specified_reason(&entity);
    entity
}

fn software_locator(raw: &RawEntity) -> Option<String> {
    if let Some(url) = raw
        .property("installUrl")
        .or_else(|| raw.property("codeRepository"))
    {
        return Some(url.to_string());
    }

    let software_typed = SOFTWARE_TYPES.iter().any(|t| raw.has_type(t));
    if software_typed {
        if let Some(url) = raw.property("downloadUrl") {
            return Some(url.to_string());
        }
    }

    if code_host_pattern().is_match(&raw.id) {
        return Some(raw.id.clone());
    }
    None
}

fn vocabulary_url(raw: &RawEntity) -> Option<String> {
    let ontology_typed = raw
        .types
        .iter()
        .any(|t| ONTOLOGY_TYPES.iter().any(|o| t.contains(o)));
    if !ontology_typed {
        return None;
    }
    std::iter::once(raw.id.as_str())
        .chain(raw.property("url"))
        .find(|candidate| vocabulary_pattern().is_match(candidate))
        .map(str::to_string)
}

fn retrievable_url(raw: &RawEntity) -> Option<String> {
    std::iter::once(raw.id.as_str())
        .chain(IDENTIFIER_PROPERTIES.iter().filter_map(|p| raw.property(p)))
        .find(|candidate| is_http_url(candidate) || doi_pattern().is_match(candidate))
        .map(str::to_string)
}

fn is_http_url(candidate: &str) -> bool {
    reqwest::Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

/// Why an entity cannot be assessed fairly, if it cannot.
fn under_specified_reason(entity: &Entity) -> Option<String> {
    if entity.name.is_none() && entity.description.is_none() {
        return Some("missing both name and description".to_string());
    }
    if let Some(repo) = entity.repository_url.as_deref() {
        if !is_http_url(repo) {
            return Some(format!("repository URL `{repo}` is not an absolute http(s) URL"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn raw(id: &str, types: &[&str], props: Value) -> RawEntity {
        let properties: Map<String, Value> = props.as_object().cloned().unwrap_or_default();
        RawEntity {
            id: id.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
            properties,
        }
    }

    #[test]
    fn test_code_repository_wins_over_everything() {
        let e = classify(&raw(
            "https://w3id.org/example/onto",
            &["Ontology"],
            json!({"name": "x", "codeRepository": "https://github.com/a/b", "description": "d"}),
        ));
        assert_eq!(e.kind, EntityKind::Software);
        assert_eq!(e.locator(), Some("https://github.com/a/b"));
    }

    #[test]
    fn test_license_reference_feeds_structure_check() {
        let e = classify(&raw(
            "data.csv",
            &["File"],
            json!({"name": "d", "license": {"@id": "https://spdx.org/licenses/CC-BY-4.0"}}),
        ));
        assert_eq!(e.license.as_deref(), Some("https://spdx.org/licenses/CC-BY-4.0"));

        let payload = crate::gateway::structure::check_entity(&e);
        let r11 = payload["checks"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["principle_id"] == "R1.1")
            .unwrap();
        assert_eq!(r11["status"], "pass");
    }

    #[test]
    fn test_github_id_is_software() {
        let e = classify(&raw(
            "https://github.com/org/tool",
            &["CreativeWork"],
            json!({"name": "tool"}),
        ));
        assert_eq!(e.kind, EntityKind::Software);
    }

    #[test]
    fn test_download_url_needs_software_type() {
        let plain = classify(&raw(
            "data.zip",
            &["File"],
            json!({"name": "z", "downloadUrl": "https://example.org/z.zip"}),
        ));
        assert_eq!(plain.kind, EntityKind::File);

        let app = classify(&raw(
            "app",
            &["SoftwareApplication"],
            json!({"name": "a", "downloadUrl": "https://example.org/a.tar.gz"}),
        ));
        assert_eq!(app.kind, EntityKind::Software);
    }

    #[test]
    fn test_ontology_requires_vocabulary_url() {
        let onto = classify(&raw(
            "https://w3id.org/okn/o/sd",
            &["owl:Ontology"],
            json!({"name": "SD"}),
        ));
        assert_eq!(onto.kind, EntityKind::Ontology);
        assert_eq!(onto.locator(), Some("https://w3id.org/okn/o/sd"));

        let not_vocab = classify(&raw(
            "https://example.org/onto.owl",
            &["Ontology"],
            json!({"name": "O"}),
        ));
        assert_ne!(not_vocab.kind, EntityKind::Ontology);
    }

    #[test]
    fn test_dataset_needs_url_and_description() {
        let ds = classify(&raw(
            "https://doi.org/10.5281/zenodo.123",
            &["Dataset"],
            json!({"name": "D", "description": "measurements"}),
        ));
        assert_eq!(ds.kind, EntityKind::Dataset);

        let no_desc = classify(&raw(
            "https://example.org/data.csv",
            &["File"],
            json!({"name": "D"}),
        ));
        assert_eq!(no_desc.kind, EntityKind::File);
        assert_eq!(no_desc.url.as_deref(), Some("https://example.org/data.csv"));
    }

    #[test]
    fn test_dataset_from_identifier_property() {
        let ds = classify(&raw(
            "local/data",
            &["Dataset"],
            json!({"name": "D", "description": "x", "identifier": "doi:10.1234/abcd"}),
        ));
        assert_eq!(ds.kind, EntityKind::Dataset);
        assert_eq!(ds.locator(), Some("doi:10.1234/abcd"));
    }

    #[test]
    fn test_relative_file() {
        let f = classify(&raw("data.csv", &["File"], json!({"name": "D"})));
        assert_eq!(f.kind, EntityKind::File);
        assert!(f.under_specified.is_none());
    }

    #[test]
    fn test_under_specified_without_name_or_description() {
        let f = classify(&raw("blob.bin", &[], json!({})));
        assert_eq!(f.kind, EntityKind::File);
        assert!(f.under_specified.is_some());
    }

    #[test]
    fn test_under_specified_software_locator() {
        let s = classify(&raw(
            "tool",
            &["SoftwareSourceCode"],
            json!({"name": "t", "codeRepository": "git@github.com:a/b.git"}),
        ));
        assert_eq!(s.kind, EntityKind::Software);
        assert!(s.under_specified.unwrap().contains("not an absolute"));
    }

    #[test]
    fn test_root_is_always_structure_only() {
        let root = classify_root(&raw(
            "./",
            &["Dataset"],
            json!({"name": "crate", "description": "d", "url": "https://example.org/crate"}),
        ));
        assert_eq!(root.kind, EntityKind::File);
        assert!(root.is_root);
        assert_eq!(root.locator(), None);
    }

    #[test]
    fn test_classify_all_keeps_every_part() {
        let parts = vec![
            raw("a", &[], json!({})),
            raw("b", &["File"], json!({"name": "b"})),
        ];
        assert_eq!(classify_all(&parts).len(), 2);
    }
}
