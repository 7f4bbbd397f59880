//! RO-Crate metadata loading.
//!
//! Turns `ro-crate-metadata.json` into the root data entity plus the list of
//! parts it declares through `hasPart`, in declaration order.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

/// Metadata file names probed inside a crate directory.
const METADATA_FILES: [&str; 2] = ["ro-crate-metadata.json", "ro-crate-metadata.jsonld"];

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no ro-crate-metadata.json found in {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("RO-Crate metadata has no @graph array")]
    MissingGraph,

    #[error("root data entity `{0}` not found in @graph")]
    MissingRoot(String),

    #[error("root data entity `{0}` must have Dataset among its types")]
    RootNotDataset(String),
}

/// One node of the JSON-LD graph, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    pub id: String,
    pub types: Vec<String>,
    pub properties: Map<String, Value>,
}

impl RawEntity {
    fn from_node(node: &Map<String, Value>) -> Option<Self> {
        let id = node.get("@id")?.as_str()?.to_string();
        Some(Self {
            id,
            types: string_list(node.get("@type")),
            properties: node.clone(),
        })
    }

    /// Placeholder for a part referenced by `hasPart` but not described.
    fn undescribed(id: &str) -> Self {
        Self {
            id: id.to_string(),
            types: Vec::new(),
            properties: Map::new(),
        }
    }

    pub fn has_type(&self, needle: &str) -> bool {
        self.types.iter().any(|t| t == needle)
    }

    /// First string value of a property; `{"@id": ..}` references resolve to their id.
    pub fn property(&self, key: &str) -> Option<&str> {
        first_str(self.properties.get(key)?)
    }
}

/// A parsed crate: the root data entity and its declared parts.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub root: RawEntity,
    pub parts: Vec<RawEntity>,
}

/// Load an RO-Crate from a directory or a metadata file path.
pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let file = resolve_metadata_file(path)?;
    let content = std::fs::read_to_string(&file).map_err(|source| ManifestError::Io {
        path: file.clone(),
        source,
    })?;
    let document: Value = serde_json::from_str(&content).map_err(|source| ManifestError::Json {
        path: file.clone(),
        source,
    })?;

    let mut manifest = parse_document(&document)?;
    manifest.path = file;
    Ok(manifest)
}

fn resolve_metadata_file(path: &Path) -> Result<PathBuf, ManifestError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    METADATA_FILES
        .iter()
        .map(|name| path.join(name))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| ManifestError::NotFound(path.to_path_buf()))
}

/// Parse an in-memory RO-Crate JSON-LD document.
pub fn parse_document(document: &Value) -> Result<Manifest, ManifestError> {
    let graph = document
        .get("@graph")
        .and_then(Value::as_array)
        .ok_or(ManifestError::MissingGraph)?;

    let nodes: Vec<RawEntity> = graph
        .iter()
        .filter_map(Value::as_object)
        .filter_map(RawEntity::from_node)
        .collect();

    // The metadata descriptor's `about` names the root; `./` by convention.
    let root_id = nodes
        .iter()
        .find(|n| METADATA_FILES.contains(&n.id.as_str()))
        .and_then(|descriptor| descriptor.property("about"))
        .unwrap_or("./")
        .to_string();

    let root = nodes
        .iter()
        .find(|n| n.id == root_id)
        .cloned()
        .ok_or_else(|| ManifestError::MissingRoot(root_id.clone()))?;

    if !root.has_type("Dataset") {
        return Err(ManifestError::RootNotDataset(root_id));
    }

    let parts = root
        .properties
        .get("hasPart")
        .map(reference_ids)
        .unwrap_or_default()
        .into_iter()
        .map(|id| {
            nodes
                .iter()
                .find(|n| n.id == id)
                .cloned()
                .unwrap_or_else(|| RawEntity::undescribed(&id))
        })
        .collect();

    Ok(Manifest {
        path: PathBuf::new(),
        root,
        parts,
    })
}

/// Collect `@id`s from a single reference or an array of references.
fn reference_ids(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().flat_map(reference_ids).collect(),
        Value::Object(obj) => obj
            .get("@id")
            .and_then(Value::as_str)
            .map(|id| vec![id.to_string()])
            .unwrap_or_default(),
        Value::String(s) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn first_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.as_str()),
        Value::Object(obj) => obj.get("@id").and_then(Value::as_str),
        Value::Array(items) => items.iter().find_map(first_str),
        _ => None,
    }
}

/// Whether a JSON-LD value carries content (not null, empty string or empty list).
pub(crate) fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => items.iter().any(is_present),
        Value::Object(obj) => !obj.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn sample() -> Value {
        json!({
            "@context": "https://w3id.org/ro/crate/1.1/context",
            "@graph": [
                {
                    "@id": "ro-crate-metadata.json",
                    "@type": "CreativeWork",
                    "about": {"@id": "./"}
                },
                {
                    "@id": "./",
                    "@type": "Dataset",
                    "name": "Example crate",
                    "hasPart": [
                        {"@id": "data.csv"},
                        {"@id": "https://github.com/example/tool"},
                        {"@id": "missing.txt"}
                    ]
                },
                {
                    "@id": "data.csv",
                    "@type": "File",
                    "name": "Data",
                    "encodingFormat": "text/csv"
                },
                {
                    "@id": "https://github.com/example/tool",
                    "@type": ["SoftwareSourceCode"],
                    "codeRepository": {"@id": "https://github.com/example/tool"}
                }
            ]
        })
    }

    #[test]
    fn test_parts_follow_has_part_order() {
        let manifest = parse_document(&sample()).unwrap();
        assert_eq!(manifest.root.id, "./");
        let ids: Vec<_> = manifest.parts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["data.csv", "https://github.com/example/tool", "missing.txt"]
        );
    }

    #[test]
    fn test_undescribed_part_is_kept() {
        let manifest = parse_document(&sample()).unwrap();
        let missing = &manifest.parts[2];
        assert!(missing.types.is_empty());
        assert!(missing.properties.is_empty());
    }

    #[test]
    fn test_property_resolves_references() {
        let manifest = parse_document(&sample()).unwrap();
        assert_eq!(
            manifest.parts[1].property("codeRepository"),
            Some("https://github.com/example/tool")
        );
        assert_eq!(manifest.parts[0].property("encodingFormat"), Some("text/csv"));
        assert_eq!(manifest.parts[0].property("license"), None);
    }

    #[test]
    fn test_missing_graph_is_fatal() {
        let err = parse_document(&json!({"name": "x"})).unwrap_err();
        assert!(matches!(err, ManifestError::MissingGraph));
    }

    #[test]
    fn test_root_must_be_dataset() {
        let doc = json!({"@graph": [{"@id": "./", "@type": "CreativeWork"}]});
        let err = parse_document(&doc).unwrap_err();
        assert!(matches!(err, ManifestError::RootNotDataset(_)));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("ro-crate-metadata.json")).unwrap();
        write!(f, "{}", sample()).unwrap();

        let manifest = load_manifest(dir.path()).unwrap();
        assert_eq!(manifest.parts.len(), 3);
        assert!(manifest.path.ends_with("ro-crate-metadata.json"));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ro-crate-metadata.json"), "{ not json").unwrap();
        let err = load_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Json { .. }));
    }

    #[test]
    fn test_load_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound(_)));
    }
}
