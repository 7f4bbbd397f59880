use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The assessment route an entity is sent down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Dataset,
    Software,
    Ontology,
    File,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Dataset => write!(f, "dataset"),
            EntityKind::Software => write!(f, "software"),
            EntityKind::Ontology => write!(f, "ontology"),
            EntityKind::File => write!(f, "file"),
        }
    }
}

/// One assessable unit of a manifest, produced by the classifier.
#[derive(Debug, Clone)]
pub struct Entity {
    /// `@id` of the entity (URI or crate-relative path).
    pub id: String,
    pub name: Option<String>,
    pub kind: EntityKind,
    /// Retrievable identifier URL (dataset) or vocabulary URL (ontology).
    pub url: Option<String>,
    /// Install or code-repository URL (software).
    pub repository_url: Option<String>,
    /// First declared `license` value, checked for R1.1.
    pub license: Option<String>,
    pub description: Option<String>,
    /// `true` for the crate's root data entity (`./`).
    pub is_root: bool,
    /// Set when the entity lacks the minimum properties for its kind.
    pub under_specified: Option<String>,
    /// Raw JSON-LD properties, read by the structure checker.
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Entity {
    /// Human-readable label: the declared name, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// The URL handed to this entity's remote assessor, if any.
    pub fn locator(&self) -> Option<&str> {
        match self.kind {
            EntityKind::Software => self.repository_url.as_deref(),
            EntityKind::Dataset | EntityKind::Ontology => self.url.as_deref(),
            EntityKind::File => None,
        }
    }
}

/// External (or local) assessment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    #[serde(rename = "F-UJI")]
    Fuji,
    #[serde(rename = "SOMEF")]
    Somef,
    #[serde(rename = "FOOPS!")]
    Foops,
    #[serde(rename = "RO-Crate structure")]
    Structure,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Fuji => write!(f, "F-UJI"),
            Backend::Somef => write!(f, "SOMEF"),
            Backend::Foops => write!(f, "FOOPS!"),
            Backend::Structure => write!(f, "RO-Crate structure"),
        }
    }
}

/// FAIR category. Declaration order is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Findable,
    Accessible,
    Interoperable,
    Reusable,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Findable,
        Category::Accessible,
        Category::Interoperable,
        Category::Reusable,
    ];

    /// Infer the category from a principle id such as `F1.1` or `R1.2`.
    pub fn from_principle(principle: &str) -> Option<Category> {
        match principle.trim().chars().next()?.to_ascii_uppercase() {
            'F' => Some(Category::Findable),
            'A' => Some(Category::Accessible),
            'I' => Some(Category::Interoperable),
            'R' => Some(Category::Reusable),
            _ => None,
        }
    }

    /// Parse a category name as backends spell it (`Findable`, `findable`, `F`).
    pub fn from_name(name: &str) -> Option<Category> {
        let name = name.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(name))
            .or_else(|| {
                if name.len() == 1 {
                    Category::from_principle(name)
                } else {
                    None
                }
            })
    }

    pub fn initial(&self) -> char {
        match self {
            Category::Findable => 'F',
            Category::Accessible => 'A',
            Category::Interoperable => 'I',
            Category::Reusable => 'R',
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Findable => write!(f, "Findable"),
            Category::Accessible => write!(f, "Accessible"),
            Category::Interoperable => write!(f, "Interoperable"),
            Category::Reusable => write!(f, "Reusable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Indeterminate,
}

impl CheckStatus {
    /// Map a backend status word onto the shared vocabulary.
    pub fn parse(raw: &str) -> CheckStatus {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pass" | "passed" | "ok" | "success" | "true" => CheckStatus::Pass,
            "fail" | "failed" | "error" | "false" => CheckStatus::Fail,
            _ => CheckStatus::Indeterminate,
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "pass"),
            CheckStatus::Fail => write!(f, "fail"),
            CheckStatus::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

/// One FAIR-principle evaluation, normalized from a backend response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub principle_id: String,
    /// `None` when the backend's principle maps to no FAIR category.
    #[serde(rename = "category_id")]
    pub category: Option<Category>,
    pub title: String,
    pub status: CheckStatus,
    pub score: f64,
    pub total_score: f64,
    pub sources: Vec<String>,
    pub tool: Backend,
}

impl CheckResult {
    /// Build a check, clamping `score` into `0..=total_score`.
    ///
    /// An uncategorised check is kept but always indeterminate.
    pub fn new(
        tool: Backend,
        principle_id: impl Into<String>,
        category: impl Into<Option<Category>>,
        title: impl Into<String>,
        status: CheckStatus,
        score: f64,
        total_score: f64,
    ) -> Self {
        let total_score = if total_score.is_finite() {
            total_score.max(0.0)
        } else {
            0.0
        };
        let score = if score.is_finite() {
            score.clamp(0.0, total_score)
        } else {
            0.0
        };
        let category = category.into();
        let status = if category.is_some() {
            status
        } else {
            CheckStatus::Indeterminate
        };
        Self {
            principle_id: principle_id.into(),
            category,
            title: title.into(),
            status,
            score,
            total_score,
            sources: Vec::new(),
            tool,
        }
    }

    /// A pass/fail check worth one point.
    pub fn binary(
        tool: Backend,
        principle_id: impl Into<String>,
        category: impl Into<Option<Category>>,
        title: impl Into<String>,
        status: CheckStatus,
    ) -> Self {
        let score = if status == CheckStatus::Pass { 1.0 } else { 0.0 };
        Self::new(tool, principle_id, category, title, status, score, 1.0)
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    /// Whether the check counts towards tallies.
    pub fn is_usable(&self) -> bool {
        self.category.is_some() && self.status != CheckStatus::Indeterminate
    }
}

/// Passed and possible points for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryTally {
    pub tests_passed: f64,
    pub total_tests: f64,
}

impl CategoryTally {
    /// Satisfaction ratio; a category with nothing to test counts as satisfied.
    pub fn ratio(&self) -> f64 {
        if self.total_tests > 0.0 {
            self.tests_passed / self.total_tests
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Assessed and included in the overall score.
    Scored,
    /// Assessed, but no check produced a usable result.
    Unscored,
    /// The assessment could not complete.
    Degraded,
}

impl std::fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentStatus::Scored => write!(f, "scored"),
            ComponentStatus::Unscored => write!(f, "unscored"),
            ComponentStatus::Degraded => write!(f, "degraded"),
        }
    }
}

/// Aggregated view of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentResult {
    pub name: String,
    pub identifier: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    #[serde(rename = "tool-used")]
    pub tools: Vec<Backend>,
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub checks: Vec<CheckResult>,
    pub score: BTreeMap<Category, CategoryTally>,
    pub component_score: Option<f64>,
}

/// Policy for turning check results into scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum AggregationMode {
    /// Every check weighs the same, across all components.
    #[default]
    Simple,
    /// Every category weighs the same within a component, every component
    /// the same overall.
    CategoryWeighted,
}

impl From<AggregationMode> for u8 {
    fn from(mode: AggregationMode) -> u8 {
        match mode {
            AggregationMode::Simple => 0,
            AggregationMode::CategoryWeighted => 1,
        }
    }
}

impl TryFrom<u8> for AggregationMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AggregationMode::Simple),
            1 => Ok(AggregationMode::CategoryWeighted),
            other => Err(format!("unknown aggregation mode {other} (expected 0 or 1)")),
        }
    }
}

impl std::fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationMode::Simple => write!(f, "simple"),
            AggregationMode::CategoryWeighted => write!(f, "category-weighted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallScore {
    pub description: String,
    pub score: Option<f64>,
}

/// Top-level output of one assessment run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub components: Vec<ComponentResult>,
    pub overall_score: OverallScore,
    pub aggregation_mode: AggregationMode,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub fn count(&self, status: ComponentStatus) -> usize {
        self.components.iter().filter(|c| c.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_principle() {
        assert_eq!(Category::from_principle("F1.1"), Some(Category::Findable));
        assert_eq!(Category::from_principle("r1.2"), Some(Category::Reusable));
        assert_eq!(Category::from_principle("OM4"), None);
        assert_eq!(Category::from_principle(""), None);
    }

    #[test]
    fn test_category_from_name() {
        assert_eq!(Category::from_name("Interoperable"), Some(Category::Interoperable));
        assert_eq!(Category::from_name("accessible"), Some(Category::Accessible));
        assert_eq!(Category::from_name("R"), Some(Category::Reusable));
        assert_eq!(Category::from_name("Ontology"), None);
    }

    #[test]
    fn test_check_score_clamped_to_total() {
        let check = CheckResult::new(
            Backend::Foops,
            "F1",
            Category::Findable,
            "t",
            CheckStatus::Pass,
            3.0,
            2.0,
        );
        assert_eq!(check.score, 2.0);
        assert_eq!(check.total_score, 2.0);

        let negative = CheckResult::new(
            Backend::Foops,
            "F1",
            Category::Findable,
            "t",
            CheckStatus::Fail,
            -1.0,
            1.0,
        );
        assert_eq!(negative.score, 0.0);
    }

    #[test]
    fn test_uncategorised_check_is_indeterminate() {
        let check = CheckResult::binary(Backend::Fuji, "FsF-X1", None::<Category>, "t", CheckStatus::Pass);
        assert_eq!(check.category, None);
        assert_eq!(check.status, CheckStatus::Indeterminate);
        assert!(!check.is_usable());
        let json = serde_json::to_value(&check).unwrap();
        assert!(json["category_id"].is_null());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(CheckStatus::parse("ok"), CheckStatus::Pass);
        assert_eq!(CheckStatus::parse("PASS"), CheckStatus::Pass);
        assert_eq!(CheckStatus::parse("error"), CheckStatus::Fail);
        assert_eq!(CheckStatus::parse("indeterminate"), CheckStatus::Indeterminate);
        assert_eq!(CheckStatus::parse("skipped"), CheckStatus::Indeterminate);
    }

    #[test]
    fn test_aggregation_mode_serde() {
        assert_eq!(
            serde_json::to_string(&AggregationMode::CategoryWeighted).unwrap(),
            "1"
        );
        let mode: AggregationMode = serde_json::from_str("0").unwrap();
        assert_eq!(mode, AggregationMode::Simple);
        assert!(serde_json::from_str::<AggregationMode>("2").is_err());
    }

    #[test]
    fn test_empty_category_ratio_is_one() {
        assert_eq!(CategoryTally::default().ratio(), 1.0);
        let tally = CategoryTally {
            tests_passed: 1.0,
            total_tests: 4.0,
        };
        assert_eq!(tally.ratio(), 0.25);
    }
}
