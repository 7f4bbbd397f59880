//! Scoring of check results, per component and overall.
//!
//! Indeterminate checks count towards neither numerator nor denominator.
//! Under [`AggregationMode::Simple`] every check weighs the same; under
//! [`AggregationMode::CategoryWeighted`] each of the four categories weighs
//! the same within a component (an untested category counts as satisfied)
//! and each scored component weighs the same overall.

use std::collections::BTreeMap;

use crate::models::{
    AggregationMode, Backend, Category, CategoryTally, CheckResult, CheckStatus, ComponentResult,
    ComponentStatus, Entity, OverallScore,
};

/// Everything gathered for one entity before scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assessment {
    pub tools: Vec<Backend>,
    pub checks: Vec<CheckResult>,
    pub warnings: Vec<String>,
    /// Set when the assessment could not complete.
    pub failure: Option<String>,
}

impl Assessment {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// Per-category tally over the usable checks. All four categories are present.
pub fn tally(checks: &[CheckResult]) -> BTreeMap<Category, CategoryTally> {
    let mut tallies: BTreeMap<Category, CategoryTally> = Category::ALL
        .into_iter()
        .map(|c| (c, CategoryTally::default()))
        .collect();

    for check in checks.iter().filter(|c| c.is_usable()) {
        if let Some(category) = check.category {
            let entry = tallies.entry(category).or_default();
            entry.tests_passed += check.score;
            entry.total_tests += check.total_score;
        }
    }
    tallies
}

/// Component score in percent, or `None` when there is nothing to score.
pub fn component_score(
    tallies: &BTreeMap<Category, CategoryTally>,
    mode: AggregationMode,
) -> Option<f64> {
    let (passed, total) = totals(tallies);
    if total <= 0.0 {
        return None;
    }
    match mode {
        AggregationMode::Simple => Some(passed / total * 100.0),
        AggregationMode::CategoryWeighted => Some(category_weighted(tallies)),
    }
}

/// Mean of the four category ratios, in percent.
fn category_weighted(tallies: &BTreeMap<Category, CategoryTally>) -> f64 {
    let sum: f64 = Category::ALL
        .iter()
        .map(|c| tallies.get(c).copied().unwrap_or_default().ratio())
        .sum();
    sum / Category::ALL.len() as f64 * 100.0
}

fn totals(tallies: &BTreeMap<Category, CategoryTally>) -> (f64, f64) {
    tallies.values().fold((0.0, 0.0), |(p, t), tally| {
        (p + tally.tests_passed, t + tally.total_tests)
    })
}

/// Score one entity's assessment.
///
/// Checks of an under-specified entity are all downgraded to indeterminate,
/// so the component is reported but not scored.
pub fn aggregate(entity: &Entity, assessment: Assessment, mode: AggregationMode) -> ComponentResult {
    let Assessment {
        tools,
        mut checks,
        warnings,
        failure,
    } = assessment;

    if entity.under_specified.is_some() {
        for check in &mut checks {
            check.status = CheckStatus::Indeterminate;
        }
    }

    let score = tally(&checks);
    let computed = component_score(&score, mode);

    let (status, reason, component_score) = match (failure, computed) {
        (Some(reason), _) => (ComponentStatus::Degraded, Some(reason), None),
        (None, Some(value)) => (ComponentStatus::Scored, None, Some(value)),
        (None, None) => {
            let reason = match &entity.under_specified {
                Some(why) => format!("under-specified: {why}"),
                None => "no usable checks".to_string(),
            };
            (ComponentStatus::Unscored, Some(reason), None)
        }
    };

    ComponentResult {
        name: entity.display_name().to_string(),
        identifier: entity.id.clone(),
        kind: entity.kind,
        tools,
        status,
        reason,
        warnings,
        checks,
        score,
        component_score,
    }
}

/// Overall score over the scored components; degraded and unscored ones are excluded.
pub fn aggregate_overall(components: &[ComponentResult], mode: AggregationMode) -> OverallScore {
    let scored: Vec<&ComponentResult> = components
        .iter()
        .filter(|c| c.status == ComponentStatus::Scored)
        .collect();
    let excluded = components.len() - scored.len();

    let score = match mode {
        AggregationMode::Simple => {
            let (passed, total) = scored.iter().fold((0.0, 0.0), |(p, t), c| {
                let (cp, ct) = totals(&c.score);
                (p + cp, t + ct)
            });
            (total > 0.0).then(|| passed / total * 100.0)
        }
        AggregationMode::CategoryWeighted => {
            let scores: Vec<f64> = scored
                .iter()
                .filter_map(|c| component_score(&c.score, mode))
                .collect();
            (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64)
        }
    };

    let basis = match mode {
        AggregationMode::Simple => "Share of passed checks across",
        AggregationMode::CategoryWeighted => "Mean of category-weighted scores of",
    };
    let mut description = format!(
        "{basis} {} scored component{}",
        scored.len(),
        if scored.len() == 1 { "" } else { "s" }
    );
    if excluded > 0 {
        description.push_str(&format!(
            " ({excluded} degraded or unscored component{} excluded)",
            if excluded == 1 { "" } else { "s" }
        ));
    }

    OverallScore { description, score }
}
