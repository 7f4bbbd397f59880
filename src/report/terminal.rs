use std::path::Path;

use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::{Category, CheckStatus, ComponentResult, ComponentStatus, Report};

/// Render a colored terminal report.
pub fn render(report: &Report, path: &Path, verbose: bool, quiet: bool) -> Result<()> {
    let total = report.components.len();
    let scored = report.count(ComponentStatus::Scored);
    let unscored = report.count(ComponentStatus::Unscored);
    let degraded = report.count(ComponentStatus::Degraded);
    let overall = format_score(report.overall_score.score);

    if quiet {
        println!(
            "Score: {}  Components: {}  Scored: {}  Unscored: {}  Degraded: {}",
            overall.bold(),
            total,
            scored.to_string().green(),
            unscored.to_string().yellow(),
            degraded.to_string().red(),
        );
        return Ok(());
    }

    println!(
        "\n {} v{}",
        "ro-fairness".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Assessing: {}\n", path.display());

    // Summary box
    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {} │", pad("SUMMARY", BOX_WIDTH).bold());
    println!(
        " │  {} │",
        pad(&format!("Overall FAIR score : {overall}"), BOX_WIDTH)
    );
    println!(
        " │  {} │",
        pad(
            &format!(
                "Aggregation mode   : {} ({})",
                u8::from(report.aggregation_mode),
                report.aggregation_mode
            ),
            BOX_WIDTH
        )
    );
    println!(" │  {} │", pad(&format!("Components         : {total}"), BOX_WIDTH));
    println!(" │  {} │", marker_row("✓".green(), "Scored", scored));
    println!(" │  {} │", marker_row("⚠".yellow(), "Unscored", unscored));
    println!(" │  {} │", marker_row("✗".red(), "Degraded", degraded));
    println!(" └────────────────────────────────────────────────────┘");
    println!(" {}\n", report.overall_score.description.dimmed());

    if total > 0 {
        render_components(&report.components);
        println!();
    }

    if unscored + degraded > 0 {
        println!(" {} Components not scored:\n", "[WARN]".yellow().bold());
        for component in report
            .components
            .iter()
            .filter(|c| c.status != ComponentStatus::Scored)
        {
            let marker = match component.status {
                ComponentStatus::Degraded => "✗".red(),
                _ => "⚠".yellow(),
            };
            println!(
                "  {} {} ({}): {}",
                marker,
                component.name.bold(),
                component.status,
                component.reason.as_deref().unwrap_or("unknown")
            );
        }
        println!();
    }

    let warnings: Vec<(&str, &String)> = report
        .components
        .iter()
        .flat_map(|c| c.warnings.iter().map(move |w| (c.name.as_str(), w)))
        .collect();
    if !warnings.is_empty() {
        println!(" {} Normalization warnings:\n", "[WARN]".yellow().bold());
        for (name, warning) in warnings {
            println!("  {} {}: {}", "⚠".yellow(), name, warning);
        }
        println!();
    }

    if verbose {
        for component in &report.components {
            if component.checks.is_empty() {
                continue;
            }
            println!(" {} {}:\n", "[CHECKS]".cyan().bold(), component.name);
            render_checks(component);
            println!();
        }
    }

    Ok(())
}

fn render_components(components: &[ComponentResult]) {
    let mut table = Table::new();
    let mut header = vec![
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("Tools").add_attribute(Attribute::Bold),
    ];
    header.extend(
        Category::ALL
            .iter()
            .map(|c| Cell::new(c.initial()).add_attribute(Attribute::Bold)),
    );
    header.push(Cell::new("Score").add_attribute(Attribute::Bold));
    header.push(Cell::new("Status").add_attribute(Attribute::Bold));

    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for component in components {
        let tools: Vec<String> = component.tools.iter().map(ToString::to_string).collect();

        let mut row = vec![
            Cell::new(&component.name),
            Cell::new(component.kind.to_string()),
            Cell::new(tools.join(", ")),
        ];
        for category in Category::ALL {
            let cell = match component.score.get(&category) {
                Some(tally) if tally.total_tests > 0.0 => Cell::new(format!(
                    "{}/{}",
                    format_points(tally.tests_passed),
                    format_points(tally.total_tests)
                ))
                .fg(ratio_color(tally.ratio())),
                _ => Cell::new("–").fg(Color::DarkGrey),
            };
            row.push(cell.set_alignment(CellAlignment::Center));
        }

        let score_cell = match component.component_score {
            Some(score) => Cell::new(format!("{score:.2}")).fg(ratio_color(score / 100.0)),
            None => Cell::new("n/a").fg(Color::DarkGrey),
        };
        row.push(score_cell.set_alignment(CellAlignment::Right));

        let (status_str, status_color) = match component.status {
            ComponentStatus::Scored => ("✓ scored", Color::Green),
            ComponentStatus::Unscored => ("⚠ unscored", Color::Yellow),
            ComponentStatus::Degraded => ("✗ degraded", Color::Red),
        };
        row.push(
            Cell::new(status_str)
                .fg(status_color)
                .set_alignment(CellAlignment::Center),
        );

        table.add_row(row);
    }

    println!("{}", table);
}

fn render_checks(component: &ComponentResult) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Principle").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Tool").add_attribute(Attribute::Bold),
            Cell::new("Points").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for check in &component.checks {
        let (status_str, status_color) = match check.status {
            CheckStatus::Pass => ("✓ pass", Color::Green),
            CheckStatus::Fail => ("✗ fail", Color::Red),
            CheckStatus::Indeterminate => ("? indeterminate", Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(&check.principle_id),
            Cell::new(&check.title),
            Cell::new(check.tool.to_string()),
            Cell::new(format!(
                "{}/{}",
                format_points(check.score),
                format_points(check.total_score)
            ))
            .set_alignment(CellAlignment::Right),
            Cell::new(status_str)
                .fg(status_color)
                .set_alignment(CellAlignment::Center),
        ]);
    }

    println!("{}", table);
}

/// Inner width of the summary box.
const BOX_WIDTH: usize = 48;

/// Pad plain text to `width` columns; colour is applied afterwards so escape
/// codes never count towards the width.
fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

/// `✓  Scored          :    3`, padded to the box width.
fn marker_row(marker: ColoredString, label: &str, count: usize) -> String {
    let text = format!("{label:<16}: {count:>4}");
    format!("{marker}  {}", pad(&text, BOX_WIDTH - 3))
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("{score:.2} / 100"),
        None => "n/a".to_string(),
    }
}

/// `1` rather than `1.0`; fractional points keep two decimals.
fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{points:.0}")
    } else {
        format!("{points:.2}")
    }
}

fn ratio_color(ratio: f64) -> Color {
    if ratio >= 0.75 {
        Color::Green
    } else if ratio >= 0.5 {
        Color::Yellow
    } else {
        Color::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_points() {
        assert_eq!(format_points(1.0), "1");
        assert_eq!(format_points(0.5), "0.50");
        assert_eq!(format_points(12.0), "12");
    }

    #[test]
    fn test_summary_rows_padded_before_colouring() {
        assert_eq!(pad("SUMMARY", BOX_WIDTH).chars().count(), BOX_WIDTH);

        let row = marker_row("✓".green(), "Scored", 3);
        let plain = pad("Scored          :    3", BOX_WIDTH - 3);
        assert!(row.ends_with(&format!("  {plain}")));
        assert_eq!(plain.chars().count(), BOX_WIDTH - 3);
        assert!(!plain.contains('\u{1b}'));
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(Some(95.8333)), "95.83 / 100");
        assert_eq!(format_score(None), "n/a");
    }

    #[test]
    fn test_ratio_color_thresholds() {
        assert_eq!(ratio_color(1.0), Color::Green);
        assert_eq!(ratio_color(0.6), Color::Yellow);
        assert_eq!(ratio_color(0.1), Color::Red);
    }
}
