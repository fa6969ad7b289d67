use std::io::IsTerminal;
use owo_colors::OwoColorize;
use serde::Serialize;
use terminal_size::{Width, terminal_size};

use crate::compare::{Selection, ValueView};
use crate::map::{CenterPoint, LocalityMarker, MunicipalityLayer};
use crate::model::{Indicator, Rate, ScoredMunicipality};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
pub fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Pad to `width` characters (not bytes).
fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// Format a rate with two decimals, "n/a" when undefined
pub fn format_rate(rate: Rate) -> String {
    format!("{:.2}", rate)
}

/// Empty string for undefined values, for TSV
fn tsv_rate(rate: Rate) -> String {
    rate.value().map(|v| format!("{:.4}", v)).unwrap_or_default()
}

/// Pretty-printed JSON for any output type
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Width left for the name column once the fixed columns are placed.
/// None when writing to a pipe.
fn name_width(fixed_width: usize) -> Option<usize> {
    get_terminal_width().map(|width| {
        if width > fixed_width + 10 {
            width - fixed_width
        } else {
            20
        }
    })
}

/// Format ranked municipalities as a table
/// Columns: Index, Opportunity index, Name, Schools, Housing, Companies (per 1000)
/// Index column sized to the row count, right-aligned with trailing dot
pub fn format_ranking_table(rows: &[&ScoredMunicipality], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No municipalities found.".to_string();
    }

    let index_width = rows.len().to_string().len() + 1;
    let value_width = 9;
    let separator = "  ";
    let fixed_width = index_width + 1 + value_width * 4 + separator.len() * 4;

    let width = name_width(fixed_width);
    let longest = rows
        .iter()
        .map(|r| r.name().chars().count())
        .chain(std::iter::once("Municipality".len()))
        .max()
        .unwrap_or(0);
    let column = width.map_or(longest, |w| longest.min(w));

    let header = format!(
        "{:>iw$} {:>vw$}{sep}{}{sep}{:>vw$}{sep}{:>vw$}{sep}{:>vw$}",
        "#",
        "Index",
        pad("Municipality", column),
        "Schools",
        "Housing",
        "Companies",
        iw = index_width,
        vw = value_width,
        sep = separator,
    );

    let mut lines = vec![if use_colors {
        header.dimmed().to_string()
    } else {
        header
    }];

    for (idx, row) in rows.iter().enumerate() {
        let index_str = format!("{:>w$}", format!("{}.", idx + 1), w = index_width);
        let index_value = format!("{:>w$.3}", row.opportunity_index, w = value_width);
        let name = pad(&truncate(row.name(), column), column);
        let rates = Indicator::ALL
            .iter()
            .map(|i| format!("{:>w$.2}", row.rates.get(*i), w = value_width))
            .collect::<Vec<_>>()
            .join(separator);

        let line = if use_colors {
            format!(
                "{} {}{}{}{}{}",
                index_str.dimmed(),
                index_value.bold(),
                separator,
                name,
                separator,
                rates
            )
        } else {
            format!("{} {}{}{}{}{}", index_str, index_value, separator, name, separator, rates)
        };
        lines.push(line);
    }

    lines.join("\n")
}

/// Format ranked municipalities as tab-separated values for scripting
/// Columns: name, population, opportunity_index, schools, housing, companies
/// (no headers, no colors)
pub fn format_ranking_tsv(rows: &[&ScoredMunicipality]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                row.name(),
                row.record.population_total,
                tsv_rate(row.opportunity_index),
                tsv_rate(row.rates.schools_per_1000),
                tsv_rate(row.rates.housing_per_1000),
                tsv_rate(row.rates.companies_per_1000),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a comparison as one block per municipality followed by the summary
pub fn format_comparison(selection: &Selection, view: ValueView, use_colors: bool) -> String {
    let mut blocks = Vec::new();

    for row in &selection.rows {
        let m = row.municipality;
        let mut block = if use_colors {
            format!("{}", m.name().bold())
        } else {
            m.name().to_string()
        };
        if row.low_reliability {
            let warning = "  (small population: per-1000 values may be unreliable)";
            if use_colors {
                block.push_str(&warning.yellow().to_string());
            } else {
                block.push_str(warning);
            }
        }
        block.push_str(&format!("\n  Population: {}", m.record.population_total));
        for indicator in Indicator::ALL {
            block.push_str(&format!(
                "\n  {}: {} ({} total)",
                indicator.label(),
                format_rate(row.value(indicator, view)),
                m.raw_count(indicator)
            ));
        }
        block.push_str(&format!("\n  Opportunity index: {:.3}", m.opportunity_index));
        blocks.push(block);
    }

    if selection.is_empty() {
        blocks.push("No matching municipalities.".to_string());
    } else {
        let summary = selection.summary();
        let leader = |name: Option<&str>| name.unwrap_or("n/a").to_string();
        let title = format!("Summary ({})", view.label());
        blocks.push(format!(
            "{}\n  Best opportunity index: {}\n  Most schools: {}\n  \
             Most housing offers: {}\n  Most companies: {}",
            if use_colors { title.bold().to_string() } else { title },
            leader(summary.best_opportunity),
            leader(summary.most_schools),
            leader(summary.most_housing),
            leader(summary.most_companies),
        ));
    }

    if !selection.unmatched.is_empty() {
        let note = format!("Not found: {}", selection.unmatched.join(", "));
        blocks.push(if use_colors { note.red().to_string() } else { note });
    }

    blocks.join("\n\n")
}

/// Format a comparison as tab-separated values
/// Columns: name, population, low_reliability, schools, housing, companies, opportunity_index
pub fn format_comparison_tsv(selection: &Selection, view: ValueView) -> String {
    selection
        .rows
        .iter()
        .map(|row| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                row.municipality.name(),
                row.municipality.record.population_total,
                row.low_reliability,
                tsv_rate(row.value(Indicator::Education, view)),
                tsv_rate(row.value(Indicator::Housing, view)),
                tsv_rate(row.value(Indicator::Employment, view)),
                tsv_rate(row.municipality.opportunity_index),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a map layer as one line per point with its color
pub fn format_layer(layer: &MunicipalityLayer, use_colors: bool) -> String {
    if layer.points.is_empty() {
        return format!("No municipalities with coordinates and {}.", layer.metric.label());
    }

    let mut lines = Vec::new();
    let range = match (layer.min, layer.max) {
        (Some(min), Some(max)) => format!("{}: {:.2} - {:.2}", layer.metric.label(), min, max),
        _ => layer.metric.label().to_string(),
    };
    lines.push(if use_colors { range.bold().to_string() } else { range });
    if let Some(bounds) = layer.bounds {
        lines.push(format!("Center: {:.4}, {:.4}", bounds.center_lat, bounds.center_lon));
    }

    let column = layer.points.iter().map(|p| p.name.chars().count()).max().unwrap_or(0);
    for point in &layer.points {
        let swatch = swatch(point.color.r, point.color.g, point.color.b, use_colors);
        lines.push(format!(
            "{} {}  {:>9.4} {:>9.4}  {:>10.2}  {}",
            swatch,
            pad(&point.name, column),
            point.latitude,
            point.longitude,
            point.value,
            point.color.to_hex()
        ));
    }
    lines.join("\n")
}

pub fn format_layer_tsv(layer: &MunicipalityLayer) -> String {
    layer
        .points
        .iter()
        .map(|p| {
            format!(
                "{}\t{}\t{}\t{}\t{}",
                p.name,
                p.latitude,
                p.longitude,
                p.value,
                p.color.to_hex()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format locality markers, one line per locality
pub fn format_locality_markers(markers: &[LocalityMarker], use_colors: bool) -> String {
    if markers.is_empty() {
        return "No centers with coordinates for this regime.".to_string();
    }
    let column = markers.iter().map(|m| m.locality.chars().count()).max().unwrap_or(0);
    markers
        .iter()
        .map(|m| {
            format!(
                "{} {}  {:>4} centers  ratio {:>5.2}  {}",
                swatch(m.color.r, m.color.g, m.color.b, use_colors),
                pad(&m.locality, column),
                m.center_count,
                m.ratio,
                m.color.to_hex()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format individual centers, one line per center
pub fn format_center_points(points: &[CenterPoint], use_colors: bool) -> String {
    if points.is_empty() {
        return "No centers with coordinates for this regime.".to_string();
    }
    let width = name_width(32);
    points
        .iter()
        .map(|p| {
            let name = match width {
                Some(w) => truncate(p.name, w),
                None => p.name.to_string(),
            };
            format!(
                "{} {:>9.4} {:>9.4}  {:<6}  {}",
                swatch(p.color.r, p.color.g, p.color.b, use_colors),
                p.latitude,
                p.longitude,
                p.kind.unwrap_or("-"),
                name
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_locality_markers_tsv(markers: &[LocalityMarker]) -> String {
    markers
        .iter()
        .map(|m| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                m.locality,
                m.center_count,
                m.latitude,
                m.longitude,
                tsv_rate(m.ratio),
                m.color.to_hex()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_center_points_tsv(points: &[CenterPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{}\t{}\t{}\t{}", p.name, p.kind.unwrap_or(""), p.latitude, p.longitude))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A colored block when colors are on, otherwise a plain marker
fn swatch(r: u8, g: u8, b: u8, use_colors: bool) -> String {
    if use_colors {
        "██".truecolor(r, g, b).to_string()
    } else {
        "*".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{select_comparison_set, ComparisonSet};
    use crate::model::MunicipalityRecord;
    use crate::scoring::{ComparisonOptions, MunicipalityTable, Weights};

    fn record(
        name: &str,
        population: u64,
        schools: u64,
        housing: u64,
        companies: u64,
    ) -> MunicipalityRecord {
        MunicipalityRecord {
            name: name.to_string(),
            population_total: population,
            school_count_total: schools,
            housing_offer_total: housing,
            company_count_total: companies,
            latitude: Some(39.0),
            longitude: Some(-0.5),
        }
    }

    fn table() -> MunicipalityTable {
        MunicipalityTable::build(
            vec![
                record("Alzira", 44_000, 30, 120, 2_900),
                record("Bocairent", 500, 2, 10, 50),
                record("Dos Aguas", 0, 1, 0, 3),
            ],
            &Weights::default(),
        )
        .unwrap()
    }

    fn selection<'a>(table: &'a MunicipalityTable, names: &[&str]) -> Selection<'a> {
        match select_comparison_set(table, names, &ComparisonOptions::default()).unwrap() {
            ComparisonSet::Selected(s) => s,
            ComparisonSet::Empty => panic!("expected a selection"),
        }
    }

    // truncate tests
    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate("Alzira", 20), "Alzira");
    }

    #[test]
    fn test_truncate_long() {
        assert_eq!(truncate("la Vila Joiosa / Villajoyosa", 15), "la Vila Joio...");
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate("Castelló de la Plana", 10), "Castell...");
    }

    #[test]
    fn test_truncate_very_narrow() {
        assert_eq!(truncate("Elx", 2), "El");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(Rate::Defined(1.0 / 3.0)), "0.33");
        assert_eq!(format_rate(Rate::Undefined), "n/a");
    }

    #[test]
    fn test_ranking_table_empty() {
        assert_eq!(format_ranking_table(&[], false), "No municipalities found.");
    }

    #[test]
    fn test_ranking_table_rows() {
        let table = table();
        let rows: Vec<&ScoredMunicipality> = table.rows().iter().collect();
        let result = format_ranking_table(&rows, false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Municipality"));
        assert!(lines[1].contains("1."));
        assert!(lines[1].contains("Alzira"));
        assert!(lines[3].contains("Dos Aguas"));
        assert!(lines[3].contains("n/a"));
    }

    #[test]
    fn test_ranking_tsv() {
        let table = table();
        let rows: Vec<&ScoredMunicipality> = table.rows().iter().collect();
        let result = format_ranking_tsv(&rows);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "Bocairent\t500\t1.0000\t4.0000\t20.0000\t100.0000");
        // Undefined values are empty cells.
        assert_eq!(lines[2], "Dos Aguas\t0\t\t\t\t");
    }

    #[test]
    fn test_comparison_marks_low_population() {
        let table = table();
        let selection = selection(&table, &["Bocairent", "Alzira"]);
        let result = format_comparison(&selection, ValueView::Raw, false);
        assert!(result.contains("Bocairent  (small population"));
        assert!(result.contains("Education: 4.00 (2 total)"));
        assert!(result.contains("Best opportunity index: Bocairent"));
        assert!(!result.contains("Alzira  (small population"));
    }

    #[test]
    fn test_comparison_normalized_view() {
        let table = table();
        let selection = selection(&table, &["Bocairent"]);
        let result = format_comparison(&selection, ValueView::Normalized, false);
        assert!(result.contains("Employment: 1.00 (50 total)"));
        assert!(result.contains("Summary (normalized 0-1)"));
    }

    #[test]
    fn test_comparison_reports_unmatched() {
        let table = table();
        let selection = selection(&table, &["Atlantis"]);
        let result = format_comparison(&selection, ValueView::Raw, false);
        assert!(result.contains("No matching municipalities."));
        assert!(result.contains("Not found: Atlantis"));
    }

    #[test]
    fn test_comparison_tsv() {
        let table = table();
        let selection = selection(&table, &["Bocairent"]);
        assert_eq!(
            format_comparison_tsv(&selection, ValueView::Raw),
            "Bocairent\t500\ttrue\t4.0000\t20.0000\t100.0000\t1.0000"
        );
    }

    #[test]
    fn test_format_json() {
        let table = table();
        let json = format_json(&table.rows()[2]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "Dos Aguas");
        assert!(value["opportunity_index"].is_null());
    }
}
