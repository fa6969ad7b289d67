use std::collections::HashSet;

use serde::Serialize;

use crate::error::ScoringError;
use crate::model::{Indicator, Metric, Rate, ScoredMunicipality};
use crate::scoring::validation::validate_comparison;
use crate::scoring::{ComparisonOptions, MunicipalityTable};

/// A row of a comparison, annotated for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparedMunicipality<'a> {
    #[serde(flatten)]
    pub municipality: &'a ScoredMunicipality,
    /// Population below the configured threshold; ratios may be distorted.
    pub low_reliability: bool,
}

/// How indicator values are shown in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ValueView {
    /// Per 1000 inhabitants.
    #[default]
    Raw,
    /// Scaled 0-1 against the maxima of the whole table.
    Normalized,
}

impl ValueView {
    pub fn toggle(self) -> Self {
        match self {
            ValueView::Raw => ValueView::Normalized,
            ValueView::Normalized => ValueView::Raw,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ValueView::Raw => "per 1000 inhabitants",
            ValueView::Normalized => "normalized 0-1",
        }
    }
}

impl ComparedMunicipality<'_> {
    pub fn value(&self, indicator: Indicator, view: ValueView) -> Rate {
        match view {
            ValueView::Raw => self.municipality.rates.get(indicator),
            ValueView::Normalized => self.municipality.normalized.get(indicator),
        }
    }
}

/// The rows picked for a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection<'a> {
    /// Matching rows in base-table order.
    pub rows: Vec<ComparedMunicipality<'a>>,
    /// Requested names that are not in the table.
    pub unmatched: Vec<String>,
}

/// Result of [`select_comparison_set`].
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonSet<'a> {
    /// Nothing was requested; the caller should prompt for input.
    Empty,
    Selected(Selection<'a>),
}

/// Pick the rows to compare.
///
/// Requested names are treated as a set. More than `options.max_count`
/// distinct names fails with [`ScoringError::TooManySelected`]; no names
/// yields [`ComparisonSet::Empty`].
pub fn select_comparison_set<'a, S: AsRef<str>>(
    table: &'a MunicipalityTable,
    names: &[S],
    options: &ComparisonOptions,
) -> Result<ComparisonSet<'a>, ScoringError> {
    validate_comparison(options)?;

    let mut requested: Vec<&str> = Vec::new();
    let mut seen = HashSet::new();
    for name in names {
        let name = name.as_ref();
        if seen.insert(name) {
            requested.push(name);
        }
    }

    if requested.is_empty() {
        return Ok(ComparisonSet::Empty);
    }
    if requested.len() > options.max_count {
        return Err(ScoringError::TooManySelected {
            requested: requested.len(),
            max: options.max_count,
        });
    }

    let rows: Vec<ComparedMunicipality<'a>> = table
        .rows()
        .iter()
        .filter(|row| seen.contains(row.name()))
        .map(|row| ComparedMunicipality {
            municipality: row,
            low_reliability: row.record.population_total < options.low_population_threshold,
        })
        .collect();

    let unmatched = requested
        .iter()
        .filter(|name| table.get(name).is_none())
        .map(|name| name.to_string())
        .collect();

    log::debug!("comparison selected {} rows", rows.len());

    Ok(ComparisonSet::Selected(Selection { rows, unmatched }))
}

impl<'a> Selection<'a> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn low_reliability_names(&self) -> Vec<&'a str> {
        self.rows
            .iter()
            .filter(|row| row.low_reliability)
            .map(|row| row.municipality.name())
            .collect()
    }

    pub fn municipalities(&self) -> impl Iterator<Item = &'a ScoredMunicipality> + '_ {
        self.rows.iter().map(|row| row.municipality)
    }

    pub fn summary(&self) -> ComparisonSummary<'a> {
        ComparisonSummary {
            best_opportunity: leader(self.municipalities(), Metric::OpportunityIndex),
            most_schools: leader(self.municipalities(), Metric::SchoolsPer1000),
            most_housing: leader(self.municipalities(), Metric::HousingPer1000),
            most_companies: leader(self.municipalities(), Metric::CompaniesPer1000),
        }
    }
}

/// Which compared municipality leads each metric.
///
/// A metric whose values are all undefined has no leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComparisonSummary<'a> {
    pub best_opportunity: Option<&'a str>,
    pub most_schools: Option<&'a str>,
    pub most_housing: Option<&'a str>,
    pub most_companies: Option<&'a str>,
}

/// Highest defined value wins; ties keep the earliest row.
fn leader<'a>(
    rows: impl Iterator<Item = &'a ScoredMunicipality>,
    metric: Metric,
) -> Option<&'a str> {
    let mut best: Option<(&'a ScoredMunicipality, f64)> = None;
    for row in rows {
        if let Rate::Defined(value) = row.metric(metric) {
            match best {
                Some((_, current)) if value <= current => {}
                _ => best = Some((row, value)),
            }
        }
    }
    best.map(|(row, _)| row.name())
}
