use std::collections::HashSet;

use super::config::Weights;
use super::validation::validate_weights;
use crate::error::ScoringError;
use crate::model::{Indicator, IndicatorRates, MunicipalityRecord, Rate, ScoredMunicipality};

/// Turn the raw counts of a record into rates per 1000 inhabitants.
///
/// A zero population leaves all three rates undefined.
pub fn compute_rates(record: &MunicipalityRecord) -> IndicatorRates {
    let per_1000 = |count: u64| -> Rate {
        if record.population_total == 0 {
            Rate::Undefined
        } else {
            // Scale before dividing so exact ratios stay exact.
            Rate::from_f64(count as f64 * 1000.0 / record.population_total as f64)
        }
    };

    IndicatorRates {
        schools_per_1000: per_1000(record.school_count_total),
        housing_per_1000: per_1000(record.housing_offer_total),
        companies_per_1000: per_1000(record.company_count_total),
    }
}

/// Divide each value by `reference_max`, clamped to `[0, 1]`.
///
/// A non-positive reference maximum makes every output undefined.
pub fn normalize_to_reference(values: &[Rate], reference_max: f64) -> Vec<Rate> {
    values
        .iter()
        .map(|value| normalize_one(*value, reference_max))
        .collect()
}

fn normalize_one(value: Rate, reference_max: f64) -> Rate {
    if !(reference_max.is_finite() && reference_max > 0.0) {
        return Rate::Undefined;
    }
    value.map(|v| (v / reference_max).clamp(0.0, 1.0))
}

/// Maximum of each per-1000 rate across a whole base table.
///
/// Normalizing against the full table rather than a compared subset keeps
/// the meaning of `1.0` fixed across searches.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReferenceMaxima {
    pub schools_per_1000: f64,
    pub housing_per_1000: f64,
    pub companies_per_1000: f64,
}

impl ReferenceMaxima {
    /// Undefined rates are skipped; an indicator with no defined rate gets `0`.
    pub fn from_rates<'a>(rates: impl IntoIterator<Item = &'a IndicatorRates>) -> Self {
        let mut maxima = ReferenceMaxima::default();
        for r in rates {
            maxima.schools_per_1000 = max_defined(maxima.schools_per_1000, r.schools_per_1000);
            maxima.housing_per_1000 = max_defined(maxima.housing_per_1000, r.housing_per_1000);
            maxima.companies_per_1000 =
                max_defined(maxima.companies_per_1000, r.companies_per_1000);
        }
        maxima
    }

    pub fn get(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::Education => self.schools_per_1000,
            Indicator::Housing => self.housing_per_1000,
            Indicator::Employment => self.companies_per_1000,
        }
    }

    /// Scale a set of rates to `[0, 1]` against these maxima.
    pub fn normalize(&self, rates: &IndicatorRates) -> IndicatorRates {
        IndicatorRates {
            schools_per_1000: normalize_one(rates.schools_per_1000, self.schools_per_1000),
            housing_per_1000: normalize_one(rates.housing_per_1000, self.housing_per_1000),
            companies_per_1000: normalize_one(rates.companies_per_1000, self.companies_per_1000),
        }
    }
}

fn max_defined(current: f64, candidate: Rate) -> f64 {
    match candidate {
        Rate::Defined(v) if v > current => v,
        _ => current,
    }
}

/// Weighted composite of the normalized rates.
///
/// Fails when the weights are invalid. The index is undefined unless all
/// three normalized rates are defined.
pub fn compute_opportunity_index(
    rates: &IndicatorRates,
    maxima: &ReferenceMaxima,
    weights: &Weights,
) -> Result<Rate, ScoringError> {
    validate_weights(weights)?;
    Ok(weighted_index(&maxima.normalize(rates), weights))
}

fn weighted_index(normalized: &IndicatorRates, weights: &Weights) -> Rate {
    let mut index = 0.0;
    for indicator in Indicator::ALL {
        match normalized.get(indicator) {
            Rate::Defined(v) => index += weights.get(indicator) * v,
            Rate::Undefined => return Rate::Undefined,
        }
    }
    Rate::from_f64(index)
}

/// The immutable base table with every derived field computed.
///
/// Comparisons, searches and maps all read from this table and produce new
/// views; rows are never modified after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MunicipalityTable {
    rows: Vec<ScoredMunicipality>,
    maxima: ReferenceMaxima,
    weights: Weights,
}

impl MunicipalityTable {
    pub fn build(
        records: Vec<MunicipalityRecord>,
        weights: &Weights,
    ) -> Result<Self, ScoringError> {
        validate_weights(weights)?;

        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.name.as_str()) {
                return Err(ScoringError::DuplicateMunicipality(record.name.clone()));
            }
        }

        let rated: Vec<(MunicipalityRecord, IndicatorRates)> = records
            .into_iter()
            .map(|record| {
                let rates = compute_rates(&record);
                (record, rates)
            })
            .collect();

        let maxima = ReferenceMaxima::from_rates(rated.iter().map(|(_, rates)| rates));
        let rows = rated
            .into_iter()
            .map(|(record, rates)| score_row(record, rates, &maxima, weights))
            .collect();

        Ok(Self {
            rows,
            maxima,
            weights: *weights,
        })
    }

    /// Recompute the opportunity index under a different weighting policy.
    pub fn rescore(&self, weights: &Weights) -> Result<Self, ScoringError> {
        validate_weights(weights)?;
        let rows = self
            .rows
            .iter()
            .map(|row| score_row(row.record.clone(), row.rates, &self.maxima, weights))
            .collect();
        Ok(Self {
            rows,
            maxima: self.maxima,
            weights: *weights,
        })
    }

    /// Rows in source order.
    pub fn rows(&self) -> &[ScoredMunicipality] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ScoredMunicipality> {
        self.rows.iter().find(|row| row.record.name == name)
    }

    pub fn maxima(&self) -> &ReferenceMaxima {
        &self.maxima
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.record.name.as_str())
    }
}

fn score_row(
    record: MunicipalityRecord,
    rates: IndicatorRates,
    maxima: &ReferenceMaxima,
    weights: &Weights,
) -> ScoredMunicipality {
    let normalized = maxima.normalize(&rates);
    let opportunity_index = weighted_index(&normalized, weights);
    ScoredMunicipality {
        record,
        rates,
        normalized,
        opportunity_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn test_rates_per_1000() {
        let rates = compute_rates(&record("A", 500, 2, 10, 50));
        assert_eq!(rates.schools_per_1000, Rate::Defined(4.0));
        assert_eq!(rates.housing_per_1000, Rate::Defined(20.0));
        assert_eq!(rates.companies_per_1000, Rate::Defined(100.0));
    }

    #[test]
    fn test_zero_population_rates_are_undefined() {
        let rates = compute_rates(&record("B", 0, 3, 4, 5));
        assert_eq!(rates.schools_per_1000, Rate::Undefined);
        assert_eq!(rates.housing_per_1000, Rate::Undefined);
        assert_eq!(rates.companies_per_1000, Rate::Undefined);
    }

    #[test]
    fn test_zero_counts_are_defined_zero() {
        let rates = compute_rates(&record("C", 1200, 0, 0, 0));
        assert_eq!(rates.schools_per_1000, Rate::Defined(0.0));
    }

    #[test]
    fn test_normalize_to_reference() {
        let values = [
            Rate::Defined(100.0),
            Rate::Defined(200.0),
            Rate::Defined(0.0),
            Rate::Undefined,
        ];
        let normalized = normalize_to_reference(&values, 200.0);
        assert_eq!(
            normalized,
            vec![Rate::Defined(0.5), Rate::Defined(1.0), Rate::Defined(0.0), Rate::Undefined]
        );
    }

    #[test]
    fn test_normalize_zero_max_is_undefined() {
        let values = [Rate::Defined(0.0), Rate::Defined(3.0)];
        let normalized = normalize_to_reference(&values, 0.0);
        assert!(normalized.iter().all(|r| *r == Rate::Undefined));
    }

    #[test]
    fn test_normalize_stays_in_unit_interval() {
        let values: Vec<Rate> = (0..50).map(|i| Rate::Defined(i as f64 * 7.3)).collect();
        for reference_max in [1.0, 13.0, 357.7, 1e6] {
            for rate in normalize_to_reference(&values, reference_max) {
                let v = rate.value().unwrap();
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_normalize_is_bit_identical_on_repeat() {
        let values = [Rate::Defined(1.0 / 3.0), Rate::Defined(0.1 + 0.2)];
        let first = normalize_to_reference(&values, 0.7);
        let second = normalize_to_reference(&values, 0.7);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.value().unwrap().to_bits(), b.value().unwrap().to_bits());
        }
    }

    #[test]
    fn test_reference_maxima_skip_undefined() {
        let rates = [
            compute_rates(&record("A", 1000, 2, 10, 200)),
            compute_rates(&record("B", 0, 9, 9, 9)),
            compute_rates(&record("C", 2000, 2, 10, 200)),
        ];
        let maxima = ReferenceMaxima::from_rates(rates.iter());
        assert_eq!(maxima.schools_per_1000, 2.0);
        assert_eq!(maxima.housing_per_1000, 10.0);
        assert_eq!(maxima.companies_per_1000, 200.0);
    }

    #[test]
    fn test_normalized_against_base_population_max() {
        let table = MunicipalityTable::build(
            vec![record("Max", 1000, 1, 1, 200), record("C", 1000, 1, 1, 100)],
            &Weights::default(),
        )
        .unwrap();
        let c = table.get("C").unwrap();
        assert_eq!(c.normalized.companies_per_1000, Rate::Defined(0.5));
    }

    #[test]
    fn test_opportunity_index_weighted_sum() {
        let maxima = ReferenceMaxima {
            schools_per_1000: 10.0,
            housing_per_1000: 40.0,
            companies_per_1000: 200.0,
        };
        let rates = IndicatorRates {
            schools_per_1000: Rate::Defined(5.0),
            housing_per_1000: Rate::Defined(40.0),
            companies_per_1000: Rate::Defined(0.0),
        };
        let index = compute_opportunity_index(&rates, &maxima, &Weights::default()).unwrap();
        // 0.4 * 0.5 + 0.3 * 1.0 + 0.3 * 0.0
        assert!((index.value().unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_opportunity_index_undefined_when_any_rate_undefined() {
        let maxima = ReferenceMaxima {
            schools_per_1000: 10.0,
            housing_per_1000: 40.0,
            companies_per_1000: 200.0,
        };
        let rates = IndicatorRates {
            schools_per_1000: Rate::Defined(5.0),
            housing_per_1000: Rate::Undefined,
            companies_per_1000: Rate::Defined(10.0),
        };
        let index = compute_opportunity_index(&rates, &maxima, &Weights::default()).unwrap();
        assert_eq!(index, Rate::Undefined);
    }

    #[test]
    fn test_opportunity_index_undefined_when_reference_max_zero() {
        let maxima = ReferenceMaxima {
            schools_per_1000: 0.0,
            housing_per_1000: 40.0,
            companies_per_1000: 200.0,
        };
        let rates = IndicatorRates {
            schools_per_1000: Rate::Defined(0.0),
            housing_per_1000: Rate::Defined(1.0),
            companies_per_1000: Rate::Defined(1.0),
        };
        let index = compute_opportunity_index(&rates, &maxima, &Weights::default()).unwrap();
        assert_eq!(index, Rate::Undefined);
    }

    #[test]
    fn test_opportunity_index_weight_tolerance() {
        let maxima = ReferenceMaxima {
            schools_per_1000: 1.0,
            housing_per_1000: 1.0,
            companies_per_1000: 1.0,
        };
        let rates = IndicatorRates {
            schools_per_1000: Rate::Defined(1.0),
            housing_per_1000: Rate::Defined(1.0),
            companies_per_1000: Rate::Defined(1.0),
        };

        let near = Weights {
            education: 0.3333333,
            housing: 0.3333333,
            employment: 0.3333334,
        };
        assert!(compute_opportunity_index(&rates, &maxima, &near).is_ok());

        let off = Weights {
            education: 0.34,
            housing: 0.33,
            employment: 0.34,
        };
        let err = compute_opportunity_index(&rates, &maxima, &off).unwrap_err();
        assert!(matches!(err, ScoringError::Configuration(_)));
    }

    #[test]
    fn test_opportunity_index_accepts_negative_weight_summing_to_one() {
        let maxima = ReferenceMaxima {
            schools_per_1000: 10.0,
            housing_per_1000: 10.0,
            companies_per_1000: 10.0,
        };
        let rates = IndicatorRates {
            schools_per_1000: Rate::Defined(10.0),
            housing_per_1000: Rate::Defined(5.0),
            companies_per_1000: Rate::Defined(0.0),
        };

        let skewed = Weights {
            education: 1.2,
            housing: -0.2,
            employment: 0.0,
        };
        let index = compute_opportunity_index(&rates, &maxima, &skewed).unwrap();
        // 1.2 * 1.0 - 0.2 * 0.5 + 0.0 * 0.0
        assert!((index.value().unwrap() - 1.1).abs() < 1e-12);

        let over = Weights {
            education: 0.5,
            housing: 0.3,
            employment: 0.3,
        };
        assert!(matches!(
            compute_opportunity_index(&rates, &maxima, &over),
            Err(ScoringError::Configuration(_))
        ));
    }

    #[test]
    fn test_table_zero_population_row() {
        let table = MunicipalityTable::build(
            vec![record("A", 500, 2, 10, 50), record("B", 0, 1, 1, 1)],
            &Weights::default(),
        )
        .unwrap();
        let b = table.get("B").unwrap();
        assert_eq!(b.rates, IndicatorRates::default());
        assert_eq!(b.opportunity_index, Rate::Undefined);

        // A holds every maximum, so its index is the weight sum.
        let a = table.get("A").unwrap();
        assert!((a.opportunity_index.value().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_table_rejects_duplicate_names() {
        let err = MunicipalityTable::build(
            vec![record("A", 500, 2, 10, 50), record("A", 600, 1, 1, 1)],
            &Weights::default(),
        )
        .unwrap_err();
        assert_eq!(err, ScoringError::DuplicateMunicipality("A".to_string()));
    }

    #[test]
    fn test_table_rejects_bad_weights() {
        let weights = Weights {
            education: 1.0,
            housing: 1.0,
            employment: 1.0,
        };
        assert!(MunicipalityTable::build(vec![], &weights).is_err());
    }

    #[test]
    fn test_table_build_is_deterministic() {
        let records = vec![
            record("A", 1234, 3, 17, 90),
            record("B", 98765, 41, 202, 7001),
            record("C", 0, 0, 0, 0),
        ];
        let first = MunicipalityTable::build(records.clone(), &Weights::default()).unwrap();
        let second = MunicipalityTable::build(records, &Weights::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rescore_keeps_rates_and_changes_index() {
        let table = MunicipalityTable::build(
            vec![record("A", 1000, 10, 0, 0), record("B", 1000, 0, 10, 10)],
            &Weights::default(),
        )
        .unwrap();
        let education_only = Weights {
            education: 1.0,
            housing: 0.0,
            employment: 0.0,
        };
        let rescored = table.rescore(&education_only).unwrap();

        assert_eq!(rescored.get("A").unwrap().rates, table.get("A").unwrap().rates);
        assert_eq!(rescored.get("A").unwrap().opportunity_index, Rate::Defined(1.0));
        assert_eq!(rescored.get("B").unwrap().opportunity_index, Rate::Defined(0.0));
        assert_eq!(rescored.weights(), &education_only);
    }
}
