use serde::{Deserialize, Serialize};

use crate::model::{Indicator, IndicatorRates};

/// Default share of the opportunity index given to education.
pub const DEFAULT_EDUCATION_WEIGHT: f64 = 0.40;
/// Default share of the opportunity index given to housing.
pub const DEFAULT_HOUSING_WEIGHT: f64 = 0.30;
/// Default share of the opportunity index given to employment.
pub const DEFAULT_EMPLOYMENT_WEIGHT: f64 = 0.30;

/// Tolerance when checking that weights add up to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Weighting policy of the opportunity index.
///
/// Passed explicitly to every scoring call so a comparison request can use
/// its own weighting without touching any shared state.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   weights:
///     education: 0.5
///     housing: 0.25
///     employment: 0.25
/// ```
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Weights {
    pub education: f64,
    pub housing: f64,
    pub employment: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            education: DEFAULT_EDUCATION_WEIGHT,
            housing: DEFAULT_HOUSING_WEIGHT,
            employment: DEFAULT_EMPLOYMENT_WEIGHT,
        }
    }
}

impl Weights {
    pub fn get(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::Education => self.education,
            Indicator::Housing => self.housing,
            Indicator::Employment => self.employment,
        }
    }

    pub fn sum(&self) -> f64 {
        self.education + self.housing + self.employment
    }
}

/// Minimum acceptable per-1000 rates for a search.
///
/// An absent threshold imposes no constraint.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Thresholds {
    #[serde(default)]
    pub schools_per_1000: Option<f64>,
    #[serde(default)]
    pub housing_per_1000: Option<f64>,
    #[serde(default)]
    pub companies_per_1000: Option<f64>,
}

impl Thresholds {
    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::Education => self.schools_per_1000,
            Indicator::Housing => self.housing_per_1000,
            Indicator::Employment => self.companies_per_1000,
        }
    }

    pub fn set(&mut self, indicator: Indicator, value: Option<f64>) {
        match indicator {
            Indicator::Education => self.schools_per_1000 = value,
            Indicator::Housing => self.housing_per_1000 = value,
            Indicator::Employment => self.companies_per_1000 = value,
        }
    }

    /// True when every supplied threshold is met by the matching rate.
    pub fn admits(&self, rates: &IndicatorRates) -> bool {
        Indicator::ALL.iter().all(|indicator| match self.get(*indicator) {
            Some(minimum) => rates.get(*indicator).meets(minimum),
            None => true,
        })
    }

    pub fn is_empty(&self) -> bool {
        Indicator::ALL.iter().all(|i| self.get(*i).is_none())
    }
}

/// Maximum number of municipalities a comparison may hold.
pub const MAX_COMPARED: usize = 3;
/// Populations below this are flagged as low-reliability in comparisons.
pub const DEFAULT_LOW_POPULATION_THRESHOLD: u64 = 1000;

/// Limits applied by [`crate::compare::select_comparison_set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonOptions {
    pub max_count: usize,
    pub low_population_threshold: u64,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            max_count: MAX_COMPARED,
            low_population_threshold: DEFAULT_LOW_POPULATION_THRESHOLD,
        }
    }
}
