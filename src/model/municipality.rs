use serde::{Deserialize, Serialize};

use super::rate::Rate;

/// One row of the municipality table, as loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityRecord {
    pub name: String,
    pub population_total: u64,
    pub school_count_total: u64,
    pub housing_offer_total: u64,
    pub company_count_total: u64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl MunicipalityRecord {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// The three per-indicator values of a municipality, either per 1000
/// inhabitants or scaled to 0-1 against the reference maxima.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorRates {
    pub schools_per_1000: Rate,
    pub housing_per_1000: Rate,
    pub companies_per_1000: Rate,
}

impl IndicatorRates {
    pub fn get(&self, indicator: Indicator) -> Rate {
        match indicator {
            Indicator::Education => self.schools_per_1000,
            Indicator::Housing => self.housing_per_1000,
            Indicator::Employment => self.companies_per_1000,
        }
    }

    pub fn all_defined(&self) -> bool {
        Indicator::ALL.iter().all(|i| self.get(*i).is_defined())
    }
}

/// A municipality with every derived field computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMunicipality {
    #[serde(flatten)]
    pub record: MunicipalityRecord,
    #[serde(flatten)]
    pub rates: IndicatorRates,
    #[serde(skip)]
    pub normalized: IndicatorRates,
    pub opportunity_index: Rate,
}

impl ScoredMunicipality {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn metric(&self, metric: Metric) -> Rate {
        match metric {
            Metric::SchoolsPer1000 => self.rates.schools_per_1000,
            Metric::HousingPer1000 => self.rates.housing_per_1000,
            Metric::CompaniesPer1000 => self.rates.companies_per_1000,
            Metric::OpportunityIndex => self.opportunity_index,
        }
    }

    pub fn raw_count(&self, indicator: Indicator) -> u64 {
        match indicator {
            Indicator::Education => self.record.school_count_total,
            Indicator::Housing => self.record.housing_offer_total,
            Indicator::Employment => self.record.company_count_total,
        }
    }
}

/// The three indicator families that feed the opportunity index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    Education,
    Housing,
    Employment,
}

impl Indicator {
    pub const ALL: [Indicator; 3] = [
        Indicator::Education,
        Indicator::Housing,
        Indicator::Employment,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Indicator::Education => "Education",
            Indicator::Housing => "Housing",
            Indicator::Employment => "Employment",
        }
    }

    pub fn count_label(self) -> &'static str {
        match self {
            Indicator::Education => "Schools",
            Indicator::Housing => "Housing offers",
            Indicator::Employment => "Companies",
        }
    }

    pub fn metric(self) -> Metric {
        match self {
            Indicator::Education => Metric::SchoolsPer1000,
            Indicator::Housing => Metric::HousingPer1000,
            Indicator::Employment => Metric::CompaniesPer1000,
        }
    }
}

/// Any value a map or ranking can be drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[value(name = "schools")]
    SchoolsPer1000,
    #[value(name = "housing")]
    HousingPer1000,
    #[value(name = "companies")]
    CompaniesPer1000,
    #[value(name = "opportunity")]
    OpportunityIndex,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::SchoolsPer1000,
        Metric::HousingPer1000,
        Metric::CompaniesPer1000,
        Metric::OpportunityIndex,
    ];

    /// Column name used in exported tables.
    pub fn column(self) -> &'static str {
        match self {
            Metric::SchoolsPer1000 => "schools_per_1000",
            Metric::HousingPer1000 => "housing_per_1000",
            Metric::CompaniesPer1000 => "companies_per_1000",
            Metric::OpportunityIndex => "opportunity_index",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::SchoolsPer1000 => "Schools / 1000 inh.",
            Metric::HousingPer1000 => "Housing offers / 1000 inh.",
            Metric::CompaniesPer1000 => "Companies / 1000 inh.",
            Metric::OpportunityIndex => "Opportunity index",
        }
    }

    pub fn next(self) -> Self {
        let idx = Metric::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Metric::ALL[(idx + 1) % Metric::ALL.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MunicipalityRecord {
        MunicipalityRecord {
            name: "Alzira".to_string(),
            population_total: 44_000,
            school_count_total: 30,
            housing_offer_total: 120,
            company_count_total: 2_900,
            latitude: Some(39.15),
            longitude: Some(-0.43),
        }
    }

    #[test]
    fn test_coordinates_require_both_values() {
        let mut r = record();
        assert_eq!(r.coordinates(), Some((39.15, -0.43)));
        r.longitude = None;
        assert_eq!(r.coordinates(), None);
    }

    #[test]
    fn test_all_defined() {
        let mut rates = IndicatorRates {
            schools_per_1000: Rate::Defined(1.0),
            housing_per_1000: Rate::Defined(2.0),
            companies_per_1000: Rate::Defined(3.0),
        };
        assert!(rates.all_defined());
        rates.housing_per_1000 = Rate::Undefined;
        assert!(!rates.all_defined());
    }

    #[test]
    fn test_metric_cycle_wraps() {
        assert_eq!(Metric::SchoolsPer1000.next(), Metric::HousingPer1000);
        assert_eq!(Metric::OpportunityIndex.next(), Metric::SchoolsPer1000);
    }

    #[test]
    fn test_indicator_metric_mapping() {
        assert_eq!(Indicator::Employment.metric(), Metric::CompaniesPer1000);
        assert_eq!(Indicator::Education.metric().column(), "schools_per_1000");
    }
}
