use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::legend::Tritone;
use crate::scoring::{
    ComparisonOptions, Thresholds, Weights, DEFAULT_LOW_POPULATION_THRESHOLD, MAX_COMPARED,
};

/// Default seconds between checks for changed data files.
pub const DEFAULT_AUTO_REFRESH_INTERVAL: u64 = 30;

/// Top-level configuration file.
///
/// Every section is optional; missing sections take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    /// Starting values of the dashboard search thresholds.
    #[serde(default = "default_search")]
    pub search: Thresholds,
    #[serde(default)]
    pub legend: Tritone,
    #[serde(default = "default_auto_refresh_interval")]
    pub auto_refresh_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            scoring: ScoringConfig::default(),
            comparison: ComparisonConfig::default(),
            search: default_search(),
            legend: Tritone::default(),
            auto_refresh_interval: DEFAULT_AUTO_REFRESH_INTERVAL,
        }
    }
}

fn default_auto_refresh_interval() -> u64 {
    DEFAULT_AUTO_REFRESH_INTERVAL
}

fn default_search() -> Thresholds {
    Thresholds {
        schools_per_1000: Some(1.0),
        housing_per_1000: Some(1.0),
        companies_per_1000: Some(100.0),
    }
}

/// Locations of the two source tables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    #[serde(default = "default_municipalities_path")]
    pub municipalities: PathBuf,
    #[serde(default = "default_centers_path")]
    pub centers: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            municipalities: default_municipalities_path(),
            centers: default_centers_path(),
        }
    }
}

fn default_municipalities_path() -> PathBuf {
    PathBuf::from("data/indicadores_municipios.csv")
}

fn default_centers_path() -> PathBuf {
    PathBuf::from("data/centroseducativos_filtrados.csv")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: Weights,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ComparisonConfig {
    #[serde(default = "default_low_population_threshold")]
    pub low_population_threshold: u64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            low_population_threshold: DEFAULT_LOW_POPULATION_THRESHOLD,
        }
    }
}

fn default_low_population_threshold() -> u64 {
    DEFAULT_LOW_POPULATION_THRESHOLD
}

impl ComparisonConfig {
    /// The comparison cap is fixed; only the reliability threshold is configurable.
    pub fn options(&self) -> ComparisonOptions {
        ComparisonOptions {
            max_count: MAX_COMPARED,
            low_population_threshold: self.low_population_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legend::Rgb;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.search.companies_per_1000, Some(100.0));
        assert_eq!(config.auto_refresh_interval, 30);
    }

    #[test]
    fn test_partial_sections() {
        let yaml = r##"
data:
  municipalities: /srv/indicadores.csv
scoring:
  weights:
    education: 0.5
    housing: 0.25
    employment: 0.25
legend:
  low: "#000000"
  mid: "#808080"
  high: "#FFFFFF"
  alpha: 255
"##;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.data.municipalities, PathBuf::from("/srv/indicadores.csv"));
        assert_eq!(config.data.centers, default_centers_path());
        assert_eq!(config.scoring.weights.education, 0.5);
        assert_eq!(config.legend.high, Rgb(0xFF, 0xFF, 0xFF));
        assert_eq!(config.comparison.low_population_threshold, 1000);
    }

    #[test]
    fn test_search_section_replaces_defaults() {
        let yaml = "search:\n  housing_per_1000: 2.5\n";
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.search.housing_per_1000, Some(2.5));
        // A written section is taken as-is.
        assert_eq!(config.search.schools_per_1000, None);
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let result: Result<Config, _> = serde_saphyr::from_str("queries: []\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_comparison_options() {
        let config = ComparisonConfig {
            low_population_threshold: 500,
        };
        let options = config.options();
        assert_eq!(options.max_count, 3);
        assert_eq!(options.low_population_threshold, 500);
    }

    #[test]
    fn test_config_yaml_roundtrip() {
        let config = Config::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: Config = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}
