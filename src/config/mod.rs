mod init;
mod schema;

pub use init::run_init_wizard;
pub use schema::{
    ComparisonConfig, Config, DataConfig, ScoringConfig, DEFAULT_AUTO_REFRESH_INTERVAL,
};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::scoring::{threshold_errors, weight_errors};

/// Get the config directory path (~/.config/muni-compass/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("muni-compass"))
}

/// Get the default config file path (~/.config/muni-compass/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path
///   (~/.config/muni-compass/config.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
///
/// A missing file at the default path is not an error; defaults are used.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = match path {
        Some(p) => p,
        None => get_config_path()?,
    };

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        log::debug!("No config at {}, using defaults", config_path.display());
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| {
            format!("Failed to parse config: invalid YAML in {}", config_path.display())
        })?;

    log::debug!("Loaded config from {}", config_path.display());
    Ok(config)
}

/// Check every section, collecting all problems.
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = weight_errors(&config.scoring.weights)
        .into_iter()
        .map(|e| format!("scoring.{}", e))
        .collect::<Vec<_>>();

    errors.extend(
        threshold_errors(&config.search)
            .into_iter()
            .map(|e| e.replacen("thresholds.", "search.", 1)),
    );

    if config.auto_refresh_interval == 0 {
        errors.push("auto_refresh_interval: must be at least 1 second".to_string());
    }
    if config.data.municipalities.as_os_str().is_empty() {
        errors.push("data.municipalities: must not be empty".to_string());
    }
    if config.data.centers.as_os_str().is_empty() {
        errors.push("data.centers: must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let path = env::temp_dir().join("muni_compass_test_missing_config.yaml");
        let _ = fs::remove_file(&path);
        let err = load_config(Some(path)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_explicit_path() {
        let path = env::temp_dir().join("muni_compass_test_config.yaml");
        let contents = "auto_refresh_interval: 5\ncomparison:\n  low_population_threshold: 250\n";
        fs::write(&path, contents).unwrap();
        let config = load_config(Some(path.clone())).unwrap();
        assert_eq!(config.auto_refresh_interval, 5);
        assert_eq!(config.comparison.low_population_threshold, 250);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_invalid_yaml_fails() {
        let path = env::temp_dir().join("muni_compass_test_invalid_config.yaml");
        fs::write(&path, "scoring:\n  weights:\n    culture: 1.0\n").unwrap();
        let err = load_config(Some(path.clone())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = Config::default();
        config.scoring.weights.housing = f64::NAN;
        config.search.companies_per_1000 = Some(-1.0);
        config.auto_refresh_interval = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&"scoring.weights.housing: must be a finite number".to_string()));
        assert!(errors.contains(&"search.companies_per_1000: must be non-negative".to_string()));
    }

    #[test]
    fn test_validate_weight_sum() {
        let mut config = Config::default();
        config.scoring.weights.education = 0.5;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("scoring.weights: must sum to 1.0"));
    }
}
