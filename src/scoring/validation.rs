use super::config::{ComparisonOptions, Thresholds, Weights, WEIGHT_SUM_TOLERANCE};
use crate::error::ScoringError;
use crate::model::Indicator;

/// Check a weighting policy, collecting every problem found.
pub fn weight_errors(weights: &Weights) -> Vec<String> {
    let mut errors = Vec::new();

    for indicator in Indicator::ALL {
        let value = weights.get(indicator);
        let key = indicator.label().to_lowercase();
        if !value.is_finite() {
            errors.push(format!("weights.{}: must be a finite number", key));
        }
    }

    let sum = weights.sum();
    if errors.is_empty() && (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        errors.push(format!("weights: must sum to 1.0 (got {})", sum));
    }

    errors
}

/// Check minimum thresholds, collecting every problem found.
pub fn threshold_errors(thresholds: &Thresholds) -> Vec<String> {
    let mut errors = Vec::new();

    for indicator in Indicator::ALL {
        if let Some(value) = thresholds.get(indicator) {
            let key = indicator.metric().column();
            if !value.is_finite() {
                errors.push(format!("thresholds.{}: must be a finite number", key));
            } else if value < 0.0 {
                errors.push(format!("thresholds.{}: must be non-negative", key));
            }
        }
    }

    errors
}

pub fn validate_weights(weights: &Weights) -> Result<(), ScoringError> {
    into_result(weight_errors(weights))
}

pub fn validate_thresholds(thresholds: &Thresholds) -> Result<(), ScoringError> {
    into_result(threshold_errors(thresholds))
}

pub fn validate_comparison(options: &ComparisonOptions) -> Result<(), ScoringError> {
    if options.max_count == 0 {
        return Err(ScoringError::Configuration(
            "comparison.max_count: must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn into_result(errors: Vec<String>) -> Result<(), ScoringError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ScoringError::Configuration(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_valid() {
        assert!(validate_weights(&Weights::default()).is_ok());
    }

    #[test]
    fn test_sum_within_tolerance_is_valid() {
        let weights = Weights {
            education: 0.4 + 5e-7,
            housing: 0.3,
            employment: 0.3,
        };
        assert!(validate_weights(&weights).is_ok());
    }

    #[test]
    fn test_sum_outside_tolerance_fails() {
        let weights = Weights {
            education: 0.5,
            housing: 0.3,
            employment: 0.3,
        };
        let err = validate_weights(&weights).unwrap_err();
        assert!(matches!(err, ScoringError::Configuration(ref msg) if msg.contains("sum to 1.0")));
    }

    #[test]
    fn test_negative_weight_summing_to_one_is_valid() {
        let weights = Weights {
            education: 1.2,
            housing: -0.2,
            employment: 0.0,
        };
        assert!(weight_errors(&weights).is_empty());
        assert!(validate_weights(&weights).is_ok());
    }

    #[test]
    fn test_nan_weight_fails() {
        let weights = Weights {
            education: f64::NAN,
            housing: 0.5,
            employment: 0.5,
        };
        assert!(validate_weights(&weights).is_err());
    }

    #[test]
    fn test_negative_threshold_fails() {
        let thresholds = Thresholds {
            schools_per_1000: Some(-1.0),
            housing_per_1000: None,
            companies_per_1000: Some(f64::INFINITY),
        };
        let errors = threshold_errors(&thresholds);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("schools_per_1000"));
        assert!(errors[1].contains("companies_per_1000"));
        assert!(validate_thresholds(&thresholds).is_err());
    }

    #[test]
    fn test_zero_max_count_fails() {
        let options = ComparisonOptions {
            max_count: 0,
            low_population_threshold: 1000,
        };
        assert!(validate_comparison(&options).is_err());
    }
}
