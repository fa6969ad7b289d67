use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A derived numeric value that may be undefined.
///
/// Zero-population rows and zero reference maxima produce `Undefined`
/// instead of `0`, `NaN` or infinity. Every computation that consumes an
/// undefined input yields an undefined output.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Rate {
    Defined(f64),
    #[default]
    Undefined,
}

impl Rate {
    /// Wrap a float, mapping non-finite values to `Undefined`.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Rate::Defined(value)
        } else {
            Rate::Undefined
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Rate::Defined(v) => Some(v),
            Rate::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Rate::Defined(_))
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Rate::Defined(v) => Rate::from_f64(f(v)),
            Rate::Undefined => Rate::Undefined,
        }
    }

    /// True when the value is defined and at least `minimum`.
    pub fn meets(self, minimum: f64) -> bool {
        matches!(self, Rate::Defined(v) if v >= minimum)
    }

    /// Descending order with undefined values after every defined one.
    pub fn cmp_desc_undefined_last(self, other: Self) -> Ordering {
        match (self, other) {
            (Rate::Defined(a), Rate::Defined(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
            (Rate::Defined(_), Rate::Undefined) => Ordering::Less,
            (Rate::Undefined, Rate::Defined(_)) => Ordering::Greater,
            (Rate::Undefined, Rate::Undefined) => Ordering::Equal,
        }
    }
}

impl From<Option<f64>> for Rate {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Rate::Undefined, Rate::from_f64)
    }
}

impl From<Rate> for Option<f64> {
    fn from(rate: Rate) -> Self {
        rate.value()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Precision applies to the number only; width right-aligns both forms.
        let text = match (self, f.precision()) {
            (Rate::Defined(v), Some(p)) => format!("{:.*}", p, v),
            (Rate::Defined(v), None) => v.to_string(),
            (Rate::Undefined, _) => "n/a".to_string(),
        };
        match f.width() {
            Some(width) => write!(f, "{:>width$}", text, width = width),
            None => f.write_str(&text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_becomes_undefined() {
        assert_eq!(Rate::from_f64(f64::NAN), Rate::Undefined);
        assert_eq!(Rate::from_f64(f64::INFINITY), Rate::Undefined);
        assert_eq!(Rate::from_f64(2.5), Rate::Defined(2.5));
    }

    #[test]
    fn test_map_propagates_undefined() {
        assert_eq!(Rate::Undefined.map(|v| v * 2.0), Rate::Undefined);
        assert_eq!(Rate::Defined(2.0).map(|v| v * 2.0), Rate::Defined(4.0));
    }

    #[test]
    fn test_undefined_never_meets_threshold() {
        assert!(!Rate::Undefined.meets(0.0));
        assert!(Rate::Defined(0.0).meets(0.0));
        assert!(!Rate::Defined(0.9).meets(1.0));
    }

    #[test]
    fn test_descending_order_puts_undefined_last() {
        let mut rates = vec![
            Rate::Undefined,
            Rate::Defined(0.2),
            Rate::Defined(0.9),
            Rate::Undefined,
            Rate::Defined(0.5),
        ];
        rates.sort_by(|a, b| a.cmp_desc_undefined_last(*b));
        assert_eq!(
            rates,
            vec![
                Rate::Defined(0.9),
                Rate::Defined(0.5),
                Rate::Defined(0.2),
                Rate::Undefined,
                Rate::Undefined,
            ]
        );
    }

    #[test]
    fn test_serializes_as_nullable_number() {
        let json = serde_json::to_string(&vec![Rate::Defined(1.5), Rate::Undefined]).unwrap();
        assert_eq!(json, "[1.5,null]");
        let parsed: Vec<Rate> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![Rate::Defined(1.5), Rate::Undefined]);
    }

    #[test]
    fn test_display_with_precision() {
        assert_eq!(format!("{:.2}", Rate::Defined(4.0)), "4.00");
        assert_eq!(format!("{:>5}", Rate::Undefined), "  n/a");
        assert_eq!(format!("{:7.1}", Rate::Defined(20.0)), "   20.0");
        assert_eq!(format!("{:5.2}", Rate::Undefined), "  n/a");
    }
}
