pub mod config;
pub mod engine;
pub mod validation;

pub use config::*;
pub use engine::{
    compute_opportunity_index, compute_rates, normalize_to_reference, MunicipalityTable,
    ReferenceMaxima,
};
pub use validation::{
    threshold_errors, validate_comparison, validate_thresholds, validate_weights, weight_errors,
};
