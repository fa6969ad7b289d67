use std::path::PathBuf;

/// Errors raised by the scoring, comparison and search operations.
///
/// Missing data is never an error here; it surfaces as [`crate::model::Rate::Undefined`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    /// Invalid weights, thresholds or comparison limits.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A comparison request named more municipalities than the limit allows.
    #[error("too many municipalities selected: {requested} (at most {max} can be compared)")]
    TooManySelected { requested: usize, max: usize },

    /// Two rows of the base table share a name.
    #[error("duplicate municipality name: {0}")]
    DuplicateMunicipality(String),
}

/// Errors raised while loading the source tables.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    /// The file lacks columns the loader cannot do without.
    #[error("{path} is missing required columns: {}", columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}
