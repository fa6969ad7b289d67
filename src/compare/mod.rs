pub mod selection;

pub use selection::{
    select_comparison_set, ComparedMunicipality, ComparisonSet, ComparisonSummary, Selection,
    ValueView,
};
