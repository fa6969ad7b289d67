pub mod filter;

pub use filter::{filter_by_minimum_thresholds, rank};
