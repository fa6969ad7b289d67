//! Loading the municipality and educational-center tables from CSV.

pub mod loader;
pub mod store;

pub use loader::{load_centers, load_municipalities, parse_centers, parse_municipalities, Loaded};
pub use store::{DataSources, DataStore, Dataset};
