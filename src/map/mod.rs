//! Point layers for the municipality and educational-center maps.
//!
//! Rendering is left to the caller; these functions only decide which rows
//! become points, where they go and what color they get.

pub mod centers;
pub mod municipalities;

pub use centers::{center_points, locality_markers, regimes, CenterPoint, LocalityMarker};
pub use municipalities::{municipality_layer, MapPoint, MunicipalityLayer};

use serde::Serialize;

/// Geographic extent of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    /// Mean position, used to center the view.
    pub center_lat: f64,
    pub center_lon: f64,
}

impl Bounds {
    /// `None` for an empty point set.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut count = 0usize;
        let mut bounds = Bounds {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            center_lat: 0.0,
            center_lon: 0.0,
        };
        for (lat, lon) in points {
            count += 1;
            bounds.min_lat = bounds.min_lat.min(lat);
            bounds.max_lat = bounds.max_lat.max(lat);
            bounds.min_lon = bounds.min_lon.min(lon);
            bounds.max_lon = bounds.max_lon.max(lon);
            bounds.center_lat += lat;
            bounds.center_lon += lon;
        }
        if count == 0 {
            return None;
        }
        bounds.center_lat /= count as f64;
        bounds.center_lon /= count as f64;
        Some(bounds)
    }
}
