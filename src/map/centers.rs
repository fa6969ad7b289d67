use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::legend::{Rgba, Tritone, FALLBACK};
use crate::model::{EducationalCenterRecord, Rate, Regime};

/// Distinct regimes present in the table, in a stable order.
pub fn regimes(centers: &[EducationalCenterRecord]) -> Vec<Regime> {
    centers
        .iter()
        .map(|c| c.regime.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// All centers of one regime in one locality, collapsed to a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalityMarker {
    pub locality: String,
    pub center_count: usize,
    pub latitude: f64,
    pub longitude: f64,
    /// Center count scaled between the smallest and largest locality.
    pub ratio: Rate,
    pub color: Rgba,
}

/// Group the centers of `regime` by locality, sorted by locality name.
///
/// Centers without coordinates are left out. When every locality holds the
/// same number of centers the ratio is undefined and markers use the
/// fallback color.
pub fn locality_markers(
    centers: &[EducationalCenterRecord],
    regime: &Regime,
    scale: &Tritone,
) -> Vec<LocalityMarker> {
    // locality -> (count, lat sum, lon sum)
    let mut groups: BTreeMap<&str, (usize, f64, f64)> = BTreeMap::new();
    for center in centers.iter().filter(|c| &c.regime == regime) {
        if let Some((lat, lon)) = center.coordinates() {
            let entry = groups.entry(center.locality.as_str()).or_insert((0, 0.0, 0.0));
            entry.0 += 1;
            entry.1 += lat;
            entry.2 += lon;
        }
    }

    let min = groups.values().map(|g| g.0).min().unwrap_or(0);
    let max = groups.values().map(|g| g.0).max().unwrap_or(0);

    groups
        .into_iter()
        .map(|(locality, (count, lat_sum, lon_sum))| {
            let ratio = if max > min {
                Rate::Defined((count - min) as f64 / (max - min) as f64)
            } else {
                Rate::Undefined
            };
            let color = match ratio {
                Rate::Defined(t) => scale.color_at(t),
                Rate::Undefined => FALLBACK,
            };
            LocalityMarker {
                locality: locality.to_string(),
                center_count: count,
                latitude: lat_sum / count as f64,
                longitude: lon_sum / count as f64,
                ratio,
                color,
            }
        })
        .collect()
}

/// A single center on the detailed map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterPoint<'a> {
    pub name: &'a str,
    pub kind: Option<&'a str>,
    pub latitude: f64,
    pub longitude: f64,
    pub color: Rgba,
}

/// Centers of `regime` with coordinates, colored by regime.
pub fn center_points<'a>(
    centers: &'a [EducationalCenterRecord],
    regime: &Regime,
) -> Vec<CenterPoint<'a>> {
    centers
        .iter()
        .filter(|c| &c.regime == regime)
        .filter_map(|c| {
            let (latitude, longitude) = c.coordinates()?;
            Some(CenterPoint {
                name: &c.name,
                kind: c.kind.as_deref(),
                latitude,
                longitude,
                color: c.regime.color(),
            })
        })
        .collect()
}
