use serde::Serialize;

use super::Bounds;
use crate::legend::{indicator_color, Rgba};
use crate::model::{Metric, Rate};
use crate::scoring::MunicipalityTable;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
    pub color: Rgba,
}

/// Municipalities drawn for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MunicipalityLayer {
    pub metric: Metric,
    pub points: Vec<MapPoint>,
    /// Legend range; `None` when no row has both coordinates and a value.
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub bounds: Option<Bounds>,
}

/// Build a map layer for `metric`.
///
/// Rows missing coordinates or with an undefined value are left off the
/// map. Colors scale each value by the layer maximum.
pub fn municipality_layer(table: &MunicipalityTable, metric: Metric) -> MunicipalityLayer {
    let located: Vec<(&str, f64, f64, f64)> = table
        .rows()
        .iter()
        .filter_map(|row| {
            let (lat, lon) = row.record.coordinates()?;
            let value = row.metric(metric).value()?;
            Some((row.name(), lat, lon, value))
        })
        .collect();

    let min = located.iter().map(|p| p.3).reduce(f64::min);
    let max = located.iter().map(|p| p.3).reduce(f64::max);

    let points = located
        .iter()
        .map(|&(name, latitude, longitude, value)| {
            let ratio = match max {
                Some(m) if m > 0.0 => Rate::Defined(value / m),
                _ => Rate::Undefined,
            };
            MapPoint {
                name: name.to_string(),
                latitude,
                longitude,
                value,
                color: indicator_color(ratio),
            }
        })
        .collect();

    let skipped = table.len() - located.len();
    if skipped > 0 {
        log::debug!("{} municipalities left off the {} map", skipped, metric.column());
    }

    MunicipalityLayer {
        metric,
        points,
        min,
        max,
        bounds: Bounds::from_points(located.iter().map(|p| (p.1, p.2))),
    }
}
