use crate::spatial::Crs;
use geo::{MultiPolygon, Point};
use serde::Serialize;

/// One exposure-grid cell as loaded, before scoring
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureCell {
    pub cell_id: String,
    pub population: Option<f64>,
    pub pollution: Option<f64>,
    pub location: Point<f64>,
}

/// A scored cell. `location` stays in the exposure layer's CRS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCell {
    pub cell_id: String,
    #[serde(rename = "pop")]
    pub population: f64,
    #[serde(rename = "pm25_interp")]
    pub pollution: Option<f64>,
    pub dist_to_sensor_m: f64,
    pub score: f64,
    #[serde(skip)]
    pub location: Point<f64>,
}

#[derive(Debug, Clone)]
pub struct ExposureLayer {
    pub cells: Vec<ExposureCell>,
    pub crs: Crs,
}

/// Study-area boundary; all features are unioned into one multipolygon
#[derive(Debug, Clone)]
pub struct Boundary {
    pub geometry: MultiPolygon<f64>,
    pub crs: Crs,
}
