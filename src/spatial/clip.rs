use crate::models::ExposureCell;
use geo::{BoundingRect, Contains, MultiPoint, MultiPolygon, Point};

/// Keep cells strictly inside the boundary.
///
/// Uses a "within" test: a cell lying exactly on the boundary edge is dropped.
pub fn clip_within(cells: Vec<ExposureCell>, boundary: &MultiPolygon<f64>) -> Vec<ExposureCell> {
    cells
        .into_iter()
        .filter(|cell| boundary.contains(&cell.location))
        .collect()
}

/// Width and height in km of a set of projected points
pub fn points_span_km(points: &[Point<f64>]) -> Option<(f64, f64)> {
    MultiPoint::new(points.to_vec())
        .bounding_rect()
        .map(|rect| (rect.width() / 1000.0, rect.height() / 1000.0))
}

/// Width and height in km of a projected polygon
pub fn polygon_span_km(geometry: &MultiPolygon<f64>) -> Option<(f64, f64)> {
    geometry
        .bounding_rect()
        .map(|rect| (rect.width() / 1000.0, rect.height() / 1000.0))
}
