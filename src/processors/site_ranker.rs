use crate::config::RankingConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{Boundary, ExposureLayer, RankedCell, SensorRecord};
use crate::processors::normalize::{impute, impute_median, min_max};
use crate::spatial::{clip_within, points_span_km, polygon_span_km, Crs, NearestSensorIndex, Transformer};
use geo::Point;
use tracing::info;

/// Counts and extents observed while ranking
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingSummary {
    pub raw_cells: usize,
    pub clipped_cells: usize,
    pub sensors: usize,
    pub boundary_span_km: Option<(f64, f64)>,
    pub exposure_span_km: Option<(f64, f64)>,
    pub max_distance_m: Option<f64>,
}

impl RankingSummary {
    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Site Ranking ===\n");
        summary.push_str(&format!("Exposure cells: {} raw, {} inside boundary\n", self.raw_cells, self.clipped_cells));
        summary.push_str(&format!("Sensors: {}\n", self.sensors));

        if let Some((w, h)) = self.boundary_span_km {
            summary.push_str(&format!("Boundary span: {:.1} km x {:.1} km\n", w, h));
        }
        if let Some((w, h)) = self.exposure_span_km {
            summary.push_str(&format!("Exposure span: {:.1} km x {:.1} km\n", w, h));
        }
        if let Some(distance) = self.max_distance_m {
            summary.push_str(&format!("Max distance to nearest sensor: {:.1} m\n", distance));
        }

        summary
    }
}

#[derive(Debug, Clone)]
pub struct RankingOutcome {
    /// Sorted by score, highest first
    pub cells: Vec<RankedCell>,
    /// CRS of every `RankedCell::location`
    pub crs: Crs,
    pub summary: RankingSummary,
}

pub struct SiteRanker<'a> {
    config: &'a RankingConfig,
}

impl<'a> SiteRanker<'a> {
    pub fn new(config: &'a RankingConfig) -> Self {
        Self { config }
    }

    pub fn rank(
        &self,
        boundary: &Boundary,
        exposure: ExposureLayer,
        sensors: &[SensorRecord],
    ) -> Result<RankingOutcome> {
        let metric: Crs = self.config.crs_metric.parse()?;
        if !metric.is_metric() {
            return Err(ProcessingError::UnsupportedCrs(format!(
                "{} is not a projected CRS",
                self.config.crs_metric
            )));
        }

        if sensors.is_empty() {
            return Err(ProcessingError::MissingData(
                "no sensors with coordinates to measure distance against".to_string(),
            ));
        }

        let exposure_crs = exposure.crs;
        let raw_cells = exposure.cells.len();

        let boundary_geometry = Transformer::new(boundary.crs, exposure_crs).multi_polygon(&boundary.geometry);
        let cells = clip_within(exposure.cells, &boundary_geometry);
        info!("Exposure cells: {} raw, {} inside boundary", raw_cells, cells.len());

        let to_metric = Transformer::new(exposure_crs, metric);
        let cell_points: Vec<Point<f64>> = cells.iter().map(|c| to_metric.point(c.location)).collect();

        let sensor_points = Transformer::new(Crs::Wgs84, metric)
            .points(&sensors.iter().map(|s| Point::from(s.lon_lat())).collect::<Vec<_>>());

        let boundary_span_km = polygon_span_km(&Transformer::new(boundary.crs, metric).multi_polygon(&boundary.geometry));
        let exposure_span_km = points_span_km(&cell_points);
        if let Some((w, h)) = boundary_span_km {
            info!("Boundary span ({}): {:.1} km x {:.1} km", metric, w, h);
        }
        if let Some((w, h)) = exposure_span_km {
            info!("Exposure span ({}): {:.1} km x {:.1} km", metric, w, h);
        }

        let index = NearestSensorIndex::build(&sensor_points);
        info!("Indexed {} sensors", index.len());
        let distances = index
            .distances(&cell_points)
            .ok_or_else(|| ProcessingError::MissingData("sensor index is empty".to_string()))?;

        let population = impute(&cells.iter().map(|c| c.population).collect::<Vec<_>>(), 0.0);
        let pollution = impute_median(&cells.iter().map(|c| c.pollution).collect::<Vec<_>>());

        let scores = composite_scores(self.config, &population, &pollution, &distances);

        let mut ranked: Vec<RankedCell> = cells
            .into_iter()
            .enumerate()
            .map(|(i, cell)| RankedCell {
                cell_id: cell.cell_id,
                population: population[i],
                pollution: cell.pollution,
                dist_to_sensor_m: distances[i],
                score: scores[i],
                location: cell.location,
            })
            .collect();

        // stable: equal scores keep input order
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        let max_distance_m = distances.iter().copied().reduce(f64::max);

        Ok(RankingOutcome {
            cells: ranked,
            crs: exposure_crs,
            summary: RankingSummary {
                raw_cells,
                clipped_cells: distances.len(),
                sensors: sensor_points.len(),
                boundary_span_km,
                exposure_span_km,
                max_distance_m,
            },
        })
    }
}

/// Min-max normalize each signal and combine them with the configured weights
pub fn composite_scores(
    config: &RankingConfig,
    population: &[f64],
    pollution: &[f64],
    distance: &[f64],
) -> Vec<f64> {
    let pop_norm = min_max(population);
    let pollution_norm = min_max(pollution);
    let distance_norm = min_max(distance);

    pop_norm
        .iter()
        .zip(&pollution_norm)
        .zip(&distance_norm)
        .map(|((p, pm), d)| config.weights.score(*p, *pm, *d))
        .collect()
}
