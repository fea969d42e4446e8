use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{AggregationReport, Table};
use crate::processors::metadata_joiner::{JoinOutcome, MetadataJoiner};
use crate::processors::site_ranker::{RankingOutcome, SiteRanker};
use crate::processors::timeseries_aggregator::{merge_onto, TimeseriesAggregator};
use crate::readers::{GeoJsonReader, SensorReader, TableReader};
use crate::utils::constants::{
    AGGREGATES_CSV, JOINED_SENSORS_CSV, JOINED_SENSORS_GEOJSON, RANKING_CSV, RANKING_GEOJSON,
    RANKING_PARQUET, SENSORS_WITH_PM25_CSV, SENSORS_WITH_PM25_GEOJSON,
};
use crate::writers::{CsvTableWriter, GeoJsonWriter, ParquetWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Stage 1: join sensor attributes with locations and write the clean table
pub fn run_join(config: &PipelineConfig) -> Result<JoinOutcome> {
    info!(
        sensors = %config.paths.sensors_table.display(),
        locations = %config.paths.locations_table.display(),
        "joining sensor metadata"
    );

    let outcome = MetadataJoiner::new(&config.join)
        .join_files(&config.paths.sensors_table, &config.paths.locations_table)?;

    CsvTableWriter::new().write_table(&outcome.table, &config.output_path(JOINED_SENSORS_CSV))?;
    export_sensor_points(&outcome.table, &config.output_path(JOINED_SENSORS_GEOJSON));

    Ok(outcome)
}

#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    pub report: AggregationReport,
    pub merged: Table,
}

/// Stage 2: summarise the raw timeseries and merge them onto the stage-1 table
pub fn run_aggregate(config: &PipelineConfig) -> Result<AggregateOutcome> {
    let joined_path = require_file(config.output_path(JOINED_SENSORS_CSV))?;
    let meta = TableReader::new().read(&joined_path)?;
    info!(rows = meta.len(), path = %joined_path.display(), "sensor metadata loaded");

    let report = TimeseriesAggregator::new(&config.timeseries).aggregate_dir(&config.paths.raw_timeseries_dir)?;
    if report.records.is_empty() {
        warn!(dir = %config.paths.raw_timeseries_dir.display(), "no aggregates were produced");
    }

    let writer = CsvTableWriter::new();
    writer.write_rows(&report.records, &config.output_path(AGGREGATES_CSV))?;

    let merged = merge_onto(&meta, &report.records)?;
    writer.write_table(&merged, &config.output_path(SENSORS_WITH_PM25_CSV))?;
    export_sensor_points(&merged, &config.output_path(SENSORS_WITH_PM25_GEOJSON));

    Ok(AggregateOutcome { report, merged })
}

#[derive(Debug, Clone)]
pub struct RankOutcome {
    pub exposure_path: PathBuf,
    pub ranking: RankingOutcome,
}

/// Stage 3: rank exposure cells and write CSV, GeoJSON and Parquet outputs
pub fn run_rank(config: &PipelineConfig, compression: &str) -> Result<RankOutcome> {
    let parquet_writer = ParquetWriter::new().with_compression(compression)?;

    let reader = GeoJsonReader::new();
    let boundary = reader.read_boundary(&config.paths.boundary)?;
    info!(crs = %boundary.crs, polygons = boundary.geometry.0.len(), "boundary loaded");

    let (exposure_path, exposure) = reader.read_exposure(&config.paths.exposure_candidates, &config.ranking)?;
    info!(
        path = %exposure_path.display(),
        crs = %exposure.crs,
        cells = exposure.cells.len(),
        "exposure layer loaded"
    );

    let sensors_path = require_file(config.ranking_sensors_path())?;
    let sensors = SensorReader::new().read(&sensors_path)?;

    let ranking = SiteRanker::new(&config.ranking).rank(&boundary, exposure, &sensors)?;

    CsvTableWriter::new().write_rows(&ranking.cells, &config.output_path(RANKING_CSV))?;
    GeoJsonWriter::new().write_ranked(&ranking.cells, ranking.crs, &config.output_path(RANKING_GEOJSON))?;
    parquet_writer.write_ranked(&ranking.cells, &config.output_path(RANKING_PARQUET))?;

    Ok(RankOutcome {
        exposure_path,
        ranking,
    })
}

fn require_file(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(ProcessingError::FileNotFound {
            searched: vec![path],
        })
    }
}

/// Optional geometry export; a failure is logged and never aborts the stage
fn export_sensor_points(table: &Table, path: &Path) {
    match GeoJsonWriter::new().write_table_points(table, path) {
        Ok(count) => info!("Exported {} sensor points to {}", count, path.display()),
        Err(e) => warn!(path = %path.display(), error = %e, "skipped GeoJSON export"),
    }
}
