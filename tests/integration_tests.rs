use aq_siting::cli::{Cli, Commands};
use aq_siting::config::{InputPaths, PipelineConfig};
use aq_siting::models::SkipReason;
use aq_siting::processors::{run_aggregate, run_join, run_rank};
use aq_siting::readers::TableReader;
use aq_siting::writers::ParquetWriter;
use aq_siting::ProcessingError;
use clap::Parser;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SENSORS_CSV: &str = "\
sensor_id,sensor_name,parameter_name,locations_id,owner_name
101,Gulberg PM,pm25,1,EPA Punjab
102,Model Town PM,pm25,2,EPA Punjab
103,Orphan PM,pm25,3,Unknown
";

const LOCATIONS_CSV: &str = "\
locations_id,name,lat,lon
1,Gulberg III,31.5204,74.3587
2,Model Town,31.4805,74.3239
";

const BOUNDARY: &str = r#"{
  "type": "FeatureCollection",
  "features": [{
    "type": "Feature",
    "properties": {"name": "Lahore"},
    "geometry": {"type": "Polygon", "coordinates": [[
      [74.2, 31.4], [74.5, 31.4], [74.5, 31.6], [74.2, 31.6], [74.2, 31.4]
    ]]}
  }]
}"#;

const EXPOSURE: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"Cell_ID": "A", "POP": 100, "Sample": 80.0},
     "geometry": {"type": "Point", "coordinates": [74.3587, 31.5204]}},
    {"type": "Feature", "properties": {"Cell_ID": "B", "POP": 100, "Sample": 80.0},
     "geometry": {"type": "Point", "coordinates": [74.45, 31.55]}},
    {"type": "Feature", "properties": {"Cell_ID": "C", "POP": 10, "Sample": null},
     "geometry": {"type": "Point", "coordinates": [74.40, 31.45]}},
    {"type": "Feature", "properties": {"Cell_ID": "D", "POP": 5000, "Sample": 150.0},
     "geometry": {"type": "Point", "coordinates": [74.9, 31.5]}}
  ]
}"#;

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create directory");
    }
    fs::write(path, contents).expect("Failed to write fixture");
}

fn fixture(root: &Path) -> PipelineConfig {
    let data = root.join("data");
    write(&data.join("sensors.csv"), SENSORS_CSV);
    write(&data.join("locations.csv"), LOCATIONS_CSV);
    write(&data.join("boundary.geojson"), BOUNDARY);
    write(&data.join("exposure.geojson"), EXPOSURE);

    let raw = data.join("raw");
    write(
        &raw.join("sensor_101.csv"),
        "sensor_id,date,value\n101,2024-01-01,50\n101,2024-01-02,70\n101,2024-01-03,\n",
    );
    write(
        &raw.join("sensor_102_days30.csv"),
        "datetime,pm25\n2024-01-02T00:00:00Z,30\n2024-01-01T00:00:00Z,40\n",
    );
    write(&raw.join("readings.csv"), "value\n12\n");

    PipelineConfig {
        paths: InputPaths {
            sensors_table: data.join("sensors.csv"),
            locations_table: data.join("locations.csv"),
            raw_timeseries_dir: raw,
            boundary: data.join("boundary.geojson"),
            exposure_candidates: vec![root.join("missing.geojson"), data.join("exposure.geojson")],
            ranking_sensors: None,
        },
        ..PipelineConfig::default()
    }
    .with_output_dir(root.join("outputs"))
}

#[test]
fn test_full_pipeline() -> aq_siting::Result<()> {
    let temp_dir = TempDir::new()?;
    let config = fixture(temp_dir.path());

    // stage 1
    let joined = run_join(&config)?;
    assert_eq!(joined.dropped, 1);
    assert_eq!(
        joined.table.headers,
        vec![
            "sensor_id",
            "sensor_name",
            "parameter_name",
            "locations_id",
            "name",
            "owner_name",
            "latitude",
            "longitude"
        ]
    );
    assert!(config.output_path("sensors_lahore_joined.csv").exists());
    assert!(config.output_path("sensors_lahore_joined.geojson").exists());

    // stage 2
    let aggregated = run_aggregate(&config)?;
    assert_eq!(aggregated.report.records.len(), 2);
    assert_eq!(aggregated.report.skipped.len(), 1);
    assert_eq!(aggregated.report.skipped[0].file_name, "readings.csv");
    assert_eq!(aggregated.report.skipped[0].reason, SkipReason::NoSensorId);

    let merged = TableReader::new().read(&config.output_path("sensors_lahore_with_pm25.csv"))?;
    assert_eq!(merged.len(), 2);
    let mean = merged.column_index("pm25_mean").expect("pm25_mean column");
    let start = merged.column_index("ts_start").expect("ts_start column");
    assert_eq!(merged.value(0, mean), Some("60"));
    assert_eq!(merged.value(1, mean), Some("35"));
    assert_eq!(merged.value(1, start), Some("2024-01-01T00:00:00Z"));

    // stage 3
    let ranked = run_rank(&config, "zstd")?;
    assert!(ranked.exposure_path.ends_with("exposure.geojson"));

    let summary = &ranked.ranking.summary;
    assert_eq!(summary.raw_cells, 4);
    assert_eq!(summary.clipped_cells, 3);
    assert_eq!(summary.sensors, 2);

    let order: Vec<&str> = ranked.ranking.cells.iter().map(|c| c.cell_id.as_str()).collect();
    assert_eq!(order, vec!["B", "A", "C"]);
    assert!(ranked.ranking.cells[1].dist_to_sensor_m < 1e-3);
    assert_eq!(ranked.ranking.cells[2].pollution, None);

    let csv = fs::read_to_string(config.output_path("site_ranking.csv"))?;
    assert_eq!(csv.lines().next(), Some("cell_id,pop,pm25_interp,dist_to_sensor_m,score"));
    assert_eq!(csv.lines().count(), 4);

    let parquet = config.output_path("site_ranking.parquet");
    assert_eq!(ParquetWriter::new().get_file_info(&parquet)?.total_rows, 3);
    assert!(config.output_path("site_ranking.geojson").exists());

    // a rerun replaces the geometry output instead of failing
    run_rank(&config, "snappy")?;
    Ok(())
}

#[test]
fn test_rank_without_exposure_layer_is_fatal() -> aq_siting::Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = fixture(temp_dir.path());
    config.paths.exposure_candidates = vec![temp_dir.path().join("nope.geojson")];

    let result = run_rank(&config, "snappy");
    assert!(matches!(result, Err(ProcessingError::FileNotFound { .. })));
    assert!(!config.output_path("site_ranking.csv").exists());
    Ok(())
}

#[test]
fn test_join_survives_failed_geometry_export() -> aq_siting::Result<()> {
    let temp_dir = TempDir::new()?;
    let config = fixture(temp_dir.path());

    // a non-empty directory where the GeoJSON file should go
    let blocked = config.output_path("sensors_lahore_joined.geojson");
    write(&blocked.join("keep.txt"), "occupied");

    let joined = run_join(&config)?;
    assert_eq!(joined.table.len(), 2);
    assert!(config.output_path("sensors_lahore_joined.csv").is_file());
    assert!(blocked.is_dir());
    Ok(())
}

#[test]
fn test_aggregate_requires_joined_table() -> aq_siting::Result<()> {
    let temp_dir = TempDir::new()?;
    let config = fixture(temp_dir.path());

    let result = run_aggregate(&config);
    assert!(matches!(result, Err(ProcessingError::FileNotFound { .. })));
    Ok(())
}

#[test]
fn test_cli_parsing() {
    let cli = Cli::try_parse_from(["aq-siting", "rank", "--top", "5", "-c", "gzip", "-o", "out"])
        .expect("rank arguments should parse");
    assert_eq!(cli.output_dir.as_deref(), Some(Path::new("out")));
    match cli.command {
        Commands::Rank { top, compression } => {
            assert_eq!(top, Some(5));
            assert_eq!(compression, "gzip");
        }
        _ => panic!("expected rank command"),
    }

    let cli = Cli::try_parse_from(["aq-siting", "--config", "siting.toml", "info"])
        .expect("info arguments should parse");
    assert!(matches!(cli.command, Commands::Info { file: None, sample: 10 }));
    assert_eq!(cli.config.as_deref(), Some(Path::new("siting.toml")));
}
