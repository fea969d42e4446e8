//! Pipeline configuration.
//!
//! Every path, column alias list, coordinate system and score weight lives here
//! and is passed into each stage explicitly. Values are layered: built-in
//! defaults, then an optional TOML file, then `AQ_SITING__*` environment
//! variables (e.g. `AQ_SITING__RANKING__WEIGHTS__POP=0.5`).

use crate::error::{ProcessingError, Result};
use crate::utils::constants::*;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: InputPaths,
    pub output_dir: PathBuf,
    pub join: JoinConfig,
    pub timeseries: TimeseriesConfig,
    #[validate(nested)]
    pub ranking: RankingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub sensors_table: PathBuf,
    pub locations_table: PathBuf,
    pub raw_timeseries_dir: PathBuf,
    pub boundary: PathBuf,
    /// Searched in order; the first existing file wins
    pub exposure_candidates: Vec<PathBuf>,
    /// Sensor points for the ranker. Defaults to the aggregate stage output.
    pub ranking_sensors: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    pub key: String,
    pub latitude_columns: Vec<String>,
    pub longitude_columns: Vec<String>,
    pub fallback_latitude_columns: Vec<String>,
    pub fallback_longitude_columns: Vec<String>,
    pub keep_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeseriesConfig {
    pub id_column_candidates: Vec<String>,
    pub value_column_candidates: Vec<String>,
    pub timestamp_column_candidates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RankingConfig {
    pub crs_metric: String,
    #[validate(nested)]
    pub weights: ScoreWeights,
    pub population_aliases: Vec<String>,
    pub pollution_aliases: Vec<String>,
    pub cell_id_aliases: Vec<String>,
    pub preview_rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ScoreWeights {
    #[validate(range(min = 0.0, max = 1.0))]
    pub pop: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub pollution: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub distance: f64,
}

impl ScoreWeights {
    pub fn new(pop: f64, pollution: f64, distance: f64) -> Self {
        Self {
            pop,
            pollution,
            distance,
        }
    }

    /// Linear composite of three normalized signals
    pub fn score(&self, pop_norm: f64, pollution_norm: f64, distance_norm: f64) -> f64 {
        self.pop * pop_norm + self.pollution * pollution_norm + self.distance * distance_norm
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::new(WEIGHT_POPULATION, WEIGHT_POLLUTION, WEIGHT_DISTANCE)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            sensors_table: PathBuf::from(SENSORS_TABLE),
            locations_table: PathBuf::from(LOCATIONS_TABLE),
            raw_timeseries_dir: PathBuf::from(RAW_TIMESERIES_DIR),
            boundary: PathBuf::from(BOUNDARY_FILE),
            exposure_candidates: vec![
                PathBuf::from(EXPOSURE_OUTPUT_CANDIDATE),
                PathBuf::from(EXPOSURE_DATA_CANDIDATE),
            ],
            ranking_sensors: None,
        }
    }
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            key: "locations_id".to_string(),
            latitude_columns: strings(&["lat"]),
            longitude_columns: strings(&["lon"]),
            fallback_latitude_columns: strings(&["lat_x"]),
            fallback_longitude_columns: strings(&["lon_x"]),
            keep_columns: strings(&[
                "sensor_id",
                "sensor_name",
                "parameter_name",
                "locations_id",
                "name",
                "owner_name",
                COL_LATITUDE,
                COL_LONGITUDE,
                "datetimeFirst_utc",
                "datetimeLast_utc",
            ]),
        }
    }
}

impl Default for TimeseriesConfig {
    fn default() -> Self {
        Self {
            id_column_candidates: strings(&[COL_SENSOR_ID]),
            value_column_candidates: strings(&["value", "pm25", "pm_2_5", "pm2_5", "concentration"]),
            timestamp_column_candidates: strings(&["date", "datetime"]),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            crs_metric: CRS_METRIC.to_string(),
            weights: ScoreWeights::default(),
            population_aliases: strings(&[COL_POPULATION, "population"]),
            pollution_aliases: strings(&[COL_POLLUTION, "sample_1", "sample_0", "sample"]),
            cell_id_aliases: strings(&[COL_CELL_ID, "id", "fid"]),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paths: InputPaths::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            join: JoinConfig::default(),
            timeseries: TimeseriesConfig::default(),
            ranking: RankingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load defaults, overlay an optional TOML file and the environment, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ProcessingError::FileNotFound {
                    searched: vec![path.to_path_buf()],
                });
            }
            builder = builder.add_source(File::from(path));
        }

        let config: PipelineConfig = builder
            .add_source(Environment::with_prefix("AQ_SITING").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Sensor table read by the ranker
    pub fn ranking_sensors_path(&self) -> PathBuf {
        self.paths
            .ranking_sensors
            .clone()
            .unwrap_or_else(|| self.output_path(SENSORS_WITH_PM25_CSV))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // `load` reads the process environment, so tests that call it run one at a time
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_match_original_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.ranking.crs_metric, "EPSG:32643");
        assert_eq!(config.ranking.weights, ScoreWeights::new(0.40, 0.35, 0.25));
        assert_eq!(config.join.key, "locations_id");
        assert_eq!(config.timeseries.value_column_candidates[0], "value");
        assert_eq!(config.paths.exposure_candidates.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_score_is_weighted_sum() {
        let weights = ScoreWeights::default();
        assert!((weights.score(1.0, 1.0, 1.0) - 1.0).abs() < 1e-12);
        assert!((weights.score(1.0, 0.0, 0.0) - 0.40).abs() < 1e-12);
        assert!((weights.score(0.0, 0.0, 1.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_load_toml_overrides() -> Result<()> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = NamedTempFile::with_suffix(".toml")?;
        writeln!(file, "output_dir = \"custom_out\"")?;
        writeln!(file, "[ranking.weights]")?;
        writeln!(file, "pop = 0.5")?;
        writeln!(file, "pollution = 0.3")?;
        writeln!(file, "distance = 0.2")?;

        let config = PipelineConfig::load(Some(file.path()))?;
        assert_eq!(config.output_dir, PathBuf::from("custom_out"));
        assert_eq!(config.ranking.weights, ScoreWeights::new(0.5, 0.3, 0.2));
        // untouched sections keep their defaults
        assert_eq!(config.ranking.crs_metric, "EPSG:32643");
        assert_eq!(config.join.key, "locations_id");
        Ok(())
    }

    #[test]
    fn test_out_of_range_weight_rejected() -> Result<()> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = NamedTempFile::with_suffix(".toml")?;
        writeln!(file, "[ranking.weights]")?;
        writeln!(file, "pop = 1.5")?;

        let result = PipelineConfig::load(Some(file.path()));
        assert!(matches!(result, Err(ProcessingError::Validation(_))));
        Ok(())
    }

    #[test]
    fn test_environment_overrides_defaults() -> Result<()> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("AQ_SITING__RANKING__WEIGHTS__POP", "0.5");
        std::env::set_var("AQ_SITING__OUTPUT_DIR", "envout");

        let result = PipelineConfig::load(None);

        std::env::remove_var("AQ_SITING__RANKING__WEIGHTS__POP");
        std::env::remove_var("AQ_SITING__OUTPUT_DIR");

        let config = result?;
        assert_eq!(config.output_dir, PathBuf::from("envout"));
        assert_eq!(config.ranking.weights, ScoreWeights::new(0.5, 0.35, 0.25));
        assert_eq!(config.ranking.crs_metric, "EPSG:32643");
        Ok(())
    }

    #[test]
    fn test_missing_config_file_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let result = PipelineConfig::load(Some(Path::new("/nonexistent/aq-siting.toml")));
        assert!(matches!(result, Err(ProcessingError::FileNotFound { .. })));
    }

    #[test]
    fn test_ranking_sensors_defaults_to_stage_two_output() {
        let config = PipelineConfig::default().with_output_dir("out");
        assert_eq!(
            config.ranking_sensors_path(),
            PathBuf::from("out").join(SENSORS_WITH_PM25_CSV)
        );
    }
}
