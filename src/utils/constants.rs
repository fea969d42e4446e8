/// Input locations relative to the project root
pub const SENSORS_TABLE: &str = "data/sensors/lahore_pm25_sensors_subset.xlsx";
pub const LOCATIONS_TABLE: &str = "data/sensors/lahore_locations_subset.xlsx";
pub const RAW_TIMESERIES_DIR: &str = "data/sensors/raw";
pub const BOUNDARY_FILE: &str = "data/boundary/lahore_boundary.geojson";
pub const EXPOSURE_OUTPUT_CANDIDATE: &str = "outputs/population_pm25_exposure.geojson";
pub const EXPOSURE_DATA_CANDIDATE: &str = "data/worldpop/population_pm25_exposure.geojson";
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Output file names
pub const JOINED_SENSORS_CSV: &str = "sensors_lahore_joined.csv";
pub const JOINED_SENSORS_GEOJSON: &str = "sensors_lahore_joined.geojson";
pub const AGGREGATES_CSV: &str = "sensor_timeseries_aggregated.csv";
pub const SENSORS_WITH_PM25_CSV: &str = "sensors_lahore_with_pm25.csv";
pub const SENSORS_WITH_PM25_GEOJSON: &str = "sensors_lahore_with_pm25.geojson";
pub const RANKING_CSV: &str = "site_ranking.csv";
pub const RANKING_GEOJSON: &str = "site_ranking.geojson";
pub const RANKING_PARQUET: &str = "site_ranking.parquet";

/// Canonical column names
pub const COL_SENSOR_ID: &str = "sensor_id";
pub const COL_LATITUDE: &str = "latitude";
pub const COL_LONGITUDE: &str = "longitude";
pub const COL_CELL_ID: &str = "cell_id";
pub const COL_POPULATION: &str = "pop";
pub const COL_POLLUTION: &str = "pm25_interp";
pub const COL_DISTANCE: &str = "dist_to_sensor_m";
pub const COL_SCORE: &str = "score";

/// Projected CRS for every distance computation
pub const CRS_METRIC: &str = "EPSG:32643";

/// Composite score weights
pub const WEIGHT_POPULATION: f64 = 0.40;
pub const WEIGHT_POLLUTION: f64 = 0.35;
pub const WEIGHT_DISTANCE: f64 = 0.25;

/// Processing defaults
pub const DEFAULT_PREVIEW_ROWS: usize = 10;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Cell text treated as missing, compared case-insensitively
pub const MISSING_MARKERS: [&str; 6] = ["", "nan", "na", "n/a", "null", "none"];

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
