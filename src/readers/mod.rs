pub mod geojson_reader;
pub mod sensor_reader;
pub mod table_reader;
pub mod timeseries_reader;

pub use geojson_reader::{GeoJsonDocument, GeoJsonReader};
pub use sensor_reader::SensorReader;
pub use table_reader::{TableFormat, TableReader};
pub use timeseries_reader::TimeseriesReader;
