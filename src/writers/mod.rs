pub mod csv_writer;
pub mod geojson_writer;
pub mod parquet_writer;

pub use csv_writer::{CsvRow, CsvTableWriter};
pub use geojson_writer::GeoJsonWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
