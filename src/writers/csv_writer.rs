use crate::error::Result;
use crate::models::{AggregateRecord, RankedCell, Table};
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

/// A serde row type with a fixed CSV header.
///
/// `HEADER` must list the serialized field names in order; it is written on
/// its own when there are no rows.
pub trait CsvRow: Serialize {
    const HEADER: &'static [&'static str];
}

impl CsvRow for AggregateRecord {
    const HEADER: &'static [&'static str] = &[
        "sensor_id",
        "pm25_mean",
        "pm25_median",
        "pm25_max",
        "n_obs",
        "ts_start",
        "ts_end",
        "source_file",
    ];
}

impl CsvRow for RankedCell {
    const HEADER: &'static [&'static str] = &["cell_id", "pop", "pm25_interp", "dist_to_sensor_m", "score"];
}

/// Writes tables and serde rows as comma-separated text
pub struct CsvTableWriter;

impl CsvTableWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_table(&self, table: &Table, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_writer(create_file(path)?);

        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        info!("Wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }

    /// Header comes from the field names of `T`, even with no rows
    pub fn write_rows<T: CsvRow>(&self, rows: &[T], path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_writer(create_file(path)?);

        if rows.is_empty() {
            writer.write_record(T::HEADER)?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        info!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(())
    }
}

impl Default for CsvTableWriter {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RankedCell;
    use crate::readers::TableReader;
    use geo::Point;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_table_round_trips_through_reader() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("sensors.csv");
        let table = Table::with_rows(
            vec!["sensor_id".into(), "name".into()],
            vec![
                vec!["1".into(), "Mall Road, Lahore".into()],
                vec!["2".into(), "".into()],
            ],
        );

        CsvTableWriter::new().write_table(&table, &path)?;
        assert_eq!(TableReader::new().read(&path)?, table);
        Ok(())
    }

    #[test]
    fn test_ranked_rows_use_output_column_names() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("site_ranking.csv");
        let cells = vec![RankedCell {
            cell_id: "17".into(),
            population: 250.0,
            pollution: None,
            dist_to_sensor_m: 1200.5,
            score: 0.75,
            location: Point::new(0.0, 0.0),
        }];

        CsvTableWriter::new().write_rows(&cells, &path)?;
        let text = fs::read_to_string(&path)?;
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("cell_id,pop,pm25_interp,dist_to_sensor_m,score"));
        assert_eq!(lines.next(), Some("17,250.0,,1200.5,0.75"));
        Ok(())
    }

    #[test]
    fn test_empty_rows_still_write_header() -> Result<()> {
        let dir = TempDir::new()?;
        let ranking = dir.path().join("site_ranking.csv");
        let aggregates = dir.path().join("sensor_timeseries_aggregated.csv");

        let writer = CsvTableWriter::new();
        writer.write_rows::<RankedCell>(&[], &ranking)?;
        writer.write_rows::<AggregateRecord>(&[], &aggregates)?;

        assert_eq!(
            fs::read_to_string(&ranking)?,
            "cell_id,pop,pm25_interp,dist_to_sensor_m,score\n"
        );
        let table = TableReader::new().read(&aggregates)?;
        assert!(table.is_empty());
        assert_eq!(table.headers, AggregateRecord::HEADER);
        Ok(())
    }

    #[test]
    fn test_aggregate_header_matches_serialized_fields() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("aggregates.csv");
        let record = AggregateRecord {
            sensor_id: 25135,
            pm25_mean: 20.0,
            pm25_median: 20.0,
            pm25_max: 30.0,
            n_obs: 3,
            ts_start: None,
            ts_end: None,
            source_file: "sensor_25135.csv".into(),
        };

        CsvTableWriter::new().write_rows(&[record], &path)?;
        let table = TableReader::new().read(&path)?;
        assert_eq!(table.headers, AggregateRecord::HEADER);
        assert_eq!(table.len(), 1);
        Ok(())
    }
}
