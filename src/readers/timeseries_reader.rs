use crate::config::TimeseriesConfig;
use crate::models::{AggregateRecord, SkipReason, Table};
use crate::processors::normalize::{mean, median};
use crate::readers::{TableFormat, TableReader};
use crate::utils::filename::sensor_id_from_filename;
use crate::utils::values::{parse_integral, parse_number};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::Path;
use tracing::debug;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Summarises one per-sensor observation file
pub struct TimeseriesReader<'a> {
    config: &'a TimeseriesConfig,
    table_reader: TableReader,
}

impl<'a> TimeseriesReader<'a> {
    pub fn new(config: &'a TimeseriesConfig) -> Self {
        Self {
            config,
            // observation files are comma-separated whatever their extension
            table_reader: TableReader::with_format(TableFormat::Delimited(b',')),
        }
    }

    /// Produce an aggregate or the reason the file has none
    pub fn summarise(&self, path: &Path) -> std::result::Result<AggregateRecord, SkipReason> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let table = self
            .table_reader
            .read(path)
            .map_err(|e| SkipReason::ReadFailed(e.to_string()))?;

        self.summarise_table(&table, &file_name)
    }

    pub fn summarise_table(
        &self,
        table: &Table,
        file_name: &str,
    ) -> std::result::Result<AggregateRecord, SkipReason> {
        // a present id column is authoritative; its first cell must hold the id
        let sensor_id = match table.resolve_column(&self.config.id_column_candidates) {
            Some(col) => table.value(0, col).and_then(parse_integral),
            None => sensor_id_from_filename(file_name),
        }
        .ok_or(SkipReason::NoSensorId)?;

        let value_col =
            table
                .resolve_column(&self.config.value_column_candidates)
                .ok_or_else(|| SkipReason::NoValueColumn {
                    tried: self.config.value_column_candidates.clone(),
                })?;
        let column_name = table.headers[value_col].clone();
        debug!(file = file_name, sensor_id, column = %column_name, "resolved value column");

        let mut values = Vec::with_capacity(table.len());
        for row in &table.rows {
            match parse_number(&row[value_col]) {
                Ok(Some(value)) => values.push(value),
                Ok(None) => {}
                Err(text) => {
                    return Err(SkipReason::InvalidValue {
                        column: column_name,
                        value: text,
                    })
                }
            }
        }

        let (Some(pm25_mean), Some(pm25_median)) = (mean(&values), median(&values)) else {
            return Err(SkipReason::NoValidValues {
                column: column_name,
            });
        };
        let pm25_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let (ts_start, ts_end) = table
            .resolve_column(&self.config.timestamp_column_candidates)
            .map(|col| timestamp_span(table.column_values(col).flatten()))
            .unwrap_or((None, None));

        Ok(AggregateRecord {
            sensor_id,
            pm25_mean,
            pm25_median,
            pm25_max,
            n_obs: values.len(),
            ts_start,
            ts_end,
            source_file: file_name.to_string(),
        })
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Earliest and latest timestamp text.
///
/// Values are compared as instants when every one parses, lexically otherwise.
pub fn timestamp_span<'t>(values: impl Iterator<Item = &'t str>) -> (Option<String>, Option<String>) {
    let values: Vec<&str> = values.collect();
    if values.is_empty() {
        return (None, None);
    }

    let parsed: Option<Vec<NaiveDateTime>> = values.iter().map(|v| parse_timestamp(v)).collect();

    let (first, last) = match parsed {
        Some(instants) => {
            let min = (0..values.len()).min_by_key(|&i| instants[i]);
            let max = (0..values.len()).max_by_key(|&i| instants[i]);
            (min.map(|i| values[i]), max.map(|i| values[i]))
        }
        None => (
            values.iter().copied().min(),
            values.iter().copied().max(),
        ),
    };

    (first.map(str::to_string), last.map(str::to_string))
}
