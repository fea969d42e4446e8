use crate::config::TimeseriesConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{AggregateRecord, AggregationReport, SkippedFile, Table};
use crate::readers::TimeseriesReader;
use crate::utils::constants::COL_SENSOR_ID;
use crate::utils::filename::is_csv_file;
use crate::utils::progress::ProgressReporter;
use crate::utils::values::parse_integral;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct TimeseriesAggregator<'a> {
    config: &'a TimeseriesConfig,
    silent: bool,
}

impl<'a> TimeseriesAggregator<'a> {
    pub fn new(config: &'a TimeseriesConfig) -> Self {
        Self {
            config,
            silent: false,
        }
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Summarise every `*.csv` file in `dir`, in file-name order.
    ///
    /// A missing directory is fatal; a bad file only lands in `skipped`.
    pub fn aggregate_dir(&self, dir: &Path) -> Result<AggregationReport> {
        if !dir.is_dir() {
            return Err(ProcessingError::FileNotFound {
                searched: vec![dir.to_path_buf()],
            });
        }

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_csv_file(path))
            .collect();
        files.sort();

        let progress = ProgressReporter::new(files.len() as u64, "Aggregating sensor files", self.silent);
        let reader = TimeseriesReader::new(self.config);
        let mut report = AggregationReport::default();

        for path in &files {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            progress.start_file(&file_name);

            match reader.summarise(path) {
                Ok(record) => {
                    info!(file = %file_name, sensor_id = record.sensor_id, n_obs = record.n_obs, "aggregated");
                    report.records.push(record);
                }
                Err(reason) => {
                    warn!(file = %file_name, reason = %reason, "skipping file");
                    report.skipped.push(SkippedFile { file_name, reason });
                }
            }

            progress.file_done();
        }

        progress.finish_with_message(&format!("Aggregated {} sensors", report.records.len()));
        Ok(report)
    }
}

/// Left join aggregates onto sensor metadata by `sensor_id`.
///
/// Sensors with no aggregate keep empty aggregate fields; a sensor with
/// several aggregates (several files) appears once per aggregate.
pub fn merge_onto(meta: &Table, records: &[AggregateRecord]) -> Result<Table> {
    let id_col = meta.require_column("sensor metadata", &[COL_SENSOR_ID])?;

    let mut by_sensor: HashMap<i64, Vec<&AggregateRecord>> = HashMap::new();
    for record in records {
        by_sensor.entry(record.sensor_id).or_default().push(record);
    }

    let mut headers = meta.headers.clone();
    headers.extend(AggregateRecord::COLUMNS.iter().map(|c| c.to_string()));
    let empty = vec![String::new(); AggregateRecord::COLUMNS.len()];

    let mut rows = Vec::with_capacity(meta.len());
    for (idx, meta_row) in meta.rows.iter().enumerate() {
        let matches = meta
            .value(idx, id_col)
            .and_then(parse_integral)
            .and_then(|id| by_sensor.get(&id));

        match matches {
            Some(aggregates) => {
                for aggregate in aggregates {
                    let mut row = meta_row.clone();
                    row.extend(aggregate.cells());
                    rows.push(row);
                }
            }
            None => {
                let mut row = meta_row.clone();
                row.extend(empty.iter().cloned());
                rows.push(row);
            }
        }
    }

    Ok(Table::with_rows(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SkipReason;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn record(sensor_id: i64, mean: f64, file: &str) -> AggregateRecord {
        AggregateRecord {
            sensor_id,
            pm25_mean: mean,
            pm25_median: mean,
            pm25_max: mean,
            n_obs: 1,
            ts_start: None,
            ts_end: None,
            source_file: file.to_string(),
        }
    }

    #[test]
    fn test_aggregate_dir_collects_records_and_skips() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join("sensor_25135_days3000.csv"),
            "date,pm25\n2024-01-01,10\n2024-01-02,20\n2024-01-03,\n2024-01-04,30\n",
        )?;
        fs::write(dir.path().join("sensor_9.csv"), "date,so2\n2024-01-01,1\n")?;
        fs::write(dir.path().join("readings.csv"), "value\n1\n")?;
        fs::write(dir.path().join("notes.txt"), "not a table")?;

        let config = TimeseriesConfig::default();
        let report = TimeseriesAggregator::new(&config)
            .with_silent(true)
            .aggregate_dir(dir.path())?;

        assert_eq!(report.records.len(), 1);
        let aggregate = &report.records[0];
        assert_eq!(aggregate.sensor_id, 25135);
        assert_eq!(aggregate.pm25_mean, 20.0);
        assert_eq!(aggregate.pm25_median, 20.0);
        assert_eq!(aggregate.pm25_max, 30.0);
        assert_eq!(aggregate.n_obs, 3);
        assert_eq!(aggregate.ts_start.as_deref(), Some("2024-01-01"));
        assert_eq!(aggregate.ts_end.as_deref(), Some("2024-01-04"));

        // notes.txt is not a candidate at all
        assert_eq!(report.files_seen(), 3);
        let reasons: Vec<(&str, &SkipReason)> = report
            .skipped
            .iter()
            .map(|s| (s.file_name.as_str(), &s.reason))
            .collect();
        assert_eq!(reasons[0], ("readings.csv", &SkipReason::NoSensorId));
        assert_eq!(reasons[1].0, "sensor_9.csv");
        assert!(matches!(reasons[1].1, SkipReason::NoValueColumn { .. }));
        Ok(())
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let config = TimeseriesConfig::default();
        let result = TimeseriesAggregator::new(&config)
            .with_silent(true)
            .aggregate_dir(Path::new("/nonexistent/raw"));
        assert!(matches!(result, Err(ProcessingError::FileNotFound { .. })));
    }

    #[test]
    fn test_merge_keeps_unmatched_sensors() -> Result<()> {
        let meta = Table::with_rows(
            vec!["sensor_id".into(), "latitude".into(), "longitude".into()],
            vec![
                vec!["1".into(), "31.5".into(), "74.3".into()],
                vec!["2.0".into(), "31.6".into(), "74.4".into()],
                vec!["3".into(), "31.7".into(), "74.5".into()],
            ],
        );
        let records = vec![
            record(2, 55.0, "sensor_2.csv"),
            record(3, 10.0, "sensor_3a.csv"),
            record(3, 12.0, "sensor_3b.csv"),
            record(99, 1.0, "sensor_99.csv"),
        ];

        let merged = merge_onto(&meta, &records)?;
        assert_eq!(merged.headers.len(), 3 + AggregateRecord::COLUMNS.len());
        assert_eq!(merged.len(), 4);

        let mean_col = merged.column_index("pm25_mean").unwrap();
        assert_eq!(merged.value(0, mean_col), None);
        assert_eq!(merged.value(1, mean_col), Some("55"));
        assert_eq!(merged.value(2, mean_col), Some("10"));
        assert_eq!(merged.value(3, mean_col), Some("12"));
        Ok(())
    }

    #[test]
    fn test_merge_requires_sensor_id() {
        let meta = Table::with_rows(vec!["name".into()], vec![vec!["x".into()]]);
        assert!(matches!(
            merge_onto(&meta, &[]),
            Err(ProcessingError::MissingColumn { .. })
        ));
    }
}
