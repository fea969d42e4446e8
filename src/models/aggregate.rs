use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary statistics of one sensor observation file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub sensor_id: i64,
    pub pm25_mean: f64,
    pub pm25_median: f64,
    pub pm25_max: f64,
    pub n_obs: usize,
    pub ts_start: Option<String>,
    pub ts_end: Option<String>,
    pub source_file: String,
}

impl AggregateRecord {
    /// Column order used when aggregates are merged onto a sensor table
    pub const COLUMNS: [&'static str; 7] = [
        "pm25_mean",
        "pm25_median",
        "pm25_max",
        "n_obs",
        "ts_start",
        "ts_end",
        "source_file",
    ];

    pub fn cells(&self) -> Vec<String> {
        vec![
            self.pm25_mean.to_string(),
            self.pm25_median.to_string(),
            self.pm25_max.to_string(),
            self.n_obs.to_string(),
            self.ts_start.clone().unwrap_or_default(),
            self.ts_end.clone().unwrap_or_default(),
            self.source_file.clone(),
        ]
    }
}

/// Why an observation file produced no aggregate
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    ReadFailed(String),
    NoSensorId,
    NoValueColumn { tried: Vec<String> },
    NoValidValues { column: String },
    InvalidValue { column: String, value: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ReadFailed(err) => write!(f, "failed to read: {}", err),
            SkipReason::NoSensorId => write!(f, "no sensor id in file or name"),
            SkipReason::NoValueColumn { tried } => {
                write!(f, "no value column (tried {})", tried.join(", "))
            }
            SkipReason::NoValidValues { column } => {
                write!(f, "column '{}' has no numeric values", column)
            }
            SkipReason::InvalidValue { column, value } => {
                write!(f, "column '{}' holds non-numeric value '{}'", column, value)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: SkipReason,
}

/// Outcome of scanning a directory of observation files
#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    pub records: Vec<AggregateRecord>,
    pub skipped: Vec<SkippedFile>,
}

impl AggregationReport {
    pub fn files_seen(&self) -> usize {
        self.records.len() + self.skipped.len()
    }

    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Aggregation Report ===\n");
        summary.push_str(&format!("Files examined: {}\n", self.files_seen()));
        summary.push_str(&format!("Sensors aggregated: {}\n", self.records.len()));
        summary.push_str(&format!("Files skipped: {}\n", self.skipped.len()));

        for skipped in &self.skipped {
            summary.push_str(&format!("  - {}: {}\n", skipped.file_name, skipped.reason));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_follow_column_order() {
        let record = AggregateRecord {
            sensor_id: 7,
            pm25_mean: 20.0,
            pm25_median: 20.0,
            pm25_max: 30.0,
            n_obs: 3,
            ts_start: Some("2024-01-01".into()),
            ts_end: None,
            source_file: "sensor_7.csv".into(),
        };

        let cells = record.cells();
        assert_eq!(cells.len(), AggregateRecord::COLUMNS.len());
        assert_eq!(cells[0], "20");
        assert_eq!(cells[3], "3");
        assert_eq!(cells[5], "");
    }

    #[test]
    fn test_summary_lists_skip_reasons() {
        let report = AggregationReport {
            records: vec![],
            skipped: vec![SkippedFile {
                file_name: "notes.csv".into(),
                reason: SkipReason::NoSensorId,
            }],
        };

        let summary = report.generate_summary();
        assert!(summary.contains("Files examined: 1"));
        assert!(summary.contains("notes.csv: no sensor id in file or name"));
    }
}
