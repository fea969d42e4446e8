use crate::config::JoinConfig;
use crate::error::Result;
use crate::models::Table;
use crate::readers::TableReader;
use crate::utils::constants::{COL_LATITUDE, COL_LONGITUDE};
use crate::utils::coordinates::parse_coordinate;
use crate::utils::values::normalize_key;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

const PRIMARY_SUFFIX: &str = "_pm";
const SECONDARY_SUFFIX: &str = "_loc";

/// Where the output latitude/longitude were taken from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateSource {
    Locations { latitude: String, longitude: String },
    Primary { latitude: String, longitude: String },
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub table: Table,
    pub primary_rows: usize,
    pub secondary_rows: usize,
    pub dropped: usize,
    pub coordinate_source: CoordinateSource,
}

/// Left-joins sensor attributes onto sensor locations and resolves coordinates
pub struct MetadataJoiner<'a> {
    config: &'a JoinConfig,
}

impl<'a> MetadataJoiner<'a> {
    pub fn new(config: &'a JoinConfig) -> Self {
        Self { config }
    }

    pub fn join_files(&self, primary_path: &Path, secondary_path: &Path) -> Result<JoinOutcome> {
        let reader = TableReader::new();
        let primary = reader.read(primary_path)?;
        let secondary = reader.read(secondary_path)?;

        info!(rows = primary.len(), columns = ?primary.headers, "PM2.5 sensor table loaded");
        info!(rows = secondary.len(), columns = ?secondary.headers, "locations table loaded");

        self.join(&primary, &secondary)
    }

    pub fn join(&self, primary: &Table, secondary: &Table) -> Result<JoinOutcome> {
        let key = self.config.key.as_str();
        let primary_key = primary.require_column("sensor table", &[key])?;
        let secondary_key = secondary.require_column("locations table", &[key])?;

        let (mut merged, pairs) = left_join(primary, primary_key, secondary, secondary_key);

        let coordinate_source = self.coordinate_source(primary, secondary);
        let (latitudes, longitudes): (Vec<Option<f64>>, Vec<Option<f64>>) = match &coordinate_source {
            CoordinateSource::Locations {
                latitude,
                longitude,
            } => {
                let lat_col = secondary.column_index(latitude);
                let lon_col = secondary.column_index(longitude);
                pairs
                    .iter()
                    .map(|(_, sec)| {
                        (
                            sec.and_then(|row| coordinate(secondary, row, lat_col)),
                            sec.and_then(|row| coordinate(secondary, row, lon_col)),
                        )
                    })
                    .unzip()
            }
            CoordinateSource::Primary {
                latitude,
                longitude,
            } => {
                let lat_col = primary.column_index(latitude);
                let lon_col = primary.column_index(longitude);
                pairs
                    .iter()
                    .map(|(pri, _)| {
                        (
                            coordinate(primary, *pri, lat_col),
                            coordinate(primary, *pri, lon_col),
                        )
                    })
                    .unzip()
            }
            CoordinateSource::Unavailable => {
                warn!("no latitude/longitude columns in either table");
                (vec![None; pairs.len()], vec![None; pairs.len()])
            }
        };

        merged.set_column(COL_LATITUDE, format_coordinates(&latitudes))?;
        merged.set_column(COL_LONGITUDE, format_coordinates(&longitudes))?;

        let lat_idx = merged.column_index(COL_LATITUDE);
        let lon_idx = merged.column_index(COL_LONGITUDE);
        let dropped = merged.retain_rows(|row| {
            let present = |idx: Option<usize>| idx.is_some_and(|i| !row[i].is_empty());
            present(lat_idx) && present(lon_idx)
        });
        info!("Dropped {} sensors without coordinates.", dropped);

        Ok(JoinOutcome {
            table: merged.select(&self.config.keep_columns),
            primary_rows: primary.len(),
            secondary_rows: secondary.len(),
            dropped,
            coordinate_source,
        })
    }

    /// Locations-table columns win; primary fallbacks only when they are absent
    fn coordinate_source(&self, primary: &Table, secondary: &Table) -> CoordinateSource {
        let header = |table: &Table, candidates: &[String]| {
            table
                .resolve_column(candidates)
                .map(|idx| table.headers[idx].clone())
        };

        if let (Some(latitude), Some(longitude)) = (
            header(secondary, &self.config.latitude_columns),
            header(secondary, &self.config.longitude_columns),
        ) {
            return CoordinateSource::Locations {
                latitude,
                longitude,
            };
        }

        if let (Some(latitude), Some(longitude)) = (
            header(primary, &self.config.fallback_latitude_columns),
            header(primary, &self.config.fallback_longitude_columns),
        ) {
            return CoordinateSource::Primary {
                latitude,
                longitude,
            };
        }

        CoordinateSource::Unavailable
    }
}

fn coordinate(table: &Table, row: usize, col: Option<usize>) -> Option<f64> {
    let text = table.value(row, col?)?;
    match parse_coordinate(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(value = text, error = %e, "unreadable coordinate treated as missing");
            None
        }
    }
}

fn format_coordinates(values: &[Option<f64>]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.map(|x| x.to_string()).unwrap_or_default())
        .collect()
}

/// Left-outer merge on one key column.
///
/// Every primary row appears at least once (once per matching secondary row);
/// unmatched secondary rows are dropped. Overlapping non-key columns get
/// `_pm` / `_loc` suffixes. Also returns, per output row, the source row
/// indices so callers can read typed values without re-parsing the merged text.
pub fn left_join(
    primary: &Table,
    primary_key: usize,
    secondary: &Table,
    secondary_key: usize,
) -> (Table, Vec<(usize, Option<usize>)>) {
    let key_name = &primary.headers[primary_key];
    let primary_names: HashSet<&str> = primary.headers.iter().map(String::as_str).collect();
    let overlap: HashSet<&str> = secondary
        .headers
        .iter()
        .enumerate()
        .filter(|(idx, name)| *idx != secondary_key && primary_names.contains(name.as_str()))
        .map(|(_, name)| name.as_str())
        .filter(|name| *name != key_name.as_str())
        .collect();

    let mut headers: Vec<String> = primary
        .headers
        .iter()
        .map(|name| {
            if overlap.contains(name.as_str()) {
                format!("{}{}", name, PRIMARY_SUFFIX)
            } else {
                name.clone()
            }
        })
        .collect();

    let secondary_cols: Vec<usize> = (0..secondary.headers.len())
        .filter(|idx| *idx != secondary_key)
        .collect();
    headers.extend(secondary_cols.iter().map(|&idx| {
        let name = &secondary.headers[idx];
        if overlap.contains(name.as_str()) {
            format!("{}{}", name, SECONDARY_SUFFIX)
        } else {
            name.clone()
        }
    }));

    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for row in 0..secondary.len() {
        if let Some(key) = secondary.value(row, secondary_key).and_then(normalize_key) {
            index.entry(key).or_default().push(row);
        }
    }

    let mut rows = Vec::with_capacity(primary.len());
    let mut pairs = Vec::with_capacity(primary.len());

    for (pri, primary_row) in primary.rows.iter().enumerate() {
        let matches = primary
            .value(pri, primary_key)
            .and_then(normalize_key)
            .and_then(|key| index.get(&key));

        match matches {
            Some(matched) => {
                for &sec in matched {
                    let mut row = primary_row.clone();
                    row.extend(secondary_cols.iter().map(|&c| secondary.rows[sec][c].clone()));
                    rows.push(row);
                    pairs.push((pri, Some(sec)));
                }
            }
            None => {
                let mut row = primary_row.clone();
                row.extend(std::iter::repeat(String::new()).take(secondary_cols.len()));
                rows.push(row);
                pairs.push((pri, None));
            }
        }
    }

    (Table::with_rows(headers, rows), pairs)
}
