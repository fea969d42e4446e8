use crate::error::Result;
use crate::models::{SensorRecord, Table};
use crate::readers::TableReader;
use crate::utils::constants::{COL_LATITUDE, COL_LONGITUDE, COL_SENSOR_ID};
use crate::utils::coordinates::parse_coordinate;
use crate::utils::values::parse_integral;
use std::path::Path;
use tracing::{info, warn};
use validator::Validate;

const NAME_COLUMNS: [&str; 2] = ["sensor_name", "name"];
const OWNER_COLUMNS: [&str; 1] = ["owner_name"];
const FIRST_SEEN_COLUMNS: [&str; 1] = ["datetimeFirst_utc"];
const LAST_SEEN_COLUMNS: [&str; 1] = ["datetimeLast_utc"];

/// Reads sensor point records from a joined sensor table
pub struct SensorReader;

impl SensorReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&self, path: &Path) -> Result<Vec<SensorRecord>> {
        let table = TableReader::new().read(path)?;
        let sensors = self.sensors_from_table(&table)?;
        info!(path = %path.display(), sensors = sensors.len(), "sensors loaded");
        Ok(sensors)
    }

    /// Rows without an id or usable coordinates are dropped
    pub fn sensors_from_table(&self, table: &Table) -> Result<Vec<SensorRecord>> {
        let id_col = table.require_column("sensor table", &[COL_SENSOR_ID])?;
        let lat_col = table.require_column("sensor table", &[COL_LATITUDE])?;
        let lon_col = table.require_column("sensor table", &[COL_LONGITUDE])?;
        let name_col = table.resolve_column(&NAME_COLUMNS);
        let owner_col = table.resolve_column(&OWNER_COLUMNS);
        let first_col = table.resolve_column(&FIRST_SEEN_COLUMNS);
        let last_col = table.resolve_column(&LAST_SEEN_COLUMNS);

        let text = |row: usize, col: Option<usize>| -> Option<String> {
            col.and_then(|c| table.value(row, c)).map(str::to_string)
        };

        let mut sensors = Vec::with_capacity(table.len());
        let mut dropped = 0usize;

        for row in 0..table.len() {
            let id = table.value(row, id_col).and_then(parse_integral);
            let lat = table
                .value(row, lat_col)
                .and_then(|v| parse_coordinate(v).ok().flatten());
            let lon = table
                .value(row, lon_col)
                .and_then(|v| parse_coordinate(v).ok().flatten());

            let (Some(id), Some(lat), Some(lon)) = (id, lat, lon) else {
                dropped += 1;
                continue;
            };

            let mut sensor = SensorRecord::new(id, lat, lon)
                .with_time_range(text(row, first_col), text(row, last_col));
            sensor.name = text(row, name_col);
            sensor.owner = text(row, owner_col);

            if let Err(e) = sensor.validate() {
                warn!(sensor_id = id, error = %e, "sensor coordinates out of range, dropped");
                dropped += 1;
                continue;
            }

            sensors.push(sensor);
        }

        if dropped > 0 {
            warn!(dropped, "sensor rows without id or coordinates dropped");
        }

        Ok(sensors)
    }
}

impl Default for SensorReader {
    fn default() -> Self {
        Self::new()
    }
}
