use crate::error::{ProcessingError, Result};
use crate::models::{RankedCell, Table};
use crate::spatial::Crs;
use crate::utils::constants::{COL_LATITUDE, COL_LONGITUDE};
use crate::utils::values::parse_number;
use serde_json::{json, Map, Value};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;
use tracing::{debug, info};

/// Writes point FeatureCollections.
///
/// Every write replaces an existing file at the target path: the old file is
/// removed and a new one created, so feature ids never mix across runs.
pub struct GeoJsonWriter;

impl GeoJsonWriter {
    pub fn new() -> Self {
        Self
    }

    /// Sensor rows as WGS84 points taken from the `latitude`/`longitude` columns.
    ///
    /// Rows without usable coordinates are left out. Returns the feature count.
    pub fn write_table_points(&self, table: &Table, path: &Path) -> Result<usize> {
        let lat_col = table.require_column("sensor table", &[COL_LATITUDE])?;
        let lon_col = table.require_column("sensor table", &[COL_LONGITUDE])?;

        let mut features = Vec::with_capacity(table.len());
        for (idx, row) in table.rows.iter().enumerate() {
            let coords = (
                table.value(idx, lon_col).map(parse_number),
                table.value(idx, lat_col).map(parse_number),
            );
            let (Some(Ok(Some(lon))), Some(Ok(Some(lat)))) = coords else {
                debug!(row = idx, "no coordinates, not exported");
                continue;
            };

            let properties: Map<String, Value> = table
                .headers
                .iter()
                .zip(row)
                .enumerate()
                .filter(|(col, _)| *col != lat_col && *col != lon_col)
                .map(|(_, (name, cell))| (name.clone(), cell_to_json(cell)))
                .collect();

            features.push(json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [lon, lat] },
                "properties": properties,
            }));
        }

        let count = features.len();
        self.write_collection(features, Crs::Wgs84, path)?;
        Ok(count)
    }

    /// Ranked cells with their rank; coordinates stay in `crs`
    pub fn write_ranked(&self, cells: &[RankedCell], crs: Crs, path: &Path) -> Result<usize> {
        let mut features = Vec::with_capacity(cells.len());

        for (idx, cell) in cells.iter().enumerate() {
            let mut properties = match serde_json::to_value(cell)? {
                Value::Object(map) => map,
                other => {
                    return Err(ProcessingError::InvalidFormat(format!(
                        "ranked cell serialised to {}",
                        other
                    )))
                }
            };
            properties.insert("rank".to_string(), json!(idx + 1));

            features.push(json!({
                "type": "Feature",
                "id": idx + 1,
                "geometry": {
                    "type": "Point",
                    "coordinates": [cell.location.x(), cell.location.y()],
                },
                "properties": properties,
            }));
        }

        self.write_collection(features, crs, path)?;
        Ok(cells.len())
    }

    fn write_collection(&self, features: Vec<Value>, crs: Crs, path: &Path) -> Result<()> {
        let count = features.len();
        let mut collection = json!({
            "type": "FeatureCollection",
            "features": features,
        });

        // RFC 7946 readers assume CRS84 when the member is absent
        if crs != Crs::Wgs84 {
            collection["crs"] = json!({
                "type": "name",
                "properties": { "name": crs.urn() },
            });
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "removed previous output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &collection)?;
        writer.flush()?;

        info!("Wrote {} features to {}", count, path.display());
        Ok(())
    }
}

impl Default for GeoJsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn cell_to_json(cell: &str) -> Value {
    match parse_number(cell) {
        Ok(None) => Value::Null,
        Ok(Some(n)) => json!(n),
        Err(_) => Value::String(cell.trim().to_string()),
    }
}
