use crate::config::RankingConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{Boundary, ExposureCell, ExposureLayer};
use crate::spatial::Crs;
use crate::utils::filename::first_existing;
use crate::utils::values::parse_number;
use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
    #[serde(default)]
    crs: Option<CrsMember>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<GeometryDef>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct GeometryDef {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

#[derive(Debug, Deserialize)]
struct CrsMember {
    properties: CrsProperties,
}

#[derive(Debug, Deserialize)]
struct CrsProperties {
    name: String,
}

/// A parsed GeoJSON document: its features and declared CRS
#[derive(Debug)]
pub struct GeoJsonDocument {
    pub features: Vec<Feature>,
    pub crs: Option<Crs>,
}

impl GeoJsonDocument {
    /// Declared CRS, or WGS84 when the document carries none
    pub fn crs_or_default(&self) -> Crs {
        self.crs.unwrap_or_default()
    }
}

pub struct GeoJsonReader;

impl GeoJsonReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_document(&self, path: &Path) -> Result<GeoJsonDocument> {
        let file = File::open(path)?;
        let value: Value = serde_json::from_reader(BufReader::new(file))?;
        Self::document_from_value(value)
    }

    /// Accepts a FeatureCollection, a single Feature or a bare geometry
    pub fn document_from_value(value: Value) -> Result<GeoJsonDocument> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let (features, crs) = match kind.as_str() {
            "FeatureCollection" => {
                let collection: FeatureCollection = serde_json::from_value(value)?;
                (collection.features, collection.crs)
            }
            "Feature" => {
                let crs = value
                    .get("crs")
                    .cloned()
                    .map(serde_json::from_value::<CrsMember>)
                    .transpose()?;
                (vec![serde_json::from_value(value)?], crs)
            }
            "" => {
                return Err(ProcessingError::InvalidFormat(
                    "GeoJSON object has no 'type'".to_string(),
                ))
            }
            _ => {
                let geometry: GeometryDef = serde_json::from_value(value)?;
                let feature = Feature {
                    id: None,
                    geometry: Some(geometry),
                    properties: None,
                };
                (vec![feature], None)
            }
        };

        let crs = crs.map(|member| member.properties.name.parse::<Crs>()).transpose()?;

        Ok(GeoJsonDocument { features, crs })
    }

    /// Study-area boundary: every (multi)polygon feature unioned into one geometry
    pub fn read_boundary(&self, path: &Path) -> Result<Boundary> {
        if !path.exists() {
            return Err(ProcessingError::FileNotFound {
                searched: vec![path.to_path_buf()],
            });
        }

        let document = self.read_document(path)?;
        let crs = document.crs_or_default();

        let mut polygons = Vec::new();
        for (idx, feature) in document.features.iter().enumerate() {
            match &feature.geometry {
                Some(geometry) => match geometry.kind.as_str() {
                    "Polygon" => polygons.push(polygon_from_value(&geometry.coordinates)?),
                    "MultiPolygon" => {
                        let parts: Vec<Value> = serde_json::from_value(geometry.coordinates.clone())?;
                        for part in &parts {
                            polygons.push(polygon_from_value(part)?);
                        }
                    }
                    other => warn!(feature = idx, kind = other, "ignoring non-polygon boundary feature"),
                },
                None => warn!(feature = idx, "ignoring boundary feature without geometry"),
            }
        }

        if polygons.is_empty() {
            return Err(ProcessingError::MissingData(format!(
                "{} contains no polygon geometry",
                path.display()
            )));
        }

        Ok(Boundary {
            geometry: MultiPolygon::new(polygons),
            crs,
        })
    }

    /// Exposure grid from the first existing candidate path
    pub fn read_exposure(
        &self,
        candidates: &[PathBuf],
        config: &RankingConfig,
    ) -> Result<(PathBuf, ExposureLayer)> {
        let path = first_existing(candidates)
            .cloned()
            .ok_or_else(|| ProcessingError::FileNotFound {
                searched: candidates.to_vec(),
            })?;

        let document = self.read_document(&path)?;
        let layer = exposure_layer_from_document(document, config)?;
        Ok((path, layer))
    }
}

impl Default for GeoJsonReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve field aliases once, then convert every point feature into a cell
pub fn exposure_layer_from_document(
    document: GeoJsonDocument,
    config: &RankingConfig,
) -> Result<ExposureLayer> {
    let crs = document.crs_or_default();

    // property names are matched case-insensitively
    let lowered: Vec<HashMap<String, Value>> = document
        .features
        .iter()
        .map(|feature| {
            feature
                .properties
                .iter()
                .flatten()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect()
        })
        .collect();

    let known: BTreeSet<&str> = lowered
        .iter()
        .flat_map(|props| props.keys().map(String::as_str))
        .collect();
    let resolve = |aliases: &[String]| -> Option<String> {
        aliases
            .iter()
            .map(|alias| alias.to_lowercase())
            .find(|alias| known.contains(alias.as_str()))
    };

    let population_key = resolve(&config.population_aliases).ok_or_else(|| {
        ProcessingError::missing_column("exposure layer", config.population_aliases.join(" | "))
    })?;
    let pollution_key = resolve(&config.pollution_aliases).ok_or_else(|| {
        ProcessingError::missing_column("exposure layer", config.pollution_aliases.join(" | "))
    })?;
    let id_key = resolve(&config.cell_id_aliases);
    debug!(
        population = %population_key,
        pollution = %pollution_key,
        cell_id = ?id_key,
        "resolved exposure fields"
    );

    let mut cells = Vec::with_capacity(document.features.len());
    let mut without_geometry = 0usize;

    for (idx, (feature, props)) in document.features.iter().zip(&lowered).enumerate() {
        let Some(geometry) = &feature.geometry else {
            without_geometry += 1;
            continue;
        };

        if geometry.kind != "Point" {
            return Err(ProcessingError::InvalidGeometry(format!(
                "exposure feature {} is a {}, expected Point",
                idx, geometry.kind
            )));
        }

        let cell_id = id_key
            .as_ref()
            .and_then(|key| props.get(key))
            .and_then(value_to_text)
            .or_else(|| feature.id.as_ref().and_then(value_to_text))
            .unwrap_or_else(|| idx.to_string());

        cells.push(ExposureCell {
            cell_id,
            population: props.get(&population_key).and_then(value_to_number),
            pollution: props.get(&pollution_key).and_then(value_to_number),
            location: point_from_value(&geometry.coordinates)?,
        });
    }

    if without_geometry > 0 {
        warn!(count = without_geometry, "exposure features without geometry dropped");
    }

    Ok(ExposureLayer { cells, crs })
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        }),
        _ => None,
    }
}

/// Numeric coercion: unparseable or null values are missing
fn value_to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s).ok().flatten(),
        _ => None,
    }
}

fn coord_from_value(value: &Value) -> Result<Coord<f64>> {
    let position: Vec<f64> = serde_json::from_value(value.clone())?;
    match position.as_slice() {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(ProcessingError::InvalidGeometry(format!(
            "position needs two ordinates, got {}",
            value
        ))),
    }
}

fn point_from_value(value: &Value) -> Result<Point<f64>> {
    coord_from_value(value).map(Point::from)
}

fn ring_from_value(value: &Value) -> Result<LineString<f64>> {
    let positions = value.as_array().ok_or_else(|| {
        ProcessingError::InvalidGeometry("linear ring must be an array".to_string())
    })?;

    positions
        .iter()
        .map(coord_from_value)
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn polygon_from_value(value: &Value) -> Result<Polygon<f64>> {
    let rings = value
        .as_array()
        .ok_or_else(|| ProcessingError::InvalidGeometry("polygon must be an array".to_string()))?;

    let mut rings = rings.iter().map(ring_from_value);
    let exterior = rings
        .next()
        .ok_or_else(|| ProcessingError::InvalidGeometry("polygon has no rings".to_string()))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;

    Ok(Polygon::new(exterior, interiors))
}
