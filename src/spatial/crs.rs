use crate::error::{ProcessingError, Result};
use std::fmt;
use std::str::FromStr;

/// Coordinate reference systems the pipeline can reproject between.
///
/// Geographic coordinates are always `(x, y) = (lon, lat)` in degrees;
/// UTM coordinates are `(easting, northing)` in metres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Crs {
    /// EPSG:4326 / OGC CRS84
    #[default]
    Wgs84,
    /// WGS84 / UTM, EPSG:326zz (north) or EPSG:327zz (south)
    Utm { zone: u8, north: bool },
}

impl Crs {
    pub fn from_epsg(code: u32) -> Result<Self> {
        match code {
            4326 => Ok(Crs::Wgs84),
            32601..=32660 => Ok(Crs::Utm {
                zone: (code - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Ok(Crs::Utm {
                zone: (code - 32700) as u8,
                north: false,
            }),
            _ => Err(ProcessingError::UnsupportedCrs(format!("EPSG:{}", code))),
        }
    }

    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::Utm { zone, north: true } => 32600 + *zone as u32,
            Crs::Utm { zone, north: false } => 32700 + *zone as u32,
        }
    }

    pub fn is_metric(&self) -> bool {
        matches!(self, Crs::Utm { .. })
    }

    /// Name written into the legacy GeoJSON `crs` member
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg())
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = ProcessingError;

    /// Accepts `EPSG:32643`, `epsg:4326`, `urn:ogc:def:crs:EPSG::4326`,
    /// `urn:ogc:def:crs:OGC:1.3:CRS84` and bare codes.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();

        if upper.ends_with("CRS84") {
            return Ok(Crs::Wgs84);
        }

        let code = upper
            .rsplit(':')
            .next()
            .filter(|tail| !tail.is_empty())
            .and_then(|tail| tail.parse::<u32>().ok())
            .ok_or_else(|| ProcessingError::UnsupportedCrs(trimmed.to_string()))?;

        if upper.contains(':') && !upper.contains("EPSG") {
            return Err(ProcessingError::UnsupportedCrs(trimmed.to_string()));
        }

        Crs::from_epsg(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_spellings() {
        assert_eq!("EPSG:4326".parse::<Crs>().unwrap(), Crs::Wgs84);
        assert_eq!("epsg:4326".parse::<Crs>().unwrap(), Crs::Wgs84);
        assert_eq!(
            "urn:ogc:def:crs:OGC:1.3:CRS84".parse::<Crs>().unwrap(),
            Crs::Wgs84
        );
        assert_eq!(
            "urn:ogc:def:crs:EPSG::32643".parse::<Crs>().unwrap(),
            Crs::Utm {
                zone: 43,
                north: true
            }
        );
        assert_eq!(
            "32733".parse::<Crs>().unwrap(),
            Crs::Utm {
                zone: 33,
                north: false
            }
        );
    }

    #[test]
    fn test_unsupported() {
        assert!("EPSG:3857".parse::<Crs>().is_err());
        assert!("ESRI:102003".parse::<Crs>().is_err());
        assert!("".parse::<Crs>().is_err());
    }

    #[test]
    fn test_epsg_round_trip() {
        for code in [4326, 32601, 32643, 32660, 32701, 32760] {
            assert_eq!(Crs::from_epsg(code).unwrap().epsg(), code);
        }
        assert_eq!(Crs::from_epsg(32643).unwrap().to_string(), "EPSG:32643");
        assert!(Crs::from_epsg(32643).unwrap().is_metric());
        assert!(!Crs::Wgs84.is_metric());
    }
}
