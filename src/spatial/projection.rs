//! WGS84 <-> UTM conversion using the Krüger series for the transverse
//! Mercator projection (third order in the third flattening `n`).

use crate::spatial::Crs;
use geo::{Coord, MapCoords, MultiPolygon, Point};

const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Transverse Mercator parameters for one UTM zone
#[derive(Debug, Clone, Copy)]
pub struct UtmProjection {
    central_meridian: f64,
    false_northing: f64,
    eccentricity: f64,
    rectifying_radius: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

impl UtmProjection {
    pub fn new(zone: u8, north: bool) -> Self {
        let n = FLATTENING / (2.0 - FLATTENING);
        let n2 = n * n;
        let n3 = n2 * n;

        Self {
            central_meridian: (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0,
            false_northing: if north { 0.0 } else { FALSE_NORTHING_SOUTH },
            eccentricity: (FLATTENING * (2.0 - FLATTENING)).sqrt(),
            rectifying_radius: SEMI_MAJOR_AXIS / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
                61.0 * n3 / 240.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
                n2 / 48.0 + n3 / 15.0,
                17.0 * n3 / 480.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
                56.0 * n3 / 15.0,
            ],
        }
    }

    pub fn central_meridian(&self) -> f64 {
        self.central_meridian
    }

    /// `(lon, lat)` degrees to `(easting, northing)` metres
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let lambda = (lon - self.central_meridian).to_radians();
        let e = self.eccentricity;

        let t = (phi.sin().atanh() - e * (e * phi.sin()).atanh()).sinh();
        let xi_prime = t.atan2(lambda.cos());
        let eta_prime = (lambda.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (j, alpha) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += alpha * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += alpha * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }

        let scale = SCALE_FACTOR * self.rectifying_radius;
        (FALSE_EASTING + scale * eta, self.false_northing + scale * xi)
    }

    /// `(easting, northing)` metres to `(lon, lat)` degrees
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let scale = SCALE_FACTOR * self.rectifying_radius;
        let xi = (northing - self.false_northing) / scale;
        let eta = (easting - FALSE_EASTING) / scale;

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (j, beta) in self.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_prime -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_prime.sin() / eta_prime.cosh()).asin();
        let mut phi = chi;
        for (j, delta) in self.delta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            phi += delta * (k * chi).sin();
        }

        let lambda = eta_prime.sinh().atan2(xi_prime.cos());

        (
            self.central_meridian + lambda.to_degrees(),
            phi.to_degrees(),
        )
    }
}

/// Point transform between two supported coordinate systems
#[derive(Debug, Clone, Copy)]
pub struct Transformer {
    source: Option<UtmProjection>,
    target: Option<UtmProjection>,
    identity: bool,
}

fn projection_for(crs: Crs) -> Option<UtmProjection> {
    match crs {
        Crs::Wgs84 => None,
        Crs::Utm { zone, north } => Some(UtmProjection::new(zone, north)),
    }
}

impl Transformer {
    pub fn new(from: Crs, to: Crs) -> Self {
        Self {
            source: projection_for(from),
            target: projection_for(to),
            identity: from == to,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    pub fn coord(&self, coord: Coord<f64>) -> Coord<f64> {
        if self.identity {
            return coord;
        }

        let (lon, lat) = match &self.source {
            Some(utm) => utm.inverse(coord.x, coord.y),
            None => (coord.x, coord.y),
        };

        let (x, y) = match &self.target {
            Some(utm) => utm.forward(lon, lat),
            None => (lon, lat),
        };

        Coord { x, y }
    }

    pub fn point(&self, point: Point<f64>) -> Point<f64> {
        Point::from(self.coord(point.0))
    }

    pub fn points(&self, points: &[Point<f64>]) -> Vec<Point<f64>> {
        points.iter().map(|p| self.point(*p)).collect()
    }

    pub fn multi_polygon(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        if self.identity {
            return geometry.clone();
        }
        geometry.map_coords(|coord| self.coord(coord))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Great-circle distance in km on a sphere of mean Earth radius
    fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lon = (lon2 - lon1).to_radians();
        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.to_radians().cos() * lat2.to_radians().cos() * (delta_lon / 2.0).sin().powi(2);
        6371.0 * 2.0 * a.sqrt().asin()
    }

    fn utm43() -> UtmProjection {
        UtmProjection::new(43, true)
    }

    #[test]
    fn test_central_meridian_origin() {
        let utm = utm43();
        assert_eq!(utm.central_meridian(), 75.0);

        let (e, n) = utm.forward(75.0, 0.0);
        assert!((e - 500_000.0).abs() < 1e-6);
        assert!(n.abs() < 1e-6);
    }

    #[test]
    fn test_meridian_arc_one_degree() {
        // WGS84 meridian arc from the equator to 1°N is ~110574.4 m
        let (_, n) = utm43().forward(75.0, 1.0);
        assert!((n - 0.9996 * 110_574.4).abs() < 2.0, "northing {}", n);
    }

    #[test]
    fn test_round_trip_lahore() {
        let utm = utm43();
        let (e, n) = utm.forward(74.3587, 31.5204);
        assert!(e < 500_000.0, "west of the central meridian");
        let (lon, lat) = utm.inverse(e, n);
        assert!((lon - 74.3587).abs() < 1e-7);
        assert!((lat - 31.5204).abs() < 1e-7);
    }

    #[test]
    fn test_southern_hemisphere_false_northing() {
        let utm = UtmProjection::new(33, false);
        let (_, n) = utm.forward(15.0, -1.0);
        assert!(n < 10_000_000.0 && n > 9_800_000.0);
        let (e, n) = utm.forward(16.2, -12.5);
        let (lon, lat) = utm.inverse(e, n);
        assert!((lon - 16.2).abs() < 1e-7);
        assert!((lat + 12.5).abs() < 1e-7);
    }

    #[test]
    fn test_metric_distance_matches_haversine() {
        let t = Transformer::new(Crs::Wgs84, Crs::from_epsg(32643).unwrap());
        let a = t.point(Point::new(74.30, 31.50));
        let b = t.point(Point::new(74.40, 31.55));

        let projected = ((a.x() - b.x()).powi(2) + (a.y() - b.y()).powi(2)).sqrt();
        let great_circle = haversine_km(31.50, 74.30, 31.55, 74.40) * 1000.0;

        // within 0.5%: scale factor plus sphere vs ellipsoid
        assert!((projected - great_circle).abs() / great_circle < 0.005);
    }

    #[test]
    fn test_identity_and_utm_to_utm() {
        let wgs = Crs::Wgs84;
        let utm = Crs::from_epsg(32643).unwrap();

        let identity = Transformer::new(utm, utm);
        assert!(identity.is_identity());
        let p = Point::new(439_000.0, 3_487_000.0);
        assert_eq!(identity.point(p), p);

        let forward = Transformer::new(wgs, utm);
        let back = Transformer::new(utm, wgs);
        let q = back.point(forward.point(Point::new(74.1, 31.3)));
        assert!((q.x() - 74.1).abs() < 1e-7);
        assert!((q.y() - 31.3).abs() < 1e-7);
    }
}
