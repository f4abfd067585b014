//! Great-circle distance over a spherical Earth.
//!
//! Dedup and verification radii are 5 m and 50 m; at that scale the error of
//! the spherical approximation (vs. an ellipsoid) is far below a metre, so no
//! ellipsoidal correction is applied.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84-ish position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Haversine distance between two points, in metres.
///
/// Symmetric, and exactly zero for identical inputs.
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Shinjuku station front, roughly.
    const ORIGIN: GeoPoint = GeoPoint {
        lat: 35.690,
        lon: 139.700,
    };

    /// A point `meters` north of `p` (1 deg latitude ≈ 111.195 km on this sphere).
    fn north_of(p: GeoPoint, meters: f64) -> GeoPoint {
        GeoPoint {
            lat: p.lat + meters / 111_194.9,
            lon: p.lon,
        }
    }

    #[test]
    fn identity() {
        assert_eq!(distance_m(ORIGIN, ORIGIN), 0.0);
    }

    #[test]
    fn symmetric() {
        let b = north_of(ORIGIN, 42.0);
        assert_eq!(distance_m(ORIGIN, b), distance_m(b, ORIGIN));
    }

    #[test]
    fn four_meters_north() {
        let b = north_of(ORIGIN, 4.0);
        let d = distance_m(ORIGIN, b);
        assert!((d - 4.0).abs() < 0.05, "expected ~4m, got {d}");
    }

    #[test]
    fn sixty_meters_north() {
        let b = north_of(ORIGIN, 60.0);
        let d = distance_m(ORIGIN, b);
        assert!((d - 60.0).abs() < 0.5, "expected ~60m, got {d}");
    }

    #[test]
    fn tokyo_to_osaka_sanity() {
        let tokyo = GeoPoint::new(35.6812, 139.7671);
        let osaka = GeoPoint::new(34.7025, 135.4959);
        let d = distance_m(tokyo, osaka);
        // Roughly 400 km.
        assert!((390_000.0..420_000.0).contains(&d), "got {d}");
    }
}
