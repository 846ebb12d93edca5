//! Geodetic points and the local East-North-Up plane
//!
//! Everything here uses the equirectangular approximation around a
//! reference point. That is accurate to well under a metre for the ranges a
//! shipborne or airborne sensor observes (tens of kilometres).

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Knots to meters per second
pub const KN_TO_MS: f64 = 1852.0 / 3600.0;

/// Meters per second to knots
pub const MS_TO_KN: f64 = 3600.0 / 1852.0;

/// A point on the Earth's surface in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }

    /// East/north offset in meters of `self` as seen from `origin`
    pub fn local_from(&self, origin: &GeoPoint) -> LocalPosition {
        let (east, north) = enu_offset(origin, self);
        LocalPosition { east, north }
    }

    /// Distance in meters, using the plane tangent at `self`
    ///
    /// Unlike comparing two [`LocalPosition`]s, this does not depend on how
    /// far both points are from the plane's origin.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let (east, north) = enu_offset(self, other);
        east.hypot(north)
    }
}

/// Position on the local tangent plane, meters from the plane's origin
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalPosition {
    pub east: f64,
    pub north: f64,
}

impl LocalPosition {
    pub fn new(east: f64, north: f64) -> Self {
        LocalPosition { east, north }
    }

    /// Euclidean distance in meters
    pub fn distance_to(&self, other: &LocalPosition) -> f64 {
        (self.east - other.east).hypot(self.north - other.north)
    }

    /// Convert back to a geodetic point around `origin`
    pub fn to_geo(&self, origin: &GeoPoint) -> GeoPoint {
        let lat0 = origin.lat.to_radians();
        let lat = origin.lat + (self.north / EARTH_RADIUS).to_degrees();
        let cos_lat0 = lat0.cos();
        let lon = if cos_lat0.abs() < 1e-12 {
            origin.lon
        } else {
            origin.lon + (self.east / (EARTH_RADIUS * cos_lat0)).to_degrees()
        };
        GeoPoint { lat, lon }
    }
}

/// Velocity on the local plane in meters per second
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub east: f64,
    pub north: f64,
}

impl Velocity {
    pub fn new(east: f64, north: f64) -> Self {
        Velocity { east, north }
    }

    /// Velocity from a course over ground (degrees, clockwise from north)
    /// and a speed in knots
    pub fn from_course_speed(course_deg: f64, speed_kn: f64) -> Self {
        let course = course_deg.to_radians();
        let speed = speed_kn * KN_TO_MS;
        Velocity {
            east: speed * course.sin(),
            north: speed * course.cos(),
        }
    }

    /// Speed in knots
    pub fn speed_knots(&self) -> f64 {
        self.east.hypot(self.north) * MS_TO_KN
    }

    /// Course over ground in degrees (0-360)
    pub fn course(&self) -> f64 {
        let mut course = self.east.atan2(self.north).to_degrees();
        if course < 0.0 {
            course += 360.0;
        }
        course
    }
}

/// East and north offset in meters from `origin` to `target`
///
/// north = Δlat·R, east = Δlon·R·cos(lat0)
pub fn enu_offset(origin: &GeoPoint, target: &GeoPoint) -> (f64, f64) {
    let cos_lat0 = origin.lat.to_radians().cos();
    let north = (target.lat - origin.lat).to_radians() * EARTH_RADIUS;
    let east = (target.lon - origin.lon).to_radians() * EARTH_RADIUS * cos_lat0;
    (east, north)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_degree_latitude() {
        let origin = GeoPoint::new(0.0, 0.0);
        let p = GeoPoint::new(1.0, 0.0).local_from(&origin);
        assert!(p.east.abs() < 1e-9);
        assert!((p.north - 111_194.93).abs() < 0.1);
    }

    #[test]
    fn test_longitude_shrinks_with_latitude() {
        let origin = GeoPoint::new(60.0, 5.0);
        let p = GeoPoint::new(60.0, 6.0).local_from(&origin);
        // cos(60°) = 0.5
        assert!((p.east - 111_194.93 * 0.5).abs() < 0.1);
    }

    #[test]
    fn test_local_to_geo_inverse() {
        let origin = GeoPoint::new(51.9, 4.1);
        let target = GeoPoint::new(51.95, 4.2);
        let back = target.local_from(&origin).to_geo(&origin);
        assert!((back.lat - target.lat).abs() < 1e-9);
        assert!((back.lon - target.lon).abs() < 1e-9);
    }

    #[test]
    fn test_distance_uses_local_latitude() {
        let a = GeoPoint::new(52.0, 4.0);
        let b = LocalPosition::new(400.0, 0.0).to_geo(&a);
        assert!((a.distance_to(&b) - 400.0).abs() < 1e-6);
        assert!((b.distance_to(&a) - 400.0).abs() < 1e-6);

        // Seen from an origin on the equator the same pair is 1.6 times apart
        let equator = GeoPoint::default();
        let skewed = a.local_from(&equator).distance_to(&b.local_from(&equator));
        assert!(skewed > 600.0);
    }

    #[test]
    fn test_velocity_from_course_speed() {
        let v = Velocity::from_course_speed(90.0, 10.0);
        assert!((v.east - 10.0 * KN_TO_MS).abs() < 1e-9);
        assert!(v.north.abs() < 1e-9);
        assert!((v.speed_knots() - 10.0).abs() < 1e-9);
        assert!((v.course() - 90.0).abs() < 1e-9);
    }
}
