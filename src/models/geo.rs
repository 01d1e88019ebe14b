//! Geographic points, distances and units.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Mean earth radius in meters (IUGG)
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

const METERS_PER_KILOMETER: f64 = 1_000.0;
const METERS_PER_MILE: f64 = 1_609.344;

/// A WGS84 position, longitude first like GeoJSON
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Create a point, rejecting coordinates outside the valid ranges
    pub fn new(lon: f64, lat: f64) -> Result<Self> {
        let point = Self { lon, lat };
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<()> {
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(AppError::validation(format!(
                "longitude {} is outside [-180, 180]",
                self.lon
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(AppError::validation(format!(
                "latitude {} is outside [-90, 90]",
                self.lat
            )));
        }
        Ok(())
    }

    /// Great-circle distance in meters (haversine)
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }

    /// Bounding box enclosing every point within `meters` of `self`.
    ///
    /// The longitude span widens to the whole globe near the poles or
    /// when the box would wrap the antimeridian.
    pub fn bounding_box(&self, meters: f64) -> BoundingBox {
        let angular = (meters / EARTH_RADIUS_METERS).to_degrees();
        let min_lat = (self.lat - angular).max(-90.0);
        let max_lat = (self.lat + angular).min(90.0);

        let cos_lat = self.lat.to_radians().cos();
        let (min_lon, max_lon) = if max_lat >= 90.0 || min_lat <= -90.0 || cos_lat <= f64::EPSILON {
            (-180.0, 180.0)
        } else {
            let lon_span = angular / cos_lat;
            let (lo, hi) = (self.lon - lon_span, self.lon + lon_span);
            if lo < -180.0 || hi > 180.0 {
                (-180.0, 180.0)
            } else {
                (lo, hi)
            }
        };

        BoundingBox {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }
}

/// Unit of a search radius
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Kilometers,
    Miles,
}

impl DistanceUnit {
    fn meters_per_unit(self) -> f64 {
        match self {
            Self::Kilometers => METERS_PER_KILOMETER,
            Self::Miles => METERS_PER_MILE,
        }
    }
}

/// A distance tagged with its unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl Distance {
    pub fn new(value: f64, unit: DistanceUnit) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(AppError::validation(format!(
                "radius must be a positive number, got {}",
                value
            )));
        }
        Ok(Self { value, unit })
    }

    pub fn kilometers(value: f64) -> Result<Self> {
        Self::new(value, DistanceUnit::Kilometers)
    }

    pub fn miles(value: f64) -> Result<Self> {
        Self::new(value, DistanceUnit::Miles)
    }

    pub fn to_meters(&self) -> f64 {
        self.value * self.unit.meters_per_unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversion() {
        assert_eq!(Distance::kilometers(1.0).unwrap().to_meters(), 1000.0);
        assert_eq!(Distance::kilometers(2.5).unwrap().to_meters(), 2500.0);
        assert!((Distance::miles(1.0).unwrap().to_meters() - 1609.344).abs() < 1e-9);
        assert_eq!(
            Distance::new(3.0, DistanceUnit::Miles).unwrap().unit,
            DistanceUnit::Miles
        );
    }

    #[test]
    fn test_non_positive_radius_rejected() {
        assert!(Distance::kilometers(0.0).is_err());
        assert!(Distance::kilometers(-1.0).is_err());
        assert!(Distance::kilometers(f64::NAN).is_err());
    }

    #[test]
    fn test_point_validation() {
        assert!(GeoPoint::new(13.4, 52.5).is_ok());
        assert!(GeoPoint::new(181.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -90.5).is_err());
    }

    #[test]
    fn test_haversine_known_distance() {
        // Berlin Brandenburger Tor -> Berlin Alexanderplatz, roughly 2.3 km
        let tor = GeoPoint::new(13.377_704, 52.516_275).unwrap();
        let alex = GeoPoint::new(13.413_215, 52.521_918).unwrap();

        let d = tor.distance_meters(&alex);
        assert!((2_300.0..2_600.0).contains(&d), "distance was {}", d);
        assert_eq!(tor.distance_meters(&tor), 0.0);
    }

    #[test]
    fn test_one_degree_latitude() {
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(0.0, 1.0).unwrap();

        // 1 degree of latitude is about 111.2 km
        assert!((a.distance_meters(&b) - 111_195.0).abs() < 100.0);
    }

    #[test]
    fn test_bounding_box_contains_radius() {
        let center = GeoPoint::new(13.4, 52.5).unwrap();
        let bbox = center.bounding_box(10_000.0);

        let north = GeoPoint::new(13.4, 52.58).unwrap();
        let far = GeoPoint::new(14.5, 52.5).unwrap();
        assert!(bbox.contains(&center));
        assert!(bbox.contains(&north));
        assert!(!bbox.contains(&far));
    }

    #[test]
    fn test_bounding_box_near_pole_spans_globe() {
        let center = GeoPoint::new(0.0, 89.99).unwrap();
        let bbox = center.bounding_box(50_000.0);
        assert_eq!(bbox.min_lon, -180.0);
        assert_eq!(bbox.max_lon, 180.0);
    }
}
