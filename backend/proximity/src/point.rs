use crate::{
    error::GeoError,
    geodesy::{haversine_distance, meter_to_lat_delta, meter_to_lon_delta},
};

/// Decimal places the upstream expects on box bounds (about 1.1 cm).
pub const BOUND_PRECISION: i32 = 7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    pub fn try_new(lat: f64, lon: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::LatitudeOutOfRange(lat));
        }

        if !(-180.0..=180.0).contains(&lon) {
            return Err(GeoError::LongitudeOutOfRange(lon));
        }

        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_distance(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Axis-aligned box that over-covers the circle of `radius` around a center.
///
/// Corners lie outside the circle, so anything fetched with it still needs a
/// distance check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn around(center: &GeoPoint, radius_meters: f64) -> Result<Self, GeoError> {
        let lat_offset = meter_to_lat_delta(radius_meters);
        let lon_offset = meter_to_lon_delta(radius_meters, center.lat)?;

        Ok(Self {
            min_lat: round_bound(center.lat - lat_offset),
            max_lat: round_bound(center.lat + lat_offset),
            min_lon: round_bound(center.lon - lon_offset),
            max_lon: round_bound(center.lon + lon_offset),
        })
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }
}

fn round_bound(value: f64) -> f64 {
    let scale = 10f64.powi(BOUND_PRECISION);

    (value * scale).round() / scale
}
