//! # Geodesy
//!
//! Spherical Earth approximations, good enough for radii up to tens of km.

use std::f64::consts::PI;

use crate::error::GeoError;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Closest a latitude may get to a pole before `cos` collapses the longitude offset.
pub const POLE_TOLERANCE: f64 = 1e-6;

pub fn meter_to_lat_delta(meters: f64) -> f64 {
    meters / EARTH_RADIUS * (180.0 / PI)
}

/// Longitude degrees spanned by `meters` along the parallel at `at_latitude`.
///
/// Rejects latitudes within [`POLE_TOLERANCE`] of ±90° rather than returning
/// an infinite or NaN offset.
pub fn meter_to_lon_delta(meters: f64, at_latitude: f64) -> Result<f64, GeoError> {
    if !at_latitude.is_finite() || at_latitude.abs() >= 90.0 - POLE_TOLERANCE {
        return Err(GeoError::DegenerateLatitude(at_latitude));
    }

    let delta = meters / (EARTH_RADIUS * at_latitude.to_radians().cos()) * (180.0 / PI);

    if !delta.is_finite() {
        return Err(GeoError::DegenerateLatitude(at_latitude));
    }

    Ok(delta)
}

/// Great-circle distance in meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = ((d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        for (lat, lon) in [(0.0, 0.0), (37.0, 127.0), (-33.86, 151.2), (89.9, -179.9)] {
            assert_eq!(haversine_distance(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let there = haversine_distance(37.5665, 126.978, 35.1796, 129.0756);
        let back = haversine_distance(35.1796, 129.0756, 37.5665, 126.978);

        assert!((there - back).abs() < 1e-6);
    }

    #[test]
    fn test_seoul_to_busan() {
        let distance = haversine_distance(37.5665, 126.978, 35.1796, 129.0756);

        assert!((320_000.0..330_000.0).contains(&distance), "{distance}");
    }

    #[test]
    fn test_distance_grows_with_separation() {
        let near = haversine_distance(0.0, 0.0, 0.0, 0.01);
        let far = haversine_distance(0.0, 0.0, 0.0, 0.02);

        assert!(near < far);
    }

    #[test]
    fn test_diagonal_millidegree_at_equator() {
        let distance = haversine_distance(0.0, 0.0, 0.001, 0.001);

        assert!((157.0..158.0).contains(&distance), "{distance}");
    }

    #[test]
    fn test_lat_delta_for_one_degree_of_arc() {
        let meters = EARTH_RADIUS * PI / 180.0;

        assert!((meter_to_lat_delta(meters) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_lon_delta_widens_away_from_equator() {
        let equator = meter_to_lon_delta(5000.0, 0.0).unwrap();
        let seoul = meter_to_lon_delta(5000.0, 37.0).unwrap();

        assert!((equator - meter_to_lat_delta(5000.0)).abs() < 1e-12);
        assert!(seoul > equator);
    }

    #[test]
    fn test_lon_delta_rejects_poles() {
        assert_eq!(
            meter_to_lon_delta(5000.0, 90.0),
            Err(GeoError::DegenerateLatitude(90.0))
        );
        assert_eq!(
            meter_to_lon_delta(5000.0, -90.0),
            Err(GeoError::DegenerateLatitude(-90.0))
        );
        assert!(meter_to_lon_delta(5000.0, 89.9999999).is_err());
        assert!(meter_to_lon_delta(5000.0, f64::NAN).is_err());
    }
}
