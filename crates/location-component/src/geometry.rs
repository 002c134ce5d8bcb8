//! Geographic and camera value types shared by the animation core

use std::time::Duration;

/// WGS84 equatorial radius in meters, as used by the map projection
pub const EARTH_RADIUS_M: f64 = 6378137.0;

/// A geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in meters (haversine)
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Componentwise midpoint, used for meters-per-pixel estimates
    pub fn midpoint(&self, other: &LatLng) -> LatLng {
        LatLng::new(
            (self.latitude + other.latitude) / 2.0,
            (self.longitude + other.longitude) / 2.0,
        )
    }
}

impl From<geo::Point<f64>> for LatLng {
    fn from(point: geo::Point<f64>) -> Self {
        LatLng::new(point.y(), point.x())
    }
}

impl From<LatLng> for geo::Point<f64> {
    fn from(lat_lng: LatLng) -> Self {
        geo::Point::new(lat_lng.longitude, lat_lng.latitude)
    }
}

/// Snapshot of the map camera
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraPosition {
    pub target: LatLng,
    pub zoom: f64,
    /// Degrees clockwise from north, in [0, 360)
    pub bearing: f64,
    pub tilt: f64,
}

impl CameraPosition {
    pub fn new(target: LatLng, zoom: f64, bearing: f64, tilt: f64) -> Self {
        Self {
            target,
            zoom,
            bearing,
            tilt,
        }
    }
}

/// A location fix as delivered by a location source
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub coordinate: LatLng,
    /// Course over ground in degrees
    pub bearing: f32,
    /// Horizontal accuracy radius in meters
    pub accuracy: f32,
    /// Time of the fix
    pub time: Duration,
}

impl Location {
    pub fn new(coordinate: LatLng, bearing: f32, accuracy: f32, time: Duration) -> Self {
        Self {
            coordinate,
            bearing,
            accuracy,
            time,
        }
    }
}

/// A position on screen in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}
