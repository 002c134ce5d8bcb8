//! Rotation and projection helpers used when deciding how to animate

use crate::geometry::{EARTH_RADIUS_M, LatLng};
use geo::Point;

/// Web Mercator half extent in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Size of a map tile in pixels at integer zoom levels
pub const TILE_SIZE: f64 = 512.0;

/// Screen distance in pixels above which a location transition snaps instead of animating
pub const INSTANT_LOCATION_TRANSITION_THRESHOLD: f64 = 50_000.0;

/// Resolve `heading` so that animating from `previous_heading` takes the short way around.
///
/// Both inputs are expected in [0, 360). The returned value is congruent to
/// `heading` modulo 360 but may lie outside that range.
///
/// # Example
/// ```
/// use location_component::utils::shortest_rotation;
/// assert_eq!(shortest_rotation(10.0, 350.0), 370.0);
/// assert_eq!(shortest_rotation(350.0, 10.0), -10.0);
/// ```
#[inline]
pub fn shortest_rotation(heading: f32, previous_heading: f32) -> f32 {
    let diff = previous_heading - heading;
    if diff > 180.0 {
        heading + 360.0
    } else if diff < -180.0 {
        heading - 360.0
    } else {
        heading
    }
}

/// Wrap a bearing into [0, 360)
#[inline]
pub fn normalize_bearing(bearing: f64) -> f64 {
    let wrapped = bearing.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = lon * EARTH_MERCATOR_MAX / 180.0;
    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * EARTH_MERCATOR_MAX / std::f64::consts::PI;
    Point::new(x, y)
}

/// Ground resolution of the map at `latitude` for the given zoom level
#[inline]
pub fn meters_per_pixel_at_latitude(latitude: f64, zoom: f64) -> f64 {
    let latitude = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    latitude.to_radians().cos() * 2.0 * std::f64::consts::PI * EARTH_RADIUS_M
        / (TILE_SIZE * 2.0_f64.powf(zoom))
}

/// Whether moving from `previous` to `next` at `zoom` is too far to animate.
///
/// Uses the ground resolution at the midpoint latitude to convert the distance to pixels.
pub fn immediate_animation(zoom: f64, previous: &LatLng, next: &LatLng) -> bool {
    let center = previous.midpoint(next);
    let meters_per_pixel = meters_per_pixel_at_latitude(center.latitude, zoom);
    let pixel_distance = previous.distance_to(next) / meters_per_pixel;
    pixel_distance > INSTANT_LOCATION_TRANSITION_THRESHOLD
}

/// Accuracy circle radius in pixels for a fix with `accuracy` meters of uncertainty
pub fn calculate_zoom_level_radius(accuracy: f32, latitude: f64, zoom: f64) -> f32 {
    let meters_per_pixel = meters_per_pixel_at_latitude(latitude, zoom);
    (accuracy as f64 / meters_per_pixel) as f32
}

/// Initial great-circle bearing from `from` towards `to`, in [0, 360)
pub fn bearing_between(from: &LatLng, to: &LatLng) -> f32 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
    normalize_bearing(y.atan2(x).to_degrees()) as f32
}
