//! In-memory map camera and location layer
//!
//! These implement the outbound collaborator traits without any rendering, which
//! is enough to drive the component from tests, benchmarks or a replay tool and
//! observe what it would have done to a real map.

use crate::camera::{CameraUpdate, MapCamera};
use crate::geometry::{CameraPosition, LatLng, ScreenPoint};
use crate::layer::{LocationLayer, LocationLayerRenderer, RenderMode};
use crate::utils::{EARTH_MERCATOR_MAX, TILE_SIZE, normalize_bearing, wgs84_to_mercator};
use std::collections::BTreeSet;

/// Zoom range accepted by the camera
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 25.5;

/// Highest camera tilt in degrees
pub const MAX_TILT: f64 = 60.0;

/// A map camera that only keeps its position
#[derive(Debug, Clone)]
pub struct HeadlessMapCamera {
    position: CameraPosition,
    viewport_size: ScreenPoint,
    focal_point: Option<ScreenPoint>,
    move_count: usize,
    cancelled_transitions: usize,
    focal_point_updates: usize,
}

impl HeadlessMapCamera {
    /// A 1024x768 viewport looking at `position`
    pub fn new(position: CameraPosition) -> Self {
        Self {
            position,
            viewport_size: ScreenPoint::new(1024.0, 768.0),
            focal_point: None,
            move_count: 0,
            cancelled_transitions: 0,
            focal_point_updates: 0,
        }
    }

    pub fn with_viewport_size(mut self, width: f32, height: f32) -> Self {
        self.viewport_size = ScreenPoint::new(width, height);
        self
    }

    /// Move the camera as a user gesture would, without counting it as a component move
    pub fn set_camera_position(&mut self, position: CameraPosition) {
        self.position = position;
    }

    pub fn viewport_size(&self) -> ScreenPoint {
        self.viewport_size
    }

    /// Number of updates applied through [`MapCamera::move_camera`]
    pub fn move_count(&self) -> usize {
        self.move_count
    }

    pub fn cancelled_transitions(&self) -> usize {
        self.cancelled_transitions
    }

    pub fn focal_point(&self) -> Option<ScreenPoint> {
        self.focal_point
    }

    pub fn focal_point_updates(&self) -> usize {
        self.focal_point_updates
    }

    fn pixels_per_meter(&self) -> f64 {
        TILE_SIZE * 2.0_f64.powf(self.position.zoom) / (2.0 * EARTH_MERCATOR_MAX)
    }
}

impl MapCamera for HeadlessMapCamera {
    fn camera_position(&self) -> CameraPosition {
        self.position
    }

    fn move_camera(&mut self, update: CameraUpdate) {
        match update {
            CameraUpdate::LatLng(target) => self.position.target = target,
            CameraUpdate::Bearing(bearing) => self.position.bearing = normalize_bearing(bearing),
            CameraUpdate::Zoom(zoom) => self.position.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            CameraUpdate::Tilt(tilt) => self.position.tilt = tilt.clamp(0.0, MAX_TILT),
        }
        self.move_count += 1;
    }

    fn cancel_transitions(&mut self) {
        self.cancelled_transitions += 1;
    }

    fn set_focal_point(&mut self, focal_point: Option<ScreenPoint>) {
        self.focal_point = focal_point;
        self.focal_point_updates += 1;
    }

    /// Web Mercator projection around the viewport center, rotated by the bearing.
    /// Tilt is ignored.
    fn to_screen_location(&self, lat_lng: &LatLng) -> ScreenPoint {
        let center = wgs84_to_mercator(self.position.target.latitude, self.position.target.longitude);
        let point = wgs84_to_mercator(lat_lng.latitude, lat_lng.longitude);
        let scale = self.pixels_per_meter();

        let dx = (point.x() - center.x()) * scale;
        let dy = (center.y() - point.y()) * scale;
        let (sin, cos) = (-self.position.bearing).to_radians().sin_cos();

        ScreenPoint::new(
            self.viewport_size.x / 2.0 + (dx * cos - dy * sin) as f32,
            self.viewport_size.y / 2.0 + (dx * sin + dy * cos) as f32,
        )
    }
}

/// Properties of the rendered location feature
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationFeature {
    pub position: Option<LatLng>,
    pub gps_bearing: Option<f32>,
    pub compass_bearing: Option<f32>,
    pub accuracy_radius: Option<f32>,
    pub stale: bool,
    pub foreground_bearing: Option<f32>,
    pub foreground_offset: ScreenPoint,
    pub shadow_offset: ScreenPoint,
    pub visible_layers: BTreeSet<LocationLayer>,
    pub render_mode: RenderMode,
}

/// A location layer that writes every update into a [`LocationFeature`]
#[derive(Debug, Clone, Default)]
pub struct FeatureLayerRenderer {
    feature: LocationFeature,
    update_count: usize,
}

impl FeatureLayerRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feature(&self) -> &LocationFeature {
        &self.feature
    }

    /// Number of value updates received from animators
    pub fn update_count(&self) -> usize {
        self.update_count
    }
}

impl LocationLayerRenderer for FeatureLayerRenderer {
    fn on_new_lat_lng_value(&mut self, lat_lng: LatLng) {
        self.feature.position = Some(lat_lng);
        self.update_count += 1;
    }

    fn on_new_gps_bearing_value(&mut self, bearing: f32) {
        self.feature.gps_bearing = Some(bearing);
        self.update_count += 1;
    }

    fn on_new_compass_bearing_value(&mut self, bearing: f32) {
        self.feature.compass_bearing = Some(bearing);
        self.update_count += 1;
    }

    fn on_new_accuracy_radius_value(&mut self, radius: f32) {
        self.feature.accuracy_radius = Some(radius);
        self.update_count += 1;
    }

    fn set_layer_visibility(&mut self, layer: LocationLayer, visible: bool) {
        if visible {
            self.feature.visible_layers.insert(layer);
        } else {
            self.feature.visible_layers.remove(&layer);
        }
    }

    fn set_locations_stale(&mut self, stale: bool) {
        self.feature.stale = stale;
    }

    fn set_render_mode(&mut self, render_mode: RenderMode) {
        self.feature.render_mode = render_mode;
    }

    fn on_new_foreground_bearing(&mut self, bearing: f32) {
        self.feature.foreground_bearing = Some(bearing);
    }

    fn on_new_foreground_offset(&mut self, foreground: ScreenPoint, shadow: ScreenPoint) {
        self.feature.foreground_offset = foreground;
        self.feature.shadow_offset = shadow;
    }
}
