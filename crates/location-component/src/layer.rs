//! Location puck layers
//!
//! [`LocationLayerController`] decides which parts of the puck are visible for the
//! current [`RenderMode`] and stale state, and turns layer animator ticks into
//! updates of the rendered feature through a [`LocationLayerRenderer`].

use crate::animator::{AnimatorKind, AnimatorListenerHolder};
use crate::geometry::{LatLng, ScreenPoint};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// How the location puck is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderMode {
    /// Position and accuracy circle
    #[default]
    Normal,
    /// Adds an arrow showing the compass heading
    Compass,
    /// Navigation style puck rotated with the GPS course, without accuracy circle
    Gps,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderMode::Normal => "normal",
            RenderMode::Compass => "compass",
            RenderMode::Gps => "gps",
        };
        f.write_str(name)
    }
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(RenderMode::Normal),
            "compass" => Ok(RenderMode::Compass),
            "gps" => Ok(RenderMode::Gps),
            other => Err(format!("unknown render mode '{other}'")),
        }
    }
}

/// Rendered elements of the location puck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationLayer {
    Shadow,
    Foreground,
    Background,
    Bearing,
    Accuracy,
}

impl LocationLayer {
    pub const ALL: [LocationLayer; 5] = [
        LocationLayer::Shadow,
        LocationLayer::Foreground,
        LocationLayer::Background,
        LocationLayer::Bearing,
        LocationLayer::Accuracy,
    ];

    /// Whether this element is shown in `render_mode` while the puck is visible
    pub fn is_visible_in(self, render_mode: RenderMode, stale: bool) -> bool {
        match (self, render_mode) {
            (LocationLayer::Foreground | LocationLayer::Background, _) => true,
            (LocationLayer::Shadow, RenderMode::Normal | RenderMode::Compass) => true,
            (LocationLayer::Bearing, RenderMode::Compass) => true,
            (LocationLayer::Accuracy, RenderMode::Normal | RenderMode::Compass) => !stale,
            _ => false,
        }
    }
}

/// Outbound rendering collaborator for the location puck
pub trait LocationLayerRenderer {
    fn on_new_lat_lng_value(&mut self, lat_lng: LatLng);
    fn on_new_gps_bearing_value(&mut self, bearing: f32);
    fn on_new_compass_bearing_value(&mut self, bearing: f32);
    /// Accuracy circle radius in pixels
    fn on_new_accuracy_radius_value(&mut self, radius: f32);
    fn set_layer_visibility(&mut self, layer: LocationLayer, visible: bool);
    fn set_locations_stale(&mut self, stale: bool);
    fn set_render_mode(&mut self, render_mode: RenderMode);
    /// Bearing of the foreground icon relative to the map, used outside GPS mode
    fn on_new_foreground_bearing(&mut self, bearing: f32);
    /// Icon offsets compensating for camera tilt
    fn on_new_foreground_offset(&mut self, foreground: ScreenPoint, shadow: ScreenPoint);
}

pub type SharedLayerRenderer = Rc<RefCell<dyn LocationLayerRenderer>>;

/// Icon offset per degree of tilt
const TILT_OFFSET_FACTOR: f64 = 0.05;

/// State shared with the animator listeners
struct LayerState {
    renderer: SharedLayerRenderer,
    render_mode: Cell<RenderMode>,
    stale: Cell<bool>,
    hidden: Cell<bool>,
}

impl LayerState {
    fn on_new_lat_lng_value(&self, lat_lng: LatLng) {
        self.renderer.borrow_mut().on_new_lat_lng_value(lat_lng);
    }

    fn on_new_gps_bearing_value(&self, bearing: f32) {
        if self.render_mode.get() == RenderMode::Gps {
            self.renderer.borrow_mut().on_new_gps_bearing_value(bearing);
        }
    }

    fn on_new_compass_bearing_value(&self, bearing: f32) {
        if self.render_mode.get() == RenderMode::Compass {
            self.renderer.borrow_mut().on_new_compass_bearing_value(bearing);
        }
    }

    fn on_new_accuracy_radius_value(&self, radius: f32) {
        if matches!(
            self.render_mode.get(),
            RenderMode::Normal | RenderMode::Compass
        ) {
            self.renderer.borrow_mut().on_new_accuracy_radius_value(radius);
        }
    }
}

pub struct LocationLayerController {
    state: Rc<LayerState>,
}

impl LocationLayerController {
    /// Starts hidden in [`RenderMode::Normal`]
    pub fn new(renderer: SharedLayerRenderer) -> Self {
        let controller = Self {
            state: Rc::new(LayerState {
                renderer,
                render_mode: Cell::new(RenderMode::Normal),
                stale: Cell::new(false),
                hidden: Cell::new(true),
            }),
        };
        controller.hide();
        controller
    }

    pub fn render_mode(&self) -> RenderMode {
        self.state.render_mode.get()
    }

    pub fn set_render_mode(&self, render_mode: RenderMode) {
        self.state.render_mode.set(render_mode);
        if self.state.hidden.get() {
            return;
        }

        let stale = self.state.stale.get();
        let mut renderer = self.state.renderer.borrow_mut();
        renderer.set_render_mode(render_mode);
        for layer in LocationLayer::ALL {
            renderer.set_layer_visibility(layer, layer.is_visible_in(render_mode, stale));
        }
    }

    pub fn show(&self) {
        self.state.hidden.set(false);
        self.set_render_mode(self.render_mode());
    }

    pub fn hide(&self) {
        self.state.hidden.set(true);
        let mut renderer = self.state.renderer.borrow_mut();
        for layer in LocationLayer::ALL {
            renderer.set_layer_visibility(layer, false);
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.state.hidden.get()
    }

    pub fn set_locations_stale(&self, stale: bool) {
        self.state.stale.set(stale);
        let mut renderer = self.state.renderer.borrow_mut();
        renderer.set_locations_stale(stale);
        if self.render_mode() != RenderMode::Gps && !self.state.hidden.get() {
            renderer.set_layer_visibility(LocationLayer::Accuracy, !stale);
        }
    }

    /// Keep the foreground icon pointing the same way when the map rotates
    pub fn update_foreground_bearing(&self, bearing: f32) {
        if self.render_mode() != RenderMode::Gps {
            self.state
                .renderer
                .borrow_mut()
                .on_new_foreground_bearing(bearing);
        }
    }

    /// Shift the foreground up and the shadow down as the camera tilts
    pub fn update_foreground_offset(&self, tilt: f64) {
        let offset = (TILT_OFFSET_FACTOR * tilt) as f32;
        self.state.renderer.borrow_mut().on_new_foreground_offset(
            ScreenPoint::new(0.0, -offset),
            ScreenPoint::new(0.0, offset),
        );
    }

    /// Listener subscriptions needed by the current render mode
    pub fn animation_listeners(&self) -> Vec<AnimatorListenerHolder> {
        let mut holders = Vec::with_capacity(3);

        let state = self.state.clone();
        holders.push(AnimatorListenerHolder::lat_lng(
            AnimatorKind::LayerLatLng,
            move |lat_lng| state.on_new_lat_lng_value(lat_lng),
        ));

        match self.render_mode() {
            RenderMode::Gps => {
                let state = self.state.clone();
                holders.push(AnimatorListenerHolder::float(
                    AnimatorKind::LayerGpsBearing,
                    move |bearing| state.on_new_gps_bearing_value(bearing),
                ));
            }
            RenderMode::Compass => {
                let state = self.state.clone();
                holders.push(AnimatorListenerHolder::float(
                    AnimatorKind::LayerCompassBearing,
                    move |bearing| state.on_new_compass_bearing_value(bearing),
                ));
            }
            RenderMode::Normal => {}
        }

        if matches!(self.render_mode(), RenderMode::Normal | RenderMode::Compass) {
            let state = self.state.clone();
            holders.push(AnimatorListenerHolder::float(
                AnimatorKind::LayerAccuracy,
                move |radius| state.on_new_accuracy_radius_value(radius),
            ));
        }

        holders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::AnimatorListener;
    use crate::headless::FeatureLayerRenderer;

    fn controller() -> (LocationLayerController, Rc<RefCell<FeatureLayerRenderer>>) {
        let renderer = Rc::new(RefCell::new(FeatureLayerRenderer::new()));
        (LocationLayerController::new(renderer.clone()), renderer)
    }

    fn kinds(holders: &[AnimatorListenerHolder]) -> Vec<AnimatorKind> {
        holders.iter().map(AnimatorListenerHolder::kind).collect()
    }

    #[test]
    fn test_starts_hidden() {
        let (controller, renderer) = controller();
        assert!(controller.is_hidden());
        assert!(renderer.borrow().feature().visible_layers.is_empty());
    }

    #[test]
    fn test_visibility_per_render_mode() {
        let (controller, renderer) = controller();
        controller.show();
        let visible = renderer.borrow().feature().visible_layers.clone();
        assert!(visible.contains(&LocationLayer::Accuracy));
        assert!(visible.contains(&LocationLayer::Shadow));
        assert!(!visible.contains(&LocationLayer::Bearing));

        controller.set_render_mode(RenderMode::Compass);
        assert!(renderer
            .borrow()
            .feature()
            .visible_layers
            .contains(&LocationLayer::Bearing));

        controller.set_render_mode(RenderMode::Gps);
        let visible = renderer.borrow().feature().visible_layers.clone();
        assert_eq!(visible.len(), 2);
        assert!(visible.contains(&LocationLayer::Foreground));
        assert!(visible.contains(&LocationLayer::Background));
    }

    #[test]
    fn test_render_mode_change_while_hidden_is_deferred() {
        let (controller, renderer) = controller();
        controller.set_render_mode(RenderMode::Compass);
        assert!(renderer.borrow().feature().visible_layers.is_empty());

        controller.show();
        assert!(renderer
            .borrow()
            .feature()
            .visible_layers
            .contains(&LocationLayer::Bearing));
    }

    #[test]
    fn test_stale_hides_accuracy_circle() {
        let (controller, renderer) = controller();
        controller.show();
        controller.set_locations_stale(true);
        assert!(renderer.borrow().feature().stale);
        assert!(!renderer
            .borrow()
            .feature()
            .visible_layers
            .contains(&LocationLayer::Accuracy));

        controller.set_locations_stale(false);
        assert!(renderer
            .borrow()
            .feature()
            .visible_layers
            .contains(&LocationLayer::Accuracy));
    }

    #[test]
    fn test_listeners_follow_render_mode() {
        let (controller, _renderer) = controller();
        assert_eq!(
            kinds(&controller.animation_listeners()),
            vec![AnimatorKind::LayerLatLng, AnimatorKind::LayerAccuracy]
        );

        controller.set_render_mode(RenderMode::Compass);
        assert_eq!(
            kinds(&controller.animation_listeners()),
            vec![
                AnimatorKind::LayerLatLng,
                AnimatorKind::LayerCompassBearing,
                AnimatorKind::LayerAccuracy
            ]
        );

        controller.set_render_mode(RenderMode::Gps);
        assert_eq!(
            kinds(&controller.animation_listeners()),
            vec![AnimatorKind::LayerLatLng, AnimatorKind::LayerGpsBearing]
        );
    }

    #[test]
    fn test_listener_updates_feature() {
        let (controller, renderer) = controller();
        let holders = controller.animation_listeners();
        let AnimatorListener::LatLng(listener) = holders[0].listener() else {
            panic!("position listener expected");
        };
        listener(LatLng::new(1.0, 2.0));
        assert_eq!(renderer.borrow().feature().position, Some(LatLng::new(1.0, 2.0)));
    }

    #[test]
    fn test_gps_bearing_ignored_outside_gps_mode() {
        let (controller, renderer) = controller();
        controller.set_render_mode(RenderMode::Gps);
        let holders = controller.animation_listeners();
        let AnimatorListener::Float(listener) = holders[1].listener() else {
            panic!("bearing listener expected");
        };

        listener(90.0);
        assert_eq!(renderer.borrow().feature().gps_bearing, Some(90.0));

        controller.set_render_mode(RenderMode::Normal);
        listener(180.0);
        assert_eq!(renderer.borrow().feature().gps_bearing, Some(90.0));
    }

    #[test]
    fn test_foreground_offset_follows_tilt() {
        let (controller, renderer) = controller();
        controller.update_foreground_offset(40.0);
        let feature = renderer.borrow().feature().clone();
        assert!((feature.foreground_offset.y + 2.0).abs() < 1e-6);
        assert!((feature.shadow_offset.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_foreground_bearing_skipped_in_gps_mode() {
        let (controller, renderer) = controller();
        controller.update_foreground_bearing(30.0);
        assert_eq!(renderer.borrow().feature().foreground_bearing, Some(30.0));

        controller.set_render_mode(RenderMode::Gps);
        controller.update_foreground_bearing(60.0);
        assert_eq!(renderer.borrow().feature().foreground_bearing, Some(30.0));
    }

    #[test]
    fn test_render_mode_parsing() {
        assert_eq!("GPS".parse::<RenderMode>(), Ok(RenderMode::Gps));
        assert_eq!(RenderMode::Compass.to_string(), "compass");
        assert!("arrow".parse::<RenderMode>().is_err());
    }
}
