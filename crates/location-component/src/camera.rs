//! Camera tracking
//!
//! [`LocationCameraController`] owns the [`CameraMode`] state machine. Camera
//! animator ticks only reach the map when the active mode follows the animated
//! quantity, and user gestures demote the mode so ticks stop fighting the user.

use crate::animator::{AnimatorKind, AnimatorListenerHolder};
use crate::geometry::{CameraPosition, LatLng, ScreenPoint};
use crate::options::LocationComponentOptions;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Which parts of the displayed location the camera follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CameraMode {
    /// The camera is not driven by the component
    #[default]
    None,
    /// Bearing follows the compass, position is free
    NoneCompass,
    /// Bearing follows the GPS course, position is free
    NoneGps,
    /// Position follows the location
    Tracking,
    /// Position follows the location, bearing follows the compass
    TrackingCompass,
    /// Position follows the location, bearing follows the GPS course
    TrackingGps,
    /// Position follows the location with the bearing locked to north
    TrackingGpsNorth,
}

impl CameraMode {
    pub const ALL: [CameraMode; 7] = [
        CameraMode::None,
        CameraMode::NoneCompass,
        CameraMode::NoneGps,
        CameraMode::Tracking,
        CameraMode::TrackingCompass,
        CameraMode::TrackingGps,
        CameraMode::TrackingGpsNorth,
    ];

    /// Camera position follows the location
    pub fn is_location_tracking(self) -> bool {
        matches!(
            self,
            CameraMode::Tracking
                | CameraMode::TrackingCompass
                | CameraMode::TrackingGps
                | CameraMode::TrackingGpsNorth
        )
    }

    /// Camera bearing is driven by the component
    pub fn is_bearing_tracking(self) -> bool {
        matches!(
            self,
            CameraMode::NoneCompass
                | CameraMode::TrackingCompass
                | CameraMode::NoneGps
                | CameraMode::TrackingGps
                | CameraMode::TrackingGpsNorth
        )
    }

    pub fn is_consuming_compass(self) -> bool {
        matches!(self, CameraMode::TrackingCompass | CameraMode::NoneCompass)
    }

    fn follows_gps_bearing(self) -> bool {
        matches!(
            self,
            CameraMode::TrackingGps | CameraMode::TrackingGpsNorth | CameraMode::NoneGps
        )
    }
}

impl fmt::Display for CameraMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CameraMode::None => "none",
            CameraMode::NoneCompass => "none-compass",
            CameraMode::NoneGps => "none-gps",
            CameraMode::Tracking => "tracking",
            CameraMode::TrackingCompass => "tracking-compass",
            CameraMode::TrackingGps => "tracking-gps",
            CameraMode::TrackingGpsNorth => "tracking-gps-north",
        };
        f.write_str(name)
    }
}

impl FromStr for CameraMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace('_', "-");
        CameraMode::ALL
            .into_iter()
            .find(|mode| mode.to_string() == normalized)
            .ok_or_else(|| format!("unknown camera mode '{s}'"))
    }
}

/// A single camera change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraUpdate {
    LatLng(LatLng),
    Bearing(f64),
    Zoom(f64),
    Tilt(f64),
}

/// Outbound map camera collaborator
pub trait MapCamera {
    fn camera_position(&self) -> CameraPosition;
    fn move_camera(&mut self, update: CameraUpdate);
    /// Stop any camera transition the map itself is running
    fn cancel_transitions(&mut self);
    /// Anchor for zoom and rotate gestures, `None` for the view center
    fn set_focal_point(&mut self, focal_point: Option<ScreenPoint>);
    fn to_screen_location(&self, lat_lng: &LatLng) -> ScreenPoint;
}

pub type SharedMapCamera = Rc<RefCell<dyn MapCamera>>;

/// Tracking notifications raised by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraTrackingEvent {
    /// The mode was set, possibly to the same value
    Changed(CameraMode),
    /// Location tracking was broken, by the user or explicitly
    Dismissed,
}

/// A move gesture as seen by the gesture detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveGesture {
    pub pointer_count: usize,
}

impl MoveGesture {
    pub fn single_finger() -> Self {
        Self { pointer_count: 1 }
    }

    pub fn multi_finger(pointer_count: usize) -> Self {
        Self { pointer_count }
    }
}

/// What the gesture detector should do after a move event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    Continue,
    /// Restart detection, the move threshold may have changed
    Interrupt,
}

/// State shared with the camera animator listeners
struct CameraState {
    map: SharedMapCamera,
    mode: Cell<CameraMode>,
    adjust_focal_point: Cell<bool>,
    invalidated: Cell<bool>,
}

impl CameraState {
    fn move_camera(&self, update: CameraUpdate) {
        self.map.borrow_mut().move_camera(update);
        self.invalidated.set(true);
    }

    fn on_new_lat_lng_value(&self, lat_lng: LatLng) {
        if !self.mode.get().is_location_tracking() {
            return;
        }
        self.move_camera(CameraUpdate::LatLng(lat_lng));

        if self.adjust_focal_point.replace(false) {
            let mut map = self.map.borrow_mut();
            let focal_point = map.to_screen_location(&lat_lng);
            map.set_focal_point(Some(focal_point));
        }
    }

    fn on_new_gps_bearing_value(&self, bearing: f32) {
        let mode = self.mode.get();
        let converging_north = mode == CameraMode::TrackingGpsNorth
            && self.map.borrow().camera_position().bearing != 0.0;
        if matches!(mode, CameraMode::TrackingGps | CameraMode::NoneGps) || converging_north {
            self.move_camera(CameraUpdate::Bearing(bearing as f64));
        }
    }

    fn on_new_compass_bearing_value(&self, bearing: f32) {
        if self.mode.get().is_consuming_compass() {
            self.move_camera(CameraUpdate::Bearing(bearing as f64));
        }
    }

    fn on_new_zoom_value(&self, zoom: f32) {
        self.move_camera(CameraUpdate::Zoom(zoom as f64));
    }

    fn on_new_tilt_value(&self, tilt: f32) {
        self.move_camera(CameraUpdate::Tilt(tilt as f64));
    }
}

pub struct LocationCameraController {
    state: Rc<CameraState>,
    on_tracking_event: Box<dyn Fn(CameraTrackingEvent)>,
    gestures_management: bool,
    initial_move_threshold: f32,
    multi_finger_move_threshold: f32,
    move_threshold: f32,
    interrupt: bool,
}

impl LocationCameraController {
    pub fn new(
        map: SharedMapCamera,
        options: &LocationComponentOptions,
        on_tracking_event: impl Fn(CameraTrackingEvent) + 'static,
    ) -> Self {
        let mut controller = Self {
            state: Rc::new(CameraState {
                map,
                mode: Cell::new(CameraMode::None),
                adjust_focal_point: Cell::new(false),
                invalidated: Cell::new(false),
            }),
            on_tracking_event: Box::new(on_tracking_event),
            gestures_management: false,
            initial_move_threshold: 0.0,
            multi_finger_move_threshold: 0.0,
            move_threshold: 0.0,
            interrupt: false,
        };
        controller.initialize_options(options);
        controller
    }

    pub fn initialize_options(&mut self, options: &LocationComponentOptions) {
        self.gestures_management = options.tracking_gestures_management;
        self.initial_move_threshold = options.tracking_initial_move_threshold;
        self.multi_finger_move_threshold = options.tracking_multi_finger_move_threshold;
        self.adjust_gestures_thresholds();
    }

    pub fn camera_mode(&self) -> CameraMode {
        self.state.mode.get()
    }

    /// Switch mode, notifying `Changed` and, when location tracking ends, `Dismissed`
    pub fn set_camera_mode(&mut self, camera_mode: CameraMode) {
        let was_tracking = self.camera_mode().is_location_tracking();
        self.state.mode.set(camera_mode);
        tracing::debug!("Camera mode set to {}", camera_mode);

        if camera_mode != CameraMode::None {
            self.state.map.borrow_mut().cancel_transitions();
        }
        if camera_mode.is_location_tracking() && !was_tracking {
            self.state.adjust_focal_point.set(true);
        }
        self.adjust_gestures_thresholds();
        self.notify_tracking_changed(was_tracking);
    }

    /// Pixel distance a pan must cover before it is reported as a move
    pub fn move_threshold(&self) -> f32 {
        self.move_threshold
    }

    pub fn is_consuming_compass(&self) -> bool {
        self.camera_mode().is_consuming_compass()
    }

    /// Whether the camera was moved since the last call
    pub fn take_camera_invalidated(&self) -> bool {
        self.state.invalidated.replace(false)
    }

    pub fn on_move_begin(&mut self, gesture: &MoveGesture) {
        if self.gestures_management
            && gesture.pointer_count > 1
            && self.move_threshold != self.multi_finger_move_threshold
            && self.camera_mode().is_location_tracking()
        {
            // Let a pinch with a small pan through without breaking tracking
            self.move_threshold = self.multi_finger_move_threshold;
            self.interrupt = true;
        } else if self.camera_mode() != CameraMode::None {
            self.set_camera_mode(CameraMode::None);
        }
    }

    pub fn on_move(&mut self, _gesture: &MoveGesture) -> GestureAction {
        if self.interrupt {
            return GestureAction::Interrupt;
        }
        let mode = self.camera_mode();
        if mode.is_location_tracking() || mode.is_bearing_tracking() {
            self.set_camera_mode(CameraMode::None);
            return GestureAction::Interrupt;
        }
        GestureAction::Continue
    }

    pub fn on_move_end(&mut self, _gesture: &MoveGesture) {
        if self.gestures_management && !self.interrupt && self.camera_mode().is_location_tracking()
        {
            self.move_threshold = self.initial_move_threshold;
        }
        self.interrupt = false;
    }

    pub fn on_rotate_begin(&mut self) {
        if self.camera_mode().is_bearing_tracking() {
            self.set_camera_mode(CameraMode::None);
        }
    }

    pub fn on_fling(&mut self) {
        self.set_camera_mode(CameraMode::None);
    }

    /// Last finger lifted
    pub fn on_touch_up(&mut self) {
        self.adjust_gestures_thresholds();
    }

    /// Listener subscriptions needed by the current mode
    pub fn animation_listeners(&self) -> Vec<AnimatorListenerHolder> {
        let mode = self.camera_mode();
        let mut holders = Vec::with_capacity(4);

        if mode.is_location_tracking() {
            let state = self.state.clone();
            holders.push(AnimatorListenerHolder::lat_lng(
                AnimatorKind::CameraLatLng,
                move |lat_lng| state.on_new_lat_lng_value(lat_lng),
            ));
        }
        if mode.follows_gps_bearing() {
            let state = self.state.clone();
            holders.push(AnimatorListenerHolder::float(
                AnimatorKind::CameraGpsBearing,
                move |bearing| state.on_new_gps_bearing_value(bearing),
            ));
        }
        if mode.is_consuming_compass() {
            let state = self.state.clone();
            holders.push(AnimatorListenerHolder::float(
                AnimatorKind::CameraCompassBearing,
                move |bearing| state.on_new_compass_bearing_value(bearing),
            ));
        }

        let state = self.state.clone();
        holders.push(AnimatorListenerHolder::float(AnimatorKind::Zoom, move |zoom| {
            state.on_new_zoom_value(zoom)
        }));
        let state = self.state.clone();
        holders.push(AnimatorListenerHolder::float(AnimatorKind::Tilt, move |tilt| {
            state.on_new_tilt_value(tilt)
        }));

        holders
    }

    fn adjust_gestures_thresholds(&mut self) {
        if !self.gestures_management {
            return;
        }
        self.move_threshold = if self.camera_mode().is_location_tracking() {
            self.initial_move_threshold
        } else {
            0.0
        };
    }

    fn notify_tracking_changed(&self, was_tracking: bool) {
        (self.on_tracking_event)(CameraTrackingEvent::Changed(self.camera_mode()));
        if was_tracking && !self.camera_mode().is_location_tracking() {
            self.state.map.borrow_mut().set_focal_point(None);
            (self.on_tracking_event)(CameraTrackingEvent::Dismissed);
        }
    }
}
