//! The location component facade
//!
//! [`LocationComponent`] wires inbound location, compass, gesture and camera events
//! to the animator coordinator and the two controllers, and owns the lifecycle:
//! the component only animates while it is both started and enabled.
//!
//! Notifications raised while the coordinator or a controller is busy (stale
//! flips, tracking changes) are queued and dispatched once the triggering call
//! has finished, so user listeners never run in the middle of an update.

use crate::animator::CancelableCallback;
use crate::camera::{
    CameraMode, CameraTrackingEvent, GestureAction, LocationCameraController, MoveGesture,
    SharedMapCamera,
};
use crate::clock::Clock;
use crate::coordinator::LocationAnimatorCoordinator;
use crate::geometry::{CameraPosition, Location};
use crate::layer::{LocationLayerController, RenderMode, SharedLayerRenderer};
use crate::options::LocationComponentOptions;
use crate::stale::StaleStateManager;
use crate::utils::calculate_zoom_level_radius;
use crate::{LocationError, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// Default duration of [`LocationComponent::zoom_while_tracking`]
pub const DEFAULT_TRACKING_ZOOM_ANIMATION_DURATION: Duration = Duration::from_millis(750);

/// Default duration of [`LocationComponent::tilt_while_tracking`]
pub const DEFAULT_TRACKING_TILT_ANIMATION_DURATION: Duration = Duration::from_millis(1250);

/// Reliability reported by the heading sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompassAccuracy {
    Unreliable,
    Low,
    Medium,
    High,
}

enum ComponentEvent {
    Tracking(CameraTrackingEvent),
    Stale(bool),
}

type EventQueue = Rc<RefCell<VecDeque<ComponentEvent>>>;

pub struct LocationComponent {
    map: SharedMapCamera,
    options: LocationComponentOptions,
    coordinator: LocationAnimatorCoordinator,
    camera_controller: LocationCameraController,
    layer_controller: LocationLayerController,
    stale_manager: StaleStateManager,
    events: EventQueue,
    tracking_listeners: Vec<Box<dyn FnMut(CameraTrackingEvent)>>,
    stale_listeners: Vec<Box<dyn FnMut(bool)>>,
    last_location: Option<Location>,
    last_compass_heading: Option<f32>,
    last_compass_accuracy: Option<CompassAccuracy>,
    last_camera_position: Option<CameraPosition>,
    started: bool,
    enabled: bool,
    layer_ready: bool,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl LocationComponent {
    /// Create a stopped, disabled component in [`RenderMode::Normal`] and [`CameraMode::None`]
    pub fn new(
        map: SharedMapCamera,
        renderer: SharedLayerRenderer,
        options: LocationComponentOptions,
        clock: Rc<dyn Clock>,
    ) -> Result<Self> {
        options.validate()?;

        let events: EventQueue = Rc::new(RefCell::new(VecDeque::new()));

        let tracking_events = events.clone();
        let camera_controller = LocationCameraController::new(map.clone(), &options, move |event| {
            tracking_events
                .borrow_mut()
                .push_back(ComponentEvent::Tracking(event))
        });

        let stale_events = events.clone();
        let stale_manager = StaleStateManager::new(
            clock.clone(),
            Box::new(move |stale| {
                stale_events
                    .borrow_mut()
                    .push_back(ComponentEvent::Stale(stale))
            }),
            &options,
        );

        let mut coordinator = LocationAnimatorCoordinator::new(clock);
        apply_animation_options(&mut coordinator, &options);

        let mut component = Self {
            map,
            options,
            coordinator,
            camera_controller,
            layer_controller: LocationLayerController::new(renderer),
            stale_manager,
            events,
            tracking_listeners: Vec::new(),
            stale_listeners: Vec::new(),
            last_location: None,
            last_compass_heading: None,
            last_compass_accuracy: None,
            last_camera_position: None,
            started: false,
            enabled: false,
            layer_ready: false,
        };
        component.set_render_mode(RenderMode::Normal);
        component.set_camera_mode(CameraMode::None);
        Ok(component)
    }

    // Lifecycle

    pub fn on_start(&mut self) {
        self.started = true;
        self.on_location_layer_start();
    }

    pub fn on_stop(&mut self) {
        self.on_location_layer_stop();
        self.started = false;
    }

    pub fn set_location_component_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            self.on_location_layer_start();
        } else {
            self.on_location_layer_stop();
        }
    }

    pub fn is_location_component_enabled(&self) -> bool {
        self.enabled
    }

    /// Started and enabled, so location updates are animated and shown
    pub fn is_ready(&self) -> bool {
        self.layer_ready
    }

    // Options

    /// Validate and apply new options
    pub fn apply_style(&mut self, options: LocationComponentOptions) -> Result<()> {
        options.validate()?;

        self.camera_controller.initialize_options(&options);
        self.stale_manager.set_enabled(options.enable_stale_state);
        self.stale_manager.set_delay_time(options.stale_state_timeout);
        apply_animation_options(&mut self.coordinator, &options);
        self.options = options;

        self.dispatch_events();
        Ok(())
    }

    pub fn options(&self) -> &LocationComponentOptions {
        &self.options
    }

    /// Throttle listener updates of every animator. Non-positive values are ignored.
    pub fn set_max_animation_fps(&mut self, max_animation_fps: i32) {
        self.coordinator.set_max_animation_fps(max_animation_fps);
    }

    // Camera

    pub fn camera_mode(&self) -> CameraMode {
        self.camera_controller.camera_mode()
    }

    /// Switch the camera tracking mode and re-base the camera animations
    pub fn set_camera_mode(&mut self, camera_mode: CameraMode) {
        self.camera_controller.set_camera_mode(camera_mode);
        self.dispatch_events();
        self.refresh_animations();
    }

    /// Animate the zoom level while a tracking mode is engaged
    pub fn zoom_while_tracking(
        &mut self,
        zoom_level: f64,
        animation_duration: Duration,
        callback: Option<Box<dyn CancelableCallback>>,
    ) -> Result<()> {
        self.check_tracking_operation("zoom_while_tracking")?;
        let camera_position = self.camera_position();
        self.coordinator.feed_new_zoom_level(
            zoom_level,
            &camera_position,
            animation_duration,
            callback,
        );
        Ok(())
    }

    /// Animate the tilt while a tracking mode is engaged
    pub fn tilt_while_tracking(
        &mut self,
        tilt: f64,
        animation_duration: Duration,
        callback: Option<Box<dyn CancelableCallback>>,
    ) -> Result<()> {
        self.check_tracking_operation("tilt_while_tracking")?;
        let camera_position = self.camera_position();
        self.coordinator
            .feed_new_tilt(tilt, &camera_position, animation_duration, callback);
        Ok(())
    }

    pub fn cancel_zoom_while_tracking_animation(&mut self) {
        self.coordinator.cancel_zoom_animation();
    }

    pub fn cancel_tilt_while_tracking_animation(&mut self) {
        self.coordinator.cancel_tilt_animation();
    }

    // Rendering

    pub fn render_mode(&self) -> RenderMode {
        self.layer_controller.render_mode()
    }

    pub fn set_render_mode(&mut self, render_mode: RenderMode) {
        self.layer_controller.set_render_mode(render_mode);
        self.refresh_animations();
        self.update_layer_offsets(true);
    }

    // Inbound events

    pub fn on_location_changed(&mut self, location: Location) {
        self.update_location(location, false);
    }

    /// Push a location as if it came from the location source
    pub fn force_location_update(&mut self, location: Location) {
        self.update_location(location, false);
    }

    pub fn on_compass_changed(&mut self, heading: f32) {
        self.last_compass_heading = Some(heading);
        if self.layer_ready {
            self.update_compass_heading(heading);
        }
    }

    /// Recorded for [`Self::last_known_compass_accuracy`], animations are unaffected
    pub fn on_compass_accuracy_change(&mut self, accuracy: CompassAccuracy) {
        tracing::debug!("Compass accuracy changed to {:?}", accuracy);
        self.last_compass_accuracy = Some(accuracy);
    }

    /// The map camera moved, by the user or by an animation
    pub fn on_camera_move(&mut self) {
        if self.layer_ready {
            self.update_layer_offsets(false);
        }
    }

    pub fn on_camera_idle(&mut self) {
        if self.layer_ready {
            self.update_layer_offsets(false);
        }
    }

    // Gestures

    pub fn on_move_begin(&mut self, gesture: &MoveGesture) {
        let before = self.camera_mode();
        self.camera_controller.on_move_begin(gesture);
        self.after_gesture(before);
    }

    pub fn on_move(&mut self, gesture: &MoveGesture) -> GestureAction {
        let before = self.camera_mode();
        let action = self.camera_controller.on_move(gesture);
        self.after_gesture(before);
        action
    }

    pub fn on_move_end(&mut self, gesture: &MoveGesture) {
        self.camera_controller.on_move_end(gesture);
    }

    pub fn on_rotate_begin(&mut self) {
        let before = self.camera_mode();
        self.camera_controller.on_rotate_begin();
        self.after_gesture(before);
    }

    pub fn on_fling(&mut self) {
        let before = self.camera_mode();
        self.camera_controller.on_fling();
        self.after_gesture(before);
    }

    pub fn on_touch_up(&mut self) {
        self.camera_controller.on_touch_up();
    }

    /// Pixel distance a pan must cover before the gesture layer reports it
    pub fn move_threshold(&self) -> f32 {
        self.camera_controller.move_threshold()
    }

    // Frame loop

    /// Advance the component by one frame.
    ///
    /// Fires the stale timer if it expired, ticks every animator, refreshes the
    /// layer offsets when the animations moved the camera and delivers queued
    /// notifications.
    pub fn on_frame(&mut self) {
        #[cfg(feature = "profiling")]
        profiling::scope!("location_component::on_frame");

        self.stale_manager.poll();
        self.coordinator.tick();
        if self.camera_controller.take_camera_invalidated() && self.layer_ready {
            self.update_layer_offsets(false);
        }
        self.dispatch_events();
    }

    // Listeners and state

    pub fn add_on_camera_tracking_changed_listener(
        &mut self,
        listener: impl FnMut(CameraTrackingEvent) + 'static,
    ) {
        self.tracking_listeners.push(Box::new(listener));
    }

    pub fn add_on_location_stale_listener(&mut self, listener: impl FnMut(bool) + 'static) {
        self.stale_listeners.push(Box::new(listener));
    }

    pub fn last_known_location(&self) -> Option<Location> {
        self.last_location
    }

    pub fn last_known_compass_accuracy(&self) -> Option<CompassAccuracy> {
        self.last_compass_accuracy
    }

    pub fn is_location_stale(&self) -> bool {
        self.stale_manager.is_stale()
    }

    pub fn animator_coordinator(&self) -> &LocationAnimatorCoordinator {
        &self.coordinator
    }

    fn on_location_layer_start(&mut self) {
        if !self.started || !self.enabled || self.layer_ready {
            return;
        }
        self.layer_ready = true;
        tracing::debug!("Location component ready");

        if self.options.enable_stale_state {
            self.stale_manager.on_start();
        }
        self.set_camera_mode(self.camera_mode());
        if let Some(location) = self.last_location {
            self.update_location(location, true);
        }
        if let Some(heading) = self.last_compass_heading {
            self.update_compass_heading(heading);
        }
    }

    fn on_location_layer_stop(&mut self) {
        if !self.layer_ready {
            return;
        }
        self.layer_ready = false;
        tracing::debug!("Location component paused");

        self.layer_controller.hide();
        self.stale_manager.on_stop();
        self.coordinator.cancel_all_animations();
    }

    fn update_location(&mut self, location: Location, from_last_location: bool) {
        if !self.layer_ready {
            self.last_location = Some(location);
            return;
        }

        if self.layer_controller.is_hidden() {
            self.layer_controller.show();
        }
        if !from_last_location {
            self.stale_manager.update_latest_location_time();
        }

        let camera_position = self.camera_position();
        let is_gps_north = self.camera_mode() == CameraMode::TrackingGpsNorth;
        self.coordinator
            .feed_new_location(&location, &camera_position, is_gps_north);
        self.update_accuracy_radius(&location, false);
        self.last_location = Some(location);

        self.dispatch_events();
    }

    fn update_compass_heading(&mut self, heading: f32) {
        let camera_position = self.camera_position();
        self.coordinator
            .feed_new_compass_bearing(heading, &camera_position);
    }

    fn update_accuracy_radius(&mut self, location: &Location, no_animation: bool) {
        let zoom = self.camera_position().zoom;
        let radius =
            calculate_zoom_level_radius(location.accuracy, location.coordinate.latitude, zoom);
        self.coordinator.feed_new_accuracy_radius(radius, no_animation);
    }

    /// Keep the puck icons consistent with camera bearing, tilt and zoom
    fn update_layer_offsets(&mut self, force_update: bool) {
        let position = self.camera_position();
        let last = match self.last_camera_position.replace(position) {
            Some(last) if !force_update => last,
            _ => {
                self.layer_controller
                    .update_foreground_bearing(position.bearing as f32);
                self.layer_controller.update_foreground_offset(position.tilt);
                if let Some(location) = self.last_location {
                    self.update_accuracy_radius(&location, true);
                }
                return;
            }
        };

        if position.bearing != last.bearing {
            self.layer_controller
                .update_foreground_bearing(position.bearing as f32);
        }
        if position.tilt != last.tilt {
            self.layer_controller.update_foreground_offset(position.tilt);
        }
        if position.zoom != last.zoom {
            if let Some(location) = self.last_location {
                self.update_accuracy_radius(&location, true);
            }
        }
    }

    /// Subscribe the animators needed by the current render and camera modes and
    /// re-base the running animations on them
    fn refresh_animations(&mut self) {
        let holders = self
            .layer_controller
            .animation_listeners()
            .into_iter()
            .chain(self.camera_controller.animation_listeners());
        self.coordinator.update_animator_listener_holders(holders);

        let camera_position = self.camera_position();
        let is_gps_north = self.camera_mode() == CameraMode::TrackingGpsNorth;
        self.coordinator
            .reset_all_camera_animations(&camera_position, is_gps_north);
        self.coordinator.reset_all_layer_animations();
    }

    fn after_gesture(&mut self, mode_before: CameraMode) {
        self.dispatch_events();
        if self.camera_mode() != mode_before {
            self.refresh_animations();
        }
    }

    fn check_tracking_operation(&self, operation: &'static str) -> Result<()> {
        if !self.layer_ready {
            return Err(LocationError::NotReady { operation });
        }
        if self.camera_mode() == CameraMode::None {
            tracing::error!(
                "{} can only be used when a camera mode other than None is engaged",
                operation
            );
            return Err(LocationError::CameraModeNone { operation });
        }
        Ok(())
    }

    fn camera_position(&self) -> CameraPosition {
        self.map.borrow().camera_position()
    }

    fn next_event(&self) -> Option<ComponentEvent> {
        self.events.borrow_mut().pop_front()
    }

    fn dispatch_events(&mut self) {
        while let Some(event) = self.next_event() {
            match event {
                ComponentEvent::Tracking(event) => {
                    if let CameraTrackingEvent::Changed(_) = event {
                        self.coordinator.cancel_zoom_animation();
                        self.coordinator.cancel_tilt_animation();
                    }
                    for listener in &mut self.tracking_listeners {
                        listener(event);
                    }
                }
                ComponentEvent::Stale(stale) => {
                    self.layer_controller.set_locations_stale(stale);
                    for listener in &mut self.stale_listeners {
                        listener(stale);
                    }
                }
            }
        }
    }
}

fn apply_animation_options(
    coordinator: &mut LocationAnimatorCoordinator,
    options: &LocationComponentOptions,
) {
    coordinator
        .set_tracking_animation_duration_multiplier(options.tracking_animation_duration_multiplier);
    coordinator.set_compass_animation_enabled(options.compass_animation_enabled);
    coordinator.set_accuracy_animation_enabled(options.accuracy_animation_enabled);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::AnimatorKind;
    use crate::camera::MapCamera;
    use crate::clock::ManualClock;
    use crate::geometry::LatLng;
    use crate::headless::{FeatureLayerRenderer, HeadlessMapCamera};
    use crate::layer::LocationLayer;

    struct Fixture {
        component: LocationComponent,
        clock: ManualClock,
        map: Rc<RefCell<HeadlessMapCamera>>,
        renderer: Rc<RefCell<FeatureLayerRenderer>>,
    }

    fn fixture_with(options: LocationComponentOptions) -> Fixture {
        let clock = ManualClock::new();
        let map = Rc::new(RefCell::new(HeadlessMapCamera::new(CameraPosition::new(
            LatLng::new(51.5, -0.12),
            15.0,
            0.0,
            0.0,
        ))));
        let renderer = Rc::new(RefCell::new(FeatureLayerRenderer::new()));
        let component = LocationComponent::new(
            map.clone(),
            renderer.clone(),
            options,
            Rc::new(clock.clone()),
        )
        .expect("default options are valid");
        Fixture {
            component,
            clock,
            map,
            renderer,
        }
    }

    fn ready_fixture() -> Fixture {
        let mut f = fixture_with(LocationComponentOptions::default());
        f.component.on_start();
        f.component.set_location_component_enabled(true);
        f
    }

    fn fix(latitude: f64, longitude: f64, bearing: f32) -> Location {
        Location::new(
            LatLng::new(latitude, longitude),
            bearing,
            8.0,
            Duration::ZERO,
        )
    }

    fn run_frames(f: &mut Fixture, frames: usize) {
        for _ in 0..frames {
            f.clock.advance(Duration::from_millis(16));
            f.component.on_frame();
        }
    }

    #[derive(Default)]
    struct CallbackLog {
        finished: usize,
        canceled: usize,
    }

    struct RecordingCallback(Rc<RefCell<CallbackLog>>);

    impl CancelableCallback for RecordingCallback {
        fn on_cancel(&mut self) {
            self.0.borrow_mut().canceled += 1;
        }

        fn on_finish(&mut self) {
            self.0.borrow_mut().finished += 1;
        }
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let clock = ManualClock::new();
        let map = Rc::new(RefCell::new(HeadlessMapCamera::new(CameraPosition::default())));
        let renderer = Rc::new(RefCell::new(FeatureLayerRenderer::new()));
        let options = LocationComponentOptions {
            tracking_animation_duration_multiplier: 0.0,
            ..Default::default()
        };
        let result = LocationComponent::new(map, renderer, options, Rc::new(clock));
        assert!(matches!(result, Err(LocationError::InvalidOption { .. })));
    }

    #[test]
    fn test_initial_state() {
        let f = fixture_with(LocationComponentOptions::default());
        assert_eq!(f.component.camera_mode(), CameraMode::None);
        assert_eq!(f.component.render_mode(), RenderMode::Normal);
        assert!(!f.component.is_location_component_enabled());
        assert!(!f.component.is_ready());
        assert!(f.component.is_location_stale());
    }

    #[test]
    fn test_location_before_ready_is_replayed_on_start() {
        let mut f = fixture_with(LocationComponentOptions::default());
        let location = fix(51.5001, -0.1201, 0.0);
        f.component.on_location_changed(location);
        assert!(f.renderer.borrow().feature().position.is_none());
        assert_eq!(f.component.last_known_location(), Some(location));

        f.component.on_start();
        f.component.set_location_component_enabled(true);
        assert_eq!(
            f.renderer.borrow().feature().position,
            Some(location.coordinate)
        );
        assert!(!f.renderer.borrow().feature().visible_layers.is_empty());
        // A replayed fix does not count as fresh
        assert!(f.component.is_location_stale());
    }

    #[test]
    fn test_location_moves_layer_but_not_camera_without_tracking() {
        let mut f = ready_fixture();
        f.component.on_location_changed(fix(51.5001, -0.1201, 0.0));
        f.clock.advance(Duration::from_secs(1));
        f.component.on_location_changed(fix(51.5002, -0.1202, 0.0));
        let moves = f.map.borrow().move_count();
        run_frames(&mut f, 100);

        assert_eq!(
            f.renderer.borrow().feature().position,
            Some(LatLng::new(51.5002, -0.1202))
        );
        assert_eq!(f.map.borrow().move_count(), moves);
        assert_eq!(
            f.map.borrow().camera_position().target,
            LatLng::new(51.5, -0.12)
        );
    }

    #[test]
    fn test_tracking_moves_camera_every_position_tick() {
        let mut f = ready_fixture();
        f.component.set_camera_mode(CameraMode::Tracking);
        f.component.on_location_changed(fix(51.5001, -0.1201, 0.0));
        f.clock.advance(Duration::from_secs(1));
        f.component.on_location_changed(fix(51.5002, -0.1202, 0.0));

        let before = f.map.borrow().move_count();
        run_frames(&mut f, 10);
        assert!(f.map.borrow().move_count() >= before + 10);

        run_frames(&mut f, 100);
        assert_eq!(
            f.map.borrow().camera_position().target,
            LatLng::new(51.5002, -0.1202)
        );
    }

    #[test]
    fn test_entering_tracking_animates_camera_to_last_fix() {
        let mut f = ready_fixture();
        let location = fix(51.5005, -0.1205, 0.0);
        f.component.on_location_changed(location);

        f.component.set_camera_mode(CameraMode::Tracking);
        let animator = f
            .component
            .animator_coordinator()
            .animator(AnimatorKind::CameraLatLng)
            .expect("camera animator after entering tracking");
        assert!(animator.is_running());

        run_frames(&mut f, 60);
        assert_eq!(
            f.map.borrow().camera_position().target,
            location.coordinate
        );
    }

    #[test]
    fn test_gesture_breaks_tracking_and_notifies_once() {
        let mut f = ready_fixture();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        f.component
            .add_on_camera_tracking_changed_listener(move |event| sink.borrow_mut().push(event));

        f.component.set_camera_mode(CameraMode::TrackingCompass);
        let gesture = MoveGesture::single_finger();
        f.component.on_move_begin(&gesture);
        f.component.on_move(&gesture);
        f.component.on_move_end(&gesture);

        assert_eq!(f.component.camera_mode(), CameraMode::None);
        let dismissals = events
            .borrow()
            .iter()
            .filter(|event| **event == CameraTrackingEvent::Dismissed)
            .count();
        assert_eq!(dismissals, 1);

        // Camera animators are gone and further fixes leave the camera alone
        assert!(
            f.component
                .animator_coordinator()
                .animator(AnimatorKind::CameraLatLng)
                .is_none()
        );
        let moves = f.map.borrow().move_count();
        f.component.on_location_changed(fix(51.5003, -0.1203, 0.0));
        run_frames(&mut f, 30);
        assert_eq!(f.map.borrow().move_count(), moves);
    }

    #[test]
    fn test_compass_mode_rotates_camera() {
        let mut f = ready_fixture();
        f.component.set_camera_mode(CameraMode::NoneCompass);
        f.component.on_compass_changed(90.0);
        run_frames(&mut f, 60);
        assert!((f.map.borrow().camera_position().bearing - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_compass_heading_replayed_when_ready() {
        let mut f = fixture_with(LocationComponentOptions::default());
        f.component.set_render_mode(RenderMode::Compass);
        f.component.on_compass_changed(45.0);
        f.component.on_start();
        f.component.set_location_component_enabled(true);
        run_frames(&mut f, 60);
        assert_eq!(f.renderer.borrow().feature().compass_bearing, Some(45.0));
    }

    #[test]
    fn test_stale_flip_hides_accuracy_and_notifies() {
        let mut f = ready_fixture();
        let flips = Rc::new(RefCell::new(Vec::new()));
        let sink = flips.clone();
        f.component
            .add_on_location_stale_listener(move |stale| sink.borrow_mut().push(stale));

        f.component.on_location_changed(fix(51.5001, -0.1201, 0.0));
        assert!(!f.component.is_location_stale());
        assert!(
            f.renderer
                .borrow()
                .feature()
                .visible_layers
                .contains(&LocationLayer::Accuracy)
        );

        f.clock.advance(Duration::from_secs(31));
        f.component.on_frame();
        assert!(f.component.is_location_stale());
        assert_eq!(*flips.borrow(), vec![false, true]);
        assert!(f.renderer.borrow().feature().stale);
        assert!(
            !f.renderer
                .borrow()
                .feature()
                .visible_layers
                .contains(&LocationLayer::Accuracy)
        );
    }

    #[test]
    fn test_stop_hides_layer_and_cancels_animations() {
        let mut f = ready_fixture();
        f.component.on_location_changed(fix(51.5001, -0.1201, 0.0));
        f.clock.advance(Duration::from_secs(1));
        f.component.on_location_changed(fix(51.5002, -0.1202, 0.0));

        f.component.on_stop();
        assert!(!f.component.is_ready());
        assert!(f.renderer.borrow().feature().visible_layers.is_empty());
        assert_eq!(f.component.animator_coordinator().running_animator_count(), 0);
    }

    #[test]
    fn test_zoom_while_tracking_requires_tracking_mode() {
        let mut f = ready_fixture();
        let result = f
            .component
            .zoom_while_tracking(17.0, DEFAULT_TRACKING_ZOOM_ANIMATION_DURATION, None);
        assert!(matches!(
            result,
            Err(LocationError::CameraModeNone {
                operation: "zoom_while_tracking"
            })
        ));
    }

    #[test]
    fn test_zoom_while_tracking_requires_ready_component() {
        let mut f = fixture_with(LocationComponentOptions::default());
        f.component.set_camera_mode(CameraMode::Tracking);
        let result = f
            .component
            .tilt_while_tracking(30.0, DEFAULT_TRACKING_TILT_ANIMATION_DURATION, None);
        assert!(matches!(result, Err(LocationError::NotReady { .. })));
    }

    #[test]
    fn test_zoom_while_tracking_animates_camera() {
        let mut f = ready_fixture();
        f.component.set_camera_mode(CameraMode::Tracking);
        let log = Rc::new(RefCell::new(CallbackLog::default()));
        f.component
            .zoom_while_tracking(
                17.0,
                DEFAULT_TRACKING_ZOOM_ANIMATION_DURATION,
                Some(Box::new(RecordingCallback(log.clone()))),
            )
            .expect("tracking is engaged");
        run_frames(&mut f, 60);

        assert_eq!(f.map.borrow().camera_position().zoom, 17.0);
        assert_eq!(log.borrow().finished, 1);
    }

    #[test]
    fn test_mode_change_cancels_zoom_animation() {
        let mut f = ready_fixture();
        f.component.set_camera_mode(CameraMode::Tracking);
        let log = Rc::new(RefCell::new(CallbackLog::default()));
        f.component
            .zoom_while_tracking(
                17.0,
                DEFAULT_TRACKING_ZOOM_ANIMATION_DURATION,
                Some(Box::new(RecordingCallback(log.clone()))),
            )
            .expect("tracking is engaged");
        run_frames(&mut f, 5);

        f.component.set_camera_mode(CameraMode::TrackingGps);
        assert_eq!(log.borrow().canceled, 1);
        assert!(
            f.component
                .animator_coordinator()
                .animator(AnimatorKind::Zoom)
                .is_none()
        );
    }

    #[test]
    fn test_render_mode_switch_rebuilds_layer_listeners() {
        let mut f = ready_fixture();
        f.component.on_location_changed(fix(51.5001, -0.1201, 0.0));
        f.component.on_compass_changed(30.0);
        run_frames(&mut f, 60);
        // Normal mode has no compass arrow
        assert_eq!(f.renderer.borrow().feature().compass_bearing, None);

        f.component.set_render_mode(RenderMode::Compass);
        f.component.on_compass_changed(60.0);
        run_frames(&mut f, 60);
        assert_eq!(f.renderer.borrow().feature().compass_bearing, Some(60.0));
        assert!(
            f.renderer
                .borrow()
                .feature()
                .visible_layers
                .contains(&LocationLayer::Bearing)
        );
    }

    #[test]
    fn test_camera_move_updates_layer_offsets() {
        let mut f = ready_fixture();
        f.component.on_location_changed(fix(51.5001, -0.1201, 0.0));
        f.map.borrow_mut().set_camera_position(CameraPosition::new(
            LatLng::new(51.5, -0.12),
            16.0,
            45.0,
            20.0,
        ));
        f.component.on_camera_move();

        let feature = f.renderer.borrow().feature().clone();
        assert_eq!(feature.foreground_bearing, Some(45.0));
        assert!((feature.foreground_offset.y + 1.0).abs() < 1e-6);

        let expected = calculate_zoom_level_radius(8.0, 51.5001, 16.0);
        assert!((feature.accuracy_radius.expect("accuracy radius") - expected).abs() < 1e-3);
    }

    #[test]
    fn test_compass_accuracy_is_stored() {
        let mut f = ready_fixture();
        assert_eq!(f.component.last_known_compass_accuracy(), None);
        f.component.on_compass_accuracy_change(CompassAccuracy::Low);
        assert_eq!(
            f.component.last_known_compass_accuracy(),
            Some(CompassAccuracy::Low)
        );
    }

    #[test]
    fn test_apply_style_updates_stale_timeout() {
        let mut f = ready_fixture();
        f.component.on_location_changed(fix(51.5001, -0.1201, 0.0));
        f.component
            .apply_style(LocationComponentOptions {
                stale_state_timeout: Duration::from_secs(5),
                ..Default::default()
            })
            .expect("valid options");

        f.clock.advance(Duration::from_secs(6));
        f.component.on_frame();
        assert!(f.component.is_location_stale());
        assert_eq!(f.component.options().stale_state_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_apply_style_rejects_invalid_options() {
        let mut f = ready_fixture();
        let result = f.component.apply_style(LocationComponentOptions {
            stale_state_timeout: Duration::ZERO,
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(
            f.component.options().stale_state_timeout,
            Duration::from_secs(30)
        );
    }
}
