//! LocationAnimatorCoordinator - single owner of all location animations
//!
//! The coordinator keeps at most one animator per [`AnimatorKind`] in a fixed slot
//! array. Every `feed_new_*` call computes where each affected quantity currently
//! is (the live animator's value when there is one, otherwise the last known
//! value), resolves the new target, replaces the affected slots and only then
//! plays them together with a shared duration.
//!
//! Replacing a slot always cancels its previous occupant first, and cancelling
//! strips the animator's listeners, so a superseded animator can never deliver
//! another value.

use crate::animator::{
    Animator, AnimatorKind, AnimatorListener, AnimatorListenerHolder, AnyAnimator,
    CancelableCallback, Interpolator,
};
use crate::clock::Clock;
use crate::geometry::{CameraPosition, LatLng, Location};
use crate::utils::{immediate_animation, normalize_bearing, shortest_rotation};
use std::rc::Rc;
use std::time::Duration;

/// Upper bound for a location transition
pub const MAX_ANIMATION_DURATION: Duration = Duration::from_millis(2000);

/// Camera transition played when the tracking mode changes
pub const TRANSITION_ANIMATION_DURATION: Duration = Duration::from_millis(750);

/// Compass bearing transition
pub const COMPASS_UPDATE_RATE: Duration = Duration::from_millis(500);

/// Accuracy circle transition
pub const ACCURACY_RADIUS_ANIMATION_DURATION: Duration = Duration::from_millis(250);

/// Location transitions last slightly longer than the update interval to hide jitter
pub const DEFAULT_TRACKING_ANIMATION_DURATION_MULTIPLIER: f32 = 1.1;

/// No throttling of listener updates
pub const UNLIMITED_ANIMATION_FPS: u32 = u32::MAX;

const LOCATION_KINDS: [AnimatorKind; 4] = [
    AnimatorKind::LayerLatLng,
    AnimatorKind::LayerGpsBearing,
    AnimatorKind::CameraLatLng,
    AnimatorKind::CameraGpsBearing,
];

const COMPASS_KINDS: [AnimatorKind; 2] = [
    AnimatorKind::LayerCompassBearing,
    AnimatorKind::CameraCompassBearing,
];

const CAMERA_RESET_KINDS: [AnimatorKind; 2] =
    [AnimatorKind::CameraLatLng, AnimatorKind::CameraGpsBearing];

/// Creates, replaces, plays and cancels the location animators
pub struct LocationAnimatorCoordinator {
    slots: [Option<AnyAnimator>; AnimatorKind::COUNT],
    listeners: [Option<AnimatorListener>; AnimatorKind::COUNT],
    clock: Rc<dyn Clock>,
    previous_location: Option<Location>,
    previous_accuracy_radius: Option<f32>,
    previous_compass_bearing: Option<f32>,
    location_update_timestamp: Option<Duration>,
    duration_multiplier: f32,
    compass_animation_enabled: bool,
    accuracy_animation_enabled: bool,
    max_animation_fps: u32,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl LocationAnimatorCoordinator {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            slots: Default::default(),
            listeners: Default::default(),
            clock,
            previous_location: None,
            previous_accuracy_radius: None,
            previous_compass_bearing: None,
            location_update_timestamp: None,
            duration_multiplier: DEFAULT_TRACKING_ANIMATION_DURATION_MULTIPLIER,
            compass_animation_enabled: true,
            accuracy_animation_enabled: true,
            max_animation_fps: UNLIMITED_ANIMATION_FPS,
        }
    }

    /// Animate the layer and camera towards a new location fix.
    ///
    /// The first fix is applied immediately. Later fixes animate for the time
    /// since the previous fix times the duration multiplier, capped at
    /// [`MAX_ANIMATION_DURATION`], unless either the layer or the camera would
    /// travel too far on screen, in which case they snap.
    pub fn feed_new_location(
        &mut self,
        new_location: &Location,
        current_camera_position: &CameraPosition,
        is_gps_north: bool,
    ) {
        #[cfg(feature = "profiling")]
        profiling::scope!("coordinator::feed_new_location");

        let previous_location = *self.previous_location.get_or_insert(*new_location);

        let previous_layer_lat_lng = self
            .lat_lng_value(AnimatorKind::LayerLatLng)
            .unwrap_or(previous_location.coordinate);
        let previous_layer_bearing = wrap_bearing(
            self.float_value(AnimatorKind::LayerGpsBearing)
                .unwrap_or(previous_location.bearing),
        );
        let previous_camera_lat_lng = self
            .running_lat_lng_value(AnimatorKind::CameraLatLng)
            .unwrap_or(current_camera_position.target);
        let previous_camera_bearing = wrap_bearing(
            self.running_float_value(AnimatorKind::CameraGpsBearing)
                .unwrap_or(current_camera_position.bearing as f32),
        );

        let target_lat_lng = new_location.coordinate;
        let target_layer_bearing = wrap_bearing(new_location.bearing);
        let target_camera_bearing = if is_gps_north {
            0.0
        } else {
            target_layer_bearing
        };

        self.create_lat_lng_animator(
            AnimatorKind::LayerLatLng,
            previous_layer_lat_lng,
            target_lat_lng,
        );
        self.create_float_animator(
            AnimatorKind::LayerGpsBearing,
            previous_layer_bearing,
            shortest_rotation(target_layer_bearing, previous_layer_bearing),
        );
        self.create_lat_lng_animator(
            AnimatorKind::CameraLatLng,
            previous_camera_lat_lng,
            target_lat_lng,
        );
        self.create_float_animator(
            AnimatorKind::CameraGpsBearing,
            previous_camera_bearing,
            shortest_rotation(target_camera_bearing, previous_camera_bearing),
        );

        let zoom = current_camera_position.zoom;
        let snap = immediate_animation(zoom, &previous_camera_lat_lng, &target_lat_lng)
            || immediate_animation(zoom, &previous_layer_lat_lng, &target_lat_lng);

        // Always consumed so the next fix measures its interval from this one
        let interval_duration = self.location_animation_duration();
        let duration = if snap {
            tracing::debug!(
                "Location jump to ({}, {}) exceeds the animation threshold, snapping",
                target_lat_lng.latitude,
                target_lat_lng.longitude
            );
            Duration::ZERO
        } else {
            interval_duration
        };

        self.play_animators(duration, Interpolator::Linear, &LOCATION_KINDS);
        self.previous_location = Some(*new_location);
    }

    /// Animate the compass bearing of the layer and the camera
    pub fn feed_new_compass_bearing(
        &mut self,
        target_compass_bearing: f32,
        current_camera_position: &CameraPosition,
    ) {
        let target_compass_bearing = wrap_bearing(target_compass_bearing);
        let previous_compass_bearing =
            *self.previous_compass_bearing.get_or_insert(target_compass_bearing);

        let previous_layer_bearing = wrap_bearing(
            self.float_value(AnimatorKind::LayerCompassBearing)
                .unwrap_or(previous_compass_bearing),
        );
        let previous_camera_bearing = wrap_bearing(
            self.running_float_value(AnimatorKind::CameraCompassBearing)
                .unwrap_or(current_camera_position.bearing as f32),
        );

        self.create_float_animator(
            AnimatorKind::LayerCompassBearing,
            previous_layer_bearing,
            shortest_rotation(target_compass_bearing, previous_layer_bearing),
        );
        self.create_float_animator(
            AnimatorKind::CameraCompassBearing,
            previous_camera_bearing,
            shortest_rotation(target_compass_bearing, previous_camera_bearing),
        );

        self.play_animators(
            self.compass_duration(),
            Interpolator::AccelerateDecelerate,
            &COMPASS_KINDS,
        );
        self.previous_compass_bearing = Some(target_compass_bearing);
    }

    /// Animate the accuracy circle radius (in pixels)
    pub fn feed_new_accuracy_radius(&mut self, target_accuracy_radius: f32, no_animation: bool) {
        let previous_accuracy_radius = self
            .float_value(AnimatorKind::LayerAccuracy)
            .or(self.previous_accuracy_radius)
            .unwrap_or(target_accuracy_radius);

        self.create_float_animator(
            AnimatorKind::LayerAccuracy,
            previous_accuracy_radius,
            target_accuracy_radius,
        );

        let duration = if no_animation {
            Duration::ZERO
        } else {
            self.accuracy_duration()
        };
        self.play_animators(
            duration,
            Interpolator::AccelerateDecelerate,
            &[AnimatorKind::LayerAccuracy],
        );
        self.previous_accuracy_radius = Some(target_accuracy_radius);
    }

    /// Animate the camera zoom, reporting completion to `callback`
    pub fn feed_new_zoom_level(
        &mut self,
        target_zoom_level: f64,
        current_camera_position: &CameraPosition,
        animation_duration: Duration,
        callback: Option<Box<dyn CancelableCallback>>,
    ) {
        self.create_camera_adapter_animator(
            AnimatorKind::Zoom,
            current_camera_position.zoom as f32,
            target_zoom_level as f32,
            callback,
        );
        self.play_animators(
            animation_duration,
            Interpolator::AccelerateDecelerate,
            &[AnimatorKind::Zoom],
        );
    }

    /// Animate the camera tilt, reporting completion to `callback`
    pub fn feed_new_tilt(
        &mut self,
        target_tilt: f64,
        current_camera_position: &CameraPosition,
        animation_duration: Duration,
        callback: Option<Box<dyn CancelableCallback>>,
    ) {
        self.create_camera_adapter_animator(
            AnimatorKind::Tilt,
            current_camera_position.tilt as f32,
            target_tilt as f32,
            callback,
        );
        self.play_animators(
            animation_duration,
            Interpolator::AccelerateDecelerate,
            &[AnimatorKind::Tilt],
        );
    }

    /// Re-base the camera animators on the camera's actual position.
    ///
    /// Called whenever the tracking mode changes: the camera travels from where it
    /// is now to the last location and bearing targets over
    /// [`TRANSITION_ANIMATION_DURATION`], or snaps if that would cover too much of
    /// the screen. The compass bearing keeps its own compass duration.
    pub fn reset_all_camera_animations(
        &mut self,
        current_camera_position: &CameraPosition,
        is_gps_north: bool,
    ) {
        self.reset_camera_compass_animation(current_camera_position);
        self.reset_camera_gps_bearing_animation(current_camera_position, is_gps_north);
        let snap = self.reset_camera_lat_lng_animation(current_camera_position);

        let (duration, compass_duration) = if snap {
            (Duration::ZERO, Duration::ZERO)
        } else {
            (TRANSITION_ANIMATION_DURATION, self.compass_duration())
        };
        self.play_animators(duration, Interpolator::Linear, &CAMERA_RESET_KINDS);
        self.play_animators(
            compass_duration,
            Interpolator::AccelerateDecelerate,
            &[AnimatorKind::CameraCompassBearing],
        );
    }

    /// Re-create the layer animators with the current listeners.
    ///
    /// The location pair keeps the remaining play time of the position animation.
    pub fn reset_all_layer_animations(&mut self) {
        let now = self.clock.now();
        let remaining = self.slots[AnimatorKind::LayerLatLng.index()]
            .as_ref()
            .map(|animator| {
                animator
                    .duration()
                    .saturating_sub(animator.current_play_time(now))
            })
            .unwrap_or(Duration::ZERO);

        let lat_lng_target = self
            .lat_lng_animator(AnimatorKind::LayerLatLng)
            .map(Animator::target)
            .or(self.previous_location.map(|location| location.coordinate));
        if let Some(target) = lat_lng_target {
            let previous = self
                .lat_lng_value(AnimatorKind::LayerLatLng)
                .unwrap_or(target);
            self.create_lat_lng_animator(AnimatorKind::LayerLatLng, previous, target);
        }

        let gps_bearing_target = self
            .float_animator(AnimatorKind::LayerGpsBearing)
            .map(Animator::target)
            .or(self.previous_location.map(|location| location.bearing));
        if let Some(target) = gps_bearing_target.map(wrap_bearing) {
            let previous = wrap_bearing(
                self.float_value(AnimatorKind::LayerGpsBearing)
                    .unwrap_or(target),
            );
            self.create_float_animator(
                AnimatorKind::LayerGpsBearing,
                previous,
                shortest_rotation(target, previous),
            );
        }
        self.play_animators(
            remaining,
            Interpolator::Linear,
            &[AnimatorKind::LayerLatLng, AnimatorKind::LayerGpsBearing],
        );

        let compass_target = self
            .float_animator(AnimatorKind::LayerCompassBearing)
            .map(Animator::target)
            .or(self.previous_compass_bearing);
        if let Some(target) = compass_target.map(wrap_bearing) {
            let previous = wrap_bearing(
                self.float_value(AnimatorKind::LayerCompassBearing)
                    .unwrap_or(target),
            );
            self.create_float_animator(
                AnimatorKind::LayerCompassBearing,
                previous,
                shortest_rotation(target, previous),
            );
            self.play_animators(
                self.compass_duration(),
                Interpolator::AccelerateDecelerate,
                &[AnimatorKind::LayerCompassBearing],
            );
        }

        let accuracy_target = self
            .float_animator(AnimatorKind::LayerAccuracy)
            .map(Animator::target)
            .or(self.previous_accuracy_radius);
        if let Some(target) = accuracy_target {
            let previous = self
                .float_value(AnimatorKind::LayerAccuracy)
                .unwrap_or(target);
            self.create_float_animator(AnimatorKind::LayerAccuracy, previous, target);
            self.play_animators(
                self.accuracy_duration(),
                Interpolator::AccelerateDecelerate,
                &[AnimatorKind::LayerAccuracy],
            );
        }
    }

    /// Replace every listener subscription at once.
    ///
    /// Animators whose kind is no longer observed are cancelled. Holders whose
    /// listener does not match the kind's value type are ignored.
    pub fn update_animator_listener_holders(
        &mut self,
        holders: impl IntoIterator<Item = AnimatorListenerHolder>,
    ) {
        self.listeners = Default::default();
        for holder in holders {
            if !holder.is_consistent() {
                tracing::warn!(
                    "Ignoring listener for {:?}: expected {:?} values",
                    holder.kind(),
                    holder.kind().value_type()
                );
                continue;
            }
            self.listeners[holder.kind().index()] = Some(holder.listener().clone());
        }

        for kind in AnimatorKind::ALL {
            if self.listeners[kind.index()].is_none() {
                self.cancel_animator(kind);
            }
        }
    }

    /// Advance every running animator to the clock's current time
    pub fn tick(&mut self) {
        #[cfg(feature = "profiling")]
        profiling::scope!("coordinator::tick");

        let now = self.clock.now();
        for animator in self.slots.iter_mut().flatten() {
            animator.tick(now);
        }
    }

    pub fn cancel_zoom_animation(&mut self) {
        self.cancel_animator(AnimatorKind::Zoom);
    }

    pub fn cancel_tilt_animation(&mut self) {
        self.cancel_animator(AnimatorKind::Tilt);
    }

    pub fn cancel_all_animations(&mut self) {
        for kind in AnimatorKind::ALL {
            self.cancel_animator(kind);
        }
    }

    /// Limit listener updates to `max_animation_fps` per animator. Non-positive values are ignored.
    pub fn set_max_animation_fps(&mut self, max_animation_fps: i32) {
        if max_animation_fps <= 0 {
            tracing::warn!(
                "Max animation FPS must be positive, got {}; keeping {}",
                max_animation_fps,
                self.max_animation_fps
            );
            return;
        }
        self.max_animation_fps = max_animation_fps as u32;
    }

    pub fn max_animation_fps(&self) -> u32 {
        self.max_animation_fps
    }

    /// Scale applied to the interval between fixes. Non-positive values are ignored.
    pub fn set_tracking_animation_duration_multiplier(&mut self, multiplier: f32) {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            tracing::warn!(
                "Tracking animation duration multiplier must be positive, got {}",
                multiplier
            );
            return;
        }
        self.duration_multiplier = multiplier;
    }

    pub fn tracking_animation_duration_multiplier(&self) -> f32 {
        self.duration_multiplier
    }

    pub fn set_compass_animation_enabled(&mut self, enabled: bool) {
        self.compass_animation_enabled = enabled;
    }

    pub fn set_accuracy_animation_enabled(&mut self, enabled: bool) {
        self.accuracy_animation_enabled = enabled;
    }

    /// The animator currently occupying the slot for `kind`
    pub fn animator(&self, kind: AnimatorKind) -> Option<&AnyAnimator> {
        self.slots[kind.index()].as_ref()
    }

    /// Number of animators still playing
    pub fn running_animator_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|animator| animator.is_running())
            .count()
    }

    pub fn has_listener(&self, kind: AnimatorKind) -> bool {
        self.listeners[kind.index()].is_some()
    }

    fn reset_camera_lat_lng_animation(&mut self, current_camera_position: &CameraPosition) -> bool {
        let target = self
            .lat_lng_animator(AnimatorKind::CameraLatLng)
            .map(Animator::target)
            .or(self.previous_location.map(|location| location.coordinate));
        let Some(target) = target else {
            return false;
        };

        let previous = current_camera_position.target;
        if !self.create_lat_lng_animator(AnimatorKind::CameraLatLng, previous, target) {
            return false;
        }
        immediate_animation(current_camera_position.zoom, &previous, &target)
    }

    fn reset_camera_gps_bearing_animation(
        &mut self,
        current_camera_position: &CameraPosition,
        is_gps_north: bool,
    ) {
        let target = if is_gps_north {
            Some(0.0)
        } else {
            self.previous_location
                .map(|location| location.bearing)
                .or(self
                    .float_animator(AnimatorKind::CameraGpsBearing)
                    .map(Animator::target))
        };
        let Some(target) = target.map(wrap_bearing) else {
            return;
        };

        let previous = wrap_bearing(current_camera_position.bearing as f32);
        self.create_float_animator(
            AnimatorKind::CameraGpsBearing,
            previous,
            shortest_rotation(target, previous),
        );
    }

    fn reset_camera_compass_animation(&mut self, current_camera_position: &CameraPosition) {
        let target = self
            .float_animator(AnimatorKind::CameraCompassBearing)
            .map(Animator::target)
            .or(self.previous_compass_bearing);
        let Some(target) = target.map(wrap_bearing) else {
            return;
        };

        let previous = wrap_bearing(current_camera_position.bearing as f32);
        self.create_float_animator(
            AnimatorKind::CameraCompassBearing,
            previous,
            shortest_rotation(target, previous),
        );
    }

    fn location_animation_duration(&mut self) -> Duration {
        let now = self.clock.now();
        let Some(previous_update) = self.location_update_timestamp.replace(now) else {
            return Duration::ZERO;
        };

        let interval = now.saturating_sub(previous_update).as_secs_f64();
        let scaled = interval * self.duration_multiplier as f64;
        Duration::from_secs_f64(scaled.min(MAX_ANIMATION_DURATION.as_secs_f64()))
    }

    fn compass_duration(&self) -> Duration {
        if self.compass_animation_enabled {
            COMPASS_UPDATE_RATE
        } else {
            Duration::ZERO
        }
    }

    fn accuracy_duration(&self) -> Duration {
        if self.accuracy_animation_enabled {
            ACCURACY_RADIUS_ANIMATION_DURATION
        } else {
            Duration::ZERO
        }
    }

    /// Replace the slot for `kind`. Returns false when nobody listens to `kind`.
    fn create_float_animator(&mut self, kind: AnimatorKind, previous: f32, target: f32) -> bool {
        self.cancel_animator(kind);
        let Some(AnimatorListener::Float(listener)) = &self.listeners[kind.index()] else {
            return false;
        };
        let animator = Animator::new(
            kind,
            previous,
            target,
            [listener.clone()],
            self.max_animation_fps,
        );
        self.slots[kind.index()] = Some(animator.into());
        true
    }

    fn create_lat_lng_animator(
        &mut self,
        kind: AnimatorKind,
        previous: LatLng,
        target: LatLng,
    ) -> bool {
        self.cancel_animator(kind);
        let Some(AnimatorListener::LatLng(listener)) = &self.listeners[kind.index()] else {
            return false;
        };
        let animator = Animator::new(
            kind,
            previous,
            target,
            [listener.clone()],
            self.max_animation_fps,
        );
        self.slots[kind.index()] = Some(animator.into());
        true
    }

    /// Like [`Self::create_float_animator`], for caller-driven camera animations.
    ///
    /// Camera adapter animators are not throttled. Without a listener the
    /// callback is told the animation was cancelled.
    fn create_camera_adapter_animator(
        &mut self,
        kind: AnimatorKind,
        previous: f32,
        target: f32,
        callback: Option<Box<dyn CancelableCallback>>,
    ) {
        self.cancel_animator(kind);
        let Some(AnimatorListener::Float(listener)) = &self.listeners[kind.index()] else {
            tracing::debug!("No listener for {:?}, skipping camera animation", kind);
            if let Some(mut callback) = callback {
                callback.on_cancel();
            }
            return;
        };
        let animator = Animator::new(
            kind,
            previous,
            target,
            [listener.clone()],
            UNLIMITED_ANIMATION_FPS,
        )
        .with_callback(callback);
        self.slots[kind.index()] = Some(animator.into());
    }

    /// Start the freshly created animators among `kinds` with a shared duration
    fn play_animators(
        &mut self,
        duration: Duration,
        interpolator: Interpolator,
        kinds: &[AnimatorKind],
    ) {
        for kind in kinds {
            if let Some(animator) = self.slots[kind.index()].as_mut() {
                animator.set_duration(duration);
                animator.set_interpolator(interpolator);
            }
        }

        let now = self.clock.now();
        for kind in kinds {
            if let Some(animator) = self.slots[kind.index()].as_mut() {
                animator.start(now);
            }
        }
    }

    fn cancel_animator(&mut self, kind: AnimatorKind) {
        if let Some(mut animator) = self.slots[kind.index()].take() {
            animator.cancel();
        }
    }

    fn float_animator(&self, kind: AnimatorKind) -> Option<&Animator<f32>> {
        self.slots[kind.index()]
            .as_ref()
            .and_then(AnyAnimator::as_float)
    }

    fn lat_lng_animator(&self, kind: AnimatorKind) -> Option<&Animator<LatLng>> {
        self.slots[kind.index()]
            .as_ref()
            .and_then(AnyAnimator::as_lat_lng)
    }

    fn float_value(&self, kind: AnimatorKind) -> Option<f32> {
        self.float_animator(kind).map(Animator::animated_value)
    }

    fn lat_lng_value(&self, kind: AnimatorKind) -> Option<LatLng> {
        self.lat_lng_animator(kind).map(Animator::animated_value)
    }

    fn running_float_value(&self, kind: AnimatorKind) -> Option<f32> {
        self.float_animator(kind)
            .filter(|animator| animator.is_running())
            .map(Animator::animated_value)
    }

    fn running_lat_lng_value(&self, kind: AnimatorKind) -> Option<LatLng> {
        self.lat_lng_animator(kind)
            .filter(|animator| animator.is_running())
            .map(Animator::animated_value)
    }
}

/// Bearing in [0, 360), the frame every animator starts from
fn wrap_bearing(bearing: f32) -> f32 {
    let wrapped = normalize_bearing(bearing as f64) as f32;
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
