//! Animator primitives
//!
//! An [`Animator`] interpolates one quantity from a previous value to a target value
//! over a duration. It does not own a timer: whoever drives the frame loop calls
//! [`Animator::tick`] with the current time and the animator pushes the interpolated
//! value to its listeners. The value type decides the evaluation strategy (see
//! [`Animatable`]) and the [`AnimatorKind`] tag says which quantity is animated and
//! for which audience (the rendered layer or the map camera).

use crate::geometry::LatLng;
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Animated quantities, split by audience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnimatorKind {
    LayerLatLng,
    CameraLatLng,
    LayerGpsBearing,
    LayerCompassBearing,
    CameraGpsBearing,
    CameraCompassBearing,
    LayerAccuracy,
    Zoom,
    Tilt,
}

impl AnimatorKind {
    pub const COUNT: usize = 9;

    pub const ALL: [AnimatorKind; Self::COUNT] = [
        AnimatorKind::LayerLatLng,
        AnimatorKind::CameraLatLng,
        AnimatorKind::LayerGpsBearing,
        AnimatorKind::LayerCompassBearing,
        AnimatorKind::CameraGpsBearing,
        AnimatorKind::CameraCompassBearing,
        AnimatorKind::LayerAccuracy,
        AnimatorKind::Zoom,
        AnimatorKind::Tilt,
    ];

    /// Stable slot index in [0, COUNT)
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn value_type(self) -> ValueType {
        match self {
            AnimatorKind::LayerLatLng | AnimatorKind::CameraLatLng => ValueType::LatLng,
            _ => ValueType::Float,
        }
    }

    /// Whether the animator drives the map camera rather than the rendered layer
    pub const fn is_camera(self) -> bool {
        matches!(
            self,
            AnimatorKind::CameraLatLng
                | AnimatorKind::CameraGpsBearing
                | AnimatorKind::CameraCompassBearing
                | AnimatorKind::Zoom
                | AnimatorKind::Tilt
        )
    }
}

/// Value types an animator can interpolate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Float,
    LatLng,
}

/// A value that can be interpolated between two endpoints
pub trait Animatable: Copy + PartialEq + fmt::Debug + 'static {
    const VALUE_TYPE: ValueType;

    fn interpolate(start: Self, end: Self, fraction: f32) -> Self;
}

impl Animatable for f32 {
    const VALUE_TYPE: ValueType = ValueType::Float;

    #[inline]
    fn interpolate(start: Self, end: Self, fraction: f32) -> Self {
        start + (end - start) * fraction
    }
}

impl Animatable for LatLng {
    const VALUE_TYPE: ValueType = ValueType::LatLng;

    #[inline]
    fn interpolate(start: Self, end: Self, fraction: f32) -> Self {
        let fraction = fraction as f64;
        LatLng::new(
            start.latitude + (end.latitude - start.latitude) * fraction,
            start.longitude + (end.longitude - start.longitude) * fraction,
        )
    }
}

/// Time curve applied to the linear play fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolator {
    #[default]
    Linear,
    /// Slow start and end, fast middle
    AccelerateDecelerate,
}

impl Interpolator {
    #[inline]
    pub fn interpolation(self, input: f32) -> f32 {
        match self {
            Interpolator::Linear => input,
            Interpolator::AccelerateDecelerate => {
                ((input + 1.0) * std::f32::consts::PI).cos() / 2.0 + 0.5
            }
        }
    }
}

/// Receives every interpolated value of one animator
pub type ValueListener<T> = Rc<dyn Fn(T)>;

/// A listener for either value type
#[derive(Clone)]
pub enum AnimatorListener {
    Float(ValueListener<f32>),
    LatLng(ValueListener<LatLng>),
}

impl AnimatorListener {
    pub fn value_type(&self) -> ValueType {
        match self {
            AnimatorListener::Float(_) => ValueType::Float,
            AnimatorListener::LatLng(_) => ValueType::LatLng,
        }
    }
}

/// Subscription of a listener to one animator kind
#[derive(Clone)]
pub struct AnimatorListenerHolder {
    kind: AnimatorKind,
    listener: AnimatorListener,
}

impl AnimatorListenerHolder {
    pub fn new(kind: AnimatorKind, listener: AnimatorListener) -> Self {
        Self { kind, listener }
    }

    pub fn float(kind: AnimatorKind, listener: impl Fn(f32) + 'static) -> Self {
        Self::new(kind, AnimatorListener::Float(Rc::new(listener)))
    }

    pub fn lat_lng(kind: AnimatorKind, listener: impl Fn(LatLng) + 'static) -> Self {
        Self::new(kind, AnimatorListener::LatLng(Rc::new(listener)))
    }

    pub fn kind(&self) -> AnimatorKind {
        self.kind
    }

    pub fn listener(&self) -> &AnimatorListener {
        &self.listener
    }

    /// Whether the listener accepts the value type its kind produces
    pub fn is_consistent(&self) -> bool {
        self.kind.value_type() == self.listener.value_type()
    }
}

impl fmt::Debug for AnimatorListenerHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatorListenerHolder")
            .field("kind", &self.kind)
            .field("value_type", &self.listener.value_type())
            .finish()
    }
}

/// Completion notification for camera animations requested by a caller
pub trait CancelableCallback {
    fn on_cancel(&mut self);
    fn on_finish(&mut self);
}

/// Lifecycle of a single animator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorState {
    Idle,
    Running { start: Duration },
    Ended,
    Canceled,
}

/// One interpolated transition from `previous` to `target`
pub struct Animator<T: Animatable> {
    kind: AnimatorKind,
    previous: T,
    target: T,
    animated_value: T,
    listeners: SmallVec<[ValueListener<T>; 2]>,
    callback: Option<Box<dyn CancelableCallback>>,
    duration: Duration,
    interpolator: Interpolator,
    min_update_interval: Duration,
    last_update: Option<Duration>,
    state: AnimatorState,
}

impl<T: Animatable> Animator<T> {
    /// Create an idle animator.
    ///
    /// `max_fps` throttles how often listeners are called while running; the
    /// first and the final value are always delivered.
    pub fn new(
        kind: AnimatorKind,
        previous: T,
        target: T,
        listeners: impl IntoIterator<Item = ValueListener<T>>,
        max_fps: u32,
    ) -> Self {
        debug_assert_eq!(kind.value_type(), T::VALUE_TYPE);
        Self {
            kind,
            previous,
            target,
            animated_value: previous,
            listeners: listeners.into_iter().collect(),
            callback: None,
            duration: Duration::ZERO,
            interpolator: Interpolator::default(),
            min_update_interval: Duration::from_secs_f64(1.0 / max_fps.max(1) as f64),
            last_update: None,
            state: AnimatorState::Idle,
        }
    }

    /// Attach a completion callback, notified on finish or cancel
    pub fn with_callback(mut self, callback: Option<Box<dyn CancelableCallback>>) -> Self {
        self.callback = callback;
        self
    }

    pub fn kind(&self) -> AnimatorKind {
        self.kind
    }

    pub fn previous(&self) -> T {
        self.previous
    }

    /// Where this animator is heading, regardless of progress
    pub fn target(&self) -> T {
        self.target
    }

    /// Last interpolated value
    pub fn animated_value(&self) -> T {
        self.animated_value
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub fn interpolator(&self) -> Interpolator {
        self.interpolator
    }

    pub fn set_interpolator(&mut self, interpolator: Interpolator) {
        self.interpolator = interpolator;
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, AnimatorState::Running { .. })
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Time played so far, clamped to the duration
    pub fn current_play_time(&self, now: Duration) -> Duration {
        match self.state {
            AnimatorState::Running { start } => now.saturating_sub(start).min(self.duration),
            AnimatorState::Ended => self.duration,
            AnimatorState::Idle | AnimatorState::Canceled => Duration::ZERO,
        }
    }

    /// Start playing at `now`. The start value is delivered immediately and a
    /// zero duration ends the animation on the spot. Only idle animators start.
    pub fn start(&mut self, now: Duration) {
        if self.state != AnimatorState::Idle {
            return;
        }
        self.state = AnimatorState::Running { start: now };
        self.last_update = None;

        if self.duration.is_zero() {
            self.finish();
            return;
        }

        self.animated_value = self.previous;
        self.last_update = Some(now);
        self.notify();
    }

    /// Advance to `now`. Returns whether the animator is still running.
    pub fn tick(&mut self, now: Duration) -> bool {
        let AnimatorState::Running { start } = self.state else {
            return false;
        };

        let elapsed = now.saturating_sub(start);
        if elapsed >= self.duration {
            self.finish();
            return false;
        }

        let fraction = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.animated_value = T::interpolate(
            self.previous,
            self.target,
            self.interpolator.interpolation(fraction),
        );

        if let Some(last_update) = self.last_update {
            if now.saturating_sub(last_update) < self.min_update_interval {
                return true;
            }
        }
        self.last_update = Some(now);
        self.notify();
        true
    }

    /// Stop the animator and strip its listeners and callback.
    ///
    /// A running animator reports the cancellation to its callback first.
    pub fn cancel(&mut self) {
        let was_running = self.is_running();
        self.state = AnimatorState::Canceled;
        self.listeners.clear();
        if let Some(mut callback) = self.callback.take() {
            if was_running {
                callback.on_cancel();
            }
        }
    }

    fn finish(&mut self) {
        self.animated_value = self.target;
        self.state = AnimatorState::Ended;
        self.notify();
        if let Some(mut callback) = self.callback.take() {
            callback.on_finish();
        }
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener(self.animated_value);
        }
    }
}

impl<T: Animatable> fmt::Debug for Animator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animator")
            .field("kind", &self.kind)
            .field("previous", &self.previous)
            .field("target", &self.target)
            .field("animated_value", &self.animated_value)
            .field("duration", &self.duration)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// An animator of either value type, as stored in a coordinator slot
#[derive(Debug)]
pub enum AnyAnimator {
    Float(Animator<f32>),
    LatLng(Animator<LatLng>),
}

macro_rules! delegate {
    ($self:ident, $animator:ident => $body:expr) => {
        match $self {
            AnyAnimator::Float($animator) => $body,
            AnyAnimator::LatLng($animator) => $body,
        }
    };
}

impl AnyAnimator {
    pub fn kind(&self) -> AnimatorKind {
        delegate!(self, animator => animator.kind())
    }

    pub fn state(&self) -> AnimatorState {
        delegate!(self, animator => animator.state())
    }

    pub fn is_running(&self) -> bool {
        delegate!(self, animator => animator.is_running())
    }

    pub fn duration(&self) -> Duration {
        delegate!(self, animator => animator.duration())
    }

    pub fn set_duration(&mut self, duration: Duration) {
        delegate!(self, animator => animator.set_duration(duration))
    }

    pub fn set_interpolator(&mut self, interpolator: Interpolator) {
        delegate!(self, animator => animator.set_interpolator(interpolator))
    }

    pub fn current_play_time(&self, now: Duration) -> Duration {
        delegate!(self, animator => animator.current_play_time(now))
    }

    pub fn start(&mut self, now: Duration) {
        delegate!(self, animator => animator.start(now))
    }

    pub fn tick(&mut self, now: Duration) -> bool {
        delegate!(self, animator => animator.tick(now))
    }

    pub fn cancel(&mut self) {
        delegate!(self, animator => animator.cancel())
    }

    pub fn as_float(&self) -> Option<&Animator<f32>> {
        match self {
            AnyAnimator::Float(animator) => Some(animator),
            AnyAnimator::LatLng(_) => None,
        }
    }

    pub fn as_lat_lng(&self) -> Option<&Animator<LatLng>> {
        match self {
            AnyAnimator::LatLng(animator) => Some(animator),
            AnyAnimator::Float(_) => None,
        }
    }
}

impl From<Animator<f32>> for AnyAnimator {
    fn from(animator: Animator<f32>) -> Self {
        AnyAnimator::Float(animator)
    }
}

impl From<Animator<LatLng>> for AnyAnimator {
    fn from(animator: Animator<LatLng>) -> Self {
        AnyAnimator::LatLng(animator)
    }
}
