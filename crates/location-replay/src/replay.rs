//! GPX replay against a headless map
//!
//! Track points become location fixes spaced by a fixed interval. A
//! [`ManualClock`] is stepped one frame at a time, fixes are fed when their time
//! comes up and the component animates the headless camera and puck exactly as
//! it would on a device.

use crate::settings::Settings;
use crate::{ReplayError, Result};
use location_component::utils::bearing_between;
use location_component::{
    CameraMode, CameraPosition, CameraTrackingEvent, Clock, FeatureLayerRenderer,
    HeadlessMapCamera, LatLng, Location, LocationComponent, MAX_ANIMATION_DURATION, ManualClock,
    MapCamera, MoveGesture,
};
use std::cell::{Cell, RefCell};
use std::io::Read;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

/// Accuracy assumed for points without HDOP
const DEFAULT_ACCURACY_M: f32 = 10.0;

/// Meters of accuracy per unit of HDOP
const HDOP_ACCURACY_FACTOR: f64 = 5.0;

pub fn load_gpx(path: &Path) -> Result<gpx::Gpx> {
    let file = std::fs::File::open(path)?;
    read_gpx(std::io::BufReader::new(file))
}

pub fn read_gpx<R: Read>(reader: R) -> Result<gpx::Gpx> {
    Ok(gpx::read(reader)?)
}

/// Flatten every track segment into fixes spaced by `fix_interval`.
///
/// The bearing of a fix points towards the next one, the last fix keeps the
/// bearing of the one before it.
pub fn fixes_from_gpx(gpx: &gpx::Gpx, fix_interval: Duration) -> Result<Vec<Location>> {
    let points: Vec<&gpx::Waypoint> = gpx
        .tracks
        .iter()
        .flat_map(|track| &track.segments)
        .flat_map(|segment| &segment.points)
        .collect();
    if points.is_empty() {
        return Err(ReplayError::EmptyTrack);
    }

    let coordinates: Vec<LatLng> = points.iter().map(|p| LatLng::from(p.point())).collect();
    let mut bearing = 0.0;
    let fixes = points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            if let Some(next) = coordinates.get(i + 1) {
                bearing = bearing_between(&coordinates[i], next);
            }
            let accuracy = point
                .hdop
                .map(|hdop| (hdop * HDOP_ACCURACY_FACTOR) as f32)
                .unwrap_or(DEFAULT_ACCURACY_M);
            Location::new(coordinates[i], bearing, accuracy, fix_interval * i as u32)
        })
        .collect();
    Ok(fixes)
}

/// Outcome of a replay
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    pub fixes_fed: usize,
    pub frames: usize,
    pub camera_moves: usize,
    pub tracking_dismissals: usize,
    pub stale_flips: usize,
    pub final_camera_mode: CameraMode,
    pub final_camera_position: CameraPosition,
    pub final_puck_position: Option<LatLng>,
}

impl ReplaySummary {
    pub fn log(&self) {
        tracing::info!(
            "Replayed {} fixes over {} frames: {} camera moves, {} tracking dismissals, {} stale flips",
            self.fixes_fed,
            self.frames,
            self.camera_moves,
            self.tracking_dismissals,
            self.stale_flips
        );
        tracing::info!(
            "Final camera ({:.6}, {:.6}) zoom {:.2} bearing {:.1} in mode {}",
            self.final_camera_position.target.latitude,
            self.final_camera_position.target.longitude,
            self.final_camera_position.zoom,
            self.final_camera_position.bearing,
            self.final_camera_mode
        );
        if let Some(puck) = self.final_puck_position {
            tracing::info!("Final puck ({:.6}, {:.6})", puck.latitude, puck.longitude);
        }
    }
}

/// A component wired to headless collaborators, stepped frame by frame
pub struct Replay {
    fixes: Vec<Location>,
    next_fix: usize,
    frames: usize,
    frame_interval: Duration,
    end: Duration,
    pan_at: Option<usize>,
    simulate_compass: bool,
    clock: ManualClock,
    map: Rc<RefCell<HeadlessMapCamera>>,
    renderer: Rc<RefCell<FeatureLayerRenderer>>,
    component: LocationComponent,
    tracking_dismissals: Rc<Cell<usize>>,
    stale_flips: Rc<Cell<usize>>,
}

impl Replay {
    pub fn new(settings: &Settings, fixes: Vec<Location>) -> Result<Self> {
        let first = fixes.first().ok_or(ReplayError::EmptyTrack)?;
        let last_time = fixes.last().map(|fix| fix.time).unwrap_or_default();

        let clock = ManualClock::new();
        let map = Rc::new(RefCell::new(HeadlessMapCamera::new(CameraPosition::new(
            first.coordinate,
            settings.initial_zoom,
            0.0,
            0.0,
        ))));
        let renderer = Rc::new(RefCell::new(FeatureLayerRenderer::new()));

        let mut component = LocationComponent::new(
            map.clone(),
            renderer.clone(),
            settings.component_options(),
            Rc::new(clock.clone()),
        )?;
        if let Some(max_animation_fps) = settings.max_animation_fps {
            component.set_max_animation_fps(max_animation_fps);
        }

        let tracking_dismissals = Rc::new(Cell::new(0));
        let dismissals = tracking_dismissals.clone();
        component.add_on_camera_tracking_changed_listener(move |event| {
            if event == CameraTrackingEvent::Dismissed {
                dismissals.set(dismissals.get() + 1);
            }
        });
        let stale_flips = Rc::new(Cell::new(0));
        let flips = stale_flips.clone();
        component.add_on_location_stale_listener(move |stale| {
            tracing::debug!("Location stale: {}", stale);
            flips.set(flips.get() + 1);
        });

        component.on_start();
        component.set_location_component_enabled(true);
        component.set_render_mode(settings.render_mode);
        component.set_camera_mode(settings.camera_mode);

        Ok(Self {
            fixes,
            next_fix: 0,
            frames: 0,
            frame_interval: settings.frame_interval(),
            end: last_time + MAX_ANIMATION_DURATION,
            pan_at: settings.pan_at,
            simulate_compass: settings.simulate_compass,
            clock,
            map,
            renderer,
            component,
            tracking_dismissals,
            stale_flips,
        })
    }

    /// All fixes were fed and the last animation had time to finish
    pub fn is_finished(&self) -> bool {
        self.next_fix >= self.fixes.len() && self.clock.now() >= self.end
    }

    /// Feed the fixes that are due, render one frame and advance the clock
    pub fn step(&mut self) {
        let now = self.clock.now();
        while let Some(fix) = self.fixes.get(self.next_fix).copied() {
            if fix.time > now {
                break;
            }
            self.feed(self.next_fix, fix);
            self.next_fix += 1;
        }

        self.component.on_frame();
        self.frames += 1;
        self.clock.advance(self.frame_interval);
    }

    /// Step as fast as possible until finished
    pub fn run(mut self) -> ReplaySummary {
        while !self.is_finished() {
            self.step();
        }
        self.summary()
    }

    /// Step at wall-clock speed until finished
    pub async fn run_realtime(mut self) -> ReplaySummary {
        let mut interval = tokio::time::interval(self.frame_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        while !self.is_finished() {
            interval.tick().await;
            self.step();
        }
        self.summary()
    }

    pub fn summary(&self) -> ReplaySummary {
        ReplaySummary {
            fixes_fed: self.next_fix,
            frames: self.frames,
            camera_moves: self.map.borrow().move_count(),
            tracking_dismissals: self.tracking_dismissals.get(),
            stale_flips: self.stale_flips.get(),
            final_camera_mode: self.component.camera_mode(),
            final_camera_position: self.map.borrow().camera_position(),
            final_puck_position: self.renderer.borrow().feature().position,
        }
    }

    fn feed(&mut self, index: usize, fix: Location) {
        self.component.on_location_changed(fix);
        if self.simulate_compass {
            // Heading wobbles around the course like a handheld phone
            let wobble = 15.0 * (index as f32 * 0.5).sin();
            self.component
                .on_compass_changed((fix.bearing + wobble).rem_euclid(360.0));
        }
        if self.pan_at == Some(index) {
            tracing::info!("Simulating a pan gesture after fix {}", index);
            let gesture = MoveGesture::single_finger();
            self.component.on_move_begin(&gesture);
            self.component.on_move(&gesture);
            self.component.on_move_end(&gesture);
            self.component.on_touch_up();
        }
    }
}

/// Load the GPX file named in `settings` and replay it
pub async fn run_replay(settings: Settings) -> Result<ReplaySummary> {
    let gpx = load_gpx(&settings.gpx_file)?;
    let fixes = fixes_from_gpx(&gpx, settings.fix_interval())?;
    tracing::info!(
        "Replaying {} fixes from {} at {} fps",
        fixes.len(),
        settings.gpx_file.display(),
        settings.fps
    );

    let replay = Replay::new(&settings, fixes)?;
    let summary = if settings.realtime {
        replay.run_realtime().await
    } else {
        replay.run()
    };
    summary.log();
    Ok(summary)
}
