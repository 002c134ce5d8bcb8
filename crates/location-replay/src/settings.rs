use clap::Parser;
use location_component::{CameraMode, LocationComponentOptions, RenderMode};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Location Replay - Replays a GPX track through the location component on a headless map
pub struct Settings {
    /// GPX file whose track points are replayed as location fixes
    #[clap(value_name = "FILE")]
    pub gpx_file: PathBuf,

    /// Simulated display refresh rate
    #[clap(long, default_value = "60")]
    pub fps: u32,

    /// Time between two location fixes in milliseconds
    #[clap(long, default_value = "1000")]
    pub fix_interval_ms: u64,

    /// Cap on animation listener updates per second (unlimited when unset)
    #[clap(long)]
    pub max_animation_fps: Option<i32>,

    /// Camera mode: none, none-compass, none-gps, tracking, tracking-compass, tracking-gps, tracking-gps-north
    #[clap(short, long, default_value = "tracking-gps")]
    pub camera_mode: CameraMode,

    /// Render mode: normal, compass, gps
    #[clap(short, long, default_value = "gps")]
    pub render_mode: RenderMode,

    /// Zoom level of the map before the first fix
    #[clap(long, default_value = "16.0")]
    pub initial_zoom: f64,

    /// Seconds without a fix before the location turns stale
    #[clap(long, default_value = "30")]
    pub stale_timeout_secs: u64,

    /// Disable the stale state
    #[clap(long, default_value = "false")]
    pub no_stale_state: bool,

    /// Apply compass headings without animating
    #[clap(long, default_value = "false")]
    pub no_compass_animation: bool,

    /// Apply accuracy changes without animating
    #[clap(long, default_value = "false")]
    pub no_accuracy_animation: bool,

    /// Factor applied to the fix interval to get the position animation duration
    #[clap(long, default_value = "1.1")]
    pub duration_multiplier: f32,

    /// Simulate a single-finger pan right after the fix with this index
    #[clap(long, value_name = "INDEX")]
    pub pan_at: Option<usize>,

    /// Feed a synthetic compass heading alongside every fix
    #[clap(long, default_value = "false")]
    pub simulate_compass: bool,

    /// Pace frames at wall-clock speed instead of replaying as fast as possible
    #[clap(long, default_value = "false")]
    pub realtime: bool,
}

impl Settings {
    /// Parse the command line, exiting with usage on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }

    pub fn fix_interval(&self) -> Duration {
        Duration::from_millis(self.fix_interval_ms)
    }

    /// Component options described by these settings
    pub fn component_options(&self) -> LocationComponentOptions {
        LocationComponentOptions {
            enable_stale_state: !self.no_stale_state,
            stale_state_timeout: Duration::from_secs(self.stale_timeout_secs),
            compass_animation_enabled: !self.no_compass_animation,
            accuracy_animation_enabled: !self.no_accuracy_animation,
            tracking_animation_duration_multiplier: self.duration_multiplier,
            ..Default::default()
        }
    }
}
