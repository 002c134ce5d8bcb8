//! Location Replay - GPX Track Replay for the Location Component
//!
//! Feeds the points of a GPX track to a [`location_component::LocationComponent`]
//! as location fixes and renders frames against the headless map camera and
//! puck renderer, with time driven by a manual clock. Useful to watch the
//! animation and tracking behaviour in logs and to exercise the whole
//! component end to end.
//!
//! # Architecture
//!
//! - **[`Settings`]**: Command line configuration
//! - **[`Replay`]**: Component and headless collaborators stepped frame by frame
//! - **[`ReplaySummary`]**: What happened during a replay
//! - **[`setup_logging`]**: `tracing-subscriber` initialization

mod logging;
mod replay;
mod settings;

// Public API exports
pub use logging::setup_logging;
pub use replay::{Replay, ReplaySummary, fixes_from_gpx, load_gpx, read_gpx, run_replay};
pub use settings::Settings;

/// Error types for the replay tool
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GPX parsing error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("Location component error: {0}")]
    Location(#[from] location_component::LocationError),

    #[error("Track has no points")]
    EmptyTrack,
}

pub type Result<T> = std::result::Result<T, ReplayError>;
