//! Runtime options of the location component

use crate::{LocationError, Result};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Style and behaviour options, applied with `LocationComponent::apply_style`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct LocationComponentOptions {
    /// Whether the displayed location turns stale when updates stop arriving
    pub enable_stale_state: bool,
    /// Time without updates after which the location is considered stale
    pub stale_state_timeout: Duration,
    /// Let the component tune the pan threshold that breaks camera tracking
    pub tracking_gestures_management: bool,
    /// Pan distance in pixels needed to break tracking with one finger
    pub tracking_initial_move_threshold: f32,
    /// Pan distance in pixels needed to break tracking with several fingers
    pub tracking_multi_finger_move_threshold: f32,
    /// Scale applied to the interval between fixes to get the animation duration
    pub tracking_animation_duration_multiplier: f32,
    pub compass_animation_enabled: bool,
    pub accuracy_animation_enabled: bool,
}

impl Default for LocationComponentOptions {
    fn default() -> Self {
        Self {
            enable_stale_state: true,
            stale_state_timeout: Duration::from_secs(30),
            tracking_gestures_management: false,
            tracking_initial_move_threshold: 25.0,
            tracking_multi_finger_move_threshold: 400.0,
            tracking_animation_duration_multiplier: 1.1,
            compass_animation_enabled: true,
            accuracy_animation_enabled: true,
        }
    }
}

impl LocationComponentOptions {
    /// Check value ranges, reporting the first offending field
    pub fn validate(&self) -> Result<()> {
        if self.stale_state_timeout.is_zero() {
            return Err(invalid("stale_state_timeout", "must be greater than zero"));
        }
        if !(self.tracking_initial_move_threshold >= 0.0) {
            return Err(invalid(
                "tracking_initial_move_threshold",
                "must be a non-negative number of pixels",
            ));
        }
        if !(self.tracking_multi_finger_move_threshold >= 0.0) {
            return Err(invalid(
                "tracking_multi_finger_move_threshold",
                "must be a non-negative number of pixels",
            ));
        }
        let multiplier = self.tracking_animation_duration_multiplier;
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(invalid(
                "tracking_animation_duration_multiplier",
                "must be a finite positive number",
            ));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: &'static str) -> LocationError {
    LocationError::InvalidOption {
        name,
        reason: reason.to_string(),
    }
}
