//! Debounced "is the displayed location outdated" state
//!
//! Every location update marks the state fresh and pushes a single deadline
//! `timeout` into the future. When [`StaleStateManager::poll`] observes that the
//! deadline passed without another update the state flips to stale. The deadline
//! is plain data owned by the manager, so dropping the manager also drops any
//! pending expiry.

use crate::clock::Clock;
use crate::options::LocationComponentOptions;
use std::rc::Rc;
use std::time::Duration;

/// Receives every stale state change while the manager is enabled
pub type StaleListener = Box<dyn FnMut(bool)>;

pub struct StaleStateManager {
    clock: Rc<dyn Clock>,
    listener: StaleListener,
    enabled: bool,
    stale: bool,
    delay: Duration,
    deadline: Option<Duration>,
}

impl StaleStateManager {
    /// Starts out stale since no location has been received yet
    pub fn new(
        clock: Rc<dyn Clock>,
        listener: StaleListener,
        options: &LocationComponentOptions,
    ) -> Self {
        Self {
            clock,
            listener,
            enabled: options.enable_stale_state,
            stale: true,
            delay: options.stale_state_timeout,
            deadline: None,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn delay_time(&self) -> Duration {
        self.delay
    }

    /// When the pending timer expires, if one is pending
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// A new location arrived: become fresh now and restart the timeout
    pub fn update_latest_location_time(&mut self) {
        if self.stale {
            self.set_state(false);
        }
        self.post_timer();
    }

    /// Toggle notifications.
    ///
    /// Enabling reports the current state. Disabling drops the pending timer and
    /// tells the listener the location is no longer shown as stale.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            (self.listener)(self.stale);
        } else {
            self.deadline = None;
            (self.listener)(false);
        }
    }

    /// Change the timeout. A pending timer is rescheduled from now.
    pub fn set_delay_time(&mut self, delay: Duration) {
        self.delay = delay;
        if self.deadline.is_some() {
            self.post_timer();
        }
    }

    pub fn on_start(&mut self) {
        if !self.stale {
            self.post_timer();
        }
    }

    pub fn on_stop(&mut self) {
        self.deadline = None;
    }

    /// Fire the timer if its deadline has passed
    pub fn poll(&mut self) {
        let Some(deadline) = self.deadline else {
            return;
        };
        if self.clock.now() >= deadline {
            self.deadline = None;
            self.set_state(true);
        }
    }

    fn post_timer(&mut self) {
        self.deadline = Some(self.clock.now() + self.delay);
    }

    fn set_state(&mut self, stale: bool) {
        if stale == self.stale {
            return;
        }
        self.stale = stale;
        tracing::debug!("Location stale state changed to {}", stale);
        if self.enabled {
            (self.listener)(stale);
        }
    }
}
