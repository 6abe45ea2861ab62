//! Hysteresis on/off controller for the humidifier.
//!
//! Three mechanisms bound actuator wear independently of sensor noise:
//!
//! 1. **Band** — start below `on_below`, stop at `off_at`; nothing happens
//!    in between.
//! 2. **Dwell times** — once started the humidifier runs at least
//!    `min_run_ms`; once stopped it rests at least `min_pause_ms`.
//! 3. **Switch ceiling** — at most `max_switches_per_hour` starts per rolling
//!    hour.  Reaching it forces the humidifier off until the window rolls
//!    over.
//!
//! Manual override is orthogonal: while set, `control()` does nothing and
//! the output only changes through [`toggle`](HysteresisController::toggle).
//!
//! Fail-safe stops ([`turn_off_direct`](HysteresisController::turn_off_direct))
//! skip the run-time floor and are never counted as switches.

use log::{debug, info, warn};

use super::HumidityBand;
use crate::config::SystemConfig;
use crate::time::{self, HOUR_MS};

/// Dwell floors and switch ceiling, snapshotted from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwellLimits {
    pub min_run_ms: u32,
    pub min_pause_ms: u32,
    pub max_switches_per_hour: u8,
}

impl From<&SystemConfig> for DwellLimits {
    fn from(cfg: &SystemConfig) -> Self {
        Self {
            min_run_ms: cfg.min_run_time_ms,
            min_pause_ms: cfg.min_pause_time_ms,
            max_switches_per_hour: cfg.max_switches_per_hour,
        }
    }
}

/// Output change produced by a controller call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Started; counted against the hourly ceiling.
    On,
    /// Stopped normally (band reached, ceiling hit, or manual).
    Off,
    /// Stopped by a fail-safe or interlock; not counted.
    ForcedOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
    ManualOverride { running: bool },
}

pub struct HysteresisController {
    limits: DwellLimits,
    running: bool,
    manual: bool,
    last_switch_ms: u32,
    run_start_ms: u32,
    hour_window_start_ms: u32,
    switches_this_hour: u8,
}

impl HysteresisController {
    /// Build an idle controller.  `now_ms` opens the first hourly window
    /// and counts as the last switch, so the first start after boot waits
    /// out the pause floor.
    pub fn new(limits: DwellLimits, now_ms: u32) -> Self {
        Self {
            limits,
            running: false,
            manual: false,
            last_switch_ms: now_ms,
            run_start_ms: now_ms,
            hour_window_start_ms: now_ms,
            switches_this_hour: 0,
        }
    }

    /// Replace the limits with a fresh configuration snapshot.
    pub fn set_limits(&mut self, limits: DwellLimits) {
        self.limits = limits;
    }

    pub fn limits(&self) -> DwellLimits {
        self.limits
    }

    /// One automatic control step.
    pub fn control(
        &mut self,
        now_ms: u32,
        humidity: f32,
        band: HumidityBand,
        sensor_ok: bool,
    ) -> Option<Transition> {
        if self.manual {
            return None;
        }
        if !sensor_ok {
            return self.turn_off_direct(now_ms);
        }

        if time::interval_elapsed(now_ms, self.hour_window_start_ms, HOUR_MS) {
            debug!("humidifier: hourly switch counter reset ({})", self.switches_this_hour);
            self.switches_this_hour = 0;
            self.hour_window_start_ms = now_ms;
        }

        if self.switches_this_hour >= self.limits.max_switches_per_hour {
            if self.running {
                warn!(
                    "humidifier: {} switches this hour, holding off",
                    self.switches_this_hour
                );
                return self.turn_off(now_ms);
            }
            return None;
        }

        if !self.running && humidity < band.on_below {
            if time::interval_elapsed(now_ms, self.last_switch_ms, self.limits.min_pause_ms) {
                info!("humidifier: on at {:.1}% (< {:.0}%)", humidity, band.on_below);
                return self.turn_on(now_ms);
            }
        } else if self.running
            && humidity >= band.off_at
            && time::interval_elapsed(now_ms, self.run_start_ms, self.limits.min_run_ms)
        {
            info!("humidifier: off at {:.1}% (>= {:.0}%)", humidity, band.off_at);
            return self.turn_off(now_ms);
        }
        None
    }

    /// Start the humidifier.  No-op when already running.
    pub fn turn_on(&mut self, now_ms: u32) -> Option<Transition> {
        if self.running {
            return None;
        }
        self.running = true;
        self.run_start_ms = now_ms;
        self.last_switch_ms = now_ms;
        self.switches_this_hour = self.switches_this_hour.saturating_add(1);
        info!("humidifier: >>> ON <<< (switch {} this hour)", self.switches_this_hour);
        Some(Transition::On)
    }

    /// Stop the humidifier.  No-op when already stopped.
    pub fn turn_off(&mut self, now_ms: u32) -> Option<Transition> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.last_switch_ms = now_ms;
        info!("humidifier: >>> OFF <<<");
        Some(Transition::Off)
    }

    /// Fail-safe stop: ignores the run-time floor and the switch counter.
    /// The pause floor still starts, so the humidifier does not restart the
    /// moment the fault clears.
    pub fn turn_off_direct(&mut self, now_ms: u32) -> Option<Transition> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.last_switch_ms = now_ms;
        warn!("humidifier: fail-safe OFF");
        Some(Transition::ForcedOff)
    }

    /// Flip the output by hand and enter manual mode.
    pub fn toggle(&mut self, now_ms: u32) -> Option<Transition> {
        let t = if self.running {
            self.turn_off(now_ms)
        } else {
            self.turn_on(now_ms)
        };
        if !self.manual {
            info!("humidifier: manual mode");
        }
        self.manual = true;
        t
    }

    /// Hand control back to the automatic loop.
    pub fn exit_manual_mode(&mut self) {
        if self.manual {
            info!("humidifier: automatic mode");
        }
        self.manual = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_manual_mode(&self) -> bool {
        self.manual
    }

    pub fn state(&self) -> ControllerState {
        match (self.manual, self.running) {
            (true, running) => ControllerState::ManualOverride { running },
            (false, true) => ControllerState::Running,
            (false, false) => ControllerState::Idle,
        }
    }

    /// Starts counted in the current hourly window.
    pub fn switch_count(&self) -> u8 {
        self.switches_this_hour
    }

    /// Seconds since the current run started, 0 while stopped.
    pub fn run_duration_secs(&self, now_ms: u32) -> u32 {
        if self.running {
            time::elapsed_ms(now_ms, self.run_start_ms) / 1000
        } else {
            0
        }
    }
}
