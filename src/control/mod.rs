//! Actuator control: the hysteresis state machine and its inputs.

pub mod blink;
pub mod hysteresis;

pub use blink::ErrorBlinker;
pub use hysteresis::{ControllerState, DwellLimits, HysteresisController, Transition};

use crate::config::SystemConfig;

/// The humidity band the controller regulates into.
///
/// Below `on_below` the humidifier starts; at or above `off_at` it stops.
/// Between the two nothing changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumidityBand {
    pub on_below: f32,
    pub off_at: f32,
}

impl HumidityBand {
    pub fn new(on_below: f32, off_at: f32) -> Self {
        Self { on_below, off_at }
    }

    /// Band from the configured thresholds.  The off threshold is pushed up
    /// so the band is never narrower than the hysteresis margin.
    pub fn from_config(cfg: &SystemConfig) -> Self {
        let on_below = f32::from(cfg.min_humidity);
        let off_at = f32::from(cfg.max_humidity)
            .max(on_below + f32::from(cfg.hysteresis))
            .min(100.0);
        Self { on_below, off_at }
    }

    pub fn width(&self) -> f32 {
        self.off_at - self.on_below
    }
}
