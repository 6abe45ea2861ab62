//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to serial, refresh the display,
//! etc.

use crate::analytics::{HourlyStat, LearnedRange};
use crate::control::{HumidityBand, Transition};
use crate::error::Interlock;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started.  `first_run` is set when the
    /// store had no valid layout and defaults were written.
    Started { first_run: bool },

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The humidifier output changed.
    Switched { transition: Transition, humidity: f32 },

    InterlockRaised(Interlock),
    InterlockCleared(Interlock),

    /// An hour's record was written to the ring.
    HourFlushed { hour: u8, stat: HourlyStat },

    /// The learner produced a new band (already persisted).
    LearnedRangeUpdated(LearnedRange),

    /// Settings and counters were written to storage.
    SettingsSaved,
}

/// A point-in-time telemetry snapshot suitable for logging or display.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub sensor_ok: bool,
    pub running: bool,
    pub manual: bool,
    pub switches_this_hour: u8,
    pub total_switches: u32,
    pub work_time_secs: u32,
    pub water_low: bool,
    /// Fill estimate, 255 without a probe.
    pub water_percent: u8,
    pub water_present: bool,
    pub window_open: bool,
    /// Band currently regulated into.
    pub band: HumidityBand,
    /// True when `band` comes from the learner.
    pub learned: bool,
    /// Active interlock bitmask.
    pub interlocks: u8,
}
