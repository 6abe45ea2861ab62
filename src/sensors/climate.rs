//! Climate sample conditioning.
//!
//! Wraps the raw temperature/humidity driver output: applies the stored
//! calibration offsets, rejects physically implausible samples and keeps
//! the error counters the display and the indicator blink rely on.

use log::{debug, warn};

use super::{RawClimate, Reading};
use crate::app::ports::SensorPort;
use crate::error::SensorError;
use crate::time;

/// The sensor needs this long between conversions.
pub const POLL_INTERVAL_MS: u32 = 2_000;

/// Plausible raw temperature range (°C).
pub const TEMP_RANGE: (f32, f32) = (-40.0, 80.0);
/// Plausible raw humidity range (%RH).
pub const HUM_RANGE: (f32, f32) = (0.0, 100.0);

/// Consecutive failures after which the sensor is no longer trusted.
const ERRORS_NOT_OK: u8 = 3;
/// Consecutive failures after which the error indicator starts blinking.
const ERRORS_CRITICAL: u8 = 5;

pub struct ClimateSensor {
    reading: Reading,
    raw: Option<RawClimate>,
    last_read_ms: Option<u32>,
    consecutive_errors: u8,
    error_count: u8,
    last_error: Option<SensorError>,
}

impl Default for ClimateSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClimateSensor {
    pub fn new() -> Self {
        Self {
            reading: Reading::default(),
            raw: None,
            last_read_ms: None,
            consecutive_errors: 0,
            error_count: 0,
            last_error: None,
        }
    }

    /// Acquire and condition a new sample if the poll interval has passed;
    /// otherwise return the previous reading unchanged.
    pub fn update(
        &mut self,
        now_ms: u32,
        port: &mut impl SensorPort,
        temp_calibration: f32,
        hum_calibration: f32,
    ) -> Reading {
        if !time::due(now_ms, self.last_read_ms, POLL_INTERVAL_MS) {
            return self.reading;
        }
        self.last_read_ms = Some(now_ms);

        match Self::validate(port.sample_climate()) {
            Ok(raw) => {
                self.raw = Some(raw);
                self.reading = Reading {
                    temperature_c: (raw.temperature_c + temp_calibration)
                        .clamp(TEMP_RANGE.0, TEMP_RANGE.1),
                    humidity_pct: (raw.humidity_pct + hum_calibration)
                        .clamp(HUM_RANGE.0, HUM_RANGE.1),
                    valid: true,
                };
                if self.consecutive_errors > 0 {
                    debug!("climate: recovered after {} errors", self.consecutive_errors);
                }
                self.consecutive_errors = 0;
                self.last_error = None;
            }
            Err(e) => {
                self.consecutive_errors = self.consecutive_errors.saturating_add(1);
                self.error_count = self.error_count.saturating_add(1);
                self.last_error = Some(e);
                self.reading.valid = false;
                warn!("climate: {} (consecutive={})", e, self.consecutive_errors);
            }
        }
        self.reading
    }

    fn validate(sample: Option<RawClimate>) -> Result<RawClimate, SensorError> {
        let raw = sample.ok_or(SensorError::NoSample)?;
        if raw.temperature_c.is_nan() || raw.humidity_pct.is_nan() {
            return Err(SensorError::NoSample);
        }
        let t_ok = raw.temperature_c >= TEMP_RANGE.0 && raw.temperature_c <= TEMP_RANGE.1;
        let h_ok = raw.humidity_pct >= HUM_RANGE.0 && raw.humidity_pct <= HUM_RANGE.1;
        if !(t_ok && h_ok) {
            return Err(SensorError::OutOfRange);
        }
        Ok(raw)
    }

    /// Last conditioned reading.
    pub fn reading(&self) -> Reading {
        self.reading
    }

    /// Last accepted sample before calibration (for the calibration screen).
    pub fn raw(&self) -> Option<RawClimate> {
        self.raw
    }

    pub fn is_ok(&self) -> bool {
        self.reading.valid && self.consecutive_errors < ERRORS_NOT_OK
    }

    pub fn is_critical(&self) -> bool {
        self.consecutive_errors >= ERRORS_CRITICAL
    }

    /// Total failed acquisitions since the last reset (saturates at 255).
    pub fn error_count(&self) -> u8 {
        self.error_count
    }

    pub fn consecutive_errors(&self) -> u8 {
        self.consecutive_errors
    }

    pub fn last_error(&self) -> Option<SensorError> {
        self.last_error
    }

    pub fn reset_errors(&mut self) {
        self.error_count = 0;
        self.consecutive_errors = 0;
    }
}
