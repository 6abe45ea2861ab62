//! System configuration parameters
//!
//! All tunable parameters for the Humidor controller.
//! Values are persisted by the [`SettingsStore`](crate::store::SettingsStore)
//! and changed from the local menu through the same setters.

use log::warn;
use serde::{Deserialize, Serialize};

/// Allowed range for the lower humidity threshold (%RH).
pub const MIN_HUMIDITY_RANGE: (u8, u8) = (20, 80);
/// Allowed range for the upper humidity threshold (%RH).
pub const MAX_HUMIDITY_RANGE: (u8, u8) = (30, 90);
/// Allowed range for the hysteresis margin (%RH).
pub const HYSTERESIS_RANGE: (u8, u8) = (1, 20);
/// Allowed range for the temperature calibration offset (°C).
pub const TEMP_CALIBRATION_RANGE: (f32, f32) = (-10.0, 10.0);
/// Allowed range for the humidity calibration offset (%RH).
pub const HUM_CALIBRATION_RANGE: (f32, f32) = (-20.0, 20.0);
/// Plausible raw ADC window of the reservoir probe.
pub const WATER_THRESHOLD_RANGE: (u16, u16) = (30, 900);

/// Core system configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Humidity band ---
    /// Turn the humidifier on below this value (%RH)
    pub min_humidity: u8,
    /// Turn the humidifier off at or above this value (%RH)
    pub max_humidity: u8,
    /// Minimum width of the band between on and off thresholds (%RH)
    pub hysteresis: u8,

    // --- Actuator protection ---
    /// Ceiling on actuator starts per rolling hour
    pub max_switches_per_hour: u8,
    /// Minimum time the humidifier stays on once started (ms)
    pub min_run_time_ms: u32,
    /// Minimum time the humidifier stays off once stopped (ms)
    pub min_pause_time_ms: u32,

    // --- Reservoir ---
    /// Raw probe reading below which the reservoir counts as low
    pub water_threshold: u16,
    /// Whether a reservoir probe is fitted at all
    pub water_sensor_enabled: bool,

    // --- Calibration ---
    /// Offset added to every temperature sample (°C)
    pub temp_calibration: f32,
    /// Offset added to every humidity sample (%RH)
    pub hum_calibration: f32,

    // --- Analytics ---
    /// Suppress humidification while a window is detected open
    pub window_detector_enabled: bool,
    /// Use the learned band instead of the configured one when available
    pub learning_enabled: bool,

    // --- Timing ---
    /// Sampling tick interval (ms)
    pub sample_interval_ms: u32,
    /// Batched settings save interval (ms)
    pub autosave_interval_ms: u32,
    /// Telemetry report interval (ms)
    pub telemetry_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Humidity band
            min_humidity: 40,
            max_humidity: 60,
            hysteresis: 5,

            // Actuator protection
            max_switches_per_hour: 10,
            min_run_time_ms: 30_000,
            min_pause_time_ms: 60_000,

            // Reservoir
            water_threshold: 250,
            water_sensor_enabled: true,

            // Calibration
            temp_calibration: 0.0,
            hum_calibration: 0.0,

            // Analytics
            window_detector_enabled: true,
            learning_enabled: true,

            // Timing
            sample_interval_ms: 2_000,
            autosave_interval_ms: 300_000,
            telemetry_interval_ms: 60_000,
        }
    }
}

impl SystemConfig {
    /// Set the lower threshold, clamped to its allowed range.
    pub fn set_min_humidity(&mut self, value: u8) {
        self.min_humidity = value.clamp(MIN_HUMIDITY_RANGE.0, MIN_HUMIDITY_RANGE.1);
    }

    /// Set the upper threshold, clamped to its allowed range.
    pub fn set_max_humidity(&mut self, value: u8) {
        self.max_humidity = value.clamp(MAX_HUMIDITY_RANGE.0, MAX_HUMIDITY_RANGE.1);
    }

    pub fn set_hysteresis(&mut self, value: u8) {
        self.hysteresis = value.clamp(HYSTERESIS_RANGE.0, HYSTERESIS_RANGE.1);
    }

    pub fn set_temp_calibration(&mut self, value: f32) {
        self.temp_calibration = value.clamp(TEMP_CALIBRATION_RANGE.0, TEMP_CALIBRATION_RANGE.1);
    }

    pub fn set_hum_calibration(&mut self, value: f32) {
        self.hum_calibration = value.clamp(HUM_CALIBRATION_RANGE.0, HUM_CALIBRATION_RANGE.1);
    }

    pub fn set_water_threshold(&mut self, value: u16) {
        self.water_threshold = value.clamp(WATER_THRESHOLD_RANGE.0, WATER_THRESHOLD_RANGE.1);
    }

    /// Return a copy with every out-of-range field reset to its default.
    ///
    /// Used on load: a corrupted field is repaired on its own, the rest of
    /// the stored configuration survives.  Returns the repaired config and
    /// the number of fields that had to be reset.
    pub fn repaired(&self) -> (Self, u8) {
        let defaults = Self::default();
        let mut cfg = *self;
        let mut fixes = 0u8;

        let mut reset = |ok: bool, name: &str| {
            if !ok {
                warn!("config: {} out of range, reset to default", name);
                fixes += 1;
            }
            ok
        };

        if !reset(in_range(cfg.min_humidity, MIN_HUMIDITY_RANGE), "min_humidity") {
            cfg.min_humidity = defaults.min_humidity;
        }
        if !reset(in_range(cfg.max_humidity, MAX_HUMIDITY_RANGE), "max_humidity") {
            cfg.max_humidity = defaults.max_humidity;
        }
        if !reset(in_range(cfg.hysteresis, HYSTERESIS_RANGE), "hysteresis") {
            cfg.hysteresis = defaults.hysteresis;
        }
        if !reset(cfg.min_humidity < cfg.max_humidity, "min_humidity >= max_humidity") {
            cfg.min_humidity = defaults.min_humidity;
            cfg.max_humidity = defaults.max_humidity;
        }
        if !reset(cfg.max_switches_per_hour > 0, "max_switches_per_hour") {
            cfg.max_switches_per_hour = defaults.max_switches_per_hour;
        }
        if !reset(in_range(cfg.water_threshold, WATER_THRESHOLD_RANGE), "water_threshold") {
            cfg.water_threshold = defaults.water_threshold;
        }
        if !reset(
            in_range(cfg.temp_calibration, TEMP_CALIBRATION_RANGE),
            "temp_calibration",
        ) {
            cfg.temp_calibration = defaults.temp_calibration;
        }
        if !reset(
            in_range(cfg.hum_calibration, HUM_CALIBRATION_RANGE),
            "hum_calibration",
        ) {
            cfg.hum_calibration = defaults.hum_calibration;
        }
        if !reset(
            (500..=60_000).contains(&cfg.sample_interval_ms),
            "sample_interval_ms",
        ) {
            cfg.sample_interval_ms = defaults.sample_interval_ms;
        }
        if !reset(cfg.autosave_interval_ms >= 10_000, "autosave_interval_ms") {
            cfg.autosave_interval_ms = defaults.autosave_interval_ms;
        }
        if !reset(cfg.telemetry_interval_ms >= 1_000, "telemetry_interval_ms") {
            cfg.telemetry_interval_ms = defaults.telemetry_interval_ms;
        }

        (cfg, fixes)
    }
}

// NaN fails both comparisons, so a garbage float is repaired as well.
fn in_range<T: PartialOrd>(value: T, (lo, hi): (T, T)) -> bool {
    value >= lo && value <= hi
}
