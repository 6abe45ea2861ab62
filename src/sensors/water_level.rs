//! Resistive reservoir level probe.
//!
//! The probe is a resistive ladder read through the ADC: more water, lower
//! resistance, higher reading.  Readings slosh around while the humidifier
//! runs, so the low-water flag is latched and only flips after
//! [`DEBOUNCE_READS`] consecutive evaluations disagree with it.
//!
//! A probe that is not fitted reads outside the plausible voltage window at
//! start-up.  In that case the monitor reports "water ok" forever so the
//! rest of the system runs without a reservoir interlock.

use log::{info, warn};

use crate::app::ports::SensorPort;
use crate::time;

// Calibrated probe readings at each fill mark.
pub const LEVEL_EMPTY: u16 = 100;
pub const LEVEL_LOW: u16 = 250;
pub const LEVEL_MEDIUM: u16 = 400;
pub const LEVEL_HIGH: u16 = 550;
pub const LEVEL_FULL: u16 = 700;

/// Averaged start-up readings inside this window mean a probe is fitted.
pub const PRESENT_WINDOW: (u16, u16) = (30, 900);

/// Returned by [`WaterLevelMonitor::percent`] when no probe is fitted.
pub const PERCENT_UNAVAILABLE: u8 = 255;

pub const CHECK_INTERVAL_MS: u32 = 1_000;
pub const DEBOUNCE_READS: u8 = 3;

const CALIBRATION_SAMPLES: u32 = 10;
const AVERAGE_SAMPLES: u32 = 5;

/// Piecewise-linear calibration: (raw, percent) at each fill mark.
const SEGMENTS: [(u16, u8); 5] = [
    (LEVEL_EMPTY, 0),
    (LEVEL_LOW, 25),
    (LEVEL_MEDIUM, 50),
    (LEVEL_HIGH, 75),
    (LEVEL_FULL, 100),
];

pub struct WaterLevelMonitor {
    raw_value: u16,
    threshold: u16,
    present: bool,
    low: bool,
    stable_count: u8,
    last_check_ms: Option<u32>,
}

impl WaterLevelMonitor {
    pub fn new(threshold: u16) -> Self {
        Self {
            raw_value: 0,
            threshold,
            present: false,
            low: false,
            stable_count: 0,
            last_check_ms: None,
        }
    }

    /// Start-up calibration: average several samples and decide whether a
    /// probe is fitted.  Returns the presence verdict.
    pub fn begin(&mut self, port: &mut impl SensorPort) -> bool {
        let avg = average(port, CALIBRATION_SAMPLES);
        self.raw_value = avg;
        self.present = (PRESENT_WINDOW.0..=PRESENT_WINDOW.1).contains(&avg);
        self.low = false;
        self.stable_count = 0;
        if self.present {
            info!("water: probe detected (raw={})", avg);
        } else {
            warn!("water: no probe (raw={}), reservoir interlock disabled", avg);
        }
        self.present
    }

    /// Treat the probe as not fitted (disabled in settings).
    pub fn disable(&mut self) {
        self.present = false;
        self.low = false;
        self.stable_count = 0;
    }

    /// Evaluate the reservoir at most once per [`CHECK_INTERVAL_MS`].
    /// Returns `true` while there is enough water.
    pub fn check(&mut self, now_ms: u32, port: &mut impl SensorPort) -> bool {
        if !self.present {
            return true;
        }
        if !time::due(now_ms, self.last_check_ms, CHECK_INTERVAL_MS) {
            return !self.low;
        }
        self.last_check_ms = Some(now_ms);

        self.raw_value = average(port, AVERAGE_SAMPLES);
        let reads_low = self.raw_value < self.threshold;

        if reads_low == self.low {
            self.stable_count = 0;
        } else {
            self.stable_count += 1;
            if self.stable_count >= DEBOUNCE_READS {
                self.low = reads_low;
                self.stable_count = 0;
                if self.low {
                    warn!("water: reservoir LOW (raw={} < {})", self.raw_value, self.threshold);
                } else {
                    info!("water: reservoir refilled (raw={})", self.raw_value);
                }
            }
        }
        !self.low
    }

    /// Fill estimate in percent, or [`PERCENT_UNAVAILABLE`] without a probe.
    pub fn percent(&self) -> u8 {
        if !self.present {
            return PERCENT_UNAVAILABLE;
        }
        raw_to_percent(self.raw_value)
    }

    pub fn set_threshold(&mut self, threshold: u16) {
        self.threshold = threshold;
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    pub fn raw_value(&self) -> u16 {
        self.raw_value
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Latched low-water flag.  Always `false` without a probe.
    pub fn is_low(&self) -> bool {
        self.present && self.low
    }
}

fn average(port: &mut impl SensorPort, samples: u32) -> u16 {
    let sum: u32 = (0..samples).map(|_| u32::from(port.read_water_raw())).sum();
    (sum / samples) as u16
}

fn raw_to_percent(raw: u16) -> u8 {
    let (first_raw, _) = SEGMENTS[0];
    let (last_raw, last_pct) = SEGMENTS[SEGMENTS.len() - 1];
    if raw <= first_raw {
        return 0;
    }
    if raw >= last_raw {
        return last_pct;
    }
    for pair in SEGMENTS.windows(2) {
        let (lo_raw, lo_pct) = pair[0];
        let (hi_raw, hi_pct) = pair[1];
        if raw < hi_raw {
            let span = u32::from(hi_raw - lo_raw);
            let offset = u32::from(raw - lo_raw);
            let pct_span = u32::from(hi_pct - lo_pct);
            return lo_pct + (offset * pct_span / span) as u8;
        }
    }
    last_pct
}
