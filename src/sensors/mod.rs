//! Sensor subsystem — climate sample conditioning and the reservoir monitor.
//!
//! The raw DHT-class driver lives outside this crate.  It publishes every
//! finished conversion into a [`ClimateMailbox`]; the hardware adapter
//! reads the latest one on its next poll and tracks how old it is.

pub mod climate;
pub mod water_level;

use core::sync::atomic::{AtomicU32, Ordering};

/// Latest-value cell between the climate driver and the control loop.
///
/// Publishing never blocks and never queues: a newer sample replaces the
/// previous one and bumps the sequence number, so a reader can tell a
/// fresh conversion from one it has already seen.
pub struct ClimateMailbox {
    temp_bits: AtomicU32,
    hum_bits: AtomicU32,
    /// Number of samples published so far; 0 until the first conversion.
    seq: AtomicU32,
}

impl ClimateMailbox {
    pub const fn new() -> Self {
        Self {
            temp_bits: AtomicU32::new(0),
            hum_bits: AtomicU32::new(0),
            seq: AtomicU32::new(0),
        }
    }

    /// Publish a finished temperature/humidity conversion.
    /// Lock-free — safe to call from the driver task or a timer callback.
    pub fn publish(&self, temperature_c: f32, humidity_pct: f32) {
        self.temp_bits.store(temperature_c.to_bits(), Ordering::Relaxed);
        self.hum_bits.store(humidity_pct.to_bits(), Ordering::Relaxed);
        self.seq.fetch_add(1, Ordering::Release);
    }

    /// Latest sample with its sequence number, `None` before the first one.
    pub fn latest(&self) -> Option<(u32, RawClimate)> {
        let seq = self.seq.load(Ordering::Acquire);
        if seq == 0 {
            return None;
        }
        Some((
            seq,
            RawClimate {
                temperature_c: f32::from_bits(self.temp_bits.load(Ordering::Relaxed)),
                humidity_pct: f32::from_bits(self.hum_bits.load(Ordering::Relaxed)),
            },
        ))
    }
}

impl Default for ClimateMailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Mailbox the on-target climate driver publishes into.
pub static CLIMATE_MAILBOX: ClimateMailbox = ClimateMailbox::new();

/// Publish into [`CLIMATE_MAILBOX`].
pub fn publish_climate_sample(temperature_c: f32, humidity_pct: f32) {
    CLIMATE_MAILBOX.publish(temperature_c, humidity_pct);
}

/// Uncalibrated temperature/humidity pair as delivered by the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawClimate {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Calibrated reading consumed by every analytics component.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    /// Temperature in °C, within [-40, 80].
    pub temperature_c: f32,
    /// Relative humidity in %, within [0, 100].
    pub humidity_pct: f32,
    /// False when the last acquisition failed; values are then stale.
    pub valid: bool,
}
