//! Hourly statistics recorder.
//!
//! Accumulates every sample of the current hour-of-day in RAM and, when the
//! hour changes or sampling resumes after a gap of an hour or more, folds the
//! accumulator into one 4-byte [`HourlyStat`] stored
//! in a 24-slot ring indexed by hour-of-day.  Each slot is overwritten once a
//! day; there is no growing log.
//!
//! The record encoding is deliberately byte-sized: temperature is stored
//! offset by +50 so -50..50 °C fits an unsigned byte, humidity is stored as
//! whole percent, and both means are truncated, not rounded.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::time::{self, HOUR_MS};

/// Depth of the ring: one slot per hour-of-day.
pub const RING_SLOTS: usize = 24;
/// Added to temperatures before byte encoding.
pub const TEMP_OFFSET_C: f32 = 50.0;

const MINUTE_MS: u32 = 60_000;

/// One compact hourly record.
///
/// An all-zero record is indistinguishable from a slot that was never
/// written; callers treat it as "no data".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HourlyStat {
    /// Mean temperature + 50 (°C), truncated.
    pub avg_temp: u8,
    /// Mean relative humidity (%), truncated.
    pub avg_hum: u8,
    /// Minutes the humidifier ran during the hour (0–60).
    pub run_minutes: u8,
    /// Humidifier starts during the hour.
    pub switches: u8,
}

impl HourlyStat {
    pub const SIZE: usize = 4;

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        [self.avg_temp, self.avg_hum, self.run_minutes, self.switches]
    }

    pub fn from_bytes(b: [u8; Self::SIZE]) -> Self {
        Self {
            avg_temp: b[0],
            avg_hum: b[1],
            run_minutes: b[2],
            switches: b[3],
        }
    }

    /// Decoded mean temperature in °C.
    pub fn temperature_c(self) -> f32 {
        f32::from(self.avg_temp) - TEMP_OFFSET_C
    }

    pub fn is_empty(self) -> bool {
        self == Self::default()
    }
}

/// The 24-slot ring, indexed by hour-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HourlyRing {
    slots: [HourlyStat; RING_SLOTS],
}

impl HourlyRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hour: u8) -> HourlyStat {
        self.slots[usize::from(hour) % RING_SLOTS]
    }

    pub fn set(&mut self, hour: u8, stat: HourlyStat) {
        self.slots[usize::from(hour) % RING_SLOTS] = stat;
    }

    /// Slot written `hours_ago` hours before `current_hour`.
    pub fn hours_ago(&self, current_hour: u8, hours_ago: u8) -> HourlyStat {
        let back = usize::from(hours_ago) % RING_SLOTS;
        let idx = (usize::from(current_hour) % RING_SLOTS + RING_SLOTS - back) % RING_SLOTS;
        self.slots[idx]
    }

    pub fn slots(&self) -> &[HourlyStat; RING_SLOTS] {
        &self.slots
    }

    pub fn clear(&mut self) {
        self.slots = [HourlyStat::default(); RING_SLOTS];
    }
}

/// Builds the record for the current hour and flushes it into the ring.
pub struct HourlyStatsRecorder {
    current_hour: Option<u8>,
    last_sample_ms: Option<u32>,
    temp_sum: u32,
    hum_sum: u32,
    sample_count: u16,
    run_samples: u16,
    switches: u8,
    sample_interval_ms: u32,
    ring: HourlyRing,
}

impl HourlyStatsRecorder {
    /// `sample_interval_ms` converts counted run samples into run minutes.
    pub fn new(sample_interval_ms: u32) -> Self {
        Self {
            current_hour: None,
            last_sample_ms: None,
            temp_sum: 0,
            hum_sum: 0,
            sample_count: 0,
            run_samples: 0,
            switches: 0,
            sample_interval_ms,
            ring: HourlyRing::new(),
        }
    }

    /// Seed the ring with records loaded from persistent storage.
    pub fn load_ring(&mut self, ring: HourlyRing) {
        self.ring = ring;
    }

    pub fn set_sample_interval(&mut self, sample_interval_ms: u32) {
        self.sample_interval_ms = sample_interval_ms;
    }

    /// Account one sample taken at `now_ms` during `hour`.
    ///
    /// When `hour` differs from the hour being accumulated, or the previous
    /// sample is at least an hour old, the open hour is flushed first; the
    /// flushed `(hour, record)` is returned so the caller can persist it.
    pub fn add_sample(
        &mut self,
        now_ms: u32,
        hour: u8,
        temp_c: f32,
        hum_pct: f32,
        running: bool,
    ) -> Option<(u8, HourlyStat)> {
        let hour = hour % RING_SLOTS as u8;
        let mut flushed = None;

        let resumed_after_gap = self
            .last_sample_ms
            .is_some_and(|last| time::interval_elapsed(now_ms, last, HOUR_MS));
        if (self.current_hour != Some(hour) || resumed_after_gap) && self.sample_count > 0 {
            flushed = self.save_hourly_stats();
            self.reset_accumulators();
        }
        self.current_hour = Some(hour);
        self.last_sample_ms = Some(now_ms);

        self.temp_sum += u32::from((temp_c + TEMP_OFFSET_C).clamp(0.0, 100.0) as u8);
        self.hum_sum += u32::from(hum_pct.clamp(0.0, 100.0) as u8);
        self.sample_count = self.sample_count.saturating_add(1);
        if running {
            self.run_samples = self.run_samples.saturating_add(1);
        }
        flushed
    }

    /// Count one humidifier start against the current hour.
    pub fn increment_switches(&mut self) {
        self.switches = self.switches.saturating_add(1);
    }

    /// Fold the accumulator into the ring slot of the hour being recorded.
    /// Returns `None` when nothing was sampled yet.
    pub fn save_hourly_stats(&mut self) -> Option<(u8, HourlyStat)> {
        let hour = self.current_hour?;
        if self.sample_count == 0 {
            return None;
        }
        let count = u32::from(self.sample_count);
        let run_ms = u64::from(self.run_samples) * u64::from(self.sample_interval_ms);
        let stat = HourlyStat {
            avg_temp: (self.temp_sum / count) as u8,
            avg_hum: (self.hum_sum / count) as u8,
            run_minutes: (run_ms / u64::from(MINUTE_MS)).min(60) as u8,
            switches: self.switches,
        };
        self.ring.set(hour, stat);
        info!(
            "stats: hour {:02} -> T={}\u{00b0}C H={}% run={}min sw={} ({} samples)",
            hour,
            stat.temperature_c(),
            stat.avg_hum,
            stat.run_minutes,
            stat.switches,
            self.sample_count
        );
        Some((hour, stat))
    }

    fn reset_accumulators(&mut self) {
        debug!("stats: new hour, accumulators reset");
        self.temp_sum = 0;
        self.hum_sum = 0;
        self.sample_count = 0;
        self.run_samples = 0;
        self.switches = 0;
    }

    /// Record from `hours_ago` hours before `current_hour`.
    pub fn hour_stats(&self, current_hour: u8, hours_ago: u8) -> HourlyStat {
        self.ring.hours_ago(current_hour, hours_ago)
    }

    pub fn ring(&self) -> &HourlyRing {
        &self.ring
    }

    /// Hour currently being accumulated.
    pub fn current_hour(&self) -> Option<u8> {
        self.current_hour
    }

    pub fn sample_count(&self) -> u16 {
        self.sample_count
    }

    /// Drop both the accumulator and the ring (factory reset).
    pub fn clear(&mut self) {
        self.reset_accumulators();
        self.current_hour = None;
        self.last_sample_ms = None;
        self.ring.clear();
    }
}
