//! Adaptive humidity target learning.
//!
//! Once a full day of hourly history is available, the mean humidity of
//! those hours becomes the centre of a learned comfort band of ±10 %RH.
//! The different clamp windows for the two edges keep `min < max` by
//! construction.

use log::{info, warn};

use super::stats::HourlyRing;
use crate::control::HumidityBand;

/// Valid hourly records needed before the band is recomputed.
pub const MIN_DATA: u8 = 24;
/// Half-width of the learned band (%RH).
pub const MARGIN: i16 = 10;
pub const LEARNED_MIN_CLAMP: (i16, i16) = (30, 70);
pub const LEARNED_MAX_CLAMP: (i16, i16) = (40, 80);

/// Learned band as persisted: two bytes, `(0, 0)` means "not learned yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LearnedRange {
    pub min: u8,
    pub max: u8,
}

impl LearnedRange {
    pub const UNLEARNED: Self = Self { min: 0, max: 0 };

    /// Plausibility check applied when loading from storage.
    pub fn is_valid(self) -> bool {
        (20..=80).contains(&self.min) && (30..=90).contains(&self.max) && self.max > self.min
    }

    /// `self` if plausible, otherwise [`LearnedRange::UNLEARNED`].
    pub fn validated(self) -> Self {
        if self.is_valid() { self } else { Self::UNLEARNED }
    }
}

pub struct AdaptiveLearner {
    range: LearnedRange,
    enabled: bool,
}

impl AdaptiveLearner {
    pub fn new(enabled: bool) -> Self {
        Self {
            range: LearnedRange::UNLEARNED,
            enabled,
        }
    }

    /// Install a range read back from storage, discarding it if corrupted.
    pub fn load(&mut self, stored: LearnedRange) {
        self.range = stored.validated();
        if self.range != stored {
            warn!(
                "learning: stored range {}..{} invalid, reset to unlearned",
                stored.min, stored.max
            );
        }
    }

    /// Recompute the band from the ring.  Returns the new range when it
    /// changed, so the caller can persist it.
    ///
    /// A record with `avg_hum == 0` counts as "no data for that hour".  A
    /// genuine 0 %RH hour is therefore ignored as well; that approximation
    /// is accepted.
    pub fn update(&mut self, ring: &HourlyRing) -> Option<LearnedRange> {
        if !self.enabled {
            return None;
        }

        let (total, valid) = ring
            .slots()
            .iter()
            .filter(|s| (1..=100).contains(&s.avg_hum))
            .fold((0u16, 0u8), |(sum, n), s| (sum + u16::from(s.avg_hum), n + 1));

        if valid < MIN_DATA {
            info!("learning: {} of {} hours available, waiting", valid, MIN_DATA);
            return None;
        }

        let avg = (total / u16::from(valid)) as i16;
        let learned = LearnedRange {
            min: (avg - MARGIN).clamp(LEARNED_MIN_CLAMP.0, LEARNED_MIN_CLAMP.1) as u8,
            max: (avg + MARGIN).clamp(LEARNED_MAX_CLAMP.0, LEARNED_MAX_CLAMP.1) as u8,
        };
        if learned == self.range {
            return None;
        }
        info!(
            "learning: mean {}% over {} h -> band {}..{}%",
            avg, valid, learned.min, learned.max
        );
        self.range = learned;
        Some(learned)
    }

    pub fn has_learned_data(&self) -> bool {
        self.range.min > 0 && self.range.max > self.range.min
    }

    /// Learned band, when there is one.
    pub fn band(&self) -> Option<HumidityBand> {
        self.has_learned_data()
            .then(|| HumidityBand::new(f32::from(self.range.min), f32::from(self.range.max)))
    }

    pub fn range(&self) -> LearnedRange {
        self.range
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Forget the learned band.
    pub fn clear(&mut self) {
        self.range = LearnedRange::UNLEARNED;
    }
}
