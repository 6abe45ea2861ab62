//! Open-window detector.
//!
//! An opened window shows up as a fast, sustained temperature drop.  While
//! it is flagged the humidifier is held off, since the moisture would only
//! leave through the window.
//!
//! The baseline re-anchors only when the temperature has recovered to
//! within [`RECOVERY_MARGIN_C`] of it.  A partial drop neither closes the
//! window nor moves the baseline, so the baseline cannot drift down with a
//! genuine cold draft.

use log::info;

use crate::time;

pub const CHECK_INTERVAL_MS: u32 = 30_000;
/// Drop below the baseline that counts as a window sample (°C).
pub const DROP_THRESHOLD_C: f32 = 2.0;
pub const SAMPLES_REQUIRED: u8 = 3;
pub const RECOVERY_MARGIN_C: f32 = 0.5;

#[derive(Debug, Default)]
pub struct WindowDetector {
    baseline_c: Option<f32>,
    drop_samples: u8,
    open: bool,
    last_check_ms: Option<u32>,
}

impl WindowDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current temperature.  Evaluates at most once per
    /// [`CHECK_INTERVAL_MS`]; returns the (possibly unchanged) open flag.
    pub fn update(&mut self, now_ms: u32, current_c: f32) -> bool {
        if !time::due(now_ms, self.last_check_ms, CHECK_INTERVAL_MS) {
            return self.open;
        }
        self.last_check_ms = Some(now_ms);

        let Some(baseline) = self.baseline_c else {
            self.baseline_c = Some(current_c);
            return self.open;
        };

        if baseline - current_c >= DROP_THRESHOLD_C {
            self.drop_samples = self.drop_samples.saturating_add(1);
            if self.drop_samples >= SAMPLES_REQUIRED && !self.open {
                self.open = true;
                info!(
                    "window: OPEN (baseline {:.1}\u{00b0}C, now {:.1}\u{00b0}C)",
                    baseline, current_c
                );
            }
        } else if current_c >= baseline - RECOVERY_MARGIN_C {
            if self.open {
                info!("window: closed (recovered to {:.1}\u{00b0}C)", current_c);
            }
            self.drop_samples = 0;
            self.open = false;
            self.baseline_c = Some(current_c);
        }
        self.open
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn baseline(&self) -> Option<f32> {
        self.baseline_c
    }

    pub fn drop_samples(&self) -> u8 {
        self.drop_samples
    }

    /// Forget the baseline and any in-progress detection.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
