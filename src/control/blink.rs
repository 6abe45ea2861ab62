//! Error indicator blink generator.
//!
//! A plain square wave: the level flips every [`BLINK_PERIOD_MS`].  The
//! caller pushes the level onto the indicator only when it changes.

use crate::time;

pub const BLINK_PERIOD_MS: u32 = 250;

#[derive(Debug, Default)]
pub struct ErrorBlinker {
    level: bool,
    last_toggle_ms: Option<u32>,
}

impl ErrorBlinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the wave.  Returns the new level when it flipped.
    pub fn tick(&mut self, now_ms: u32) -> Option<bool> {
        if !time::due(now_ms, self.last_toggle_ms, BLINK_PERIOD_MS) {
            return None;
        }
        self.last_toggle_ms = Some(now_ms);
        self.level = !self.level;
        Some(self.level)
    }

    pub fn level(&self) -> bool {
        self.level
    }

    /// Back to dark; the next tick turns the indicator on immediately.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
