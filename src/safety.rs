//! Safety supervisor.
//!
//! The supervisor runs **every tick before the controller** and accumulates
//! an interlock bitmask.  Any set bit forces the humidifier off through the
//! fail-safe path, which neither waits out the minimum run time nor counts
//! a switch.
//!
//! ## Interlock lifecycle
//!
//! 1. A condition trips (e.g. reservoir below threshold).
//! 2. The supervisor sets the corresponding bit and logs the edge.
//! 3. The service stops the humidifier; automatic control is skipped
//!    while the bit stays set.
//! 4. Each tick the supervisor re-evaluates.  When the condition is gone
//!    the bit clears, the edge is logged, and control resumes subject to
//!    the normal pause floor.
//!
//! Several interlocks can be active at once; control resumes only after
//! *every* one has cleared.

use crate::error::Interlock;
use log::{error, info, warn};

/// Every interlock, in bit order.
pub const ALL_INTERLOCKS: [Interlock; 3] = [
    Interlock::SensorFailure,
    Interlock::WaterLow,
    Interlock::WindowOpen,
];

/// Per-tick inputs to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterlockInputs {
    pub sensor_ok: bool,
    pub water_ok: bool,
    pub window_open: bool,
}

/// Bits that changed during one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterlockEdges {
    pub raised: u8,
    pub cleared: u8,
}

impl InterlockEdges {
    pub fn is_empty(&self) -> bool {
        self.raised == 0 && self.cleared == 0
    }
}

/// Interlocks whose bit is set in `mask`.
pub fn interlocks_in(mask: u8) -> impl Iterator<Item = Interlock> {
    ALL_INTERLOCKS.into_iter().filter(move |i| mask & i.mask() != 0)
}

#[derive(Debug, Default)]
pub struct SafetySupervisor {
    /// Latched interlock bitmask.
    active: u8,
}

impl SafetySupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate all interlock conditions.  Returns the bits that changed.
    pub fn evaluate(&mut self, inputs: &InterlockInputs) -> InterlockEdges {
        let before = self.active;

        self.eval_interlock(Interlock::SensorFailure, !inputs.sensor_ok);
        self.eval_interlock(Interlock::WaterLow, !inputs.water_ok);
        self.eval_interlock(Interlock::WindowOpen, inputs.window_open);

        InterlockEdges {
            raised: self.active & !before,
            cleared: before & !self.active,
        }
    }

    /// Current interlock bitmask.
    pub fn active(&self) -> u8 {
        self.active
    }

    /// True if **any** interlock is active.
    pub fn has_interlocks(&self) -> bool {
        self.active != 0
    }

    pub fn has_interlock(&self, interlock: Interlock) -> bool {
        self.active & interlock.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────────

    fn eval_interlock(&mut self, interlock: Interlock, condition: bool) {
        if condition {
            if self.active & interlock.mask() == 0 {
                match interlock {
                    Interlock::SensorFailure => error!("INTERLOCK SET: {interlock}"),
                    _ => warn!("INTERLOCK SET: {interlock}"),
                }
            }
            self.active |= interlock.mask();
        } else {
            if self.active & interlock.mask() != 0 {
                info!("INTERLOCK CLEARED: {interlock}");
            }
            self.active &= !interlock.mask();
        }
    }
}
