//! Humidifier output driver.
//!
//! One digital output switching the humidifier (relay or MOSFET gate,
//! active HIGH).
//!
//! ## Safety contract
//!
//! The humidifier must never run with the reservoir low.  Enforced by the
//! safety supervisor; this driver is a dumb actuator.
//!
//! ## Dual-target design
//!
//! Generic over [`OutputPin`]: on ESP-IDF it wraps an `esp-idf-hal`
//! `PinDriver`, in host tests any in-memory pin.

use embedded_hal::digital::{Error as _, OutputPin};
use log::{error, info};

pub struct HumidifierDriver<P: OutputPin> {
    pin: P,
    on: bool,
    /// Writes rejected by the pin since boot.
    write_errors: u32,
}

impl<P: OutputPin> HumidifierDriver<P> {
    /// Take the pin and drive it LOW.
    pub fn new(pin: P) -> Self {
        let mut d = Self { pin, on: true, write_errors: 0 };
        d.set(false);
        d
    }

    /// Drive the output.  Repeated writes of the same level are skipped.
    pub fn set(&mut self, on: bool) {
        if on == self.on {
            return;
        }
        let res = if on { self.pin.set_high() } else { self.pin.set_low() };
        match res {
            Ok(()) => {
                self.on = on;
                info!("humidifier output {}", if on { "HIGH" } else { "LOW" });
            }
            Err(e) => {
                self.write_errors = self.write_errors.saturating_add(1);
                error!("humidifier output write failed: {:?}", e.kind());
            }
        }
    }

    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }
}
