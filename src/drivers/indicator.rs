//! Front-panel indicator LED.
//!
//! A single LED used for the sensor-error blink.  Wiring differs between
//! board revisions, so the active level is configurable.

use embedded_hal::digital::OutputPin;

pub struct IndicatorLed<P: OutputPin> {
    pin: P,
    active_low: bool,
    lit: bool,
}

impl<P: OutputPin> IndicatorLed<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        let mut led = Self { pin, active_low, lit: true };
        led.set(false);
        led
    }

    pub fn set(&mut self, lit: bool) {
        if lit == self.lit {
            return;
        }
        let high = lit != self.active_low;
        // A failed write leaves `lit` unchanged so the next call retries.
        let res = if high { self.pin.set_high() } else { self.pin.set_low() };
        if res.is_ok() {
            self.lit = lit;
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
