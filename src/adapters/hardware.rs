//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the output drivers and the reservoir ADC channel, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  This is the only module in
//! the system that touches actual hardware.  On non-espidf targets the ADC
//! read falls back to the simulation value in `hw_init`.
//!
//! The climate driver runs at its own cadence, so a poll may land between
//! two conversions.  The last sample is reused for up to
//! [`MAX_STALE_POLLS`] polls; only a driver that has gone quiet for longer
//! reads as a dropout.

use embedded_hal::digital::OutputPin;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::humidifier::HumidifierDriver;
use crate::drivers::hw_init;
use crate::drivers::indicator::IndicatorLed;
use crate::pins;
use crate::sensors::{self, ClimateMailbox, RawClimate};

/// Polls that may reuse an already-seen climate sample before it counts as
/// missing.  At the 2 s poll rate a sample older than ~6 s is a dropout.
pub const MAX_STALE_POLLS: u8 = 2;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<H: OutputPin, L: OutputPin> {
    humidifier: HumidifierDriver<H>,
    indicator: IndicatorLed<L>,
    water_channel: u32,
    climate: &'static ClimateMailbox,
    last_climate_seq: Option<u32>,
    stale_polls: u8,
}

impl<H: OutputPin, L: OutputPin> HardwareAdapter<H, L> {
    pub fn new(humidifier: HumidifierDriver<H>, indicator: IndicatorLed<L>) -> Self {
        Self::with_climate_mailbox(humidifier, indicator, &sensors::CLIMATE_MAILBOX)
    }

    /// Build over a specific climate mailbox instead of the global one.
    pub fn with_climate_mailbox(
        humidifier: HumidifierDriver<H>,
        indicator: IndicatorLed<L>,
        climate: &'static ClimateMailbox,
    ) -> Self {
        Self {
            humidifier,
            indicator,
            water_channel: pins::WATER_ADC_CHANNEL,
            climate,
            last_climate_seq: None,
            stale_polls: 0,
        }
    }

    pub fn humidifier(&self) -> &HumidifierDriver<H> {
        &self.humidifier
    }

    pub fn indicator(&self) -> &IndicatorLed<L> {
        &self.indicator
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<H: OutputPin, L: OutputPin> SensorPort for HardwareAdapter<H, L> {
    fn sample_climate(&mut self) -> Option<RawClimate> {
        let (seq, raw) = self.climate.latest()?;
        if self.last_climate_seq != Some(seq) {
            self.last_climate_seq = Some(seq);
            self.stale_polls = 0;
            return Some(raw);
        }
        self.stale_polls = self.stale_polls.saturating_add(1);
        (self.stale_polls <= MAX_STALE_POLLS).then_some(raw)
    }

    fn read_water_raw(&mut self) -> u16 {
        hw_init::adc1_read(self.water_channel)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<H: OutputPin, L: OutputPin> ActuatorPort for HardwareAdapter<H, L> {
    fn set_humidifier(&mut self, on: bool) {
        self.humidifier.set(on);
    }

    fn set_indicator(&mut self, on: bool) {
        self.indicator.set(on);
    }

    fn all_off(&mut self) {
        self.humidifier.off();
        self.indicator.set(false);
    }
}
