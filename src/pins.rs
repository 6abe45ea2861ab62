//! GPIO / peripheral pin assignments for the Humidor controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Humidifier relay / MOSFET gate, active HIGH.
pub const HUMIDIFIER_GPIO: i32 = 4;

/// Front-panel indicator LED.
pub const INDICATOR_GPIO: i32 = 2;
/// The indicator on rev-A boards sinks current through the pin.
pub const INDICATOR_ACTIVE_LOW: bool = false;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Single-wire temperature/humidity sensor.  Owned by the external climate
/// driver, listed here to keep the map complete.
pub const CLIMATE_DATA_GPIO: i32 = 15;

/// Resistive reservoir probe, analog.
/// ADC1 channel 6 (GPIO 34 on ESP32).
pub const WATER_ADC_GPIO: i32 = 34;
pub const WATER_ADC_CHANNEL: u32 = 6;
