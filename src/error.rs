//! Unified error types for the Humidor firmware.
//!
//! The control path itself never fails outward: sensor dropouts, a missing
//! reservoir probe and corrupted settings are all handled locally.  The
//! types here cover the boundaries (storage, codec, bootstrap) plus the
//! interlock bitmask shared by the safety supervisor and the telemetry.

use core::fmt;

use crate::app::ports::StorageError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible boundary operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The settings store failed.
    Store(StoreError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The driver produced no sample (timeout or checksum failure).
    NoSample,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSample => write!(f, "no sample"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors from the typed [`SettingsStore`](crate::store::SettingsStore)
/// layer on top of the raw key-value port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The key-value backend reported an error.
    Storage(StorageError),
    /// A stored blob failed to decode.
    Corrupted,
    /// A value could not be encoded.
    Encode,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "backend: {e}"),
            Self::Corrupted => write!(f, "stored value corrupted"),
            Self::Encode => write!(f, "encode failed"),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Store(StoreError::Storage(e))
    }
}

// ---------------------------------------------------------------------------
// Interlocks
// ---------------------------------------------------------------------------

/// Conditions that force the humidifier off without counting a switch.
/// Accumulated in a bitfield by the safety supervisor so that several
/// simultaneous interlocks can be tracked and individually cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Interlock {
    /// Climate sensor reading is invalid.
    SensorFailure = 0b0000_0001,
    /// Reservoir level below threshold.
    WaterLow = 0b0000_0010,
    /// Sustained temperature drop, window assumed open.
    WindowOpen = 0b0000_0100,
}

impl Interlock {
    /// Return the bitmask for this interlock.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Interlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorFailure => write!(f, "sensor failure"),
            Self::WaterLow => write!(f, "water level low"),
            Self::WindowOpen => write!(f, "window open"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
