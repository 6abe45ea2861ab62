//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (front-panel
//! menu, serial console) that the [`AppService`](super::service::AppService)
//! interprets and acts upon.  Setting values are clamped to their valid
//! ranges, never rejected.

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Flip the humidifier by hand and enter manual mode.
    ToggleManual,

    /// Leave manual mode; automatic control resumes on the next tick.
    ExitManual,

    SetMinHumidity(u8),
    SetMaxHumidity(u8),
    SetHysteresis(u8),
    SetTempCalibration(f32),
    SetHumCalibration(f32),
    SetWaterThreshold(u16),

    /// Enable or disable adaptive target learning.
    SetLearning(bool),

    /// Zero the lifetime switch counter.
    ResetSwitchCount,

    /// Zero the lifetime work-time counter.
    ResetWorkTime,

    /// Erase every stored setting, counter and hourly record.
    FactoryReset,

    /// Persist pending setting changes now instead of at the next autosave.
    SaveSettings,
}
