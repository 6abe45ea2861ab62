//! Output drivers, hardware initialisation, and the task watchdog.

pub mod humidifier;
pub mod hw_init;
pub mod indicator;
pub mod watchdog;
