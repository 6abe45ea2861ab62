//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the device if the control loop
//! stalls.  The humidifier relay holds its last level through a hang, so a
//! stalled loop must not be allowed to keep it energised.
//!
//! The main loop must call `feed()` on every control tick iteration.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

/// Default timeout; several control ticks.
pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;

pub struct Watchdog {
    timeout_ms: u32,
    subscribed: bool,
    feeds: u64,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

impl Watchdog {
    /// Initialise and subscribe the current task to the TWDT.
    pub fn new(timeout_ms: u32) -> Self {
        let subscribed = Self::subscribe(timeout_ms);
        if subscribed {
            info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", timeout_ms);
        } else {
            warn!("Watchdog: not subscribed, loop stalls will go undetected");
        }
        Self { timeout_ms, subscribed, feeds: 0 }
    }

    #[cfg(target_os = "espidf")]
    fn subscribe(timeout_ms: u32) -> bool {
        // SAFETY: TWDT calls from the main task during bootstrap only.
        unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK as i32 {
                warn!("TWDT reconfigure returned {} (may already be configured)", ret);
            }
            esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK as i32
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn subscribe(_timeout_ms: u32) -> bool {
        true
    }

    /// Feed the watchdog.  Must be called at least once per timeout.
    pub fn feed(&mut self) {
        if !self.subscribed {
            return;
        }
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: the calling task subscribed in `new`.
            unsafe {
                esp_task_wdt_reset();
            }
        }
        self.feeds += 1;
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn feed_count(&self) -> u64 {
        self.feeds
    }
}
