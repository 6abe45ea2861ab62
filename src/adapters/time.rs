//! ESP32 time adapter.
//!
//! Provides monotonic time and hour-of-day queries.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`** — uses `std::time::Instant` for
//!   host-side testing and simulation.
//!
//! Without a synced wall clock the hour-of-day is derived from uptime, so
//! the hourly ring stays consistent but hour 0 is the boot hour.

use crate::app::ports::ClockPort;
use crate::time;

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    pub fn uptime_ms(&self) -> u64 {
        self.uptime_us() / 1000
    }

    /// Current hour-of-day (0–23) from the system clock.  `None` if the wall
    /// clock is not synced.
    #[cfg(target_os = "espidf")]
    pub fn wall_clock_hour(&self) -> Option<u8> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        // Reject obviously unsynced time (e.g. before 2020-01-01)
        const EPOCH_2020: i64 = 1_577_836_800;
        if (tv.tv_sec as i64) < EPOCH_2020 {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        u8::try_from(tm.tm_hour).ok().filter(|h| *h < 24)
    }

    /// Current hour-of-day.  On non-ESP targets (simulation) always `None`.
    #[cfg(not(target_os = "espidf"))]
    pub fn wall_clock_hour(&self) -> Option<u8> {
        None
    }
}

impl ClockPort for Esp32TimeAdapter {
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap the whole firmware is written against.
        self.uptime_ms() as u32
    }

    fn hour_of_day(&self) -> u8 {
        self.wall_clock_hour()
            .unwrap_or_else(|| time::hour_of_uptime(self.uptime_ms()))
    }
}
