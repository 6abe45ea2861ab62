//! Millisecond timestamp helpers.
//!
//! Every timestamp in the firmware is a `u32` millisecond count since boot,
//! which wraps after ~49.7 days.  Elapsed time is always computed with
//! wrapping subtraction and never by comparing absolute timestamps, so
//! every interval guard keeps working across the wrap.

/// Milliseconds in one hour.
pub const HOUR_MS: u32 = 3_600_000;

/// Milliseconds elapsed from `since` to `now`, correct across wraparound.
#[inline]
pub const fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// True once at least `interval` ms have passed since `since`.
#[inline]
pub const fn interval_elapsed(now: u32, since: u32, interval: u32) -> bool {
    elapsed_ms(now, since) >= interval
}

/// Rate-limit guard for an optional "last run" stamp.
///
/// A guard that has never fired is always due.
#[inline]
pub fn due(now: u32, last: Option<u32>, interval: u32) -> bool {
    last.is_none_or(|t| interval_elapsed(now, t, interval))
}

/// Hour-of-day derived from a 64-bit uptime in milliseconds.
///
/// Used when no wall clock is available: hour 0 is the hour the device
/// booted in, not midnight.
#[inline]
pub const fn hour_of_uptime(uptime_ms: u64) -> u8 {
    ((uptime_ms / HOUR_MS as u64) % 24) as u8
}
