//! Environmental analytics: open-window detection, hourly history and
//! learned humidity targets.
//!
//! None of these components touch hardware or storage.  Timestamps and
//! hour-of-day are passed in; records that need persisting are returned to
//! the caller.

pub mod learning;
pub mod stats;
pub mod window;

pub use learning::{AdaptiveLearner, LearnedRange};
pub use stats::{HourlyRing, HourlyStat, HourlyStatsRecorder};
pub use window::WindowDetector;
