//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A display adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::control::Transition;
use crate::sensors::water_level::PERCENT_UNAVAILABLE;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let water = if t.water_percent == PERCENT_UNAVAILABLE {
                    "n/a"
                } else if t.water_low {
                    "LOW"
                } else {
                    "OK"
                };
                info!(
                    "TELEM | T={:.1}\u{00b0}C H={:.1}% sensor={} | {} {} | band {:.0}..{:.0}%{} | \
                     sw={}/h total={} | water={} ({}%) | window={} | interlocks=0b{:03b}",
                    t.temperature_c,
                    t.humidity_pct,
                    if t.sensor_ok { "OK" } else { "ERR" },
                    if t.running { "ON" } else { "OFF" },
                    if t.manual { "manual" } else { "auto" },
                    t.band.on_below,
                    t.band.off_at,
                    if t.learned { " (learned)" } else { "" },
                    t.switches_this_hour,
                    t.total_switches,
                    water,
                    t.water_percent,
                    if t.window_open { "OPEN" } else { "closed" },
                    t.interlocks,
                );
            }
            AppEvent::Switched { transition, humidity } => match transition {
                Transition::On => info!("SWITCH | on at {:.1}%", humidity),
                Transition::Off => info!("SWITCH | off at {:.1}%", humidity),
                Transition::ForcedOff => warn!("SWITCH | forced off at {:.1}%", humidity),
            },
            AppEvent::InterlockRaised(i) => {
                warn!("INTERLOCK | raised: {}", i);
            }
            AppEvent::InterlockCleared(i) => {
                info!("INTERLOCK | cleared: {}", i);
            }
            AppEvent::HourFlushed { hour, stat } => {
                info!(
                    "STATS | hour {:02}: T={:.0}\u{00b0}C H={}% run={}min sw={}",
                    hour,
                    stat.temperature_c(),
                    stat.avg_hum,
                    stat.run_minutes,
                    stat.switches
                );
            }
            AppEvent::LearnedRangeUpdated(r) => {
                info!("LEARN | band {}..{}%", r.min, r.max);
            }
            AppEvent::SettingsSaved => {
                info!("STORE | settings saved");
            }
            AppEvent::Started { first_run } => {
                info!("START | first_run={}", first_run);
            }
        }
    }
}
