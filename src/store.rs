//! Typed persistent settings over the raw [`StoragePort`].
//!
//! ## Layout
//!
//! | Namespace | Key        | Contents                                   |
//! |-----------|------------|--------------------------------------------|
//! | `humidor` | `magic`    | 1 byte, [`MAGIC`]                          |
//! | `humidor` | `version`  | 1 byte, [`LAYOUT_VERSION`]                 |
//! | `humidor` | `config`   | postcard [`SystemConfig`]                  |
//! | `humidor` | `counters` | postcard [`Counters`]                      |
//! | `humidor` | `learned`  | 2 bytes, learned min/max (`0,0` = none)    |
//! | `stats`   | `h0`–`h23` | 4 bytes each, one [`HourlyStat`] per hour  |
//!
//! A missing or mismatched magic/version means first run: defaults are
//! written and the hourly ring is cleared.  Values that load but fail
//! their range checks are individually repaired to defaults.
//!
//! Configuration and counters are cached in RAM and written in batches by
//! [`SettingsStore::save`]; the learned range and the hourly slots are
//! written through as they change (at most once per hour).

use core::fmt::Write as _;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::analytics::stats::RING_SLOTS;
use crate::analytics::{HourlyRing, HourlyStat, LearnedRange};
use crate::app::ports::{StorageError, StoragePort};
use crate::config::SystemConfig;
use crate::error::StoreError;

pub const NAMESPACE: &str = "humidor";
pub const STATS_NAMESPACE: &str = "stats";

pub const MAGIC: u8 = 0xAE;
pub const LAYOUT_VERSION: u8 = 1;

const KEY_MAGIC: &str = "magic";
const KEY_VERSION: &str = "version";
const KEY_CONFIG: &str = "config";
const KEY_COUNTERS: &str = "counters";
const KEY_LEARNED: &str = "learned";

const BLOB_BUF: usize = 96;

/// Lifetime counters, persisted alongside the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counters {
    pub work_time_secs: u32,
    pub total_switches: u32,
}

pub struct SettingsStore<S: StoragePort> {
    storage: S,
    config: SystemConfig,
    counters: Counters,
    learned: LearnedRange,
    dirty: bool,
}

impl<S: StoragePort> SettingsStore<S> {
    /// Wrap a backend.  Nothing is read until [`begin`](Self::begin).
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            config: SystemConfig::default(),
            counters: Counters::default(),
            learned: LearnedRange::UNLEARNED,
            dirty: false,
        }
    }

    /// Validate the layout and load everything.  Returns `true` when this
    /// was a first run and defaults were written.
    pub fn begin(&mut self) -> Result<bool, StoreError> {
        let magic = self.read_byte(NAMESPACE, KEY_MAGIC);
        let version = self.read_byte(NAMESPACE, KEY_VERSION);

        if magic != Some(MAGIC) || version != Some(LAYOUT_VERSION) {
            info!(
                "store: first run (magic {:?}, version {:?}), writing defaults",
                magic, version
            );
            self.write_defaults()?;
            return Ok(true);
        }

        self.load_config();
        self.load_counters();
        self.load_learned();
        info!(
            "store: loaded (band {}..{}%, {} switches, {})",
            self.config.min_humidity,
            self.config.max_humidity,
            self.counters.total_switches,
            self.format_work_time()
        );
        Ok(false)
    }

    // ── Configuration ─────────────────────────────────────────────

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Change the configuration in RAM; persisted by the next save.
    pub fn update_config(&mut self, f: impl FnOnce(&mut SystemConfig)) {
        let before = self.config;
        f(&mut self.config);
        if self.config != before {
            self.dirty = true;
        }
    }

    // ── Counters ──────────────────────────────────────────────────

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn add_work_time(&mut self, secs: u32) {
        if secs == 0 {
            return;
        }
        self.counters.work_time_secs = self.counters.work_time_secs.saturating_add(secs);
        self.dirty = true;
    }

    pub fn increment_total_switches(&mut self) {
        self.counters.total_switches = self.counters.total_switches.saturating_add(1);
        self.dirty = true;
    }

    pub fn reset_switch_count(&mut self) {
        info!("store: switch counter reset");
        self.counters.total_switches = 0;
        self.dirty = true;
    }

    pub fn reset_work_time(&mut self) {
        info!("store: work time reset");
        self.counters.work_time_secs = 0;
        self.dirty = true;
    }

    /// Total work time as `"{h}h {m}min"`, or `"{m}min"` under an hour.
    pub fn format_work_time(&self) -> heapless::String<24> {
        format_work_time(self.counters.work_time_secs)
    }

    // ── Learned range ─────────────────────────────────────────────

    pub fn learned_range(&self) -> LearnedRange {
        self.learned
    }

    /// Persist a new learned range immediately.
    pub fn set_learned_range(&mut self, range: LearnedRange) -> Result<(), StoreError> {
        self.storage
            .write(NAMESPACE, KEY_LEARNED, &[range.min, range.max])?;
        self.learned = range;
        Ok(())
    }

    // ── Hourly ring ───────────────────────────────────────────────

    /// One hour slot; a missing or short slot reads as an empty record.
    pub fn hour_slot(&self, hour: u8) -> HourlyStat {
        let mut buf = [0u8; HourlyStat::SIZE];
        match self.storage.read(STATS_NAMESPACE, &slot_key(hour), &mut buf) {
            Ok(HourlyStat::SIZE) => HourlyStat::from_bytes(buf),
            _ => HourlyStat::default(),
        }
    }

    pub fn set_hour_slot(&mut self, hour: u8, stat: HourlyStat) -> Result<(), StoreError> {
        self.storage
            .write(STATS_NAMESPACE, &slot_key(hour), &stat.to_bytes())?;
        Ok(())
    }

    /// All 24 slots.
    pub fn load_ring(&self) -> HourlyRing {
        let mut ring = HourlyRing::new();
        for hour in 0..RING_SLOTS as u8 {
            ring.set(hour, self.hour_slot(hour));
        }
        ring
    }

    pub fn clear_ring(&mut self) -> Result<(), StoreError> {
        for hour in 0..RING_SLOTS as u8 {
            self.storage.delete(STATS_NAMESPACE, &slot_key(hour))?;
        }
        Ok(())
    }

    // ── Persistence ───────────────────────────────────────────────

    /// Unsaved configuration or counter changes pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the configuration and counters.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let cfg = postcard::to_allocvec(&self.config).map_err(|_| StoreError::Encode)?;
        let counters = postcard::to_allocvec(&self.counters).map_err(|_| StoreError::Encode)?;
        self.storage.write(NAMESPACE, KEY_CONFIG, &cfg)?;
        self.storage.write(NAMESPACE, KEY_COUNTERS, &counters)?;
        self.dirty = false;
        info!("store: settings saved");
        Ok(())
    }

    /// Erase everything and start over with defaults.
    pub fn factory_reset(&mut self) -> Result<(), StoreError> {
        warn!("store: FACTORY RESET");
        for key in [KEY_MAGIC, KEY_VERSION, KEY_CONFIG, KEY_COUNTERS, KEY_LEARNED] {
            self.storage.delete(NAMESPACE, key)?;
        }
        self.write_defaults()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    // ── Internal ──────────────────────────────────────────────────

    fn write_defaults(&mut self) -> Result<(), StoreError> {
        self.config = SystemConfig::default();
        self.counters = Counters::default();
        self.clear_ring()?;
        self.set_learned_range(LearnedRange::UNLEARNED)?;
        self.save()?;
        self.storage.write(NAMESPACE, KEY_MAGIC, &[MAGIC])?;
        self.storage.write(NAMESPACE, KEY_VERSION, &[LAYOUT_VERSION])?;
        Ok(())
    }

    fn read_byte(&self, namespace: &str, key: &str) -> Option<u8> {
        let mut b = [0u8; 1];
        match self.storage.read(namespace, key, &mut b) {
            Ok(1) => Some(b[0]),
            _ => None,
        }
    }

    fn read_blob<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<T, StoreError> {
        let mut buf = [0u8; BLOB_BUF];
        let len = self.storage.read(NAMESPACE, key, &mut buf)?;
        postcard::from_bytes(&buf[..len]).map_err(|_| StoreError::Corrupted)
    }

    fn load_config(&mut self) {
        let stored = match self.read_blob::<SystemConfig>(KEY_CONFIG) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("store: config unreadable ({e}), using defaults");
                self.dirty = true;
                SystemConfig::default()
            }
        };
        let (cfg, repaired) = stored.repaired();
        if repaired > 0 {
            self.dirty = true;
        }
        self.config = cfg;
    }

    fn load_counters(&mut self) {
        self.counters = match self.read_blob::<Counters>(KEY_COUNTERS) {
            Ok(c) => c,
            Err(StoreError::Storage(StorageError::NotFound)) => Counters::default(),
            Err(e) => {
                warn!("store: counters unreadable ({e}), reset");
                self.dirty = true;
                Counters::default()
            }
        };
    }

    fn load_learned(&mut self) {
        let mut b = [0u8; 2];
        let stored = match self.storage.read(NAMESPACE, KEY_LEARNED, &mut b) {
            Ok(2) => LearnedRange { min: b[0], max: b[1] },
            _ => LearnedRange::UNLEARNED,
        };
        self.learned = stored.validated();
        if self.learned != stored {
            warn!("store: learned range {}..{} invalid, discarded", stored.min, stored.max);
        }
    }
}

/// `"{h}h {m}min"`, or `"{m}min"` under an hour.
pub fn format_work_time(secs: u32) -> heapless::String<24> {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let mut s = heapless::String::new();
    let _ = if hours > 0 {
        write!(s, "{hours}h {minutes}min")
    } else {
        write!(s, "{minutes}min")
    };
    s
}

fn slot_key(hour: u8) -> heapless::String<8> {
    let mut s = heapless::String::new();
    let _ = write!(s, "h{}", usize::from(hour) % RING_SLOTS);
    s
}
