//! Application service — the hexagonal core.
//!
//! [`AppService`] owns every domain component and the settings store.
//! It exposes a clean, hardware-agnostic API.  All I/O flows through
//! port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!   ClockPort ──▶ │          AppService           │
//! ActuatorPort ◀──│ Safety · Hysteresis · Stats   │ ◀─▶ StoragePort
//!                 └──────────────────────────────┘
//! ```

use log::{info, warn};

use crate::analytics::{AdaptiveLearner, HourlyStat, HourlyStatsRecorder, WindowDetector};
use crate::config::SystemConfig;
use crate::control::{DwellLimits, ErrorBlinker, HumidityBand, HysteresisController, Transition};
use crate::error::{Interlock, StoreError};
use crate::safety::{InterlockInputs, SafetySupervisor, interlocks_in};
use crate::sensors::climate::ClimateSensor;
use crate::sensors::water_level::WaterLevelMonitor;
use crate::store::SettingsStore;
use crate::time;

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, ClockPort, EventSink, SensorPort, StoragePort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<S: StoragePort> {
    store: SettingsStore<S>,
    first_run: bool,

    climate: ClimateSensor,
    water: WaterLevelMonitor,
    window: WindowDetector,
    stats: HourlyStatsRecorder,
    learner: AdaptiveLearner,
    controller: HysteresisController,
    safety: SafetySupervisor,
    blinker: ErrorBlinker,
    blinking: bool,

    last_tick_ms: Option<u32>,
    last_sample_ms: Option<u32>,
    last_save_ms: u32,
    last_telemetry_ms: Option<u32>,
    /// Running time not yet credited to the work-time counter.
    work_ms_pending: u32,
    tick_count: u64,
}

impl<S: StoragePort> AppService<S> {
    /// Open the store and build every component from the loaded settings.
    ///
    /// Does **not** touch hardware — call [`start`](Self::start) next.
    pub fn new(storage: S, now_ms: u32) -> Result<Self, StoreError> {
        let mut store = SettingsStore::new(storage);
        let first_run = store.begin()?;
        let cfg = *store.config();

        let mut stats = HourlyStatsRecorder::new(cfg.sample_interval_ms);
        stats.load_ring(store.load_ring());
        let mut learner = AdaptiveLearner::new(cfg.learning_enabled);
        learner.load(store.learned_range());

        Ok(Self {
            climate: ClimateSensor::new(),
            water: WaterLevelMonitor::new(cfg.water_threshold),
            window: WindowDetector::new(),
            stats,
            learner,
            controller: HysteresisController::new(DwellLimits::from(&cfg), now_ms),
            safety: SafetySupervisor::new(),
            blinker: ErrorBlinker::new(),
            blinking: false,
            last_tick_ms: None,
            last_sample_ms: None,
            last_save_ms: now_ms,
            last_telemetry_ms: None,
            work_ms_pending: 0,
            tick_count: 0,
            store,
            first_run,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Park the outputs, calibrate the reservoir probe and announce start.
    pub fn start(&mut self, hw: &mut (impl SensorPort + ActuatorPort), sink: &mut impl EventSink) {
        hw.all_off();
        if self.store.config().water_sensor_enabled {
            self.water.begin(hw);
        } else {
            self.water.disable();
        }
        sink.emit(&AppEvent::Started { first_run: self.first_run });
        info!(
            "AppService started (first_run={}, learned={})",
            self.first_run,
            self.learner.has_learned_data()
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle:
    /// climate → water → window → stats → safety → control → outputs →
    /// work time → autosave → telemetry.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`] — this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        let now = clock.now_ms();
        let hour = clock.hour_of_day();
        let cfg = *self.store.config();
        let was_running = self.controller.is_running();
        self.tick_count += 1;

        // 1. Climate sample
        let reading = self
            .climate
            .update(now, hw, cfg.temp_calibration, cfg.hum_calibration);
        let sensor_ok = self.climate.is_ok();

        // 2. Reservoir
        let water_ok = self.water.check(now, hw);

        // 3. Window (only fed with trusted temperatures)
        let window_open = if !cfg.window_detector_enabled {
            false
        } else if sensor_ok {
            self.window.update(now, reading.temperature_c)
        } else {
            self.window.is_open()
        };

        // 4. Hourly statistics
        if sensor_ok && time::due(now, self.last_sample_ms, cfg.sample_interval_ms) {
            self.last_sample_ms = Some(now);
            if let Some((flushed_hour, stat)) =
                self.stats
                    .add_sample(now, hour, reading.temperature_c, reading.humidity_pct, was_running)
            {
                self.persist_hour(flushed_hour, stat, sink);
                self.run_learning(sink);
            }
        }

        // 5. Safety evaluation
        let edges = self.safety.evaluate(&InterlockInputs {
            sensor_ok,
            water_ok,
            window_open,
        });
        for i in interlocks_in(edges.raised) {
            sink.emit(&AppEvent::InterlockRaised(i));
        }
        for i in interlocks_in(edges.cleared) {
            sink.emit(&AppEvent::InterlockCleared(i));
        }

        // 6. Control; reservoir and window interlocks override manual mode
        let blocked = self.safety.has_interlock(Interlock::WaterLow)
            || self.safety.has_interlock(Interlock::WindowOpen);
        let band = self.active_band();
        let transition = if blocked {
            self.controller.turn_off_direct(now)
        } else {
            self.controller.control(now, reading.humidity_pct, band, sensor_ok)
        };
        if let Some(t) = transition {
            self.apply_transition(t, reading.humidity_pct, hw, sink);
        }

        // 7. Error indicator
        self.drive_indicator(now, hw);

        // 8. Work time
        if let (Some(prev), true) = (self.last_tick_ms, was_running) {
            self.credit_work_time(time::elapsed_ms(now, prev));
        }
        self.last_tick_ms = Some(now);

        // 9. Autosave
        if self.store.is_dirty()
            && time::interval_elapsed(now, self.last_save_ms, cfg.autosave_interval_ms)
        {
            self.save(now, sink);
        }

        // 10. Telemetry
        if time::due(now, self.last_telemetry_ms, cfg.telemetry_interval_ms) {
            self.last_telemetry_ms = Some(now);
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (menu, serial console).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u32,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::ToggleManual => {
                if let Some(t) = self.controller.toggle(now_ms) {
                    let hum = self.climate.reading().humidity_pct;
                    self.apply_transition(t, hum, hw, sink);
                }
            }
            AppCommand::ExitManual => self.controller.exit_manual_mode(),
            AppCommand::SetMinHumidity(v) => self.store.update_config(|c| c.set_min_humidity(v)),
            AppCommand::SetMaxHumidity(v) => self.store.update_config(|c| c.set_max_humidity(v)),
            AppCommand::SetHysteresis(v) => self.store.update_config(|c| c.set_hysteresis(v)),
            AppCommand::SetTempCalibration(v) => {
                self.store.update_config(|c| c.set_temp_calibration(v));
            }
            AppCommand::SetHumCalibration(v) => {
                self.store.update_config(|c| c.set_hum_calibration(v));
            }
            AppCommand::SetWaterThreshold(v) => {
                self.store.update_config(|c| c.set_water_threshold(v));
            }
            AppCommand::SetLearning(on) => {
                self.store.update_config(|c| c.learning_enabled = on);
                info!("learning {}", if on { "enabled" } else { "disabled" });
            }
            AppCommand::ResetSwitchCount => self.store.reset_switch_count(),
            AppCommand::ResetWorkTime => {
                self.work_ms_pending = 0;
                self.store.reset_work_time();
            }
            AppCommand::FactoryReset => self.factory_reset(now_ms, hw, sink),
            AppCommand::SaveSettings => self.save(now_ms, sink),
        }
        self.sync_config();
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current state.
    pub fn build_telemetry(&self) -> TelemetryData {
        let reading = self.climate.reading();
        let counters = self.store.counters();
        TelemetryData {
            temperature_c: reading.temperature_c,
            humidity_pct: reading.humidity_pct,
            sensor_ok: self.climate.is_ok(),
            running: self.controller.is_running(),
            manual: self.controller.is_manual_mode(),
            switches_this_hour: self.controller.switch_count(),
            total_switches: counters.total_switches,
            work_time_secs: counters.work_time_secs,
            water_low: self.water.is_low(),
            water_percent: self.water.percent(),
            water_present: self.water.is_present(),
            window_open: self.window.is_open(),
            band: self.active_band(),
            learned: self.uses_learned_band(),
            interlocks: self.safety.active(),
        }
    }

    /// Band regulated into: the learned one when learning is enabled and
    /// has produced a result, the configured one otherwise.
    pub fn active_band(&self) -> HumidityBand {
        match self.learner.band() {
            Some(band) if self.store.config().learning_enabled => band,
            _ => HumidityBand::from_config(self.store.config()),
        }
    }

    pub fn uses_learned_band(&self) -> bool {
        self.store.config().learning_enabled && self.learner.has_learned_data()
    }

    /// Record from `hours_ago` hours before the clock's current hour.
    pub fn hour_stats(&self, clock: &impl ClockPort, hours_ago: u8) -> HourlyStat {
        self.stats.hour_stats(clock.hour_of_day(), hours_ago)
    }

    pub fn config(&self) -> &SystemConfig {
        self.store.config()
    }

    pub fn store(&self) -> &SettingsStore<S> {
        &self.store
    }

    pub fn controller(&self) -> &HysteresisController {
        &self.controller
    }

    pub fn climate(&self) -> &ClimateSensor {
        &self.climate
    }

    pub fn water(&self) -> &WaterLevelMonitor {
        &self.water
    }

    pub fn window(&self) -> &WindowDetector {
        &self.window
    }

    pub fn learner(&self) -> &AdaptiveLearner {
        &self.learner
    }

    pub fn stats(&self) -> &HourlyStatsRecorder {
        &self.stats
    }

    /// Active interlock bitmask (0 = none).
    pub fn interlocks(&self) -> u8 {
        self.safety.active()
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Flush the open hour and any pending settings before a planned
    /// restart.
    pub fn shutdown(&mut self, now_ms: u32, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        hw.all_off();
        if let Some((hour, stat)) = self.stats.save_hourly_stats() {
            self.persist_hour(hour, stat, sink);
        }
        if self.store.is_dirty() {
            self.save(now_ms, sink);
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_transition(
        &mut self,
        transition: Transition,
        humidity: f32,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        hw.set_humidifier(self.controller.is_running());
        if transition == Transition::On {
            self.stats.increment_switches();
            self.store.increment_total_switches();
        }
        sink.emit(&AppEvent::Switched { transition, humidity });
    }

    fn drive_indicator(&mut self, now: u32, hw: &mut impl ActuatorPort) {
        if self.climate.is_critical() {
            self.blinking = true;
            if let Some(level) = self.blinker.tick(now) {
                hw.set_indicator(level);
            }
        } else if self.blinking {
            self.blinking = false;
            self.blinker.reset();
            hw.set_indicator(false);
        }
    }

    fn credit_work_time(&mut self, ms: u32) {
        self.work_ms_pending = self.work_ms_pending.saturating_add(ms);
        let secs = self.work_ms_pending / 1000;
        if secs > 0 {
            self.work_ms_pending %= 1000;
            self.store.add_work_time(secs);
        }
    }

    fn persist_hour(&mut self, hour: u8, stat: HourlyStat, sink: &mut impl EventSink) {
        if let Err(e) = self.store.set_hour_slot(hour, stat) {
            warn!("stats: hour {hour} not persisted: {e}");
        }
        sink.emit(&AppEvent::HourFlushed { hour, stat });
    }

    fn run_learning(&mut self, sink: &mut impl EventSink) {
        let Some(range) = self.learner.update(self.stats.ring()) else {
            return;
        };
        if let Err(e) = self.store.set_learned_range(range) {
            warn!("learning: range not persisted: {e}");
        }
        sink.emit(&AppEvent::LearnedRangeUpdated(range));
    }

    fn save(&mut self, now: u32, sink: &mut impl EventSink) {
        self.last_save_ms = now;
        match self.store.save() {
            Ok(()) => sink.emit(&AppEvent::SettingsSaved),
            Err(e) => warn!("settings save failed: {e}"),
        }
    }

    fn factory_reset(&mut self, now: u32, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        if let Some(t) = self.controller.turn_off_direct(now) {
            let hum = self.climate.reading().humidity_pct;
            self.apply_transition(t, hum, hw, sink);
        }
        self.controller.exit_manual_mode();
        if let Err(e) = self.store.factory_reset() {
            warn!("factory reset incomplete: {e}");
        }
        self.stats.clear();
        self.learner.clear();
        self.window.reset();
        self.climate.reset_errors();
        self.work_ms_pending = 0;
        self.last_save_ms = now;
    }

    /// Push the (possibly changed) configuration into the components
    /// that cache parts of it.
    fn sync_config(&mut self) {
        let cfg = *self.store.config();
        self.controller.set_limits(DwellLimits::from(&cfg));
        self.water.set_threshold(cfg.water_threshold);
        self.stats.set_sample_interval(cfg.sample_interval_ms);
        self.learner.set_enabled(cfg.learning_enabled);
    }
}
