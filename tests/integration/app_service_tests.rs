//! Integration tests for the AppService lifecycle: start-up, commands,
//! persistence, telemetry and shutdown.

use crate::mock_hw::{
    ActuatorCall, ManualClock, MemStore, MockHw, RecordingSink, boot, no_dwell, run_ticks,
    seeded_store,
};

use humidor::app::commands::AppCommand;
use humidor::app::events::AppEvent;
use humidor::control::HumidityBand;
use humidor::store::{NAMESPACE, STATS_NAMESPACE};

// ── Start-up ─────────────────────────────────────────────────

#[test]
fn first_boot_writes_defaults_and_parks_outputs() {
    let mem = MemStore::new();
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let app = boot(&mem, &mut hw, &mut sink);

    assert_eq!(hw.calls.first(), Some(&ActuatorCall::AllOff));
    assert_eq!(sink.events, vec![AppEvent::Started { first_run: true }]);
    assert!(mem.raw(NAMESPACE, "magic").is_some());
    assert_eq!(app.config().min_humidity, 40);
    assert!(!app.store().is_dirty());
}

#[test]
fn second_boot_is_not_first_run() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let _app = boot(&mem, &mut hw, &mut sink);
    assert_eq!(sink.events, vec![AppEvent::Started { first_run: false }]);
}

#[test]
fn disabled_water_sensor_skips_calibration() {
    let mem = seeded_store(|c| c.water_sensor_enabled = false);
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let app = boot(&mem, &mut hw, &mut sink);
    assert!(!app.water().is_present());
}

// ── Commands ─────────────────────────────────────────────────

#[test]
fn changed_thresholds_take_effect_on_the_next_tick() {
    let mem = seeded_store(no_dwell);
    let mut hw = MockHw::new();
    hw.set_humidity(45.0);
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    app.tick(&mut hw, &clock, &mut sink);
    assert!(!hw.humidifier);

    app.handle_command(AppCommand::SetMinHumidity(50), clock.now_ms, &mut hw, &mut sink);
    assert_eq!(app.active_band(), HumidityBand::new(50.0, 60.0));
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    assert!(hw.humidifier);
}

#[test]
fn calibration_offsets_apply_to_readings() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    hw.set_climate(20.0, 50.0);
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    app.handle_command(AppCommand::SetTempCalibration(-1.5), 0, &mut hw, &mut sink);
    app.handle_command(AppCommand::SetHumCalibration(30.0), 0, &mut hw, &mut sink);
    assert!((app.config().hum_calibration - 20.0).abs() < f32::EPSILON, "clamped");

    app.tick(&mut hw, &clock, &mut sink);
    let reading = app.climate().reading();
    assert!((reading.temperature_c - 18.5).abs() < 1e-4);
    assert!((reading.humidity_pct - 70.0).abs() < 1e-4);

    hw.set_climate(20.0, 95.0);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    assert!((app.climate().reading().humidity_pct - 100.0).abs() < f32::EPSILON);
}

#[test]
fn counter_resets() {
    let mem = seeded_store(no_dwell);
    let mut hw = MockHw::new();
    hw.set_humidity(30.0);
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    app.tick(&mut hw, &clock, &mut sink);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 3);
    assert_eq!(app.store().counters().total_switches, 1);
    assert_eq!(app.store().counters().work_time_secs, 6);

    app.handle_command(AppCommand::ResetSwitchCount, clock.now_ms, &mut hw, &mut sink);
    app.handle_command(AppCommand::ResetWorkTime, clock.now_ms, &mut hw, &mut sink);
    assert_eq!(app.store().counters().total_switches, 0);
    assert_eq!(app.store().counters().work_time_secs, 0);
    assert_eq!(app.store().format_work_time().as_str(), "0min");
}

// ── Persistence ──────────────────────────────────────────────

#[test]
fn dirty_settings_autosave_after_interval() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    app.handle_command(AppCommand::SetMaxHumidity(70), 0, &mut hw, &mut sink);
    assert!(app.store().is_dirty());

    clock.advance(299_999);
    app.tick(&mut hw, &clock, &mut sink);
    assert!(app.store().is_dirty());
    assert_eq!(sink.count(|e| *e == AppEvent::SettingsSaved), 0);

    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 1, 1);
    assert!(!app.store().is_dirty());
    assert_eq!(sink.count(|e| *e == AppEvent::SettingsSaved), 1);

    let mut sink = RecordingSink::new();
    let rebooted = boot(&mem, &mut hw, &mut sink);
    assert_eq!(rebooted.config().max_humidity, 70);
}

#[test]
fn clean_store_is_never_autosaved() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 60_000, 10);
    assert_eq!(sink.count(|e| *e == AppEvent::SettingsSaved), 0);
}

#[test]
fn failed_save_keeps_store_dirty() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    app.handle_command(AppCommand::SetHysteresis(8), 0, &mut hw, &mut sink);
    mem.set_fail_writes(true);
    app.handle_command(AppCommand::SaveSettings, 0, &mut hw, &mut sink);
    assert!(app.store().is_dirty());
    assert_eq!(sink.count(|e| *e == AppEvent::SettingsSaved), 0);

    mem.set_fail_writes(false);
    app.handle_command(AppCommand::SaveSettings, 0, &mut hw, &mut sink);
    assert!(!app.store().is_dirty());
}

#[test]
fn factory_reset_restores_defaults_and_clears_history() {
    let mem = seeded_store(|c| {
        no_dwell(c);
        c.min_humidity = 55;
        c.max_humidity = 75;
    });
    let mut hw = MockHw::new();
    hw.set_humidity(30.0);
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    app.tick(&mut hw, &clock, &mut sink);
    clock.hour = 1;
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    assert!(mem.raw(STATS_NAMESPACE, "h0").is_some());
    assert!(hw.humidifier);

    app.handle_command(AppCommand::FactoryReset, clock.now_ms, &mut hw, &mut sink);
    assert!(!hw.humidifier);
    assert_eq!(app.config().min_humidity, 40);
    assert_eq!(app.store().counters().total_switches, 0);
    assert!(app.store().hour_slot(0).is_empty());
    assert!(app.stats().ring().get(0).is_empty());
    assert!(!app.learner().has_learned_data());
    assert!(!app.controller().is_manual_mode());
}

#[test]
fn shutdown_flushes_open_hour_and_pending_settings() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    clock.hour = 9;
    app.tick(&mut hw, &clock, &mut sink);
    app.handle_command(AppCommand::SetLearning(false), 0, &mut hw, &mut sink);
    app.shutdown(clock.now_ms, &mut hw, &mut sink);

    assert_eq!(hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert_eq!(app.store().hour_slot(9).avg_hum, 50);
    assert!(!app.store().is_dirty());
    assert_eq!(sink.count(|e| *e == AppEvent::SettingsSaved), 1);
}

// ── Telemetry ────────────────────────────────────────────────

#[test]
fn telemetry_is_emitted_on_the_configured_interval() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    app.tick(&mut hw, &clock, &mut sink);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 29);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 1);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 2);
}

#[test]
fn telemetry_snapshot_reflects_state() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    hw.set_climate(22.5, 47.0);
    hw.water_raw = 400;
    let mut sink = RecordingSink::new();
    let clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);
    app.tick(&mut hw, &clock, &mut sink);

    let Some(AppEvent::Telemetry(t)) = sink.events.last() else {
        panic!("expected telemetry, got {:?}", sink.events.last());
    };
    assert!((t.temperature_c - 22.5).abs() < f32::EPSILON);
    assert!((t.humidity_pct - 47.0).abs() < f32::EPSILON);
    assert!(t.sensor_ok);
    assert!(!t.running);
    assert!(!t.manual);
    assert!(t.water_present);
    assert!(!t.water_low);
    assert_eq!(t.water_percent, 50);
    assert!(!t.window_open);
    assert_eq!(t.band, HumidityBand::new(40.0, 60.0));
    assert!(!t.learned);
    assert_eq!(t.interlocks, 0);
}
