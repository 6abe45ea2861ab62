//! End-to-end control scenarios: scripted sensors in, actuator calls and
//! events out, with the real store, controller and supervisor in between.

use crate::mock_hw::{ManualClock, MockHw, RecordingSink, boot, no_dwell, run_ticks, seeded_store};

use humidor::analytics::{HourlyStat, LearnedRange};
use humidor::app::commands::AppCommand;
use humidor::app::events::AppEvent;
use humidor::app::service::AppService;
use humidor::control::{HumidityBand, Transition};
use humidor::error::Interlock;
use humidor::time::HOUR_MS;

// ── Humidity band ────────────────────────────────────────────

#[test]
fn low_humidity_sequence_starts_once_and_keeps_running() {
    let mem = seeded_store(no_dwell);
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    for hum in [38.0, 38.0, 39.0] {
        hw.set_humidity(hum);
        app.tick(&mut hw, &clock, &mut sink);
        assert!(hw.humidifier, "humidifier must be on at {hum}%");
        clock.advance(2_000);
    }

    assert_eq!(sink.transitions(), vec![Transition::On]);
    assert_eq!(app.store().counters().total_switches, 1);
}

#[test]
fn reaching_upper_threshold_stops_the_humidifier() {
    let mem = seeded_store(no_dwell);
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    hw.set_humidity(35.0);
    app.tick(&mut hw, &clock, &mut sink);
    assert!(hw.humidifier);

    hw.set_humidity(50.0);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    assert!(hw.humidifier, "inside the band nothing changes");

    hw.set_humidity(60.0);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    assert!(!hw.humidifier);
    assert_eq!(sink.transitions(), vec![Transition::On, Transition::Off]);
}

#[test]
fn first_start_after_boot_waits_out_the_pause() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    hw.set_humidity(30.0);
    app.tick(&mut hw, &clock, &mut sink);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 29);
    assert_eq!(clock.now_ms, 58_000);
    assert!(!hw.humidifier);

    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    assert!(hw.humidifier, "default 60 s pause elapsed");
}

#[test]
fn switch_ceiling_holds_off_until_the_hour_rolls_over() {
    let mem = seeded_store(|c| {
        no_dwell(c);
        c.max_switches_per_hour = 2;
    });
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    for hum in [30.0, 70.0, 30.0, 70.0, 30.0, 70.0, 30.0] {
        hw.set_humidity(hum);
        run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    }
    let starts = sink.transitions().iter().filter(|t| **t == Transition::On).count();
    assert_eq!(starts, 2);
    assert!(!hw.humidifier, "ceiling reached, humidifier held off");

    clock.advance(HOUR_MS);
    app.tick(&mut hw, &clock, &mut sink);
    assert!(hw.humidifier, "new hourly window allows a start");
    assert_eq!(app.controller().switch_count(), 1);
}

// ── Reservoir ────────────────────────────────────────────────

#[test]
fn water_low_latches_only_after_three_consecutive_low_reads() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    hw.water_raw = 300;
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);
    assert!(app.water().is_present());

    let expected = [false, false, false, false, true];
    for (i, (raw, low)) in [300, 300, 150, 150, 150].into_iter().zip(expected).enumerate() {
        hw.water_raw = raw;
        app.tick(&mut hw, &clock, &mut sink);
        assert_eq!(app.water().is_low(), low, "after sample {}", i + 1);
        clock.advance(1_000);
    }
    assert_eq!(
        sink.count(|e| *e == AppEvent::InterlockRaised(Interlock::WaterLow)),
        1
    );
}

#[test]
fn water_low_forces_off_and_refill_resumes() {
    let mem = seeded_store(no_dwell);
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    hw.set_humidity(30.0);
    app.tick(&mut hw, &clock, &mut sink);
    assert!(hw.humidifier);

    hw.water_raw = 100;
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 1_000, 3);
    assert!(!hw.humidifier);
    assert_eq!(app.interlocks(), Interlock::WaterLow.mask());
    assert_eq!(sink.transitions(), vec![Transition::On, Transition::ForcedOff]);
    assert_eq!(app.store().counters().total_switches, 1, "forced stop is not a switch");

    hw.water_raw = 600;
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 1_000, 3);
    assert_eq!(app.interlocks(), 0);
    assert!(hw.humidifier);
    assert_eq!(
        sink.count(|e| *e == AppEvent::InterlockCleared(Interlock::WaterLow)),
        1
    );
}

#[test]
fn water_low_overrides_manual_mode() {
    let mem = seeded_store(no_dwell);
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    hw.set_humidity(70.0);
    app.handle_command(AppCommand::ToggleManual, 0, &mut hw, &mut sink);
    assert!(hw.humidifier);

    hw.water_raw = 100;
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 1_000, 3);
    assert!(!hw.humidifier);
    assert!(app.controller().is_manual_mode());
}

#[test]
fn missing_probe_never_blocks() {
    let mem = seeded_store(no_dwell);
    let mut hw = MockHw::new();
    hw.water_raw = 0;
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);
    assert!(!app.water().is_present());

    hw.set_humidity(30.0);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 1_000, 5);
    assert!(hw.humidifier);
    assert_eq!(app.build_telemetry().water_percent, 255);
}

// ── Window ───────────────────────────────────────────────────

#[test]
fn open_window_blocks_until_temperature_recovers() {
    let mem = seeded_store(no_dwell);
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    hw.set_climate(22.0, 30.0);
    app.tick(&mut hw, &clock, &mut sink);
    assert!(hw.humidifier);

    hw.set_temperature(19.0);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 30_000, 2);
    assert!(!app.window().is_open(), "two drop samples are not enough");
    assert!(hw.humidifier);

    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 30_000, 1);
    assert!(app.window().is_open());
    assert!(!hw.humidifier);
    assert_eq!(
        sink.count(|e| *e == AppEvent::InterlockRaised(Interlock::WindowOpen)),
        1
    );

    hw.set_temperature(22.0);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 30_000, 1);
    assert!(!app.window().is_open());
    assert!(hw.humidifier);
}

#[test]
fn disabled_window_detector_never_blocks() {
    let mem = seeded_store(|c| {
        no_dwell(c);
        c.window_detector_enabled = false;
    });
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    hw.set_climate(22.0, 30.0);
    app.tick(&mut hw, &clock, &mut sink);
    hw.set_temperature(15.0);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 30_000, 4);
    assert!(hw.humidifier);
    assert_eq!(app.interlocks(), 0);
}

// ── Climate sensor ───────────────────────────────────────────

#[test]
fn sensor_failure_forces_off_without_counting() {
    let mem = seeded_store(no_dwell);
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    hw.set_humidity(30.0);
    app.tick(&mut hw, &clock, &mut sink);
    assert!(hw.humidifier);

    hw.fail_climate();
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    assert!(!hw.humidifier);
    assert_eq!(sink.transitions(), vec![Transition::On, Transition::ForcedOff]);
    assert!(app.interlocks() & Interlock::SensorFailure.mask() != 0);
    assert_eq!(app.controller().switch_count(), 1);
}

#[test]
fn critical_sensor_blinks_indicator_until_recovery() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    hw.fail_climate();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    app.tick(&mut hw, &clock, &mut sink);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 3);
    assert!(!app.climate().is_critical());
    assert!(!hw.indicator);

    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    assert!(app.climate().is_critical());
    assert!(hw.indicator);

    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 250, 1);
    assert!(!hw.indicator);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 250, 1);
    assert!(hw.indicator);

    hw.set_climate(21.0, 50.0);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    assert!(!app.climate().is_critical());
    assert!(!hw.indicator);
}

// ── Statistics and learning ──────────────────────────────────

#[test]
fn full_day_of_history_produces_learned_band() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    hw.set_climate(21.0, 55.0);
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    for hour in 0..=24u8 {
        clock.hour = hour % 24;
        run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    }

    assert_eq!(sink.count(|e| matches!(e, AppEvent::HourFlushed { .. })), 24);
    let learned = LearnedRange { min: 45, max: 65 };
    assert_eq!(
        sink.count(|e| *e == AppEvent::LearnedRangeUpdated(learned)),
        1,
        "band computed once, after the 24th hour"
    );
    assert_eq!(app.active_band(), HumidityBand::new(45.0, 65.0));
    assert!(app.build_telemetry().learned);
    assert_eq!(app.store().learned_range(), learned);

    let expected = HourlyStat { avg_temp: 71, avg_hum: 55, run_minutes: 0, switches: 0 };
    assert_eq!(app.store().hour_slot(5), expected);
}

#[test]
fn history_and_learned_band_survive_reboot() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    hw.set_climate(21.0, 55.0);
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);
    for hour in 0..=24u8 {
        clock.hour = hour % 24;
        run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    }
    drop(app);

    let app = boot(&mem, &mut hw, &mut sink);
    assert!(app.learner().has_learned_data());
    assert_eq!(app.stats().ring().get(7).avg_hum, 55);
    assert_eq!(app.hour_stats(&clock, 1).avg_hum, 55);
}

#[test]
fn disabling_learning_restores_configured_band() {
    let mem = seeded_store(|_| {});
    let mut hw = MockHw::new();
    hw.set_climate(21.0, 55.0);
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);
    for hour in 0..=24u8 {
        clock.hour = hour % 24;
        run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    }
    assert!(app.uses_learned_band());

    app.handle_command(AppCommand::SetLearning(false), clock.now_ms, &mut hw, &mut sink);
    assert!(!app.uses_learned_band());
    assert_eq!(app.active_band(), HumidityBand::new(40.0, 60.0));
}

#[test]
fn run_time_is_credited_in_whole_seconds() {
    let mem = seeded_store(no_dwell);
    let mut hw = MockHw::new();
    hw.set_humidity(30.0);
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::new();
    let mut app = boot(&mem, &mut hw, &mut sink);

    app.tick(&mut hw, &clock, &mut sink);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 5);
    assert_eq!(app.store().counters().work_time_secs, 10);

    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 250, 3);
    assert_eq!(app.store().counters().work_time_secs, 10, "750 ms still pending");
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 250, 1);
    assert_eq!(app.store().counters().work_time_secs, 11);
}

#[test]
fn timers_survive_millisecond_wraparound() {
    let mem = seeded_store(no_dwell);
    let mut hw = MockHw::new();
    let mut sink = RecordingSink::new();
    let mut clock = ManualClock::at(u32::MAX - 1_000);
    let mut app = AppService::new(mem.clone(), clock.now_ms).unwrap();
    app.start(&mut hw, &mut sink);

    hw.set_humidity(30.0);
    app.tick(&mut hw, &clock, &mut sink);
    assert!(hw.humidifier);

    hw.set_humidity(65.0);
    run_ticks(&mut app, &mut hw, &mut clock, &mut sink, 2_000, 1);
    assert!(clock.now_ms < 2_000, "clock wrapped");
    assert!(!hw.humidifier);
}
