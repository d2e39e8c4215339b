// Control loop scenarios driven through the public API with host test doubles.

use embedded_graphics::prelude::*;

use litter_gauge::activity::ActivityStep;
use litter_gauge::config::DeviceConfig;
use litter_gauge::device::Device;
use litter_gauge::events::{Button, ButtonEvent, PowerState, WakeCause, WakeLevel};
use litter_gauge::gauge::gauge_band;
use litter_gauge::panel::{EgPanel, FrameBuffer, Panel};
use litter_gauge::scale::{FixedSensor, Hx711Scale, ScaleSensor};
use litter_gauge::testing::{
    draws_header, last_arc_sweep, DrawCall, ManualClock, MockPower, MockSpeaker, RecordingPanel,
    ScriptedAdc, ScriptedInput,
};

const T: u64 = 10_000;
const SLEEP_MS: u64 = 60_000;

fn device_with<S: ScaleSensor>(
    sensor: S,
    clock: &ManualClock,
) -> Device<S, RecordingPanel, MockPower, MockSpeaker, ScriptedInput, ManualClock> {
    Device::new(
        DeviceConfig::default(),
        sensor,
        RecordingPanel::new(200, 200),
        MockPower::new(72).with_clock(clock.clone(), SLEEP_MS),
        MockSpeaker::default(),
        ScriptedInput::default(),
        clock.clone(),
    )
}

#[test]
fn one_kilogram_shows_a_small_arc_and_labels() {
    let clock = ManualClock::new(T);
    let mut dev = device_with(FixedSensor::new(1000.0), &clock);
    dev.boot();
    dev.panel_mut().take_calls();

    let report = dev.tick();
    assert_eq!(report.sample.volume_litres, 0.78);
    assert!(report.redrawn);

    let calls = dev.panel_mut().take_calls();
    let sweep = last_arc_sweep(&calls).unwrap();
    assert!((sweep - 15.6).abs() < 0.05, "sweep = {}", sweep);
    assert!(calls.contains(&DrawCall::Text("4.3%".to_string())));
    assert!(calls.contains(&DrawCall::Text("0.78L".to_string())));
}

#[test]
fn countdown_then_sleep_then_wake() {
    let clock = ManualClock::new(T);
    let mut dev = device_with(FixedSensor::new(1000.0), &clock);
    dev.boot();

    clock.set(T + 4_999);
    let report = dev.tick();
    assert_eq!(report.step, ActivityStep::Countdown { remaining_s: 1 });
    assert!(dev.panel().texts().contains(&"Sleep after: 1 sec...".to_string()));
    assert_eq!(dev.power().sleeps, 0);
    dev.panel_mut().take_calls();

    clock.set(T + 5_000);
    let report = dev.tick();
    assert_eq!(report.step, ActivityStep::Sleep);
    assert_eq!(report.woke, Some(WakeCause::Pin));

    assert_eq!(dev.power().armed_pins, vec![(38, WakeLevel::Low)]);
    assert!(dev.power().armed_timers.is_empty());
    assert_eq!(dev.power().sleeps, 1);
    assert_eq!(dev.speaker().tones, vec![(2_000, 100), (1_000, 100)]);

    // Battery read once at boot and once after waking.
    assert_eq!(dev.power().battery_reads, 2);
    assert_eq!(dev.activity().window_start_ms(), T + 5_000 + SLEEP_MS);
    assert_eq!(dev.power_state(), PowerState::AwakeActive);

    let calls = dev.panel_mut().take_calls();
    assert!(draws_header(&calls));
    assert!(calls.contains(&DrawCall::Text("BAT:  72%".to_string())));
    // Footer cleared before sleeping, no countdown text this tick.
    assert!(!calls
        .iter()
        .any(|c| matches!(c, DrawCall::Text(t) if t.starts_with("Sleep after"))));

    // Fresh window after the wake.
    clock.advance(100);
    let report = dev.tick();
    assert_eq!(report.step, ActivityStep::Countdown { remaining_s: 5 });
}

#[test]
fn unreadable_sensor_shows_full_gauge() {
    let clock = ManualClock::new(T);
    let mut dev = device_with(Hx711Scale::new(ScriptedAdc::failing()), &clock);
    dev.boot();
    dev.panel_mut().take_calls();

    let report = dev.tick();
    assert!((report.sample.volume_litres - 18.0).abs() < 1e-4);

    let calls = dev.panel_mut().take_calls();
    let sweep = last_arc_sweep(&calls).unwrap();
    assert!(sweep >= 359.0, "sweep = {}", sweep);
    assert!(calls.contains(&DrawCall::Text("100.0%".to_string())));
    assert!(calls.contains(&DrawCall::Text("18.00L".to_string())));
}

#[test]
fn unchanged_weight_is_not_redrawn() {
    let clock = ManualClock::new(T);
    let mut dev = device_with(FixedSensor::new(2500.0), &clock);
    dev.boot();

    assert!(dev.tick().redrawn);
    dev.panel_mut().take_calls();

    clock.advance(100);
    let report = dev.tick();
    assert!(!report.redrawn);
    let calls = dev.panel_mut().take_calls();
    assert!(!calls.iter().any(|c| matches!(c, DrawCall::Arc { .. })));
    // Countdown still refreshes.
    assert!(calls.contains(&DrawCall::Text("Sleep after: 5 sec...".to_string())));
}

#[test]
fn calibration_click_zeroes_the_current_load() {
    let clock = ManualClock::new(T);
    let adc = ScriptedAdc::constant(84_000);
    let load = adc.load_handle();
    let mut dev = device_with(Hx711Scale::new(adc), &clock);
    dev.boot();

    let before = dev.tick();
    assert!(before.sample.volume_litres > 2.0, "untared = {}", before.sample.volume_litres);

    clock.set(T + 3_000);
    dev.input_mut().push(Button::Calibrate, ButtonEvent::SingleClick);
    let report = dev.tick();
    assert!(report.calibrated);
    assert_eq!(report.sample.volume_litres, 0.0);
    assert_eq!(dev.activity().window_start_ms(), T + 3_000);
    assert_eq!(dev.sensor().calibration().tare_offset, 84_000);

    // One kilogram on the tared scale.
    load.set(84_000 + 27_610);
    clock.advance(100);
    let report = dev.tick();
    assert!((report.sample.volume_litres - 0.78).abs() < 1e-3);
}

#[test]
fn header_and_countdown_never_touch_gauge_pixels() {
    let clock = ManualClock::new(T);
    let mut dev = Device::new(
        DeviceConfig::default(),
        FixedSensor::new(9_000.0),
        EgPanel::new(FrameBuffer::new(200, 200)),
        MockPower::new(55).with_clock(clock.clone(), SLEEP_MS),
        MockSpeaker::default(),
        ScriptedInput::default(),
        clock.clone(),
    );
    dev.boot();
    dev.tick();

    let band = gauge_band(200, 200);
    assert!(dev.panel().target().ink_in(&band) > 0);
    let gauge_pixels = dev.panel().target().clone();

    // Sleep and wake: footer cleared, header redrawn, same weight.
    clock.set(T + 5_000);
    let report = dev.tick();
    assert!(report.woke.is_some());
    assert!(!report.redrawn);

    let fb = dev.panel().target();
    assert!(band
        .points()
        .all(|p| fb.pixel(p.x as u32, p.y as u32) == gauge_pixels.pixel(p.x as u32, p.y as u32)));
    assert!(!dev.panel().is_buffered());
}
