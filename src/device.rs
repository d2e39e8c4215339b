// Litter Gauge - Device Control Loop
//
// Owns every collaborator. `boot()` once, then `tick()` every
// TICK_INTERVAL_MS from the main loop. Light sleep happens inside `tick()`;
// the call returns after the wake sequence has run.

use std::time::Duration;

use crate::activity::{ActivityStep, ActivityTimer, Clock};
use crate::calibration::run_calibration;
use crate::config::{DeviceConfig, WAKE_TONES};
use crate::events::{BatteryStatus, Button, MeasurementSample, PowerState, WakeCause, WakeLevel};
use crate::gauge::GaugeRenderer;
use crate::input::InputSource;
use crate::panel::{Panel, WHITE};
use crate::power::{PowerDriver, Speaker};
use crate::scale::{LoadCell, ScaleSensor};
use crate::status::{clear_footer, draw_countdown, draw_header};
use crate::units::VolumeConverter;

/// What one tick did, for the caller's logs and for tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub sample: MeasurementSample,
    pub redrawn: bool,
    pub calibrated: bool,
    pub step: ActivityStep,
    /// Set when the tick went through light sleep and back.
    pub woke: Option<WakeCause>,
}

pub struct Device<S, P, W, K, I, C> {
    config: DeviceConfig,
    load_cell: LoadCell<S>,
    converter: VolumeConverter,
    gauge: GaugeRenderer,
    activity: ActivityTimer,
    battery: Option<BatteryStatus>,
    panel: P,
    power: W,
    speaker: K,
    input: I,
    clock: C,
}

impl<S, P, W, K, I, C> Device<S, P, W, K, I, C>
where
    S: ScaleSensor,
    P: Panel,
    W: PowerDriver,
    K: Speaker,
    I: InputSource,
    C: Clock,
{
    pub fn new(
        config: DeviceConfig,
        sensor: S,
        panel: P,
        power: W,
        speaker: K,
        input: I,
        clock: C,
    ) -> Self {
        let now = clock.now_ms();
        Self {
            load_cell: LoadCell::new(sensor),
            converter: VolumeConverter::new(config.density, config.max_capacity),
            gauge: GaugeRenderer::new(config.max_capacity, config.ring_width),
            activity: ActivityTimer::new(now, config.awake_window_ms),
            battery: None,
            config,
            panel,
            power,
            speaker,
            input,
            clock,
        }
    }

    /// Blank screen, header, optional calibration. The awake window starts
    /// here.
    pub fn boot(&mut self) {
        let (w, h) = (self.panel.width(), self.panel.height());
        self.panel.fill_rect(0, 0, w, h, WHITE);
        self.gauge.invalidate();

        self.activity.restart(self.clock.now_ms());
        self.refresh_status();

        if self.config.calibrate_on_boot {
            run_calibration(self.load_cell.sensor_mut(), self.config.scale_factor);
        } else {
            self.load_cell.sensor_mut().set_scale(self.config.scale_factor);
        }
        self.flush_if_buffered();
        log::info!("Boot complete, awake for {} ms", self.config.awake_window_ms);
    }

    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        self.input.poll(now);

        let calibrated = self.input.was_single_clicked(Button::Calibrate);
        if calibrated {
            self.activity.restart(now);
            run_calibration(self.load_cell.sensor_mut(), self.config.scale_factor);
        }
        if self.input.was_released_after_hold(Button::Wake) {
            log::info!("Wake button held, sleeping now");
            self.activity.request_sleep();
        }

        let sample = self.measure();
        let redrawn = self.gauge.render(&mut self.panel, sample.volume_litres);

        let step = self.activity.evaluate(self.clock.now_ms());
        let woke = match step {
            ActivityStep::Countdown { remaining_s } => {
                draw_countdown(&mut self.panel, remaining_s);
                self.flush_if_buffered();
                None
            }
            ActivityStep::Sleep => {
                clear_footer(&mut self.panel);
                self.flush_if_buffered();
                self.sleep_and_wake()
            }
        };

        TickReport {
            sample,
            redrawn,
            calibrated,
            step,
            woke,
        }
    }

    fn measure(&mut self) -> MeasurementSample {
        let weight_kg = self.load_cell.measure_weight();
        let volume_litres = self.converter.to_volume(weight_kg);
        log::debug!("measure: weight={:.3}, value={:.2}", weight_kg, volume_litres);
        if volume_litres < 0.0 {
            log::warn!("Negative volume {:.2} L, tare is off", volume_litres);
        }
        MeasurementSample {
            weight_kg,
            volume_litres,
        }
    }

    /// Arm wake sources, halt, then run the wake sequence. Returns `None`
    /// when the device could not be put to sleep and stays awake instead.
    fn sleep_and_wake(&mut self) -> Option<WakeCause> {
        if let Err(e) = self
            .power
            .arm_wake_on_pin(self.config.wake_pin, WakeLevel::Low)
        {
            log::error!("Failed to arm wake pin GPIO{}: {}", self.config.wake_pin, e);
            self.activity.restart(self.clock.now_ms());
            return None;
        }
        if let Some(ms) = self.config.wake_timer_ms {
            if let Err(e) = self.power.arm_wake_timer(Duration::from_millis(ms)) {
                log::warn!("Wake timer not armed: {}", e);
            }
        }

        self.battery = None;
        self.activity.mark_asleep();
        log::info!("Entering light sleep");

        let cause = match self.power.enter_low_power_mode() {
            Ok(cause) => cause,
            Err(e) => {
                log::error!("Light sleep failed: {}", e);
                WakeCause::Other
            }
        };
        log::info!("Woke up ({:?})", cause);

        for (hz, ms) in WAKE_TONES {
            self.speaker.tone(hz, ms);
        }
        let now = self.clock.now_ms();
        self.activity.restart(now);
        self.input.reset(now);
        self.refresh_status();
        self.flush_if_buffered();
        Some(cause)
    }

    fn refresh_status(&mut self) {
        let battery = match self.power.battery_percentage() {
            Ok(pct) => BatteryStatus::new(pct),
            Err(e) => {
                let kept = self.battery.unwrap_or(BatteryStatus::new(0));
                log::warn!("Battery read failed ({}), showing {}%", e, kept.percentage);
                kept
            }
        };
        log::info!("Battery: {}%", battery.percentage);
        self.battery = Some(battery);
        draw_header(&mut self.panel, self.config.title, battery);
    }

    fn flush_if_buffered(&mut self) {
        if !self.panel.is_buffered() {
            return;
        }
        if let Err(e) = self.panel.flush() {
            log::error!("Panel flush failed: {}", e);
        }
    }

    pub fn power_state(&self) -> PowerState {
        self.activity.state()
    }

    pub fn activity(&self) -> &ActivityTimer {
        &self.activity
    }

    pub fn battery(&self) -> Option<BatteryStatus> {
        self.battery
    }

    pub fn sensor(&self) -> &S {
        self.load_cell.sensor()
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }

    pub fn power(&self) -> &W {
        &self.power
    }

    pub fn power_mut(&mut self) -> &mut W {
        &mut self.power
    }

    pub fn speaker(&self) -> &K {
        &self.speaker
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }
}
