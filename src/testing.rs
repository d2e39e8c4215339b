// Litter Gauge - Host Test Doubles
//
// Scripted stand-ins for every hardware seam, shared by the unit tests and
// the control-loop tests under tests/.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use anyhow::bail;

use crate::activity::Clock;
use crate::events::{Button, ButtonEvent, WakeCause, WakeLevel};
use crate::input::InputSource;
use crate::panel::{sweep_degrees, Ink, Panel, TextSize, BLACK};
use crate::power::{PowerDriver, Speaker};
use crate::scale::RawAdc;

// ---------------------------------------------------------------------------
// Panel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    FillRect { x: i32, y: i32, w: u32, h: u32, color: Ink },
    Circle { cx: i32, cy: i32, r: u32 },
    Arc { r_outer: u32, r_inner: u32, start_deg: f32, end_deg: f32 },
    Text(String),
}

/// Records primitives instead of drawing them. Font metrics match the real
/// fonts so layout arithmetic is the same as on the device.
pub struct RecordingPanel {
    width: u32,
    height: u32,
    buffered: bool,
    calls: Vec<DrawCall>,
    /// Cursor position of each `Text` call, keyed by call index.
    text_origins: Vec<(usize, (i32, i32))>,
    cursor: (i32, i32),
    text_size: TextSize,
    flushes: usize,
}

impl RecordingPanel {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffered: false,
            calls: Vec::new(),
            text_origins: Vec::new(),
            cursor: (0, 0),
            text_size: TextSize::Small,
            flushes: 0,
        }
    }

    /// Behaves like e-paper: `is_buffered` is true.
    pub fn buffered(width: u32, height: u32) -> Self {
        Self {
            buffered: true,
            ..Self::new(width, height)
        }
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        self.text_origins.clear();
        std::mem::take(&mut self.calls)
    }

    /// Where the text drawn by call `index` started.
    pub fn cursor_at_text(&self, index: usize) -> Option<(i32, i32)> {
        self.text_origins
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, at)| *at)
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Panel for RecordingPanel {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Ink) {
        self.calls.push(DrawCall::FillRect { x, y, w, h, color });
    }

    fn draw_circle(&mut self, cx: i32, cy: i32, r: u32, _color: Ink) {
        self.calls.push(DrawCall::Circle { cx, cy, r });
    }

    fn fill_arc(
        &mut self,
        _cx: i32,
        _cy: i32,
        r_outer: u32,
        r_inner: u32,
        start_deg: f32,
        end_deg: f32,
        _color: Ink,
    ) {
        self.calls.push(DrawCall::Arc {
            r_outer,
            r_inner,
            start_deg,
            end_deg,
        });
    }

    fn set_text_style(&mut self, size: TextSize, _color: Ink) {
        self.text_size = size;
    }

    fn font_width(&self) -> u32 {
        let font = self.text_size.font();
        font.character_size.width + font.character_spacing
    }

    fn font_height(&self) -> u32 {
        self.text_size.font().character_size.height
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = (x, y);
    }

    fn print_fmt(&mut self, args: fmt::Arguments<'_>) {
        let text = fmt::format(args);
        self.text_origins.push((self.calls.len(), self.cursor));
        self.cursor.0 += (self.font_width() * text.chars().count() as u32) as i32;
        self.calls.push(DrawCall::Text(text));
    }

    fn is_buffered(&self) -> bool {
        self.buffered
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

/// Sweep of the most recent arc, if any.
pub fn last_arc_sweep(calls: &[DrawCall]) -> Option<f32> {
    calls.iter().rev().find_map(|c| match c {
        DrawCall::Arc { start_deg, end_deg, .. } => Some(sweep_degrees(*start_deg, *end_deg)),
        _ => None,
    })
}

/// True when `calls` paints the black header bar.
pub fn draws_header(calls: &[DrawCall]) -> bool {
    calls
        .iter()
        .any(|c| matches!(c, DrawCall::FillRect { y: 0, color, .. } if *color == BLACK))
}

// ---------------------------------------------------------------------------
// Load cell
// ---------------------------------------------------------------------------

/// Raw converter output: a shared base load plus a repeating offset pattern.
pub struct ScriptedAdc {
    load: Rc<Cell<i32>>,
    failing: bool,
    pattern: Vec<i32>,
    pos: usize,
}

impl ScriptedAdc {
    fn with(load: i32, pattern: Vec<i32>) -> Self {
        Self {
            load: Rc::new(Cell::new(load)),
            failing: false,
            pattern,
            pos: 0,
        }
    }

    pub fn constant(value: i32) -> Self {
        Self::with(value, vec![0])
    }

    /// Repeats `values` in order.
    pub fn cycle(values: Vec<i32>) -> Self {
        Self::with(0, values)
    }

    /// A few counts of jitter around `center`.
    pub fn noisy(center: i32) -> Self {
        Self::with(center, vec![3, -2, 1, -4, 2, 0, -1, 1, 4, -3, 0, -1])
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::constant(0)
        }
    }

    /// Change the base load after the converter has been moved into a scale.
    pub fn load_handle(&self) -> Rc<Cell<i32>> {
        Rc::clone(&self.load)
    }
}

impl RawAdc for ScriptedAdc {
    fn read_raw(&mut self) -> anyhow::Result<i32> {
        if self.failing {
            bail!("HX711 not ready");
        }
        let offset = if self.pattern.is_empty() {
            0
        } else {
            self.pattern[self.pos % self.pattern.len()]
        };
        self.pos = self.pos.wrapping_add(1);
        Ok(self.load.get() + offset)
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Hand-driven clock; clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

// ---------------------------------------------------------------------------
// Power and buzzer
// ---------------------------------------------------------------------------

pub struct MockPower {
    pub battery: u8,
    pub battery_reads: usize,
    pub armed_pins: Vec<(i32, WakeLevel)>,
    pub armed_timers: Vec<Duration>,
    pub sleeps: usize,
    pub wake_cause: WakeCause,
    /// Arming the wake pin fails while set.
    pub fail_arm: bool,
    pub fail_battery: bool,
    /// Advanced by `sleep_ms` on every sleep, when present.
    pub clock: Option<ManualClock>,
    pub sleep_ms: u64,
}

impl MockPower {
    pub fn new(battery: u8) -> Self {
        Self {
            battery,
            battery_reads: 0,
            armed_pins: Vec::new(),
            armed_timers: Vec::new(),
            sleeps: 0,
            wake_cause: WakeCause::Pin,
            fail_arm: false,
            fail_battery: false,
            clock: None,
            sleep_ms: 0,
        }
    }

    /// Time spent asleep shows up on `clock`.
    pub fn with_clock(mut self, clock: ManualClock, sleep_ms: u64) -> Self {
        self.clock = Some(clock);
        self.sleep_ms = sleep_ms;
        self
    }
}

impl PowerDriver for MockPower {
    fn battery_percentage(&mut self) -> anyhow::Result<u8> {
        self.battery_reads += 1;
        if self.fail_battery {
            bail!("battery ADC unavailable");
        }
        Ok(self.battery)
    }

    fn arm_wake_on_pin(&mut self, pin: i32, level: WakeLevel) -> anyhow::Result<()> {
        if self.fail_arm {
            bail!("ext0 wakeup rejected for GPIO{}", pin);
        }
        self.armed_pins.push((pin, level));
        Ok(())
    }

    fn arm_wake_timer(&mut self, after: Duration) -> anyhow::Result<()> {
        self.armed_timers.push(after);
        Ok(())
    }

    fn enter_low_power_mode(&mut self) -> anyhow::Result<WakeCause> {
        self.sleeps += 1;
        if let Some(clock) = &self.clock {
            clock.advance(self.sleep_ms);
        }
        Ok(self.wake_cause)
    }
}

#[derive(Debug, Default)]
pub struct MockSpeaker {
    pub tones: Vec<(u32, u32)>,
}

impl Speaker for MockSpeaker {
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        self.tones.push((frequency_hz, duration_ms));
    }
}

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------

/// Button events queued by the test and handed out on request.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    pending: Vec<(Button, ButtonEvent)>,
    pub polls: usize,
    pub resets: usize,
}

impl ScriptedInput {
    pub fn push(&mut self, button: Button, event: ButtonEvent) {
        self.pending.push((button, event));
    }

    fn take(&mut self, button: Button, event: ButtonEvent) -> bool {
        match self.pending.iter().position(|e| *e == (button, event)) {
            Some(i) => {
                self.pending.remove(i);
                true
            }
            None => false,
        }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, _now_ms: u64) {
        self.polls += 1;
    }

    fn was_single_clicked(&mut self, button: Button) -> bool {
        self.take(button, ButtonEvent::SingleClick)
    }

    fn was_released_after_hold(&mut self, button: Button) -> bool {
        self.take(button, ButtonEvent::ReleasedAfterHold)
    }

    fn reset(&mut self, _now_ms: u64) {
        self.resets += 1;
        self.pending.clear();
    }
}
