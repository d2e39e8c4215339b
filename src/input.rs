// Litter Gauge - Button Input
//
// Debounced click / hold detection, fed with the raw pin level once per
// control-loop tick. Events are latched until the loop asks for them.

use crate::config::*;
use crate::events::{Button, ButtonEvent};

/// Edge queries the control loop makes once per tick.
pub trait InputSource {
    /// Sample the buttons. Called first thing every tick.
    fn poll(&mut self, now_ms: u64);
    fn was_single_clicked(&mut self, button: Button) -> bool;
    fn was_released_after_hold(&mut self, button: Button) -> bool;
    /// Forget pending events and swallow any press still held, e.g. the
    /// press that woke the device.
    fn reset(&mut self, now_ms: u64);
}

pub struct ButtonTracker {
    // Debounce state
    last_raw: bool,
    last_change_ms: u64,

    // Press tracking
    button_down: bool,
    press_start_ms: u64,

    // Single-click window: a second press inside it cancels the click.
    click_pending_since: Option<u64>,
    click_cancelled: bool,

    // Release of a press that started before `reset` produces no event.
    swallow_release: bool,

    latched: Option<ButtonEvent>,
}

impl ButtonTracker {
    pub fn new(now_ms: u64) -> Self {
        Self {
            last_raw: false,
            last_change_ms: now_ms,
            button_down: false,
            press_start_ms: now_ms,
            click_pending_since: None,
            click_cancelled: false,
            swallow_release: false,
            latched: None,
        }
    }

    /// Take `pressed` as the settled level without producing any event for it.
    pub fn reset(&mut self, pressed: bool, now_ms: u64) {
        self.last_raw = pressed;
        self.last_change_ms = now_ms;
        self.button_down = pressed;
        self.press_start_ms = now_ms;
        self.click_pending_since = None;
        self.click_cancelled = false;
        self.swallow_release = pressed;
        self.latched = None;
    }

    /// `pressed` is the raw level, already inverted for active-low wiring.
    pub fn update(&mut self, pressed: bool, now_ms: u64) {
        // ---- debounce filter ----
        if pressed != self.last_raw {
            self.last_change_ms = now_ms;
        }
        self.last_raw = pressed;

        if now_ms.saturating_sub(self.last_change_ms) < DEBOUNCE_MS {
            self.check_click_timeout(now_ms);
            return;
        }

        // ---- pressed edge ----
        if pressed && !self.button_down {
            self.button_down = true;
            self.press_start_ms = now_ms;
            if self.click_pending_since.take().is_some() {
                self.click_cancelled = true;
            }
        }

        // ---- released edge ----
        if !pressed && self.button_down {
            self.button_down = false;
            let hold_ms = now_ms.saturating_sub(self.press_start_ms);

            if std::mem::take(&mut self.swallow_release) {
                log::debug!("Release of an already handled press ignored");
            } else if hold_ms >= HOLD_MS {
                self.latched = Some(ButtonEvent::ReleasedAfterHold);
                self.click_pending_since = None;
            } else if self.click_cancelled {
                log::debug!("Multi-click ignored");
            } else {
                self.click_pending_since = Some(now_ms);
            }
            self.click_cancelled = false;
        }

        self.check_click_timeout(now_ms);
    }

    /// If the click window expired without a second press, latch the click.
    fn check_click_timeout(&mut self, now_ms: u64) {
        if let Some(since) = self.click_pending_since {
            if now_ms.saturating_sub(since) > CLICK_WINDOW_MS {
                self.latched = Some(ButtonEvent::SingleClick);
                self.click_pending_since = None;
            }
        }
    }

    /// Consume the latched event if it is `kind`.
    pub fn take(&mut self, kind: ButtonEvent) -> bool {
        if self.latched == Some(kind) {
            self.latched = None;
            true
        } else {
            false
        }
    }

    pub fn is_down(&self) -> bool {
        self.button_down
    }
}

/// The two buttons of the device, tracked from any level source.
pub struct ButtonPair<F> {
    read_level: F,
    calibrate: ButtonTracker,
    wake: ButtonTracker,
}

impl<F> ButtonPair<F>
where
    F: FnMut(Button) -> bool,
{
    /// `read_level` returns true while the button is pressed.
    pub fn new(read_level: F, now_ms: u64) -> Self {
        Self {
            read_level,
            calibrate: ButtonTracker::new(now_ms),
            wake: ButtonTracker::new(now_ms),
        }
    }

    fn tracker(&mut self, button: Button) -> &mut ButtonTracker {
        match button {
            Button::Calibrate => &mut self.calibrate,
            Button::Wake => &mut self.wake,
        }
    }
}

impl<F> InputSource for ButtonPair<F>
where
    F: FnMut(Button) -> bool,
{
    fn poll(&mut self, now_ms: u64) {
        for button in [Button::Calibrate, Button::Wake] {
            let pressed = (self.read_level)(button);
            self.tracker(button).update(pressed, now_ms);
        }
    }

    fn was_single_clicked(&mut self, button: Button) -> bool {
        self.tracker(button).take(ButtonEvent::SingleClick)
    }

    fn was_released_after_hold(&mut self, button: Button) -> bool {
        self.tracker(button).take(ButtonEvent::ReleasedAfterHold)
    }

    fn reset(&mut self, now_ms: u64) {
        for button in [Button::Calibrate, Button::Wake] {
            let pressed = (self.read_level)(button);
            self.tracker(button).reset(pressed, now_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed `level` every 10 ms from `from` to `to` (exclusive).
    fn hold_level(t: &mut ButtonTracker, level: bool, from: u64, to: u64) {
        let mut now = from;
        while now < to {
            t.update(level, now);
            now += 10;
        }
    }

    #[test]
    fn short_press_becomes_single_click_after_window() {
        let mut t = ButtonTracker::new(0);
        hold_level(&mut t, true, 0, 200);
        hold_level(&mut t, false, 200, 300);
        assert!(!t.take(ButtonEvent::SingleClick), "window still open");
        hold_level(&mut t, false, 300, 700);
        assert!(t.take(ButtonEvent::SingleClick));
        assert!(!t.take(ButtonEvent::SingleClick), "event is consumed");
    }

    #[test]
    fn bounce_shorter_than_debounce_is_ignored() {
        let mut t = ButtonTracker::new(0);
        t.update(true, 0);
        t.update(false, 20);
        hold_level(&mut t, false, 30, 1000);
        assert!(!t.is_down());
        assert!(!t.take(ButtonEvent::SingleClick));
    }

    #[test]
    fn long_press_reports_released_after_hold() {
        let mut t = ButtonTracker::new(0);
        hold_level(&mut t, true, 0, 1500);
        assert!(t.is_down());
        hold_level(&mut t, false, 1500, 2000);
        assert!(t.take(ButtonEvent::ReleasedAfterHold));
        assert!(!t.take(ButtonEvent::SingleClick));
    }

    #[test]
    fn double_click_is_not_a_single_click() {
        let mut t = ButtonTracker::new(0);
        hold_level(&mut t, true, 0, 100);
        hold_level(&mut t, false, 100, 200);
        hold_level(&mut t, true, 200, 300);
        hold_level(&mut t, false, 300, 1000);
        assert!(!t.take(ButtonEvent::SingleClick));
    }

    #[test]
    fn works_at_control_loop_tick_rate() {
        let mut t = ButtonTracker::new(0);
        t.update(true, 100);
        t.update(true, 200);
        t.update(false, 300);
        t.update(false, 400);
        t.update(false, 500);
        t.update(false, 800);
        assert!(t.take(ButtonEvent::SingleClick));
    }

    #[test]
    fn press_held_through_reset_produces_no_event() {
        let mut t = ButtonTracker::new(0);
        t.reset(true, 0);
        assert!(t.is_down());
        hold_level(&mut t, true, 0, 1_500);
        hold_level(&mut t, false, 1_500, 2_500);
        assert!(!t.take(ButtonEvent::ReleasedAfterHold));
        assert!(!t.take(ButtonEvent::SingleClick));

        // The next press is a normal one again.
        hold_level(&mut t, true, 2_500, 3_700);
        hold_level(&mut t, false, 3_700, 4_000);
        assert!(t.take(ButtonEvent::ReleasedAfterHold));
    }

    #[test]
    fn reset_while_released_drops_pending_click() {
        let mut t = ButtonTracker::new(0);
        hold_level(&mut t, true, 0, 100);
        hold_level(&mut t, false, 100, 200);
        t.reset(false, 200);
        hold_level(&mut t, false, 200, 1_000);
        assert!(!t.take(ButtonEvent::SingleClick));
        assert!(!t.is_down());
    }

    #[test]
    fn pair_routes_levels_to_the_right_button() {
        let mut pressed_wake = true;
        let mut pair = ButtonPair::new(
            move |b| {
                let level = b == Button::Wake && pressed_wake;
                if b == Button::Wake {
                    pressed_wake = false;
                }
                level
            },
            0,
        );
        // Wake pressed for the first sample only: debounce swallows it.
        for now in (0..1000).step_by(10) {
            pair.poll(now);
        }
        assert!(!pair.was_single_clicked(Button::Wake));
        assert!(!pair.was_single_clicked(Button::Calibrate));
    }
}
