// Litter Gauge - Activity / Sleep State Machine
//
// One timestamp drives everything: the awake window starts at boot, on every
// wake and on a manual calibration. Once it has run for the full window the
// device goes to light sleep.

use crate::events::PowerState;

/// Monotonic milliseconds since boot.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityStep {
    /// Still awake; whole seconds left, shown in the footer.
    Countdown { remaining_s: u64 },
    /// Window elapsed; sleep now.
    Sleep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityState {
    pub window_start_ms: u64,
    pub window_ms: u64,
    pub state: PowerState,
}

pub struct ActivityTimer {
    inner: ActivityState,
}

impl ActivityTimer {
    pub fn new(now_ms: u64, window_ms: u64) -> Self {
        Self {
            inner: ActivityState {
                window_start_ms: now_ms,
                window_ms,
                state: PowerState::AwakeActive,
            },
        }
    }

    pub fn state(&self) -> PowerState {
        self.inner.state
    }

    pub fn window_start_ms(&self) -> u64 {
        self.inner.window_start_ms
    }

    /// Restart the awake window at `now_ms` (wake-up or manual calibration).
    pub fn restart(&mut self, now_ms: u64) {
        self.inner.window_start_ms = now_ms;
        self.inner.state = PowerState::AwakeActive;
    }

    pub fn evaluate(&mut self, now_ms: u64) -> ActivityStep {
        if self.inner.state != PowerState::AwakeActive {
            return ActivityStep::Sleep;
        }
        let elapsed = now_ms.saturating_sub(self.inner.window_start_ms);
        if elapsed < self.inner.window_ms {
            let remaining_s = (self.inner.window_ms / 1000).saturating_sub(elapsed / 1000);
            ActivityStep::Countdown { remaining_s }
        } else {
            self.inner.state = PowerState::EnteringSleep;
            ActivityStep::Sleep
        }
    }

    /// Skip the rest of the window (hold-release on the wake button).
    pub fn request_sleep(&mut self) {
        self.inner.state = PowerState::EnteringSleep;
    }

    pub fn mark_asleep(&mut self) {
        self.inner.state = PowerState::Asleep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 12_345;

    #[test]
    fn counts_down_whole_seconds() {
        let mut timer = ActivityTimer::new(T, 5_000);
        assert_eq!(timer.evaluate(T), ActivityStep::Countdown { remaining_s: 5 });
        assert_eq!(timer.evaluate(T + 999), ActivityStep::Countdown { remaining_s: 5 });
        assert_eq!(timer.evaluate(T + 1_000), ActivityStep::Countdown { remaining_s: 4 });
        assert_eq!(timer.evaluate(T + 4_999), ActivityStep::Countdown { remaining_s: 1 });
        assert_eq!(timer.state(), PowerState::AwakeActive);
    }

    #[test]
    fn sleeps_at_window_end() {
        let mut timer = ActivityTimer::new(T, 5_000);
        assert_eq!(timer.evaluate(T + 5_000), ActivityStep::Sleep);
        assert_eq!(timer.state(), PowerState::EnteringSleep);
        timer.mark_asleep();
        assert_eq!(timer.state(), PowerState::Asleep);
    }

    #[test]
    fn restart_moves_the_window() {
        let mut timer = ActivityTimer::new(T, 5_000);
        timer.evaluate(T + 6_000);
        timer.restart(T + 6_000);
        assert_eq!(timer.window_start_ms(), T + 6_000);
        assert_eq!(timer.state(), PowerState::AwakeActive);
        assert_eq!(timer.evaluate(T + 10_999), ActivityStep::Countdown { remaining_s: 1 });
    }

    #[test]
    fn requested_sleep_wins_over_countdown() {
        let mut timer = ActivityTimer::new(T, 5_000);
        timer.request_sleep();
        assert_eq!(timer.evaluate(T + 10), ActivityStep::Sleep);
    }

    #[test]
    fn clock_going_backwards_keeps_device_awake() {
        let mut timer = ActivityTimer::new(T, 5_000);
        assert_eq!(timer.evaluate(T - 100), ActivityStep::Countdown { remaining_s: 5 });
    }
}
