// Litter Gauge - Power Management Contracts
//
// Battery level, light-sleep entry and wake arming, plus the buzzer used to
// confirm a wake-up.

use std::time::Duration;

use crate::config::{BATTERY_EMPTY_MV, BATTERY_FULL_MV};
use crate::events::{WakeCause, WakeLevel};

pub trait PowerDriver {
    /// Battery charge, 0-100 %.
    fn battery_percentage(&mut self) -> anyhow::Result<u8>;

    /// Wake from light sleep when `pin` reaches `level`.
    fn arm_wake_on_pin(&mut self, pin: i32, level: WakeLevel) -> anyhow::Result<()>;

    /// Additional timer wake source.
    fn arm_wake_timer(&mut self, after: Duration) -> anyhow::Result<()>;

    /// Halt until an armed wake source fires, then return what woke us.
    fn enter_low_power_mode(&mut self) -> anyhow::Result<WakeCause>;
}

pub trait Speaker {
    /// Blocking square-wave tone.
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32);
}

/// Map LiPo terminal voltage linearly onto 0-100 %.
pub fn battery_percent_from_millivolts(millivolts: u32) -> u8 {
    if millivolts <= BATTERY_EMPTY_MV {
        return 0;
    }
    if millivolts >= BATTERY_FULL_MV {
        return 100;
    }
    ((millivolts - BATTERY_EMPTY_MV) * 100 / (BATTERY_FULL_MV - BATTERY_EMPTY_MV)) as u8
}
