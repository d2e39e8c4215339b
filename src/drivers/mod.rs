pub mod buzzer;
pub mod epd;
pub mod hx711;
pub mod power;

use litter_gauge::activity::Clock;

/// Milliseconds since boot from the high-resolution ESP timer.
pub struct EspClock;

impl Clock for EspClock {
    fn now_ms(&self) -> u64 {
        let us = unsafe { esp_idf_sys::esp_timer_get_time() };
        (us / 1000) as u64
    }
}
