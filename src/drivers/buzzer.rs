// Litter Gauge - Passive Buzzer
//
// Square wave toggled straight on a GPIO. Blocks for the tone duration.

use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use litter_gauge::power::Speaker;

pub struct Buzzer<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> Buzzer<'d> {
    pub fn new(pin: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        Self { pin }
    }

    fn square_wave(&mut self, half_period_us: u32, cycles: u32) -> anyhow::Result<()> {
        for _ in 0..cycles {
            self.pin.set_high()?;
            Ets::delay_us(half_period_us);
            self.pin.set_low()?;
            Ets::delay_us(half_period_us);
        }
        Ok(())
    }
}

impl Speaker for Buzzer<'_> {
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        if frequency_hz == 0 {
            return;
        }
        let half_period_us = 500_000 / frequency_hz;
        let cycles = frequency_hz * duration_ms / 1000;
        if let Err(e) = self.square_wave(half_period_us, cycles) {
            log::error!("Buzzer GPIO error, tone {} Hz aborted: {}", frequency_hz, e);
        }
    }
}
