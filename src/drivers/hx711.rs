// Litter Gauge - HX711 Load Cell Converter
//
// Bit-banged two-wire protocol: DOUT goes low when a conversion is ready,
// then 24 clock pulses shift the result out MSB first. One extra pulse
// selects channel A, gain 128 for the next conversion.

use std::time::{Duration, Instant};

use anyhow::bail;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver};

use litter_gauge::config::HX711_READY_TIMEOUT_MS;
use litter_gauge::scale::RawAdc;

const DATA_BITS: u32 = 24;
const GAIN_128_PULSES: u32 = 1;
/// PD_SCK high/low time. Datasheet minimum is 0.2 us; above 60 us powers down.
const HALF_PERIOD_US: u32 = 1;

pub struct Hx711<'d> {
    data: PinDriver<'d, AnyInputPin, Input>,
    clock: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> Hx711<'d> {
    pub fn new(
        data: PinDriver<'d, AnyInputPin, Input>,
        mut clock: PinDriver<'d, AnyOutputPin, Output>,
    ) -> anyhow::Result<Self> {
        // Clock held low keeps the chip powered up.
        clock.set_low()?;
        log::info!("HX711 ready on DOUT/PD_SCK");
        Ok(Self { data, clock })
    }

    pub fn is_ready(&self) -> bool {
        self.data.is_low()
    }

    fn wait_ready(&self) -> anyhow::Result<()> {
        let start = Instant::now();
        let timeout = Duration::from_millis(HX711_READY_TIMEOUT_MS);
        while !self.is_ready() {
            if start.elapsed() > timeout {
                bail!("HX711 not ready after {} ms", HX711_READY_TIMEOUT_MS);
            }
            Ets::delay_us(100);
        }
        Ok(())
    }

    fn pulse(&mut self) -> anyhow::Result<()> {
        self.clock.set_high()?;
        Ets::delay_us(HALF_PERIOD_US);
        self.clock.set_low()?;
        Ets::delay_us(HALF_PERIOD_US);
        Ok(())
    }
}

impl RawAdc for Hx711<'_> {
    fn read_raw(&mut self) -> anyhow::Result<i32> {
        self.wait_ready()?;

        let mut value: u32 = 0;
        for _ in 0..DATA_BITS {
            self.clock.set_high()?;
            Ets::delay_us(HALF_PERIOD_US);
            value = (value << 1) | u32::from(self.data.is_high());
            self.clock.set_low()?;
            Ets::delay_us(HALF_PERIOD_US);
        }
        for _ in 0..GAIN_128_PULSES {
            self.pulse()?;
        }

        // Sign-extend the 24-bit two's complement result.
        Ok(((value << 8) as i32) >> 8)
    }
}
