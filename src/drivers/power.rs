// Litter Gauge - Power Driver
//
// Battery voltage over the ADC1 oneshot API and light sleep with ext0 / timer
// wake sources, straight on the ESP-IDF C API.

use std::time::Duration;

use anyhow::bail;
use esp_idf_sys::esp;

use litter_gauge::events::{WakeCause, WakeLevel};
use litter_gauge::power::{battery_percent_from_millivolts, PowerDriver};

// GPIO35 is ADC1_CHANNEL_7 on the ESP32.
const BATTERY_CHANNEL: esp_idf_sys::adc_channel_t = esp_idf_sys::adc_channel_t_ADC_CHANNEL_7;
const ADC_FULL_SCALE: f32 = 4095.0;
const ADC_REF_MV: f32 = 3300.0;
/// 1:2 resistor divider in front of the ADC pin.
const DIVIDER_RATIO: f32 = 2.0;

pub struct EspPower {
    adc: esp_idf_sys::adc_oneshot_unit_handle_t,
}

impl EspPower {
    pub fn new() -> anyhow::Result<Self> {
        let mut adc: esp_idf_sys::adc_oneshot_unit_handle_t = core::ptr::null_mut();
        unsafe {
            let unit_cfg = esp_idf_sys::adc_oneshot_unit_init_cfg_t {
                unit_id: esp_idf_sys::adc_unit_t_ADC_UNIT_1,
                ulp_mode: esp_idf_sys::adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
                ..core::mem::zeroed()
            };
            esp!(esp_idf_sys::adc_oneshot_new_unit(&unit_cfg, &mut adc))?;

            // 11 dB attenuation: 0-3.3 V input range.
            let chan_cfg = esp_idf_sys::adc_oneshot_chan_cfg_t {
                atten: esp_idf_sys::adc_atten_t_ADC_ATTEN_DB_11,
                bitwidth: esp_idf_sys::adc_bitwidth_t_ADC_BITWIDTH_12,
            };
            esp!(esp_idf_sys::adc_oneshot_config_channel(adc, BATTERY_CHANNEL, &chan_cfg))?;
        }
        log::info!("Battery ADC ready (ADC1 channel 7)");
        Ok(Self { adc })
    }

    fn battery_millivolts(&mut self) -> anyhow::Result<u32> {
        let mut raw: i32 = 0;
        esp!(unsafe { esp_idf_sys::adc_oneshot_read(self.adc, BATTERY_CHANNEL, &mut raw) })?;
        let mv = raw as f32 / ADC_FULL_SCALE * ADC_REF_MV * DIVIDER_RATIO;
        Ok(mv as u32)
    }
}

impl PowerDriver for EspPower {
    fn battery_percentage(&mut self) -> anyhow::Result<u8> {
        let mv = self.battery_millivolts()?;
        log::debug!("Battery {} mV", mv);
        Ok(battery_percent_from_millivolts(mv))
    }

    fn arm_wake_on_pin(&mut self, pin: i32, level: WakeLevel) -> anyhow::Result<()> {
        let level = match level {
            WakeLevel::Low => 0,
            WakeLevel::High => 1,
        };
        esp!(unsafe { esp_idf_sys::esp_sleep_enable_ext0_wakeup(pin, level) })?;
        Ok(())
    }

    fn arm_wake_timer(&mut self, after: Duration) -> anyhow::Result<()> {
        let us = u64::try_from(after.as_micros())?;
        esp!(unsafe { esp_idf_sys::esp_sleep_enable_timer_wakeup(us) })?;
        Ok(())
    }

    fn enter_low_power_mode(&mut self) -> anyhow::Result<WakeCause> {
        if let Err(e) = esp!(unsafe { esp_idf_sys::esp_light_sleep_start() }) {
            bail!("esp_light_sleep_start: {}", e);
        }
        #[allow(non_upper_case_globals)]
        let cause = match unsafe { esp_idf_sys::esp_sleep_get_wakeup_cause() } {
            esp_idf_sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT0 => WakeCause::Pin,
            esp_idf_sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER => WakeCause::Timer,
            _ => WakeCause::Other,
        };
        Ok(cause)
    }
}

impl Drop for EspPower {
    fn drop(&mut self) {
        unsafe {
            esp_idf_sys::adc_oneshot_del_unit(self.adc);
        }
    }
}
