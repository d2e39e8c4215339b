// Litter Gauge - Firmware Entry Point
//
// Boot sequence:
//   1. Latch the power-hold line so the board stays on when running on battery.
//   2. Bring up the e-paper panel, HX711, battery ADC, buzzer and buttons.
//   3. Clear the screen, draw the header, start the 5 s awake window.
//   4. Tick the control loop every 100 ms. Light sleep happens inside a tick
//      once the window runs out; the dial button wakes the device again.

mod drivers;

use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyIOPin, IOPin, InputPin, OutputPin, PinDriver, Pull};
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::{SpiConfig, SpiDeviceDriver, SpiDriverConfig};

use litter_gauge::activity::Clock;
use litter_gauge::config::*;
use litter_gauge::device::Device;
use litter_gauge::events::Button;
use litter_gauge::input::ButtonPair;
use litter_gauge::panel::EgPanel;
#[cfg(feature = "no-hx711")]
use litter_gauge::scale::FixedSensor;
#[cfg(not(feature = "no-hx711"))]
use litter_gauge::scale::Hx711Scale;

use crate::drivers::buzzer::Buzzer;
use crate::drivers::epd::Epd;
#[cfg(not(feature = "no-hx711"))]
use crate::drivers::hx711::Hx711;
use crate::drivers::power::EspPower;
use crate::drivers::EspClock;

fn main() -> anyhow::Result<()> {
    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Litter gauge firmware starting");

    let peripherals = Peripherals::take()?;

    // ---- Power hold (GPIO12) ----------------------------------------------
    let mut power_hold = PinDriver::output(peripherals.pins.gpio12.downgrade_output())?;
    power_hold.set_high()?;
    log::debug!("Power hold latched on GPIO{}", PIN_POWER_HOLD);

    // ---- E-paper over SPI -------------------------------------------------
    let spi = SpiDeviceDriver::new_single(
        peripherals.spi2,
        peripherals.pins.gpio18, // SCK
        peripherals.pins.gpio23, // MOSI
        Option::<AnyIOPin>::None,
        Some(peripherals.pins.gpio9), // CS
        &SpiDriverConfig::new(),
        &SpiConfig::new().baudrate(EPD_SPI_BAUDRATE_HZ.Hz()),
    )?;
    let mut epd = Epd::new(
        spi,
        PinDriver::output(peripherals.pins.gpio15.downgrade_output())?, // DC
        PinDriver::output(peripherals.pins.gpio0.downgrade_output())?,  // RST
        PinDriver::input(peripherals.pins.gpio4.downgrade_input())?,    // BUSY
    );
    epd.init()?;
    let panel = EgPanel::new(epd);

    // ---- Load cell --------------------------------------------------------
    #[cfg(not(feature = "no-hx711"))]
    let sensor = {
        let data = PinDriver::input(peripherals.pins.gpio33.downgrade_input())?;
        let clock = PinDriver::output(peripherals.pins.gpio32.downgrade_output())?;
        log::info!("HX711 on DOUT GPIO{} / PD_SCK GPIO{}", PIN_HX711_DATA, PIN_HX711_CLOCK);
        Hx711Scale::new(Hx711::new(data, clock)?)
    };
    #[cfg(feature = "no-hx711")]
    let sensor = {
        log::warn!("Built without HX711, gauge reads full");
        FixedSensor::full()
    };

    // ---- Battery ADC, light sleep, buzzer ---------------------------------
    let power = EspPower::new()?;
    let buzzer = Buzzer::new(PinDriver::output(peripherals.pins.gpio2.downgrade_output())?);

    // ---- Buttons (active LOW) ---------------------------------------------
    // GPIO38 is input-only with an external pull-up on the board.
    let wake_pin = PinDriver::input(peripherals.pins.gpio38.downgrade_input())?;
    let mut cal_pin = PinDriver::input(peripherals.pins.gpio5.downgrade())?;
    cal_pin.set_pull(Pull::Up)?;
    let buttons = ButtonPair::new(
        move |button| match button {
            Button::Calibrate => cal_pin.is_low(),
            Button::Wake => wake_pin.is_low(),
        },
        EspClock.now_ms(),
    );

    // ---- Control loop -----------------------------------------------------
    let mut device = Device::new(
        DeviceConfig::default(),
        sensor,
        panel,
        power,
        buzzer,
        buttons,
        EspClock,
    );
    device.boot();

    let tick = Duration::from_millis(TICK_INTERVAL_MS);
    loop {
        let report = device.tick();
        if let Some(cause) = report.woke {
            log::debug!("Tick resumed after wake ({:?})", cause);
        }
        thread::sleep(tick);
    }
}
