// Litter Gauge - 200x200 E-Paper Driver
//
// Register-level driver for the SSD1681-compatible controller on the CoreInk.
// Drawing goes into a `FrameBuffer`; `flush` transfers it and triggers a
// refresh. Identical frames are not sent again.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use anyhow::bail;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver};
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver};

use litter_gauge::config::{DISPLAY_BUFFER_SIZE, EPD_BUSY_TIMEOUT_MS, SCREEN_HEIGHT, SCREEN_WIDTH};
use litter_gauge::panel::{FrameBuffer, PanelTarget};

// Controller commands
const CMD_DRIVER_OUTPUT: u8 = 0x01;
const CMD_DATA_ENTRY_MODE: u8 = 0x11;
const CMD_SW_RESET: u8 = 0x12;
const CMD_TEMP_SENSOR: u8 = 0x18;
const CMD_MASTER_ACTIVATION: u8 = 0x20;
const CMD_UPDATE_CONTROL_2: u8 = 0x22;
const CMD_WRITE_RAM_BW: u8 = 0x24;
const CMD_WRITE_RAM_PREVIOUS: u8 = 0x26;
const CMD_BORDER: u8 = 0x3C;
const CMD_RAM_X_RANGE: u8 = 0x44;
const CMD_RAM_Y_RANGE: u8 = 0x45;
const CMD_RAM_X_COUNTER: u8 = 0x4E;
const CMD_RAM_Y_COUNTER: u8 = 0x4F;

const UPDATE_FULL: u8 = 0xF7;
const UPDATE_PARTIAL: u8 = 0xFF;

pub type EpdSpi<'d> = SpiDeviceDriver<'d, SpiDriver<'d>>;

pub struct Epd<'d> {
    spi: EpdSpi<'d>,
    dc: PinDriver<'d, AnyOutputPin, Output>,
    rst: PinDriver<'d, AnyOutputPin, Output>,
    busy: PinDriver<'d, AnyInputPin, Input>,
    frame: FrameBuffer,
    /// Controller RAM as of the last refresh, in panel polarity.
    shown: Option<Vec<u8>>,
}

impl<'d> Epd<'d> {
    pub fn new(
        spi: EpdSpi<'d>,
        dc: PinDriver<'d, AnyOutputPin, Output>,
        rst: PinDriver<'d, AnyOutputPin, Output>,
        busy: PinDriver<'d, AnyInputPin, Input>,
    ) -> Self {
        Self {
            spi,
            dc,
            rst,
            busy,
            frame: FrameBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            shown: None,
        }
    }

    /// Hardware reset and controller setup for a 200x200 window.
    pub fn init(&mut self) -> anyhow::Result<()> {
        self.rst.set_low()?;
        FreeRtos::delay_ms(10);
        self.rst.set_high()?;
        FreeRtos::delay_ms(10);

        self.command(CMD_SW_RESET, &[])?;
        self.wait_idle()?;

        let last_line = (SCREEN_HEIGHT - 1) as u16;
        let [line_lo, line_hi] = last_line.to_le_bytes();
        let last_col_byte = (SCREEN_WIDTH / 8 - 1) as u8;

        self.command(CMD_DRIVER_OUTPUT, &[line_lo, line_hi, 0x00])?;
        self.command(CMD_DATA_ENTRY_MODE, &[0x03])?; // X+, Y+
        self.command(CMD_RAM_X_RANGE, &[0x00, last_col_byte])?;
        self.command(CMD_RAM_Y_RANGE, &[0x00, 0x00, line_lo, line_hi])?;
        self.command(CMD_BORDER, &[0x05])?;
        self.command(CMD_TEMP_SENSOR, &[0x80])?; // internal sensor
        self.wait_idle()?;

        log::info!("E-paper initialised ({}x{})", SCREEN_WIDTH, SCREEN_HEIGHT);
        Ok(())
    }

    fn command(&mut self, cmd: u8, data: &[u8]) -> anyhow::Result<()> {
        self.dc.set_low()?;
        self.spi.write(&[cmd])?;
        if !data.is_empty() {
            self.dc.set_high()?;
            self.spi.write(data)?;
        }
        Ok(())
    }

    /// BUSY is high while the controller works.
    fn wait_idle(&self) -> anyhow::Result<()> {
        let start = Instant::now();
        let timeout = Duration::from_millis(EPD_BUSY_TIMEOUT_MS);
        while self.busy.is_high() {
            if start.elapsed() > timeout {
                bail!("E-paper busy for more than {} ms", EPD_BUSY_TIMEOUT_MS);
            }
            FreeRtos::delay_ms(5);
        }
        Ok(())
    }

    fn reset_ram_cursor(&mut self) -> anyhow::Result<()> {
        self.command(CMD_RAM_X_COUNTER, &[0x00])?;
        self.command(CMD_RAM_Y_COUNTER, &[0x00, 0x00])
    }

    fn write_ram(&mut self, cmd: u8, bytes: &[u8]) -> anyhow::Result<()> {
        self.reset_ram_cursor()?;
        self.command(cmd, bytes)
    }
}

impl OriginDimensions for Epd<'_> {
    fn size(&self) -> Size {
        self.frame.size()
    }
}

impl DrawTarget for Epd<'_> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.frame.draw_iter(pixels)
    }
}

impl PanelTarget for Epd<'_> {
    fn is_buffered(&self) -> bool {
        true
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        // Controller RAM uses 1 = white.
        let image: Vec<u8> = self.frame.as_bytes().iter().map(|b| !b).collect();
        debug_assert_eq!(image.len(), DISPLAY_BUFFER_SIZE);

        match self.shown.take() {
            Some(previous) if previous == image => {
                self.shown = Some(previous);
                return Ok(());
            }
            Some(previous) => {
                self.write_ram(CMD_WRITE_RAM_PREVIOUS, &previous)?;
                self.write_ram(CMD_WRITE_RAM_BW, &image)?;
                self.command(CMD_UPDATE_CONTROL_2, &[UPDATE_PARTIAL])?;
            }
            None => {
                self.write_ram(CMD_WRITE_RAM_PREVIOUS, &image)?;
                self.write_ram(CMD_WRITE_RAM_BW, &image)?;
                self.command(CMD_UPDATE_CONTROL_2, &[UPDATE_FULL])?;
            }
        }
        self.command(CMD_MASTER_ACTIVATION, &[])?;
        self.wait_idle()?;
        self.shown = Some(image);
        Ok(())
    }
}
