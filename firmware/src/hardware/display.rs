//! ST7789 TFT panel manager (240x320, RGB565 over SPI).
//!
//! Exposes exactly what the text pipeline consumes: an addressable window
//! plus a pixel stream. Commands and pixel data go out over blocking SPI
//! writes; only the reset sequence needs timed delays.

use embassy_stm32::gpio::Output;
use embassy_stm32::mode::Blocking;
use embassy_stm32::spi::Spi;
use embassy_time::Timer;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use font_engine::{Direction, PixelSink};
use heapless::Vec;

/// Panel resolution in portrait orientation.
pub const PANEL_WIDTH: u16 = 240;
pub const PANEL_HEIGHT: u16 = 320;

const CMD_SLEEP_OUT: u8 = 0x11;
const CMD_NORMAL_MODE: u8 = 0x13;
const CMD_INVERSION_ON: u8 = 0x21;
const CMD_DISPLAY_ON: u8 = 0x29;
const CMD_COLUMN_ADDR: u8 = 0x2A;
const CMD_ROW_ADDR: u8 = 0x2B;
const CMD_MEMORY_WRITE: u8 = 0x2C;
const CMD_MADCTL: u8 = 0x36;
const CMD_PIXEL_FORMAT: u8 = 0x3A;

/// SPI bytes streamed per chunk while filling regions.
const FILL_CHUNK: usize = 512;

pub struct DisplayManager {
    spi: Spi<'static, Blocking>,
    cs: Output<'static>,
    dc: Output<'static>,
    rst: Output<'static>,
    backlight: Output<'static>,
}

impl DisplayManager {
    pub fn new(
        spi: Spi<'static, Blocking>,
        cs: Output<'static>,
        dc: Output<'static>,
        rst: Output<'static>,
        backlight: Output<'static>,
    ) -> Self {
        Self { spi, cs, dc, rst, backlight }
    }

    /// Hardware reset and ST7789 register bring-up; ends with the panel on
    /// and the backlight lit.
    pub async fn init(&mut self) -> Result<(), &'static str> {
        self.rst.set_low();
        Timer::after_millis(20).await;
        self.rst.set_high();
        Timer::after_millis(120).await;

        self.command(CMD_SLEEP_OUT)?;
        Timer::after_millis(120).await;

        self.command(CMD_MADCTL)?;
        self.data(&[0x00])?; // portrait
        self.command(CMD_PIXEL_FORMAT)?;
        self.data(&[0x55])?; // 16-bit RGB565
        self.command(CMD_INVERSION_ON)?;
        self.command(CMD_NORMAL_MODE)?;
        self.command(CMD_DISPLAY_ON)?;
        Timer::after_millis(20).await;

        self.backlight.set_high();
        defmt::info!("ST7789 initialized ({}x{})", PANEL_WIDTH, PANEL_HEIGHT);
        Ok(())
    }

    /// Point the panel scan direction at one of the four orientations.
    pub fn set_direction(&mut self, direction: Direction) -> Result<(), &'static str> {
        let madctl = match direction {
            Direction::Portrait => 0x00,
            Direction::PortraitFlipped => 0xC0,
            Direction::Landscape => 0x70,
            Direction::LandscapeFlipped => 0xA0,
        };
        self.command(CMD_MADCTL)?;
        self.data(&[madctl])
    }

    /// Fill the whole screen with one color.
    pub fn clear(&mut self, color: Rgb565) -> Result<(), &'static str> {
        self.fill_rect(0, 0, PANEL_WIDTH, PANEL_HEIGHT, color)
    }

    /// Fill a rectangle with one color.
    pub fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: Rgb565,
    ) -> Result<(), &'static str> {
        self.window(x, y, width, height)?;
        let raw = color.into_storage().to_be_bytes();
        let mut chunk: Vec<u8, FILL_CHUNK> = Vec::new();
        while chunk.len() + 2 <= FILL_CHUNK {
            let _ = chunk.extend_from_slice(&raw);
        }
        let mut remaining = width as usize * height as usize * 2;
        self.dc.set_high();
        self.cs.set_low();
        while remaining > 0 {
            let n = remaining.min(chunk.len());
            let result = self.spi.blocking_write(&chunk[..n]);
            if result.is_err() {
                self.cs.set_high();
                return Err("SPI write failed");
            }
            remaining -= n;
        }
        self.cs.set_high();
        Ok(())
    }

    fn window(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), &'static str> {
        let x2 = x + width - 1;
        let y2 = y + height - 1;
        self.command(CMD_COLUMN_ADDR)?;
        self.data(&[(x >> 8) as u8, x as u8, (x2 >> 8) as u8, x2 as u8])?;
        self.command(CMD_ROW_ADDR)?;
        self.data(&[(y >> 8) as u8, y as u8, (y2 >> 8) as u8, y2 as u8])?;
        self.command(CMD_MEMORY_WRITE)
    }

    fn command(&mut self, cmd: u8) -> Result<(), &'static str> {
        self.dc.set_low();
        self.cs.set_low();
        let result = self.spi.blocking_write(&[cmd]);
        self.cs.set_high();
        result.map_err(|_| "SPI command failed")
    }

    fn data(&mut self, bytes: &[u8]) -> Result<(), &'static str> {
        self.dc.set_high();
        self.cs.set_low();
        let result = self.spi.blocking_write(bytes);
        self.cs.set_high();
        result.map_err(|_| "SPI data failed")
    }
}

impl PixelSink for DisplayManager {
    type Error = &'static str;

    fn set_window(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), Self::Error> {
        self.window(x, y, width, height)
    }

    fn push_pixels(&mut self, pixels: &[Rgb565]) -> Result<(), Self::Error> {
        self.dc.set_high();
        self.cs.set_low();
        // Glyph rows are 32 pixels at most; chunk anything larger.
        for run in pixels.chunks(32) {
            let mut bytes: Vec<u8, 64> = Vec::new();
            for pixel in run {
                let _ = bytes.extend_from_slice(&pixel.into_storage().to_be_bytes());
            }
            if self.spi.blocking_write(&bytes).is_err() {
                self.cs.set_high();
                return Err("SPI pixel write failed");
            }
        }
        self.cs.set_high();
        Ok(())
    }
}
