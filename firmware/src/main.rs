#![no_std]
#![no_main]

use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::qspi::enums::{
    AddressSize, ChipSelectHighTime, FIFOThresholdLevel, MemorySize,
};
use embassy_stm32::qspi::{Config as QspiConfig, Qspi};
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_time::{Duration, Timer};
use font_engine::render::{colors, rgb888_to_565};
use font_engine::{FontLibrary, Key, TextEncoding, TextRenderer};
use panic_probe as _;

mod hardware;

use hardware::display::{DisplayManager, PANEL_HEIGHT, PANEL_WIDTH};
use hardware::flash::{FlashWindow, FONT_BLOB_BASE};

fn log_missing_glyph(key: Key) {
    defmt::warn!("glyph not in blob: {}", key);
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    defmt::info!("STM32H750 Flash Font Viewer starting...");

    // Initialize STM32: 64 MHz HSI -> PLL1 -> 400 MHz sysclk
    let mut config = embassy_stm32::Config::default();
    {
        use embassy_stm32::rcc::*;
        config.rcc.hsi = Some(HSIPrescaler::DIV1);
        config.rcc.pll1 = Some(Pll {
            source: PllSource::HSI,
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL50,
            divp: Some(PllDiv::DIV2),
            divq: None,
            divr: None,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV2;
        config.rcc.apb1_pre = APBPrescaler::DIV2;
        config.rcc.apb2_pre = APBPrescaler::DIV2;
        config.rcc.apb3_pre = APBPrescaler::DIV2;
        config.rcc.apb4_pre = APBPrescaler::DIV2;
    }
    let p = embassy_stm32::init(config);
    defmt::info!("STM32H750VBT6 initialized");

    // SPI4 for the ST7789 panel
    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(50_000_000);
    let display_spi = Spi::new_blocking_txonly(p.SPI4, p.PE12, p.PE14, spi_config);

    let display_cs = Output::new(p.PE11, Level::High, Speed::VeryHigh);
    let display_dc = Output::new(p.PE13, Level::Low, Speed::VeryHigh);
    let display_rst = Output::new(p.PE10, Level::Low, Speed::High);
    let backlight = Output::new(p.PE15, Level::Low, Speed::Low);

    let mut display =
        DisplayManager::new(display_spi, display_cs, display_dc, display_rst, backlight);
    match display.init().await {
        Ok(()) => defmt::info!("Display initialized"),
        Err(e) => defmt::error!("Display initialization failed: {}", e),
    }
    display.clear(rgb888_to_565(colors::BLACK)).ok();

    // QUADSPI bank 1 for the W25Q256JV font flash
    let qspi_config = QspiConfig {
        memory_size: MemorySize::_32MiB,
        address_size: AddressSize::_32bit,
        prescaler: 1,
        fifo_threshold: FIFOThresholdLevel::_16Bytes,
        cs_high_time: ChipSelectHighTime::_5Cycle,
    };
    let qspi = Qspi::new_blocking_bank1(
        p.QUADSPI,
        p.PD11, // IO0
        p.PD12, // IO1
        p.PE2,  // IO2
        p.PD13, // IO3
        p.PB2,  // CLK
        p.PB6,  // NCS
        qspi_config,
    );
    let flash = FlashWindow::new(qspi);

    // Validate the pre-flashed font blob and build the renderer
    let mut library = FontLibrary::new(flash.view(), FONT_BLOB_BASE);
    match library.init() {
        Ok(()) => defmt::info!("Font blob validated at flash offset 0x{:08X}", FONT_BLOB_BASE),
        Err(e) => {
            defmt::error!("Font blob validation failed: {}", e);
            // Lookups now report "not found"; the demo keeps running and
            // simply draws nothing, which is the designed failure mode.
        }
    }
    let mut renderer = TextRenderer::new(library, PANEL_WIDTH, PANEL_HEIGHT);
    renderer.set_missing_glyph_handler(Some(log_missing_glyph));

    let screen_duration = Duration::from_millis(4000);
    let mut screen_index = 0u8;

    loop {
        match screen_index {
            // Screen 1/3: mixed UTF-8 text at several sizes
            0 => {
                defmt::info!("Screen 1/3: UTF-8 mixed text");
                display.clear(rgb888_to_565(colors::BLACK)).ok();
                renderer.set_encoding(TextEncoding::Utf8);

                renderer.set_text_font(24).ok();
                renderer.set_color(colors::WHITE);
                renderer.draw_text(&mut display, 10, 10, "反客科技STM32".as_bytes()).ok();

                renderer.set_text_font(16).ok();
                renderer.set_color(colors::CYAN);
                renderer.draw_text(&mut display, 10, 44, "Hello 世界!".as_bytes()).ok();

                renderer.set_color(colors::YELLOW);
                renderer
                    .draw_text(&mut display, 10, 66, "中英文混合显示 mixed text".as_bytes())
                    .ok();

                renderer.set_text_font(32).ok();
                renderer.set_color(colors::GREEN);
                renderer.draw_text(&mut display, 10, 92, "字库测试".as_bytes()).ok();
            }

            // Screen 2/3: the same characters through the GB2312 table
            1 => {
                defmt::info!("Screen 2/3: GB2312 text");
                display.clear(rgb888_to_565(colors::BLACK)).ok();
                renderer.set_encoding(TextEncoding::Gb2312);
                renderer.set_text_font(16).ok();
                renderer.set_color(colors::MAGENTA);
                // "你好" in GBK bytes
                renderer
                    .draw_text(&mut display, 10, 10, &[0xC4, 0xE3, 0xBA, 0xC3])
                    .ok();
                renderer.set_color(colors::WHITE);
                renderer.draw_text(&mut display, 10, 32, b"GB2312 table lookup").ok();
            }

            // Screen 3/3: numeric display
            2 => {
                defmt::info!("Screen 3/3: numbers");
                display.clear(rgb888_to_565(colors::BLACK)).ok();
                renderer.set_encoding(TextEncoding::Utf8);
                renderer.set_text_font(16).ok();
                renderer.set_color(colors::WHITE);
                renderer.draw_text(&mut display, 10, 10, b"Counters:").ok();
                renderer.set_num_mode(font_engine::NumMode::FillZero);
                renderer.set_color(colors::GREEN);
                renderer.draw_number(&mut display, 10, 32, 1234, 8).ok();
                renderer.set_num_mode(font_engine::NumMode::FillSpace);
                renderer.set_color(colors::CYAN);
                renderer.draw_decimals(&mut display, 10, 54, -3.14159, 10, 3).ok();
            }

            _ => {
                screen_index = 0;
                continue;
            }
        }

        Timer::after(screen_duration).await;
        screen_index = (screen_index + 1) % 3;
    }
}
