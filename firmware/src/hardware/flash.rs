//! W25Q256JV QSPI bring-up into memory-mapped read mode.
//!
//! The font blob is pre-flashed with STM32CubeProgrammer; at runtime the
//! flash is strictly read-only. Once the QUADSPI peripheral is switched to
//! memory-mapped mode the whole device appears as a byte-addressable window
//! at 0x9000_0000 and the font engine reads it through a bounds-checked
//! `SliceFlash` view.

use embassy_stm32::mode::Blocking;
use embassy_stm32::peripherals::QUADSPI;
use embassy_stm32::qspi::enums::{DummyCycles, QspiWidth};
use embassy_stm32::qspi::{Qspi, TransferConfig};
use font_engine::SliceFlash;

/// AHB address of the QUADSPI memory-mapped window.
pub const MEMORY_MAP_BASE: u32 = 0x9000_0000;

/// W25Q256JV capacity.
pub const FLASH_SIZE: usize = 32 * 1024 * 1024;

/// Blob placement inside the flash device (merged_fonts.bin burn address).
pub const FONT_BLOB_BASE: u32 = 0x01D0_0000;

/// Write Enable.
const CMD_WRITE_ENABLE: u8 = 0x06;

/// Write Status Register-2 (QE bit lives here).
const CMD_WRITE_SR2: u8 = 0x31;

/// Fast Read Quad Output with 4-byte address, needed past the 16 MiB line.
const CMD_FAST_READ_QUAD_4B: u8 = 0x6C;

/// Owns the QSPI peripheral for the lifetime of the mapped window.
pub struct FlashWindow {
    _qspi: Qspi<'static, QUADSPI, Blocking>,
}

impl FlashWindow {
    /// Set the QE bit and switch the peripheral into memory-mapped quad
    /// read mode. After this returns, the window never leaves read mode.
    pub fn new(mut qspi: Qspi<'static, QUADSPI, Blocking>) -> Self {
        let write_enable = TransferConfig {
            iwidth: QspiWidth::SING,
            awidth: QspiWidth::NONE,
            dwidth: QspiWidth::NONE,
            instruction: CMD_WRITE_ENABLE,
            address: None,
            dummy: DummyCycles::_0,
        };
        qspi.blocking_command(write_enable);

        let quad_enable = TransferConfig {
            iwidth: QspiWidth::SING,
            awidth: QspiWidth::NONE,
            dwidth: QspiWidth::SING,
            instruction: CMD_WRITE_SR2,
            address: None,
            dummy: DummyCycles::_0,
        };
        qspi.blocking_write(&[0x02], quad_enable);

        let read_config = TransferConfig {
            iwidth: QspiWidth::SING,
            awidth: QspiWidth::SING,
            dwidth: QspiWidth::QUAD,
            instruction: CMD_FAST_READ_QUAD_4B,
            address: Some(0),
            dummy: DummyCycles::_8,
        };
        qspi.enable_memory_map(&read_config);

        defmt::info!(
            "QSPI memory-mapped window active at 0x{:08X} ({} MiB)",
            MEMORY_MAP_BASE,
            FLASH_SIZE / (1024 * 1024)
        );
        Self { _qspi: qspi }
    }

    /// Bounds-checked view of the mapped flash contents.
    pub fn view(&self) -> SliceFlash<'static> {
        // The window is valid for as long as the peripheral stays in
        // memory-mapped mode, which `FlashWindow` guarantees by owning it.
        let window =
            unsafe { core::slice::from_raw_parts(MEMORY_MAP_BASE as *const u8, FLASH_SIZE) };
        SliceFlash::new(window)
    }
}
