//! Bounds-checked access to the flash window.
//!
//! The flash bus driver is an external collaborator; all this crate needs is
//! "read N bytes at offset X". [`SliceFlash`] covers the common case of a
//! memory-mapped read window exposed as a byte slice; anything else (a
//! command-mode SPI driver, a file image on the host) can implement
//! [`FlashRead`] directly.

use crate::error::Error;

/// Synchronous, read-only access to the flash device.
///
/// Reads block the caller for the bus transaction; there is no async
/// variant. Implementations must never read outside the window; a request
/// that would is answered with [`Error::OutOfBounds`] instead.
pub trait FlashRead {
    /// Fill `buf` with bytes starting at `offset`.
    fn read(&self, offset: u32, buf: &mut [u8]) -> Result<(), Error>;

    /// Size of the readable window in bytes.
    fn size(&self) -> u32;

    /// Read a little-endian `u16` at `offset`.
    fn read_u16_le(&self, offset: u32) -> Result<u16, Error> {
        let mut buf = [0u8; 2];
        self.read(offset, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Read a little-endian `u32` at `offset`.
    fn read_u32_le(&self, offset: u32) -> Result<u32, Error> {
        let mut buf = [0u8; 4];
        self.read(offset, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }
}

/// A flash window backed by a plain byte slice.
///
/// On target this wraps the memory-mapped QSPI window; in tests it wraps a
/// generated fixture blob. Every access is bounds-checked against the slice,
/// no pointer arithmetic escapes it.
#[derive(Clone, Copy)]
pub struct SliceFlash<'a> {
    window: &'a [u8],
}

impl<'a> SliceFlash<'a> {
    pub fn new(window: &'a [u8]) -> Self {
        Self { window }
    }
}

impl FlashRead for SliceFlash<'_> {
    fn read(&self, offset: u32, buf: &mut [u8]) -> Result<(), Error> {
        let start = offset as usize;
        let end = start.checked_add(buf.len()).ok_or(Error::OutOfBounds)?;
        let src = self.window.get(start..end).ok_or(Error::OutOfBounds)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn size(&self) -> u32 {
        self.window.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_within_window() {
        let data = [0x11, 0x22, 0x33, 0x44, 0x55];
        let flash = SliceFlash::new(&data);
        let mut buf = [0u8; 2];
        flash.read(1, &mut buf).unwrap();
        assert_eq!(buf, [0x22, 0x33]);
        assert_eq!(flash.size(), 5);
    }

    #[test]
    fn field_helpers_are_little_endian() {
        let data = [0x47, 0x41, 0x4C, 0x46, 0xCD, 0xAB];
        let flash = SliceFlash::new(&data);
        assert_eq!(flash.read_u32_le(0).unwrap(), 0x464C_4147);
        assert_eq!(flash.read_u16_le(4).unwrap(), 0xABCD);
    }

    #[test]
    fn out_of_range_reads_are_refused() {
        let data = [0u8; 8];
        let flash = SliceFlash::new(&data);
        let mut buf = [0u8; 4];
        assert_eq!(flash.read(6, &mut buf), Err(Error::OutOfBounds));
        assert_eq!(flash.read(u32::MAX, &mut buf), Err(Error::OutOfBounds));
        assert_eq!(flash.read_u16_le(7), Err(Error::OutOfBounds));
    }
}
