//! Glyph addressing and bitmap fetch.
//!
//! CJK glyphs are addressed arithmetically: every size region is a dense
//! array of fixed-stride bitmaps behind a 32-byte header, so
//! `offset = area + header + index * stride` with no per-glyph metadata.
//! ASCII glyphs live in their own region whose header describes one
//! `{offset, size, width, height}` record per font size; they are addressed
//! directly by character code.

use heapless::Vec;

use crate::error::Error;
use crate::flash::FlashRead;
use crate::layout::{
    BlobLayout, FontSize, ASCII_FIRST_CHAR, ASCII_LAST_CHAR, ASCII_MAGIC, GLYPH_SLOTS,
    REGION_HEADER_LEN,
};

/// Largest glyph bitmap in the blob (32x32 CJK).
pub const MAX_GLYPH_BYTES: usize = 128;

/// One monochrome glyph bitmap: row-major, MSB-first, rows padded to whole
/// bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub width: u8,
    pub height: u8,
    pub data: Vec<u8, MAX_GLYPH_BYTES>,
}

/// One per-size record from the ASCII region header.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiFontInfo {
    /// Data offset relative to the region header start.
    pub offset: u32,
    /// Total bytes of glyph data for this size.
    pub size: u32,
    pub width: u16,
    pub height: u16,
}

/// Cached ASCII region header: `{u32 magic, u32 num_fonts, 5 x info}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiHeader {
    fonts: [AsciiFontInfo; 5],
    num_fonts: u32,
}

impl AsciiHeader {
    /// Read and magic-check the ASCII region header at `base`.
    pub fn read(flash: &impl FlashRead, base: u32) -> Result<Self, Error> {
        if flash.read_u32_le(base)? != ASCII_MAGIC {
            return Err(Error::NotFlashed);
        }
        let num_fonts = flash.read_u32_le(base + 4)?.min(5);
        let mut fonts = [AsciiFontInfo::default(); 5];
        for (i, font) in fonts.iter_mut().enumerate().take(num_fonts as usize) {
            let record = base + 8 + i as u32 * 16;
            *font = AsciiFontInfo {
                offset: flash.read_u32_le(record)?,
                size: flash.read_u32_le(record + 4)?,
                width: flash.read_u16_le(record + 8)?,
                height: flash.read_u16_le(record + 10)?,
            };
        }
        Ok(Self { fonts, num_fonts })
    }

    /// Find the record whose glyph height matches `size`.
    pub fn font(&self, size: FontSize) -> Option<&AsciiFontInfo> {
        self.fonts[..self.num_fonts as usize]
            .iter()
            .find(|f| f.height == size.pixels() as u16)
    }
}

/// Absolute-in-blob offset and length of a CJK glyph bitmap.
///
/// Linear in the glyph index; indices at or beyond the slot count read as
/// "not found" rather than addressing past the region.
pub fn cjk_glyph_address(
    layout: &BlobLayout,
    size: FontSize,
    index: u16,
) -> Result<(u32, usize), Error> {
    if index >= GLYPH_SLOTS {
        return Err(Error::GlyphNotFound);
    }
    let stride = size.bytes_per_glyph();
    let offset = layout.area(size).offset + REGION_HEADER_LEN + index as u32 * stride;
    Ok((offset, stride as usize))
}

/// Offset (relative to the blob base) and length of an ASCII glyph bitmap.
///
/// The stride comes from the header's width/height record; codes outside
/// the printable range or past the recorded data size are "not found".
pub fn ascii_glyph_span(
    ascii_region: u32,
    font: &AsciiFontInfo,
    code: u8,
) -> Result<(u32, usize), Error> {
    if !(ASCII_FIRST_CHAR..=ASCII_LAST_CHAR).contains(&code) {
        return Err(Error::GlyphNotFound);
    }
    let stride = (font.width as u32 + 7) / 8 * font.height as u32;
    let rel = (code - ASCII_FIRST_CHAR) as u32 * stride;
    if rel + stride > font.size {
        return Err(Error::GlyphNotFound);
    }
    Ok((ascii_region + font.offset + rel, stride as usize))
}

/// Read a glyph bitmap of `len` bytes at `offset` into a bounded buffer.
pub fn read_glyph(
    flash: &impl FlashRead,
    offset: u32,
    len: usize,
    width: u8,
    height: u8,
) -> Result<Glyph, Error> {
    let mut data: Vec<u8, MAX_GLYPH_BYTES> = Vec::new();
    data.resize(len.min(MAX_GLYPH_BYTES), 0)
        .map_err(|_| Error::OutOfBounds)?;
    flash.read(offset, &mut data)?;
    Ok(Glyph { width, height, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blobgen::BlobBuilder;
    use crate::flash::SliceFlash;
    use crate::layout::LAYOUT_V1;

    #[test]
    fn cjk_addresses_are_linear_in_glyph_index() {
        for size in FontSize::ALL {
            let stride = size.bytes_per_glyph();
            for i in [0u16, 1, 100, GLYPH_SLOTS - 2] {
                let (a, _) = cjk_glyph_address(&LAYOUT_V1, size, i).unwrap();
                let (b, _) = cjk_glyph_address(&LAYOUT_V1, size, i + 1).unwrap();
                assert_eq!(b - a, stride);
            }
        }
    }

    #[test]
    fn first_glyph_sits_right_behind_the_region_header() {
        let (offset, len) = cjk_glyph_address(&LAYOUT_V1, FontSize::Px16, 0).unwrap();
        assert_eq!(offset, LAYOUT_V1.area(FontSize::Px16).offset + REGION_HEADER_LEN);
        assert_eq!(len, 32);
    }

    #[test]
    fn out_of_range_indices_read_as_not_found() {
        assert_eq!(
            cjk_glyph_address(&LAYOUT_V1, FontSize::Px12, GLYPH_SLOTS),
            Err(Error::GlyphNotFound)
        );
    }

    #[test]
    fn ascii_header_round_trips_through_the_fixture() {
        let blob = BlobBuilder::new().finish();
        let flash = SliceFlash::new(&blob);
        let header = AsciiHeader::read(&flash, LAYOUT_V1.ascii_region).unwrap();
        let font = header.font(FontSize::Px16).unwrap();
        assert_eq!(font.width, 8);
        assert_eq!(font.height, 16);
        let (offset, len) = ascii_glyph_span(LAYOUT_V1.ascii_region, font, b'A').unwrap();
        assert_eq!(len, 16);
        assert_eq!(
            offset,
            LAYOUT_V1.ascii_region + font.offset + (b'A' - 0x20) as u32 * 16
        );
    }

    #[test]
    fn non_printable_codes_have_no_ascii_glyph() {
        let blob = BlobBuilder::new().finish();
        let flash = SliceFlash::new(&blob);
        let header = AsciiHeader::read(&flash, LAYOUT_V1.ascii_region).unwrap();
        let font = header.font(FontSize::Px12).unwrap();
        assert_eq!(
            ascii_glyph_span(LAYOUT_V1.ascii_region, font, 0x1F),
            Err(Error::GlyphNotFound)
        );
        assert_eq!(
            ascii_glyph_span(LAYOUT_V1.ascii_region, font, 0x7F),
            Err(Error::GlyphNotFound)
        );
    }

    #[test]
    fn glyph_bytes_come_back_verbatim() {
        let mut builder = BlobBuilder::new();
        let bitmap = [0xAAu8; 32];
        builder.cjk_glyph(FontSize::Px16, 5, &bitmap);
        let blob = builder.finish();
        let flash = SliceFlash::new(&blob);
        let (offset, len) = cjk_glyph_address(&LAYOUT_V1, FontSize::Px16, 5).unwrap();
        let glyph = read_glyph(&flash, offset, len, 16, 16).unwrap();
        assert_eq!(glyph.data.as_slice(), &bitmap);
    }
}
