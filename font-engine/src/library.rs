//! Blob validation and glyph lookup orchestration.

use crate::encoding::Key;
use crate::error::Error;
use crate::flash::FlashRead;
use crate::glyph::{ascii_glyph_span, cjk_glyph_address, read_glyph, AsciiHeader, Glyph};
use crate::layout::{BlobLayout, FontSize, FLAG_MAGIC, GB2312_TABLE_MAGIC, REGION_MAGIC, UTF8_TABLE_MAGIC};
use crate::table::{read_table_header, resolve_gb2312, resolve_utf8, TableHeader};

/// Headers cached by a successful [`FontLibrary::init`].
#[derive(Debug, Clone, Copy)]
struct BlobIndex {
    gb2312: TableHeader,
    utf8: TableHeader,
    ascii: AsciiHeader,
    size_flags: [bool; 5],
}

/// Read-only view of the flashed font blob.
///
/// Holds the flash reader, the blob base offset and the headers cached at
/// init. Validation is a one-shot gate: if the write-flag magic does not
/// match, `init` fails and every later lookup reports "not found" without
/// touching flash again. There is no retry for this boot.
pub struct FontLibrary<F> {
    flash: F,
    base: u32,
    layout: &'static BlobLayout,
    index: Option<BlobIndex>,
}

impl<F: FlashRead> FontLibrary<F> {
    /// Wrap a flash window whose blob starts `base` bytes in. No flash is
    /// touched until [`init`](Self::init).
    pub fn new(flash: F, base: u32) -> Self {
        Self {
            flash,
            base,
            layout: &crate::layout::LAYOUT_V1,
            index: None,
        }
    }

    /// Validate the blob and cache its headers.
    ///
    /// Checks the write-flag magic, then reads and magic-checks both index
    /// table headers and the ASCII region header.
    pub fn init(&mut self) -> Result<(), Error> {
        let flag_base = self.base + self.layout.write_flag;
        if self.flash.read_u32_le(flag_base)? != FLAG_MAGIC {
            return Err(Error::NotFlashed);
        }
        let mut flag_bytes = [0u8; 5];
        self.flash.read(flag_base + 4, &mut flag_bytes)?;

        let gb2312 = read_table_header(
            &self.flash,
            self.base + self.layout.gb2312_table,
            GB2312_TABLE_MAGIC,
        )?;
        let utf8 = read_table_header(
            &self.flash,
            self.base + self.layout.utf8_table,
            UTF8_TABLE_MAGIC,
        )?;
        let ascii = AsciiHeader::read(&self.flash, self.base + self.layout.ascii_region)?;

        self.index = Some(BlobIndex {
            gb2312,
            utf8,
            ascii,
            size_flags: flag_bytes.map(|b| b == 1),
        });
        Ok(())
    }

    /// Whether init succeeded this session.
    pub fn is_ready(&self) -> bool {
        self.index.is_some()
    }

    /// Whether the blob generator finished writing this size: its flag byte
    /// is set and the region header carries the font magic.
    pub fn is_size_flashed(&self, size: FontSize) -> bool {
        let Some(index) = &self.index else {
            return false;
        };
        if !index.size_flags[size.slot()] {
            return false;
        }
        let region = self.base + self.layout.area(size).offset;
        matches!(self.flash.read_u32_le(region), Ok(magic) if magic == REGION_MAGIC)
    }

    /// Resolve an encoding key to its global glyph index.
    ///
    /// ASCII keys bypass the index tables; they have no glyph index.
    pub fn resolve(&self, key: Key) -> Result<Option<u16>, Error> {
        let index = self.index.as_ref().ok_or(Error::GlyphNotFound)?;
        match key {
            Key::Ascii(_) => Ok(None),
            Key::Gb2312(code) => resolve_gb2312(
                &self.flash,
                self.base + self.layout.gb2312_table,
                &index.gb2312,
                code,
            ),
            Key::Utf8 { len, bytes } => resolve_utf8(
                &self.flash,
                self.base + self.layout.utf8_table,
                &index.utf8,
                len,
                &bytes,
            ),
        }
    }

    /// Absolute flash offset and length of a CJK glyph bitmap.
    pub fn cjk_address(&self, index: u16, size: FontSize) -> Result<(u32, usize), Error> {
        let (rel, len) = cjk_glyph_address(self.layout, size, index)?;
        Ok((self.base + rel, len))
    }

    /// Fetch a CJK glyph bitmap by its global index.
    pub fn cjk_glyph(&self, index: u16, size: FontSize) -> Result<Glyph, Error> {
        if self.index.is_none() {
            return Err(Error::GlyphNotFound);
        }
        let (offset, len) = self.cjk_address(index, size)?;
        let px = size.pixels();
        read_glyph(&self.flash, offset, len, px, px)
    }

    /// Fetch an ASCII glyph bitmap by character code.
    pub fn ascii_glyph(&self, code: u8, size: FontSize) -> Result<Glyph, Error> {
        let index = self.index.as_ref().ok_or(Error::GlyphNotFound)?;
        let font = index.ascii.font(size).ok_or(Error::GlyphNotFound)?;
        let (rel, len) = ascii_glyph_span(self.layout.ascii_region, font, code)?;
        read_glyph(
            &self.flash,
            self.base + rel,
            len,
            font.width as u8,
            font.height as u8,
        )
    }

    /// Resolve a key and fetch its bitmap at `size`.
    pub fn glyph(&self, key: Key, size: FontSize) -> Result<Glyph, Error> {
        match key {
            Key::Ascii(code) => self.ascii_glyph(code, size),
            _ => {
                let index = self.resolve(key)?.ok_or(Error::GlyphNotFound)?;
                self.cjk_glyph(index, size)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blobgen::BlobBuilder;
    use crate::encoding::{classify, TextEncoding};
    use crate::flash::SliceFlash;

    fn fixture() -> std::vec::Vec<u8> {
        let mut builder = BlobBuilder::new();
        // U+4F60 under both encodings, sharing glyph index 100.
        builder.gb2312_table(&[(0xC4E3, 100)]);
        builder.utf8_table(&[(&[0xE4, 0xBD, 0xA0], 100)]);
        builder.cjk_glyph(FontSize::Px16, 100, &[0x55; 32]);
        builder.ascii_glyph(FontSize::Px16, b'A', &[0x81; 16]);
        builder.finish()
    }

    #[test]
    fn init_fails_on_missing_flag_magic() {
        let blob = std::vec![0xFFu8; crate::layout::BLOB_SIZE as usize];
        let mut library = FontLibrary::new(SliceFlash::new(&blob), 0);
        assert_eq!(library.init(), Err(Error::NotFlashed));
        assert!(!library.is_ready());
    }

    #[test]
    fn lookups_before_successful_init_read_as_not_found() {
        let blob = fixture();
        let library = FontLibrary::new(SliceFlash::new(&blob), 0);
        assert_eq!(
            library.glyph(Key::Gb2312(0xC4E3), FontSize::Px16).unwrap_err(),
            Error::GlyphNotFound
        );
        assert_eq!(library.resolve(Key::Gb2312(0xC4E3)).unwrap_err(), Error::GlyphNotFound);
    }

    #[test]
    fn both_encodings_resolve_one_character_to_one_glyph() {
        let blob = fixture();
        let mut library = FontLibrary::new(SliceFlash::new(&blob), 0);
        library.init().unwrap();

        let (gbk_key, n) = classify(TextEncoding::Gb2312, &[0xC4, 0xE3]);
        assert_eq!(n, 2);
        let (utf8_key, n) = classify(TextEncoding::Utf8, &[0xE4, 0xBD, 0xA0]);
        assert_eq!(n, 3);

        let via_gbk = library.resolve(gbk_key).unwrap().unwrap();
        let via_utf8 = library.resolve(utf8_key).unwrap().unwrap();
        assert_eq!(via_gbk, via_utf8);
        // Same index means the same physical bitmap address at any size.
        assert_eq!(
            library.cjk_address(via_gbk, FontSize::Px16).unwrap(),
            library.cjk_address(via_utf8, FontSize::Px16).unwrap()
        );
        assert_eq!(
            library.glyph(gbk_key, FontSize::Px16).unwrap(),
            library.glyph(utf8_key, FontSize::Px16).unwrap()
        );
    }

    #[test]
    fn ascii_bypasses_the_index_tables() {
        let blob = fixture();
        let mut library = FontLibrary::new(SliceFlash::new(&blob), 0);
        library.init().unwrap();
        assert_eq!(library.resolve(Key::Ascii(b'A')).unwrap(), None);
        let glyph = library.glyph(Key::Ascii(b'A'), FontSize::Px16).unwrap();
        assert_eq!((glyph.width, glyph.height), (8, 16));
        assert_eq!(glyph.data.as_slice(), &[0x81; 16]);
    }

    #[test]
    fn per_size_flags_gate_is_size_flashed() {
        let blob = fixture();
        let mut library = FontLibrary::new(SliceFlash::new(&blob), 0);
        assert!(!library.is_size_flashed(FontSize::Px16));
        library.init().unwrap();
        assert!(library.is_size_flashed(FontSize::Px16));
        assert!(library.is_size_flashed(FontSize::Px32));
    }

    #[test]
    fn nonzero_blob_base_shifts_every_address() {
        let inner = fixture();
        let mut blob = std::vec![0u8; 0x100];
        blob.extend_from_slice(&inner);
        let mut library = FontLibrary::new(SliceFlash::new(&blob), 0x100);
        library.init().unwrap();
        let glyph = library.glyph(Key::Gb2312(0xC4E3), FontSize::Px16).unwrap();
        assert_eq!(glyph.data.as_slice(), &[0x55; 32]);
    }
}
