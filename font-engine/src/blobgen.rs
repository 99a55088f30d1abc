//! Host-side fixture blob builder.
//!
//! Produces byte images matching [`LAYOUT_V1`](crate::layout::LAYOUT_V1),
//! used by the unit tests and by the `make_test_blob` tool to generate a
//! small flashable image. The real production blob comes from the offline
//! font generator; this builder only mirrors its layout.

use std::vec;
use std::vec::Vec;

use crate::layout::{
    FontSize, ASCII_FIRST_CHAR, ASCII_MAGIC, BLOB_SIZE, FLAG_MAGIC, GB2312_TABLE_CAPACITY,
    GB2312_TABLE_MAGIC, GLYPH_SLOTS, LAYOUT_V1, REGION_HEADER_LEN, REGION_MAGIC,
    UTF8_TABLE_CAPACITY, UTF8_TABLE_MAGIC,
};

/// Byte offset of the first record behind each table header.
const TABLE_DATA_OFFSET: u32 = 32;

/// Builds a complete blob image in memory, starting from erased flash
/// (0xFF fill) so unwritten table tails read as sentinels.
pub struct BlobBuilder {
    data: Vec<u8>,
}

impl BlobBuilder {
    /// Start a blob with valid headers everywhere and no glyphs or table
    /// entries.
    pub fn new() -> Self {
        let mut builder = Self { data: vec![0xFF; BLOB_SIZE as usize] };
        builder.write_flag();
        builder.write_region_headers();
        builder.table_header(LAYOUT_V1.gb2312_table, GB2312_TABLE_MAGIC, GB2312_TABLE_CAPACITY);
        builder.table_header(LAYOUT_V1.utf8_table, UTF8_TABLE_MAGIC, UTF8_TABLE_CAPACITY);
        builder.write_ascii_header();
        builder
    }

    /// Overwrite raw bytes at a blob-relative offset.
    pub fn write_at(&mut self, offset: u32, bytes: &[u8]) {
        let start = offset as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    fn write_u32_le(&mut self, offset: u32, value: u32) {
        self.write_at(offset, &value.to_le_bytes());
    }

    fn write_flag(&mut self) {
        let base = LAYOUT_V1.write_flag;
        self.write_u32_le(base, FLAG_MAGIC);
        self.write_at(base + 4, &[1, 1, 1, 1, 1, 0, 0, 0]);
    }

    fn write_region_headers(&mut self) {
        for area in LAYOUT_V1.font_areas {
            self.write_u32_le(area.offset, REGION_MAGIC);
            self.write_u32_le(area.offset + 4, GLYPH_SLOTS as u32);
            self.write_at(area.offset + 8, &[0; 24]);
        }
    }

    fn table_header(&mut self, base: u32, magic: u32, char_count: u32) {
        self.write_u32_le(base, magic);
        self.write_u32_le(base + 4, char_count);
        self.write_u32_le(base + 8, TABLE_DATA_OFFSET);
        self.write_u32_le(base + 12, 0);
    }

    fn write_ascii_header(&mut self) {
        let base = LAYOUT_V1.ascii_region;
        self.write_u32_le(base, ASCII_MAGIC);
        self.write_u32_le(base + 4, 5);
        let mut data_offset = 8 + 5 * 16;
        for (i, size) in FontSize::ALL.iter().enumerate() {
            let width = size.ascii_width() as u32;
            let height = size.pixels() as u32;
            let stride = (width + 7) / 8 * height;
            let total = 95 * stride;
            let record = base + 8 + i as u32 * 16;
            self.write_u32_le(record, data_offset);
            self.write_u32_le(record + 4, total);
            self.write_at(record + 8, &(width as u16).to_le_bytes());
            self.write_at(record + 10, &(height as u16).to_le_bytes());
            self.write_at(record + 12, &[0; 4]);
            data_offset += total;
        }
    }

    /// Populate the GB2312 table with `(gbk_code, glyph_index)` records,
    /// sentinel-terminated.
    pub fn gb2312_table(&mut self, entries: &[(u16, u16)]) {
        let data = LAYOUT_V1.gb2312_table + TABLE_DATA_OFFSET;
        for (i, (key, index)) in entries.iter().enumerate() {
            let record = data + i as u32 * 4;
            self.write_at(record, &key.to_le_bytes());
            self.write_at(record + 2, &index.to_le_bytes());
        }
        self.write_at(data + entries.len() as u32 * 4, &[0xFF; 4]);
    }

    /// Lay down a GB2312 table with an explicit `char_count` and no
    /// sentinel, for record-bound tests.
    pub fn gb2312_table_raw(&mut self, char_count: u32, entries: &[(u16, u16)]) {
        self.table_header(LAYOUT_V1.gb2312_table, GB2312_TABLE_MAGIC, char_count);
        let data = LAYOUT_V1.gb2312_table + TABLE_DATA_OFFSET;
        for (i, (key, index)) in entries.iter().enumerate() {
            let record = data + i as u32 * 4;
            self.write_at(record, &key.to_le_bytes());
            self.write_at(record + 2, &index.to_le_bytes());
        }
    }

    /// Populate the UTF-8 table with `(utf8_bytes, glyph_index)` records,
    /// sentinel-terminated.
    pub fn utf8_table(&mut self, entries: &[(&[u8], u16)]) {
        let data = LAYOUT_V1.utf8_table + TABLE_DATA_OFFSET;
        for (i, (bytes, index)) in entries.iter().enumerate() {
            let record = data + i as u32 * 8;
            let mut padded = [0u8; 4];
            padded[..bytes.len()].copy_from_slice(bytes);
            self.write_at(record, &[bytes.len() as u8]);
            self.write_at(record + 1, &padded);
            self.write_at(record + 5, &index.to_le_bytes());
            self.write_at(record + 7, &[0]);
        }
        self.write_at(data + entries.len() as u32 * 8, &[0xFF; 8]);
    }

    /// Store a CJK glyph bitmap at `index` in the given size region.
    pub fn cjk_glyph(&mut self, size: FontSize, index: u16, bitmap: &[u8]) {
        assert!(index < GLYPH_SLOTS);
        assert_eq!(bitmap.len(), size.bytes_per_glyph() as usize);
        let offset =
            LAYOUT_V1.area(size).offset + REGION_HEADER_LEN + index as u32 * size.bytes_per_glyph();
        self.write_at(offset, bitmap);
    }

    /// Store an ASCII glyph bitmap for character `code` at the given size.
    pub fn ascii_glyph(&mut self, size: FontSize, code: u8, bitmap: &[u8]) {
        let width = size.ascii_width() as u32;
        let height = size.pixels() as u32;
        let stride = (width + 7) / 8 * height;
        assert_eq!(bitmap.len(), stride as usize);

        let mut data_offset = 8 + 5 * 16;
        for s in FontSize::ALL {
            let s_stride = (s.ascii_width() as u32 + 7) / 8 * s.pixels() as u32;
            if s == size {
                break;
            }
            data_offset += 95 * s_stride;
        }
        let offset = LAYOUT_V1.ascii_region
            + data_offset
            + (code - ASCII_FIRST_CHAR) as u32 * stride;
        self.write_at(offset, bitmap);
    }

    /// Hand over the finished image.
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

impl Default for BlobBuilder {
    fn default() -> Self {
        Self::new()
    }
}
