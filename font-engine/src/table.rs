//! On-flash index tables mapping encoding keys to glyph indices.
//!
//! Both tables are ordered sequences of fixed-stride records terminated
//! early by a sentinel, with no sortedness or uniqueness guarantees from the
//! offline generator. Resolution is a sentinel-bounded linear scan with
//! first-match semantics, a deliberate simplicity/footprint trade-off for
//! edge-triggered text draws.

use crate::error::Error;
use crate::flash::FlashRead;
use crate::layout::{
    GB2312_RECORD_LEN, GB2312_TABLE_CAPACITY, SENTINEL_KEY, UTF8_RECORD_LEN, UTF8_TABLE_CAPACITY,
};

/// Cached index-table header: `{u32 magic, u32 char_count, u32 data_offset,
/// u32 reserved}`.
#[derive(Debug, Clone, Copy)]
pub struct TableHeader {
    pub char_count: u32,
    pub data_offset: u32,
}

/// Read and magic-check a table header at `base`.
pub fn read_table_header(
    flash: &impl FlashRead,
    base: u32,
    expected_magic: u32,
) -> Result<TableHeader, Error> {
    if flash.read_u32_le(base)? != expected_magic {
        return Err(Error::NotFlashed);
    }
    Ok(TableHeader {
        char_count: flash.read_u32_le(base + 4)?,
        data_offset: flash.read_u32_le(base + 8)?,
    })
}

/// Resolve a big-endian GBK key to its glyph index.
///
/// Scans `{u16 key, u16 glyph_index}` records from the table's data start,
/// stopping at the 0xFFFF sentinel or the record bound, whichever comes
/// first. A corrupt `char_count` is clamped to the table capacity so the
/// scan can never leave the allocated region.
pub fn resolve_gb2312(
    flash: &impl FlashRead,
    base: u32,
    header: &TableHeader,
    key: u16,
) -> Result<Option<u16>, Error> {
    let count = header.char_count.min(GB2312_TABLE_CAPACITY);
    let data = base + header.data_offset;
    for i in 0..count {
        let record = data + i * GB2312_RECORD_LEN;
        let entry_key = flash.read_u16_le(record)?;
        if entry_key == SENTINEL_KEY {
            break;
        }
        if entry_key == key {
            return Ok(Some(flash.read_u16_le(record + 2)?));
        }
    }
    Ok(None)
}

/// Resolve a raw UTF-8 byte sequence to its glyph index.
///
/// Records are `{u8 len, u8 bytes[4], u16 glyph_index, u8 reserved}`; a
/// record matches only on equal length and equal bytes up to that length. A
/// 0xFF length byte (the erased-flash fill) is the sentinel.
pub fn resolve_utf8(
    flash: &impl FlashRead,
    base: u32,
    header: &TableHeader,
    len: u8,
    bytes: &[u8; 4],
) -> Result<Option<u16>, Error> {
    let count = header.char_count.min(UTF8_TABLE_CAPACITY);
    let data = base + header.data_offset;
    let mut record = [0u8; UTF8_RECORD_LEN as usize];
    for i in 0..count {
        flash.read(data + i * UTF8_RECORD_LEN, &mut record)?;
        if record[0] == 0xFF {
            break;
        }
        let n = len as usize;
        if record[0] == len && n <= 4 && record[1..1 + n] == bytes[..n] {
            return Ok(Some(u16::from_le_bytes([record[5], record[6]])));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blobgen::BlobBuilder;
    use crate::flash::SliceFlash;
    use crate::layout::{GB2312_TABLE_MAGIC, LAYOUT_V1, UTF8_TABLE_MAGIC};

    fn fixture() -> std::vec::Vec<u8> {
        let mut builder = BlobBuilder::new();
        builder.gb2312_table(&[(0xC4E3, 100), (0xBAC3, 200), (0xD6D0, 300)]);
        builder.utf8_table(&[
            (&[0xE4, 0xBD, 0xA0], 100),
            (&[0xE5, 0xA5, 0xBD], 200),
            (&[0xC2, 0xA9], 400),
        ]);
        builder.finish()
    }

    #[test]
    fn present_gbk_keys_resolve_to_recorded_indices() {
        let blob = fixture();
        let flash = SliceFlash::new(&blob);
        let header =
            read_table_header(&flash, LAYOUT_V1.gb2312_table, GB2312_TABLE_MAGIC).unwrap();
        assert_eq!(
            resolve_gb2312(&flash, LAYOUT_V1.gb2312_table, &header, 0xC4E3).unwrap(),
            Some(100)
        );
        assert_eq!(
            resolve_gb2312(&flash, LAYOUT_V1.gb2312_table, &header, 0xD6D0).unwrap(),
            Some(300)
        );
    }

    #[test]
    fn absent_keys_miss_regardless_of_sentinel_position() {
        let blob = fixture();
        let flash = SliceFlash::new(&blob);
        let header =
            read_table_header(&flash, LAYOUT_V1.gb2312_table, GB2312_TABLE_MAGIC).unwrap();
        // Key greater than every populated entry: the scan runs into the
        // sentinel before it could match.
        assert_eq!(
            resolve_gb2312(&flash, LAYOUT_V1.gb2312_table, &header, 0xFEFE).unwrap(),
            None
        );
        // Key smaller than the first entry: misses on content, not position.
        assert_eq!(
            resolve_gb2312(&flash, LAYOUT_V1.gb2312_table, &header, 0x8140).unwrap(),
            None
        );
    }

    #[test]
    fn utf8_match_requires_equal_bytes_not_just_length() {
        let blob = fixture();
        let flash = SliceFlash::new(&blob);
        let header = read_table_header(&flash, LAYOUT_V1.utf8_table, UTF8_TABLE_MAGIC).unwrap();
        assert_eq!(
            resolve_utf8(&flash, LAYOUT_V1.utf8_table, &header, 3, &[0xE4, 0xBD, 0xA0, 0]).unwrap(),
            Some(100)
        );
        // Same length, different content.
        assert_eq!(
            resolve_utf8(&flash, LAYOUT_V1.utf8_table, &header, 3, &[0xE4, 0xBD, 0xA1, 0]).unwrap(),
            None
        );
        // Same leading bytes, different length.
        assert_eq!(
            resolve_utf8(&flash, LAYOUT_V1.utf8_table, &header, 2, &[0xE4, 0xBD, 0, 0]).unwrap(),
            None
        );
    }

    #[test]
    fn scan_stops_at_the_record_bound_without_a_sentinel() {
        let mut builder = BlobBuilder::new();
        // Announce two records but lay down three valid-looking ones and no
        // sentinel: the third must be unreachable.
        builder.gb2312_table_raw(2, &[(0xB0A1, 1), (0xB0A2, 2), (0xB0A3, 3)]);
        let blob = builder.finish();
        let flash = SliceFlash::new(&blob);
        let header =
            read_table_header(&flash, LAYOUT_V1.gb2312_table, GB2312_TABLE_MAGIC).unwrap();
        assert_eq!(
            resolve_gb2312(&flash, LAYOUT_V1.gb2312_table, &header, 0xB0A2).unwrap(),
            Some(2)
        );
        assert_eq!(
            resolve_gb2312(&flash, LAYOUT_V1.gb2312_table, &header, 0xB0A3).unwrap(),
            None
        );
    }

    #[test]
    fn duplicate_keys_resolve_to_the_first_record() {
        let mut builder = BlobBuilder::new();
        builder.gb2312_table(&[(0xC4E3, 7), (0xC4E3, 9)]);
        let blob = builder.finish();
        let flash = SliceFlash::new(&blob);
        let header =
            read_table_header(&flash, LAYOUT_V1.gb2312_table, GB2312_TABLE_MAGIC).unwrap();
        assert_eq!(
            resolve_gb2312(&flash, LAYOUT_V1.gb2312_table, &header, 0xC4E3).unwrap(),
            Some(7)
        );
    }

    #[test]
    fn fixture_tables_have_no_duplicate_keys() {
        // Conformance scan: first-match semantics are only trustworthy if
        // the generator emits each key once.
        let blob = fixture();
        let flash = SliceFlash::new(&blob);
        let header =
            read_table_header(&flash, LAYOUT_V1.gb2312_table, GB2312_TABLE_MAGIC).unwrap();
        let data = LAYOUT_V1.gb2312_table + header.data_offset;
        let mut seen = std::vec::Vec::new();
        for i in 0..header.char_count.min(GB2312_TABLE_CAPACITY) {
            let key = flash.read_u16_le(data + i * GB2312_RECORD_LEN).unwrap();
            if key == SENTINEL_KEY {
                break;
            }
            assert!(!seen.contains(&key), "duplicate key 0x{key:04X}");
            seen.push(key);
        }
        assert!(!seen.is_empty());
    }

    #[test]
    fn bad_table_magic_reads_as_not_flashed() {
        let blob = std::vec![0u8; 0x26_C000];
        let flash = SliceFlash::new(&blob);
        assert_eq!(
            read_table_header(&flash, LAYOUT_V1.gb2312_table, GB2312_TABLE_MAGIC).unwrap_err(),
            Error::NotFlashed
        );
    }
}
