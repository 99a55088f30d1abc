//! Leading-byte classification of mixed-script input.
//!
//! Input text freely mixes single-byte ASCII with one non-ASCII track chosen
//! at runtime: legacy GB2312/GBK double-byte pairs or UTF-8 sequences. The
//! blob carries index tables for both tracks; the mode only selects how the
//! dispatcher consumes non-ASCII bytes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TextEncoding {
    /// Non-ASCII bytes form big-endian GBK pairs.
    Gb2312,
    /// Non-ASCII bytes form UTF-8 sequences.
    Utf8,
}

/// Encoding-specific lookup key for one logical character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    /// Directly addressed in the ASCII region, bypassing the index tables.
    Ascii(u8),
    /// Big-endian 16-bit GBK code, resolved through the GB2312 table.
    Gb2312(u16),
    /// Raw UTF-8 byte sequence, resolved through the UTF-8 table. Unused
    /// tail bytes are zero.
    Utf8 { len: u8, bytes: [u8; 4] },
}

/// First byte of the GBK double-byte lead range.
const GBK_LEAD_FIRST: u8 = 0x81;

/// Last byte of the GBK double-byte lead range.
const GBK_LEAD_LAST: u8 = 0xFE;

/// Classify the next character of `input` and report how many bytes it
/// consumed.
///
/// Malformed input never faults: an undecodable lead byte is consumed as a
/// single opaque byte whose key cannot match any populated table record, so
/// rendering stays resilient and simply skips it. Truncated multi-byte
/// sequences consume what remains. An empty slice consumes nothing.
pub fn classify(mode: TextEncoding, input: &[u8]) -> (Key, usize) {
    let Some(&lead) = input.first() else {
        return (Key::Ascii(0), 0);
    };

    if lead & 0x80 == 0 {
        return (Key::Ascii(lead), 1);
    }

    match mode {
        TextEncoding::Gb2312 => {
            if (GBK_LEAD_FIRST..=GBK_LEAD_LAST).contains(&lead) {
                if let Some(&trail) = input.get(1) {
                    return (Key::Gb2312(u16::from_be_bytes([lead, trail])), 2);
                }
            }
            // Invalid lead or truncated pair. Valid GBK trail bytes are
            // >= 0x40, so a key with a zero low byte can never match.
            (Key::Gb2312((lead as u16) << 8), 1)
        }
        TextEncoding::Utf8 => {
            let want = match lead {
                0xC0..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF7 => 4,
                // Stray continuation byte or invalid lead: one opaque byte.
                _ => 1,
            };
            let take = want.min(input.len());
            let mut bytes = [0u8; 4];
            bytes[..take].copy_from_slice(&input[..take]);
            (Key::Utf8 { len: take as u8, bytes }, take)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_consumes_one_byte() {
        assert_eq!(
            classify(TextEncoding::Utf8, b"A"),
            (Key::Ascii(0x41), 1)
        );
        assert_eq!(
            classify(TextEncoding::Gb2312, b"1xyz"),
            (Key::Ascii(0x31), 1)
        );
    }

    #[test]
    fn gbk_pair_forms_big_endian_key() {
        // GBK for U+4F60 (ni3).
        assert_eq!(
            classify(TextEncoding::Gb2312, &[0xC4, 0xE3]),
            (Key::Gb2312(0xC4E3), 2)
        );
    }

    #[test]
    fn utf8_lengths_follow_lead_byte_patterns() {
        // UTF-8 for U+4F60.
        assert_eq!(
            classify(TextEncoding::Utf8, &[0xE4, 0xBD, 0xA0]),
            (
                Key::Utf8 { len: 3, bytes: [0xE4, 0xBD, 0xA0, 0x00] },
                3
            )
        );
        assert_eq!(
            classify(TextEncoding::Utf8, &[0xC2, 0xA9]),
            (Key::Utf8 { len: 2, bytes: [0xC2, 0xA9, 0x00, 0x00] }, 2)
        );
        assert_eq!(
            classify(TextEncoding::Utf8, &[0xF0, 0x9F, 0x98, 0x80]),
            (
                Key::Utf8 { len: 4, bytes: [0xF0, 0x9F, 0x98, 0x80] },
                4
            )
        );
    }

    #[test]
    fn malformed_bytes_are_consumed_singly() {
        // Stray UTF-8 continuation byte.
        assert_eq!(
            classify(TextEncoding::Utf8, &[0xBD, 0x41]),
            (Key::Utf8 { len: 1, bytes: [0xBD, 0, 0, 0] }, 1)
        );
        // Byte below the GBK lead range.
        assert_eq!(
            classify(TextEncoding::Gb2312, &[0x80, 0x41]),
            (Key::Gb2312(0x8000), 1)
        );
    }

    #[test]
    fn truncated_sequences_consume_the_remainder() {
        assert_eq!(
            classify(TextEncoding::Utf8, &[0xE4, 0xBD]),
            (Key::Utf8 { len: 2, bytes: [0xE4, 0xBD, 0, 0] }, 2)
        );
        assert_eq!(
            classify(TextEncoding::Gb2312, &[0xC4]),
            (Key::Gb2312(0xC400), 1)
        );
        assert_eq!(classify(TextEncoding::Utf8, b""), (Key::Ascii(0), 0));
    }
}
