/// Errors surfaced by font lookups and rendering.
///
/// Per-character conditions (`GlyphNotFound`) are absorbed by the text layout
/// engine and never abort a draw call; the remaining variants are caller or
/// environment errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The write-flag magic at the fixed blob offset did not match: the font
    /// blob was never flashed. Permanent for this session.
    NotFlashed,
    /// The key is absent from its index table, or the character has no entry
    /// in the ASCII region header. Recoverable; rendering skips the character.
    GlyphNotFound,
    /// Requested font size is not one of 12/16/20/24/32. Rejected before any
    /// flash access.
    UnsupportedFontSize(u8),
    /// A read would have crossed the end of the flash window. Indicates a
    /// corrupt header or a misconfigured blob base, never performed.
    OutOfBounds,
    /// The pixel sink rejected a window or pixel write.
    Sink,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::NotFlashed => write!(f, "font blob not flashed"),
            Error::GlyphNotFound => write!(f, "glyph not found"),
            Error::UnsupportedFontSize(px) => write!(f, "unsupported font size {}px", px),
            Error::OutOfBounds => write!(f, "read outside flash window"),
            Error::Sink => write!(f, "pixel sink write failed"),
        }
    }
}
