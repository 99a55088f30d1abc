//! Flash-resident bitmap font engine for mixed Chinese/Latin text.
//!
//! The font data lives in a single immutable blob on external serial flash,
//! pre-built by an offline tool and exposed to the device through a
//! byte-addressable memory-mapped window. This crate resolves GB2312, UTF-8
//! and ASCII input to glyph bitmaps inside that blob and rasterizes them
//! into a 16-bit color pixel window:
//!
//! ```text
//! TextRenderer -> classify -> index tables -> glyph address -> blit -> PixelSink
//! ```
//!
//! The crate is `no_std` by default; the `std` feature additionally enables
//! [`blobgen`], a fixture blob builder used by the unit tests and the
//! host-side `make_test_blob` tool.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod encoding;
pub mod error;
pub mod flash;
pub mod glyph;
pub mod layout;
pub mod library;
pub mod render;
pub mod table;

#[cfg(feature = "std")]
pub mod blobgen;

pub use encoding::{classify, Key, TextEncoding};
pub use error::Error;
pub use flash::{FlashRead, SliceFlash};
pub use glyph::Glyph;
pub use layout::{BlobLayout, FontSize, LAYOUT_V1};
pub use library::FontLibrary;
pub use render::{Direction, NumMode, PixelSink, RenderState, TextRenderer};
