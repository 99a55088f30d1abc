//! Text layout and glyph rasterization.
//!
//! The renderer owns the render state (colors, size, direction, numeric
//! fill mode) and drives the lookup pipeline over an arbitrary byte buffer,
//! streaming each glyph cell into a [`PixelSink`]. The cursor is transient
//! per call; nothing but the explicit setters mutates state between calls.

use core::fmt::Write as _;

use embedded_graphics::pixelcolor::Rgb565;
use heapless::{String, Vec};

use crate::encoding::{classify, Key, TextEncoding};
use crate::error::Error;
use crate::flash::FlashRead;
use crate::glyph::Glyph;
use crate::layout::FontSize;
use crate::library::FontLibrary;

/// Destination pixel window, provided by the display collaborator.
///
/// The contract is the panel's native drawing model: select an addressable
/// rectangle, then stream pixels into it row-major.
pub trait PixelSink {
    type Error;

    /// Select the addressable window for subsequent pixel writes.
    fn set_window(&mut self, x: u16, y: u16, width: u16, height: u16)
        -> Result<(), Self::Error>;

    /// Stream pixels into the current window, row-major.
    fn push_pixels(&mut self, pixels: &[Rgb565]) -> Result<(), Self::Error>;
}

/// Display orientation. Landscape orientations swap the usable width and
/// height consulted by line-wrap logic; panel scan direction itself is the
/// display driver's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Portrait,
    PortraitFlipped,
    Landscape,
    LandscapeFlipped,
}

/// Fill mode for fixed-width numeric display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NumMode {
    FillZero,
    FillSpace,
}

/// Common 24-bit colors, converted on use by [`TextRenderer::set_color`].
pub mod colors {
    pub const WHITE: u32 = 0xFFFFFF;
    pub const BLACK: u32 = 0x000000;
    pub const BLUE: u32 = 0x0000FF;
    pub const GREEN: u32 = 0x00FF00;
    pub const RED: u32 = 0xFF0000;
    pub const CYAN: u32 = 0x00FFFF;
    pub const MAGENTA: u32 = 0xFF00FF;
    pub const YELLOW: u32 = 0xFFFF00;
    pub const GREY: u32 = 0x2C2C2C;
}

/// Convert 24-bit RGB888 to the panel's RGB565 by taking the top 5/6/5 bits.
pub fn rgb888_to_565(rgb: u32) -> Rgb565 {
    Rgb565::new(
        ((rgb >> 19) & 0x1F) as u8,
        ((rgb >> 10) & 0x3F) as u8,
        ((rgb >> 3) & 0x1F) as u8,
    )
}

/// Caller-visible render state, mutated only through the renderer setters.
#[derive(Debug, Clone, Copy)]
pub struct RenderState {
    pub foreground: Rgb565,
    pub background: Rgb565,
    pub size: FontSize,
    pub direction: Direction,
    pub num_mode: NumMode,
    pub encoding: TextEncoding,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            foreground: rgb888_to_565(colors::WHITE),
            background: rgb888_to_565(colors::BLACK),
            size: FontSize::Px16,
            direction: Direction::Portrait,
            num_mode: NumMode::FillSpace,
            encoding: TextEncoding::Utf8,
        }
    }
}

/// Mixed-script text renderer over a flashed font blob.
pub struct TextRenderer<F> {
    library: FontLibrary<F>,
    state: RenderState,
    panel_width: u16,
    panel_height: u16,
    on_missing: Option<fn(Key)>,
}

impl<F: FlashRead> TextRenderer<F> {
    /// Wrap a font library for a panel of `width` x `height` pixels
    /// (portrait-native dimensions).
    pub fn new(library: FontLibrary<F>, width: u16, height: u16) -> Self {
        Self {
            library,
            state: RenderState::default(),
            panel_width: width,
            panel_height: height,
            on_missing: None,
        }
    }

    pub fn library(&self) -> &FontLibrary<F> {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut FontLibrary<F> {
        &mut self.library
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Select the text font by pixel size; matching ASCII glyphs follow
    /// automatically.
    pub fn set_text_font(&mut self, px: u8) -> Result<(), Error> {
        self.state.size = FontSize::from_pixels(px)?;
        Ok(())
    }

    pub fn font_size(&self) -> u8 {
        self.state.size.pixels()
    }

    /// Set the pen color from a 24-bit RGB888 value.
    pub fn set_color(&mut self, rgb: u32) {
        self.state.foreground = rgb888_to_565(rgb);
    }

    /// Set the background color from a 24-bit RGB888 value.
    pub fn set_background_color(&mut self, rgb: u32) {
        self.state.background = rgb888_to_565(rgb);
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.state.direction = direction;
    }

    pub fn set_num_mode(&mut self, mode: NumMode) {
        self.state.num_mode = mode;
    }

    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.state.encoding = encoding;
    }

    /// Install a handler invoked for every character whose glyph lookup
    /// fails. Defaults to none; the failing character is skipped either way.
    pub fn set_missing_glyph_handler(&mut self, handler: Option<fn(Key)>) {
        self.on_missing = handler;
    }

    /// Usable width/height under the current orientation.
    fn usable_size(&self) -> (u16, u16) {
        match self.state.direction {
            Direction::Portrait | Direction::PortraitFlipped => {
                (self.panel_width, self.panel_height)
            }
            Direction::Landscape | Direction::LandscapeFlipped => {
                (self.panel_height, self.panel_width)
            }
        }
    }

    /// Horizontal advance of one character cell: CJK glyphs are square,
    /// ASCII glyphs half-width. Applied whether or not the glyph resolves,
    /// so a missing character leaves column alignment intact.
    fn cell_width(&self, key: Key) -> u16 {
        match key {
            Key::Ascii(_) => self.state.size.ascii_width() as u16,
            _ => self.state.size.pixels() as u16,
        }
    }

    /// Draw a text buffer starting at `(x, y)`, returning the final cursor.
    ///
    /// Characters wrap to the left margin before a glyph would cross the
    /// usable width; `\n` forces a wrap, `\r` is consumed silently. Lookup
    /// failures skip the glyph but never abort the call, and no scrolling
    /// happens when the cursor leaves the bottom edge; that is the
    /// caller's responsibility.
    pub fn draw_text<D: PixelSink>(
        &mut self,
        sink: &mut D,
        x: u16,
        y: u16,
        text: &[u8],
    ) -> Result<(u16, u16), Error> {
        let (usable_width, _) = self.usable_size();
        let line_height = self.state.size.pixels() as u16;
        let mut cursor_x = x;
        let mut cursor_y = y;
        let mut rest = text;

        while let Some(&byte) = rest.first() {
            if byte == b'\n' {
                cursor_x = 0;
                cursor_y += line_height;
                rest = &rest[1..];
                continue;
            }
            if byte == b'\r' {
                rest = &rest[1..];
                continue;
            }

            let (key, consumed) = classify(self.state.encoding, rest);
            if consumed == 0 {
                break;
            }
            rest = &rest[consumed..];

            let advance = self.cell_width(key);
            if cursor_x as u32 + advance as u32 > usable_width as u32 {
                cursor_x = 0;
                cursor_y += line_height;
            }

            match self.library.glyph(key, self.state.size) {
                Ok(glyph) => self.blit(sink, cursor_x, cursor_y, &glyph)?,
                Err(Error::GlyphNotFound) => {
                    if let Some(handler) = self.on_missing {
                        handler(key);
                    }
                }
                Err(e) => return Err(e),
            }
            cursor_x += advance;
        }

        Ok((cursor_x, cursor_y))
    }

    /// Draw the first character of `text` at `(x, y)` without wrap logic;
    /// returns its horizontal advance.
    pub fn draw_char<D: PixelSink>(
        &mut self,
        sink: &mut D,
        x: u16,
        y: u16,
        text: &[u8],
    ) -> Result<u16, Error> {
        let (key, consumed) = classify(self.state.encoding, text);
        if consumed == 0 {
            return Ok(0);
        }
        match self.library.glyph(key, self.state.size) {
            Ok(glyph) => self.blit(sink, x, y, &glyph)?,
            Err(Error::GlyphNotFound) => {
                if let Some(handler) = self.on_missing {
                    handler(key);
                }
            }
            Err(e) => return Err(e),
        }
        Ok(self.cell_width(key))
    }

    /// Draw a right-aligned integer padded to `width` digits with the
    /// current fill mode.
    pub fn draw_number<D: PixelSink>(
        &mut self,
        sink: &mut D,
        x: u16,
        y: u16,
        number: i32,
        width: u8,
    ) -> Result<(u16, u16), Error> {
        let mut digits: String<12> = String::new();
        let _ = write!(digits, "{}", number.unsigned_abs());
        let padded = pad_left(&digits, number < 0, width as usize, self.state.num_mode);
        self.draw_text(sink, x, y, padded.as_bytes())
    }

    /// Draw a fixed-point decimal padded to `width` characters with `decs`
    /// fractional digits.
    pub fn draw_decimals<D: PixelSink>(
        &mut self,
        sink: &mut D,
        x: u16,
        y: u16,
        number: f64,
        width: u8,
        decs: u8,
    ) -> Result<(u16, u16), Error> {
        let mut digits: String<20> = String::new();
        let _ = write!(digits, "{:.prec$}", if number < 0.0 { -number } else { number }, prec = decs as usize);
        let padded = pad_left(&digits, number < 0.0, width as usize, self.state.num_mode);
        self.draw_text(sink, x, y, padded.as_bytes())
    }

    /// Paint one glyph cell: set the window once, then stream rows. Set
    /// bits take the foreground color, clear bits the background, so the
    /// cell is fully opaque.
    fn blit<D: PixelSink>(
        &self,
        sink: &mut D,
        x: u16,
        y: u16,
        glyph: &Glyph,
    ) -> Result<(), Error> {
        sink.set_window(x, y, glyph.width as u16, glyph.height as u16)
            .map_err(|_| Error::Sink)?;
        let row_bytes = (glyph.width as usize + 7) / 8;
        let mut row: Vec<Rgb565, 32> = Vec::new();
        for r in 0..glyph.height as usize {
            row.clear();
            for c in 0..glyph.width as usize {
                let byte = glyph.data.get(r * row_bytes + c / 8).copied().unwrap_or(0);
                let lit = (byte >> (7 - (c % 8))) & 1 != 0;
                let _ = row.push(if lit {
                    self.state.foreground
                } else {
                    self.state.background
                });
            }
            sink.push_pixels(&row).map_err(|_| Error::Sink)?;
        }
        Ok(())
    }
}

/// Right-align `digits` into `width` characters, keeping the sign ahead of
/// zero fill.
fn pad_left(digits: &str, negative: bool, width: usize, mode: NumMode) -> String<24> {
    let body = digits.len() + negative as usize;
    let pad = width.min(24).saturating_sub(body);
    let mut out: String<24> = String::new();
    match mode {
        NumMode::FillSpace => {
            for _ in 0..pad {
                let _ = out.push(' ');
            }
            if negative {
                let _ = out.push('-');
            }
        }
        NumMode::FillZero => {
            if negative {
                let _ = out.push('-');
            }
            for _ in 0..pad {
                let _ = out.push('0');
            }
        }
    }
    let _ = out.push_str(digits);
    out
}
