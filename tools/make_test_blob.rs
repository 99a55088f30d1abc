//! Fixture font blob generator.
//!
//! Builds a small but fully valid font blob image for bench-testing a
//! freshly assembled board: headers, write flag, both index tables and a
//! handful of procedurally drawn glyphs at every size. Burn the output to
//! the font blob address (0x1D00000 by default) with STM32CubeProgrammer.
//! The production blob comes from the offline font generator; this one only
//! exercises the pipeline.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use font_engine::blobgen::BlobBuilder;
use font_engine::layout::{FontSize, BLOB_SIZE};

#[derive(Parser)]
#[command(about = "Generate a fixture font blob image for bench flashing")]
struct Args {
    /// Output image path
    #[arg(short, long, default_value = "merged_fonts.bin")]
    output: PathBuf,
}

/// Characters carried by the fixture, with their GBK pairs, UTF-8 bytes and
/// assigned glyph indices.
const FIXTURE_CHARS: &[(u16, &[u8], u16)] = &[
    (0xC4E3, &[0xE4, 0xBD, 0xA0], 0), // 你
    (0xBAC3, &[0xE5, 0xA5, 0xBD], 1), // 好
    (0xD6D0, &[0xE4, 0xB8, 0xAD], 2), // 中
    (0xCEC4, &[0xE6, 0x96, 0x87], 3), // 文
];

/// A border-plus-diagonal test pattern: visibly distinct per glyph slot and
/// orientation-revealing on screen.
fn cjk_pattern(size: FontSize, slot: u16) -> Vec<u8> {
    let px = size.pixels() as usize;
    let row_bytes = (px + 7) / 8;
    let mut bitmap = vec![0u8; size.bytes_per_glyph() as usize];
    let mut set = |x: usize, y: usize| {
        bitmap[y * row_bytes + x / 8] |= 0x80 >> (x % 8);
    };
    for i in 0..px {
        set(i, 0);
        set(i, px - 1);
        set(0, i);
        set(px - 1, i);
        set(i, i);
    }
    // One notch per slot along the top edge, so slots are tellable apart.
    for n in 0..=(slot as usize).min(px - 3) {
        set(n + 1, 2);
    }
    bitmap
}

fn ascii_pattern(size: FontSize, code: u8) -> Vec<u8> {
    let width = size.ascii_width() as usize;
    let height = size.pixels() as usize;
    let row_bytes = (width + 7) / 8;
    let mut bitmap = vec![0u8; row_bytes * height];
    for y in 0..height {
        for x in 0..width {
            // Checkerboard phase-shifted by character code.
            if (x + y + code as usize) % 2 == 0 {
                bitmap[y * row_bytes + x / 8] |= 0x80 >> (x % 8);
            }
        }
    }
    bitmap
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = BlobBuilder::new();
    builder.gb2312_table(
        &FIXTURE_CHARS
            .iter()
            .map(|(gbk, _, index)| (*gbk, *index))
            .collect::<Vec<_>>(),
    );
    builder.utf8_table(
        &FIXTURE_CHARS
            .iter()
            .map(|(_, utf8, index)| (*utf8, *index))
            .collect::<Vec<_>>(),
    );

    for size in FontSize::ALL {
        for (_, _, index) in FIXTURE_CHARS {
            builder.cjk_glyph(size, *index, &cjk_pattern(size, *index));
        }
        for code in 0x20..=0x7E {
            builder.ascii_glyph(size, code, &ascii_pattern(size, code));
        }
    }

    let blob = builder.finish();
    fs::write(&args.output, &blob)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!("Generated {}", args.output.display());
    println!("Size: {} bytes (blob footprint 0x{:X})", blob.len(), BLOB_SIZE);
    println!(
        "Contents: {} CJK chars x 5 sizes, full ASCII range, both index tables",
        FIXTURE_CHARS.len()
    );
    Ok(())
}
