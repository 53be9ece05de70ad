//! Windows 2.0 raster font (`.fnt`) writer.
//!
//! The file is a 118 byte header, a table of `(width, offset)` pairs with one entry
//! per glyph plus a sentinel, the glyph bitmaps and the NUL terminated face name. Each
//! glyph bitmap is stored column by column: all rows of the first 8 pixel column, then
//! all rows of the next one. Offsets in the table are absolute 16 bit file offsets,
//! which is what limits the total size of a font.

use thiserror::Error;

use crate::font::{Expanded, Font};

pub const HEADER_SIZE: usize = 118;

const VERSION: u16 = 0x0200;
const COPYRIGHT_SIZE: usize = 60;
const RESOLUTION: u16 = 96;
const WEIGHT_NORMAL: u16 = 400;
const WEIGHT_BOLD: u16 = 700;
const MAX_GLYPHS: usize = 256;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("a font must have between 1 and 256 glyphs, found {0}")]
    GlyphCount(usize),
    #[error("last character code {0} is above 255")]
    MaxChar(u32),
    #[error("glyph data offset {0} does not fit in 16 bits")]
    DataOffset(usize),
}

/// Font family class stored in the high nibble of the pitch and family byte.
#[derive(clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    #[default]
    DontCare,
    Roman,
    Swiss,
    Modern,
    Script,
    Decorative,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Options {
    /// Windows character set id.
    pub charset: u8,
    /// Code of the first glyph, guessed from the glyph count when absent.
    pub min_char: Option<u8>,
    pub family: Family,
}

/// Code of the first glyph when the caller did not choose one.
///
/// Glyph counts of the common code page layouts map to their usual first code, any
/// other font starts at the code of its first glyph.
fn default_min_char(font: &Font<Expanded>) -> u32 {
    match font.chars.len() {
        256 | 128 => 0,
        224 | 96 | 95 => 0x20,
        _ => font.chars.first().map_or(0, |c| c.code.max(0) as u32),
    }
}

/// Serializes an expanded font. Every limit is checked before the first byte is
/// produced.
pub fn encode(font: &Font<Expanded>, options: &Options) -> Result<Vec<u8>, Error> {
    let count = font.chars.len();
    if count == 0 || count > MAX_GLYPHS {
        return Err(Error::GlyphCount(count));
    }

    let first_char = options
        .min_char
        .map_or_else(|| default_min_char(font), u32::from);
    let last_char = first_char + count as u32 - 1;
    if last_char > 0xFF {
        return Err(Error::MaxChar(last_char));
    }

    let height = font.bbx.height.max(0) as usize;

    let glyph_bytes: usize = font.chars.iter().map(|c| c.row_size()).sum();
    // pads the bitmap width to an even number of bytes
    let sentinel_bytes = if glyph_bytes % 2 == 1 { 1 } else { 2 };
    // at most 256 glyphs of 64 row bytes
    let width_bytes = glyph_bytes + sentinel_bytes;
    debug_assert!(width_bytes <= 0xFFFF);

    let bits_offset = HEADER_SIZE + (count + 1) * 4;
    let mut offsets = Vec::with_capacity(count + 1);
    let mut offset = bits_offset;
    for c in &font.chars {
        offsets.push(offset);
        offset += c.row_size() * height;
    }
    offsets.push(offset);
    if offset > 0xFFFF {
        return Err(Error::DataOffset(offset));
    }

    let face_offset = offset + sentinel_bytes * height;
    let family_name = font.family_name();
    let file_size = face_offset + family_name.len() + 1;

    let metrics = &font.stage.metrics;
    let proportional = metrics.proportional();
    let first = first_char as u8;
    let break_char = if (first_char..=last_char).contains(&0x20) {
        (0x20 - first_char) as u8
    } else {
        0
    };
    let default_char = font
        .position(font.default_code)
        .map_or(break_char, |i| i as u8);

    let mut copyright = font.props.get_str("COPYRIGHT").unwrap_or_default();
    copyright.resize(COPYRIGHT_SIZE, 0);

    let mut data = Vec::with_capacity(file_size);

    // Header (118 bytes)
    data.extend_from_slice(&VERSION.to_le_bytes());
    data.extend_from_slice(&(file_size as u32).to_le_bytes());
    data.extend_from_slice(&copyright);
    data.extend_from_slice(&0u16.to_le_bytes()); // type: raster
    data.extend_from_slice(&(((height * 72 + 48) / 96) as u16).to_le_bytes()); // points
    data.extend_from_slice(&RESOLUTION.to_le_bytes()); // vertical
    data.extend_from_slice(&RESOLUTION.to_le_bytes()); // horizontal
    data.extend_from_slice(&(font.bbx.ascent().max(0) as u16).to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes()); // internal leading
    data.extend_from_slice(&0u16.to_le_bytes()); // external leading
    data.push(font.is_italic() as u8);
    data.push(0); // underline
    data.push(0); // strikeout
    let weight = if font.is_bold() { WEIGHT_BOLD } else { WEIGHT_NORMAL };
    data.extend_from_slice(&weight.to_le_bytes());
    data.push(options.charset);
    let pixel_width = if proportional { 0 } else { metrics.max_width as u16 };
    data.extend_from_slice(&pixel_width.to_le_bytes());
    data.extend_from_slice(&(height as u16).to_le_bytes());
    data.push((options.family as u8) << 4 | proportional as u8);
    data.extend_from_slice(&(metrics.avg_width as u16).to_le_bytes());
    data.extend_from_slice(&(metrics.max_width as u16).to_le_bytes());
    data.push(first);
    data.push(last_char as u8);
    data.push(default_char);
    data.push(break_char);
    data.extend_from_slice(&(width_bytes as u16).to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes()); // device name
    data.extend_from_slice(&(face_offset as u32).to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes()); // bits pointer, set when loaded
    data.extend_from_slice(&(bits_offset as u32).to_le_bytes());
    data.push(0); // reserved
    debug_assert_eq!(data.len(), HEADER_SIZE);

    // Glyph table
    let widths = font.chars.iter().map(|c| c.bbx.width as u16);
    let sentinel_width = (sentinel_bytes * 8) as u16;
    for (width, &offset) in widths.chain([sentinel_width]).zip(&offsets) {
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&(offset as u16).to_le_bytes());
    }

    // Glyph data, one 8 pixel column after the other
    for c in &font.chars {
        let size = c.row_size();
        for column in 0..size {
            data.extend(c.data.iter().skip(column).step_by(size));
        }
    }
    data.resize(data.len() + sentinel_bytes * height, 0);

    data.extend_from_slice(family_name);
    data.push(0);
    debug_assert_eq!(data.len(), file_size);

    debug!(
        "FNT with chars {first_char}..={last_char}, {width_bytes} width bytes, {file_size} bytes"
    );

    Ok(data)
}
