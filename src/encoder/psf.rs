//! PC screen font writer.
//!
//! Three layouts share the same glyph data: raw (the glyph data alone), PSF1 (4 byte
//! header, 16 bit unicode table) and PSF2 (32 byte header, UTF-8 unicode table). Every
//! glyph is `height` rows of `ceil(width / 8)` bytes.

use thiserror::Error;

use crate::{
    font::{Char, Font, Packed},
    parser::extra::{Extras, NOT_A_CHAR, NO_CHAR},
};

const PSF1_MAGIC: [u8; 2] = [0x36, 0x04];
const PSF1_MODE512: u8 = 0x01;
const PSF1_MODEHASTAB: u8 = 0x02;
const PSF1_SEPARATOR: u16 = 0xFFFF;
const PSF1_MAX_CODE: u32 = 0xFFFF;

const PSF2_MAGIC: [u8; 4] = [0x72, 0xB5, 0x4A, 0x86];
const PSF2_HEADER_SIZE: u32 = 32;
const PSF2_HAS_UNICODE_TABLE: u32 = 0x01;
const PSF2_SEPARATOR: u8 = 0xFF;

/// Glyph code the VGA character ROM puts first.
const VGA_SIGNATURE: i32 = 0xA3;
/// Glyph counts and heights of fonts laid out like the VGA character ROM.
const VGA_GLYPHS: std::ops::RangeInclusive<usize> = 224..=512;
const VGA_HEIGHTS: [i32; 3] = [8, 14, 16];
/// Blocks swapped by the VGA exchange.
const VGA_CONTROL: usize = 0;
const VGA_LINE_DRAWING: usize = 192;
const VGA_BLOCK: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// Glyph data only.
    Raw,
    V1,
    V2,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Options {
    /// Picked from the font when absent: PSF1 if it can hold the font, else PSF2.
    pub version: Option<Version>,
    /// Swaps glyph blocks 0..32 and 192..224. Detected from the font when absent.
    pub exchange: Option<bool>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("font has no glyphs")]
    Empty,
    #[error("char {index}: width {width} differs from the first glyph's {expected}")]
    Width {
        index: usize,
        width: i32,
        expected: i32,
    },
    #[error("char {index}: FFFE cannot be a glyph code")]
    NotAChar { index: usize },
    #[error("PSF1 needs 256 or 512 glyphs, found {0}")]
    V1Count(usize),
    #[error("PSF1 needs 8 pixel wide glyphs, found {0}")]
    V1Width(i32),
    #[error("PSF1 glyphs are at most 255 rows, found {0}")]
    V1Height(i32),
    #[error("PSF1 codes are at most FFFF, found {0:X}")]
    V1Code(u32),
    #[error("VGA exchange needs at least 224 glyphs, found {0}")]
    Exchange(usize),
}

/// Serializes a packed font with the codes of `extras` added to its unicode table.
/// Every check happens before the first byte is produced.
pub fn encode(font: &Font<Packed>, extras: &Extras, options: &Options) -> Result<Vec<u8>, Error> {
    let first = font.chars.first().ok_or(Error::Empty)?;
    let width = first.bbx.width;
    let height = font.bbx.height;
    let count = font.chars.len();

    for (index, c) in font.chars.iter().enumerate() {
        if c.bbx.width != width {
            return Err(Error::Width {
                index,
                width: c.bbx.width,
                expected: width,
            });
        }
        if c.code as u32 == NOT_A_CHAR {
            return Err(Error::NotAChar { index });
        }
    }

    let version = match options.version {
        Some(Version::V1) => {
            check_v1(font, extras)?;
            Version::V1
        }
        Some(version) => version,
        None if check_v1(font, extras).is_ok() => Version::V1,
        None => Version::V2,
    };

    let exchange = match options.exchange {
        Some(true) if count < *VGA_GLYPHS.start() => return Err(Error::Exchange(count)),
        Some(exchange) => exchange,
        None => {
            VGA_GLYPHS.contains(&count)
                && width == 8
                && VGA_HEIGHTS.contains(&height)
                && first.code == VGA_SIGNATURE
        }
    };

    let mut order: Vec<usize> = (0..count).collect();
    if exchange {
        for i in 0..VGA_BLOCK {
            order.swap(VGA_CONTROL + i, VGA_LINE_DRAWING + i);
        }
    }
    let glyphs = order.iter().map(|&i| &font.chars[i]);

    let glyph_size = first.row_size() * height as usize;
    let mut data = Vec::with_capacity(32 + count * (glyph_size + 4));

    match version {
        Version::Raw => {}
        Version::V1 => {
            let mode = PSF1_MODEHASTAB | if count == 512 { PSF1_MODE512 } else { 0 };
            data.extend_from_slice(&PSF1_MAGIC);
            data.push(mode);
            data.push(height as u8);
        }
        Version::V2 => {
            // Header (32 bytes)
            data.extend_from_slice(&PSF2_MAGIC);
            data.extend_from_slice(&0u32.to_le_bytes()); // version
            data.extend_from_slice(&PSF2_HEADER_SIZE.to_le_bytes());
            data.extend_from_slice(&PSF2_HAS_UNICODE_TABLE.to_le_bytes());
            data.extend_from_slice(&(count as u32).to_le_bytes());
            data.extend_from_slice(&(glyph_size as u32).to_le_bytes());
            data.extend_from_slice(&(height as u32).to_le_bytes());
            data.extend_from_slice(&(width as u32).to_le_bytes());
        }
    }

    for c in glyphs.clone() {
        data.extend_from_slice(&c.data);
    }

    match version {
        Version::Raw => {}
        Version::V1 => {
            for c in glyphs {
                for code in table_entry(c, extras) {
                    data.extend_from_slice(&(code as u16).to_le_bytes());
                }
                data.extend_from_slice(&PSF1_SEPARATOR.to_le_bytes());
            }
        }
        Version::V2 => {
            for c in glyphs {
                for code in table_entry(c, extras) {
                    write_utf8_codepoint(&mut data, code);
                }
                data.push(PSF2_SEPARATOR);
            }
        }
    }

    debug!(
        "{version:?} with {count} {width}x{height} glyphs{}, {} bytes",
        if exchange { ", VGA exchange" } else { "" },
        data.len()
    );

    Ok(data)
}

fn check_v1(font: &Font<Packed>, extras: &Extras) -> Result<(), Error> {
    let count = font.chars.len();
    if count != 256 && count != 512 {
        return Err(Error::V1Count(count));
    }

    let width = font.chars[0].bbx.width;
    if width != 8 {
        return Err(Error::V1Width(width));
    }
    if font.bbx.height > 0xFF {
        return Err(Error::V1Height(font.bbx.height));
    }

    let codes = font.chars.iter().map(|c| c.code as u32);
    match codes.chain(extras.max_code()).max() {
        Some(code) if code > PSF1_MAX_CODE => Err(Error::V1Code(code)),
        _ => Ok(()),
    }
}

/// Codes listed for a glyph: its own code unless replaced or "no character", then its
/// extra codes without repeats.
fn table_entry(c: &Char, extras: &Extras) -> Vec<u32> {
    let mapping = extras.get(c.code);
    let mut codes = Vec::new();

    if c.code as u32 != NO_CHAR && !mapping.is_some_and(|m| m.replace) {
        codes.push(c.code as u32);
    }
    for &code in mapping.map(|m| m.codes.as_slice()).unwrap_or_default() {
        if !codes.contains(&code) {
            codes.push(code);
        }
    }

    codes
}

/// Writes a code point as 1 to 6 bytes of UTF-8. `FFFE` and `FFFF` are written as the
/// single bytes `FE` and `FF`.
fn write_utf8_codepoint(data: &mut Vec<u8>, codepoint: u32) {
    let (len, lead) = match codepoint {
        NOT_A_CHAR => return data.push(0xFE),
        NO_CHAR => return data.push(0xFF),
        0..=0x7F => return data.push(codepoint as u8),
        0x80..=0x7FF => (2, 0xC0),
        0x800..=0xFFFF => (3, 0xE0),
        0x1_0000..=0x1F_FFFF => (4, 0xF0),
        0x20_0000..=0x3FF_FFFF => (5, 0xF8),
        _ => (6, 0xFC),
    };

    data.push(lead | (codepoint >> (6 * (len - 1))) as u8);
    for i in (0..len - 1).rev() {
        data.push(0x80 | ((codepoint >> (6 * i)) & 0x3F) as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::{encode, write_utf8_codepoint, Error, Options, Version};
    use crate::{
        font::{Font, Packed},
        parser::extra::Extras,
        testing::{cells, font, Glyph},
    };

    fn packed(glyphs: &[Glyph]) -> Font<Packed> {
        font([8, 2, 0, 0], &[], glyphs).pack().unwrap()
    }

    fn with_extras(font: &Font<Packed>, table: &str) -> Extras {
        let mut extras = Extras::new();
        extras.load(table.as_bytes(), font).unwrap();
        extras
    }

    #[test_case(0x41 => vec![0x41]; "ascii")]
    #[test_case(0xE9 => vec![0xC3, 0xA9]; "two bytes")]
    #[test_case(0x20AC => vec![0xE2, 0x82, 0xAC]; "three bytes")]
    #[test_case(0x1_0000 => vec![0xF0, 0x90, 0x80, 0x80]; "four bytes")]
    #[test_case(0x20_0000 => vec![0xF8, 0x88, 0x80, 0x80, 0x80]; "five bytes")]
    #[test_case(0x7FFF_FFFF => vec![0xFD, 0xBF, 0xBF, 0xBF, 0xBF, 0xBF]; "six bytes")]
    #[test_case(0xFFFE => vec![0xFE]; "not a char")]
    #[test_case(0xFFFF => vec![0xFF]; "no char")]
    fn utf8(codepoint: u32) -> Vec<u8> {
        let mut data = Vec::new();
        write_utf8_codepoint(&mut data, codepoint);
        data
    }

    #[test]
    fn v2_layout() {
        let a = [0x18, 0x24];
        let b = [0x7C, 0x42];
        let font = packed(&[
            Glyph::new(0x41, [8, 2, 0, 0], &a),
            Glyph::new(0x1_0000, [8, 2, 0, 0], &b),
        ]);
        let psf = encode(&font, &Extras::new(), &Options::default()).unwrap();

        assert_eq!(
            psf,
            [
                0x72, 0xB5, 0x4A, 0x86, // magic
                0, 0, 0, 0, // version
                32, 0, 0, 0, // header size
                1, 0, 0, 0, // flags
                2, 0, 0, 0, // glyphs
                2, 0, 0, 0, // bytes per glyph
                2, 0, 0, 0, // height
                8, 0, 0, 0, // width
                0x18, 0x24, 0x7C, 0x42, // glyph data
                0x41, 0xFF, // A
                0xF0, 0x90, 0x80, 0x80, 0xFF, // U+10000
            ]
        );
    }

    #[test]
    fn v1_is_picked_for_a_code_page() {
        let font = cells(0, 256, 4).pack().unwrap();
        let psf = encode(&font, &Extras::new(), &Options::default()).unwrap();

        assert_eq!(psf[..4], [0x36, 0x04, 0x02, 4]);
        assert_eq!(psf[4..8], [0, 0, 0, 0]);
        assert_eq!(psf[4 + 4 * 255], 255);

        let table = &psf[4 + 256 * 4..];
        assert_eq!(table.len(), 256 * 4);
        assert_eq!(table[..8], [0x00, 0x00, 0xFF, 0xFF, 0x01, 0x00, 0xFF, 0xFF]);
    }

    #[test]
    fn v1_512_sets_the_mode_bit() {
        let font = cells(0, 512, 8).pack().unwrap();
        let psf = encode(&font, &Extras::new(), &Options::default()).unwrap();

        assert_eq!(psf[2], 0x03);
    }

    #[test]
    fn wide_codes_fall_back_to_v2() {
        let font = cells(0, 256, 8).pack().unwrap();
        let extras = with_extras(&font, "41 1F600\n");

        let psf = encode(&font, &extras, &Options::default()).unwrap();
        assert_eq!(psf[..4], [0x72, 0xB5, 0x4A, 0x86]);

        let options = Options {
            version: Some(Version::V1),
            ..Default::default()
        };
        assert_eq!(encode(&font, &extras, &options), Err(Error::V1Code(0x1F600)));
    }

    #[test]
    fn forced_v1_checks_the_glyph_count() {
        let font = cells(0x20, 95, 8).pack().unwrap();
        let options = Options {
            version: Some(Version::V1),
            ..Default::default()
        };

        assert_eq!(
            encode(&font, &Extras::new(), &options),
            Err(Error::V1Count(95))
        );
    }

    #[test]
    fn raw_is_glyph_data_only() {
        let font = cells(0x20, 3, 2).pack().unwrap();
        let options = Options {
            version: Some(Version::Raw),
            ..Default::default()
        };

        assert_eq!(
            encode(&font, &Extras::new(), &options).unwrap(),
            [0, 0, 1, 1, 2, 2]
        );
    }

    #[test]
    fn extras_join_the_table() {
        let a = [0x18, 0x24];
        let q = [0x40, 0x80];
        let font = packed(&[
            Glyph::new(0x41, [8, 2, 0, 0], &a),
            Glyph::new(0x27, [8, 2, 0, 0], &q),
        ]);
        let extras = with_extras(&font, "41 391 41 391\n27 FFFF 2019\n");
        let options = Options {
            version: Some(Version::V2),
            ..Default::default()
        };

        let psf = encode(&font, &extras, &options).unwrap();
        assert_eq!(
            psf[32 + 4..],
            [0x41, 0xCE, 0x91, 0xFF, 0xE2, 0x80, 0x99, 0xFF]
        );
    }

    #[test]
    fn no_char_glyph_has_an_empty_entry() {
        let a = [0x18, 0x24];
        let font = packed(&[
            Glyph::new(0x41, [8, 2, 0, 0], &a),
            Glyph::new(0xFFFF, [8, 2, 0, 0], &a),
        ]);

        let psf = encode(&font, &Extras::new(), &Options::default()).unwrap();
        assert_eq!(psf[32 + 4..], [0x41, 0xFF, 0xFF]);
    }

    #[test]
    fn not_a_char_glyph_is_rejected() {
        let a = [0x18, 0x24];
        let font = packed(&[
            Glyph::new(0x41, [8, 2, 0, 0], &a),
            Glyph::new(0xFFFE, [8, 2, 0, 0], &a),
        ]);

        assert_eq!(
            encode(&font, &Extras::new(), &Options::default()),
            Err(Error::NotAChar { index: 1 })
        );
    }

    #[test]
    fn widths_must_match() {
        let a = [0x18, 0x24];
        let m = [0xFF, 0x80, 0x80, 0x80];
        let font = packed(&[
            Glyph::new(0x41, [8, 2, 0, 0], &a),
            Glyph::new(0x4D, [9, 2, 0, 0], &m),
        ]);

        assert_eq!(
            encode(&font, &Extras::new(), &Options::default()),
            Err(Error::Width {
                index: 1,
                width: 9,
                expected: 8,
            })
        );
    }

    #[test]
    fn vga_exchange_is_detected() {
        let font = cells(0xA3, 256, 16).pack().unwrap();
        let psf = encode(&font, &Extras::new(), &Options::default()).unwrap();

        let glyph = |i: usize| psf[4 + i * 16];
        assert_eq!((glyph(0), glyph(31), glyph(32)), (192, 223, 32));
        assert_eq!((glyph(192), glyph(223), glyph(224)), (0, 31, 224));

        // the table moves with the glyphs
        let table = &psf[4 + 256 * 16..];
        assert_eq!(table[..4], [0x63, 0x01, 0xFF, 0xFF]);
    }

    #[test]
    fn vga_exchange_needs_the_signature() {
        let font = cells(0xA4, 256, 16).pack().unwrap();
        let psf = encode(&font, &Extras::new(), &Options::default()).unwrap();

        assert_eq!(psf[4], 0);
    }

    #[test]
    fn vga_exchange_can_be_disabled() {
        let font = cells(0xA3, 256, 16).pack().unwrap();
        let options = Options {
            exchange: Some(false),
            ..Default::default()
        };
        let psf = encode(&font, &Extras::new(), &options).unwrap();

        assert_eq!(psf[4], 0);
    }

    #[test]
    fn forced_exchange_needs_224_glyphs() {
        let font = cells(0x20, 96, 16).pack().unwrap();
        let options = Options {
            exchange: Some(true),
            ..Default::default()
        };

        assert_eq!(
            encode(&font, &Extras::new(), &options),
            Err(Error::Exchange(96))
        );
    }
}
