//! Converts BDF bitmap fonts into Windows FNT and PC console PSF fonts.
//!
//! ```text
//! BDF text -> parser::bdf::parse -> Font<Parsed> -+-> Font::expand -> encoder::fnt::encode
//!                                                 |                 -> Font::write_bdf
//!                                                 +-> Font::pack   -> encoder::psf::encode
//! ```
//!
//! ```rust
//! # use bdf_transcode::parser::bdf;
//! let text = "STARTFONT 2.1
//! FONT -Misc-Fixed-Medium-R-Normal--8-80-75-75-C-80-ISO10646-1
//! SIZE 8 75 75
//! FONTBOUNDINGBOX 8 8 0 0
//! CHARS 1
//! STARTCHAR A
//! ENCODING 65
//! SWIDTH 1000 0
//! DWIDTH 8 0
//! BBX 8 8 0 0
//! BITMAP
//! 18
//! 24
//! 42
//! 42
//! 7E
//! 42
//! 42
//! 00
//! ENDCHAR
//! ENDFONT
//! ";
//!
//! let font = bdf::parse(text.as_bytes()).unwrap();
//! let font = font.expand().unwrap();
//!
//! let fnt = bdf_transcode::encoder::fnt::encode(&font, &Default::default()).unwrap();
//! assert_eq!(&fnt[..2], &[0x00, 0x02]);
//! ```

#[cfg(test)]
#[macro_use]
extern crate test_case;

#[macro_use]
extern crate log;

pub mod cli;
pub mod encoder;
pub mod font;
pub mod parser;
pub mod render;

#[cfg(test)]
mod testing;

pub use font::{Bbx, Char, Font, Metrics, Props, Width};
