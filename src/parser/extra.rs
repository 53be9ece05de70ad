//! Extra code point tables for the PSF unicode table.
//!
//! Each non blank line maps a glyph code to additional code points, all in hex with an
//! optional `U+` or `0x` prefix:
//!
//! ```text
//! # glyph  extras
//! U+00C5   U+212B
//! 0x41     U+0391 U+0410
//! 27       FFFF 2019
//! ```
//!
//! `#` starts a comment. `FFFF` among the extras drops every code collected so far for
//! the glyph, its own code included.

use std::{collections::HashMap, str};

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while_m_n},
    character::complete::space1,
    combinator::{all_consuming, map_res, opt},
    multi::separated_list1,
    sequence::preceded,
    IResult,
};
use thiserror::Error;

use crate::font::{Font, Stage};

/// Glyph code meaning "no character".
pub const NO_CHAR: u32 = 0xFFFF;
/// Never a valid character.
pub const NOT_A_CHAR: u32 = 0xFFFE;
/// Highest code a PSF unicode table can store.
pub const MAX_CODE: u32 = 0x7FFF_FFFF;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}: {kind}")]
pub struct Error {
    pub line: usize,
    pub kind: ErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("expected hex codes separated by blanks")]
    BadCode,
    #[error("no glyph with code {0:04X}")]
    MissingGlyph(u32),
    #[error("{0:04X} cannot be a glyph code")]
    ReservedGlyph(u32),
    #[error("FFFE cannot be an extra code")]
    ReservedExtra,
    #[error("code {0:X} is above {max:X}", max = MAX_CODE)]
    Range(u32),
}

/// Extra codes of one glyph.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Mapping {
    /// The glyph's own code is left out of its table entry.
    pub replace: bool,
    pub codes: Vec<u32>,
}

/// Extra codes keyed by glyph code, accumulated over any number of tables.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Extras {
    map: HashMap<i32, Mapping>,
}

impl Extras {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: i32) -> Option<&Mapping> {
        self.map.get(&code)
    }

    /// Highest extra code of any glyph.
    pub fn max_code(&self) -> Option<u32> {
        self.map.values().flat_map(|m| m.codes.iter().copied()).max()
    }

    /// Adds the mappings of one table. Every glyph code must belong to `font`.
    #[allow(private_bounds)]
    pub fn load<S: Stage>(&mut self, input: &[u8], font: &Font<S>) -> Result<(), Error> {
        for (index, raw) in input.split(|&b| b == b'\n').enumerate() {
            let line = index + 1;
            let error = |kind| Error { line, kind };

            let text = raw
                .split(|&b| b == b'#')
                .next()
                .unwrap_or_default()
                .trim_ascii();
            if text.is_empty() {
                continue;
            }

            let codes = match codes(text) {
                Ok((_, codes)) => codes,
                Err(_) => return Err(error(ErrorKind::BadCode)),
            };
            let Some((&glyph, extras)) = codes.split_first() else {
                return Err(error(ErrorKind::BadCode));
            };

            if glyph == NO_CHAR || glyph == NOT_A_CHAR {
                return Err(error(ErrorKind::ReservedGlyph(glyph)));
            }
            let code = i32::try_from(glyph)
                .ok()
                .filter(|&c| font.position(c).is_some())
                .ok_or(error(ErrorKind::MissingGlyph(glyph)))?;

            if let Some(&extra) = extras.iter().find(|&&c| c == NOT_A_CHAR || c > MAX_CODE) {
                return Err(error(match extra {
                    NOT_A_CHAR => ErrorKind::ReservedExtra,
                    _ => ErrorKind::Range(extra),
                }));
            }

            let mapping = self.map.entry(code).or_default();
            for &extra in extras {
                if extra == NO_CHAR {
                    mapping.replace = true;
                    mapping.codes.clear();
                } else {
                    mapping.codes.push(extra);
                }
            }
        }

        debug!("{} glyphs with extra codes", self.map.len());

        Ok(())
    }
}

fn codes(input: &[u8]) -> IResult<&[u8], Vec<u32>> {
    all_consuming(separated_list1(space1, code))(input)
}

fn code(input: &[u8]) -> IResult<&[u8], u32> {
    map_res(
        preceded(
            opt(alt((tag_no_case("U+"), tag_no_case("0x")))),
            take_while_m_n(1, 8, |c: u8| c.is_ascii_hexdigit()),
        ),
        |digits: &[u8]| {
            let digits = str::from_utf8(digits).map_err(|_| ())?;
            u32::from_str_radix(digits, 16).map_err(|_| ())
        },
    )(input)
}
