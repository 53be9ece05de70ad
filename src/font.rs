//! In-memory model of a BDF font.
//!
//! A [`Font`] is produced by [`crate::parser::bdf::parse`], reshaped by exactly one of
//! [`Font::expand`] or [`Font::pack`] and finally handed to an encoder. The stage type
//! parameter records which of those happened, so an encoder can only be called with a
//! font that went through the normalization it depends on.

use core::fmt::{self, Debug, Display};
use std::collections::HashMap;

use thiserror::Error;

/// Bound of `BBX` sizes and offsets, and of `DWIDTH` components.
pub const DEVICE_LIMIT: i32 = 512;
/// Bound of `SWIDTH` components.
pub const SCALABLE_LIMIT: i32 = 32000;
/// Highest glyph code.
pub const CODE_LIMIT: i32 = 0x10FFFF;
/// Number of hyphen separated fields in a font name, including the leading empty one.
pub const XLFD_FIELDS: usize = 15;

pub const XLFD_FAMILY_NAME: usize = 2;
pub const XLFD_WEIGHT_NAME: usize = 3;
pub const XLFD_SLANT: usize = 4;

/// A signed advance, `SWIDTH` or `DWIDTH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Width {
    pub x: i32,
    pub y: i32,
}

impl Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Glyph or font bounding box in pixels, offsets relative to the origin on the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bbx {
    pub width: i32,
    pub height: i32,
    pub xoff: i32,
    pub yoff: i32,
}

impl Bbx {
    /// Number of bytes in a packed bitmap row of this box.
    pub fn row_size(&self) -> usize {
        row_size(self.width)
    }

    /// Distance from the baseline to the top edge.
    pub fn ascent(&self) -> i32 {
        self.height + self.yoff
    }
}

impl Display for Bbx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.width, self.height, self.xoff, self.yoff)
    }
}

/// Bytes needed for `width` pixels, one bit each, padded to a whole byte.
pub fn row_size(width: i32) -> usize {
    (width.max(0) as usize + 7) / 8
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("duplicate property {0}")]
pub struct DuplicateProperty(pub String);

/// Insertion ordered table of raw property values.
///
/// Values are kept exactly as they appeared after the property name, so writing the
/// table back reproduces the source lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Props {
    entries: Vec<(String, Vec<u8>)>,
    index: HashMap<String, usize>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new property. Names are unique per table.
    pub fn insert(&mut self, name: &str, value: &[u8]) -> Result<(), DuplicateProperty> {
        if self.index.contains_key(name) {
            return Err(DuplicateProperty(name.to_owned()));
        }

        self.index.insert(name.to_owned(), self.entries.len());
        self.entries.push((name.to_owned(), value.to_vec()));

        Ok(())
    }

    /// Replaces the value of an existing property in place, or appends it.
    pub fn set<V: Into<Vec<u8>>>(&mut self, name: &str, value: V) {
        match self.index.get(name) {
            Some(&i) => self.entries[i].1 = value.into(),
            None => {
                self.index.insert(name.to_owned(), self.entries.len());
                self.entries.push((name.to_owned(), value.into()));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.index.get(name).map(|&i| self.entries[i].1.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the value as a decimal integer, [`None`] if absent or not a number.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        std::str::from_utf8(self.get(name)?).ok()?.trim().parse().ok()
    }

    /// Returns the value with BDF string quoting removed.
    pub fn get_str(&self, name: &str) -> Option<Vec<u8>> {
        self.get(name).map(unquote)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Removes the surrounding quotes of a BDF string value and collapses doubled quotes.
/// Values that are not quoted are returned unchanged.
pub fn unquote(value: &[u8]) -> Vec<u8> {
    match value {
        [b'"', inner @ .., b'"'] => {
            let mut out = Vec::with_capacity(inner.len());
            let mut bytes = inner.iter().peekable();
            while let Some(&b) = bytes.next() {
                if b == b'"' && bytes.peek() == Some(&&b'"') {
                    bytes.next();
                }
                out.push(b);
            }
            out
        }
        _ => value.to_vec(),
    }
}

/// A single glyph with its metrics and packed bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Char {
    /// Glyph code, `-1` until `ENCODING` is read.
    pub code: i32,
    pub swidth: Width,
    pub dwidth: Width,
    pub bbx: Bbx,
    /// `bbx.height` rows of `bbx.row_size()` bytes, most significant bit first.
    pub data: Vec<u8>,
    pub props: Props,
}

impl Default for Char {
    fn default() -> Self {
        Self {
            code: -1,
            swidth: Width::default(),
            dwidth: Width::default(),
            bbx: Bbx::default(),
            data: Vec::new(),
            props: Props::new(),
        }
    }
}

impl Char {
    pub fn row_size(&self) -> usize {
        self.bbx.row_size()
    }

    /// The `STARTCHAR` name.
    pub fn name(&self) -> &[u8] {
        self.props.get("STARTCHAR").unwrap_or_default()
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let size = self.row_size();
        &self.data[y * size..(y + 1) * size]
    }

    /// Returns [`Some(true)`] if the pixel is set, [`None`] if out of bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<bool> {
        if x >= self.bbx.width as usize || y >= self.bbx.height as usize {
            return None;
        }

        let byte = self.data[y * self.row_size() + x / 8];
        Some(byte & (0x80 >> (x % 8)) != 0)
    }
}

/// Width statistics collected while normalizing, used for the proportional flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metrics {
    pub min_width: i32,
    pub max_width: i32,
    pub avg_width: i32,
}

impl Metrics {
    /// A font is proportional when its glyph widths differ.
    pub fn proportional(&self) -> bool {
        self.min_width != self.max_width
    }
}

#[derive(Debug, Default)]
pub(crate) struct WidthStats {
    min: Option<i32>,
    max: i32,
    total: i64,
    count: i64,
}

impl WidthStats {
    pub(crate) fn add(&mut self, width: i32) {
        self.min = Some(self.min.map_or(width, |min| min.min(width)));
        self.max = self.max.max(width);
        self.total += i64::from(width);
        self.count += 1;
    }

    pub(crate) fn finish(self) -> Metrics {
        let avg_width = if self.count == 0 {
            0
        } else {
            ((self.total + self.count / 2) / self.count) as i32
        };

        Metrics {
            min_width: self.min.unwrap_or(0),
            max_width: self.max,
            avg_width,
        }
    }
}

pub type ParsedFont = Font<Parsed>;
pub type ExpandedFont = Font<Expanded>;
pub type PackedFont = Font<Packed>;

/// A BDF font. `S` records which normalization, if any, the glyphs went through.
#[allow(private_bounds)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font<S: Stage = Parsed> {
    /// The `FONT` name split on `-`, always [`XLFD_FIELDS`] long.
    pub xlfd: Vec<Vec<u8>>,
    pub bbx: Bbx,
    pub chars: Vec<Char>,
    /// Code of the `DEFAULT_CHAR` glyph, `-1` if there is none.
    pub default_code: i32,
    pub props: Props,

    pub stage: S,
}

impl Default for Font<Parsed> {
    fn default() -> Self {
        Self {
            xlfd: vec![Vec::new(); XLFD_FIELDS],
            bbx: Bbx::default(),
            chars: Vec::new(),
            default_code: -1,
            props: Props::new(),
            stage: Parsed,
        }
    }
}

#[allow(private_bounds)]
impl<S: Stage> Font<S> {
    /// Ascent declared by the font itself, before looking at the glyphs.
    pub fn px_ascent(&self) -> i32 {
        self.props
            .get_int("FONT_ASCENT")
            .map(|a| a.clamp(0, i64::from(DEVICE_LIMIT)) as i32)
            .unwrap_or_else(|| self.bbx.ascent().max(0))
    }

    /// Descent declared by the font itself, before looking at the glyphs.
    pub fn px_descent(&self) -> i32 {
        self.props
            .get_int("FONT_DESCENT")
            .map(|d| d.clamp(0, i64::from(DEVICE_LIMIT)) as i32)
            .unwrap_or_else(|| (-self.bbx.yoff).max(0))
    }

    pub fn family_name(&self) -> &[u8] {
        &self.xlfd[XLFD_FAMILY_NAME]
    }

    pub fn is_bold(&self) -> bool {
        self.xlfd[XLFD_WEIGHT_NAME].eq_ignore_ascii_case(b"bold")
    }

    pub fn is_italic(&self) -> bool {
        matches!(self.xlfd[XLFD_SLANT].as_slice(), b"I" | b"O" | b"i" | b"o")
    }

    /// Index of the glyph with the given code.
    pub fn position(&self, code: i32) -> Option<usize> {
        self.chars.iter().position(|c| c.code == code)
    }

    pub(crate) fn into_stage<T: Stage>(self, stage: T) -> Font<T> {
        Font {
            xlfd: self.xlfd,
            bbx: self.bbx,
            chars: self.chars,
            default_code: self.default_code,
            props: self.props,
            stage,
        }
    }
}

pub(crate) trait Stage: Clone + PartialEq + Eq + Debug {}

/// Fresh out of the parser.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Parsed;
impl Stage for Parsed {}

/// Every glyph re-rendered into a common height and baseline, see [`Font::expand`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Expanded {
    pub metrics: Metrics,
}
impl Stage for Expanded {}

/// Every glyph re-rendered into the font's own fixed cell height, see [`Font::pack`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Packed {
    pub metrics: Metrics,
}
impl Stage for Packed {}
