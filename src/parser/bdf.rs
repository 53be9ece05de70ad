//! BDF 2.1 reader.
//!
//! The grammar is a strict sequence of keyword lines:
//!
//! ```text
//! STARTFONT 2.1
//! FONT -foundry-family-weight-slant-setwidth-style-px-pt-resx-resy-spacing-avgw-registry-encoding
//! SIZE pt resx resy
//! FONTBOUNDINGBOX w h xoff yoff
//! [STARTPROPERTIES n, n property lines, ENDPROPERTIES]
//! CHARS n
//! n x (STARTCHAR, ENCODING, SWIDTH, DWIDTH, BBX, [ATTRIBUTES], BITMAP, hex rows, ENDCHAR)
//! ENDFONT
//! ```
//!
//! `COMMENT` and blank lines may appear wherever a keyword is expected. Every line is
//! tokenized with nom, the order of the lines is checked by [`Parser`].

use std::{collections::HashSet, str};

use nom::{
    branch::alt,
    bytes::complete::{take_while1, take_while_m_n},
    character::complete::{char, digit1, space1},
    combinator::{all_consuming, eof, map, map_res, opt, recognize, rest},
    multi::{many0, separated_list1},
    sequence::{pair, preceded},
    IResult,
};
use thiserror::Error;

use crate::{
    font::{
        Bbx, Char, DuplicateProperty, Font, Props, Width, CODE_LIMIT, DEVICE_LIMIT,
        SCALABLE_LIMIT, XLFD_FIELDS,
    },
    render::bits,
};

/// A grammar or consistency violation at a 1-based line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}: {kind}")]
pub struct Error {
    pub line: usize,
    pub kind: ErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("{0} expected")]
    Expected(&'static str),
    #[error("invalid {0}")]
    Invalid(&'static str),
    #[error("{field} must be between {min} and {max}")]
    Range {
        field: &'static str,
        min: i32,
        max: i32,
    },
    #[error("FONT name must have 15 hyphen separated fields starting with an empty one, found {0}")]
    XlfdFields(usize),
    #[error("{0}")]
    Duplicate(DuplicateProperty),
    #[error("duplicate ENCODING {0}")]
    DuplicateCode(i32),
    #[error("STARTPROPERTIES declares {declared}, found {found}")]
    PropertyCount { declared: usize, found: usize },
    #[error("CHARS declares {declared}, found {found}")]
    CharCount { declared: usize, found: usize },
    #[error("BITMAP has {found} rows, BBX height is {expected}")]
    RowCount { expected: usize, found: usize },
    #[error("bitmap row has {found} hex digits, BBX width requires {expected}")]
    RowLength { expected: usize, found: usize },
    #[error("DEFAULT_CHAR {0} matches no glyph")]
    DefaultChar(i64),
    #[error("unexpected content after ENDFONT")]
    TrailingContent,
}

const FONTBOUNDINGBOX_FIELDS: [&str; 4] = [
    "FONTBOUNDINGBOX width",
    "FONTBOUNDINGBOX height",
    "FONTBOUNDINGBOX xoff",
    "FONTBOUNDINGBOX yoff",
];
const BBX_FIELDS: [&str; 4] = ["BBX width", "BBX height", "BBX xoff", "BBX yoff"];

/// Parses a whole BDF file.
pub fn parse(input: &[u8]) -> Result<Font, Error> {
    let mut parser = Parser::new(input);
    let mut font = Font::default();

    parser.header(&mut font)?;
    parser.properties(&mut font)?;
    parser.chars(&mut font)?;
    parser.end()?;

    if let Some((line, code)) = parser.default_char {
        font.default_code = i32::try_from(code)
            .ok()
            .filter(|&c| font.position(c).is_some())
            .ok_or(Error {
                line,
                kind: ErrorKind::DefaultChar(code),
            })?;
    }

    debug!(
        "Parsed {} glyphs, bounding box {}",
        font.chars.len(),
        font.bbx
    );

    Ok(font)
}

/// One keyword line. Lines that do not start with a keyword have an empty `keyword`.
#[derive(Debug, Clone, Copy)]
struct Statement<'a> {
    line: usize,
    keyword: &'a [u8],
    value: &'a [u8],
}

impl<'a> Statement<'a> {
    fn read(line: usize, text: &'a [u8]) -> Self {
        match statement(text) {
            Ok((_, (keyword, value))) => Self {
                line,
                keyword,
                value,
            },
            Err(_) => Self {
                line,
                keyword: b"",
                value: text,
            },
        }
    }

    fn is(&self, keyword: &str) -> bool {
        self.keyword == keyword.as_bytes()
    }

    fn name(&self) -> &'a str {
        str::from_utf8(self.keyword).unwrap_or_default()
    }

    fn error(&self, kind: ErrorKind) -> Error {
        Error {
            line: self.line,
            kind,
        }
    }

    fn insert_into(&self, props: &mut Props) -> Result<(), Error> {
        props
            .insert(self.name(), self.value)
            .map_err(|e| self.error(ErrorKind::Duplicate(e)))
    }

    /// Exactly `N` decimal integers separated by blanks.
    fn ints<const N: usize>(&self, field: &'static str) -> Result<[i64; N], Error> {
        all_consuming(separated_list1(space1, integer))(self.value)
            .ok()
            .and_then(|(_, values)| <[i64; N]>::try_from(values).ok())
            .ok_or_else(|| self.error(ErrorKind::Invalid(field)))
    }

    fn bounded(&self, value: i64, field: &'static str, min: i32, max: i32) -> Result<i32, Error> {
        if value < i64::from(min) || value > i64::from(max) {
            return Err(self.error(ErrorKind::Range { field, min, max }));
        }

        Ok(value as i32)
    }

    fn width(&self, fields: [&'static str; 2], limit: i32) -> Result<Width, Error> {
        let [x, y] = self.ints(fields[0])?;

        Ok(Width {
            x: self.bounded(x, fields[0], -limit, limit)?,
            y: self.bounded(y, fields[1], -limit, limit)?,
        })
    }

    fn bbx(&self, fields: [&'static str; 4]) -> Result<Bbx, Error> {
        let [width, height, xoff, yoff] = self.ints(fields[0])?;

        Ok(Bbx {
            width: self.bounded(width, fields[0], 1, DEVICE_LIMIT)?,
            height: self.bounded(height, fields[1], 1, DEVICE_LIMIT)?,
            xoff: self.bounded(xoff, fields[2], -DEVICE_LIMIT, DEVICE_LIMIT)?,
            yoff: self.bounded(yoff, fields[3], -DEVICE_LIMIT, DEVICE_LIMIT)?,
        })
    }
}

/// Walks the lines of a BDF file, holding the state that outlives a single section.
struct Parser<'a> {
    lines: Vec<&'a [u8]>,
    /// Index of the next line to read.
    pos: usize,
    pending: Option<Statement<'a>>,
    default_char: Option<(usize, i64)>,
    codes: HashSet<i32>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8]) -> Self {
        let mut lines: Vec<&[u8]> = input.split(|&b| b == b'\n').collect();
        if lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop(); // final newline
        }

        Self {
            lines: lines.into_iter().map(<[u8]>::trim_ascii).collect(),
            pos: 0,
            pending: None,
            default_char: None,
            codes: HashSet::new(),
        }
    }

    /// Next keyword line, skipping blank lines and comments.
    fn next_statement(&mut self) -> Option<Statement<'a>> {
        if let Some(stmt) = self.pending.take() {
            return Some(stmt);
        }

        while let Some((line, text)) = self.raw_line() {
            if text.is_empty() {
                continue;
            }

            let stmt = Statement::read(line, text);
            if !stmt.is("COMMENT") {
                return Some(stmt);
            }
        }

        None
    }

    fn peek(&mut self) -> Option<Statement<'a>> {
        if self.pending.is_none() {
            self.pending = self.next_statement();
        }

        self.pending
    }

    fn peek_is(&mut self, keyword: &str) -> bool {
        self.peek().is_some_and(|s| s.is(keyword))
    }

    /// The next physical line with its 1-based number.
    fn raw_line(&mut self) -> Option<(usize, &'a [u8])> {
        let text = *self.lines.get(self.pos)?;
        self.pos += 1;

        Some((self.pos, text))
    }

    fn at_eof(&self, kind: ErrorKind) -> Error {
        Error {
            line: self.lines.len().max(1),
            kind,
        }
    }

    /// Line of the next statement, for errors noticed before reading it.
    fn error_here(&mut self, kind: ErrorKind) -> Error {
        match self.peek() {
            Some(stmt) => stmt.error(kind),
            None => self.at_eof(kind),
        }
    }

    fn expect(&mut self, keyword: &'static str) -> Result<Statement<'a>, Error> {
        match self.next_statement() {
            Some(stmt) if stmt.is(keyword) => Ok(stmt),
            Some(stmt) => Err(stmt.error(ErrorKind::Expected(keyword))),
            None => Err(self.at_eof(ErrorKind::Expected(keyword))),
        }
    }

    fn header(&mut self, font: &mut Font) -> Result<(), Error> {
        let stmt = self.expect("STARTFONT")?;
        if stmt.value.is_empty() {
            return Err(stmt.error(ErrorKind::Invalid("STARTFONT version")));
        }
        stmt.insert_into(&mut font.props)?;

        let stmt = self.expect("FONT")?;
        let xlfd: Vec<Vec<u8>> = stmt.value.split(|&b| b == b'-').map(<[u8]>::to_vec).collect();
        if xlfd.len() != XLFD_FIELDS || !xlfd[0].is_empty() {
            return Err(stmt.error(ErrorKind::XlfdFields(xlfd.len())));
        }
        font.xlfd = xlfd;
        stmt.insert_into(&mut font.props)?;

        let stmt = self.expect("SIZE")?;
        let [points, xres, yres] = stmt.ints("SIZE")?;
        stmt.bounded(points, "SIZE point size", 1, 1638)?;
        stmt.bounded(xres, "SIZE x resolution", 1, SCALABLE_LIMIT)?;
        stmt.bounded(yres, "SIZE y resolution", 1, SCALABLE_LIMIT)?;
        stmt.insert_into(&mut font.props)?;

        let stmt = self.expect("FONTBOUNDINGBOX")?;
        font.bbx = stmt.bbx(FONTBOUNDINGBOX_FIELDS)?;
        stmt.insert_into(&mut font.props)
    }

    fn properties(&mut self, font: &mut Font) -> Result<(), Error> {
        if !self.peek_is("STARTPROPERTIES") {
            return Ok(());
        }

        let stmt = self.expect("STARTPROPERTIES")?;
        let [declared] = stmt.ints("STARTPROPERTIES")?;
        let declared = stmt.bounded(declared, "STARTPROPERTIES", 0, u16::MAX.into())? as usize;
        stmt.insert_into(&mut font.props)?;

        let mut found = 0;
        loop {
            let Some(stmt) = self.next_statement() else {
                return Err(self.at_eof(ErrorKind::Expected("ENDPROPERTIES")));
            };

            if stmt.is("ENDPROPERTIES") {
                if found != declared {
                    return Err(stmt.error(ErrorKind::PropertyCount { declared, found }));
                }

                return stmt.insert_into(&mut font.props);
            }

            if found == declared || stmt.keyword.is_empty() {
                return Err(stmt.error(ErrorKind::Expected("ENDPROPERTIES")));
            }

            if stmt.is("DEFAULT_CHAR") {
                let [code] = stmt.ints("DEFAULT_CHAR")?;
                self.default_char = Some((stmt.line, code));
            }

            stmt.insert_into(&mut font.props)?;
            found += 1;
        }
    }

    fn chars(&mut self, font: &mut Font) -> Result<(), Error> {
        let stmt = self.expect("CHARS")?;
        let [declared] = stmt.ints("CHARS")?;
        let declared = stmt.bounded(declared, "CHARS", 1, CODE_LIMIT + 1)? as usize;
        stmt.insert_into(&mut font.props)?;

        font.chars.reserve(declared.min(0x10000));

        while let Some(stmt) = self.peek().filter(|s| s.is("STARTCHAR")) {
            if font.chars.len() == declared {
                return Err(stmt.error(ErrorKind::CharCount {
                    declared,
                    found: declared + 1,
                }));
            }

            let c = self.char()?;
            font.chars.push(c);
        }

        if font.chars.len() != declared {
            let found = font.chars.len();
            return Err(self.error_here(ErrorKind::CharCount { declared, found }));
        }

        Ok(())
    }

    fn char(&mut self) -> Result<Char, Error> {
        let mut c = Char::default();

        let stmt = self.expect("STARTCHAR")?;
        if stmt.value.is_empty() {
            return Err(stmt.error(ErrorKind::Invalid("STARTCHAR name")));
        }
        stmt.insert_into(&mut c.props)?;

        let stmt = self.expect("ENCODING")?;
        let [code] = stmt.ints("ENCODING")?;
        c.code = stmt.bounded(code, "ENCODING", 0, CODE_LIMIT)?;
        if !self.codes.insert(c.code) {
            return Err(stmt.error(ErrorKind::DuplicateCode(c.code)));
        }
        stmt.insert_into(&mut c.props)?;

        let stmt = self.expect("SWIDTH")?;
        c.swidth = stmt.width(["SWIDTH x", "SWIDTH y"], SCALABLE_LIMIT)?;
        stmt.insert_into(&mut c.props)?;

        let stmt = self.expect("DWIDTH")?;
        c.dwidth = stmt.width(["DWIDTH x", "DWIDTH y"], DEVICE_LIMIT)?;
        stmt.insert_into(&mut c.props)?;

        let stmt = self.expect("BBX")?;
        c.bbx = stmt.bbx(BBX_FIELDS)?;
        stmt.insert_into(&mut c.props)?;

        if self.peek_is("ATTRIBUTES") {
            self.expect("ATTRIBUTES")?.insert_into(&mut c.props)?;
        }

        self.expect("BITMAP")?;
        c.data = self.bitmap(&c.bbx)?;

        match self.next_statement() {
            Some(stmt) if stmt.is("ENDCHAR") => Ok(c),
            Some(stmt)
                if stmt.value.is_empty() && stmt.keyword.iter().all(u8::is_ascii_hexdigit) =>
            {
                Err(stmt.error(ErrorKind::RowCount {
                    expected: c.bbx.height as usize,
                    found: c.bbx.height as usize + 1,
                }))
            }
            Some(stmt) => Err(stmt.error(ErrorKind::Expected("ENDCHAR"))),
            None => Err(self.at_eof(ErrorKind::Expected("ENDCHAR"))),
        }
    }

    fn bitmap(&mut self, bbx: &Bbx) -> Result<Vec<u8>, Error> {
        let height = bbx.height as usize;
        let digits = bbx.row_size() * 2;
        let mut data = Vec::with_capacity(height * bbx.row_size());

        for y in 0..height {
            let row_count = ErrorKind::RowCount {
                expected: height,
                found: y,
            };

            let Some((line, text)) = self.raw_line() else {
                return Err(self.at_eof(row_count));
            };
            let error = |kind| Error { line, kind };

            if text == b"ENDCHAR" {
                return Err(error(row_count));
            }

            if text.len() != digits {
                return Err(error(ErrorKind::RowLength {
                    expected: digits,
                    found: text.len(),
                }));
            }

            let (_, row) = hex_row(text).map_err(|_| error(ErrorKind::Invalid("bitmap row")))?;
            if !bits::padding_is_clear(&row, bbx.width as usize) {
                warn!("{line}: bitmap row has bits set past the BBX width");
            }

            data.extend_from_slice(&row);
        }

        Ok(data)
    }

    /// `ENDFONT` followed by nothing but blank lines and comments.
    fn end(&mut self) -> Result<(), Error> {
        self.expect("ENDFONT")?;

        match self.next_statement() {
            Some(stmt) => Err(stmt.error(ErrorKind::TrailingContent)),
            None => Ok(()),
        }
    }
}

/// Splits a line into its keyword and the raw value after the separating blanks.
fn statement(input: &[u8]) -> IResult<&[u8], (&[u8], &[u8])> {
    pair(keyword, alt((preceded(space1, rest), eof)))(input)
}

fn keyword(input: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while1(|c: u8| c.is_ascii_alphanumeric() || c == b'_')(input)
}

fn integer(input: &[u8]) -> IResult<&[u8], i64> {
    map_res(
        recognize(pair(opt(alt((char('-'), char('+')))), digit1)),
        |digits: &[u8]| str::from_utf8(digits).map_err(|_| ())?.parse().map_err(|_| ()),
    )(input)
}

/// Decodes a row of hex digit pairs, most significant nibble first.
fn hex_row(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    all_consuming(many0(map(
        take_while_m_n(2, 2, |c: u8| c.is_ascii_hexdigit()),
        |pair: &[u8]| nibble(pair[0]) << 4 | nibble(pair[1]),
    )))(input)
}

fn nibble(digit: u8) -> u8 {
    (digit as char).to_digit(16).unwrap_or(0) as u8
}
