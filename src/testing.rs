//! Builds small BDF fonts for unit tests.

use std::fmt::Write as _;

use crate::{font::row_size, parser::bdf, Font};

pub(crate) struct Glyph<'a> {
    pub code: i32,
    pub dwidth: i32,
    /// width, height, xoff, yoff
    pub bbx: [i32; 4],
    /// Packed rows, `row_size(width)` bytes each.
    pub data: &'a [u8],
}

impl<'a> Glyph<'a> {
    pub fn new(code: i32, bbx: [i32; 4], data: &'a [u8]) -> Self {
        Self {
            code,
            dwidth: bbx[0],
            bbx,
            data,
        }
    }

    pub fn advance(mut self, dwidth: i32) -> Self {
        self.dwidth = dwidth;
        self
    }
}

/// BDF text for a font with the given bounding box, extra properties and glyphs.
pub(crate) fn text(bbx: [i32; 4], props: &[&str], glyphs: &[Glyph]) -> String {
    let [w, h, x, y] = bbx;
    let mut out = format!(
        "STARTFONT 2.1\n\
         FONT -Test-Fixed-Bold-R-Normal--{h}-{pt}-75-75-C-{avg}-ISO10646-1\n\
         SIZE {h} 75 75\n\
         FONTBOUNDINGBOX {w} {h} {x} {y}\n",
        pt = h * 10,
        avg = w * 10,
    );

    if !props.is_empty() {
        let _ = writeln!(out, "STARTPROPERTIES {}", props.len());
        for p in props {
            let _ = writeln!(out, "{p}");
        }
        out.push_str("ENDPROPERTIES\n");
    }

    let _ = writeln!(out, "CHARS {}", glyphs.len());
    for g in glyphs {
        let [w, h, x, y] = g.bbx;
        let _ = write!(
            out,
            "STARTCHAR U+{code:04X}\n\
             ENCODING {code}\n\
             SWIDTH {sw} 0\n\
             DWIDTH {dw} 0\n\
             BBX {w} {h} {x} {y}\n\
             BITMAP\n",
            code = g.code,
            sw = (g.dwidth * 1000 / h.max(1)).clamp(-32000, 32000),
            dw = g.dwidth,
        );

        for row in g.data.chunks(row_size(w)) {
            for b in row {
                let _ = write!(out, "{b:02X}");
            }
            out.push('\n');
        }
        out.push_str("ENDCHAR\n");
    }
    out.push_str("ENDFONT\n");

    out
}

pub(crate) fn font(bbx: [i32; 4], props: &[&str], glyphs: &[Glyph]) -> Font {
    match bdf::parse(text(bbx, props, glyphs).as_bytes()) {
        Ok(font) => font,
        Err(e) => panic!("test font does not parse: {e}"),
    }
}

/// `count` 8x`height` glyphs with consecutive codes, each filled with its own index.
pub(crate) fn cells(first: i32, count: usize, height: i32) -> Font {
    let data: Vec<Vec<u8>> = (0..count)
        .map(|i| vec![i as u8; height as usize])
        .collect();
    let glyphs: Vec<Glyph> = data
        .iter()
        .enumerate()
        .map(|(i, d)| Glyph::new(first + i as i32, [8, height, 0, 0], d))
        .collect();

    font([8, height, 0, 0], &[], &glyphs)
}
