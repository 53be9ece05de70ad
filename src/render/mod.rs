//! Re-rendering glyphs into common cells.
//!
//! Both normalizations place every glyph bitmap into a new box whose height is shared
//! by the whole font. They differ in how that height is chosen: [`Font::expand`] grows
//! it to fit every glyph, [`Font::pack`] keeps the font's own and rejects glyphs that
//! do not fit.
//!
//! [`Font::expand`]: crate::Font::expand
//! [`Font::pack`]: crate::Font::pack

use thiserror::Error;

use crate::font::{row_size, Bbx, Char, Width, DEVICE_LIMIT};

pub mod bits;
mod expand;
mod pack;

/// Widest cell a packed glyph may have.
pub const PACKED_WIDTH_LIMIT: i32 = 32000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    #[error("font height {0} exceeds {}", DEVICE_LIMIT)]
    Height(i32),
    #[error("char {index}: expanded width {width} exceeds {}", DEVICE_LIMIT)]
    Width { index: usize, width: i32 },
    #[error("char {index}: expanded xoff {xoff} is below -{}", DEVICE_LIMIT)]
    Offset { index: usize, xoff: i32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    #[error("char {index}: BBX yoff below font yoff")]
    BelowBaseline { index: usize },
    #[error("char {index}: BBX height + yoff above font ascent")]
    AboveAscent { index: usize },
    #[error("char {index}: width {width} exceeds {}", PACKED_WIDTH_LIMIT)]
    Width { index: usize, width: i32 },
}

/// Horizontal placement of a glyph bitmap inside its new cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Cell width in pixels.
    pub width: i32,
    /// Pixel column of the old bitmap inside the cell.
    pub dst_xoff: i32,
    /// How far left of the origin the ink started, or where a leftward cell starts.
    pub exp_xoff: i32,
    /// `BBX` xoff of the new cell.
    pub xoff: i32,
}

impl Layout {
    /// Chooses the cell for a glyph from the signs of its xoff and its advance.
    ///
    /// A rightward advance puts the cell at the origin, shifting ink that starts left of
    /// the origin into it. A leftward advance starts the cell where either the ink or
    /// the advance ends, whichever is further left.
    pub fn of(bbx: &Bbx, dwidth: &Width) -> Self {
        let advance = dwidth.x;

        if advance < 0 {
            let left = bbx.xoff.min(advance);
            let right = (bbx.xoff + bbx.width).max(0);

            Self {
                width: right - left,
                dst_xoff: bbx.xoff - left,
                exp_xoff: left,
                xoff: left,
            }
        } else if bbx.xoff >= 0 {
            Self {
                width: (bbx.xoff + bbx.width).max(advance),
                dst_xoff: bbx.xoff,
                exp_xoff: 0,
                xoff: 0,
            }
        } else {
            Self {
                width: (bbx.width - bbx.xoff).max(advance),
                dst_xoff: -bbx.xoff,
                exp_xoff: bbx.xoff,
                xoff: 0,
            }
        }
    }
}

/// Draws the bitmap of `c` into a new zero filled `height` row buffer for `layout`,
/// with the glyph's top row at row `top`.
fn render(c: &Char, layout: &Layout, top: usize, height: usize) -> Vec<u8> {
    let src_size = c.row_size();
    let dst_size = row_size(layout.width);
    let src_width = c.bbx.width as usize;
    let mut data = vec![0; dst_size * height];

    for (y, src) in c.data.chunks(src_size.max(1)).enumerate() {
        let start = (top + y) * dst_size;
        bits::blit_row(
            src,
            src_width,
            &mut data[start..start + dst_size],
            layout.dst_xoff as usize,
        );
    }

    data
}

#[cfg(test)]
mod tests {
    use super::Layout;
    use crate::font::{Bbx, Width};

    fn layout(width: i32, xoff: i32, advance: i32) -> (i32, i32, i32, i32) {
        let bbx = Bbx {
            width,
            height: 1,
            xoff,
            yoff: 0,
        };
        let l = Layout::of(&bbx, &Width { x: advance, y: 0 });

        (l.width, l.dst_xoff, l.exp_xoff, l.xoff)
    }

    #[test_case(8, 0, 8 => (8, 0, 0, 0); "already a cell")]
    #[test_case(5, 1, 8 => (8, 1, 0, 0); "ink inside advance")]
    #[test_case(8, 2, 8 => (10, 2, 0, 0); "ink past advance")]
    #[test_case(6, -2, 6 => (8, 2, -2, 0); "ink left of origin")]
    #[test_case(4, -2, 6 => (6, 2, -2, 0); "ink left of origin inside advance")]
    #[test_case(4, -6, -6 => (6, 0, -6, -6); "leftward advance")]
    #[test_case(3, 1, -4 => (8, 5, -4, -4); "leftward advance with ink right of origin")]
    fn layout_cases(width: i32, xoff: i32, advance: i32) -> (i32, i32, i32, i32) {
        layout(width, xoff, advance)
    }

    #[test]
    fn cells_are_stable() {
        for (width, xoff, advance) in [(5, 1, 8), (6, -2, 6), (4, -6, -6), (3, 1, -4)] {
            let (w, _, _, x) = layout(width, xoff, advance);
            let again = layout(w, x, advance);

            assert_eq!((again.0, again.1, again.3), (w, 0, x));
        }
    }
}
