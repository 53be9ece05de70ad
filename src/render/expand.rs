use super::{render, ExpandError, Layout};
use crate::font::{Bbx, Expanded, Font, Stage, WidthStats, DEVICE_LIMIT};

#[allow(private_bounds)]
impl<S: Stage> Font<S> {
    /// Re-renders every glyph into one common height and baseline.
    ///
    /// The font ascent and descent grow to cover every glyph, then each glyph gets a
    /// cell of that height and a width chosen by [`Layout::of`]. Glyphs whose box is
    /// already a full cell keep their bitmap buffer untouched, so expanding an expanded
    /// font changes nothing.
    ///
    /// All cells are checked against the BBX limits before the first bitmap is touched.
    pub fn expand(self) -> Result<Font<Expanded>, ExpandError> {
        let (ascent, descent) = self.chars.iter().fold(
            (self.px_ascent(), self.px_descent()),
            |(ascent, descent), c| (ascent.max(c.bbx.ascent()), descent.max(-c.bbx.yoff)),
        );

        let height = ascent + descent;
        if height > DEVICE_LIMIT {
            return Err(ExpandError::Height(height));
        }

        let layouts = self
            .chars
            .iter()
            .enumerate()
            .map(|(index, c)| {
                let layout = Layout::of(&c.bbx, &c.dwidth);

                if layout.width > DEVICE_LIMIT {
                    Err(ExpandError::Width {
                        index,
                        width: layout.width,
                    })
                } else if layout.xoff < -DEVICE_LIMIT {
                    Err(ExpandError::Offset {
                        index,
                        xoff: layout.xoff,
                    })
                } else {
                    Ok(layout)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut font = self;
        let mut stats = WidthStats::default();
        let mut left = i32::MAX;
        let mut right = i32::MIN;

        for (c, layout) in font.chars.iter_mut().zip(&layouts) {
            if layout.width != c.bbx.width || height != c.bbx.height {
                let top = (ascent - c.bbx.ascent()) as usize;
                c.data = render(c, layout, top, height as usize);

                if layout.exp_xoff < 0 && layout.xoff == 0 {
                    debug!("char {}: moved right by {}", c.code, -layout.exp_xoff);
                }
            }

            c.bbx = Bbx {
                width: layout.width,
                height,
                xoff: layout.xoff,
                yoff: -descent,
            };
            c.props.set("BBX", c.bbx.to_string());

            stats.add(layout.width);
            left = left.min(layout.xoff);
            right = right.max(layout.xoff + layout.width);
        }

        if !font.chars.is_empty() {
            font.bbx = Bbx {
                width: right - left,
                height,
                xoff: left,
                yoff: -descent,
            };
            font.props.set("FONTBOUNDINGBOX", font.bbx.to_string());
        }

        if font.props.contains("FONT_ASCENT") {
            font.props.set("FONT_ASCENT", ascent.to_string());
        }
        if font.props.contains("FONT_DESCENT") {
            font.props.set("FONT_DESCENT", descent.to_string());
        }

        let metrics = stats.finish();
        debug!(
            "Expanded {} glyphs to height {height}, widths {}..={}",
            font.chars.len(),
            metrics.min_width,
            metrics.max_width
        );

        Ok(font.into_stage(Expanded { metrics }))
    }
}
