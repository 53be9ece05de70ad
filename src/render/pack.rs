use super::{render, Layout, PackError, PACKED_WIDTH_LIMIT};
use crate::font::{Bbx, Font, Packed, Stage, WidthStats};

#[allow(private_bounds)]
impl<S: Stage> Font<S> {
    /// Re-renders every glyph into the font's own cell height, anchored at the font's
    /// baseline, for formats that store no per glyph vertical offset.
    ///
    /// Every glyph must fit between the font's descent and ascent. The first glyph that
    /// does not aborts the whole conversion.
    pub fn pack(self) -> Result<Font<Packed>, PackError> {
        let height = self.bbx.height;
        let yoff = self.bbx.yoff;

        let layouts = self
            .chars
            .iter()
            .enumerate()
            .map(|(index, c)| {
                let above_bottom = c.bbx.yoff - yoff;
                if above_bottom < 0 {
                    return Err(PackError::BelowBaseline { index });
                }
                if above_bottom + c.bbx.height > height {
                    return Err(PackError::AboveAscent { index });
                }

                let layout = Layout::of(&c.bbx, &c.dwidth);
                if layout.width > PACKED_WIDTH_LIMIT {
                    return Err(PackError::Width {
                        index,
                        width: layout.width,
                    });
                }

                let top = (height - above_bottom - c.bbx.height) as usize;
                Ok((layout, top))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut font = self;
        let mut stats = WidthStats::default();
        let mut left = i32::MAX;
        let mut right = i32::MIN;

        for (c, (layout, top)) in font.chars.iter_mut().zip(layouts) {
            // only a box that already is the cell keeps its buffer
            if layout.width != c.bbx.width || c.bbx.height != height {
                c.data = render(c, &layout, top, height as usize);
            }

            c.bbx = Bbx {
                width: layout.width,
                height,
                xoff: layout.xoff,
                yoff,
            };
            c.props.set("BBX", c.bbx.to_string());

            stats.add(layout.width);
            left = left.min(layout.xoff);
            right = right.max(layout.xoff + layout.width);
        }

        if !font.chars.is_empty() {
            font.bbx.width = right - left;
            font.bbx.xoff = left;
            font.props.set("FONTBOUNDINGBOX", font.bbx.to_string());
        }

        let metrics = stats.finish();
        debug!(
            "Packed {} glyphs into {}x{height} cells",
            font.chars.len(),
            metrics.max_width
        );

        Ok(font.into_stage(Packed { metrics }))
    }
}
