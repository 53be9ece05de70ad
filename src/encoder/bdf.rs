use std::io::{self, Write};

use crate::font::{Font, Stage};

#[allow(private_bounds)]
impl<S: Stage> Font<S> {
    /// Writes the font back as BDF.
    ///
    /// Properties come out in their original order with their raw values. The
    /// `STARTPROPERTIES` and `CHARS` counts are recomputed and bitmaps are written as
    /// uppercase hex. Comments are not kept.
    pub fn write_bdf<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let property_count = self
            .props
            .iter()
            .skip_while(|(name, _)| *name != "STARTPROPERTIES")
            .skip(1)
            .take_while(|(name, _)| *name != "ENDPROPERTIES")
            .count();

        for (name, value) in self.props.iter() {
            match name {
                "STARTPROPERTIES" => writeln!(w, "STARTPROPERTIES {property_count}")?,
                "CHARS" => writeln!(w, "CHARS {}", self.chars.len())?,
                _ => write_property(w, name, value)?,
            }
        }

        for c in &self.chars {
            for (name, value) in c.props.iter() {
                write_property(w, name, value)?;
            }

            writeln!(w, "BITMAP")?;
            for y in 0..c.bbx.height.max(0) as usize {
                for byte in c.row(y) {
                    write!(w, "{byte:02X}")?;
                }
                writeln!(w)?;
            }
            writeln!(w, "ENDCHAR")?;
        }

        writeln!(w, "ENDFONT")
    }
}

fn write_property<W: Write>(w: &mut W, name: &str, value: &[u8]) -> io::Result<()> {
    w.write_all(name.as_bytes())?;
    if !value.is_empty() {
        w.write_all(b" ")?;
        w.write_all(value)?;
    }
    w.write_all(b"\n")
}
