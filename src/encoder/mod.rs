//! Binary and text writers for normalized fonts.
//!
//! [`fnt`] takes an expanded font, [`psf`] a packed one. The BDF writer is
//! [`Font::write_bdf`](crate::Font::write_bdf) and accepts any stage.

pub mod bdf;
pub mod fnt;
pub mod psf;
