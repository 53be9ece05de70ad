//! Text input formats: BDF fonts and extra code point tables.

pub mod bdf;
pub mod extra;
