use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use bdf_transcode::{
    cli::{self, Located, Output},
    encoder::fnt::{self, Family},
    parser::bdf,
};
use clap::Parser;
use log::info;

/// Converts a BDF font into a Windows 2.0 raster font.
#[derive(Parser)]
pub struct Args {
    /// Windows character set id, decimal or 0x hex.
    #[clap(long, short = 'c', default_value = "0", value_parser = cli::parse_byte)]
    pub charset: u8,
    /// Code of the first glyph. Guessed from the glyph count by default.
    #[clap(long, short = 'm', value_parser = cli::parse_byte)]
    pub min_char: Option<u8>,
    #[clap(long, short = 'f', value_enum, default_value_t)]
    pub family: Family,
    /// Written to stdout when absent.
    #[clap(long, short = 'o')]
    pub output: Option<PathBuf>,
    /// Read from stdin when absent.
    pub input: Option<PathBuf>,
}

fn run(args: Args) -> anyhow::Result<()> {
    let name = cli::input_name(args.input.as_deref());
    let input = cli::read_input(args.input.as_deref())?;

    let font = bdf::parse(&input).map_err(|e| Located::new(&name, e))?;
    let font = font.expand().with_context(|| name.clone())?;

    let options = fnt::Options {
        charset: args.charset,
        min_char: args.min_char,
        family: args.family,
    };
    let data = fnt::encode(&font, &options).with_context(|| name.clone())?;

    let output = Output::new(args.output);
    output.write(&data)?;
    info!("{name}: {} glyphs written to {}", font.chars.len(), output.name());

    Ok(())
}

fn main() -> ExitCode {
    cli::init_logging();
    cli::exit("bdf2fnt", run(Args::parse()))
}
