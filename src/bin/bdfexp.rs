use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use bdf_transcode::{
    cli::{self, Located, Output},
    parser::bdf,
};
use clap::Parser;
use log::info;

/// Rewrites a BDF font with every glyph expanded to the full font height.
#[derive(Parser)]
pub struct Args {
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

    let mut data = Vec::with_capacity(input.len());
    font.write_bdf(&mut data)?;

    let output = Output::new(args.output);
    output.write(&data)?;
    info!("{name}: {} glyphs written to {}", font.chars.len(), output.name());

    Ok(())
}

fn main() -> ExitCode {
    cli::init_logging();
    cli::exit("bdfexp", run(Args::parse()))
}
