use std::{path::PathBuf, process::ExitCode};

use anyhow::{bail, Context};
use bdf_transcode::{
    cli::{self, Located, Output},
    encoder::psf::{self, Version},
    parser::{bdf, extra::Extras},
};
use clap::Parser;
use log::info;

/// Converts a BDF font into a PC screen font.
#[derive(Parser)]
pub struct Args {
    /// Glyph data only, no header or unicode table.
    #[clap(short = 'r', group = "format")]
    pub raw: bool,
    /// PSF1, for 256 or 512 glyphs of 8 pixels width.
    #[clap(short = '1', group = "format")]
    pub v1: bool,
    /// PSF2.
    #[clap(short = '2', group = "format")]
    pub v2: bool,
    /// Swap glyph blocks 0..32 and 192..224 as in the VGA character ROM.
    #[clap(short = 'g', conflicts_with = "no_exchange")]
    pub exchange: bool,
    /// Never swap, even for fonts that look like a VGA character ROM.
    #[clap(short = 'G')]
    pub no_exchange: bool,
    /// Written to stdout when absent.
    #[clap(long, short = 'o')]
    pub output: Option<PathBuf>,
    /// Read from stdin when absent.
    pub input: Option<PathBuf>,
    /// Tables of extra code points for the unicode table.
    pub extras: Vec<PathBuf>,
}

impl Args {
    fn options(&self) -> psf::Options {
        let version = if self.raw {
            Some(Version::Raw)
        } else if self.v1 {
            Some(Version::V1)
        } else if self.v2 {
            Some(Version::V2)
        } else {
            None
        };

        let exchange = match (self.exchange, self.no_exchange) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };

        psf::Options { version, exchange }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let output = Output::new(args.output.clone());
    if output.is_char_device() {
        bail!("{}: will not write a font to a character device", output.name());
    }

    let name = cli::input_name(args.input.as_deref());
    let input = cli::read_input(args.input.as_deref())?;

    let font = bdf::parse(&input).map_err(|e| Located::new(&name, e))?;
    let font = font.pack().with_context(|| name.clone())?;

    let mut extras = Extras::new();
    for path in &args.extras {
        let table = cli::read_input(Some(path))?;
        extras
            .load(&table, &font)
            .map_err(|e| Located::new(path.display().to_string(), e))?;
    }

    let data = psf::encode(&font, &extras, &args.options()).with_context(|| name.clone())?;

    output.write(&data)?;
    info!("{name}: {} glyphs written to {}", font.chars.len(), output.name());

    Ok(())
}

fn main() -> ExitCode {
    cli::init_logging();
    cli::exit("bdf2psf", run(Args::parse()))
}
