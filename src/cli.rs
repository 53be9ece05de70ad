//! Input and output plumbing shared by the binaries.

use std::{
    fmt::{Debug, Display},
    fs,
    io::{self, IsTerminal, Read, Write},
    num::ParseIntError,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use thiserror::Error;

const STDIN: &str = "<stdin>";
const STDOUT: &str = "<stdout>";

/// An error at a line of a named input, shown as `file:line: message`.
#[derive(Error, Debug)]
#[error("{file}:{error}")]
pub struct Located<E: Display + Debug> {
    pub file: String,
    pub error: E,
}

impl<E: Display + Debug> Located<E> {
    pub fn new(file: impl Into<String>, error: E) -> Self {
        Self {
            file: file.into(),
            error,
        }
    }
}

/// Name of an input in diagnostics.
pub fn input_name(path: Option<&Path>) -> String {
    path.map_or_else(|| STDIN.to_owned(), |p| p.display().to_string())
}

/// Reads a whole input file, or stdin when `path` is absent.
pub fn read_input(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    let mut data = Vec::new();
    match path {
        Some(path) => {
            data = fs::read(path).with_context(|| path.display().to_string())?;
        }
        None => {
            io::stdin().lock().read_to_end(&mut data).context(STDIN)?;
        }
    }

    debug!("Read {} bytes from {}", data.len(), input_name(path));

    Ok(data)
}

/// Destination of a converted font: a file, or stdout when no path is given.
#[derive(Debug, Clone)]
pub struct Output {
    path: Option<PathBuf>,
}

impl Output {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn name(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| STDOUT.to_owned(), |p| p.display().to_string())
    }

    /// Whether the output is a terminal or another character device.
    pub fn is_char_device(&self) -> bool {
        match &self.path {
            Some(path) => fs::metadata(path).is_ok_and(|m| is_char_device(&m)),
            None => {
                io::stdout().is_terminal()
                    || fs::metadata("/dev/stdout").is_ok_and(|m| is_char_device(&m))
            }
        }
    }

    /// Writes the whole font. A file that was created but could not be written
    /// completely is removed again.
    pub fn write(&self, data: &[u8]) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(data)
                .and_then(|()| stdout.flush())
                .context(STDOUT)?;
            return Ok(());
        };

        let mut file = fs::File::create(path).with_context(|| self.name())?;
        if let Err(e) = file.write_all(data).and_then(|()| file.flush()) {
            drop(file);
            if let Err(remove) = fs::remove_file(path) {
                warn!("Could not remove {}: {remove}", self.name());
            }
            return Err(e).with_context(|| self.name());
        }

        debug!("Wrote {} bytes to {}", data.len(), self.name());

        Ok(())
    }
}

#[cfg(unix)]
fn is_char_device(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;

    metadata.file_type().is_char_device()
}

#[cfg(not(unix))]
fn is_char_device(_: &fs::Metadata) -> bool {
    false
}

/// Parses a decimal or `0x` prefixed hex byte, for numeric options.
pub fn parse_byte(s: &str) -> Result<u8, ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

/// Logs to stderr, `warn` and above unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}

/// Prints a failed run as a single `program: message` line.
pub fn exit(program: &str, result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{program}: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use super::{input_name, parse_byte, read_input, Located, Output};
    use crate::parser::bdf;

    #[test_case("32" => Ok(32); "decimal")]
    #[test_case("0x20" => Ok(32); "hex")]
    #[test_case("0XfF" => Ok(255); "upper prefix")]
    #[test_case("256" => Err(()); "too big")]
    #[test_case("0x" => Err(()); "no digits")]
    #[test_case("-1" => Err(()); "negative")]
    fn byte(s: &str) -> Result<u8, ()> {
        parse_byte(s).map_err(|_| ())
    }

    #[test]
    fn located_errors_name_file_and_line() {
        let e = bdf::parse(b"STARTFONT 2.1\nSIZE 8 75 75\n").unwrap_err();
        let located = Located::new("fixed.bdf", e);

        assert_eq!(located.to_string(), "fixed.bdf:2: FONT expected");
    }

    #[test]
    fn missing_input_names_the_file() {
        let path = Path::new("/nonexistent/font.bdf");
        let e = read_input(Some(path)).unwrap_err();

        assert!(format!("{e:#}").starts_with("/nonexistent/font.bdf: "));
        assert_eq!(input_name(None), "<stdin>");
    }

    #[test]
    fn output_round_trip() {
        let path = std::env::temp_dir().join(format!("bdf-transcode-{}.out", std::process::id()));
        let output = Output::new(Some(path.clone()));

        output.write(b"\x72\xB5\x4A\x86").unwrap();
        assert!(!output.is_char_device());
        assert_eq!(fs::read(&path).unwrap(), b"\x72\xB5\x4A\x86");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unwritable_output_fails() {
        let output = Output::new(Some(std::env::temp_dir()));
        assert!(output.write(b"data").is_err());
        assert!(std::env::temp_dir().is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn dev_null_is_a_char_device() {
        assert!(Output::new(Some("/dev/null".into())).is_char_device());
    }
}
