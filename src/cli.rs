//! Command-line surface, mirroring the original's hand-rolled `parseArgs`
//! (spec.md §6) with `clap`'s derive API — the pack's idiomatic choice for
//! argument parsing (`foundry-rs-foundry`, `getsentry-symbolic`'s examples
//! all reach for it over hand-rolled loops).

use std::path::PathBuf;

use clap::Parser;

use cedo::error::{CedoError, Result};

#[derive(Debug, Parser)]
#[command(name = "cedo", version, about = "Snapshot a shared object's globals into GAS assembly")]
pub struct Cli {
    /// Shared object to load and read debug info from.
    pub input: PathBuf,

    /// Global variable to export; repeatable.
    #[arg(short = 's', long = "sym", required = true)]
    pub syms: Vec<String>,

    /// Output path (default: input with its extension replaced by `.s`).
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Required, reserved for future non-save-temps modes.
    #[arg(short = 'S')]
    pub save_temps: bool,

    /// Suppress the version substring in the `.ident` directive.
    #[arg(long = "no-version")]
    pub no_version: bool,

    /// Reproduce `findAlignment`'s quirky result as-is but also emit the
    /// true power-of-two alignment as a trailing comment.
    #[arg(long = "extended-align")]
    pub extended_align: bool,

    /// Raises the tracing verbosity floor; repeat for more (`-v` = info,
    /// `-vv` = debug). Overridable with `RUST_LOG`.
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// `-S` is parsed as an ordinary optional flag by `clap` (there is no
    /// "flag that is itself required" primitive), so its presence is
    /// checked by hand, matching the original's dedicated check in
    /// `parseArgs` before falling back to `std::exit(1)`.
    pub fn validate(&self) -> Result<()> {
        if !self.save_temps {
            return Err(CedoError::Other("-S must currently be specified".into()));
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        if let Some(out) = &self.output {
            return out.clone();
        }
        let mut out = self.input.clone();
        out.set_extension("s");
        out
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
