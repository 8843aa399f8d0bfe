//! The `cedo` driver: wires the CLI surface, the dynamic loader, and the
//! core ELF/DWARF/emitter pipeline together. Mirrors `cedo.cpp`'s `main` and
//! `runUserCodeAndGetSyms`; the interesting engineering lives in the library
//! crate (`lib.rs` and its submodules), not here.

mod cli;

use std::fs::File;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cedo::asm::{emit_asm, AsmStreamer, EmitOptions};
use cedo::binfmt::{find_file_triple, Triple};
use cedo::error::CedoError;
use cedo::filemap::FileMap;
use cedo::runtime::Runtime;
use cedo::version::version_string;
use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .init();

    if let Err(e) = cli.validate() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CedoError> {
    let output_triple = triple_of(cli)?;

    // Loading the shared object runs its static initializers (the dynamic
    // loader's doing, not ours) before we read any symbol's current bytes.
    // Resolving symbols happens before `main` is invoked below, matching the
    // original's `Runtime::run`, which runs its "concurrent" closure ahead
    // of calling the target's `main` (a TODO there to make this genuinely
    // concurrent, not fixed up here).
    let runtime = Runtime::load_user_code(&cli.input)?;
    let symbols = cedo::resolve_output_symbols(&cli.input, &cli.syms, &runtime)?;

    let exit_code = runtime.run_main(&[])?;
    if exit_code != 0 {
        return Err(CedoError::Other(format!("Exit code: '{exit_code}'")));
    }

    let version_str = if cli.no_version {
        None
    } else {
        Some(version_string())
    };
    let options = EmitOptions {
        version_str,
        extended_align: cli.extended_align,
    };

    let output_path = cli.output_path();
    let file = File::create(&output_path).map_err(|source| CedoError::Io {
        path: output_path.clone(),
        source,
    })?;
    let mut streamer = AsmStreamer::new(file);
    emit_asm(output_triple, &symbols, &mut streamer, &options)?;

    Ok(())
}

/// The emitter's output triple is the input object's own triple (spec.md's
/// non-goal: no cross-endian output translation), so it's read straight
/// back off the file rather than threaded separately through the CLI.
fn triple_of(cli: &Cli) -> Result<Triple, CedoError> {
    let file = FileMap::open(&cli.input)?;
    find_file_triple(file.bytes()).ok_or(CedoError::FormatRejected)
}
