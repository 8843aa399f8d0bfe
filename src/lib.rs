//! `cedo`: read a shared object's DWARF debug info, project the source-level
//! types of a caller-chosen set of global variables, and emit an assembler
//! source file that reproduces those globals' current in-memory contents.
//!
//! The binary (`main.rs`) is a thin driver over this library; the interesting
//! engineering — the ELF/relocation reader, the DWARF parser, and the
//! assembly emitter — lives here so it can be exercised directly by
//! integration tests without going through a subprocess.

pub mod asm;
pub mod binfmt;
pub mod cursor;
pub mod dwarf;
pub mod elf;
pub mod error;
pub mod filemap;
pub mod leb;
pub mod runtime;
pub mod typebuilder;
pub mod types;
pub mod version;

use std::path::Path;

use tracing::warn;

use crate::asm::OutputSymbol;
use crate::binfmt::create_object_file_reader;
use crate::error::{CedoError, Result};
use crate::filemap::FileMap;
use crate::runtime::Runtime;

/// Opens `path` as an object file, parses its DWARF debug info, and for each
/// name in `wanted_syms` resolves both its source-level type and its live
/// address in `runtime`. Mirrors the original driver's `runUserCodeAndGetSyms`
/// inner closure: a symbol whose type or live address can't be found is
/// logged as a warning and skipped rather than aborting the whole run.
pub fn resolve_output_symbols(
    path: &Path,
    wanted_syms: &[String],
    runtime: &Runtime,
) -> Result<Vec<OutputSymbol>> {
    let file = FileMap::open(path)?;
    let object = create_object_file_reader(file)?;
    let dwarf = dwarf::read_from_elf_object(object.as_ref())?;

    let mut resolved = Vec::with_capacity(wanted_syms.len());
    for name in wanted_syms {
        let type_node = match typebuilder::build_variable_type(&dwarf, name) {
            Ok(t) => t,
            Err(CedoError::TypeNotFound(_)) => {
                warn!(symbol = %name, "couldn't find debug info for symbol");
                continue;
            }
            Err(e) => return Err(e),
        };

        let address = match runtime.find_symbol(name) {
            Some(a) => a,
            None => {
                warn!(symbol = %name, "symbol is in debug info but was not found in shared object");
                continue;
            }
        };

        resolved.push(OutputSymbol {
            name: name.clone(),
            type_node,
            address,
        });
    }

    Ok(resolved)
}
