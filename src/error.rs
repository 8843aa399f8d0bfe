//! Error taxonomy shared by every layer of `cedo`.
//!
//! This replaces the original C++ implementation's hand-rolled `ErrorOr<T>`
//! (itself lifted from `llvm::ErrorOr`) with a `thiserror`-derived enum. The
//! variants mirror the taxonomy the design calls for: I/O, format rejection,
//! malformed object/DWARF data, unsupported encodings, and the two runtime
//! lookup failures that the driver treats as warnings rather than aborts.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CedoError {
    #[error("couldn't open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no registered object format accepted the file")]
    FormatRejected,

    #[error("malformed object file: {0}")]
    MalformedObject(String),

    #[error("malformed DWARF: {0}")]
    MalformedDwarf(String),

    #[error("unsupported DWARF encoding: {0}")]
    UnsupportedForm(String),

    #[error("no type information for '{0}'")]
    TypeNotFound(String),

    #[error("symbol '{0}' not found in shared object")]
    SymbolNotFound(String),

    #[error("non-null pointer at 0x{0:x} does not target a known output symbol")]
    PointerUnresolved(u64),

    #[error("two output symbols share live address 0x{0:x}")]
    DuplicateAddress(u64),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CedoError>;
