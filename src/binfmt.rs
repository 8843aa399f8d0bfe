//! Object-format identification and the format dispatch table.
//!
//! The C++ original used a virtual `ObjectFileReader` base class with
//! `dynamic_cast` downcasts to the concrete `ELF::Reader`. Per the design
//! notes this is replaced with a capability trait: anything that can answer
//! `get_triple`/`get_section`/`resolve_local_reloc` is an `ObjectReader`, and
//! `DwarfReader` only ever talks to that trait object.

use crate::error::{CedoError, Result};
use crate::filemap::FileMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Elf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSize {
    Four,
    Eight,
}

impl AddressSize {
    pub fn bytes(self) -> usize {
        match self {
            AddressSize::Four => 4,
            AddressSize::Eight => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// The (format, address-size, endianness) tuple identifying a target ABI
/// flavor. Immutable once produced by a format acceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triple {
    pub file_format: FileFormat,
    pub addr_size: AddressSize,
    pub endianness: Endianness,
}

/// Capability interface every object-file reader exposes to `DwarfReader`
/// and the rest of the core. Stands in for the original's
/// `ObjectFileReader`/`ELF::Reader` virtual hierarchy.
pub trait ObjectReader {
    fn triple(&self) -> Triple;

    /// Locates a section by name via the section-header string table.
    /// Returns `None` if no section with that name exists.
    fn get_section(&self, name: &str) -> Option<&[u8]>;

    /// Resolves a section-relative offset whose value was left as zero in
    /// the file (because the linker would normally have patched it) back to
    /// a byte pointer in the mapped file, using `.rela<section_name>`.
    fn resolve_local_reloc(&self, section_name: &str, offset: u64) -> Result<&[u8]>;
}

type Acceptor = fn(&[u8]) -> Option<Triple>;
type ReaderFactory = fn(FileMap, Triple) -> Result<Box<dyn ObjectReader>>;

struct RegisteredFormat {
    magic_offset: usize,
    magic: &'static [u8],
    acceptor: Acceptor,
    make_reader: ReaderFactory,
}

fn formats() -> &'static [RegisteredFormat] {
    &[RegisteredFormat {
        magic_offset: crate::elf::MAGIC_OFFSET,
        magic: crate::elf::MAGIC,
        acceptor: crate::elf::acceptor,
        make_reader: crate::elf::create_reader,
    }]
}

fn matching_format<'a>(bytes: &[u8], candidates: &'a [RegisteredFormat]) -> Option<&'a RegisteredFormat> {
    candidates.iter().find(|fmt| {
        bytes.len() >= fmt.magic_offset + fmt.magic.len()
            && &bytes[fmt.magic_offset..fmt.magic_offset + fmt.magic.len()] == fmt.magic
    })
}

/// Scans the registered formats in order, returning the first acceptor that
/// matches the magic and succeeds.
pub fn find_file_triple(bytes: &[u8]) -> Option<Triple> {
    let fmt = matching_format(bytes, formats())?;
    (fmt.acceptor)(bytes)
}

/// Analogous to `find_file_triple`, but also constructs the reader.
pub fn create_object_file_reader(file: FileMap) -> Result<Box<dyn ObjectReader>> {
    let fmt = matching_format(file.bytes(), formats()).ok_or(CedoError::FormatRejected)?;
    let triple = (fmt.acceptor)(file.bytes()).ok_or(CedoError::FormatRejected)?;
    (fmt.make_reader)(file, triple)
}
