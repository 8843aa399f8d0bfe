//! DWARF debug-info parsing: constants, the abbrev/DIE-tree reader.

pub mod constants;
mod reader;

pub use constants::{DwAt, DwForm, DwTag, DwarfType};
pub use reader::{read_from_elf_object, Die, DieValue, Dwarf};
