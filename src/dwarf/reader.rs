//! DWARF <= 4 parsing: abbreviation table, compile-unit header, DIE tree.
//!
//! Generalizes the teacher's single-pass `dwarf.rs`/`macho.rs` DIE-tree walk
//! (itself already a close analogue, abbrev-table and all) onto an
//! `ObjectReader` trait object instead of a concrete Mach-O file, and adds
//! the `.rela.debug_info`-backed `StringPtr` resolution an unlinked ELF
//! object needs that a linked Mach-O image never did.

use crate::binfmt::{AddressSize, Endianness, ObjectReader, Triple};
use crate::cursor::{ByteCursor, CursorError};
use crate::dwarf::constants::{lookup_form, DwAt, DwForm, DwTag, DwarfType};
use crate::error::{CedoError, Result};

fn cursor_err(e: CursorError) -> CedoError {
    CedoError::MalformedDwarf(e.to_string())
}

#[derive(Debug, Clone)]
pub enum DieValue {
    Uint(u64),
    Str(String),
}

impl DieValue {
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            DieValue::Uint(v) => Some(*v),
            DieValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DieValue::Str(s) => Some(s),
            DieValue::Uint(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Die {
    pub tag: DwTag,
    pub offset: u64,
    pub info: Vec<(DwAt, DieValue)>,
    pub children_offsets: Vec<u64>,
}

impl Die {
    pub fn attr(&self, at: DwAt) -> Option<&DieValue> {
        self.info.iter().find(|(a, _)| *a == at).map(|(_, v)| v)
    }
}

#[derive(Debug)]
pub struct Dwarf {
    pub version: u16,
    pub addr_size: AddressSize,
    pub dies: Vec<Die>,
}

impl Dwarf {
    pub fn die_at_offset(&self, offset: u64) -> Option<&Die> {
        self.dies.iter().find(|d| d.offset == offset)
    }

    pub fn type_die_of(&self, die: &Die) -> Option<&Die> {
        let offset = die.attr(DwAt::TYPE)?.as_uint()?;
        self.die_at_offset(offset)
    }

    pub fn children_of<'a>(&'a self, die: &Die) -> impl Iterator<Item = &'a Die> + 'a {
        die.children_offsets
            .iter()
            .filter_map(move |&off| self.die_at_offset(off))
    }

    pub fn variable_named(&self, name: &str) -> Option<&Die> {
        self.dies.iter().find(|d| {
            d.tag == DwTag::VARIABLE && d.attr(DwAt::NAME).and_then(DieValue::as_str) == Some(name)
        })
    }
}

#[derive(Debug, Clone)]
struct Abbrev {
    tag: DwTag,
    children: bool,
    attributes: Vec<(DwAt, DwForm)>,
}

struct DwarfReader<'a> {
    object: &'a dyn ObjectReader,
    triple: Triple,
    abbrev_table: Vec<Abbrev>,
    current_sec_addr_size: AddressSize,
    parent_stack: Vec<u64>,
    dies: Vec<Die>,
}

pub fn read_from_elf_object(object: &dyn ObjectReader) -> Result<Dwarf> {
    let abbrev_sec = object
        .get_section(".debug_abbrev")
        .ok_or_else(|| CedoError::MalformedObject(".debug_abbrev section missing".into()))?;
    let debug_info_sec = object
        .get_section(".debug_info")
        .ok_or_else(|| CedoError::MalformedObject(".debug_info section missing".into()))?;

    let mut reader = DwarfReader {
        object,
        triple: object.triple(),
        abbrev_table: Vec::new(),
        current_sec_addr_size: AddressSize::Four,
        parent_stack: Vec::new(),
        dies: Vec::new(),
    };

    reader.read_abbrev_table(abbrev_sec)?;
    let version = reader.read_debug_info(debug_info_sec)?;

    Ok(Dwarf {
        version,
        addr_size: reader.triple.addr_size,
        dies: reader.dies,
    })
}

impl<'a> DwarfReader<'a> {
    fn read_abbrev_table(&mut self, bytes: &[u8]) -> Result<()> {
        let mut c = ByteCursor::new(bytes, Endianness::Little);
        self.abbrev_table.push(Abbrev {
            tag: DwTag(0),
            children: false,
            attributes: Vec::new(),
        });

        let mut expected_code: u64 = 1;
        loop {
            let code = c.read_u8().map_err(cursor_err)? as u64;
            if code == 0 {
                return Ok(());
            }
            if code != expected_code {
                return Err(CedoError::MalformedDwarf(format!(
                    "expected abbreviation code '{expected_code}' but found '{code}'"
                )));
            }

            let tag = DwTag(c.read_u8().map_err(cursor_err)?);
            let children = c.read_u8().map_err(cursor_err)? != 0;
            let mut attributes = Vec::new();
            loop {
                let attr = c.read_u8().map_err(cursor_err)?;
                let form_byte = c.read_u8().map_err(cursor_err)?;
                if attr == 0 && form_byte == 0 {
                    break;
                }
                let form = lookup_form(form_byte)
                    .ok_or_else(|| CedoError::UnsupportedForm(format!("DW_FORM 0x{form_byte:x}")))?;
                attributes.push((DwAt(attr), form));
            }

            self.abbrev_table.push(Abbrev { tag, children, attributes });
            expected_code += 1;
        }
    }

    fn read_debug_info(&mut self, bytes: &[u8]) -> Result<u16> {
        let mut c = ByteCursor::new(bytes, self.triple.endianness);

        let mut length = c.read_u32().map_err(cursor_err)? as u64;
        if length == 0xffff_ffff {
            length = c.read_u64().map_err(cursor_err)?;
            self.current_sec_addr_size = AddressSize::Eight;
        } else {
            if length >= 0xffff_fff0 {
                return Err(CedoError::MalformedDwarf(format!(
                    "initial length field has reserved value 0x{length:x}"
                )));
            }
            self.current_sec_addr_size = AddressSize::Four;
        }

        if length < 7 {
            return Err(CedoError::MalformedDwarf(
                "debug_info section is too small for needed data".into(),
            ));
        }
        let end = c.position() as u64 + length;

        let version = c.read_u16().map_err(cursor_err)?;
        let _abbrev_offset = c.read_u32().map_err(cursor_err)?;
        let addr_size_byte = c.read_u8().map_err(cursor_err)?;

        if version > 4 {
            return Err(CedoError::MalformedDwarf(format!(
                "unknown DWARF version '{version}'"
            )));
        }
        if addr_size_byte as usize != self.triple.addr_size.bytes() {
            return Err(CedoError::MalformedDwarf(
                "compile unit address size does not match the object's address size".into(),
            ));
        }

        while (c.position() as u64) < end {
            self.read_one_die(&mut c, end)?;
        }

        if !self.parent_stack.is_empty() {
            return Err(CedoError::MalformedDwarf(
                "did not find end-of-children marks for every DIE with children".into(),
            ));
        }

        Ok(version)
    }

    fn read_one_die(&mut self, c: &mut ByteCursor, end: u64) -> Result<()> {
        if c.position() as u64 >= end {
            return Err(CedoError::MalformedDwarf(
                "expected another DIE but .debug_info section has ended".into(),
            ));
        }

        let offset = c.position() as u64;
        let abbrev_code = c.read_u8().map_err(cursor_err)? as u64;

        if abbrev_code == 0 {
            if self.parent_stack.pop().is_some() {
                return Ok(());
            }
            return Err(CedoError::MalformedDwarf(
                "end-of-siblings marker found with no open parent".into(),
            ));
        }

        let abbrev = self
            .abbrev_table
            .get(abbrev_code as usize)
            .ok_or_else(|| {
                CedoError::MalformedDwarf(format!(
                    "abbreviation code '{abbrev_code}' is larger than largest known abbrev code '{}'",
                    self.abbrev_table.len() - 1
                ))
            })?
            .clone();

        if let Some(&parent_offset) = self.parent_stack.last() {
            if let Some(parent) = self.dies.iter_mut().find(|d| d.offset == parent_offset) {
                parent.children_offsets.push(offset);
            }
        }

        if abbrev.children {
            self.parent_stack.push(offset);
        }

        let mut info = Vec::with_capacity(abbrev.attributes.len());
        for (attr, form) in &abbrev.attributes {
            info.push((*attr, self.decode_form(c, *form)?));
        }

        self.dies.push(Die {
            tag: abbrev.tag,
            offset,
            info,
            children_offsets: Vec::new(),
        });

        Ok(())
    }

    fn decode_form(&self, c: &mut ByteCursor, form: DwForm) -> Result<DieValue> {
        match form.ty {
            DwarfType::String => Ok(DieValue::Str(c.read_cstr().map_err(cursor_err)?)),

            DwarfType::Exprloc => {
                let len = c.read_uleb128().map_err(cursor_err)?;
                c.read_bytes(len as usize).map_err(cursor_err)?;
                Ok(DieValue::Uint(0))
            }

            DwarfType::Uleb128 => Ok(DieValue::Uint(c.read_uleb128().map_err(cursor_err)?)),

            DwarfType::Sleb128 => Err(CedoError::UnsupportedForm(
                "DW_FORM_sdata (signed LEB128)".into(),
            )),

            DwarfType::Indirect => Err(CedoError::UnsupportedForm("DW_FORM_indirect".into())),

            DwarfType::FlagPresent => Ok(DieValue::Uint(1)),

            DwarfType::Fixed(_) | DwarfType::DwarfAddr | DwarfType::MachineAddr | DwarfType::StringPtr => {
                let width = self.form_width(form.ty);
                let field_offset = c.position() as u64;
                let value = c.read_uint(width).map_err(cursor_err)?;

                if form.ty == DwarfType::StringPtr {
                    self.resolve_string_ptr(value, field_offset)
                } else {
                    Ok(DieValue::Uint(value))
                }
            }
        }
    }

    fn form_width(&self, ty: DwarfType) -> usize {
        match ty {
            DwarfType::Fixed(w) => w as usize,
            DwarfType::DwarfAddr | DwarfType::StringPtr => self.current_sec_addr_size.bytes(),
            DwarfType::MachineAddr => self.triple.addr_size.bytes(),
            _ => unreachable!("form_width called on a dynamically-sized DwarfType"),
        }
    }

    /// A zero value means the linker would have patched it in; we resolve
    /// it from the `.rela.debug_info` entry covering this field instead. A
    /// relocation that can't be resolved degrades to an empty string rather
    /// than aborting the whole parse, per the attribute being non-essential.
    fn resolve_string_ptr(&self, value: u64, field_offset: u64) -> Result<DieValue> {
        if value != 0 {
            let debug_str = self
                .object
                .get_section(".debug_str")
                .ok_or_else(|| CedoError::MalformedObject(".debug_str section missing".into()))?;
            let mut sc = ByteCursor::at(debug_str, self.triple.endianness, value as usize);
            return Ok(DieValue::Str(sc.read_cstr().map_err(cursor_err)?));
        }

        match self.object.resolve_local_reloc(".debug_info", field_offset) {
            Ok(bytes) => {
                let mut sc = ByteCursor::new(bytes, self.triple.endianness);
                Ok(DieValue::Str(sc.read_cstr().map_err(cursor_err)?))
            }
            Err(_) => Ok(DieValue::Str(String::new())),
        }
    }
}
