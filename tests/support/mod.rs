//! A minimal hand-rolled ELF builder for integration tests, standing in for
//! the original's compiled `Inputs/*.o` fixtures (`ELFFindSectionTest`,
//! `ELFResolveRelocTest`, `DWARFBasicTest`) which this crate has no toolchain
//! access to compile. Only the fields `elf.rs`/`dwarf/reader.rs` actually
//! read are filled in; everything else is left zeroed. Parameterized over
//! (address-size, endianness) so all four of spec.md §4.2's ABI
//! combinations have test coverage, not just 64-bit little-endian.

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Elf32,
    Elf64,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    fn put16(self, n: u16) -> [u8; 2] {
        match self {
            Endian::Little => n.to_le_bytes(),
            Endian::Big => n.to_be_bytes(),
        }
    }

    fn put32(self, n: u32) -> [u8; 4] {
        match self {
            Endian::Little => n.to_le_bytes(),
            Endian::Big => n.to_be_bytes(),
        }
    }

    fn put64(self, n: u64) -> [u8; 8] {
        match self {
            Endian::Little => n.to_le_bytes(),
            Endian::Big => n.to_be_bytes(),
        }
    }
}

pub struct ElfBuilder {
    class: Class,
    endian: Endian,
    // Index 0 is the conventional empty/null section; real sections follow.
    sections: Vec<(String, Vec<u8>)>,
}

impl ElfBuilder {
    /// 64-bit little-endian, the common case most tests exercise.
    pub fn new() -> ElfBuilder {
        ElfBuilder::new_with(Class::Elf64, Endian::Little)
    }

    pub fn new_with(class: Class, endian: Endian) -> ElfBuilder {
        ElfBuilder {
            class,
            endian,
            sections: vec![(String::new(), Vec::new())],
        }
    }

    fn wide(&self) -> bool {
        self.class == Class::Elf64
    }

    /// Adds a section, returning its eventual section-header index.
    pub fn add_section(&mut self, name: &str, data: Vec<u8>) -> u16 {
        self.sections.push((name.to_string(), data));
        (self.sections.len() - 1) as u16
    }

    pub fn build(&self) -> Vec<u8> {
        let mut sections = self.sections.clone();
        let wide = self.wide();
        let e = self.endian;

        // Build .debug_str-style shstrtab contents up front so we know the
        // final section count (shstrtab describes itself too).
        let mut shstrtab = vec![0u8]; // offset 0: the null section's empty name
        let mut name_offsets = vec![0u32];
        for (name, _) in sections.iter().skip(1) {
            let off = shstrtab.len() as u32;
            shstrtab.extend_from_slice(name.as_bytes());
            shstrtab.push(0);
            name_offsets.push(off);
        }
        let shstrtab_name_off = shstrtab.len() as u32;
        shstrtab.extend_from_slice(b".shstrtab");
        shstrtab.push(0);
        name_offsets.push(shstrtab_name_off);
        let shstrtab_index = sections.len() as u16;
        sections.push((".shstrtab".to_string(), shstrtab));

        // Lay out section contents after a 64-byte header block (bigger than
        // either Ehdr needs; only relative field offsets matter to the
        // reader), 8-byte aligned, in the order they were added.
        let mut offsets = vec![0u64; sections.len()];
        let mut cursor: u64 = 64;
        for (i, (_, data)) in sections.iter().enumerate() {
            if i == 0 {
                continue;
            }
            cursor = (cursor + 7) & !7;
            offsets[i] = cursor;
            cursor += data.len() as u64;
        }
        let shoff = (cursor + 7) & !7;

        let mut out = vec![0u8; 64];
        for (i, (_, data)) in sections.iter().enumerate() {
            if i == 0 {
                continue;
            }
            let off = offsets[i] as usize;
            if out.len() < off {
                out.resize(off, 0);
            }
            out.extend_from_slice(data);
        }
        if out.len() < shoff as usize {
            out.resize(shoff as usize, 0);
        }

        // Shdr array: only sh_name/sh_offset/sh_size are populated, matching
        // what `ElfReader::read_shdr` actually consults. Elf32_Shdr is 40
        // bytes (name(4) type(4) flags(4) addr(4) offset(4) size(4) ...);
        // Elf64_Shdr is 64 bytes (name(4) type(4) flags(8) addr(8) offset(8)
        // size(8) ...).
        let shdr_size: usize = if wide { 64 } else { 40 };
        for (i, (_, data)) in sections.iter().enumerate() {
            let mut shdr = vec![0u8; shdr_size];
            shdr[0..4].copy_from_slice(&e.put32(name_offsets[i]));
            let size = if i == 0 { 0 } else { data.len() as u64 };
            if wide {
                shdr[24..32].copy_from_slice(&e.put64(offsets[i]));
                shdr[32..40].copy_from_slice(&e.put64(size));
            } else {
                shdr[16..20].copy_from_slice(&e.put32(offsets[i] as u32));
                shdr[20..24].copy_from_slice(&e.put32(size as u32));
            }
            out.extend_from_slice(&shdr);
        }

        // Ehdr. e_shoff/e_shnum/e_shstrndx land at the same byte offsets as a
        // real Elf32_Ehdr/Elf64_Ehdr (32/48/50 vs 40/60/62), matching
        // `ElfReader::read_ehdr`'s width-parameterized field walk.
        out[0..4].copy_from_slice(&[0x7f, b'E', b'L', b'F']);
        out[4] = if wide { 2 } else { 1 }; // EI_CLASS
        out[5] = match e {
            Endian::Little => 1,
            Endian::Big => 2,
        }; // EI_DATA
        out[6] = 1; // EI_VERSION (current)
        if wide {
            out[40..48].copy_from_slice(&e.put64(shoff));
            out[60..62].copy_from_slice(&e.put16(sections.len() as u16));
            out[62..64].copy_from_slice(&e.put16(shstrtab_index));
        } else {
            out[32..36].copy_from_slice(&e.put32(shoff as u32));
            out[48..50].copy_from_slice(&e.put16(sections.len() as u16));
            out[50..52].copy_from_slice(&e.put16(shstrtab_index));
        }

        out
    }
}

/// Elf64_Rela: r_offset(8) r_info(8) r_addend(8, signed).
pub fn rela_entry(r_offset: u64, sym_index: u64, r_type: u32, addend: i64) -> Vec<u8> {
    rela_entry_with(Endian::Little, r_offset, sym_index, r_type, addend)
}

pub fn rela_entry_with(e: Endian, r_offset: u64, sym_index: u64, r_type: u32, addend: i64) -> Vec<u8> {
    let r_info = (sym_index << 32) | r_type as u64;
    let mut out = Vec::with_capacity(24);
    out.extend_from_slice(&e.put64(r_offset));
    out.extend_from_slice(&e.put64(r_info));
    out.extend_from_slice(&e.put64(addend as u64));
    out
}

/// Elf32_Rela: r_offset(4) r_info(4) r_addend(4, signed).
pub fn rela_entry32_with(e: Endian, r_offset: u32, sym_index: u32, r_type: u32, addend: i32) -> Vec<u8> {
    let r_info = (sym_index << 8) | (r_type & 0xff);
    let mut out = Vec::with_capacity(12);
    out.extend_from_slice(&e.put32(r_offset));
    out.extend_from_slice(&e.put32(r_info));
    out.extend_from_slice(&e.put32(addend as u32));
    out
}

/// Elf64_Sym: st_name(4) st_info(1) st_other(1) st_shndx(2) st_value(8) st_size(8).
pub fn sym_entry(st_shndx: u16, st_value: u64) -> Vec<u8> {
    sym_entry_with(Endian::Little, st_shndx, st_value)
}

pub fn sym_entry_with(e: Endian, st_shndx: u16, st_value: u64) -> Vec<u8> {
    let mut out = vec![0u8; 24];
    out[6..8].copy_from_slice(&e.put16(st_shndx));
    out[8..16].copy_from_slice(&e.put64(st_value));
    out
}

/// Elf32_Sym: st_name(4) st_info(1) st_other(1) st_shndx(2) st_value(4) st_size(4).
pub fn sym_entry32_with(e: Endian, st_shndx: u16, st_value: u32) -> Vec<u8> {
    let mut out = vec![0u8; 16];
    out[6..8].copy_from_slice(&e.put16(st_shndx));
    out[8..12].copy_from_slice(&e.put32(st_value));
    out
}

pub const R_X86_64_32: u32 = 10;

/// DWARF abbreviation-table + `.debug_info` bytes for a compile unit with
/// four `DW_TAG_variable` children (`one`, `two`, `four`, `eight`, sized
/// 1/2/4/8) each pointing at its own `DW_TAG_base_type` sibling, matching
/// spec.md §8 scenario 5. All attribute values are encoded inline
/// (`DW_FORM_string`/`DW_FORM_data1`) except `DW_AT_type`, which uses
/// `DW_FORM_ref4` holding the target DIE's absolute `.debug_info` offset
/// (this reader does not apply a CU-relative base adjustment to `ref4`).
pub fn debug_abbrev_basic_types() -> Vec<u8> {
    vec![
        // code 1: DW_TAG_compile_unit, children=yes, (DW_AT_name, DW_FORM_string)
        1, 0x11, 1, 0x03, 0x08, 0, 0,
        // code 2: DW_TAG_variable, children=no, (name,string) (type,ref4)
        2, 0x34, 0, 0x03, 0x08, 0x49, 0x13, 0, 0,
        // code 3: DW_TAG_base_type, children=no, (name,string) (byte_size,data1)
        3, 0x24, 0, 0x03, 0x08, 0x0b, 0x0b, 0, 0,
        // table terminator
        0,
    ]
}

pub fn debug_info_basic_types() -> Vec<u8> {
    // Reserve length(4, placeholder) + version(2) + abbrev_offset(4) + address_size(1).
    let mut info = vec![0u8; 11];
    info[4] = 4; // version = 4 (LE u16)
    info[10] = 8; // address_size = 8

    // Compile-unit DIE.
    info.push(1); // abbrev code 1
    info.extend_from_slice(b"cu\0");

    let vars = [("one", 1u8), ("two", 2), ("four", 4), ("eight", 8)];
    let mut var_ref_patch_positions = Vec::new();
    let mut var_offsets = Vec::new();
    for (name, _) in &vars {
        var_offsets.push(info.len() as u32);
        info.push(2); // abbrev code 2 (variable)
        info.extend_from_slice(name.as_bytes());
        info.push(0);
        var_ref_patch_positions.push(info.len());
        info.extend_from_slice(&[0, 0, 0, 0]); // DW_AT_type placeholder
    }

    let mut base_offsets = Vec::new();
    for (_, size) in &vars {
        base_offsets.push(info.len() as u32);
        info.push(3); // abbrev code 3 (base_type)
        let name = format!("base{size}\0");
        info.extend_from_slice(name.as_bytes());
        info.push(*size);
    }

    for (patch_pos, &target) in var_ref_patch_positions.iter().zip(base_offsets.iter()) {
        info[*patch_pos..*patch_pos + 4].copy_from_slice(&target.to_le_bytes());
    }

    info.push(0); // end-of-children for the compile unit

    let length = (info.len() - 4) as u32;
    info[0..4].copy_from_slice(&length.to_le_bytes());
    info
}
