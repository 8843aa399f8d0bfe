//! The ELF object-format backend: section lookup and RELA relocation
//! resolution, generalized over the four (endianness, address-size) ABI
//! combinations the same way the original's `ELFReaderImpl<Endianness,
//! AddressSize>` template did. Mach-O has no role in the new target list, so
//! this module replaces the teacher's `macho.rs` as the sole `ObjectReader`.

use crate::binfmt::{AddressSize, Endianness, FileFormat, ObjectReader, Triple};
use crate::cursor::ByteCursor;
use crate::error::{CedoError, Result};
use crate::filemap::FileMap;

pub const MAGIC_OFFSET: usize = 0;
pub const MAGIC: &[u8] = b"\x7fELF";

const EI_CLASS: usize = 4;
const EI_DATA: usize = 5;

const ELFCLASS32: u8 = 1;
const ELFCLASS64: u8 = 2;
const ELFDATA2LSB: u8 = 1;
const ELFDATA2MSB: u8 = 2;

const R_X86_64_32: u32 = 10;
const R_X86_64_64: u32 = 1;

/// Reads `ehdr[4]`/`ehdr[5]` to recover the address size and byte order this
/// file was produced with. Mirrors `ELF::getAddressSize`/`getEndianness`.
pub fn acceptor(bytes: &[u8]) -> Option<Triple> {
    if bytes.len() <= 6 {
        return None;
    }
    let addr_size = match bytes[EI_CLASS] {
        ELFCLASS32 => AddressSize::Four,
        ELFCLASS64 => AddressSize::Eight,
        _ => return None,
    };
    let endianness = match bytes[EI_DATA] {
        ELFDATA2LSB => Endianness::Little,
        ELFDATA2MSB => Endianness::Big,
        _ => return None,
    };
    Some(Triple {
        file_format: FileFormat::Elf,
        addr_size,
        endianness,
    })
}

pub fn create_reader(file: FileMap, triple: Triple) -> Result<Box<dyn ObjectReader>> {
    Ok(Box::new(ElfReader { file, triple }))
}

/// Layout offsets shared by Elf32_Ehdr/Elf64_Ehdr up to the point the fields
/// diverge in width; everything past `e_shoff` is read field-by-field via a
/// cursor rather than transmuted through a packed struct, since Rust has no
/// `__attribute__((packed))` reinterpret-cast escape hatch to lean on.
struct EhdrLayout {
    e_shoff: u64,
    e_shnum: u16,
    e_shstrndx: u16,
}

struct ShdrLayout {
    sh_name: u32,
    sh_offset: u64,
    sh_size: u64,
}

pub struct ElfReader {
    file: FileMap,
    triple: Triple,
}

impl ElfReader {
    fn cursor_at(&self, pos: usize) -> ByteCursor<'_> {
        ByteCursor::at(self.file.bytes(), self.triple.endianness, pos)
    }

    fn read_ehdr(&self) -> Result<EhdrLayout> {
        let wide = self.triple.addr_size == AddressSize::Eight;
        // e_ident[16] + e_type(2) + e_machine(2) + e_version(4) + e_entry(addr)
        let mut c = self.cursor_at(16 + 2 + 2 + 4);
        c.advance(if wide { 8 } else { 4 }); // e_entry
        let e_shoff_pos_width = if wide { 8 } else { 4 };
        c.advance(e_shoff_pos_width); // e_phoff
        let e_shoff = c
            .read_uint(e_shoff_pos_width)
            .map_err(|e| CedoError::MalformedObject(e.to_string()))?;
        c.advance(4); // e_flags
        c.advance(2); // e_ehsize
        c.advance(2); // e_phentsize
        c.advance(2); // e_phnum
        c.advance(2); // e_shentsize
        let e_shnum = c
            .read_uint(2)
            .map_err(|e| CedoError::MalformedObject(e.to_string()))? as u16;
        let e_shstrndx = c
            .read_uint(2)
            .map_err(|e| CedoError::MalformedObject(e.to_string()))? as u16;
        Ok(EhdrLayout {
            e_shoff,
            e_shnum,
            e_shstrndx,
        })
    }

    fn shdr_entry_size(&self) -> usize {
        if self.triple.addr_size == AddressSize::Eight {
            64
        } else {
            40
        }
    }

    fn read_shdr(&self, shoff: u64, index: u16) -> Result<ShdrLayout> {
        let wide = self.triple.addr_size == AddressSize::Eight;
        let entry_size = self.shdr_entry_size();
        let base = shoff as usize + index as usize * entry_size;
        let mut c = self.cursor_at(base);
        let sh_name = c
            .read_u32()
            .map_err(|e| CedoError::MalformedObject(e.to_string()))?;
        c.advance(4); // sh_type
        c.advance(if wide { 8 } else { 4 }); // sh_flags
        c.advance(if wide { 8 } else { 4 }); // sh_addr
        let sh_offset = c
            .read_uint(if wide { 8 } else { 4 })
            .map_err(|e| CedoError::MalformedObject(e.to_string()))?;
        let sh_size = c
            .read_uint(if wide { 8 } else { 4 })
            .map_err(|e| CedoError::MalformedObject(e.to_string()))?;
        Ok(ShdrLayout {
            sh_name,
            sh_offset,
            sh_size,
        })
    }

    fn section_name(&self, strtab_offset: u64, sh_name: u32) -> Result<String> {
        let mut c = self.cursor_at(strtab_offset as usize + sh_name as usize);
        c.read_cstr().map_err(|e| CedoError::MalformedObject(e.to_string()))
    }

    fn find_section_index(&self, name: &str) -> Result<Option<(ShdrLayout, u16)>> {
        let ehdr = self.read_ehdr()?;
        if ehdr.e_shoff == 0 || ehdr.e_shstrndx >= ehdr.e_shnum {
            return Ok(None);
        }
        let shstr = self.read_shdr(ehdr.e_shoff, ehdr.e_shstrndx)?;
        for index in 0..ehdr.e_shnum {
            let shdr = self.read_shdr(ehdr.e_shoff, index)?;
            if self.section_name(shstr.sh_offset, shdr.sh_name)? == name {
                return Ok(Some((shdr, index)));
            }
        }
        Ok(None)
    }

    /// Returns `(st_value, st_shndx)` for the symbol-table entry at
    /// `sym_index`; `st_value` of a section- or function-local symbol in an
    /// unlinked object is itself section-relative, so the caller still has
    /// to add the target section's `sh_offset` to get a file position.
    fn symbol_value_and_shndx(&self, symtab_off: u64, sym_index: u64) -> Result<(u64, u16)> {
        let wide = self.triple.addr_size == AddressSize::Eight;
        // Elf32_Sym: name(4) info(1) other(1) shndx(2) value(4) size(4)
        // Elf64_Sym: name(4) info(1) other(1) shndx(2) value(8) size(8)
        let entry_size: u64 = if wide { 24 } else { 16 };
        let base = symtab_off + sym_index * entry_size;
        let mut c = self.cursor_at(base as usize);
        c.advance(4); // st_name
        if wide {
            c.advance(1); // st_info
            c.advance(1); // st_other
            let st_shndx = c
                .read_u16()
                .map_err(|e| CedoError::MalformedObject(e.to_string()))?;
            let st_value = c
                .read_u64()
                .map_err(|e| CedoError::MalformedObject(e.to_string()))?;
            Ok((st_value, st_shndx))
        } else {
            c.advance(1);
            c.advance(1);
            let st_shndx = c
                .read_u16()
                .map_err(|e| CedoError::MalformedObject(e.to_string()))?;
            let st_value = c
                .read_u32()
                .map_err(|e| CedoError::MalformedObject(e.to_string()))? as u64;
            Ok((st_value, st_shndx))
        }
    }

    fn section_offset_by_index(&self, index: u16) -> Result<u64> {
        let ehdr = self.read_ehdr()?;
        let shdr = self.read_shdr(ehdr.e_shoff, index)?;
        Ok(shdr.sh_offset)
    }
}

impl ObjectReader for ElfReader {
    fn triple(&self) -> Triple {
        self.triple
    }

    fn get_section(&self, name: &str) -> Option<&[u8]> {
        let (shdr, _) = self.find_section_index(name).ok()??;
        let start = shdr.sh_offset as usize;
        let end = start + shdr.sh_size as usize;
        self.file.bytes().get(start..end)
    }

    fn resolve_local_reloc(&self, section_name: &str, offset: u64) -> Result<&[u8]> {
        let rela_name = format!(".rela{}", section_name);
        let (rela_shdr, _) = self
            .find_section_index(&rela_name)?
            .ok_or_else(|| CedoError::MalformedObject(format!("no {} section", rela_name)))?;
        let (symtab_shdr, _) = self
            .find_section_index(".symtab")?
            .ok_or_else(|| CedoError::MalformedObject("no .symtab section".into()))?;

        let wide = self.triple.addr_size == AddressSize::Eight;
        // Elf32_Rela: offset(4) info(4) addend(4)
        // Elf64_Rela: offset(8) info(8) addend(8)
        let entry_size: u64 = if wide { 24 } else { 12 };
        let count = rela_shdr.sh_size / entry_size;

        for i in 0..count {
            let base = rela_shdr.sh_offset + i * entry_size;
            let mut c = self.cursor_at(base as usize);
            let r_offset = c
                .read_uint(if wide { 8 } else { 4 })
                .map_err(|e| CedoError::MalformedObject(e.to_string()))?;
            if r_offset != offset {
                continue;
            }
            let r_info = c
                .read_uint(if wide { 8 } else { 4 })
                .map_err(|e| CedoError::MalformedObject(e.to_string()))?;
            let r_addend = if wide {
                c.read_uint(8).map_err(|e| CedoError::MalformedObject(e.to_string()))? as i64
            } else {
                // A 32-bit addend is two's-complement; zero-extending it via
                // `read_uint` then casting to `i64` would turn a negative
                // addend into a huge positive one, so read it as `i32` and
                // sign-extend instead.
                let bytes: [u8; 4] = c
                    .read_bytes(4)
                    .map_err(|e| CedoError::MalformedObject(e.to_string()))?
                    .try_into()
                    .unwrap();
                (match self.triple.endianness {
                    Endianness::Little => i32::from_le_bytes(bytes),
                    Endianness::Big => i32::from_be_bytes(bytes),
                }) as i64
            };

            let (sym_index, r_type) = if wide {
                (r_info >> 32, (r_info & 0xffff_ffff) as u32)
            } else {
                (r_info >> 8, (r_info & 0xff) as u32)
            };

            if r_type != R_X86_64_32 && r_type != R_X86_64_64 {
                return Err(CedoError::UnsupportedForm(format!(
                    "relocation type {r_type} in {rela_name}"
                )));
            }

            let (sym_value, sym_shndx) =
                self.symbol_value_and_shndx(symtab_shdr.sh_offset, sym_index)?;
            let sym_section_offset = self.section_offset_by_index(sym_shndx)?;

            let target = (sym_section_offset as i64 + sym_value as i64 + r_addend) as u64;
            return self
                .file
                .bytes()
                .get(target as usize..)
                .ok_or_else(|| CedoError::MalformedObject(format!("relocation target 0x{target:x} out of range")));
        }

        Err(CedoError::MalformedObject(format!(
            "no relocation at offset {offset} in {rela_name}"
        )))
    }
}
