//! Walks an `OutputSymbol` list and drives an `AsmStreamer` through the
//! five-directive symbol prologue plus the value-line body for each type
//! variant. Grounded in the original's `EmitAsm.cpp`, generalized from its
//! integral-only `emitValueForIntegralType` to the pointer/aggregate/array
//! dispatch the type model now actually represents.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use crate::binfmt::{Endianness, Triple};
use crate::error::{CedoError, Result};
use crate::types::TypeNode;

use super::streamer::AsmStreamer;

/// A resolved export: a name, its projected type, and a live pointer into
/// the target process (or mapped shared object) the bytes are read from.
pub struct OutputSymbol {
    pub name: String,
    pub type_node: TypeNode,
    pub address: usize,
}

const DIRECTIVE_TABLE: &[(u64, &str)] = &[(8, ".quad"), (4, ".long"), (2, ".value"), (1, ".byte")];

fn io_err(e: std::io::Error) -> CedoError {
    CedoError::Other(e.to_string())
}

/// Reads `len` bytes starting at a raw address into the caller's address
/// space. Safety is borrowed entirely from the driver: by the time a
/// `OutputSymbol` exists, its address has already been validated by
/// `dlsym` against a type whose size was derived from DWARF, so this is
/// read-only and in-bounds as long as that type projection was accurate.
fn read_bytes_at(address: usize, len: usize) -> &'static [u8] {
    unsafe { std::slice::from_raw_parts(address as *const u8, len) }
}

fn read_uint_at(address: usize, width: usize, endianness: Endianness) -> u64 {
    let bytes = read_bytes_at(address, width);
    match (width, endianness) {
        (1, _) => bytes[0] as u64,
        (2, Endianness::Little) => u16::from_le_bytes(bytes.try_into().unwrap()) as u64,
        (2, Endianness::Big) => u16::from_be_bytes(bytes.try_into().unwrap()) as u64,
        (4, Endianness::Little) => u32::from_le_bytes(bytes.try_into().unwrap()) as u64,
        (4, Endianness::Big) => u32::from_be_bytes(bytes.try_into().unwrap()) as u64,
        (8, Endianness::Little) => u64::from_le_bytes(bytes.try_into().unwrap()),
        (8, Endianness::Big) => u64::from_be_bytes(bytes.try_into().unwrap()),
        _ => unreachable!("read_uint_at only supports widths 1, 2, 4, 8"),
    }
}

/// The smallest `i >= 1` for which the address *is* a multiple of `i`,
/// falling back to `size` if no `i < size` divides it. Since `address % 1`
/// is always `0`, this returns `1` for any `size > 1` — the source's
/// observable behavior verbatim rather than the true largest power-of-two
/// alignment; see the design notes.
fn find_alignment(address: u64, size: u64) -> u64 {
    for i in 1..size {
        if address % i == 0 {
            return i;
        }
    }
    size
}

/// The true largest power-of-two divisor of `address`, surfaced as a
/// comment in extended-alignment mode rather than replacing `find_alignment`.
fn true_alignment(address: u64) -> u64 {
    if address == 0 {
        return 0;
    }
    1 << address.trailing_zeros()
}

fn select_directive(output_addr_bytes: u64, remaining: u64) -> (u64, &'static str) {
    DIRECTIVE_TABLE
        .iter()
        .copied()
        .filter(|&(width, _)| width <= output_addr_bytes)
        .find(|&(width, _)| width <= remaining)
        .expect("remaining >= 1 always matches the 1-byte directive")
}

fn build_address_index(symbols: &[OutputSymbol]) -> Result<HashMap<u64, String>> {
    let mut index = HashMap::new();
    for sym in symbols {
        let key = sym.address as u64;
        if index.insert(key, sym.name.clone()).is_some() {
            return Err(CedoError::DuplicateAddress(key));
        }
    }
    Ok(index)
}

pub struct EmitOptions {
    pub version_str: Option<String>,
    pub extended_align: bool,
}

pub fn emit_asm<W: Write>(
    output_triple: Triple,
    symbols: &[OutputSymbol],
    streamer: &mut AsmStreamer<W>,
    options: &EmitOptions,
) -> Result<()> {
    let address_index = build_address_index(symbols)?;

    streamer.directive(".data").map_err(io_err)?;
    for sym in symbols {
        emit_one_sym(output_triple, streamer, sym, &address_index, options)?;
    }
    emit_file_epilogue(streamer, options.version_str.as_deref())?;
    streamer.flush().map_err(io_err)
}

fn emit_one_sym<W: Write>(
    triple: Triple,
    streamer: &mut AsmStreamer<W>,
    sym: &OutputSymbol,
    index: &HashMap<u64, String>,
    options: &EmitOptions,
) -> Result<()> {
    let addr_bytes = triple.addr_size.bytes() as u64;
    let size = if sym.type_node.is_pointer() {
        addr_bytes
    } else {
        sym.type_node.object_size(addr_bytes)
    };
    let address = sym.address as u64;
    let alignment = find_alignment(address, size);

    streamer
        .directive(".type")
        .map_err(io_err)?
        .append_fmt(format_args!(" {},@object", sym.name));
    streamer
        .directive(".size")
        .map_err(io_err)?
        .append_fmt(format_args!(" {}, {}", sym.name, size));
    streamer
        .directive(".global")
        .map_err(io_err)?
        .append_fmt(format_args!(" {}", sym.name));
    streamer
        .directive(".align")
        .map_err(io_err)?
        .append_fmt(format_args!(" {alignment}"));
    if options.extended_align {
        streamer.append_fmt(format_args!(" # true alignment: {}", true_alignment(address)));
    }
    streamer.label(&sym.name).map_err(io_err)?;

    emit_object(triple, streamer, &sym.type_node, sym.address, index)?;

    streamer.newline().map_err(io_err)?;
    Ok(())
}

fn emit_object<W: Write>(
    triple: Triple,
    streamer: &mut AsmStreamer<W>,
    type_node: &TypeNode,
    address: usize,
    index: &HashMap<u64, String>,
) -> Result<()> {
    match type_node {
        TypeNode::Pointer { .. } => emit_pointer(triple, streamer, address, index),
        TypeNode::Aggregate { .. } | TypeNode::Array { .. } => {
            emit_aggregate_or_array(triple, streamer, type_node, address, index)
        }
        TypeNode::Base { .. } => emit_base(triple, streamer, type_node, address),
    }
}

fn emit_pointer<W: Write>(
    triple: Triple,
    streamer: &mut AsmStreamer<W>,
    address: usize,
    index: &HashMap<u64, String>,
) -> Result<()> {
    let addr_bytes = triple.addr_size.bytes();
    let directive = if addr_bytes == 8 { ".quad" } else { ".long" };
    let value = read_uint_at(address, addr_bytes, triple.endianness);

    if value == 0 {
        streamer.directive(directive).map_err(io_err)?.append(" 0");
        return Ok(());
    }

    let name = index
        .get(&value)
        .ok_or(CedoError::PointerUnresolved(value))?;
    streamer
        .directive(directive)
        .map_err(io_err)?
        .append_fmt(format_args!(" {name}"));
    Ok(())
}

fn emit_aggregate_or_array<W: Write>(
    triple: Triple,
    streamer: &mut AsmStreamer<W>,
    type_node: &TypeNode,
    address: usize,
    index: &HashMap<u64, String>,
) -> Result<()> {
    let addr_bytes = triple.addr_size.bytes() as u64;

    let (total_size, raw_children): (u64, Vec<(u64, &TypeNode)>) = match type_node {
        TypeNode::Aggregate {
            total_byte_size,
            members,
            ..
        } => (*total_byte_size, members.iter().map(|(o, t)| (*o, t)).collect()),
        TypeNode::Array { element, count, .. } => {
            let elem_size = element.object_size(addr_bytes);
            let children = (0..*count).map(|i| (i * elem_size, element.as_ref())).collect();
            (elem_size * count, children)
        }
        _ => unreachable!("emit_aggregate_or_array called on a non-aggregate/array type"),
    };

    // Coalesce: at each distinct offset, keep only the largest child. This
    // collapses union variants and overlapping bitfield members to their
    // widest alternative.
    let mut by_offset: BTreeMap<u64, &TypeNode> = BTreeMap::new();
    for (offset, child) in raw_children {
        let child_size = child.object_size(addr_bytes);
        let keep = match by_offset.get(&offset) {
            Some(existing) => existing.object_size(addr_bytes) < child_size,
            None => true,
        };
        if keep {
            by_offset.insert(offset, child);
        }
    }

    let mut cursor = 0u64;
    for (&offset, child) in &by_offset {
        if cursor != offset {
            streamer
                .directive(".zero")
                .map_err(io_err)?
                .append_fmt(format_args!(" {}", offset - cursor));
        }
        emit_object(triple, streamer, child, address + offset as usize, index)?;
        cursor = offset + child.object_size(addr_bytes);
    }
    if cursor < total_size {
        streamer
            .directive(".zero")
            .map_err(io_err)?
            .append_fmt(format_args!(" {}", total_size - cursor));
    }
    Ok(())
}

fn emit_base<W: Write>(
    triple: Triple,
    streamer: &mut AsmStreamer<W>,
    type_node: &TypeNode,
    address: usize,
) -> Result<()> {
    let addr_bytes = triple.addr_size.bytes() as u64;
    let mut remaining = type_node.object_size(addr_bytes);
    let mut addr = address;

    while remaining > 0 {
        let (width, directive) = select_directive(addr_bytes, remaining);
        let value = read_uint_at(addr, width as usize, triple.endianness);
        streamer
            .directive(directive)
            .map_err(io_err)?
            .append_fmt(format_args!(" {value}"));
        addr += width as usize;
        remaining -= width;
    }
    Ok(())
}

fn emit_file_epilogue<W: Write>(streamer: &mut AsmStreamer<W>, version_str: Option<&str>) -> Result<()> {
    streamer.directive(".ident").map_err(io_err)?;
    match version_str {
        Some(v) if !v.is_empty() => {
            streamer.append_fmt(format_args!(" \"cedo {v}\""));
        }
        _ => {
            streamer.append(" \"cedo\"");
        }
    }
    Ok(())
}
