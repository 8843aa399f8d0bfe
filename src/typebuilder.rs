//! Projects a DIE subtree into a `TypeNode` tree, compressing typedef
//! chains and recursing through pointer/array/aggregate members.
//!
//! Grounded in the original's `DWARF::getTypeFromTypeDie`/
//! `getTypeFromBaseTypeDie`, generalized to the pointer/array/aggregate
//! cases that implementation only ever `assert(0)`'d on.

use crate::dwarf::{Die, DieValue, DwAt, DwTag, Dwarf};
use crate::error::{CedoError, Result};
use crate::types::{Qualifiers, TypeNode};

pub fn build_variable_type(dwarf: &Dwarf, name: &str) -> Result<TypeNode> {
    let var = dwarf
        .variable_named(name)
        .ok_or_else(|| CedoError::TypeNotFound(name.to_string()))?;
    let type_die = dwarf
        .type_die_of(var)
        .ok_or_else(|| CedoError::TypeNotFound(name.to_string()))?;
    build_type_node(dwarf, type_die)
}

fn build_type_node(dwarf: &Dwarf, die: &Die) -> Result<TypeNode> {
    match die.tag {
        DwTag::TYPEDEF => {
            let inner = dwarf
                .type_die_of(die)
                .ok_or_else(|| CedoError::MalformedDwarf("typedef DIE has no DW_AT_type".into()))?;
            build_type_node(dwarf, inner)
        }

        DwTag::BASE_TYPE => {
            let byte_size = die
                .attr(DwAt::BYTE_SIZE)
                .and_then(DieValue::as_uint)
                .ok_or_else(|| CedoError::MalformedDwarf("base_type DIE missing DW_AT_byte_size".into()))?;
            Ok(TypeNode::Base {
                qualifiers: Qualifiers::empty(),
                byte_size,
            })
        }

        DwTag::POINTER_TYPE => {
            let pointee_die = dwarf
                .type_die_of(die)
                .ok_or_else(|| CedoError::MalformedDwarf("pointer_type DIE has no DW_AT_type".into()))?;
            let pointee = build_type_node(dwarf, pointee_die)?;
            Ok(TypeNode::Pointer {
                qualifiers: Qualifiers::POINTER,
                pointee: Box::new(pointee),
            })
        }

        DwTag::ARRAY_TYPE => {
            let subrange = dwarf
                .children_of(die)
                .find(|c| c.tag == DwTag::SUBRANGE_TYPE)
                .ok_or_else(|| {
                    CedoError::MalformedDwarf("array_type DIE has no DW_TAG_subrange_type child".into())
                })?;
            let count = subrange
                .attr(DwAt::COUNT)
                .and_then(DieValue::as_uint)
                .or_else(|| {
                    // DW_AT_upper_bound is inclusive; count = upper_bound + 1.
                    subrange
                        .attr(DwAt::UPPER_BOUND)
                        .and_then(DieValue::as_uint)
                        .map(|u| u + 1)
                })
                .ok_or_else(|| {
                    CedoError::MalformedDwarf("subrange_type DIE missing DW_AT_count".into())
                })?;
            let element_die = dwarf
                .type_die_of(die)
                .ok_or_else(|| CedoError::MalformedDwarf("array_type DIE has no DW_AT_type".into()))?;
            let element = build_type_node(dwarf, element_die)?;
            Ok(TypeNode::Array {
                qualifiers: Qualifiers::ARRAY,
                element: Box::new(element),
                count,
            })
        }

        DwTag::STRUCTURE_TYPE | DwTag::CLASS_TYPE | DwTag::UNION_TYPE => {
            let total_byte_size = die
                .attr(DwAt::BYTE_SIZE)
                .and_then(DieValue::as_uint)
                .ok_or_else(|| {
                    CedoError::MalformedDwarf("aggregate DIE missing DW_AT_byte_size".into())
                })?;

            let mut members = Vec::new();
            for member_die in dwarf.children_of(die).filter(|c| c.tag == DwTag::MEMBER) {
                let offset = member_die
                    .attr(DwAt::DATA_MEMBER_LOCATION)
                    .and_then(DieValue::as_uint)
                    .unwrap_or(0);
                let member_type_die = dwarf.type_die_of(member_die).ok_or_else(|| {
                    CedoError::MalformedDwarf("member DIE has no DW_AT_type".into())
                })?;
                let member_type = build_type_node(dwarf, member_type_die)?;
                members.push((offset, member_type));
            }
            members.sort_by_key(|(offset, _)| *offset);

            Ok(TypeNode::Aggregate {
                qualifiers: Qualifiers::COMPOUND,
                total_byte_size,
                members,
            })
        }

        other => Err(CedoError::UnsupportedForm(format!(
            "DWARF tag 0x{:02x} is not a supported type",
            other.0
        ))),
    }
}
