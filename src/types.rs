//! The portable type model the emitter walks: a tagged variant replacing
//! the original's `Type`/`BaseType`/`ArrayType`/`StructType` virtual
//! hierarchy, since Rust has no `getObjectSize` vtable slot to override.

use bitflags::bitflags;

bitflags! {
    /// Signedness/cv-qualifiers are carried only for assembly comments;
    /// classification (pointer/array/compound) drives emitter dispatch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Qualifiers: u8 {
        const SIGNED   = 0b0000_0000;
        const UNSIGNED = 0b0000_0001;
        const CONST    = 0b0000_0010;
        const VOLATILE = 0b0000_0100;
        const POINTER  = 0b0000_1000;
        const ARRAY    = 0b0001_0000;
        const COMPOUND = 0b0010_0000;
    }
}

#[derive(Debug, Clone)]
pub enum TypeNode {
    Base {
        qualifiers: Qualifiers,
        byte_size: u64,
    },
    Pointer {
        qualifiers: Qualifiers,
        pointee: Box<TypeNode>,
    },
    Array {
        qualifiers: Qualifiers,
        element: Box<TypeNode>,
        count: u64,
    },
    Aggregate {
        qualifiers: Qualifiers,
        total_byte_size: u64,
        members: Vec<(u64, TypeNode)>,
    },
}

impl TypeNode {
    pub fn qualifiers(&self) -> Qualifiers {
        match self {
            TypeNode::Base { qualifiers, .. }
            | TypeNode::Pointer { qualifiers, .. }
            | TypeNode::Array { qualifiers, .. }
            | TypeNode::Aggregate { qualifiers, .. } => *qualifiers,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeNode::Pointer { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeNode::Array { .. })
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, TypeNode::Aggregate { .. })
    }

    pub fn is_builtin(&self) -> bool {
        !self.is_pointer() && !self.is_array() && !self.is_compound()
    }

    /// Given the output triple's address size, used by pointers whose
    /// own size is target-dependent rather than carried in the DIE.
    pub fn object_size(&self, output_addr_bytes: u64) -> u64 {
        match self {
            TypeNode::Base { byte_size, .. } => *byte_size,
            TypeNode::Pointer { .. } => output_addr_bytes,
            TypeNode::Array { element, count, .. } => {
                element.object_size(output_addr_bytes) * count
            }
            TypeNode::Aggregate { total_byte_size, .. } => *total_byte_size,
        }
    }
}
