//! DWARF tag/attribute/form constants, transcribed from the DW_TAG/DW_AT/
//! DW_FORM tables (only the entries this crate's readers and TypeBuilder
//! actually consult; the full DWARF standard defines many more).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DwTag(pub u8);

impl DwTag {
    pub const ARRAY_TYPE: DwTag = DwTag(0x01);
    pub const CLASS_TYPE: DwTag = DwTag(0x02);
    pub const MEMBER: DwTag = DwTag(0x0d);
    pub const POINTER_TYPE: DwTag = DwTag(0x0f);
    pub const COMPILE_UNIT: DwTag = DwTag(0x11);
    pub const STRUCTURE_TYPE: DwTag = DwTag(0x13);
    pub const TYPEDEF: DwTag = DwTag(0x16);
    pub const UNION_TYPE: DwTag = DwTag(0x17);
    pub const SUBRANGE_TYPE: DwTag = DwTag(0x21);
    pub const BASE_TYPE: DwTag = DwTag(0x24);
    pub const VARIABLE: DwTag = DwTag(0x34);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DwAt(pub u8);

impl DwAt {
    pub const SIBLING: DwAt = DwAt(0x01);
    pub const LOCATION: DwAt = DwAt(0x02);
    pub const NAME: DwAt = DwAt(0x03);
    pub const BYTE_SIZE: DwAt = DwAt(0x0b);
    pub const STMT_LIST: DwAt = DwAt(0x10);
    pub const LOW_PC: DwAt = DwAt(0x11);
    pub const HIGH_PC: DwAt = DwAt(0x12);
    pub const COMP_DIR: DwAt = DwAt(0x1b);
    pub const UPPER_BOUND: DwAt = DwAt(0x2f);
    pub const COUNT: DwAt = DwAt(0x37);
    pub const DATA_MEMBER_LOCATION: DwAt = DwAt(0x38);
    pub const DECL_FILE: DwAt = DwAt(0x3a);
    pub const DECL_LINE: DwAt = DwAt(0x3b);
    pub const DECLARATION: DwAt = DwAt(0x3c);
    pub const ENCODING: DwAt = DwAt(0x3e);
    pub const EXTERNAL: DwAt = DwAt(0x3f);
    pub const TYPE: DwAt = DwAt(0x49);
}

/// The static width/interpretation descriptor carried alongside each
/// `DW_FORM` code. Dynamic-width forms (`String`, `ULEB128`, `Exprloc`) are
/// sized while decoding rather than up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwarfType {
    Fixed(u8),
    DwarfAddr,
    MachineAddr,
    String,
    StringPtr,
    Uleb128,
    Sleb128,
    Indirect,
    Exprloc,
    FlagPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwForm {
    pub value: u8,
    pub ty: DwarfType,
}

const FORM_TABLE: &[DwForm] = &[
    DwForm { value: 0x01, ty: DwarfType::MachineAddr },
    DwForm { value: 0x03, ty: DwarfType::Fixed(2) }, // block2, length prefix not modeled
    DwForm { value: 0x04, ty: DwarfType::Fixed(4) }, // block4
    DwForm { value: 0x05, ty: DwarfType::Fixed(2) }, // data2
    DwForm { value: 0x06, ty: DwarfType::Fixed(4) }, // data4
    DwForm { value: 0x07, ty: DwarfType::Fixed(8) }, // data8
    DwForm { value: 0x08, ty: DwarfType::String },
    DwForm { value: 0x09, ty: DwarfType::Uleb128 }, // block
    DwForm { value: 0x0a, ty: DwarfType::Fixed(1) }, // block1
    DwForm { value: 0x0b, ty: DwarfType::Fixed(1) }, // data1
    DwForm { value: 0x0c, ty: DwarfType::Fixed(1) }, // flag
    DwForm { value: 0x0d, ty: DwarfType::Sleb128 }, // sdata
    DwForm { value: 0x0e, ty: DwarfType::StringPtr }, // strp
    DwForm { value: 0x0f, ty: DwarfType::Uleb128 }, // udata
    DwForm { value: 0x10, ty: DwarfType::DwarfAddr }, // ref_addr
    DwForm { value: 0x11, ty: DwarfType::Fixed(1) }, // ref1
    DwForm { value: 0x12, ty: DwarfType::Fixed(2) }, // ref2
    DwForm { value: 0x13, ty: DwarfType::Fixed(4) }, // ref4
    DwForm { value: 0x14, ty: DwarfType::Fixed(8) }, // ref8
    DwForm { value: 0x15, ty: DwarfType::Uleb128 }, // ref_udata
    DwForm { value: 0x16, ty: DwarfType::Indirect },
    DwForm { value: 0x17, ty: DwarfType::DwarfAddr }, // sec_offset
    DwForm { value: 0x18, ty: DwarfType::Exprloc },
    DwForm { value: 0x19, ty: DwarfType::FlagPresent },
    DwForm { value: 0x20, ty: DwarfType::Fixed(8) }, // ref_sig8
];

pub const DW_FORM_STRP: u8 = 0x0e;

pub fn lookup_form(value: u8) -> Option<DwForm> {
    FORM_TABLE.iter().copied().find(|f| f.value == value)
}
