//! Base type metadata and the FIT CRC-16 checksum.
//!
//! Grounded on the CRC table and definition-record base type catalog of the FIT
//! parser this crate grew out of; the CRC algorithm is the standard Garmin
//! reference implementation and appears, byte for byte, in every FIT codec in
//! the wild.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The 17 base type wire numbers, as a closed enum -- `try_from` rejects any
/// number not in this set in one step, rather than scanning the metadata table.
#[derive(Debug, Eq, Clone, Copy, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum BaseTypeNumber {
    Enum = 0x00,
    Sint8 = 0x01,
    Uint8 = 0x02,
    Sint16 = 0x83,
    Uint16 = 0x84,
    Sint32 = 0x85,
    Uint32 = 0x86,
    String = 0x07,
    Float32 = 0x88,
    Float64 = 0x89,
    Uint8z = 0x0A,
    Uint16z = 0x8B,
    Uint32z = 0x8C,
    Byte = 0x0D,
    Sint64 = 0x8E,
    Uint64 = 0x8F,
    Uint64z = 0x90,
}

/// The FIT CRC-16 nibble table.
static CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800, 0xB401,
    0x5000, 0x9C01, 0x8801, 0x4400,
];

/// Computes the FIT CRC-16 over `data`, starting from an initial value of 0.
pub fn crc(data: &[u8]) -> u16 {
    crc_seeded(data, 0)
}

/// Computes the FIT CRC-16 over `data`, continuing from `seed`.
pub fn crc_seeded(data: &[u8], seed: u16) -> u16 {
    let mut crc = seed;
    for &byte in data {
        let mut tmp = CRC_TABLE[(crc & 0xF) as usize];
        crc = (crc >> 4) & 0x0FFF;
        crc ^= tmp ^ CRC_TABLE[(byte & 0xF) as usize];

        tmp = CRC_TABLE[(crc & 0xF) as usize];
        crc = (crc >> 4) & 0x0FFF;
        crc ^= tmp ^ CRC_TABLE[((byte >> 4) & 0xF) as usize];
    }
    crc
}

/// The undef ("invalid value") sentinel for a base type, represented widely enough
/// to hold any of the numeric base types' bit patterns; strings use an empty value
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndefSentinel(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseTypeKind {
    Enum,
    SInt8,
    UInt8,
    SInt16,
    UInt16,
    SInt32,
    UInt32,
    String,
    Float32,
    Float64,
    UInt8z,
    UInt16z,
    UInt32z,
    Byte,
    SInt64,
    UInt64,
    UInt64z,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseType {
    pub number: u8,
    pub kind: BaseTypeKind,
    pub name: &'static str,
    pub width: u8,
    pub endian_capable: bool,
    pub undef: UndefSentinel,
}

/// The 17 FIT base types, keyed by their on-the-wire `base_type_number`.
const BASE_TYPES: &[BaseType] = &[
    BaseType {
        number: 0x00,
        kind: BaseTypeKind::Enum,
        name: "enum",
        width: 1,
        endian_capable: false,
        undef: UndefSentinel(0xFF),
    },
    BaseType {
        number: 0x01,
        kind: BaseTypeKind::SInt8,
        name: "sint8",
        width: 1,
        endian_capable: false,
        undef: UndefSentinel(0x7F),
    },
    BaseType {
        number: 0x02,
        kind: BaseTypeKind::UInt8,
        name: "uint8",
        width: 1,
        endian_capable: false,
        undef: UndefSentinel(0xFF),
    },
    BaseType {
        number: 0x83,
        kind: BaseTypeKind::SInt16,
        name: "sint16",
        width: 2,
        endian_capable: true,
        undef: UndefSentinel(0x7FFF),
    },
    BaseType {
        number: 0x84,
        kind: BaseTypeKind::UInt16,
        name: "uint16",
        width: 2,
        endian_capable: true,
        undef: UndefSentinel(0xFFFF),
    },
    BaseType {
        number: 0x85,
        kind: BaseTypeKind::SInt32,
        name: "sint32",
        width: 4,
        endian_capable: true,
        undef: UndefSentinel(0x7FFF_FFFF),
    },
    BaseType {
        number: 0x86,
        kind: BaseTypeKind::UInt32,
        name: "uint32",
        width: 4,
        endian_capable: true,
        undef: UndefSentinel(0xFFFF_FFFF),
    },
    BaseType {
        number: 0x07,
        kind: BaseTypeKind::String,
        name: "string",
        width: 1,
        endian_capable: false,
        undef: UndefSentinel(0x00),
    },
    BaseType {
        number: 0x88,
        kind: BaseTypeKind::Float32,
        name: "float32",
        width: 4,
        endian_capable: true,
        undef: UndefSentinel(0xFFFF_FFFF),
    },
    BaseType {
        number: 0x89,
        kind: BaseTypeKind::Float64,
        name: "float64",
        width: 8,
        endian_capable: true,
        undef: UndefSentinel(0xFFFF_FFFF_FFFF_FFFF),
    },
    BaseType {
        number: 0x0A,
        kind: BaseTypeKind::UInt8z,
        name: "uint8z",
        width: 1,
        endian_capable: false,
        undef: UndefSentinel(0x00),
    },
    BaseType {
        number: 0x8B,
        kind: BaseTypeKind::UInt16z,
        name: "uint16z",
        width: 2,
        endian_capable: true,
        undef: UndefSentinel(0x0000),
    },
    BaseType {
        number: 0x8C,
        kind: BaseTypeKind::UInt32z,
        name: "uint32z",
        width: 4,
        endian_capable: true,
        undef: UndefSentinel(0x0000_0000),
    },
    BaseType {
        number: 0x0D,
        kind: BaseTypeKind::Byte,
        name: "byte",
        width: 1,
        endian_capable: false,
        undef: UndefSentinel(0xFF),
    },
    BaseType {
        number: 0x8E,
        kind: BaseTypeKind::SInt64,
        name: "sint64",
        width: 8,
        endian_capable: true,
        undef: UndefSentinel(0x7FFF_FFFF_FFFF_FFFF),
    },
    BaseType {
        number: 0x8F,
        kind: BaseTypeKind::UInt64,
        name: "uint64",
        width: 8,
        endian_capable: true,
        undef: UndefSentinel(0xFFFF_FFFF_FFFF_FFFF),
    },
    BaseType {
        number: 0x90,
        kind: BaseTypeKind::UInt64z,
        name: "uint64z",
        width: 8,
        endian_capable: true,
        undef: UndefSentinel(0x0000_0000_0000_0000),
    },
];

/// Looks up a base type by its wire number. Returns `None` for unrecognized numbers
/// so callers can decide between a hard failure and a warn-and-pass-through.
pub fn lookup(number: u8) -> Option<BaseType> {
    BaseTypeNumber::try_from(number).ok()?;
    BASE_TYPES.iter().copied().find(|b| b.number == number)
}

pub fn all() -> &'static [BaseType] {
    BASE_TYPES
}

/// Looks up a base type by its profile-table name (`"uint16"`, `"enum"`, ...).
pub fn lookup_by_name(name: &str) -> Option<BaseType> {
    BASE_TYPES.iter().copied().find(|b| b.name == name)
}

/// The canonical base type for a given [`BaseTypeKind`], used when a field's base
/// type must be inferred from a value rather than looked up by number or name (the
/// undocumented-field case).
pub fn for_kind(kind: BaseTypeKind) -> BaseType {
    BASE_TYPES
        .iter()
        .copied()
        .find(|b| b.kind == kind)
        .expect("every BaseTypeKind has a canonical entry")
}
