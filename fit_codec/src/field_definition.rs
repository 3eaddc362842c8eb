//! One field entry inside a definition record, and its resolution against the
//! profile catalog into a schema field with a concrete wire shape.

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};
use fit_profile::{ProfileField, ProfileMessage};

use crate::base_type::{self, BaseType, BaseTypeKind, UndefSentinel};
use crate::error::{Error, Result};

/// The raw three-byte field entry as it appears inside a definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefEntry {
    pub field_definition_number: u8,
    pub byte_count: u8,
    pub base_type_number: u8,
    pub endian_ability: bool,
}

impl FieldDefEntry {
    pub fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let field_definition_number = r.read_u8()?;
        let byte_count = r.read_u8()?;
        let base_type_number = r.read_u8()?;
        let endian_ability = base_type::lookup(base_type_number)
            .map(|b| b.endian_capable)
            .unwrap_or(false);
        Ok(Self {
            field_definition_number,
            byte_count,
            base_type_number,
            endian_ability,
        })
    }

    pub fn encode<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u8(self.field_definition_number)?;
        w.write_u8(self.byte_count)?;
        w.write_u8(self.base_type_number)?;
        Ok(())
    }
}

/// The concrete per-record struct shape a field entry resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldShape {
    Scalar { base: BaseType },
    Array { base: BaseType, length: usize },
    String { length: usize },
}

impl FieldShape {
    pub fn byte_count(&self) -> u8 {
        match self {
            FieldShape::Scalar { base } => base.width,
            FieldShape::Array { base, length } => base.width * (*length as u8),
            FieldShape::String { length } => *length as u8,
        }
    }
}

/// A field entry resolved against the profile catalog: a name (documented or
/// synthesized), its base type, and its wire shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub number: u8,
    pub name: String,
    pub shape: FieldShape,
}

impl SchemaField {
    pub fn base(&self) -> BaseType {
        match self.shape {
            FieldShape::Scalar { base } => base,
            FieldShape::Array { base, .. } => base,
            FieldShape::String { .. } => string_base_type(),
        }
    }
}

fn string_base_type() -> BaseType {
    base_type::lookup(0x07).expect("string base type is always present")
}

/// A placeholder base type used when `base_type_number` is unrecognized: the field
/// is still decoded, as raw bytes, so a round trip doesn't lose data.
fn unknown_base_type(number: u8) -> BaseType {
    BaseType {
        number,
        kind: BaseTypeKind::Byte,
        name: "unknown",
        width: 1,
        endian_capable: false,
        undef: UndefSentinel(0xFF),
    }
}

pub fn resolve_base_type(entry: &FieldDefEntry) -> BaseType {
    match base_type::lookup(entry.base_type_number) {
        Some(base) => base,
        None => {
            tracing::warn!(
                base_type_number = entry.base_type_number,
                "unknown base type, decoding as raw bytes"
            );
            unknown_base_type(entry.base_type_number)
        }
    }
}

fn profile_field_for<'a>(
    message: Option<&'a ProfileMessage>,
    number: u8,
) -> Option<&'a ProfileField> {
    message
        .and_then(|m| m.fields.iter().find(|f| f.definition_number == number))
}

/// Resolves a wire-level field entry into a named schema field with a concrete
/// shape, looking the field up in `message` (the definition's global message, if
/// known to the catalog).
pub fn resolve(entry: &FieldDefEntry, message: Option<&ProfileMessage>) -> Result<SchemaField> {
    let base = resolve_base_type(entry);
    let name = match profile_field_for(message, entry.field_definition_number) {
        Some(field) => field.name.clone(),
        None => {
            tracing::warn!(
                field_definition_number = entry.field_definition_number,
                "field has no profile entry, synthesizing undocumented field"
            );
            format!("undocumented_field_{}", entry.field_definition_number)
        }
    };
    let shape = resolve_shape(entry.field_definition_number, base, entry.byte_count)?;
    Ok(SchemaField {
        number: entry.field_definition_number,
        name,
        shape,
    })
}

pub fn resolve_shape(field: u8, base: BaseType, byte_count: u8) -> Result<FieldShape> {
    if base.kind == BaseTypeKind::String {
        return Ok(FieldShape::String {
            length: byte_count as usize,
        });
    }
    let base_width = base.width;
    if byte_count == base_width {
        Ok(FieldShape::Scalar { base })
    } else if byte_count > base_width && byte_count % base_width == 0 {
        Ok(FieldShape::Array {
            base,
            length: (byte_count / base_width) as usize,
        })
    } else {
        Err(Error::InvalidFieldWidth {
            field,
            byte_count,
            base_width,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn decodes_field_entry() {
        let mut cursor = Cursor::new(vec![3u8, 4, 0x8C]);
        let entry = FieldDefEntry::decode(&mut cursor).unwrap();
        assert_eq!(entry.field_definition_number, 3);
        assert_eq!(entry.byte_count, 4);
        assert_eq!(entry.base_type_number, 0x8C);
        assert!(entry.endian_ability);
    }

    #[test]
    fn round_trips_field_entry() {
        let entry = FieldDefEntry {
            field_definition_number: 1,
            byte_count: 2,
            base_type_number: 0x84,
            endian_ability: true,
        };
        let mut buf = Vec::new();
        entry.encode(&mut buf).unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(FieldDefEntry::decode(&mut cursor).unwrap(), entry);
    }

    #[test]
    fn scalar_shape_when_byte_count_matches_base_width() {
        let base = base_type::lookup(0x84).unwrap();
        let shape = resolve_shape(2, base, 2).unwrap();
        assert!(matches!(shape, FieldShape::Scalar { .. }));
    }

    #[test]
    fn array_shape_when_byte_count_is_a_multiple() {
        let base = base_type::lookup(0x00).unwrap();
        let shape = resolve_shape(29, base, 6).unwrap();
        assert!(matches!(shape, FieldShape::Array { length: 6, .. }));
    }

    #[test]
    fn invalid_field_width_when_not_a_multiple() {
        let base = base_type::lookup(0x84).unwrap();
        let err = resolve_shape(5, base, 3).unwrap_err();
        assert!(matches!(err, Error::InvalidFieldWidth { field: 5, .. }));
    }

    #[test]
    fn synthesizes_undocumented_field_name() {
        let entry = FieldDefEntry {
            field_definition_number: 29,
            byte_count: 6,
            base_type_number: 0x00,
            endian_ability: false,
        };
        let resolved = resolve(&entry, None).unwrap();
        assert_eq!(resolved.name, "undocumented_field_29");
    }
}
