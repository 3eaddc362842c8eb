//! Reads and writes a data record's payload against a resolved definition schema.

use std::io::{Read, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use indexmap::IndexMap;

use crate::base_type::{BaseType, BaseTypeKind};
use crate::definition_record::{DefinitionRecord, Endianness};
use crate::error::Result;
use crate::field_definition::{FieldShape, SchemaField};
use crate::value::{FieldValue, ScalarValue};

fn read_raw<R: Read>(width: u8, endian: Endianness, r: &mut R) -> Result<u64> {
    Ok(match width {
        1 => r.read_u8()? as u64,
        2 => match endian {
            Endianness::Little => r.read_u16::<LittleEndian>()? as u64,
            Endianness::Big => r.read_u16::<BigEndian>()? as u64,
        },
        4 => match endian {
            Endianness::Little => r.read_u32::<LittleEndian>()? as u64,
            Endianness::Big => r.read_u32::<BigEndian>()? as u64,
        },
        _ => match endian {
            Endianness::Little => r.read_u64::<LittleEndian>()?,
            Endianness::Big => r.read_u64::<BigEndian>()?,
        },
    })
}

fn write_raw<W: Write>(width: u8, endian: Endianness, raw: u64, w: &mut W) -> Result<()> {
    match width {
        1 => w.write_u8(raw as u8)?,
        2 => match endian {
            Endianness::Little => w.write_u16::<LittleEndian>(raw as u16)?,
            Endianness::Big => w.write_u16::<BigEndian>(raw as u16)?,
        },
        4 => match endian {
            Endianness::Little => w.write_u32::<LittleEndian>(raw as u32)?,
            Endianness::Big => w.write_u32::<BigEndian>(raw as u32)?,
        },
        _ => match endian {
            Endianness::Little => w.write_u64::<LittleEndian>(raw)?,
            Endianness::Big => w.write_u64::<BigEndian>(raw)?,
        },
    }
    Ok(())
}

fn scalar_from_raw(kind: BaseTypeKind, raw: u64) -> ScalarValue {
    match kind {
        BaseTypeKind::Enum => ScalarValue::Enum(raw as u8),
        BaseTypeKind::SInt8 => ScalarValue::SInt8(raw as u8 as i8),
        BaseTypeKind::UInt8 => ScalarValue::UInt8(raw as u8),
        BaseTypeKind::SInt16 => ScalarValue::SInt16(raw as u16 as i16),
        BaseTypeKind::UInt16 => ScalarValue::UInt16(raw as u16),
        BaseTypeKind::SInt32 => ScalarValue::SInt32(raw as u32 as i32),
        BaseTypeKind::UInt32 => ScalarValue::UInt32(raw as u32),
        BaseTypeKind::Float32 => ScalarValue::Float32(f32::from_bits(raw as u32)),
        BaseTypeKind::Float64 => ScalarValue::Float64(f64::from_bits(raw)),
        BaseTypeKind::UInt8z => ScalarValue::UInt8z(raw as u8),
        BaseTypeKind::UInt16z => ScalarValue::UInt16z(raw as u16),
        BaseTypeKind::UInt32z => ScalarValue::UInt32z(raw as u32),
        BaseTypeKind::Byte => ScalarValue::Byte(raw as u8),
        BaseTypeKind::SInt64 => ScalarValue::SInt64(raw as i64),
        BaseTypeKind::UInt64 => ScalarValue::UInt64(raw),
        BaseTypeKind::UInt64z => ScalarValue::UInt64z(raw),
        BaseTypeKind::String => unreachable!("string fields are not scalars"),
    }
}

fn raw_from_scalar(value: &ScalarValue) -> u64 {
    match *value {
        ScalarValue::Enum(v) => v as u64,
        ScalarValue::SInt8(v) => v as u8 as u64,
        ScalarValue::UInt8(v) => v as u64,
        ScalarValue::SInt16(v) => v as u16 as u64,
        ScalarValue::UInt16(v) => v as u64,
        ScalarValue::SInt32(v) => v as u32 as u64,
        ScalarValue::UInt32(v) => v as u64,
        ScalarValue::Float32(v) => v.to_bits() as u64,
        ScalarValue::Float64(v) => v.to_bits(),
        ScalarValue::UInt8z(v) => v as u64,
        ScalarValue::UInt16z(v) => v as u64,
        ScalarValue::UInt32z(v) => v as u64,
        ScalarValue::Byte(v) => v as u64,
        ScalarValue::SInt64(v) => v as u64,
        ScalarValue::UInt64(v) => v,
        ScalarValue::UInt64z(v) => v,
    }
}

fn undef_scalar(base: BaseType) -> ScalarValue {
    scalar_from_raw(base.kind, base.undef.0)
}

fn read_scalar<R: Read>(base: BaseType, endian: Endianness, r: &mut R) -> Result<ScalarValue> {
    let raw = read_raw(base.width, endian, r)?;
    Ok(scalar_from_raw(base.kind, raw))
}

fn write_scalar<W: Write>(
    base: BaseType,
    endian: Endianness,
    value: &ScalarValue,
    w: &mut W,
) -> Result<()> {
    write_raw(base.width, endian, raw_from_scalar(value), w)
}

/// Reads one field's value from `r` according to its resolved shape.
pub fn read_field<R: Read>(
    field: &SchemaField,
    endian: Endianness,
    r: &mut R,
) -> Result<FieldValue> {
    match field.shape {
        FieldShape::Scalar { base } => Ok(FieldValue::Scalar(read_scalar(base, endian, r)?)),
        FieldShape::Array { base, length } => {
            let values = (0..length)
                .map(|_| read_scalar(base, endian, r))
                .collect::<Result<_>>()?;
            Ok(FieldValue::Array(values))
        }
        FieldShape::String { length } => {
            let mut bytes = vec![0u8; length];
            r.read_exact(&mut bytes)?;
            Ok(FieldValue::String(String::from_utf8_lossy(&bytes).into_owned()))
        }
    }
}

/// Writes one field's value to `w` according to its resolved shape, padding or
/// truncating strings to the shape's declared length.
pub fn write_field<W: Write>(
    field: &SchemaField,
    endian: Endianness,
    value: &FieldValue,
    w: &mut W,
) -> Result<()> {
    match (&field.shape, value) {
        (FieldShape::Scalar { base }, FieldValue::Scalar(v)) => write_scalar(*base, endian, v, w),
        (FieldShape::Array { base, length }, FieldValue::Array(values)) => {
            for i in 0..*length {
                let v = values.get(i).cloned().unwrap_or_else(|| undef_scalar(*base));
                write_scalar(*base, endian, &v, w)?;
            }
            Ok(())
        }
        (FieldShape::String { length }, FieldValue::String(s)) => {
            let mut bytes = s.clone().into_bytes();
            bytes.resize(*length, 0);
            w.write_all(&bytes)?;
            Ok(())
        }
        (shape, _) => {
            write_field(field, endian, &undef_value_for_shape(shape), w)
        }
    }
}

fn undef_value_for_shape(shape: &FieldShape) -> FieldValue {
    match *shape {
        FieldShape::Scalar { base } => FieldValue::Scalar(undef_scalar(base)),
        FieldShape::Array { base, length } => {
            FieldValue::Array(vec![undef_scalar(base); length])
        }
        FieldShape::String { length } => FieldValue::String("\0".repeat(length)),
    }
}

/// The base type's undef sentinel for a field, shaped per its definition (a bare
/// scalar, or an array of sentinels at the definition's declared length).
pub fn undef_value(field: &SchemaField) -> FieldValue {
    undef_value_for_shape(&field.shape)
}

/// Reads a full data record payload against `definition`, in field order.
pub fn read_record<R: Read>(
    definition: &DefinitionRecord,
    r: &mut R,
) -> Result<IndexMap<String, FieldValue>> {
    let mut values = IndexMap::with_capacity(definition.fields.len());
    for field in &definition.fields {
        let value = read_field(field, definition.architecture, r)?;
        values.insert(field.name.clone(), value);
    }
    Ok(values)
}

/// Writes a full data record payload against `definition`, substituting the
/// field's undef sentinel for any field absent from `values`.
pub fn write_record<W: Write>(
    definition: &DefinitionRecord,
    values: &IndexMap<String, FieldValue>,
    w: &mut W,
) -> Result<()> {
    for field in &definition.fields {
        match values.get(&field.name) {
            Some(value) => write_field(field, definition.architecture, value, w)?,
            None => write_field(field, definition.architecture, &undef_value(field), w)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_type;
    use crate::field_definition::FieldShape;
    use std::io::Cursor;

    fn field(number: u8, shape: FieldShape, name: &str) -> SchemaField {
        SchemaField {
            number,
            name: name.to_string(),
            shape,
        }
    }

    #[test]
    fn reads_big_endian_scalars_per_spec_example() {
        let bytes: &[u8] = &[0x7F, 0xFF, 0xFF, 0xFF, 0x29, 0xE6, 0x07, 0x12, 0x00, 0x0F, 0x00, 0x01, 0x04];
        let mut cursor = Cursor::new(bytes);
        let fields = vec![
            field(3, FieldShape::Scalar { base: base_type::lookup(0x8C).unwrap() }, "serial_number"),
            field(4, FieldShape::Scalar { base: base_type::lookup(0x86).unwrap() }, "time_created"),
            field(1, FieldShape::Scalar { base: base_type::lookup(0x84).unwrap() }, "manufacturer"),
            field(2, FieldShape::Scalar { base: base_type::lookup(0x84).unwrap() }, "product"),
            field(0, FieldShape::Scalar { base: base_type::lookup(0x00).unwrap() }, "type"),
        ];
        let mut got = Vec::new();
        for f in &fields {
            got.push(read_field(f, Endianness::Big, &mut cursor).unwrap());
        }
        assert_eq!(got[0], FieldValue::Scalar(ScalarValue::UInt32z(2147483647)));
        assert_eq!(got[2], FieldValue::Scalar(ScalarValue::UInt16(15)));
        assert_eq!(got[3], FieldValue::Scalar(ScalarValue::UInt16(1)));
        assert_eq!(got[4], FieldValue::Scalar(ScalarValue::Enum(4)));
    }

    #[test]
    fn missing_array_field_yields_sentinel_of_definition_length() {
        let f = field(
            29,
            FieldShape::Array { base: base_type::lookup(0x00).unwrap(), length: 6 },
            "undocumented_field_29",
        );
        let value = undef_value(&f);
        assert_eq!(
            value,
            FieldValue::Array(vec![ScalarValue::Enum(0xFF); 6])
        );
    }

    #[test]
    fn missing_uint32z_field_yields_zero() {
        let f = field(3, FieldShape::Scalar { base: base_type::lookup(0x8C).unwrap() }, "serial_number");
        assert_eq!(undef_value(&f), FieldValue::Scalar(ScalarValue::UInt32z(0)));
    }

    #[test]
    fn string_round_trips_with_nul_padding() {
        let f = field(2, FieldShape::String { length: 8 }, "undocumented_field_2");
        let mut buf = Vec::new();
        write_field(&f, Endianness::Little, &FieldValue::String("Foo".to_string()), &mut buf).unwrap();
        assert_eq!(buf, b"Foo\0\0\0\0\0");
        let mut cursor = Cursor::new(buf);
        let value = read_field(&f, Endianness::Little, &mut cursor).unwrap();
        assert_eq!(value, FieldValue::String("Foo\0\0\0\0\0".to_string()));
    }
}
