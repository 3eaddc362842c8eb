//! The raw decoded value types the core hands back to callers.
//!
//! These are intentionally "raw": no scaling, no unit conversion, no sub-field
//! expansion. That's the semantic layer's job, not the codec's.

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Enum(u8),
    SInt8(i8),
    UInt8(u8),
    SInt16(i16),
    UInt16(u16),
    SInt32(i32),
    UInt32(u32),
    Float32(f32),
    Float64(f64),
    UInt8z(u8),
    UInt16z(u16),
    UInt32z(u32),
    Byte(u8),
    SInt64(i64),
    UInt64(u64),
    UInt64z(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(ScalarValue),
    Array(Vec<ScalarValue>),
    String(String),
}

impl ScalarValue {
    /// The base type kind that would naturally hold this value, used when a field's
    /// base type must be inferred from the value itself (undocumented fields built
    /// from scratch, with no profile entry to resolve a base type from).
    pub fn kind(&self) -> crate::base_type::BaseTypeKind {
        use crate::base_type::BaseTypeKind;
        match self {
            ScalarValue::Enum(_) => BaseTypeKind::Enum,
            ScalarValue::SInt8(_) => BaseTypeKind::SInt8,
            ScalarValue::UInt8(_) => BaseTypeKind::UInt8,
            ScalarValue::SInt16(_) => BaseTypeKind::SInt16,
            ScalarValue::UInt16(_) => BaseTypeKind::UInt16,
            ScalarValue::SInt32(_) => BaseTypeKind::SInt32,
            ScalarValue::UInt32(_) => BaseTypeKind::UInt32,
            ScalarValue::Float32(_) => BaseTypeKind::Float32,
            ScalarValue::Float64(_) => BaseTypeKind::Float64,
            ScalarValue::UInt8z(_) => BaseTypeKind::UInt8z,
            ScalarValue::UInt16z(_) => BaseTypeKind::UInt16z,
            ScalarValue::UInt32z(_) => BaseTypeKind::UInt32z,
            ScalarValue::Byte(_) => BaseTypeKind::Byte,
            ScalarValue::SInt64(_) => BaseTypeKind::SInt64,
            ScalarValue::UInt64(_) => BaseTypeKind::UInt64,
            ScalarValue::UInt64z(_) => BaseTypeKind::UInt64z,
        }
    }
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ScalarValue]> {
        match self {
            FieldValue::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}
