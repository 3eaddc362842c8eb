//! A FIT (Flexible and Interoperable Data Transfer) file codec.
//!
//! Decodes and encodes the binary record stream fitness devices use for activity
//! files: a header, a sequence of definition and data records keyed by a local
//! message slot, and a trailing CRC-16 per segment. This crate returns and accepts
//! *raw* field values only -- scaling, units, and sub-field expansion are a
//! semantic layer's job, not the codec's.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::Path;

use fit_profile::ProfileCatalog;

mod base_type;
mod data_record;
mod decoder;
mod definition_record;
mod encoder;
mod error;
mod field_definition;
mod header;
mod record_header;
mod registry;
mod value;

pub use base_type::{BaseType, BaseTypeKind};
pub use data_record::undef_value;
pub use definition_record::{DefinitionRecord, Endianness};
pub use encoder::{encode_registry, EncodeInput, UserRecord};
pub use error::{Error, Result};
pub use field_definition::{FieldDefEntry, FieldShape, SchemaField};
pub use header::Header;
pub use record_header::{MessageKind, RecordHeader};
pub use registry::{DecodedRecord, DefinitionSlot, Registry};
pub use value::{FieldValue, ScalarValue};

/// Decodes a FIT file at `path` into its chained segments. Most files have a
/// single segment; the common case is `decode(path, catalog)?.remove(0)` (or
/// `[0]`) for the one-segment file.
pub fn decode<P: AsRef<Path>>(
    path: P,
    catalog: &dyn ProfileCatalog,
) -> Result<Vec<Registry>> {
    let mut file = File::open(path)?;
    decode_reader(&mut file, catalog)
}

/// Decodes a FIT byte stream (already positioned at its start) into its chained
/// segments.
pub fn decode_reader<R: Read + Seek>(
    r: &mut R,
    catalog: &dyn ProfileCatalog,
) -> Result<Vec<Registry>> {
    decoder::decode(r, catalog)
}

/// Encodes `input` to a new file at `path`, truncating it if it already exists.
pub fn encode<P: AsRef<Path>>(
    path: P,
    input: EncodeInput,
    catalog: &dyn ProfileCatalog,
) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    encode_writer(&mut file, input, catalog)
}

/// Encodes `input` to an already-open read/write/seekable sink, such as a
/// `Cursor<Vec<u8>>` for in-memory use.
pub fn encode_writer<W: Read + Write + Seek>(
    w: &mut W,
    input: EncodeInput,
    catalog: &dyn ProfileCatalog,
) -> Result<()> {
    encoder::encode(w, input, catalog)
}
