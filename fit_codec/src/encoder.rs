//! The encode driver and the two registry builders (from scratch, from template)
//! that turn user-supplied records into a fully defined [`Registry`].

use std::collections::HashSet;
use std::io::{Read, Seek, SeekFrom, Write};

use fit_profile::{ProfileCatalog, ProfileMessage};
use indexmap::IndexMap;

use crate::base_type::{self, BaseType};
use crate::data_record;
use crate::definition_record::{DefinitionRecord, Endianness};
use crate::error::{Error, Result};
use crate::field_definition::{FieldDefEntry, FieldShape, SchemaField};
use crate::header::Header;
use crate::record_header::RecordHeader;
use crate::registry::{DecodedRecord, Registry};
use crate::value::FieldValue;

/// A single record supplied by the caller: a message name, the local slot it's
/// emitted under, and its field values by name.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub message_name: String,
    pub local_message_number: u8,
    pub fields: IndexMap<String, FieldValue>,
}

/// What to encode: a pre-built, trusted [`Registry`] whose definitions are used
/// as-is, or a list of user records to run through a registry builder first.
pub enum EncodeInput<'a> {
    Registry(Registry),
    Records {
        records: Vec<UserRecord>,
        template: Option<&'a Registry>,
    },
}

/// Encodes `input` to `w` as a single FIT segment.
pub fn encode<W: Read + Write + Seek>(
    w: &mut W,
    input: EncodeInput,
    catalog: &dyn ProfileCatalog,
) -> Result<()> {
    let registry = match input {
        EncodeInput::Registry(registry) => registry,
        EncodeInput::Records { records, template } => {
            build_registry(records, template, catalog)?
        }
    };
    encode_registry(w, &registry)
}

/// Writes a fully-built registry's header, definitions, and records, computing
/// `data_size` and both CRCs.
pub fn encode_registry<W: Read + Write + Seek>(w: &mut W, registry: &Registry) -> Result<()> {
    let segment_start = w.stream_position()?;
    Header::placeholder().encode(w)?;
    let body_start = w.stream_position()?;

    let mut installed: HashSet<(u8, String)> = HashSet::new();
    let mut last_local: Option<u8> = None;

    for record in &registry.records {
        let slot = registry
            .definitions()
            .iter()
            .rev()
            .find(|s| {
                s.local_message_number == record.local_message_number
                    && s.message_name == record.message_name
            })
            .ok_or(Error::UndefinedLocalMessageType {
                local_message_type: record.local_message_number,
            })?;

        let key = (record.local_message_number, record.message_name.clone());
        if !installed.contains(&key) && last_local != Some(record.local_message_number) {
            RecordHeader::definition(record.local_message_number).encode(w)?;
            slot.definition.encode(w)?;
            installed.insert(key);
        }

        RecordHeader::data(record.local_message_number).encode(w)?;
        data_record::write_record(&slot.definition, &record.fields, w)?;
        last_local = Some(record.local_message_number);
    }

    let body_end = w.stream_position()?;
    let body_len = body_end - body_start;

    w.seek(SeekFrom::Start(body_start))?;
    let mut body = vec![0u8; body_len as usize];
    w.read_exact(&mut body)?;

    let file_crc = base_type::crc(&body);
    w.seek(SeekFrom::Start(body_end))?;
    w.write_all(&file_crc.to_le_bytes())?;

    let mut header = Header::placeholder();
    header.data_size = body_len as u32;
    let mut header_bytes = Vec::new();
    header.encode(&mut header_bytes)?;
    let header_crc = header.header_crc()?;
    header_bytes[12..14].copy_from_slice(&header_crc.to_le_bytes());
    header.crc = Some(header_crc);

    w.seek(SeekFrom::Start(segment_start))?;
    w.write_all(&header_bytes)?;
    w.seek(SeekFrom::Start(body_end + 2))?;

    Ok(())
}

fn build_registry(
    records: Vec<UserRecord>,
    template: Option<&Registry>,
    catalog: &dyn ProfileCatalog,
) -> Result<Registry> {
    let defs_by_message: IndexMap<String, DefinitionRecord> = match template {
        Some(tpl) => defs_from_template(tpl),
        None => defs_from_scratch(&records, catalog)?,
    };

    let mut registry = Registry::new(Header::placeholder());
    let mut installed: HashSet<(u8, String)> = HashSet::new();
    let mut last_local: Option<u8> = None;

    for user_record in records {
        let definition = defs_by_message
            .get(&user_record.message_name)
            .cloned()
            .ok_or_else(|| Error::MissingProfileMessage {
                name: user_record.message_name.clone(),
            })?;

        let key = (user_record.local_message_number, user_record.message_name.clone());
        if !installed.contains(&key) && last_local != Some(user_record.local_message_number) {
            registry.install_definition(
                user_record.local_message_number,
                RecordHeader::definition(user_record.local_message_number),
                definition.clone(),
            );
            installed.insert(key);
        }

        let mut fields = IndexMap::with_capacity(definition.fields.len());
        for field in &definition.fields {
            let value = user_record
                .fields
                .get(&field.name)
                .cloned()
                .unwrap_or_else(|| data_record::undef_value(field));
            fields.insert(field.name.clone(), value);
        }

        let index = registry.records.len();
        registry.append_record(DecodedRecord {
            index,
            message_name: user_record.message_name.clone(),
            message_number: definition.global_message_number,
            message_source: definition.message_source,
            local_message_number: user_record.local_message_number,
            fields,
        });
        last_local = Some(user_record.local_message_number);
    }

    Ok(registry)
}

/// Builds one [`DefinitionRecord`] per distinct message name among `records`,
/// resolving each field's base type and shape from the profile catalog (or, for
/// `undocumented_field_<n>` names, from the value's own type).
fn defs_from_scratch(
    records: &[UserRecord],
    catalog: &dyn ProfileCatalog,
) -> Result<IndexMap<String, DefinitionRecord>> {
    let mut groups: IndexMap<String, Vec<&UserRecord>> = IndexMap::new();
    for record in records {
        groups
            .entry(record.message_name.clone())
            .or_default()
            .push(record);
    }

    let mut defs = IndexMap::with_capacity(groups.len());
    for (message_name, group) in groups {
        let profile_message = catalog
            .message_by_name(&message_name)
            .ok_or_else(|| Error::MissingProfileMessage {
                name: message_name.clone(),
            })?;

        let archetype = group
            .iter()
            .max_by_key(|r| r.fields.len())
            .expect("a message group always has at least one record");

        let mut raw_entries = Vec::with_capacity(archetype.fields.len());
        let mut fields = Vec::with_capacity(archetype.fields.len());

        for field_name in archetype.fields.keys() {
            let archetype_value = &archetype.fields[field_name];
            let (definition_number, base) =
                resolve_field_identity(profile_message, field_name, archetype_value, catalog)?;

            let shape = match archetype_value {
                FieldValue::Scalar(_) => FieldShape::Scalar { base },
                FieldValue::Array(values) => FieldShape::Array {
                    base,
                    length: values.len(),
                },
                FieldValue::String(_) => {
                    let longest = group
                        .iter()
                        .filter_map(|r| r.fields.get(field_name))
                        .filter_map(FieldValue::as_str)
                        .map(str::len)
                        .max()
                        .unwrap_or(0);
                    let byte_count = (longest / 8) * 8 + 8;
                    FieldShape::String { length: byte_count }
                }
            };

            raw_entries.push(FieldDefEntry {
                field_definition_number: definition_number,
                byte_count: shape.byte_count(),
                base_type_number: base.number,
                endian_ability: base.endian_capable,
            });
            fields.push(SchemaField {
                number: definition_number,
                name: field_name.clone(),
                shape,
            });
        }

        defs.insert(
            message_name.clone(),
            DefinitionRecord {
                architecture: Endianness::Little,
                global_message_number: profile_message.number,
                message_name,
                message_source: profile_message.source,
                raw_entries,
                fields,
            },
        );
    }

    Ok(defs)
}

fn resolve_field_identity(
    message: &ProfileMessage,
    field_name: &str,
    value: &FieldValue,
    catalog: &dyn ProfileCatalog,
) -> Result<(u8, BaseType)> {
    if let Some(profile_field) = message.fields.iter().find(|f| f.name == *field_name) {
        let base = resolve_base_type_for_name(catalog, &profile_field.type_name)
            .unwrap_or_else(|| base_type_for_value(value));
        return Ok((profile_field.definition_number, base));
    }

    if let Some(number) = field_name
        .strip_prefix("undocumented_field_")
        .and_then(|n| n.parse::<u8>().ok())
    {
        return Ok((number, base_type_for_value(value)));
    }

    Err(Error::UnknownField {
        message: message.name.clone(),
        field: field_name.to_string(),
    })
}

fn resolve_base_type_for_name(catalog: &dyn ProfileCatalog, type_name: &str) -> Option<BaseType> {
    if let Some(base) = base_type::lookup_by_name(type_name) {
        return Some(base);
    }
    catalog
        .types()
        .get(type_name)
        .and_then(|t| base_type::lookup_by_name(&t.base_type_name))
}

fn base_type_for_value(value: &FieldValue) -> BaseType {
    match value {
        FieldValue::Scalar(s) => base_type::for_kind(s.kind()),
        FieldValue::Array(values) => values
            .first()
            .map(|s| base_type::for_kind(s.kind()))
            .unwrap_or_else(|| base_type::lookup(0x00).expect("enum base type is always present")),
        FieldValue::String(_) => base_type::lookup(0x07).expect("string base type is always present"),
    }
}

/// Clones the newest definition per message name from `template`, verbatim --
/// including `byte_count` -- so the encoded structure matches the template exactly.
fn defs_from_template(template: &Registry) -> IndexMap<String, DefinitionRecord> {
    let mut defs: IndexMap<String, DefinitionRecord> = IndexMap::new();
    for slot in template.definitions() {
        defs.insert(slot.message_name.clone(), slot.definition.clone());
    }
    defs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ScalarValue;
    use fit_profile::{CsvProfileCatalog, FieldArray, ProfileField, ProfileMessage, Source};
    use std::collections::HashMap;
    use std::io::Cursor;

    fn device_info_catalog() -> CsvProfileCatalog {
        CsvProfileCatalog::from_parts(
            vec![ProfileMessage {
                name: "device_info".to_string(),
                number: 23,
                source: Source::Documented,
                comment: None,
                fields: vec![
                    ProfileField {
                        definition_number: 2,
                        name: "manufacturer".to_string(),
                        type_name: "uint16".to_string(),
                        array: FieldArray::NotArray,
                        scale: vec![1.0],
                        offset: 0,
                        units: vec![],
                        comment: None,
                    },
                    ProfileField {
                        definition_number: 3,
                        name: "serial_number".to_string(),
                        type_name: "uint32z".to_string(),
                        array: FieldArray::NotArray,
                        scale: vec![1.0],
                        offset: 0,
                        units: vec![],
                        comment: None,
                    },
                ],
            }],
            HashMap::new(),
        )
    }

    fn record_with_array(local: u8, value: Option<Vec<ScalarValue>>) -> UserRecord {
        let mut fields = IndexMap::new();
        if let Some(v) = value {
            fields.insert("undocumented_field_29".to_string(), FieldValue::Array(v));
            fields.insert(
                "serial_number".to_string(),
                FieldValue::Scalar(ScalarValue::UInt32z(123456)),
            );
        }
        fields.insert(
            "manufacturer".to_string(),
            FieldValue::Scalar(ScalarValue::UInt16(1)),
        );
        UserRecord {
            message_name: "device_info".to_string(),
            local_message_number: local,
            fields,
        }
    }

    #[test]
    fn undef_substitution_and_inferred_array_length() {
        let catalog = device_info_catalog();
        let records = vec![
            record_with_array(0, Some(vec![
                ScalarValue::Enum(0), ScalarValue::Enum(1), ScalarValue::Enum(2),
                ScalarValue::Enum(3), ScalarValue::Enum(4), ScalarValue::Enum(5),
            ])),
            record_with_array(0, Some(vec![
                ScalarValue::Enum(5), ScalarValue::Enum(4), ScalarValue::Enum(3),
                ScalarValue::Enum(2), ScalarValue::Enum(1), ScalarValue::Enum(0),
            ])),
            record_with_array(0, None),
        ];

        let mut buf = Cursor::new(Vec::new());
        encode(&mut buf, EncodeInput::Records { records, template: None }, &catalog).unwrap();

        let decoded = crate::decoder::decode(&mut Cursor::new(buf.into_inner()), &catalog).unwrap();
        let third = &decoded[0].records[2];
        assert_eq!(
            third.fields["undocumented_field_29"],
            FieldValue::Array(vec![ScalarValue::Enum(255); 6])
        );
        assert_eq!(
            third.fields["serial_number"],
            FieldValue::Scalar(ScalarValue::UInt32z(0))
        );
    }

    fn file_creator_catalog() -> CsvProfileCatalog {
        CsvProfileCatalog::from_parts(
            vec![ProfileMessage {
                name: "file_creator".to_string(),
                number: 49,
                source: Source::Documented,
                comment: None,
                fields: vec![],
            }],
            HashMap::new(),
        )
    }

    fn string_record(value: &str) -> UserRecord {
        let mut fields = IndexMap::new();
        fields.insert(
            "undocumented_field_2".to_string(),
            FieldValue::String(value.to_string()),
        );
        UserRecord {
            message_name: "file_creator".to_string(),
            local_message_number: 0,
            fields,
        }
    }

    #[test]
    fn string_padding_uses_longest_value_in_message() {
        let catalog = file_creator_catalog();
        let records = vec![
            string_record("Foo"),
            string_record("Bar Baz"),
            string_record(""),
        ];

        let mut buf = Cursor::new(Vec::new());
        encode(&mut buf, EncodeInput::Records { records, template: None }, &catalog).unwrap();

        let decoded = crate::decoder::decode(&mut Cursor::new(buf.into_inner()), &catalog).unwrap();
        let records = &decoded[0].records;
        assert_eq!(records[0].fields["undocumented_field_2"], FieldValue::String("Foo\0\0\0\0\0".to_string()));
        assert_eq!(records[1].fields["undocumented_field_2"], FieldValue::String("Bar Baz\0".to_string()));
        assert_eq!(records[2].fields["undocumented_field_2"], FieldValue::String("\0\0\0\0\0\0\0\0".to_string()));
    }

    #[test]
    fn header_only_round_trip_has_zero_body() {
        let catalog = device_info_catalog();
        let mut buf = Cursor::new(Vec::new());
        encode(&mut buf, EncodeInput::Records { records: vec![], template: None }, &catalog).unwrap();
        let bytes = buf.into_inner();
        assert_eq!(bytes.len(), 14 + 2);
        assert_eq!(&bytes[12..14], &0xD594u16.to_le_bytes());
    }
}
