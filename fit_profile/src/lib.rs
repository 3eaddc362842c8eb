//! Runtime loader for the FIT profile tables (messages and types).
//!
//! This crate is the "profile catalog loader" external collaborator described by
//! the codec core: it reads tabular (CSV) descriptions of FIT messages and types and
//! exposes them as plain data. It knows nothing about the wire format itself.

use std::collections::HashMap;
use std::path::Path;

use convert_case::{Case, Casing};

mod error;

pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Whether a message or type value came from the documented Garmin profile tables or
/// from a supplementary, reverse-engineered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Documented,
    Undocumented,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldArray {
    NotArray,
    FixedSize(usize),
    VariableSize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileField {
    pub definition_number: u8,
    pub name: String,
    pub type_name: String,
    pub array: FieldArray,
    pub scale: Vec<f32>,
    pub offset: i16,
    pub units: Vec<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileMessage {
    pub name: String,
    pub number: u16,
    pub source: Source,
    pub comment: Option<String>,
    pub fields: Vec<ProfileField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTypeValue {
    pub name: String,
    pub value: u32,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileType {
    pub type_name: String,
    pub base_type_name: String,
    pub values: Vec<ProfileTypeValue>,
}

/// The read-only view over messages/types that the codec core requires.
///
/// `fit_codec` is generic over this trait so that any profile source -- the CSV
/// loader here, a hand-built fixture in tests, or a future embedded table -- can
/// back the core's message/field resolution.
pub trait ProfileCatalog {
    fn messages(&self) -> &[ProfileMessage];
    fn types(&self) -> &HashMap<String, ProfileType>;

    fn message_by_number(&self, number: u16) -> Option<&ProfileMessage> {
        self.messages().iter().find(|m| m.number == number)
    }

    fn message_by_name(&self, name: &str) -> Option<&ProfileMessage> {
        self.messages().iter().find(|m| m.name == name)
    }
}

/// A `ProfileCatalog` assembled from CSV tables on disk, merging a documented and an
/// undocumented dictionary: documented entries win on name collision, but
/// undocumented-only messages/fields are appended.
#[derive(Debug, Clone, Default)]
pub struct CsvProfileCatalog {
    messages: Vec<ProfileMessage>,
    types: HashMap<String, ProfileType>,
}

impl CsvProfileCatalog {
    /// Loads `messages.csv` / `types.csv` (documented) and, if present,
    /// `undocumented_messages.csv` / `undocumented_types.csv` from `dir`.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        let documented_messages = read_messages(dir.join("messages.csv"), Source::Documented)?;
        let undocumented_messages = read_optional_messages(
            dir.join("undocumented_messages.csv"),
            Source::Undocumented,
        )?;
        let messages = merge_messages(documented_messages, undocumented_messages);

        let documented_types = read_types(dir.join("types.csv"))?;
        let undocumented_types = read_optional_types(dir.join("undocumented_types.csv"))?;
        let types = merge_types(documented_types, undocumented_types);

        Ok(Self { messages, types })
    }

    /// Builds a catalog directly from already-parsed messages/types, bypassing CSV.
    /// Used by tests and by callers that embed a small fixed profile.
    pub fn from_parts(messages: Vec<ProfileMessage>, types: HashMap<String, ProfileType>) -> Self {
        Self { messages, types }
    }
}

impl ProfileCatalog for CsvProfileCatalog {
    fn messages(&self) -> &[ProfileMessage] {
        &self.messages
    }

    fn types(&self) -> &HashMap<String, ProfileType> {
        &self.types
    }
}

fn merge_messages(
    documented: Vec<ProfileMessage>,
    undocumented: Vec<ProfileMessage>,
) -> Vec<ProfileMessage> {
    let mut by_name: HashMap<String, ProfileMessage> =
        documented.into_iter().map(|m| (m.name.clone(), m)).collect();

    for msg in undocumented {
        match by_name.get_mut(&msg.name) {
            None => {
                by_name.insert(msg.name.clone(), msg);
            }
            Some(existing) => {
                let known_numbers: std::collections::HashSet<u8> = existing
                    .fields
                    .iter()
                    .map(|f| f.definition_number)
                    .collect();
                for field in msg.fields {
                    if !known_numbers.contains(&field.definition_number) {
                        existing.fields.push(field);
                    }
                }
            }
        }
    }

    let mut merged: Vec<ProfileMessage> = by_name.into_values().collect();
    merged.sort_by_key(|m| m.number);
    merged
}

fn merge_types(
    documented: HashMap<String, ProfileType>,
    undocumented: HashMap<String, ProfileType>,
) -> HashMap<String, ProfileType> {
    let mut merged = documented;
    for (name, ty) in undocumented {
        merged.entry(name).or_insert(ty);
    }
    merged
}

fn read_optional_messages(
    path: std::path::PathBuf,
    source: Source,
) -> Result<Vec<ProfileMessage>> {
    if path.exists() {
        read_messages(path, source)
    } else {
        Ok(Vec::new())
    }
}

fn read_optional_types(path: std::path::PathBuf) -> Result<HashMap<String, ProfileType>> {
    if path.exists() {
        read_types(path)
    } else {
        Ok(HashMap::new())
    }
}

fn column<'a>(rec: &'a csv::StringRecord, index: usize, name: &'static str) -> Result<&'a str> {
    rec.get(index)
        .ok_or(Error::MissingColumn { column: name, index })
}

const MESSAGE_NAME_IDX: usize = 0;
const MESSAGE_NUMBER_IDX: usize = 1;
const FIELD_DEF_NUMBER_IDX: usize = 2;
const FIELD_NAME_IDX: usize = 3;
const FIELD_TYPE_IDX: usize = 4;
const ARRAY_IDX: usize = 5;
const SCALE_IDX: usize = 6;
const OFFSET_IDX: usize = 7;
const UNITS_IDX: usize = 8;
const COMMENT_IDX: usize = 9;

/// Reads a messages table. Rows share the section-header-then-fields shape of the
/// Garmin SDK's messages sheet: a row with a non-empty message name and an empty
/// field-definition-number column starts a new message; subsequent rows with an
/// empty message name add fields to it. Fields with no definition number are
/// dropped.
fn read_messages<P: AsRef<Path>>(path: P, source: Source) -> Result<Vec<ProfileMessage>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut messages: Vec<ProfileMessage> = Vec::new();
    let mut current: Option<ProfileMessage> = None;

    for result in rdr.records() {
        let rec = result?;
        let message_name = column(&rec, MESSAGE_NAME_IDX, "message_name")?.trim();
        let field_def_number = column(&rec, FIELD_DEF_NUMBER_IDX, "field_def_number")?.trim();

        if !message_name.is_empty() && field_def_number.is_empty() {
            if let Some(msg) = current.take() {
                messages.push(msg);
            }
            let number_str = column(&rec, MESSAGE_NUMBER_IDX, "message_number")?.trim();
            let number = parse_u16(number_str)?;
            current = Some(ProfileMessage {
                name: message_name.to_string(),
                number,
                source,
                comment: None,
                fields: Vec::new(),
            });
            continue;
        }

        if field_def_number.is_empty() {
            continue;
        }

        let Some(msg) = current.as_mut() else {
            continue;
        };

        let definition_number: u8 = field_def_number
            .parse()
            .map_err(|_| Error::InvalidNumber(field_def_number.to_string()))?;
        let name = column(&rec, FIELD_NAME_IDX, "field_name")?.trim().to_string();
        let type_name = column(&rec, FIELD_TYPE_IDX, "field_type")?.trim().to_string();
        let array = parse_array(column(&rec, ARRAY_IDX, "array")?);
        let scale = parse_scale(column(&rec, SCALE_IDX, "scale")?);
        let offset = parse_offset(column(&rec, OFFSET_IDX, "offset")?)?;
        let units = parse_comma_list(column(&rec, UNITS_IDX, "units")?);
        let comment = non_empty(column(&rec, COMMENT_IDX, "comment")?);

        msg.fields.push(ProfileField {
            definition_number,
            name,
            type_name,
            array,
            scale,
            offset,
            units,
            comment,
        });
    }
    if let Some(msg) = current.take() {
        messages.push(msg);
    }
    Ok(messages)
}

const TYPE_NAME_IDX: usize = 0;
const BASE_TYPE_IDX: usize = 1;
const VALUE_NAME_IDX: usize = 2;
const VALUE_IDX: usize = 3;
const TYPE_COMMENT_IDX: usize = 4;

fn read_types<P: AsRef<Path>>(path: P) -> Result<HashMap<String, ProfileType>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut types: HashMap<String, ProfileType> = HashMap::new();
    let mut current: Option<ProfileType> = None;

    for result in rdr.records() {
        let rec = result?;
        let type_name = column(&rec, TYPE_NAME_IDX, "type_name")?.trim();

        if !type_name.is_empty() {
            if let Some(ty) = current.take() {
                types.insert(ty.type_name.clone(), ty);
            }
            current = Some(ProfileType {
                type_name: type_name.to_string(),
                base_type_name: column(&rec, BASE_TYPE_IDX, "base_type")?.trim().to_string(),
                values: Vec::new(),
            });
            continue;
        }

        let Some(ty) = current.as_mut() else {
            continue;
        };
        let value_name = column(&rec, VALUE_NAME_IDX, "value_name")?.trim();
        if value_name.is_empty() {
            continue;
        }
        let value_str = column(&rec, VALUE_IDX, "value")?.trim();
        let value = parse_type_value(value_str)?;
        let comment = column(&rec, TYPE_COMMENT_IDX, "comment")?.trim().to_string();
        ty.values.push(ProfileTypeValue {
            name: value_name.to_string(),
            value,
            comment,
        });
    }
    if let Some(ty) = current.take() {
        types.insert(ty.type_name.clone(), ty);
    }
    Ok(types)
}

fn parse_type_value(s: &str) -> Result<u32> {
    if let Some(hex) = s.to_lowercase().strip_prefix("0x") {
        u32::from_str_radix(hex, 16).map_err(|_| Error::InvalidNumber(s.to_string()))
    } else {
        s.parse::<u32>()
            .map_err(|_| Error::InvalidNumber(s.to_string()))
    }
}

fn parse_u16(s: &str) -> Result<u16> {
    if s.is_empty() {
        Ok(0)
    } else {
        s.parse().map_err(|_| Error::InvalidNumber(s.to_string()))
    }
}

fn parse_array(s: &str) -> FieldArray {
    let s = s.trim();
    if s.is_empty() {
        FieldArray::NotArray
    } else if s.eq_ignore_ascii_case("[n]") {
        FieldArray::VariableSize
    } else if let Some(inner) = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        inner
            .parse::<usize>()
            .map(FieldArray::FixedSize)
            .unwrap_or(FieldArray::NotArray)
    } else {
        FieldArray::NotArray
    }
}

fn parse_scale(s: &str) -> Vec<f32> {
    if s.trim().is_empty() {
        vec![1.0]
    } else {
        s.split(',').filter_map(|v| v.trim().parse().ok()).collect()
    }
}

fn parse_offset(s: &str) -> Result<i16> {
    let s = s.trim();
    if s.is_empty() {
        Ok(0)
    } else {
        s.parse().map_err(|_| Error::InvalidNumber(s.to_string()))
    }
}

fn parse_comma_list(s: &str) -> Vec<String> {
    if s.trim().is_empty() {
        Vec::new()
    } else {
        s.split(',').map(|v| v.trim().to_string()).collect()
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Converts a FIT profile enum type name (e.g. `file`) to the `UpperCamel` Rust
/// identifier convention, retained for callers that want to generate bindings from
/// a loaded catalog.
pub fn type_name_to_rust_ident(type_name: &str) -> String {
    type_name.to_case(Case::UpperCamel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, contents: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn loads_and_merges_messages() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "messages.csv",
            "message_name,message_number,field_def_number,field_name,field_type,array,scale,offset,units,comment\n\
             device_info,23,,,,,,,,\n\
             ,,2,manufacturer,uint16,,,,,\n\
             ,,3,product,uint16,,,,,\n",
        );
        write_csv(dir.path(), "types.csv", "type_name,base_type,value_name,value,comment\n");
        write_csv(
            dir.path(),
            "undocumented_messages.csv",
            "message_name,message_number,field_def_number,field_name,field_type,array,scale,offset,units,comment\n\
             device_info,23,,,,,,,,\n\
             ,,29,undocumented_field_29,enum,[N],,,,\n\
             ,,2,manufacturer,uint16,,,,,\n",
        );

        let catalog = CsvProfileCatalog::load_from_dir(dir.path()).unwrap();
        let device_info = catalog.message_by_name("device_info").unwrap();
        assert_eq!(device_info.number, 23);
        // the documented fields plus the undocumented-only field 29; field 2 should
        // not be duplicated since it's already documented.
        assert_eq!(device_info.fields.len(), 3);
        assert!(device_info
            .fields
            .iter()
            .any(|f| f.definition_number == 29 && f.name == "undocumented_field_29"));
    }

    #[test]
    fn drops_fields_without_definition_number() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "messages.csv",
            "message_name,message_number,field_def_number,field_name,field_type,array,scale,offset,units,comment\n\
             file_id,0,,,,,,,,\n\
             ,,0,type,file,,,,,\n\
             ,,,garmin_product,uint16,,,,,\n",
        );
        write_csv(dir.path(), "types.csv", "type_name,base_type,value_name,value,comment\n");

        let catalog = CsvProfileCatalog::load_from_dir(dir.path()).unwrap();
        let file_id = catalog.message_by_name("file_id").unwrap();
        assert_eq!(file_id.fields.len(), 1);
    }

    #[test]
    fn parses_array_definitions() {
        assert_eq!(parse_array(""), FieldArray::NotArray);
        assert_eq!(parse_array("[3]"), FieldArray::FixedSize(3));
        assert_eq!(parse_array("[N]"), FieldArray::VariableSize);
    }
}
