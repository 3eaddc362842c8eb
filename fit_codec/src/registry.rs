//! The decoded (or to-be-encoded) form of a FIT file: a header, an ordered list of
//! records, and the active definition table that bound each one.

use indexmap::IndexMap;

use crate::definition_record::DefinitionRecord;
use crate::error::{Error, Result};
use crate::header::Header;
use crate::record_header::RecordHeader;
use crate::value::FieldValue;
use fit_profile::Source;

/// A definition record bound to a local message slot. The registry never mutates
/// these once appended; a later entry for the same `local_message_number` simply
/// shadows the earlier one on lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionSlot {
    pub local_message_number: u8,
    pub message_name: String,
    pub record_header: RecordHeader,
    pub definition: DefinitionRecord,
}

/// One decoded data record, with its fields resolved to names.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub index: usize,
    pub message_name: String,
    pub message_number: u16,
    pub message_source: Source,
    pub local_message_number: u8,
    pub fields: IndexMap<String, FieldValue>,
}

/// A decoded or about-to-be-encoded FIT segment: header, records, and the
/// definitions that gave the records their shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    pub header: Header,
    pub records: Vec<DecodedRecord>,
    definitions: Vec<DefinitionSlot>,
}

impl Registry {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            records: Vec::new(),
            definitions: Vec::new(),
        }
    }

    pub fn append_record(&mut self, record: DecodedRecord) {
        self.records.push(record);
    }

    /// Installs a definition at `local_message_number`, shadowing any previous
    /// binding for that slot without removing it from history.
    pub fn install_definition(
        &mut self,
        local_message_number: u8,
        record_header: RecordHeader,
        definition: DefinitionRecord,
    ) {
        self.definitions.push(DefinitionSlot {
            local_message_number,
            message_name: definition.message_name.clone(),
            record_header,
            definition,
        });
    }

    /// Looks up the currently active definition for `local_message_number`,
    /// scanning from newest to oldest so a redefinition shadows earlier bindings.
    pub fn find_definition(&self, local_message_number: u8) -> Result<&DefinitionSlot> {
        self.definitions
            .iter()
            .rev()
            .find(|slot| slot.local_message_number == local_message_number)
            .ok_or(Error::UndefinedLocalMessageType {
                local_message_type: local_message_number,
            })
    }

    pub fn definitions(&self) -> &[DefinitionSlot] {
        &self.definitions
    }
}
