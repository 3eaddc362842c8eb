//! Definition records: the schema declarations that precede data records and bind
//! a local message slot to a concrete field layout.

use std::io::{Read, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use fit_profile::{ProfileCatalog, Source};

use crate::error::{Error, Result};
use crate::field_definition::{self, FieldDefEntry, SchemaField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub fn from_architecture(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Endianness::Little),
            1 => Ok(Endianness::Big),
            other => Err(Error::InvalidArchitecture { value: other }),
        }
    }

    pub fn architecture_byte(&self) -> u8 {
        match self {
            Endianness::Little => 0,
            Endianness::Big => 1,
        }
    }

    pub fn read_u16<R: Read>(&self, r: &mut R) -> Result<u16> {
        Ok(match self {
            Endianness::Little => r.read_u16::<LittleEndian>()?,
            Endianness::Big => r.read_u16::<BigEndian>()?,
        })
    }

    pub fn write_u16<W: Write>(&self, w: &mut W, value: u16) -> Result<()> {
        match self {
            Endianness::Little => w.write_u16::<LittleEndian>(value)?,
            Endianness::Big => w.write_u16::<BigEndian>(value)?,
        }
        Ok(())
    }
}

/// A decoded (or to-be-encoded) definition record, plus the schema it resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionRecord {
    pub architecture: Endianness,
    pub global_message_number: u16,
    pub message_name: String,
    pub message_source: Source,
    pub raw_entries: Vec<FieldDefEntry>,
    pub fields: Vec<SchemaField>,
}

impl DefinitionRecord {
    pub fn decode<R: Read>(
        r: &mut R,
        developer_data_flag: bool,
        catalog: &dyn ProfileCatalog,
    ) -> Result<Self> {
        let _reserved = r.read_u8()?;
        let architecture = Endianness::from_architecture(r.read_u8()?)?;
        let global_message_number = architecture.read_u16(r)?;
        let field_count = r.read_u8()?;

        let raw_entries: Vec<FieldDefEntry> = (0..field_count)
            .map(|_| FieldDefEntry::decode(r))
            .collect::<Result<_>>()?;

        if developer_data_flag {
            let developer_field_count = r.read_u8()?;
            if developer_field_count != 0 {
                return Err(Error::DeveloperFieldsUnsupported);
            }
        }

        let message = catalog
            .message_by_number(global_message_number)
            .ok_or(Error::UnknownGlobalMessage {
                number: global_message_number,
            })?;

        let fields = raw_entries
            .iter()
            .map(|entry| field_definition::resolve(entry, Some(message)))
            .collect::<Result<_>>()?;

        Ok(Self {
            architecture,
            global_message_number,
            message_name: message.name.clone(),
            message_source: message.source,
            raw_entries,
            fields,
        })
    }

    pub fn encode<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u8(0)?; // reserved
        w.write_u8(self.architecture.architecture_byte())?;
        self.architecture
            .write_u16(w, self.global_message_number)?;
        w.write_u8(self.raw_entries.len() as u8)?;
        for entry in &self.raw_entries {
            entry.encode(w)?;
        }
        Ok(())
    }

    pub fn field(&self, number: u8) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.number == number)
    }
}
