//! The one-byte record header that precedes every definition and data record.

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Definition,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub message_kind: MessageKind,
    pub developer_data_flag: bool,
    pub local_message_type: u8,
}

impl RecordHeader {
    pub fn data(local_message_type: u8) -> Self {
        Self {
            message_kind: MessageKind::Data,
            developer_data_flag: false,
            local_message_type,
        }
    }

    pub fn definition(local_message_type: u8) -> Self {
        Self {
            message_kind: MessageKind::Definition,
            developer_data_flag: false,
            local_message_type,
        }
    }

    pub fn for_new_definition(&self) -> bool {
        self.message_kind == MessageKind::Definition
    }

    pub fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let byte = r.read_u8()?;
        let normal = (byte >> 7) & 0x1;
        if normal == 1 {
            return Err(Error::CompressedTimestampUnsupported);
        }
        let message_kind = if (byte >> 6) & 0x1 == 1 {
            MessageKind::Definition
        } else {
            MessageKind::Data
        };
        let developer_data_flag = (byte >> 5) & 0x1 == 1;
        let local_message_type = byte & 0x0F;
        Ok(Self {
            message_kind,
            developer_data_flag,
            local_message_type,
        })
    }

    pub fn encode<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut byte = self.local_message_type & 0x0F;
        if self.message_kind == MessageKind::Definition {
            byte |= 1 << 6;
        }
        if self.developer_data_flag {
            byte |= 1 << 5;
        }
        w.write_u8(byte)?;
        Ok(())
    }
}
