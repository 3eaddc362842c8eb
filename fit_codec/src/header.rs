//! The FIT file header: the fixed-width preamble at the start of every segment.
//!
//! Grounded on the teacher's `FitFileHeader`, generalized to return typed errors
//! instead of panicking and to validate the trailing segment CRC as specified
//! (the source's equivalent check used `=` instead of `==` and was a no-op; here
//! it's a real comparison).

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::base_type::crc;
use crate::error::{Error, Result};

pub const DEFAULT_PROTOCOL_VERSION: u8 = 16;
pub const DEFAULT_PROFILE_VERSION: u16 = 2093;
pub const MAGIC: [u8; 4] = *b".FIT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    pub data_size: u32,
    pub data_type: [u8; 4],
    pub crc: Option<u16>,
}

impl Header {
    /// A fresh 14-byte header with placeholder `data_size`/`crc`, to be backfilled
    /// once the encoder knows the body's length.
    pub fn placeholder() -> Self {
        Self {
            header_size: 14,
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            profile_version: DEFAULT_PROFILE_VERSION,
            data_size: 0,
            data_type: MAGIC,
            crc: Some(0),
        }
    }

    /// Decodes the header at the current stream position, validates the header CRC
    /// (when present and nonzero) and the segment's trailing file CRC, then
    /// repositions the stream at the start of the segment body.
    pub fn decode<R: Read + Seek>(r: &mut R) -> Result<Self> {
        let header_size = r.read_u8()?;
        if header_size != 12 && header_size != 14 {
            return Err(Error::UnsupportedHeader { size: header_size });
        }

        let mut rest = [0u8; 11];
        r.read_exact(&mut rest)?;
        let protocol_version = rest[0];
        let profile_version = u16::from_le_bytes([rest[1], rest[2]]);
        let data_size = u32::from_le_bytes([rest[3], rest[4], rest[5], rest[6]]);
        let data_type = [rest[7], rest[8], rest[9], rest[10]];

        if data_type != MAGIC {
            return Err(Error::BadMagic {
                got: String::from_utf8_lossy(&data_type).into_owned(),
            });
        }

        let crc_field = if header_size == 14 {
            let found = r.read_u16::<LittleEndian>()?;
            if found != 0 {
                let mut first_12 = Vec::with_capacity(12);
                first_12.push(header_size);
                first_12.extend_from_slice(&rest);
                let computed = crc(&first_12);
                if computed != found {
                    return Err(Error::HeaderCrcMismatch { computed, found });
                }
            }
            Some(found)
        } else {
            None
        };

        let body_start = r.stream_position()?;
        let mut body = vec![0u8; data_size as usize];
        r.read_exact(&mut body)?;
        let file_crc_found = r.read_u16::<LittleEndian>()?;
        let file_crc_computed = crc(&body);
        if file_crc_computed != file_crc_found {
            return Err(Error::FileCrcMismatch {
                computed: file_crc_computed,
                found: file_crc_found,
            });
        }
        r.seek(SeekFrom::Start(body_start))?;

        Ok(Self {
            header_size,
            protocol_version,
            profile_version,
            data_size,
            data_type,
            crc: crc_field,
        })
    }

    /// Encodes the header as-is; callers finalizing an encode pass write a
    /// placeholder first and overwrite it once `data_size` and the CRC are known.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u8(self.header_size)?;
        w.write_u8(self.protocol_version)?;
        w.write_u16::<LittleEndian>(self.profile_version)?;
        w.write_u32::<LittleEndian>(self.data_size)?;
        w.write_all(&self.data_type)?;
        if self.header_size == 14 {
            w.write_u16::<LittleEndian>(self.crc.unwrap_or(0))?;
        }
        Ok(())
    }

    /// Computes the header CRC over the first `header_size - 2` bytes, as encoded.
    pub fn header_crc(&self) -> Result<u16> {
        let mut buf = Vec::with_capacity(self.header_size as usize);
        {
            let header_without_crc = Self {
                crc: None,
                header_size: 12,
                ..self.clone()
            };
            header_without_crc.encode(&mut buf)?;
        }
        Ok(crc(&buf))
    }
}
