//! The decode driver: walks a byte stream's chained segments, dispatching
//! definition and data records against the active definition table.

use std::io::{Read, Seek, SeekFrom};

use fit_profile::ProfileCatalog;

use crate::data_record;
use crate::definition_record::DefinitionRecord;
use crate::error::Result;
use crate::header::Header;
use crate::record_header::RecordHeader;
use crate::registry::{DecodedRecord, Registry};

/// Decodes every chained segment in `r` into its own [`Registry`]. Most files are a
/// single segment, so the common case is a one-element vector.
pub fn decode<R: Read + Seek>(r: &mut R, catalog: &dyn ProfileCatalog) -> Result<Vec<Registry>> {
    let mut segments = Vec::new();

    loop {
        let offset = r.stream_position()?;
        let header = Header::decode(r)?;
        tracing::debug!(offset, data_size = header.data_size, "decoded segment header");

        let mut registry = Registry::new(header.clone());
        let body_start = r.stream_position()?;
        let body_end = body_start + header.data_size as u64;

        while r.stream_position()? < body_end {
            let record_header = RecordHeader::decode(r)?;
            if record_header.for_new_definition() {
                let definition =
                    DefinitionRecord::decode(r, record_header.developer_data_flag, catalog)?;
                registry.install_definition(
                    record_header.local_message_type,
                    record_header,
                    definition,
                );
            } else {
                let slot = registry.find_definition(record_header.local_message_type)?;
                let definition = slot.definition.clone();
                let message_name = slot.message_name.clone();
                let fields = data_record::read_record(&definition, r)?;
                let index = registry.records.len();
                registry.append_record(DecodedRecord {
                    index,
                    message_name,
                    message_number: definition.global_message_number,
                    message_source: definition.message_source,
                    local_message_number: record_header.local_message_type,
                    fields,
                });
            }
        }

        let mut trailing_crc = [0u8; 2];
        r.read_exact(&mut trailing_crc)?;

        segments.push(registry);

        let mut probe = [0u8; 1];
        let read = r.read(&mut probe)?;
        if read == 0 {
            break;
        }
        r.seek(SeekFrom::Current(-1))?;
    }

    Ok(segments)
}
