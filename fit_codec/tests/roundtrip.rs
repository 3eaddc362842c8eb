//! Integration tests exercising the public `decode`/`encode_writer` entry points
//! end to end, beyond the unit tests beside each codec module.

use std::collections::HashMap;
use std::io::Cursor;

use fit_codec::{EncodeInput, Error, FieldValue, ScalarValue, UserRecord};
use fit_profile::{CsvProfileCatalog, FieldArray, ProfileField, ProfileMessage, Source};
use indexmap::IndexMap;

fn record_catalog() -> CsvProfileCatalog {
    CsvProfileCatalog::from_parts(
        vec![ProfileMessage {
            name: "record".to_string(),
            number: 20,
            source: Source::Documented,
            comment: None,
            fields: vec![ProfileField {
                definition_number: 253,
                name: "timestamp".to_string(),
                type_name: "uint32".to_string(),
                array: FieldArray::NotArray,
                scale: vec![1.0],
                offset: 0,
                units: vec![],
                comment: None,
            }],
        }],
        HashMap::new(),
    )
}

#[test]
fn decode_of_truncated_input_is_an_error_not_a_panic() {
    let catalog = record_catalog();
    let bytes: &[u8] = &[0x0E, 0x10];
    let mut cursor = Cursor::new(bytes);
    let err = fit_codec::decode_reader(&mut cursor, &catalog).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn field_values_round_trip_through_encode_then_decode() {
    let catalog = record_catalog();

    let mut fields = IndexMap::new();
    fields.insert(
        "timestamp".to_string(),
        FieldValue::Scalar(ScalarValue::UInt32(1_000_000)),
    );
    let records = vec![UserRecord {
        message_name: "record".to_string(),
        local_message_number: 0,
        fields,
    }];

    let mut buf = Cursor::new(Vec::new());
    fit_codec::encode_writer(
        &mut buf,
        EncodeInput::Records {
            records,
            template: None,
        },
        &catalog,
    )
    .unwrap();

    let decoded = fit_codec::decode_reader(&mut Cursor::new(buf.into_inner()), &catalog).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].records.len(), 1);
    assert_eq!(
        decoded[0].records[0].fields["timestamp"],
        FieldValue::Scalar(ScalarValue::UInt32(1_000_000))
    );
}

#[test]
fn newest_definition_shadows_earlier_one_for_same_local_slot() {
    let catalog = record_catalog();

    let mut first_fields = IndexMap::new();
    first_fields.insert(
        "timestamp".to_string(),
        FieldValue::Scalar(ScalarValue::UInt32(1)),
    );
    let mut second_fields = IndexMap::new();
    second_fields.insert(
        "timestamp".to_string(),
        FieldValue::Scalar(ScalarValue::UInt32(2)),
    );

    let records = vec![
        UserRecord {
            message_name: "record".to_string(),
            local_message_number: 0,
            fields: first_fields,
        },
        UserRecord {
            message_name: "record".to_string(),
            local_message_number: 1, // forces a second definition+data pair
            fields: IndexMap::new(),
        },
        UserRecord {
            message_name: "record".to_string(),
            local_message_number: 0, // reuses slot 0's already-installed definition
            fields: second_fields,
        },
    ];

    let mut buf = Cursor::new(Vec::new());
    fit_codec::encode_writer(
        &mut buf,
        EncodeInput::Records {
            records,
            template: None,
        },
        &catalog,
    )
    .unwrap();

    let decoded = fit_codec::decode_reader(&mut Cursor::new(buf.into_inner()), &catalog).unwrap();
    let records = &decoded[0].records;
    assert_eq!(
        records[0].fields["timestamp"],
        FieldValue::Scalar(ScalarValue::UInt32(1))
    );
    assert_eq!(
        records[2].fields["timestamp"],
        FieldValue::Scalar(ScalarValue::UInt32(2))
    );
}

#[test]
fn reencoding_against_a_decoded_template_reproduces_its_definition_bytes() {
    let catalog = record_catalog();

    let mut fields = IndexMap::new();
    fields.insert(
        "timestamp".to_string(),
        FieldValue::Scalar(ScalarValue::UInt32(42)),
    );
    let records = vec![UserRecord {
        message_name: "record".to_string(),
        local_message_number: 0,
        fields,
    }];

    let mut original = Cursor::new(Vec::new());
    fit_codec::encode_writer(
        &mut original,
        EncodeInput::Records {
            records: records.clone(),
            template: None,
        },
        &catalog,
    )
    .unwrap();
    let original_bytes = original.into_inner();

    let template = fit_codec::decode_reader(&mut Cursor::new(original_bytes.clone()), &catalog)
        .unwrap()
        .remove(0);

    let mut reencoded = Cursor::new(Vec::new());
    fit_codec::encode_writer(
        &mut reencoded,
        EncodeInput::Records {
            records,
            template: Some(&template),
        },
        &catalog,
    )
    .unwrap();
    let reencoded_bytes = reencoded.into_inner();

    // header (14 bytes) + 1-byte record header + 8-byte single-field definition body
    let definition_range = 14..23;
    assert_eq!(
        &reencoded_bytes[definition_range.clone()],
        &original_bytes[definition_range],
        "re-encoding against a decoded template must reproduce its definition record byte for byte"
    );
}
