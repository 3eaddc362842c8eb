use thiserror::Error;

/// The flat error taxonomy every public operation in this crate returns.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported header size {size}")]
    UnsupportedHeader { size: u8 },

    #[error("bad file magic {got:?}, expected \".FIT\"")]
    BadMagic { got: String },

    #[error("header CRC mismatch: computed {computed:#06x}, found {found:#06x}")]
    HeaderCrcMismatch { computed: u16, found: u16 },

    #[error("file CRC mismatch: computed {computed:#06x}, found {found:#06x}")]
    FileCrcMismatch { computed: u16, found: u16 },

    #[error("compressed-timestamp record headers are not supported")]
    CompressedTimestampUnsupported,

    #[error("developer data fields are not supported")]
    DeveloperFieldsUnsupported,

    #[error("invalid definition record architecture byte {value}")]
    InvalidArchitecture { value: u8 },

    #[error("unknown global message number {number}")]
    UnknownGlobalMessage { number: u16 },

    #[error(
        "field {field} has byte_count {byte_count} inconsistent with base type width {base_width}"
    )]
    InvalidFieldWidth {
        field: u8,
        byte_count: u8,
        base_width: u8,
    },

    #[error("unknown base type number {number}")]
    UnknownBaseType { number: u8 },

    #[error("no active definition for local message type {local_message_type}")]
    UndefinedLocalMessageType { local_message_type: u8 },

    #[error("unknown message {name:?} in profile catalog")]
    MissingProfileMessage { name: String },

    #[error("message {message:?} has no field named {field:?} in the profile catalog")]
    UnknownField { message: String, field: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Profile(#[from] fit_profile::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
