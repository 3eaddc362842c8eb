use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("reading profile table")]
    Csv(#[from] csv::Error),

    #[error("profile table row is missing column {index} ({column})")]
    MissingColumn { column: &'static str, index: usize },

    #[error("invalid number in profile table: {0}")]
    InvalidNumber(String),
}
