use thiserror::Error;

/// Errors raised while decoding a capture.
///
/// `record` is the zero-based index of the record being decoded and `offset`
/// the byte position in the input at which the problem was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("record {record} (byte {offset}): invalid value field {text:?}")]
    InvalidValue {
        record: usize,
        offset: usize,
        text: String,
    },

    #[error("record {record} (byte {offset}): record ended before a value was read")]
    MissingValue { record: usize, offset: usize },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
