//! Codec error types.

use thiserror::Error;

/// Errors produced while translating between local and wire records.
///
/// Every variant carries the name of the field that failed so a log line is
/// enough to find the offending record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A temporal field on the wire is not a valid ISO-8601 value.
    #[error("malformed timestamp in field '{field}': {value}")]
    MalformedTimestamp { field: String, value: String },

    /// A local value could not be serialized for the wire.
    #[error("failed to encode field '{field}': {message}")]
    EncodingFailed { field: String, message: String },

    /// A wire value could not be turned back into its local shape.
    #[error("failed to decode field '{field}': {message}")]
    DecodingFailed { field: String, message: String },
}

impl CodecError {
    pub fn encoding(field: impl Into<String>, message: impl ToString) -> Self {
        Self::EncodingFailed {
            field: field.into(),
            message: message.to_string(),
        }
    }

    pub fn decoding(field: impl Into<String>, message: impl ToString) -> Self {
        Self::DecodingFailed {
            field: field.into(),
            message: message.to_string(),
        }
    }

    /// Short variant name, used as a structured logging field.
    pub fn variant(&self) -> &'static str {
        match self {
            Self::MalformedTimestamp { .. } => "malformed_timestamp",
            Self::EncodingFailed { .. } => "encoding_failed",
            Self::DecodingFailed { .. } => "decoding_failed",
        }
    }
}
