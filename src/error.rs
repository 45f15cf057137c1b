//! Error types for arithmetic coding and the frequency-table header.

use thiserror::Error;

/// Broad classification of an [`Error`].
///
/// Every kind is fatal to the call in progress. Arithmetic coding has no
/// mid-stream recovery: once a bit is wrong, everything after it is too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The frequency model cannot drive the coder.
    Model,
    /// The serialized frequency table is malformed.
    Format,
    /// The payload does not decode under the given model.
    Decode,
}

/// Error variants for model construction, table parsing and decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The model's total frequency is zero.
    #[error("frequency model is empty (total frequency is zero)")]
    EmptyModel,

    /// All 256 byte values occur in the data, leaving no value for END.
    #[error("alphabet uses all 256 byte values, no symbol left for END")]
    AlphabetFull,

    /// A byte to encode has no interval in the model.
    #[error("symbol 0x{0:02x} is not part of the frequency model")]
    UnknownSymbol(u8),

    /// END was requested from a model built without it.
    #[error("model has no END symbol")]
    MissingEnd,

    /// The model total is too large for the widest supported register.
    #[error("total frequency {0} exceeds the coder's precision")]
    TotalTooLarge(u64),

    /// The serialized table ended before a complete entry was read.
    #[error("frequency table truncated at offset {offset}")]
    Truncated {
        /// Byte offset at which more input was expected.
        offset: usize,
    },

    /// A magnitude byte is not a lowercase ASCII hex digit.
    #[error("invalid hex digit 0x{byte:02x} at offset {offset}")]
    InvalidDigit {
        /// The offending byte.
        byte: u8,
        /// Its offset in the serialized table.
        offset: usize,
    },

    /// A frequency does not fit in the packed five-unit magnitude.
    #[error("frequency {0} exceeds the packed magnitude ceiling")]
    FrequencyOutOfRange(u64),

    /// The same symbol appears twice in a serialized table.
    #[error("duplicate symbol 0x{0:02x} in frequency table")]
    DuplicateSymbol(u8),

    /// The container holds a table but no payload bytes.
    #[error("arithmetic-coded payload is empty")]
    EmptyPayload,

    /// The decoder's value fell outside every interval.
    #[error("decoder desynchronized after {position} symbols")]
    Desync {
        /// Number of symbols decoded before the failure.
        position: usize,
    },

    /// END was reached at a different length than the table promised.
    #[error("decoded {actual} bytes but expected {expected}")]
    LengthMismatch {
        /// Length derived from the frequency table.
        expected: u64,
        /// Length actually decoded.
        actual: u64,
    },
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyModel
            | Error::AlphabetFull
            | Error::UnknownSymbol(_)
            | Error::MissingEnd
            | Error::TotalTooLarge(_) => ErrorKind::Model,
            Error::Truncated { .. }
            | Error::InvalidDigit { .. }
            | Error::FrequencyOutOfRange(_)
            | Error::DuplicateSymbol(_) => ErrorKind::Format,
            Error::EmptyPayload | Error::Desync { .. } | Error::LengthMismatch { .. } => {
                ErrorKind::Decode
            }
        }
    }
}

/// A specialized Result type for coding operations.
pub type Result<T> = std::result::Result<T, Error>;
