use std::io;
use std::result;

use csvline_core::MismatchedQuotes;

/// A type alias for `Result<T, csvline::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when reading, parsing or building delimited text.
///
/// None of these errors are retried internally. For example, a caller that
/// receives `ColumnCount` may decide to parse the line again with
/// missing-column tolerance enabled.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error that occurred while reading from the character source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A single logical line exceeded the configured maximum length.
    ///
    /// This usually means the data is corrupt or a closing quote is
    /// missing, which makes the rest of the input look like one long
    /// quoted field.
    #[error(
        "line {line} exceeds the maximum length of {max} characters, \
         starting with: {prefix:?}"
    )]
    LineTooLong {
        /// The 1-based number of the logical line being read.
        line: u64,
        /// The configured maximum, in characters.
        max: usize,
        /// The first characters of the offending line.
        prefix: String,
    },
    /// A line ended while a quoted section was still open.
    #[error("mismatched quotes")]
    MismatchedQuotes,
    /// A parsed line did not have the expected number of columns.
    #[error("expected {expected} columns but found {found}")]
    ColumnCount {
        /// The configured number of columns.
        expected: usize,
        /// The number of columns found in the line.
        found: usize,
    },
    /// A record written to a `RecordBuilder` does not have the same number
    /// of values as the first record.
    #[error(
        "record has {found} values, but the first record established \
         {expected} values per record"
    )]
    RecordLength {
        /// The number of values established by the first record.
        expected: usize,
        /// The number of values in the offending record.
        found: usize,
    },
    /// A delimiter specification was neither a single character nor a
    /// `\uXXXX` escape.
    #[error("invalid delimiter {0:?}: expected a single character or a \\uXXXX escape")]
    Delimiter(String),
    /// A value could not be serialized into a record.
    #[error("CSV serialize error: {0}")]
    Serialize(String),
    /// A record could not be deserialized into a value.
    #[error("CSV deserialize error: field {field}: {message}")]
    Deserialize {
        /// The 0-based index of the field being deserialized.
        field: u64,
        /// A description of what went wrong.
        message: String,
    },
}

impl Error {
    /// Returns true if this error reports malformed input (as opposed to an
    /// I/O failure or a caller error on the write side).
    pub fn is_malformed_input(&self) -> bool {
        match *self {
            Error::LineTooLong { .. }
            | Error::MismatchedQuotes
            | Error::ColumnCount { .. } => true,
            _ => false,
        }
    }
}

impl From<MismatchedQuotes> for Error {
    fn from(_: MismatchedQuotes) -> Error {
        Error::MismatchedQuotes
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Error {
        Error::Serialize(msg.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::de::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Error {
        Error::Deserialize { field: 0, message: msg.to_string() }
    }
}
