use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Convenient alias for codec results.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], useful when callers only care about the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A read or write would have exceeded the buffer bounds.
    OutOfRange,
    /// Text could not be transcoded.
    EncodingFailure,
    /// No parser is known for a type.
    NoParserRegistered,
    /// A decoded integer does not fit into the requested type.
    NumericOverflow,
    /// The input is structurally invalid.
    Malformed,
}

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("{requested} bytes at position {position} exceed the capacity of {capacity}")]
    OutOfRange { position: usize, requested: usize, capacity: usize },
    #[error("String slice was not valid Utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("Code units were not valid Utf-16: {0}")]
    Utf16(#[from] std::char::DecodeUtf16Error),
    #[error("Utf-16 payload of {0} bytes is not a whole number of code units")]
    OddUtf16Length(usize),
    #[error("String contains U+0000 which cannot be token-recorded, use length recording instead")]
    EmbeddedNul,
    #[error("No parser registered for {0}")]
    NoParserRegistered(&'static str),
    #[error("Value {value} does not fit into {target}")]
    NumericOverflow { value: i128, target: &'static str },
    #[error("Invalid length {0}")]
    InvalidLength(i64),
    #[error("Invalid {what}: {value:#x}")]
    InvalidValue { what: &'static str, value: u64 },
    #[error("Null where a value of {0} was required")]
    UnexpectedNull(&'static str),
    #[error("Unknown reference {0}")]
    UnknownReference(u32),
    #[error("{0} trailing bytes in input")]
    TrailingBytes(usize),
    #[error("{0}")]
    Custom(String),
}

impl Error {

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OutOfRange { .. }          => ErrorKind::OutOfRange,
            Error::Utf8(_)
                | Error::Utf16(_)
                | Error::OddUtf16Length(_)
                | Error::EmbeddedNul          => ErrorKind::EncodingFailure,
            Error::NoParserRegistered(_)      => ErrorKind::NoParserRegistered,
            Error::NumericOverflow { .. }     => ErrorKind::NumericOverflow,
            Error::InvalidLength(_)
                | Error::InvalidValue { .. }
                | Error::UnexpectedNull(_)
                | Error::UnknownReference(_)
                | Error::TrailingBytes(_)
                | Error::Custom(_)            => ErrorKind::Malformed,
        }
    }

    pub fn at(self, at: usize) -> DecoderError {
        DecoderError { inner: self, at }
    }

    pub(crate) fn invalid(what: &'static str, value: impl Into<u64>) -> Self {
        Error::InvalidValue { what, value: value.into() }
    }

}

/// A decoding failure together with the input position at which it surfaced.
#[derive(Debug, PartialEq)]
pub struct DecoderError {
    inner: Error,
    at: usize,
}

impl DecoderError {

    pub fn into_inner(self) -> Error {
        self.inner
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner.kind()
    }

    pub fn position(&self) -> usize {
        self.at
    }

}

impl std::error::Error for DecoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
       Some(&self.inner)
    }
}

impl Display for DecoderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} at input position {}", self.inner, self.at)
    }
}
