use std;
use std::fmt::{self, Display};
use serde::{de, ser};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct DeserializationError {
    inner: Error,
    at: usize,
}

impl DeserializationError {

    pub fn into_inner(self) -> Error {
        self.inner
    }

    pub fn position(&self) -> usize {
        self.at
    }

}

impl std::error::Error for DeserializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}

impl Display for DeserializationError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{} at input position {}", self.inner, self.at)
    }
}

#[derive(Debug, PartialEq)]
pub enum Error {
    // Decode
    UnexpectedHeader(&'static str, String),
    FieldCount { expected: usize, found: u8 },
    NotSelfDescribing(&'static str),
    // Encode
    Length,
    TooManyFields(usize),
    VariantIndex(u32),
    // Both
    Codec(luminpack::Error),
    Message(String),
}

impl Error {
    pub fn at(self, at: usize) -> DeserializationError {
        DeserializationError { inner: self, at }
    }
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Message(msg) => fmt.write_str(msg),
            Error::Codec(e) => write!(fmt, "Codec error: {}", e),
            Error::Length => fmt.write_str("Length required"),
            Error::TooManyFields(n) => write!(fmt, "{} fields exceed the maximum member count of {}", n, luminpack::wire::MAX_MEMBER_COUNT),
            Error::VariantIndex(i) => write!(fmt, "Variant index {} does not fit into a union tag", i),
            Error::UnexpectedHeader(expected, actual) => write!(fmt, "Unexpected header: expected {}, found {}", expected, actual),
            Error::FieldCount { expected, found } => write!(fmt, "Expected {} members, found {}", expected, found),
            Error::NotSelfDescribing(what) => write!(fmt, "{} requires a self-describing format, luminpack is positional", what),
        }
    }
}

impl From<luminpack::Error> for Error {
    fn from(e: luminpack::Error) -> Error {
        Error::Codec(e)
    }
}

impl From<Error> for luminpack::Error {
    fn from(e: Error) -> luminpack::Error {
        match e {
            Error::Codec(inner) => inner,
            other => luminpack::Error::Custom(other.to_string()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Codec(e) => Some(e),
            _ => None,
        }
    }
}
