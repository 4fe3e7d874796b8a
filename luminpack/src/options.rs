use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Byte encoding of string payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StringEncoding {
    #[default]
    Utf8,
    Utf16,
}

/// Framing of string payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StringRecording {
    /// The payload is preceded by its byte length.
    #[default]
    Length,
    /// The payload is followed by a zero terminator.
    Token,
}

/// Per-call settings which both sides of a message have to agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SerializerOptions {
    pub encoding: StringEncoding,
    pub recording: StringRecording,
}

impl SerializerOptions {

    pub const fn new(encoding: StringEncoding, recording: StringRecording) -> Self {
        Self { encoding, recording }
    }

    pub const fn with_encoding(self, encoding: StringEncoding) -> Self {
        Self { encoding, ..self }
    }

    pub const fn with_recording(self, recording: StringRecording) -> Self {
        Self { recording, ..self }
    }

}

/// Returned when an option name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOption {
    kind: &'static str,
    value: String,
}

impl Display for UnknownOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown string {} `{}`", self.kind, self.value)
    }
}

impl std::error::Error for UnknownOption {}

impl FromStr for StringEncoding {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8"   => Ok(StringEncoding::Utf8),
            "utf16" | "utf-16" => Ok(StringEncoding::Utf16),
            _ => Err(UnknownOption { kind: "encoding", value: s.to_owned() }),
        }
    }
}

impl FromStr for StringRecording {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "length" => Ok(StringRecording::Length),
            "token"  => Ok(StringRecording::Token),
            _ => Err(UnknownOption { kind: "recording", value: s.to_owned() }),
        }
    }
}

impl Display for StringEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self { StringEncoding::Utf8 => "utf8", StringEncoding::Utf16 => "utf16" })
    }
}

impl Display for StringRecording {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self { StringRecording::Length => "length", StringRecording::Token => "token" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        assert_eq!(Ok(StringEncoding::Utf16), "UTF-16".parse());
        assert_eq!(Ok(StringRecording::Token), "token".parse());
        assert!("utf32".parse::<StringEncoding>().is_err());
        assert_eq!("utf8/length", format!("{}/{}", StringEncoding::Utf8, StringRecording::Length));
    }

    #[test]
    fn builder() {
        let options = SerializerOptions::default().with_recording(StringRecording::Token);
        assert_eq!(SerializerOptions::new(StringEncoding::Utf8, StringRecording::Token), options);
    }

}
