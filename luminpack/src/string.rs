//! String framing. Which of the four layouts is used depends on [`SerializerOptions`]:
//!
//! | recording | encoding | null            | empty  | otherwise                                         |
//! |-----------|----------|-----------------|--------|---------------------------------------------------|
//! | length    | utf8     | `-1i32`         | `0i32` | byte length, Utf-16 length, Utf-8 bytes           |
//! | length    | utf16    | `-1i32`         | `0i32` | byte length, code units                           |
//! | token     | utf8     | `0xff`          | `00`   | Utf-8 bytes, `00`                                 |
//! | token     | utf16    | `ff df`         | `00 00`| code units, `00 00`                               |
//!
//! Token recording cannot represent strings containing U+0000.

use crate::error::{Error, Result};
use crate::options::{SerializerOptions, StringEncoding, StringRecording};
use crate::wire::COLLECTION_HEADER_SIZE;

/// Returns the number of bytes `value` occupies on wire under `options`.
pub fn encoded_size(value: Option<&str>, options: SerializerOptions) -> Result<usize> {
    match (options.recording, value) {
        (StringRecording::Length, None) | (StringRecording::Length, Some("")) => Ok(COLLECTION_HEADER_SIZE),
        (StringRecording::Length, Some(s)) => match options.encoding {
            StringEncoding::Utf8  => {
                length_field(s.len())?;
                length_field(utf16_units(s))?;
                Ok(2 * COLLECTION_HEADER_SIZE + s.len())
            },
            StringEncoding::Utf16 => {
                let len = utf16_bytes(s)?;
                length_field(len)?;
                Ok(COLLECTION_HEADER_SIZE + len)
            },
        },
        (StringRecording::Token, None) => Ok(match options.encoding {
            StringEncoding::Utf8  => 1,
            StringEncoding::Utf16 => 2,
        }),
        (StringRecording::Token, Some(s)) => {
            reject_nul(s)?;
            match options.encoding {
                StringEncoding::Utf8  => Ok(s.len() + 1),
                StringEncoding::Utf16 => Ok(utf16_bytes(s)? + 2),
            }
        },
    }
}

/// Converts a length to the four byte signed header value.
pub(crate) fn length_field(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::NumericOverflow { value: len as i128, target: "i32" })
}

pub(crate) fn reject_nul(s: &str) -> Result<()> {
    if s.contains('\0') {
        Err(Error::EmbeddedNul)
    } else {
        Ok(())
    }
}

#[inline]
pub(crate) fn utf16_units(s: &str) -> usize {
    s.encode_utf16().count()
}

pub(crate) fn utf16_bytes(s: &str) -> Result<usize> {
    let units = utf16_units(s);
    units.checked_mul(2).ok_or(Error::NumericOverflow { value: units as i128, target: "usize" })
}

/// Writes the code units of `s` into `out`, which has to be exactly `utf16_bytes(s)` long.
pub(crate) fn put_utf16(s: &str, out: &mut [u8]) {
    for (chunk, unit) in out.chunks_exact_mut(2).zip(s.encode_utf16()) {
        chunk.copy_from_slice(&unit.to_le_bytes());
    }
}

/// Decodes little-endian code units. Unpaired surrogates are an error.
pub(crate) fn decode_utf16(bytes: &[u8]) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(Error::OddUtf16Length(bytes.len()));
    }
    let units = bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]));
    let mut out = String::with_capacity(bytes.len());
    for c in char::decode_utf16(units) {
        out.push(c?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(encoding: StringEncoding, recording: StringRecording) -> SerializerOptions {
        SerializerOptions::new(encoding, recording)
    }

    #[test]
    fn sizes() {
        let l8 = options(StringEncoding::Utf8, StringRecording::Length);
        let l16 = options(StringEncoding::Utf16, StringRecording::Length);
        let t8 = options(StringEncoding::Utf8, StringRecording::Token);
        let t16 = options(StringEncoding::Utf16, StringRecording::Token);
        assert_eq!(Ok(4), encoded_size(None, l8));
        assert_eq!(Ok(4), encoded_size(Some(""), l16));
        assert_eq!(Ok(10), encoded_size(Some("hi"), l8));
        assert_eq!(Ok(8), encoded_size(Some("hi"), l16));
        assert_eq!(Ok(3), encoded_size(Some("hi"), t8));
        assert_eq!(Ok(6), encoded_size(Some("hi"), t16));
        assert_eq!(Ok(1), encoded_size(None, t8));
        assert_eq!(Ok(2), encoded_size(None, t16));
        // two bytes in Utf-8, one code unit
        assert_eq!(Ok(10), encoded_size(Some("ä"), l8));
        assert_eq!(Ok(6), encoded_size(Some("ä"), l16));
        // one scalar outside the BMP is a surrogate pair
        assert_eq!(Ok(8), encoded_size(Some("😀"), l16));
    }

    #[test]
    fn token_recording_rejects_nul() {
        let t8 = options(StringEncoding::Utf8, StringRecording::Token);
        assert_eq!(Err(Error::EmbeddedNul), encoded_size(Some("a\0b"), t8));
        let l8 = options(StringEncoding::Utf8, StringRecording::Length);
        assert_eq!(Ok(11), encoded_size(Some("a\0b"), l8));
    }

    #[test]
    fn utf16() {
        let mut buf = vec![0u8; utf16_bytes("a😀").unwrap()];
        put_utf16("a😀", &mut buf);
        assert_eq!(6, buf.len());
        assert_eq!(&[0x61, 0x00], &buf[..2]);
        assert_eq!("a😀", decode_utf16(&buf).unwrap());
        assert_eq!(Err(Error::OddUtf16Length(3)), decode_utf16(&buf[..3]));
        assert!(matches!(decode_utf16(&[0x00, 0xd8]), Err(Error::Utf16(_))));
    }

}
