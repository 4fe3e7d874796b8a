//! The [`Reader`] consumes the wire format from a borrowed byte slice.

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::options::{SerializerOptions, StringEncoding, StringRecording};
use crate::reference::ReferenceTable;
use crate::registry::ParserRegistry;
use crate::string;
use crate::unmanaged::{self, Unmanaged};
use crate::varint::{VarInt, VarIntCode};
use crate::wire::{ObjectHeader, MAX_MEMBER_COUNT, NULL_COLLECTION, NULL_OBJECT, NULL_UNION_TAG, NULL_UTF16_TOKEN,
    NULL_UTF8_TOKEN, REFERENCE_ID, WIDE_TAG};
use std::any::{type_name, Any};
use std::borrow::Cow;
use std::mem::size_of;
use std::rc::Rc;
use std::str::from_utf8;

/// Reads values from a byte slice. Every read is bounds checked up front; a failed read leaves the position where it
/// was before the read started.
pub struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
    registry: &'a ParserRegistry,
    options: SerializerOptions,
    references: ReferenceTable,
}

impl<'a> Reader<'a> {

    pub fn new(bytes: &'a [u8], registry: &'a ParserRegistry, options: SerializerOptions) -> Self {
        Self { cursor: Cursor::new(bytes), registry, options, references: ReferenceTable::default() }
    }

    pub fn options(&self) -> SerializerOptions {
        self.options
    }

    pub fn registry(&self) -> &'a ParserRegistry {
        self.registry
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Fails with [`Error::TrailingBytes`] unless everything was consumed.
    pub fn ensure_consumed(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(Error::TrailingBytes(n)),
        }
    }

    /// Returns the next byte without consuming it.
    pub fn peek_byte(&self) -> Result<u8> {
        self.cursor.byte_at(self.cursor.position())
    }

    /// Returns the byte `offset` bytes past the current position without consuming anything. Relative to the
    /// position, unlike [`byte_at`](Self::byte_at).
    pub fn peek_at(&self, offset: usize) -> Result<u8> {
        self.cursor.byte_at(self.cursor.position().saturating_add(offset))
    }

    /// Returns the byte at the absolute `index` of the input, wherever the position is.
    pub fn byte_at(&self, index: usize) -> Result<u8> {
        self.cursor.byte_at(index)
    }

    pub fn advance(&mut self, len: usize) -> Result<()> {
        self.cursor.advance(len)
    }

    /// Returns the next `len` bytes, borrowed from the input.
    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8]> {
        self.cursor.take(len)
    }

    #[inline]
    pub fn read_unmanaged<T: Unmanaged>(&mut self) -> Result<T> {
        Ok(unmanaged::read(self.read_raw(size_of::<T>())?))
    }

    /// Consumes `len` bytes at once for several unmanaged values, see [`read_unmanaged!`](crate::read_unmanaged).
    pub fn read_block(&mut self, len: usize) -> Result<BlockReader<'a>> {
        Ok(BlockReader { bytes: self.read_raw(len)?, position: 0 })
    }

    /// Reads a VarInt and narrows it to `T`.
    pub fn read_var_int<T: VarInt>(&mut self) -> Result<T> {
        let lead = self.peek_byte()? as i8;
        let (value, len) = match VarIntCode::from_lead(lead) {
            None       => (lead as i128, 1),
            Some(code) => {
                let width = code.width();
                let bytes = self.cursor.peek(1 + width)?;
                (code.get(&bytes[1..]), 1 + width)
            },
        };
        let narrowed = T::from_wide(value).ok_or(Error::NumericOverflow { value, target: T::TYPE_NAME })?;
        self.advance(len)?;
        Ok(narrowed)
    }

    /// Reads a collection header. `None` means the collection is absent.
    pub fn read_collection_header(&mut self) -> Result<Option<usize>> {
        let len = unmanaged::read::<i32>(self.cursor.peek(4)?);
        let header = match len {
            NULL_COLLECTION  => None,
            len if len < 0   => return Err(Error::InvalidLength(len as i64)),
            len              => Some(len as usize),
        };
        self.advance(4)?;
        Ok(header)
    }

    pub fn read_unmanaged_array<T: Unmanaged>(&mut self) -> Result<Option<Vec<T>>> {
        let mut values = None;
        self.read_unmanaged_array_into(&mut values)?;
        Ok(values)
    }

    /// Like [`read_unmanaged_array`](Self::read_unmanaged_array) but reuses the allocation of a present vector.
    pub fn read_unmanaged_array_into<T: Unmanaged>(&mut self, values: &mut Option<Vec<T>>) -> Result<()> {
        let start = self.position();
        let len = match self.read_collection_header()? {
            None      => {
                *values = None;
                return Ok(());
            },
            Some(len) => len,
        };
        let overflow = Error::OutOfRange {
            position: self.position(),
            requested: usize::MAX,
            capacity: self.cursor.capacity(),
        };
        let bytes = len.checked_mul(size_of::<T>()).ok_or(overflow).and_then(|size| self.read_raw(size));
        let bytes = self.rewind_on_error(start, bytes)?;
        unmanaged::read_into(bytes, len, values.get_or_insert_with(Vec::new));
        Ok(())
    }

    pub fn read_array<T: 'static>(&mut self) -> Result<Option<Vec<T>>> {
        let mut values = None;
        self.read_array_into(&mut values)?;
        Ok(values)
    }

    /// Reads a collection element by element through the registered parser of `T`, reusing the allocation of a
    /// present vector. A null element fails with [`Error::UnexpectedNull`]; use an `Option` element type for
    /// collections with absent elements. On failure the position is rewound to the collection header and `values`
    /// keeps what it held before.
    pub fn read_array_into<T: 'static>(&mut self, values: &mut Option<Vec<T>>) -> Result<()> {
        let start = self.position();
        let len = match self.read_collection_header()? {
            None      => {
                *values = None;
                return Ok(());
            },
            Some(len) => len,
        };
        let absent = values.is_none();
        let out = values.get_or_insert_with(Vec::new);
        // New elements go behind the old ones, which are only dropped once all elements were read.
        let kept = out.len();
        let read = self.read_elements(len, out);
        match self.rewind_on_error(start, read) {
            Ok(()) => {
                out.drain(..kept);
                Ok(())
            },
            Err(e) => {
                out.truncate(kept);
                if absent {
                    *values = None;
                }
                Err(e)
            },
        }
    }

    fn read_elements<T: 'static>(&mut self, len: usize, out: &mut Vec<T>) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let registry = self.registry;
        let parser = registry.get::<T>()?;
        // Every element occupies at least one byte, which bounds the allocation by the input.
        out.reserve(len.min(self.remaining()));
        for _ in 0..len {
            let mut value = None;
            parser.deserialize(self, &mut value)?;
            out.push(value.ok_or(Error::UnexpectedNull(type_name::<T>()))?);
        }
        Ok(())
    }

    /// Reads a string in the layout selected by the options. `None` means the string is absent.
    pub fn read_string(&mut self) -> Result<Option<String>> {
        Ok(self.read_str()?.map(Cow::into_owned))
    }

    /// Like [`read_string`](Self::read_string), but borrows Utf-8 strings from the input instead of copying them.
    pub fn read_str(&mut self) -> Result<Option<Cow<'a, str>>> {
        match (self.options.recording, self.options.encoding) {
            (StringRecording::Length, StringEncoding::Utf8)  => self.read_length_utf8(),
            (StringRecording::Length, StringEncoding::Utf16) => self.read_length_utf16(),
            (StringRecording::Token, StringEncoding::Utf8)   => self.read_token_utf8(),
            (StringRecording::Token, StringEncoding::Utf16)  => self.read_token_utf16(),
        }
    }

    /// The Utf-16 unit count ahead of the payload is a sizing hint, `<= 0` meaning unknown. The payload is borrowed
    /// rather than transcoded, so a known count is only checked for plausibility: every Utf-16 unit takes at least
    /// one Utf-8 byte.
    fn read_length_utf8(&mut self) -> Result<Option<Cow<'a, str>>> {
        let start = self.position();
        let len = match self.read_collection_header()? {
            None    => return Ok(None),
            Some(0) => return Ok(Some(Cow::Borrowed(""))),
            Some(len) => len,
        };
        let decoded = self.read_unmanaged::<i32>()
            .and_then(|units| match usize::try_from(units) {
                Ok(units) if units > len => Err(Error::InvalidLength(units as i64)),
                _                        => self.read_raw(len),
            })
            .and_then(|bytes| Ok(Cow::Borrowed(from_utf8(bytes)?)));
        self.rewind_on_error(start, decoded).map(Some)
    }

    fn read_length_utf16(&mut self) -> Result<Option<Cow<'a, str>>> {
        let start = self.position();
        let len = match self.read_collection_header()? {
            None    => return Ok(None),
            Some(0) => return Ok(Some(Cow::Borrowed(""))),
            Some(len) => len,
        };
        let decoded = if len % 2 != 0 {
            Err(Error::OddUtf16Length(len))
        } else {
            self.read_raw(len).and_then(string::decode_utf16)
        };
        self.rewind_on_error(start, decoded).map(|s| Some(Cow::Owned(s)))
    }

    fn read_token_utf8(&mut self) -> Result<Option<Cow<'a, str>>> {
        if self.peek_byte()? == NULL_UTF8_TOKEN {
            self.advance(1)?;
            return Ok(None);
        }
        let rest = self.cursor.tail();
        let end = rest.iter().position(|b| *b == 0).ok_or(Error::OutOfRange {
            position: self.position(),
            requested: rest.len() + 1,
            capacity: self.position() + rest.len(),
        })?;
        let value = from_utf8(&rest[..end])?;
        self.advance(end + 1)?;
        Ok(Some(Cow::Borrowed(value)))
    }

    fn read_token_utf16(&mut self) -> Result<Option<Cow<'a, str>>> {
        let head = self.cursor.peek(2)?;
        if u16::from_le_bytes([head[0], head[1]]) == NULL_UTF16_TOKEN {
            self.advance(2)?;
            return Ok(None);
        }
        let rest = self.cursor.tail();
        let units = rest.chunks_exact(2).position(|c| c == [0, 0]).ok_or(Error::OutOfRange {
            position: self.position(),
            requested: rest.len() + 2,
            capacity: self.position() + rest.len(),
        })?;
        let value = string::decode_utf16(&rest[..2 * units])?;
        self.advance(2 * units + 2)?;
        Ok(Some(Cow::Owned(value)))
    }

    /// Resets the position to `start` if `result` failed, so that failed reads never leave the cursor halfway
    /// through a value.
    fn rewind_on_error<T>(&mut self, start: usize, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.cursor.rewind(start);
        }
        result
    }

    pub fn read_object_header(&mut self) -> Result<ObjectHeader> {
        match self.peek_byte()? {
            NULL_OBJECT  => {
                self.advance(1)?;
                Ok(ObjectHeader::Null)
            },
            REFERENCE_ID => {
                let start = self.position();
                self.advance(1)?;
                let id = self.read_var_int::<u32>();
                self.rewind_on_error(start, id).map(ObjectHeader::Reference)
            },
            count if count <= MAX_MEMBER_COUNT => {
                self.advance(1)?;
                Ok(ObjectHeader::Members(count))
            },
            other => Err(Error::invalid("object header", other)),
        }
    }

    /// Reads a union tag. `None` means the union instance is absent.
    pub fn read_union_header(&mut self) -> Result<Option<u16>> {
        let lead = self.peek_byte()?;
        if lead != WIDE_TAG {
            self.advance(1)?;
            return Ok(Some(lead as u16));
        }
        let bytes = self.cursor.peek(3)?;
        let tag = u16::from_le_bytes([bytes[1], bytes[2]]);
        self.advance(3)?;
        Ok(if tag == NULL_UNION_TAG { None } else { Some(tag) })
    }

    /// Reads a value through the registered parser of `T`. `None` means the value is absent.
    pub fn read_value<T: 'static>(&mut self) -> Result<Option<T>> {
        let mut value = None;
        self.read_value_into(&mut value)?;
        Ok(value)
    }

    /// Reads a value through the registered parser of `T`, which may reuse what `value` already holds.
    pub fn read_value_into<T: 'static>(&mut self, value: &mut Option<T>) -> Result<()> {
        let registry = self.registry;
        registry.get::<T>()?.deserialize(self, value)
    }

    /// Reserves the id of a shared instance which is about to be read. Ids have to be reserved before the instance
    /// body is read so they line up with the order in which the writer assigned them.
    pub fn reserve_reference(&mut self) -> u32 {
        self.references.reserve()
    }

    pub fn set_reference(&mut self, id: u32, instance: Rc<dyn Any>) {
        self.references.fill(id, instance);
    }

    /// Looks up an already read shared instance.
    pub fn reference(&self, id: u32) -> Result<Rc<dyn Any>> {
        self.references.get(id)
    }

}

/// A consumed span of the input from which unmanaged values are taken front to back.
pub struct BlockReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl BlockReader<'_> {

    /// Takes the next value. Panics if the block is too small, the read has to account for every value taken.
    #[inline]
    pub fn take<T: Unmanaged>(&mut self) -> T {
        let value = unmanaged::read(&self.bytes[self.position..self.position + size_of::<T>()]);
        self.position += size_of::<T>();
        value
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader<'a>(bytes: &'a [u8], registry: &'a ParserRegistry) -> Reader<'a> {
        Reader::new(bytes, registry, SerializerOptions::default())
    }

    #[test]
    fn var_ints_narrow_checked() {
        let registry = ParserRegistry::new();
        let bytes = [0x85, 200, 0, 0x85, 200, 0];
        let mut r = reader(&bytes, &registry);
        assert_eq!(Ok(200u8), r.read_var_int());
        let err = r.read_var_int::<i8>();
        assert_eq!(Err(Error::NumericOverflow { value: 200, target: "i8" }), err);
        assert_eq!(3, r.position());
        assert_eq!(Ok(200i64), r.read_var_int());
    }

    #[test]
    fn collection_headers() {
        let registry = ParserRegistry::new();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-1i32).to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&(-2i32).to_le_bytes());
        let mut r = reader(&bytes, &registry);
        assert_eq!(Ok(None), r.read_collection_header());
        assert_eq!(Ok(Some(0)), r.read_collection_header());
        assert_eq!(Err(Error::InvalidLength(-2)), r.read_collection_header());
        assert_eq!(8, r.position());
    }

    #[test]
    fn lengths_are_checked_before_allocating() {
        let registry = ParserRegistry::new();
        let bytes = i32::MAX.to_le_bytes();
        let mut r = reader(&bytes, &registry);
        assert!(matches!(r.read_unmanaged_array::<u64>(), Err(Error::OutOfRange { .. })));
        assert_eq!(0, r.position());
    }

    #[test]
    fn arrays_reuse_allocations() {
        let registry = ParserRegistry::new();
        let mut bytes = 2i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[1, 0, 2, 0]);
        let mut values = Some(Vec::<u16>::with_capacity(64));
        reader(&bytes, &registry).read_unmanaged_array_into(&mut values).unwrap();
        let values = values.unwrap();
        assert_eq!(vec![1, 2], values);
        assert!(values.capacity() >= 64);
    }

    #[test]
    fn failed_arrays_leave_reader_and_target_as_they_were() {
        let registry = ParserRegistry::with_builtins();
        let mut bytes = 2i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[1, 0, 0, 0, 1, 0, 0, 0, b'a']);
        bytes.extend_from_slice(&[5, 0, 0, 0, 5, 0, 0, 0, b'x']);
        let mut values = Some(vec!["keep".to_owned()]);
        let mut r = reader(&bytes, &registry);
        assert!(matches!(r.read_array_into(&mut values), Err(Error::OutOfRange { .. })));
        assert_eq!(0, r.position());
        assert_eq!(Some(vec!["keep".to_owned()]), values);
        let mut absent: Option<Vec<String>> = None;
        assert!(r.read_array_into(&mut absent).is_err());
        assert_eq!(None, absent);

        let mut bytes = 2i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[1, 0, 0, 0, 1, 0, 0, 0, b'a', 0, 0, 0, 0]);
        reader(&bytes, &registry).read_array_into(&mut values).unwrap();
        assert_eq!(Some(vec!["a".to_owned(), String::new()]), values);
    }

    #[test]
    fn strings_in_every_layout() {
        let registry = ParserRegistry::new();
        let cases: [(StringEncoding, StringRecording, &[u8]); 4] = [
            (StringEncoding::Utf8, StringRecording::Length, &[2, 0, 0, 0, 2, 0, 0, 0, b'h', b'i']),
            (StringEncoding::Utf16, StringRecording::Length, &[4, 0, 0, 0, b'h', 0, b'i', 0]),
            (StringEncoding::Utf8, StringRecording::Token, &[b'h', b'i', 0]),
            (StringEncoding::Utf16, StringRecording::Token, &[b'h', 0, b'i', 0, 0, 0]),
        ];
        for (encoding, recording, bytes) in cases {
            let mut r = Reader::new(bytes, &registry, SerializerOptions::new(encoding, recording));
            assert_eq!(Ok(Some("hi".to_owned())), r.read_string());
            assert_eq!(0, r.remaining());
        }
    }

    #[test]
    fn utf8_strings_are_borrowed() {
        let registry = ParserRegistry::new();
        let token = SerializerOptions::default().with_recording(StringRecording::Token);
        let mut r = Reader::new(b"hi\0", &registry, token);
        assert!(matches!(r.read_str(), Ok(Some(Cow::Borrowed("hi")))));
        let utf16 = token.with_encoding(StringEncoding::Utf16);
        let mut r = Reader::new(&[b'h', 0, 0, 0], &registry, utf16);
        assert!(matches!(r.read_str(), Ok(Some(Cow::Owned(_)))));
    }

    #[test]
    fn null_and_empty_strings() {
        let registry = ParserRegistry::new();
        let token = SerializerOptions::default().with_recording(StringRecording::Token);
        let mut r = Reader::new(&[0xff, 0x00], &registry, token);
        assert_eq!(Ok(None), r.read_string());
        assert_eq!(Ok(Some(String::new())), r.read_string());
        let utf16 = token.with_encoding(StringEncoding::Utf16);
        let mut r = Reader::new(&[0xff, 0xdf, 0x00, 0x00], &registry, utf16);
        assert_eq!(Ok(None), r.read_string());
        assert_eq!(Ok(Some(String::new())), r.read_string());
    }

    #[test]
    fn utf16_counts_are_hints() {
        let registry = ParserRegistry::new();
        for units in [2i32, 0, -1, -7] {
            let mut bytes = 3i32.to_le_bytes().to_vec();
            bytes.extend_from_slice(&units.to_le_bytes());
            bytes.extend_from_slice("hé".as_bytes());
            assert_eq!(Ok(Some("hé".to_owned())), reader(&bytes, &registry).read_string(), "{}", units);
        }
        let mut bytes = 3i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&4i32.to_le_bytes());
        bytes.extend_from_slice("hé".as_bytes());
        let mut r = reader(&bytes, &registry);
        assert_eq!(Err(Error::InvalidLength(4)), r.read_string());
        assert_eq!(0, r.position());
    }

    #[test]
    fn utf16_token_scan_is_unit_aligned() {
        // 'a' followed by U+0100 has a zero byte pair straddling the two units
        let registry = ParserRegistry::new();
        let options = SerializerOptions::new(StringEncoding::Utf16, StringRecording::Token);
        let mut r = Reader::new(&[0x61, 0x00, 0x00, 0x01, 0x00, 0x00], &registry, options);
        assert_eq!(Ok(Some("a\u{100}".to_owned())), r.read_string());
    }

    #[test]
    fn malformed_strings() {
        let registry = ParserRegistry::new();
        let mut r = reader(&[3, 0, 0, 0, 0, 0, 0, 0, 0xc3, 0x28, 0x00], &registry);
        assert!(matches!(r.read_string(), Err(Error::Utf8(_))));
        assert_eq!(0, r.position());
        let options = SerializerOptions::default().with_encoding(StringEncoding::Utf16);
        let mut r = Reader::new(&[3, 0, 0, 0, 0, 0, 0], &registry, options);
        assert_eq!(Err(Error::OddUtf16Length(3)), r.read_string());
        let token = SerializerOptions::default().with_recording(StringRecording::Token);
        let mut r = Reader::new(b"unterminated", &registry, token);
        assert!(matches!(r.read_string(), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn object_and_union_headers() {
        let registry = ParserRegistry::new();
        let bytes = [3, 255, 250, 7, 251, 254, 255, 0x2c, 0x01, 255, 255, 255];
        let mut r = reader(&bytes, &registry);
        assert_eq!(Ok(ObjectHeader::Members(3)), r.read_object_header());
        assert_eq!(Ok(ObjectHeader::Null), r.read_object_header());
        assert_eq!(Ok(ObjectHeader::Reference(7)), r.read_object_header());
        assert_eq!(Err(Error::invalid("object header", 251u8)), r.read_object_header());
        r.advance(1).unwrap();
        assert_eq!(Ok(Some(254)), r.read_union_header());
        assert_eq!(Ok(Some(300)), r.read_union_header());
        assert_eq!(Ok(None), r.read_union_header());
        assert_eq!(Ok(()), r.ensure_consumed());
    }

    #[test]
    fn truncated_input() {
        let registry = ParserRegistry::new();
        let mut r = reader(&[1, 2, 3], &registry);
        assert_eq!(Err(Error::OutOfRange { position: 0, requested: 4, capacity: 3 }), r.read_unmanaged::<i32>());
        assert_eq!(Ok(0x0201u16), r.read_unmanaged());
        assert_eq!(Ok(3), r.peek_byte());
        assert!(r.peek_at(1).is_err());
        assert_eq!(Ok(1), r.byte_at(0));
        assert_eq!(Ok(3), r.byte_at(2));
        assert!(r.byte_at(3).is_err());
        assert_eq!(2, r.position());
        assert_eq!(Err(Error::TrailingBytes(1)), r.ensure_consumed());
    }

    #[test]
    fn blocks() {
        let registry = ParserRegistry::new();
        let bytes = [1, 0, 0xff, 0xff, 0xff, 0xff];
        let mut block = reader(&bytes, &registry).read_block(6).unwrap();
        assert_eq!(1u16, block.take());
        assert_eq!(-1i32, block.take());
    }

}
