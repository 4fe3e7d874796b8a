//! The [`Writer`] emits the wire format into segments rented from a [`BufferProvider`].

use crate::buffer::BufferProvider;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::options::{SerializerOptions, StringEncoding, StringRecording};
use crate::reference::ReferenceTracker;
use crate::registry::ParserRegistry;
use crate::string::{self, length_field};
use crate::unmanaged::{self, Unmanaged};
use crate::varint::{self, VarInt};
use crate::wire::{MemberCount, NULL_COLLECTION, NULL_OBJECT, NULL_UNION_TAG, NULL_UTF16_TOKEN, NULL_UTF8_TOKEN,
    REFERENCE_ID, WIDE_TAG};
use std::mem;
use tracing::trace;

/// Writes values into the segments of a [`BufferProvider`]. Every write first ensures the current segment has room
/// for all of its bytes, so a single value never straddles two segments.
///
/// The current segment is committed back to the provider on [`flush`](Writer::flush), on
/// [`finish`](Writer::finish) and when the writer is dropped.
pub struct Writer<'a> {
    segment: Cursor<Vec<u8>>,
    provider: &'a mut dyn BufferProvider,
    registry: &'a ParserRegistry,
    options: SerializerOptions,
    references: ReferenceTracker,
    /// Bytes in already committed segments
    committed: usize,
}

impl<'a> Writer<'a> {

    pub fn new(provider: &'a mut dyn BufferProvider, registry: &'a ParserRegistry, options: SerializerOptions) -> Self {
        Self {
            segment: Cursor::default(),
            provider,
            registry,
            options,
            references: ReferenceTracker::default(),
            committed: 0,
        }
    }

    pub fn options(&self) -> SerializerOptions {
        self.options
    }

    pub fn registry(&self) -> &'a ParserRegistry {
        self.registry
    }

    /// Returns the number of bytes written so far.
    pub fn written(&self) -> usize {
        self.committed + self.segment.position()
    }

    /// Hands the current segment back to the provider. Subsequent writes rent a fresh one.
    pub fn flush(&mut self) {
        let (segment, written) = mem::take(&mut self.segment).into_inner();
        if !segment.is_empty() {
            self.committed += written;
            self.provider.commit(segment, written);
        }
    }

    /// Flushes and returns the total number of written bytes.
    pub fn finish(mut self) -> usize {
        self.flush();
        self.committed
    }

    fn ensure(&mut self, len: usize) -> Result<()> {
        if self.segment.remaining() < len {
            self.flush();
            let segment = self.provider.rent(len)?;
            trace!(requested = len, size = segment.len(), "writer switched segment");
            self.segment = Cursor::new(segment);
        }
        Ok(())
    }

    /// Returns the next `len` bytes of the output for writing.
    fn slot(&mut self, len: usize) -> Result<&mut [u8]> {
        self.ensure(len)?;
        self.segment.take_mut(len)
    }

    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.slot(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Copies the memory of `value` verbatim.
    #[inline]
    pub fn write_unmanaged<T: Unmanaged>(&mut self, value: &T) -> Result<()> {
        self.write_raw(unmanaged::bytes_of(value))
    }

    /// Reserves `len` contiguous bytes for several unmanaged values at once, see
    /// [`write_unmanaged!`](crate::write_unmanaged).
    pub fn reserve_block(&mut self, len: usize) -> Result<BlockWriter<'_>> {
        Ok(BlockWriter { bytes: self.slot(len)?, position: 0 })
    }

    pub fn write_var_int<T: VarInt>(&mut self, value: T) -> Result<()> {
        let (buf, len) = varint::encode(value);
        self.write_raw(&buf[..len])
    }

    /// Writes the header of a collection with `len` elements.
    pub fn write_collection_header(&mut self, len: usize) -> Result<()> {
        let len = length_field(len)?;
        self.write_unmanaged(&len)
    }

    pub fn write_null_collection_header(&mut self) -> Result<()> {
        self.write_unmanaged(&NULL_COLLECTION)
    }

    /// Writes a collection of unmanaged values as one block.
    pub fn write_unmanaged_array<T: Unmanaged>(&mut self, values: Option<&[T]>) -> Result<()> {
        match values {
            None         => self.write_null_collection_header(),
            Some(values) => {
                let bytes = unmanaged::slice_bytes(values);
                let len = length_field(values.len())?;
                let slot = self.slot(4 + bytes.len())?;
                slot[..4].copy_from_slice(&len.to_le_bytes());
                slot[4..].copy_from_slice(bytes);
                Ok(())
            },
        }
    }

    /// Writes a collection element by element through the registered parser of `T`. The parser is only looked up
    /// for non-empty collections.
    pub fn write_array<T: 'static>(&mut self, values: Option<&[T]>) -> Result<()> {
        match values {
            None         => self.write_null_collection_header(),
            Some([])     => self.write_collection_header(0),
            Some(values) => {
                self.write_collection_header(values.len())?;
                let registry = self.registry;
                let parser = registry.get::<T>()?;
                for value in values {
                    parser.serialize(self, value)?;
                }
                Ok(())
            },
        }
    }

    /// Writes a string in the layout selected by the options.
    pub fn write_string(&mut self, value: Option<&str>) -> Result<()> {
        match (self.options.recording, self.options.encoding) {
            (StringRecording::Length, StringEncoding::Utf8)  => self.write_length_utf8(value),
            (StringRecording::Length, StringEncoding::Utf16) => self.write_length_utf16(value),
            (StringRecording::Token, StringEncoding::Utf8)   => self.write_token_utf8(value),
            (StringRecording::Token, StringEncoding::Utf16)  => self.write_token_utf16(value),
        }
    }

    fn write_length_utf8(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            None     => self.write_null_collection_header(),
            Some("") => self.write_collection_header(0),
            Some(s)  => {
                let byte_len = length_field(s.len())?;
                let utf16_len = length_field(string::utf16_units(s))?;
                let slot = self.slot(8 + s.len())?;
                slot[..4].copy_from_slice(&byte_len.to_le_bytes());
                slot[4..8].copy_from_slice(&utf16_len.to_le_bytes());
                slot[8..].copy_from_slice(s.as_bytes());
                Ok(())
            },
        }
    }

    fn write_length_utf16(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            None     => self.write_null_collection_header(),
            Some("") => self.write_collection_header(0),
            Some(s)  => {
                let len = string::utf16_bytes(s)?;
                let header = length_field(len)?;
                let slot = self.slot(4 + len)?;
                slot[..4].copy_from_slice(&header.to_le_bytes());
                string::put_utf16(s, &mut slot[4..]);
                Ok(())
            },
        }
    }

    fn write_token_utf8(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            None    => self.write_raw(&[NULL_UTF8_TOKEN]),
            Some(s) => {
                string::reject_nul(s)?;
                let slot = self.slot(s.len() + 1)?;
                slot[..s.len()].copy_from_slice(s.as_bytes());
                slot[s.len()] = 0;
                Ok(())
            },
        }
    }

    fn write_token_utf16(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            None    => self.write_raw(&NULL_UTF16_TOKEN.to_le_bytes()),
            Some(s) => {
                string::reject_nul(s)?;
                let len = string::utf16_bytes(s)?;
                let slot = self.slot(len + 2)?;
                string::put_utf16(s, &mut slot[..len]);
                slot[len..].copy_from_slice(&[0, 0]);
                Ok(())
            },
        }
    }

    pub fn write_object_header(&mut self, members: MemberCount) -> Result<()> {
        self.write_raw(&[members.get()])
    }

    pub fn write_null_object_header(&mut self) -> Result<()> {
        self.write_raw(&[NULL_OBJECT])
    }

    /// Writes a back-reference to an instance which was already written during this call.
    pub fn write_object_reference_id(&mut self, id: u32) -> Result<()> {
        let (buf, len) = varint::encode(id);
        let slot = self.slot(1 + len)?;
        slot[0] = REFERENCE_ID;
        slot[1..].copy_from_slice(&buf[..len]);
        Ok(())
    }

    /// Writes a union tag. [`NULL_UNION_TAG`] is reserved for absent instances.
    pub fn write_union_header(&mut self, tag: u16) -> Result<()> {
        if tag == NULL_UNION_TAG {
            Err(Error::invalid("union tag", tag))
        } else if tag < WIDE_TAG as u16 {
            self.write_raw(&[tag as u8])
        } else {
            let [lo, hi] = tag.to_le_bytes();
            self.write_raw(&[WIDE_TAG, lo, hi])
        }
    }

    pub fn write_null_union_header(&mut self) -> Result<()> {
        let [lo, hi] = NULL_UNION_TAG.to_le_bytes();
        self.write_raw(&[WIDE_TAG, lo, hi])
    }

    /// Writes `value` through the registered parser of `T`.
    pub fn write_value<T: 'static>(&mut self, value: &T) -> Result<()> {
        let registry = self.registry;
        registry.get::<T>()?.serialize(self, value)
    }

    /// Returns the id of the instance at `address` if it was already written during this call. Otherwise the
    /// instance gets the next id, returns `None` and has to be written in full.
    pub fn reference_id(&mut self, address: usize) -> Option<u32> {
        self.references.track(address)
    }

}

impl Drop for Writer<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}

/// A reserved span of the output which gets filled with unmanaged values front to back.
pub struct BlockWriter<'w> {
    bytes: &'w mut [u8],
    position: usize,
}

impl BlockWriter<'_> {

    /// Copies `value` to the next free position. Panics if the block is too small, the reservation has to account
    /// for every value put.
    #[inline]
    pub fn put<T: Unmanaged>(&mut self, value: &T) {
        let bytes = unmanaged::bytes_of(value);
        self.bytes[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BufferPool, SegmentedBuffer};

    fn written(options: SerializerOptions, f: impl FnOnce(&mut Writer<'_>) -> Result<()>) -> Result<Vec<u8>> {
        let pool = BufferPool::new(4);
        let registry = ParserRegistry::with_builtins();
        let mut buffer = SegmentedBuffer::new(&pool);
        let mut writer = Writer::new(&mut buffer, &registry, options);
        f(&mut writer)?;
        let len = writer.finish();
        assert_eq!(len, buffer.len());
        Ok(buffer.to_vec())
    }

    #[test]
    fn headers() {
        let bytes = written(SerializerOptions::default(), |w| {
            w.write_object_header(MemberCount::new(3))?;
            w.write_null_object_header()?;
            w.write_object_reference_id(200)?;
            w.write_union_header(254)?;
            w.write_union_header(300)?;
            w.write_null_union_header()?;
            w.write_null_collection_header()?;
            w.write_collection_header(0)
        }).unwrap();
        assert_eq!(vec![3, 255, 250, 0x85, 200, 0, 254, 255, 0x2c, 0x01, 255, 255, 255, 255, 255, 255, 255, 0, 0, 0, 0],
            bytes);
    }

    #[test]
    fn null_union_tag_is_reserved() {
        let result = written(SerializerOptions::default(), |w| w.write_union_header(u16::MAX));
        assert!(matches!(result, Err(Error::InvalidValue { what: "union tag", .. })));
    }

    #[test]
    fn values_never_straddle_segments() {
        let payload = vec![7u8; 1000];
        let bytes = written(SerializerOptions::default(), |w| {
            for _ in 0..3 {
                w.write_unmanaged_array(Some(&payload[..]))?;
            }
            Ok(())
        }).unwrap();
        assert_eq!(3 * 1004, bytes.len());
        assert_eq!(&1000i32.to_le_bytes(), &bytes[2008..2012]);
    }

    #[test]
    fn limit_is_enforced() {
        let pool = BufferPool::new(4);
        let registry = ParserRegistry::with_builtins();
        let mut buffer = SegmentedBuffer::with_limit(&pool, 6);
        let mut writer = Writer::new(&mut buffer, &registry, SerializerOptions::default());
        writer.write_unmanaged(&1u32).unwrap();
        assert!(matches!(writer.write_unmanaged(&1u32), Err(Error::OutOfRange { .. })));
        drop(writer);
        drop(buffer);
        assert_eq!(1, pool.idle());
    }

    #[test]
    fn failed_writes_return_segments_to_the_pool() {
        let pool = BufferPool::new(4);
        let registry = ParserRegistry::with_builtins();
        let options = SerializerOptions::default().with_recording(StringRecording::Token);
        {
            let mut buffer = SegmentedBuffer::new(&pool);
            let mut writer = Writer::new(&mut buffer, &registry, options);
            writer.write_string(Some("ok")).unwrap();
            assert_eq!(Err(Error::EmbeddedNul), writer.write_string(Some("a\0")));
        }
        assert_eq!(1, pool.idle());
        let reused = pool.rent(SegmentedBuffer::INITIAL_SEGMENT_SIZE);
        assert!(reused.iter().all(|b| *b == 0));
    }

    #[test]
    fn blocks() {
        let bytes = written(SerializerOptions::default(), |w| {
            let mut block = w.reserve_block(6)?;
            block.put(&1u16);
            block.put(&-1i32);
            Ok(())
        }).unwrap();
        assert_eq!(vec![1, 0, 0xff, 0xff, 0xff, 0xff], bytes);
    }

    #[test]
    fn strings_in_every_layout() {
        let cases = [
            (StringEncoding::Utf8, StringRecording::Length, vec![2, 0, 0, 0, 2, 0, 0, 0, b'h', b'i']),
            (StringEncoding::Utf16, StringRecording::Length, vec![4, 0, 0, 0, b'h', 0, b'i', 0]),
            (StringEncoding::Utf8, StringRecording::Token, vec![b'h', b'i', 0]),
            (StringEncoding::Utf16, StringRecording::Token, vec![b'h', 0, b'i', 0, 0, 0]),
        ];
        for (encoding, recording, expected) in cases {
            let options = SerializerOptions::new(encoding, recording);
            assert_eq!(expected, written(options, |w| w.write_string(Some("hi"))).unwrap());
        }
    }

    #[test]
    fn token_recording_rejects_nul() {
        let options = SerializerOptions::default().with_recording(StringRecording::Token);
        assert_eq!(Err(Error::EmbeddedNul), written(options, |w| w.write_string(Some("a\0"))));
    }

}
