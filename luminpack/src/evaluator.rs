//! The [`Evaluator`] computes the exact number of bytes the [`Writer`](crate::Writer) would emit, without writing.

use crate::error::{Error, Result};
use crate::options::SerializerOptions;
use crate::reference::ReferenceTracker;
use crate::registry::ParserRegistry;
use crate::string::{self, length_field};
use crate::unmanaged::Unmanaged;
use crate::varint::{self, VarInt};
use crate::wire::{self, MemberCount, COLLECTION_HEADER_SIZE, NULL_UNION_TAG};
use std::mem::size_of;

/// Accumulates encoded sizes into a caller-owned counter. Mirrors the writing operations of
/// [`Writer`](crate::Writer) one to one and fails where the writer would, so that a parser can implement
/// `calculate_size` by following the same steps as `serialize`.
pub struct Evaluator<'a> {
    size: &'a mut usize,
    registry: &'a ParserRegistry,
    options: SerializerOptions,
    references: ReferenceTracker,
}

impl<'a> Evaluator<'a> {

    pub fn new(size: &'a mut usize, registry: &'a ParserRegistry, options: SerializerOptions) -> Self {
        Self { size, registry, options, references: ReferenceTracker::default() }
    }

    pub fn options(&self) -> SerializerOptions {
        self.options
    }

    pub fn registry(&self) -> &'a ParserRegistry {
        self.registry
    }

    /// Returns the size accumulated so far.
    pub fn size(&self) -> usize {
        *self.size
    }

    #[inline]
    pub fn add(&mut self, len: usize) {
        *self.size += len;
    }

    #[inline]
    pub fn unmanaged<T: Unmanaged>(&mut self) {
        self.add(size_of::<T>());
    }

    pub fn var_int<T: VarInt>(&mut self, value: T) {
        self.add(varint::size_of(value));
    }

    pub fn collection_header(&mut self, len: usize) -> Result<()> {
        length_field(len)?;
        self.add(COLLECTION_HEADER_SIZE);
        Ok(())
    }

    pub fn null_collection_header(&mut self) {
        self.add(COLLECTION_HEADER_SIZE);
    }

    pub fn unmanaged_array<T: Unmanaged>(&mut self, values: Option<&[T]>) -> Result<()> {
        match values {
            None         => self.null_collection_header(),
            Some(values) => {
                length_field(values.len())?;
                self.add(wire::unmanaged_collection_size(values.len(), size_of::<T>()));
            },
        }
        Ok(())
    }

    pub fn array<T: 'static>(&mut self, values: Option<&[T]>) -> Result<()> {
        match values {
            None         => self.null_collection_header(),
            Some([])     => self.add(COLLECTION_HEADER_SIZE),
            Some(values) => {
                self.collection_header(values.len())?;
                let registry = self.registry;
                let parser = registry.get::<T>()?;
                for value in values {
                    parser.calculate_size(self, value)?;
                }
            },
        }
        Ok(())
    }

    pub fn string(&mut self, value: Option<&str>) -> Result<()> {
        let len = string::encoded_size(value, self.options)?;
        self.add(len);
        Ok(())
    }

    pub fn object_header(&mut self, _members: MemberCount) {
        self.add(1);
    }

    pub fn null_object_header(&mut self) {
        self.add(1);
    }

    pub fn object_reference_id(&mut self, id: u32) {
        self.add(1 + varint::size_of(id));
    }

    pub fn union_header(&mut self, tag: u16) -> Result<()> {
        if tag == NULL_UNION_TAG {
            return Err(Error::invalid("union tag", tag));
        }
        self.add(wire::union_header_size(tag));
        Ok(())
    }

    pub fn null_union_header(&mut self) {
        self.add(wire::union_header_size(NULL_UNION_TAG));
    }

    pub fn value<T: 'static>(&mut self, value: &T) -> Result<()> {
        let registry = self.registry;
        registry.get::<T>()?.calculate_size(self, value)
    }

    /// See [`Writer::reference_id`](crate::Writer::reference_id).
    pub fn reference_id(&mut self, address: usize) -> Option<u32> {
        self.references.track(address)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{StringEncoding, StringRecording};

    fn evaluated(options: SerializerOptions, f: impl FnOnce(&mut Evaluator<'_>) -> Result<()>) -> Result<usize> {
        let registry = ParserRegistry::with_builtins();
        let mut size = 0;
        let mut evaluator = Evaluator::new(&mut size, &registry, options);
        f(&mut evaluator)?;
        Ok(size)
    }

    #[test]
    fn headers() {
        let size = evaluated(SerializerOptions::default(), |e| {
            e.object_header(MemberCount::new(3));
            e.null_object_header();
            e.object_reference_id(200);
            e.union_header(254)?;
            e.union_header(300)?;
            e.null_union_header();
            e.null_collection_header();
            e.collection_header(0)
        });
        assert_eq!(Ok(21), size);
    }

    #[test]
    fn arrays() {
        let size = evaluated(SerializerOptions::default(), |e| {
            e.unmanaged_array(Some(&[1u64, 2, 3][..]))?;
            e.unmanaged_array::<u64>(None)?;
            e.array(Some(&[String::from("a"), String::new()][..]))
        });
        assert_eq!(Ok(28 + 4 + 4 + 9 + 4), size);
    }

    #[test]
    fn unregistered_element_types_only_fail_when_present() {
        struct Unknown;
        assert_eq!(Ok(4), evaluated(SerializerOptions::default(), |e| e.array::<Unknown>(Some(&[][..]))));
        let result = evaluated(SerializerOptions::default(), |e| e.array(Some(&[Unknown][..])));
        assert!(matches!(result, Err(Error::NoParserRegistered(_))));
    }

    #[test]
    fn strings_follow_options() {
        let options = SerializerOptions::new(StringEncoding::Utf16, StringRecording::Token);
        assert_eq!(Ok(6), evaluated(options, |e| e.string(Some("hi"))));
        assert_eq!(Err(Error::EmbeddedNul), evaluated(options, |e| e.string(Some("\0"))));
    }

}
