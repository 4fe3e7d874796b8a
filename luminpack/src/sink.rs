//! The writing operations shared by [`Writer`] and [`Evaluator`].

use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::unmanaged::Unmanaged;
use crate::wire::MemberCount;
use crate::writer::Writer;

/// Either emits bytes ([`Writer`]) or only counts them ([`Evaluator`]). Code generic over a `Sink` implements
/// `serialize` and `calculate_size` in one go and cannot get them out of step.
///
/// ```
/// use luminpack::{Evaluator, ParserRegistry, SegmentedBuffer, BufferPool, Sink, Writer};
///
/// fn emit<S: Sink>(sink: &mut S, names: &[&str]) -> luminpack::Result<()> {
///     sink.write_collection_header(names.len())?;
///     names.iter().try_for_each(|name| sink.write_string(Some(*name)))
/// }
///
/// let registry = ParserRegistry::new();
/// let mut size = 0;
/// emit(&mut Evaluator::new(&mut size, &registry, Default::default()), &["a", "b"]).unwrap();
/// let mut buffer = SegmentedBuffer::new(BufferPool::shared());
/// let mut writer = Writer::new(&mut buffer, &registry, Default::default());
/// emit(&mut writer, &["a", "b"]).unwrap();
/// assert_eq!(size, writer.finish());
/// ```
pub trait Sink {
    fn write_unmanaged<T: Unmanaged>(&mut self, value: &T) -> Result<()>;
    fn write_unmanaged_array<T: Unmanaged>(&mut self, values: Option<&[T]>) -> Result<()>;
    fn write_string(&mut self, value: Option<&str>) -> Result<()>;
    fn write_collection_header(&mut self, len: usize) -> Result<()>;
    fn write_null_collection_header(&mut self) -> Result<()>;
    fn write_object_header(&mut self, members: MemberCount) -> Result<()>;
    fn write_null_object_header(&mut self) -> Result<()>;
    fn write_union_header(&mut self, tag: u16) -> Result<()>;
    fn write_null_union_header(&mut self) -> Result<()>;
}

impl Sink for Writer<'_> {

    fn write_unmanaged<T: Unmanaged>(&mut self, value: &T) -> Result<()> {
        Writer::write_unmanaged(self, value)
    }

    fn write_unmanaged_array<T: Unmanaged>(&mut self, values: Option<&[T]>) -> Result<()> {
        Writer::write_unmanaged_array(self, values)
    }

    fn write_string(&mut self, value: Option<&str>) -> Result<()> {
        Writer::write_string(self, value)
    }

    fn write_collection_header(&mut self, len: usize) -> Result<()> {
        Writer::write_collection_header(self, len)
    }

    fn write_null_collection_header(&mut self) -> Result<()> {
        Writer::write_null_collection_header(self)
    }

    fn write_object_header(&mut self, members: MemberCount) -> Result<()> {
        Writer::write_object_header(self, members)
    }

    fn write_null_object_header(&mut self) -> Result<()> {
        Writer::write_null_object_header(self)
    }

    fn write_union_header(&mut self, tag: u16) -> Result<()> {
        Writer::write_union_header(self, tag)
    }

    fn write_null_union_header(&mut self) -> Result<()> {
        Writer::write_null_union_header(self)
    }

}

impl Sink for Evaluator<'_> {

    fn write_unmanaged<T: Unmanaged>(&mut self, _value: &T) -> Result<()> {
        self.unmanaged::<T>();
        Ok(())
    }

    fn write_unmanaged_array<T: Unmanaged>(&mut self, values: Option<&[T]>) -> Result<()> {
        self.unmanaged_array(values)
    }

    fn write_string(&mut self, value: Option<&str>) -> Result<()> {
        self.string(value)
    }

    fn write_collection_header(&mut self, len: usize) -> Result<()> {
        self.collection_header(len)
    }

    fn write_null_collection_header(&mut self) -> Result<()> {
        self.null_collection_header();
        Ok(())
    }

    fn write_object_header(&mut self, members: MemberCount) -> Result<()> {
        self.object_header(members);
        Ok(())
    }

    fn write_null_object_header(&mut self) -> Result<()> {
        self.null_object_header();
        Ok(())
    }

    fn write_union_header(&mut self, tag: u16) -> Result<()> {
        self.union_header(tag)
    }

    fn write_null_union_header(&mut self) -> Result<()> {
        self.null_union_header();
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BufferPool, SegmentedBuffer};
    use crate::options::{SerializerOptions, StringEncoding, StringRecording};
    use crate::registry::ParserRegistry;

    fn everything<S: Sink>(sink: &mut S) -> Result<()> {
        sink.write_unmanaged(&1.5f32)?;
        sink.write_unmanaged_array(Some(&[1u16, 2, 3][..]))?;
        sink.write_unmanaged_array::<u64>(None)?;
        sink.write_string(Some("grüße"))?;
        sink.write_string(None)?;
        sink.write_collection_header(2)?;
        sink.write_null_collection_header()?;
        sink.write_object_header(MemberCount::new(4))?;
        sink.write_null_object_header()?;
        sink.write_union_header(7)?;
        sink.write_union_header(700)?;
        sink.write_null_union_header()
    }

    #[test]
    fn writer_and_evaluator_agree() {
        let pool = BufferPool::new(4);
        let registry = ParserRegistry::new();
        for encoding in [StringEncoding::Utf8, StringEncoding::Utf16] {
            for recording in [StringRecording::Length, StringRecording::Token] {
                let options = SerializerOptions::new(encoding, recording);
                let mut size = 0;
                everything(&mut Evaluator::new(&mut size, &registry, options)).unwrap();
                let mut buffer = SegmentedBuffer::new(&pool);
                let mut writer = Writer::new(&mut buffer, &registry, options);
                everything(&mut writer).unwrap();
                assert_eq!(size, writer.finish(), "{:?}", options);
            }
        }
    }

}
