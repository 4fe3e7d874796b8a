use serde::{ser, Serialize};
use luminpack::{BufferPool, Evaluator, MemberCount, ParserRegistry, SegmentedBuffer, SerializerOptions, Sink, Writer};

use crate::error::{Error, Result};

/// Serializes into any [`Sink`]: a [`Writer`] emits the bytes, an [`Evaluator`] only counts them.
pub struct Serializer<'s, S> {
    output: &'s mut S,
}

impl<'s, S: Sink> Serializer<'s, S> {

    pub fn new(output: &'s mut S) -> Self {
        Self { output }
    }

    fn members(&mut self, len: usize) -> Result<()> {
        let members = MemberCount::checked(len).ok_or(Error::TooManyFields(len))?;
        Ok(self.output.write_object_header(members)?)
    }

    fn variant(&mut self, index: u32) -> Result<()> {
        let tag = u16::try_from(index).map_err(|_| Error::VariantIndex(index))?;
        Ok(self.output.write_union_header(tag)?)
    }

}

/// Encodes `value` into a fresh byte vector.
pub fn to_bytes<T: Serialize + ?Sized>(value: &T, options: &SerializerOptions) -> Result<Vec<u8>> {
    let registry = ParserRegistry::new();
    let mut buffer = SegmentedBuffer::new(BufferPool::shared());
    let mut writer = Writer::new(&mut buffer, &registry, *options);
    to_writer(&mut writer, value)?;
    writer.finish();
    Ok(buffer.to_vec())
}

/// Encodes `value` with an existing writer, for instance from within a hand-written parser.
pub fn to_writer<T: Serialize + ?Sized>(writer: &mut Writer<'_>, value: &T) -> Result<()> {
    value.serialize(&mut Serializer::new(writer))
}

/// Returns the exact number of bytes [`to_bytes`] produces for `value`.
pub fn size_of<T: Serialize + ?Sized>(value: &T, options: &SerializerOptions) -> Result<usize> {
    let registry = ParserRegistry::new();
    let mut size = 0;
    let mut evaluator = Evaluator::new(&mut size, &registry, *options);
    value.serialize(&mut Serializer::new(&mut evaluator))?;
    Ok(size)
}

impl<'a, 's, S: Sink> ser::Serializer for &'a mut Serializer<'s, S> {

    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, v: bool) -> Result<()> {
        Ok(self.output.write_unmanaged(&(v as u8))?)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        Ok(self.output.write_unmanaged(&v)?)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        Ok(self.output.write_unmanaged(&v)?)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        Ok(self.output.write_unmanaged(&v)?)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        Ok(self.output.write_unmanaged(&v)?)
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        Ok(self.output.write_unmanaged(&v)?)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        Ok(self.output.write_unmanaged(&v)?)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        Ok(self.output.write_unmanaged(&v)?)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        Ok(self.output.write_unmanaged(&v)?)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        Ok(self.output.write_unmanaged(&v)?)
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        Ok(self.output.write_unmanaged(&v)?)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        Ok(self.output.write_unmanaged(&v)?)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        Ok(self.output.write_unmanaged(&v)?)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        Ok(self.output.write_unmanaged(&(v as u32))?)
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        Ok(self.output.write_string(Some(v))?)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        Ok(self.output.write_unmanaged_array(Some(v))?)
    }

    fn serialize_none(self) -> Result<()> {
        Ok(self.output.write_unmanaged(&0u8)?)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        self.output.write_unmanaged(&1u8)?;
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_variant(self, _name: &'static str, index: u32, _variant: &'static str) -> Result<()> {
        self.variant(index)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(self, _name: &'static str, index: u32, _variant: &'static str, value: &T) -> Result<()> {
        self.variant(index)?;
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.output.write_collection_header(len.ok_or(Error::Length)?)?;
        Ok(self)
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.members(len)?;
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeTupleStruct> {
        self.members(len)?;
        Ok(self)
    }

    fn serialize_tuple_variant(self, _name: &'static str, index: u32, _variant: &'static str, len: usize) -> Result<Self::SerializeTupleVariant> {
        self.variant(index)?;
        self.members(len)?;
        Ok(self)
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        self.output.write_collection_header(len.ok_or(Error::Length)?)?;
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.members(len)?;
        Ok(self)
    }

    fn serialize_struct_variant(self, _name: &'static str, index: u32, _variant: &'static str, len: usize) -> Result<Self::SerializeStructVariant> {
        self.variant(index)?;
        self.members(len)?;
        Ok(self)
    }

}

impl<'a, 's, S: Sink> ser::SerializeSeq for &'a mut Serializer<'s, S> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }

}

impl<'a, 's, S: Sink> ser::SerializeTuple for &'a mut Serializer<'s, S> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 's, S: Sink> ser::SerializeTupleStruct for &'a mut Serializer<'s, S> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 's, S: Sink> ser::SerializeTupleVariant for &'a mut Serializer<'s, S> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 's, S: Sink> ser::SerializeMap for &'a mut Serializer<'s, S> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        key.serialize(&mut **self)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }

}

impl<'a, 's, S: Sink> ser::SerializeStruct for &'a mut Serializer<'s, S> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _key: &'static str, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }

}

impl<'a, 's, S: Sink> ser::SerializeStructVariant for &'a mut Serializer<'s, S> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _key: &'static str, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    enum Signal {
        Off,
        Level(u8),
        Rgb(u8, u8, u8),
    }

    #[test]
    fn scalars_and_options() {
        let options = SerializerOptions::default();
        assert_eq!(vec![1, 0x2a, 0, 0, 0], to_bytes(&Some(42u32), &options).unwrap());
        assert_eq!(vec![0], to_bytes(&None::<u32>, &options).unwrap());
        assert_eq!(vec![0x41, 0, 0, 0], to_bytes(&'A', &options).unwrap());
        assert!(to_bytes(&(), &options).unwrap().is_empty());
    }

    #[test]
    fn structs_carry_their_member_count() {
        #[derive(Serialize)]
        struct Pair { a: u8, b: u16 }
        let bytes = to_bytes(&Pair { a: 1, b: 2 }, &SerializerOptions::default()).unwrap();
        assert_eq!(vec![2, 1, 2, 0], bytes);
    }

    #[test]
    fn enums_are_unions() {
        let options = SerializerOptions::default();
        assert_eq!(vec![0], to_bytes(&Signal::Off, &options).unwrap());
        assert_eq!(vec![1, 9], to_bytes(&Signal::Level(9), &options).unwrap());
        assert_eq!(vec![2, 3, 1, 2, 3], to_bytes(&Signal::Rgb(1, 2, 3), &options).unwrap());
    }

    #[test]
    fn maps_are_collections_of_pairs() {
        let map: BTreeMap<u8, bool> = [(1, true), (2, false)].into_iter().collect();
        let bytes = to_bytes(&map, &SerializerOptions::default()).unwrap();
        assert_eq!(vec![2, 0, 0, 0, 1, 1, 2, 0], bytes);
    }

    #[test]
    fn sizes_match() {
        let options = SerializerOptions::default();
        let value = (vec!["a".to_owned(), String::new()], Some(Signal::Rgb(1, 2, 3)), 7u64);
        assert_eq!(to_bytes(&value, &options).unwrap().len(), size_of(&value, &options).unwrap());
    }

    #[test]
    fn unsized_sequences_are_rejected() {
        struct Unsized;
        impl Serialize for Unsized {
            fn serialize<S: ser::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                use ser::SerializeSeq;
                serializer.serialize_seq(None)?.end()
            }
        }
        assert_eq!(Err(Error::Length), to_bytes(&Unsized, &SerializerOptions::default()));
    }

}
