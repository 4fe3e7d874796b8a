use serde::Deserialize;
use serde::de::{self, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess, VariantAccess, Visitor};
use luminpack::{ObjectHeader, ParserRegistry, Reader, SerializerOptions};
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::error::{DeserializationError, Error, Result};

/// Drives a [`Reader`]. The format is positional, so every value is read as exactly the type the visitor asks for.
pub struct Deserializer<'a, 'de> {
    reader: &'a mut Reader<'de>,
}

impl<'a, 'de> Deserializer<'a, 'de> {
    pub fn new(reader: &'a mut Reader<'de>) -> Self {
        Deserializer { reader }
    }
}

/// Serde types never consult the registry, but the reader needs one which outlives the input.
fn registry() -> &'static ParserRegistry {
    static EMPTY: OnceLock<ParserRegistry> = OnceLock::new();
    EMPTY.get_or_init(ParserRegistry::new)
}

pub fn from_bytes<'a, T: Deserialize<'a>>(s: &'a [u8], options: &SerializerOptions)
    -> std::result::Result<T, DeserializationError>
{
    let mut reader = Reader::new(s, registry(), *options);
    let mut deserializer = Deserializer::new(&mut reader);
    let t = T::deserialize(&mut deserializer).map_err(|e| e.at(deserializer.reader.position()))?;
    match deserializer.reader.ensure_consumed() {
        Ok(()) => Ok(t),
        Err(e) => Err(Error::from(e).at(deserializer.reader.position())),
    }
}

impl<'a, 'de> Deserializer<'a, 'de> {

    fn members(&mut self, expected: usize) -> Result<()> {
        match self.reader.read_object_header()? {
            ObjectHeader::Members(found) if found as usize == expected => Ok(()),
            ObjectHeader::Members(found) => Err(Error::FieldCount { expected, found }),
            other => Err(Error::UnexpectedHeader("member count", format!("{:?}", other))),
        }
    }

    fn length(&mut self) -> Result<usize> {
        match self.reader.read_collection_header()? {
            Some(len) => Ok(len),
            None      => Err(Error::UnexpectedHeader("collection length", "null collection".to_owned())),
        }
    }

    fn flag(&mut self) -> Result<bool> {
        match self.reader.read_unmanaged::<u8>()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(Error::UnexpectedHeader("0 or 1", b.to_string())),
        }
    }

}

impl<'de, 'a, 'b> de::Deserializer<'de> for &'a mut Deserializer<'b, 'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::NotSelfDescribing("deserialize_any"))
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_bool(self.flag()?)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i8(self.reader.read_unmanaged()?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i16(self.reader.read_unmanaged()?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i32(self.reader.read_unmanaged()?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(self.reader.read_unmanaged()?)
    }

    fn deserialize_i128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i128(self.reader.read_unmanaged()?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u8(self.reader.read_unmanaged()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u16(self.reader.read_unmanaged()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u32(self.reader.read_unmanaged()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(self.reader.read_unmanaged()?)
    }

    fn deserialize_u128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u128(self.reader.read_unmanaged()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f32(self.reader.read_unmanaged()?)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f64(self.reader.read_unmanaged()?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let code = self.reader.read_unmanaged::<u32>()?;
        match char::from_u32(code) {
            Some(c) => visitor.visit_char(c),
            None    => Err(Error::UnexpectedHeader("unicode scalar value", format!("{:#x}", code))),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.reader.read_str()? {
            Some(Cow::Borrowed(s)) => visitor.visit_borrowed_str(s),
            Some(Cow::Owned(s))    => visitor.visit_string(s),
            None                   => Err(Error::UnexpectedHeader("string", "null string".to_owned())),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let len = self.length()?;
        visitor.visit_borrowed_bytes(self.reader.read_raw(len)?)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.flag()? {
            visitor.visit_some(self)
        } else {
            visitor.visit_none()
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let len = self.length()?;
        visitor.visit_seq(SeqDeserializer::new(self, len))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        self.members(len)?;
        visitor.visit_seq(SeqDeserializer::new(self, len))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(self, _name: &'static str, len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let len = self.length()?;
        visitor.visit_map(MapDeserializer::new(self, len))
    }

    fn deserialize_struct<V: Visitor<'de>>(self, _name: &'static str, fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        self.deserialize_tuple(fields.len(), visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(self, _name: &'static str, _variants: &'static [&'static str],  visitor: V) -> Result<V::Value> {
        match self.reader.read_union_header()? {
            Some(tag) => visitor.visit_enum(EnumDeserializer::new(self, tag)),
            None      => Err(Error::UnexpectedHeader("union tag", "null union".to_owned())),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::NotSelfDescribing("deserialize_identifier"))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::NotSelfDescribing("deserialize_ignored_any"))
    }

    fn is_human_readable(&self) -> bool {
        false
    }

}

struct MapDeserializer<'a, 'b, 'de> {
    de: &'a mut Deserializer<'b, 'de>,
    remaining: usize,
}

impl<'a, 'b, 'de> MapDeserializer<'a, 'b, 'de> {
    fn new(de: &'a mut Deserializer<'b, 'de>, remaining: usize) -> Self {
        Self { de, remaining }
    }
}

impl<'de, 'a, 'b> MapAccess<'de> for MapDeserializer<'a, 'b, 'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        seed.deserialize(&mut *self.de)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

struct EnumDeserializer<'a, 'b, 'de> {
    de: &'a mut Deserializer<'b, 'de>,
    tag: u16,
}

impl<'a, 'b, 'de> EnumDeserializer<'a, 'b, 'de> {
    fn new(de: &'a mut Deserializer<'b, 'de>, tag: u16) -> Self {
        Self { de, tag }
    }
}

impl<'de, 'a, 'b> EnumAccess<'de> for EnumDeserializer<'a, 'b, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let index: de::value::U32Deserializer<Error> = (self.tag as u32).into_deserializer();
        let variant = seed.deserialize(index)?;
        Ok((variant, self))
    }
}

impl<'de, 'a, 'b> VariantAccess<'de> for EnumDeserializer<'a, 'b, 'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(self.de)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_tuple(self.de, len, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_tuple(self.de, fields.len(), visitor)
    }
}

struct SeqDeserializer<'a, 'b, 'de> {
    de: &'a mut Deserializer<'b, 'de>,
    remaining: usize,
}

impl<'a, 'b, 'de> SeqDeserializer<'a, 'b, 'de> {
    fn new(de: &'a mut Deserializer<'b, 'de>, remaining: usize) -> Self {
        Self { de, remaining }
    }
}

impl<'de, 'a, 'b> SeqAccess<'de> for SeqDeserializer<'a, 'b, 'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}
