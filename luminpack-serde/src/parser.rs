use luminpack::{Evaluator, Parser, Reader, Writer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

use crate::de::Deserializer;
use crate::ser::Serializer;

/// Adapts any serde type to the [`Parser`] contract, so derived types can be registered and nested inside
/// hand-written parsers. Serde types are never null on wire; use an `Option` field to express absence.
pub struct SerdeParser<T>(PhantomData<fn() -> T>);

impl<T> SerdeParser<T> {
    pub const fn new() -> Self {
        SerdeParser(PhantomData)
    }
}

impl<T> Default for SerdeParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize + DeserializeOwned> Parser<T> for SerdeParser<T> {

    fn serialize(&self, writer: &mut Writer<'_>, value: &T) -> luminpack::Result<()> {
        Ok(value.serialize(&mut Serializer::new(writer))?)
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<T>) -> luminpack::Result<()> {
        *value = Some(T::deserialize(&mut Deserializer::new(reader))?);
        Ok(())
    }

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, value: &T) -> luminpack::Result<()> {
        Ok(value.serialize(&mut Serializer::new(evaluator))?)
    }

}
