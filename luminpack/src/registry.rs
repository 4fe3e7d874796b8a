//! Lookup of parsers by type and the entry points which drive a whole call.

use crate::buffer::{BufferPool, BufferProvider, SegmentedBuffer};
use crate::error::{DecoderError, Error, Result};
use crate::evaluator::Evaluator;
use crate::options::SerializerOptions;
use crate::parser::Parser;
use crate::parsers::{ArrayParser, BoolParser, CharParser, NullableParser, StringParser, UnmanagedArrayParser,
    UnmanagedParser};
use crate::reader::Reader;
use crate::writer::Writer;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

/// Parsers by the type they handle. A registry is immutable while calls borrow it; registering replaces an existing
/// parser for the same type.
#[derive(Default)]
pub struct ParserRegistry {
    /// Each entry is a `Box<dyn Parser<T>>` for the `T` of its key
    parsers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ParserRegistry {

    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry knowing the primitives, their `Option`s, strings and vectors of all of these.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        macro_rules! unmanaged {
            ($($t:ty),*) => {
                $(
                    registry.register::<$t, _>(UnmanagedParser::new());
                    registry.register::<Option<$t>, _>(NullableParser::new());
                    registry.register::<Vec<$t>, _>(UnmanagedArrayParser::new());
                    registry.register::<Option<Vec<$t>>, _>(UnmanagedArrayParser::new());
                )*
            };
        }
        unmanaged!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);
        registry
            .register::<bool, _>(BoolParser)
            .register::<char, _>(CharParser)
            .register::<String, _>(StringParser)
            .register::<Option<String>, _>(StringParser)
            .register::<Vec<bool>, _>(ArrayParser::new())
            .register::<Vec<String>, _>(ArrayParser::new())
            .register::<Option<Vec<String>>, _>(ArrayParser::new())
            .register::<Vec<Option<String>>, _>(ArrayParser::new());
        registry
    }

    /// Registers `parser` for `T`, replacing any previous one.
    pub fn register<T: 'static, P: Parser<T> + 'static>(&mut self, parser: P) -> &mut Self {
        let parser: Box<dyn Parser<T>> = Box::new(parser);
        if self.parsers.insert(TypeId::of::<T>(), Box::new(parser)).is_some() {
            debug!(r#type = type_name::<T>(), "replaced parser");
        } else {
            debug!(r#type = type_name::<T>(), "registered parser");
        }
        self
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.parsers.contains_key(&TypeId::of::<T>())
    }

    /// Returns the parser for `T`, or [`Error::NoParserRegistered`].
    pub fn get<T: 'static>(&self) -> Result<&dyn Parser<T>> {
        self.parsers
            .get(&TypeId::of::<T>())
            .and_then(|parser| parser.downcast_ref::<Box<dyn Parser<T>>>())
            .map(|parser| parser.as_ref())
            .ok_or(Error::NoParserRegistered(type_name::<T>()))
    }

    /// Encodes `value` into a fresh vector, using segments from the shared pool.
    pub fn serialize<T: 'static>(&self, value: &T, options: &SerializerOptions) -> Result<Vec<u8>> {
        let mut buffer = SegmentedBuffer::new(BufferPool::shared());
        self.serialize_to(value, options, &mut buffer)?;
        Ok(buffer.to_vec())
    }

    /// Encodes `value` into `provider` and returns the number of written bytes.
    pub fn serialize_to<T: 'static>(&self, value: &T, options: &SerializerOptions, provider: &mut dyn BufferProvider)
        -> Result<usize>
    {
        trace!(r#type = type_name::<T>(), "serializing");
        let parser = self.get::<T>()?;
        let mut writer = Writer::new(provider, self, *options);
        parser.serialize(&mut writer, value)?;
        Ok(writer.finish())
    }

    /// Decodes a `T` which has to span all of `bytes`. `None` means the encoded instance was absent.
    pub fn deserialize<T: 'static>(&self, bytes: &[u8], options: &SerializerOptions)
        -> std::result::Result<Option<T>, DecoderError>
    {
        let mut value = None;
        let consumed = self.deserialize_into(bytes, options, &mut value)?;
        if consumed < bytes.len() {
            return Err(Error::TrailingBytes(bytes.len() - consumed).at(consumed));
        }
        Ok(value)
    }

    /// Decodes a `T` from the start of `bytes` into `value`, reusing what it holds where the parser supports it.
    /// Returns the number of consumed bytes; anything after them is left alone.
    pub fn deserialize_into<T: 'static>(&self, bytes: &[u8], options: &SerializerOptions, value: &mut Option<T>)
        -> std::result::Result<usize, DecoderError>
    {
        trace!(r#type = type_name::<T>(), len = bytes.len(), "deserializing");
        let parser = self.get::<T>().map_err(|e| e.at(0))?;
        let mut reader = Reader::new(bytes, self, *options);
        match parser.deserialize(&mut reader, value) {
            Ok(())  => Ok(reader.position()),
            Err(e)  => Err(e.at(reader.position())),
        }
    }

    /// Returns the exact number of bytes `serialize` would produce for `value`.
    pub fn size_of<T: 'static>(&self, value: &T, options: &SerializerOptions) -> Result<usize> {
        let parser = self.get::<T>()?;
        let mut size = 0;
        let mut evaluator = Evaluator::new(&mut size, self, *options);
        parser.calculate_size(&mut evaluator, value)?;
        Ok(size)
    }

}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRegistry").field("parsers", &self.parsers.len()).finish()
    }
}
