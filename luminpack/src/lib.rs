//! `luminpack` is a compact binary serialization format. Values are written by per-type [`Parser`]s which drive
//! three engines: the [`Evaluator`] computes the exact encoded size, the [`Writer`] emits bytes into rented buffer
//! segments and the [`Reader`] consumes them again from a byte slice.
//!
//! Flat, reference-free values (anything implementing `bytemuck::Pod`) take a fast path and are copied byte for
//! byte. Everything else goes through the parser registered for its type. Absent values are distinguishable from
//! empty ones throughout: a `None::<Vec<i32>>` and an empty `Vec<i32>` produce different bytes and decode to
//! different values.
//!
//! ```
//! use luminpack::{SerializerOptions, StringRecording};
//!
//! let options = SerializerOptions::default().with_recording(StringRecording::Token);
//! let bytes = luminpack::serialize(&vec![Some("lumin".to_owned()), None], &options).unwrap();
//! assert_eq!(bytes.len(), luminpack::size_of(&vec![Some("lumin".to_owned()), None], &options).unwrap());
//! let back: Vec<Option<String>> = luminpack::deserialize(&bytes, &options).unwrap().unwrap();
//! assert_eq!(vec![Some("lumin".to_owned()), None], back);
//! ```
//!
//! The wire format is described in the [`wire`] module, VarInts in [`varint`] and strings in [`string`].

#![forbid(unsafe_code)]

pub mod buffer;
pub mod cursor;
mod error;
mod evaluator;
mod options;
mod parser;
pub mod parsers;
mod reader;
mod reference;
mod registry;
mod sink;
pub mod string;
pub mod unmanaged;
pub mod varint;
pub mod wire;
mod writer;

pub use buffer::{BufferPool, BufferProvider, SegmentedBuffer};
pub use error::{DecoderError, Error, ErrorKind, Result};
pub use evaluator::Evaluator;
pub use options::{SerializerOptions, StringEncoding, StringRecording, UnknownOption};
pub use parser::Parser;
pub use reader::{BlockReader, Reader};
pub use registry::ParserRegistry;
pub use sink::Sink;
pub use unmanaged::Unmanaged;
pub use varint::VarInt;
pub use wire::{MemberCount, ObjectHeader};
pub use writer::{BlockWriter, Writer};

use std::sync::{OnceLock, PoisonError, RwLock};

fn global() -> &'static RwLock<ParserRegistry> {
    static GLOBAL: OnceLock<RwLock<ParserRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(ParserRegistry::with_builtins()))
}

/// Registers `parser` for `T` in the process-wide registry used by the free functions of this crate.
pub fn register<T: 'static>(parser: impl Parser<T> + 'static) {
    global().write().unwrap_or_else(PoisonError::into_inner).register::<T, _>(parser);
}

/// Encodes `value` with the process-wide registry.
pub fn serialize<T: 'static>(value: &T, options: &SerializerOptions) -> Result<Vec<u8>> {
    global().read().unwrap_or_else(PoisonError::into_inner).serialize(value, options)
}

/// Encodes `value` into `provider` with the process-wide registry and returns the number of written bytes.
pub fn serialize_to<T: 'static>(value: &T, options: &SerializerOptions, provider: &mut dyn BufferProvider)
    -> Result<usize>
{
    global().read().unwrap_or_else(PoisonError::into_inner).serialize_to(value, options, provider)
}

/// Decodes a `T` spanning all of `bytes` with the process-wide registry. `None` means the instance was absent.
pub fn deserialize<T: 'static>(bytes: &[u8], options: &SerializerOptions)
    -> std::result::Result<Option<T>, DecoderError>
{
    global().read().unwrap_or_else(PoisonError::into_inner).deserialize(bytes, options)
}

/// Returns the exact encoded size of `value` with the process-wide registry.
pub fn size_of<T: 'static>(value: &T, options: &SerializerOptions) -> Result<usize> {
    global().read().unwrap_or_else(PoisonError::into_inner).size_of(value, options)
}

/// Writes several unmanaged values with a single bounds check. Arguments should be places (locals or fields), they
/// are evaluated once for their size and once for their bytes.
///
/// ```
/// # let registry = luminpack::ParserRegistry::new();
/// # let mut buffer = luminpack::SegmentedBuffer::new(luminpack::BufferPool::shared());
/// # let mut writer = luminpack::Writer::new(&mut buffer, &registry, Default::default());
/// let (x, y) = (1i32, 2.5f64);
/// luminpack::write_unmanaged!(writer, x, y).unwrap();
/// assert_eq!(12, writer.written());
/// ```
#[macro_export]
macro_rules! write_unmanaged {
    ($writer:expr, $($value:expr),+ $(,)?) => {{
        let size = 0 $(+ ::core::mem::size_of_val(&$value))+;
        let result: $crate::Result<()> = match $writer.reserve_block(size) {
            Ok(mut block) => {
                $(block.put(&$value);)+
                Ok(())
            },
            Err(e) => Err(e),
        };
        result
    }};
}

/// Reads several unmanaged values with a single bounds check and returns them as a tuple.
///
/// ```
/// # let registry = luminpack::ParserRegistry::new();
/// let bytes = [1, 0, 0, 0, 2, 0];
/// let mut reader = luminpack::Reader::new(&bytes, &registry, Default::default());
/// let (x, y) = luminpack::read_unmanaged!(reader, i32, u16).unwrap();
/// assert_eq!((1, 2), (x, y));
/// ```
#[macro_export]
macro_rules! read_unmanaged {
    ($reader:expr, $($t:ty),+ $(,)?) => {{
        let size = 0 $(+ ::core::mem::size_of::<$t>())+;
        match $reader.read_block(size) {
            Ok(mut block) => $crate::Result::Ok(($(block.take::<$t>(),)+)),
            Err(e) => Err(e),
        }
    }};
}
