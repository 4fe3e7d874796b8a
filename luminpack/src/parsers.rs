//! Parsers for the types every registry knows, plus generic building blocks for user types.

use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::parser::Parser;
use crate::reader::Reader;
use crate::unmanaged::Unmanaged;
use crate::wire::{NULL_OBJECT, REFERENCE_ID};
use crate::writer::Writer;
use std::any::Any;
use std::marker::PhantomData;
use std::mem::size_of;
use std::rc::Rc;

macro_rules! marker_parser {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub struct $name<T>(PhantomData<fn() -> T>);

        impl<T> $name<T> {
            pub const fn new() -> Self {
                Self(PhantomData)
            }
        }

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

marker_parser! {
    /// Copies the memory of `T` verbatim.
    UnmanagedParser
}

marker_parser! {
    /// `Option<T>` of an unmanaged `T`: a presence byte, followed by the value if present.
    NullableParser
}

marker_parser! {
    /// `Vec<T>` and `Option<Vec<T>>` of an unmanaged `T` as one block.
    UnmanagedArrayParser
}

marker_parser! {
    /// `Vec<T>` and `Option<Vec<T>>` element by element through the parser registered for `T`.
    ArrayParser
}

marker_parser! {
    /// `Option<T>` of an object type `T` whose parser writes an object header: an absent value is a null object
    /// header, a present one is whatever the parser of `T` writes.
    NullableObjectParser
}

marker_parser! {
    /// `Rc<T>` preserving identity. The first occurrence of an instance within a call is written in full through
    /// the parser of `T`, later ones as a back-reference. The parser of `T` must write an object header first so
    /// that back-references can be told apart.
    SharedParser
}

impl<T: Unmanaged> Parser<T> for UnmanagedParser<T> {

    fn serialize(&self, writer: &mut Writer<'_>, value: &T) -> Result<()> {
        writer.write_unmanaged(value)
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<T>) -> Result<()> {
        *value = Some(reader.read_unmanaged()?);
        Ok(())
    }

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, _value: &T) -> Result<()> {
        evaluator.unmanaged::<T>();
        Ok(())
    }

}

/// One byte, `0` or `1`.
pub struct BoolParser;

impl Parser<bool> for BoolParser {

    fn serialize(&self, writer: &mut Writer<'_>, value: &bool) -> Result<()> {
        writer.write_unmanaged(&(*value as u8))
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<bool>) -> Result<()> {
        *value = Some(match reader.peek_byte()? {
            0 => false,
            1 => true,
            b => return Err(Error::invalid("bool", b)),
        });
        reader.advance(1)
    }

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, _value: &bool) -> Result<()> {
        evaluator.add(1);
        Ok(())
    }

}

/// The scalar value as `u32`.
pub struct CharParser;

impl Parser<char> for CharParser {

    fn serialize(&self, writer: &mut Writer<'_>, value: &char) -> Result<()> {
        writer.write_unmanaged(&u32::from(*value))
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<char>) -> Result<()> {
        let scalar = reader.read_unmanaged::<u32>()?;
        *value = Some(char::from_u32(scalar).ok_or(Error::invalid("char", scalar))?);
        Ok(())
    }

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, _value: &char) -> Result<()> {
        evaluator.add(size_of::<u32>());
        Ok(())
    }

}

impl<T: Unmanaged> Parser<Option<T>> for NullableParser<T> {

    fn serialize(&self, writer: &mut Writer<'_>, value: &Option<T>) -> Result<()> {
        match value {
            None        => writer.write_unmanaged(&0u8),
            Some(value) => {
                let mut block = writer.reserve_block(1 + size_of::<T>())?;
                block.put(&1u8);
                block.put(value);
                Ok(())
            },
        }
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<Option<T>>) -> Result<()> {
        match reader.peek_byte()? {
            0 => {
                reader.advance(1)?;
                *value = Some(None);
            },
            1 => {
                let mut block = reader.read_block(1 + size_of::<T>())?;
                block.take::<u8>();
                *value = Some(Some(block.take()));
            },
            b => return Err(Error::invalid("presence flag", b)),
        }
        Ok(())
    }

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, value: &Option<T>) -> Result<()> {
        evaluator.add(match value {
            None    => 1,
            Some(_) => 1 + size_of::<T>(),
        });
        Ok(())
    }

}

/// `String` and `Option<String>`. A null string on wire decodes to an absent `String`.
pub struct StringParser;

impl Parser<String> for StringParser {

    fn serialize(&self, writer: &mut Writer<'_>, value: &String) -> Result<()> {
        writer.write_string(Some(value.as_str()))
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<String>) -> Result<()> {
        *value = reader.read_string()?;
        Ok(())
    }

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, value: &String) -> Result<()> {
        evaluator.string(Some(value.as_str()))
    }

}

impl Parser<Option<String>> for StringParser {

    fn serialize(&self, writer: &mut Writer<'_>, value: &Option<String>) -> Result<()> {
        writer.write_string(value.as_deref())
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<Option<String>>) -> Result<()> {
        *value = Some(reader.read_string()?);
        Ok(())
    }

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, value: &Option<String>) -> Result<()> {
        evaluator.string(value.as_deref())
    }

}

impl<T: Unmanaged> Parser<Vec<T>> for UnmanagedArrayParser<T> {

    fn serialize(&self, writer: &mut Writer<'_>, value: &Vec<T>) -> Result<()> {
        writer.write_unmanaged_array(Some(value.as_slice()))
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<Vec<T>>) -> Result<()> {
        reader.read_unmanaged_array_into(value)
    }

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, value: &Vec<T>) -> Result<()> {
        evaluator.unmanaged_array(Some(value.as_slice()))
    }

}

impl<T: Unmanaged> Parser<Option<Vec<T>>> for UnmanagedArrayParser<T> {

    fn serialize(&self, writer: &mut Writer<'_>, value: &Option<Vec<T>>) -> Result<()> {
        writer.write_unmanaged_array(value.as_deref())
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<Option<Vec<T>>>) -> Result<()> {
        let mut inner = value.take().flatten();
        reader.read_unmanaged_array_into(&mut inner)?;
        *value = Some(inner);
        Ok(())
    }

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, value: &Option<Vec<T>>) -> Result<()> {
        evaluator.unmanaged_array(value.as_deref())
    }

}

impl<T: 'static> Parser<Vec<T>> for ArrayParser<T> {

    fn serialize(&self, writer: &mut Writer<'_>, value: &Vec<T>) -> Result<()> {
        writer.write_array(Some(value.as_slice()))
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<Vec<T>>) -> Result<()> {
        reader.read_array_into(value)
    }

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, value: &Vec<T>) -> Result<()> {
        evaluator.array(Some(value.as_slice()))
    }

}

impl<T: 'static> Parser<Option<Vec<T>>> for ArrayParser<T> {

    fn serialize(&self, writer: &mut Writer<'_>, value: &Option<Vec<T>>) -> Result<()> {
        writer.write_array(value.as_deref())
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<Option<Vec<T>>>) -> Result<()> {
        let mut inner = value.take().flatten();
        reader.read_array_into(&mut inner)?;
        *value = Some(inner);
        Ok(())
    }

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, value: &Option<Vec<T>>) -> Result<()> {
        evaluator.array(value.as_deref())
    }

}

impl<T: 'static> Parser<Option<T>> for NullableObjectParser<T> {

    fn serialize(&self, writer: &mut Writer<'_>, value: &Option<T>) -> Result<()> {
        match value {
            None        => writer.write_null_object_header(),
            Some(value) => writer.write_value(value),
        }
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<Option<T>>) -> Result<()> {
        if reader.peek_byte()? == NULL_OBJECT {
            reader.advance(1)?;
            *value = Some(None);
        } else {
            let mut inner = value.take().flatten();
            reader.read_value_into(&mut inner)?;
            *value = Some(inner);
        }
        Ok(())
    }

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, value: &Option<T>) -> Result<()> {
        match value {
            None        => {
                evaluator.null_object_header();
                Ok(())
            },
            Some(value) => evaluator.value(value),
        }
    }

}

#[inline]
fn address<T>(value: &Rc<T>) -> usize {
    Rc::as_ptr(value) as *const () as usize
}

impl<T: 'static> Parser<Rc<T>> for SharedParser<T> {

    fn serialize(&self, writer: &mut Writer<'_>, value: &Rc<T>) -> Result<()> {
        match writer.reference_id(address(value)) {
            Some(id) => writer.write_object_reference_id(id),
            None     => writer.write_value::<T>(value),
        }
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<Rc<T>>) -> Result<()> {
        if reader.peek_byte()? == REFERENCE_ID {
            reader.advance(1)?;
            let id = reader.read_var_int::<u32>()?;
            let shared = reader.reference(id)?.downcast::<T>().map_err(|_| Error::UnknownReference(id))?;
            *value = Some(shared);
            return Ok(());
        }
        let id = reader.reserve_reference();
        *value = match reader.read_value::<T>()? {
            Some(inner) => {
                let shared = Rc::new(inner);
                reader.set_reference(id, shared.clone() as Rc<dyn Any>);
                Some(shared)
            },
            None        => None,
        };
        Ok(())
    }

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, value: &Rc<T>) -> Result<()> {
        match evaluator.reference_id(address(value)) {
            Some(id) => {
                evaluator.object_reference_id(id);
                Ok(())
            },
            None     => evaluator.value::<T>(value),
        }
    }

}

#[cfg(test)]
mod tests {
    use crate::error::{Error, ErrorKind};
    use crate::options::SerializerOptions;
    use crate::registry::ParserRegistry;

    fn registry() -> ParserRegistry {
        ParserRegistry::with_builtins()
    }

    #[test]
    fn bools_are_strict() {
        let options = SerializerOptions::default();
        assert_eq!(Ok(vec![1]), registry().serialize(&true, &options));
        assert_eq!(Ok(Some(false)), registry().deserialize::<bool>(&[0], &options));
        let err = registry().deserialize::<bool>(&[2], &options).unwrap_err();
        assert_eq!(Error::InvalidValue { what: "bool", value: 2 }, err.into_inner());
    }

    #[test]
    fn chars() {
        let options = SerializerOptions::default();
        let bytes = registry().serialize(&'ä', &options).unwrap();
        assert_eq!(vec![0xe4, 0, 0, 0], bytes);
        assert_eq!(Ok(Some('ä')), registry().deserialize::<char>(&bytes, &options));
        let err = registry().deserialize::<char>(&0xd800u32.to_le_bytes(), &options).unwrap_err();
        assert_eq!(ErrorKind::Malformed, err.kind());
    }

    #[test]
    fn nullable_scalars() {
        let options = SerializerOptions::default();
        assert_eq!(Ok(vec![0]), registry().serialize(&None::<i32>, &options));
        assert_eq!(Ok(vec![1, 7, 0, 0, 0]), registry().serialize(&Some(7i32), &options));
        assert_eq!(Ok(5), registry().size_of(&Some(7i32), &options));
        assert_eq!(Ok(Some(None)), registry().deserialize::<Option<i32>>(&[0], &options));
        assert_eq!(Ok(Some(Some(7))), registry().deserialize::<Option<i32>>(&[1, 7, 0, 0, 0], &options));
    }

    #[test]
    fn null_and_empty_vectors_differ() {
        let options = SerializerOptions::default();
        let null = registry().serialize(&None::<Vec<i32>>, &options).unwrap();
        let empty = registry().serialize(&Vec::<i32>::new(), &options).unwrap();
        assert_eq!((-1i32).to_le_bytes().to_vec(), null);
        assert_eq!(0i32.to_le_bytes().to_vec(), empty);
        assert_eq!(Ok(None), registry().deserialize::<Vec<i32>>(&null, &options));
        assert_eq!(Ok(Some(vec![])), registry().deserialize::<Vec<i32>>(&empty, &options));
        assert_eq!(Ok(Some(None)), registry().deserialize::<Option<Vec<i32>>>(&null, &options));
    }

    #[test]
    fn string_vectors() {
        let options = SerializerOptions::default();
        let values = vec![Some("a".to_owned()), None, Some(String::new())];
        let bytes = registry().serialize(&values, &options).unwrap();
        assert_eq!(Ok(bytes.len()), registry().size_of(&values, &options));
        assert_eq!(Ok(Some(values)), registry().deserialize::<Vec<Option<String>>>(&bytes, &options));
        let err = registry().deserialize::<Vec<String>>(&bytes, &options).unwrap_err();
        assert!(matches!(err.into_inner(), Error::UnexpectedNull(_)));
    }

}
