//! Conveniently serialize and deserialize your Rust data structures into the `luminpack` wire format.
//!
//! # Positional encoding
//!
//! `luminpack` is not self-describing: field names and variant names never go on wire. A struct becomes an object
//! header carrying its member count followed by its fields in declaration order, an enum becomes a union tag holding
//! the variant index followed by its payload. Both sides therefore need the same type definitions, and reordering
//! fields or variants is a breaking change. `deserialize_any` and thus untagged enums, `#[serde(flatten)]` and
//! skipped fields of unknown types are not supported.
//!
//! An `Option` is written as a presence byte followed by the value. Sequences and maps need a known length.
//!
//! # Examples
//!
//! ```
//! use luminpack::{SerializerOptions, StringRecording};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! pub enum Species {
//!     PrionailurusViverrinus,
//!     LynxLynx,
//!     FelisCatus,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! pub struct Cat<'a> {
//!     name: &'a str,
//!     species: Species,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Message<'a> {
//!     version: u32,
//!     #[serde(borrow)]
//!     cats: Vec<Cat<'a>>,
//! }
//!
//! let msg = Message {
//!     version: 1,
//!     cats: vec![
//!         Cat { name: "Jessica", species: Species::PrionailurusViverrinus },
//!         Cat { name: "Wantan", species: Species::LynxLynx },
//!         Cat { name: "Sphinx", species: Species::FelisCatus },
//!         Cat { name: "Chandra", species: Species::PrionailurusViverrinus },
//!     ],
//! };
//!
//! let options = SerializerOptions::default().with_recording(StringRecording::Token);
//! let bytes = luminpack_serde::to_bytes(&msg, &options).unwrap();
//! assert_eq!(bytes.len(), 47);
//! assert_eq!(bytes.len(), luminpack_serde::size_of(&msg, &options).unwrap());
//! assert_eq!(&bytes[..18], [
//!   0x02,                                                   // Object with 2 members
//!     0x01, 0x00, 0x00, 0x00,                               // version: u32 1
//!     0x04, 0x00, 0x00, 0x00,                               // Collection of length 4
//!       0x02,                                               // Object with 2 members - this is the first cat
//!         0x4a, 0x65, 0x73, 0x73, 0x69, 0x63, 0x61, 0x00,   // 'Jessica' and its terminator
//! ]);
//! assert_eq!(bytes[18], 0x00);                              // Union tag 0: PrionailurusViverrinus
//!
//! let deserialized: Message = luminpack_serde::from_bytes(&bytes, &options).unwrap();
//! assert_eq!(msg, deserialized);
//!
//! // Length recording spends eight bytes of header per string instead of one terminator byte
//! let bytes = luminpack_serde::to_bytes(&msg, &SerializerOptions::default()).unwrap();
//! assert_eq!(bytes.len(), 75);
//! ```
//!
//! Borrowing `&str` fields works for Utf-8 strings. Utf-16 strings have to be transcoded and need owned `String`s.
//!
//! To nest serde types inside hand-written [`luminpack::Parser`]s, register them with a [`SerdeParser`].

mod de;
mod error;
mod parser;
mod ser;

pub use de::{from_bytes, Deserializer};
pub use error::{DeserializationError, Error, Result};
pub use parser::SerdeParser;
pub use ser::{size_of, to_bytes, to_writer, Serializer};

#[cfg(test)]
mod tests {
    use serde::{Serialize, Deserialize};
    use std::collections::HashMap;
    use luminpack::{SerializerOptions, StringEncoding, StringRecording};
    use super::{to_bytes, from_bytes, size_of};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum Enum {
        UnitVariant,
        NewtypeVariant(bool),
        TupleVariant(f32, f32),
        StructVariant{ a: usize, b: usize, c: usize },
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Struct {
        field: u8,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct UnitStruct;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct NewtypeStruct(String);

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct TupleStruct(char, char, char);

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Test {
        bool: bool,
        i8: i8,
        i16: i16,
        i32: i32,
        i64: i64,
        i128: i128,
        u8: u8,
        u16: u16,
        u32: u32,
        u64: u64,
        u128: u128,
        f32: f32,
        f64: f64,
        char: char,
        str: String,
        empty: String,
        #[serde(with = "serde_bytes")]
        bytes: Vec<u8>,
        none: Option<u8>,
        some: Option<u8>,
        nested: Option<Option<String>>,
        unit: (),
        unit_struct: UnitStruct,
        newtype_struct: NewtypeStruct,
        tuple_struct: TupleStruct,
        seq: Vec<String>,
        tuple: (u16, u16, u16),
        map: HashMap<usize, String>,
        r#struct: Struct,
        unit_variant: Enum,
        newtype_variant: Enum,
        tuple_variant: Enum,
        struct_variant: Enum,
    }

    fn message() -> Test {
        Test {
            bool: true,
            i8: -1,
            i16: -20,
            i32: -7000,
            i64: i64::MIN,
            i128: i128::MIN + 1,
            u8: 1,
            u16: 20,
            u32: 7000,
            u64: u64::MAX,
            u128: u128::MAX,
            f32: 1337.8472,
            f64: 1337.8472,
            char: 'x',
            str: "Test".to_string(),
            empty: String::new(),
            bytes: vec![0x00, 0xff, 0xfe, 0x00, 0x01],
            none: None,
            some: Some(0),
            nested: Some(None),
            unit: (),
            unit_struct: UnitStruct,
            newtype_struct: NewtypeStruct("Qapla'".to_string()),
            tuple_struct: TupleStruct('ä', '😀', ' '),
            seq: vec![
                "Elen".to_string(),
                "síla".to_string(),
                "lúmenn'".to_string(),
                "omentielvo".to_string(),
            ],
            tuple: (0, 0, 0),
            map: [
                (1701, "Enterprise".to_string()),
                (74656, "Voyager".to_string())
            ].into_iter().collect(),
            r#struct: Struct {
                field: 42,
            },
            unit_variant: Enum::UnitVariant,
            newtype_variant: Enum::NewtypeVariant(false),
            tuple_variant: Enum::TupleVariant(1.0, 0.999),
            struct_variant: Enum::StructVariant {
                a: 255,
                b: 0,
                c: 33,
            }
        }
    }

    #[test]
    fn roundtrip() {
        let message = message();
        for encoding in [StringEncoding::Utf8, StringEncoding::Utf16] {
            for recording in [StringRecording::Length, StringRecording::Token] {
                let options = SerializerOptions::new(encoding, recording);
                let bytes = to_bytes(&message, &options).unwrap();
                assert_eq!(bytes.len(), size_of(&message, &options).unwrap(), "{:?}", options);
                assert_eq!(message, from_bytes::<Test>(&bytes, &options).unwrap(), "{:?}", options);
            }
        }
    }

    #[test]
    fn options_must_match() {
        let message = message();
        let bytes = to_bytes(&message, &SerializerOptions::default()).unwrap();
        let utf16 = SerializerOptions::default().with_encoding(StringEncoding::Utf16);
        assert!(from_bytes::<Test>(&bytes, &utf16).is_err());
    }
}
