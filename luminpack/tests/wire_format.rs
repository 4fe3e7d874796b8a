use luminpack::varint;
use luminpack::{ErrorKind, ParserRegistry, SerializerOptions, StringEncoding, StringRecording};

fn all_options() -> Vec<SerializerOptions> {
    let mut options = Vec::new();
    for encoding in [StringEncoding::Utf8, StringEncoding::Utf16] {
        for recording in [StringRecording::Length, StringRecording::Token] {
            options.push(SerializerOptions::new(encoding, recording));
        }
    }
    options
}

#[test]
fn var_int_minimality() {
    for x in -120i64..=127 {
        assert_eq!(1, varint::size_of(x), "{}", x);
    }
    assert_eq!(3, varint::size_of(200i32));
    assert_eq!(5, varint::size_of(100_000i32));
    assert_eq!(3, varint::size_of(-200i32));
}

#[test]
fn null_and_empty_arrays() {
    let options = SerializerOptions::default();
    let null = luminpack::serialize(&None::<Vec<i32>>, &options).unwrap();
    let empty = luminpack::serialize(&Vec::<i32>::new(), &options).unwrap();
    assert_eq!((-1i32).to_le_bytes().to_vec(), null);
    assert_eq!(0i32.to_le_bytes().to_vec(), empty);
    assert_eq!(None, luminpack::deserialize::<Option<Vec<i32>>>(&null, &options).unwrap().unwrap());
    assert_eq!(Some(vec![]), luminpack::deserialize::<Option<Vec<i32>>>(&empty, &options).unwrap().unwrap());
}

#[test]
fn null_and_empty_string_arrays() {
    let options = SerializerOptions::default();
    let null = luminpack::serialize(&None::<Vec<String>>, &options).unwrap();
    let empty = luminpack::serialize(&Vec::<String>::new(), &options).unwrap();
    assert_eq!((-1i32).to_le_bytes().to_vec(), null);
    assert_eq!(0i32.to_le_bytes().to_vec(), empty);
    assert_eq!(Ok(None), luminpack::deserialize::<Vec<String>>(&null, &options));
    assert_eq!(Ok(Some(vec![])), luminpack::deserialize::<Vec<String>>(&empty, &options));
}

#[test]
fn strings_in_every_mode() {
    for options in all_options() {
        for value in [Some("hi"), Some(""), Some("grüße 😀"), None] {
            let value = value.map(str::to_owned);
            let bytes = luminpack::serialize(&value, &options).unwrap();
            assert_eq!(bytes.len(), luminpack::size_of(&value, &options).unwrap(), "{:?}", options);
            let back = luminpack::deserialize::<Option<String>>(&bytes, &options).unwrap().unwrap();
            assert_eq!(value, back, "{:?}", options);
        }
    }
}

#[test]
fn null_string_encodings() {
    let expected: [&[u8]; 4] = [&[0xff, 0xff, 0xff, 0xff], &[0xff], &[0xff, 0xff, 0xff, 0xff], &[0xff, 0xdf]];
    for (options, expected) in all_options().into_iter().zip(expected) {
        assert_eq!(expected, &luminpack::serialize(&None::<String>, &options).unwrap()[..], "{:?}", options);
    }
}

#[test]
fn empty_string_is_not_null() {
    let expected: [&[u8]; 4] = [&[0, 0, 0, 0], &[0], &[0, 0, 0, 0], &[0, 0]];
    for (options, expected) in all_options().into_iter().zip(expected) {
        let bytes = luminpack::serialize(&String::new(), &options).unwrap();
        assert_eq!(expected, &bytes[..], "{:?}", options);
        assert_eq!(Ok(Some(String::new())), luminpack::deserialize::<String>(&bytes, &options));
    }
}

#[test]
fn embedded_nul_needs_length_recording() {
    let value = "a\0b".to_owned();
    for options in all_options() {
        let result = luminpack::serialize(&value, &options);
        match options.recording {
            StringRecording::Length => {
                let bytes = result.unwrap();
                assert_eq!(Ok(Some(value.clone())), luminpack::deserialize::<String>(&bytes, &options));
            },
            StringRecording::Token  => {
                assert_eq!(ErrorKind::EncodingFailure, result.unwrap_err().kind());
                assert_eq!(ErrorKind::EncodingFailure, luminpack::size_of(&value, &options).unwrap_err().kind());
            },
        }
    }
}

#[test]
fn truncated_collection_header() {
    let options = SerializerOptions::default();
    let err = luminpack::deserialize::<Vec<i32>>(&[2, 0], &options).unwrap_err();
    assert_eq!(ErrorKind::OutOfRange, err.kind());
    let err = luminpack::deserialize::<String>(&[5, 0, 0, 0, 5, 0, 0, 0, b'a'], &options).unwrap_err();
    assert_eq!(ErrorKind::OutOfRange, err.kind());
}

#[test]
fn oversized_lengths_are_rejected_before_allocating() {
    let options = SerializerOptions::default();
    let err = luminpack::deserialize::<Vec<u64>>(&i32::MAX.to_le_bytes(), &options).unwrap_err();
    assert_eq!(ErrorKind::OutOfRange, err.kind());
    let err = luminpack::deserialize::<Vec<String>>(&i32::MAX.to_le_bytes(), &options).unwrap_err();
    assert_eq!(ErrorKind::OutOfRange, err.kind());
}

#[test]
fn scalars_are_little_endian() {
    let options = SerializerOptions::default();
    assert_eq!(vec![0x04, 0x03, 0x02, 0x01], luminpack::serialize(&0x0102_0304u32, &options).unwrap());
    assert_eq!(1.5f64.to_le_bytes().to_vec(), luminpack::serialize(&1.5f64, &options).unwrap());
    let bytes = luminpack::serialize(&vec![1u16, 2], &options).unwrap();
    assert_eq!(vec![2, 0, 0, 0, 1, 0, 2, 0], bytes);
}

#[test]
fn missing_parsers_are_reported() {
    struct Unregistered;
    let options = SerializerOptions::default();
    assert_eq!(ErrorKind::NoParserRegistered, luminpack::serialize(&Unregistered, &options).unwrap_err().kind());
    assert_eq!(ErrorKind::NoParserRegistered, luminpack::size_of(&Unregistered, &options).unwrap_err().kind());
    let err = luminpack::deserialize::<Unregistered>(&[], &options).err().map(|e| e.kind());
    assert_eq!(Some(ErrorKind::NoParserRegistered), err);
}

#[test]
fn explicit_registries_are_independent() {
    let registry = ParserRegistry::new();
    assert!(!registry.contains::<i32>());
    assert!(registry.serialize(&1i32, &SerializerOptions::default()).is_err());
}
