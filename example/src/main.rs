use anyhow::{ensure, Context, Result};
use luminpack::{SerializerOptions, StringEncoding, StringRecording};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct UnitStruct;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct NewtypeStruct(i8);

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct PlainStruct {
    a: i8,
    b: i8,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
enum Enum {
    UnitVariant,
    NewtypeVariant(i8),
    TupleVariant(i32, i32),
    StructVariant { x: i32, y: i32 },
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct SerdeDataModel<'a> {
    boolean: bool,
    int_i8: i8,
    int_i16: i16,
    int_i32: i32,
    int_i64: i64,
    int_u8: u8,
    int_u16: u16,
    int_u32: u32,
    int_u64: u64,
    float_f32: f32,
    float_f64: f64,
    character: char,
    string: &'a str,
    owned_string: String,
    empty_string: String,
    #[serde(with = "serde_bytes")]
    bytes: &'a [u8],
    #[serde(with = "serde_bytes")]
    owned_bytes: Vec<u8>,
    unoptimized_bytes: Vec<u8>,
    option_some: Option<i8>,
    option_none: Option<i8>,
    unit: (),
    unit_struct: UnitStruct,
    newtype_struct: NewtypeStruct,
    seq: Vec<u64>,
    tuple: (i32, i32),
    map: HashMap<i32, String>,
    plain_struct: PlainStruct,
    enums: Vec<Enum>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
enum Species {
    PrionailurusViverrinus,
    LynxLynx,
    FelisCatus,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Cat {
    name: String,
    species: Species,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Message {
    version: u32,
    cats: Vec<Cat>,
}

fn main() -> Result<()> {
    let mut map = HashMap::new();
    map.insert(1, String::from("Eins"));
    map.insert(2, String::from("Zwei"));
    let data = SerdeDataModel {
        boolean: true,
        int_i8: 1,
        int_i16: -1,
        int_i32: 33434,
        int_i64: -1232454,
        int_u8: 17,
        int_u16: 16330,
        int_u32: 44444,
        int_u64: 1048576,
        float_f32: 1234.5678,
        float_f64: 1234.56789e17,
        character: 'a',
        string: "this needs no \"escaping\"",
        owned_string: "owned".to_owned(),
        empty_string: String::new(),
        bytes: &[1, 2, 3, 4],
        owned_bytes: vec![5, 6, 7, 8],
        unoptimized_bytes: vec![37, 38, 39, 40],
        option_some: Some(1),
        option_none: None,
        unit: (),
        unit_struct: UnitStruct,
        newtype_struct: NewtypeStruct(4),
        seq: vec![89, 734, 3453, 124, 0],
        tuple: (8, 888),
        map,
        plain_struct: PlainStruct { a: 12, b: 13 },
        enums: vec![
            Enum::UnitVariant,
            Enum::NewtypeVariant(8),
            Enum::TupleVariant(144, 288),
            Enum::StructVariant { x: 77, y: 666 },
        ],
    };

    // Borrowed &str fields only survive utf-8
    for recording in [StringRecording::Length, StringRecording::Token] {
        let options = SerializerOptions::new(StringEncoding::Utf8, recording);
        let bytes = luminpack_serde::to_bytes(&data, &options).context("Failed to serialize")?;
        let decoded: SerdeDataModel = luminpack_serde::from_bytes(&bytes, &options).context("Failed to deserialize")?;
        ensure!(data == decoded, "data model did not survive {:?}", options);
        println!("data model, {:?}: {} bytes", options, bytes.len());
    }

    let msg = Message {
        version: 1,
        cats: vec![
            Cat { name: "Jessica".to_owned(), species: Species::PrionailurusViverrinus },
            Cat { name: "Wantan".to_owned(), species: Species::LynxLynx },
            Cat { name: "Sphinx".to_owned(), species: Species::FelisCatus },
            Cat { name: "Chandra".to_owned(), species: Species::PrionailurusViverrinus },
        ],
    };

    for encoding in [StringEncoding::Utf8, StringEncoding::Utf16] {
        for recording in [StringRecording::Length, StringRecording::Token] {
            let options = SerializerOptions::new(encoding, recording);
            let bytes = luminpack_serde::to_bytes(&msg, &options).context("Failed to serialize cats")?;
            let decoded: Message = luminpack_serde::from_bytes(&bytes, &options).context("Failed to deserialize cats")?;
            ensure!(msg == decoded, "cats did not survive {:?}", options);
            println!("luminpack {} {}: {} bytes", encoding, recording, bytes.len());
        }
    }
    let json = serde_json::to_vec(&msg).context("Failed to serialize cats to json")?;
    println!("json: {} bytes", json.len());
    let mut msgpack = Vec::new();
    msg.serialize(&mut rmp_serde::encode::Serializer::new(&mut msgpack).with_struct_map())
        .context("Failed to serialize cats to msgpack")?;
    println!("msgpack, self-describing: {} bytes", msgpack.len());
    let compact = rmp_serde::to_vec(&msg).context("Failed to serialize cats to msgpack")?;
    println!("msgpack, positional: {} bytes", compact.len());
    Ok(())
}
