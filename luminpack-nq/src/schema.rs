//! Schemas describe the layout of a message, which the wire format itself does not carry. Encoding and size
//! calculation share one code path through [`Sink`], decoding drives a [`Reader`].

use crate::value::Value;
use anyhow::{anyhow, bail, Result};
use luminpack::{MemberCount, ObjectHeader, Reader, Sink};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    String,
    Array(Box<Schema>),
    Object(Vec<Schema>),
    Union(Vec<(u16, Schema)>),
    Nullable(Box<Schema>),
}

impl Schema {

    /// Scalars have no null form of their own, a nullable scalar is prefixed with a presence byte.
    fn is_scalar(&self) -> bool {
        !matches!(self, Schema::String | Schema::Array(_) | Schema::Object(_) | Schema::Union(_) | Schema::Nullable(_))
    }

    fn case<'c>(&self, cases: &'c [(u16, Schema)], tag: u16) -> Result<&'c Schema> {
        cases.iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, schema)| schema)
            .ok_or_else(|| anyhow!("{} has no case {}", self, tag))
    }

}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Bool        => f.write_str("bool"),
            Schema::I8          => f.write_str("i8"),
            Schema::I16         => f.write_str("i16"),
            Schema::I32         => f.write_str("i32"),
            Schema::I64         => f.write_str("i64"),
            Schema::U8          => f.write_str("u8"),
            Schema::U16         => f.write_str("u16"),
            Schema::U32         => f.write_str("u32"),
            Schema::U64         => f.write_str("u64"),
            Schema::F32         => f.write_str("f32"),
            Schema::F64         => f.write_str("f64"),
            Schema::Char        => f.write_str("char"),
            Schema::String      => f.write_str("string"),
            Schema::Array(e)    => write!(f, "[{}]", e),
            Schema::Object(m)   => write!(f, "({})", m.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")),
            Schema::Union(c)    => write!(f, "<{}>", c.iter().map(|(t, s)| format!("{}: {}", t, s)).collect::<Vec<_>>().join(" | ")),
            Schema::Nullable(s) => write!(f, "{}?", s),
        }
    }
}

fn int<T: TryFrom<i128>>(value: i128, schema: &Schema) -> Result<T> {
    T::try_from(value).map_err(|_| anyhow!("{} does not fit into {}", value, schema))
}

/// Encodes `value` laid out as `schema`. With an `Evaluator` as sink this computes the encoded size instead.
pub fn encode<S: Sink>(schema: &Schema, value: &Value, sink: &mut S) -> Result<()> {
    match (schema, value) {
        (Schema::Nullable(inner), Value::Null) => encode_null(inner, sink)?,
        (Schema::Nullable(inner), value)       => {
            if inner.is_scalar() {
                sink.write_unmanaged(&1u8)?;
            }
            encode(inner, value, sink)?;
        },
        (Schema::Bool, Value::Bool(b))         => sink.write_unmanaged(&(*b as u8))?,
        (Schema::I8, Value::Int(i))            => sink.write_unmanaged(&int::<i8>(*i, schema)?)?,
        (Schema::I16, Value::Int(i))           => sink.write_unmanaged(&int::<i16>(*i, schema)?)?,
        (Schema::I32, Value::Int(i))           => sink.write_unmanaged(&int::<i32>(*i, schema)?)?,
        (Schema::I64, Value::Int(i))           => sink.write_unmanaged(&int::<i64>(*i, schema)?)?,
        (Schema::U8, Value::Int(i))            => sink.write_unmanaged(&int::<u8>(*i, schema)?)?,
        (Schema::U16, Value::Int(i))           => sink.write_unmanaged(&int::<u16>(*i, schema)?)?,
        (Schema::U32, Value::Int(i))           => sink.write_unmanaged(&int::<u32>(*i, schema)?)?,
        (Schema::U64, Value::Int(i))           => sink.write_unmanaged(&int::<u64>(*i, schema)?)?,
        (Schema::F32, Value::F32(v))           => sink.write_unmanaged(v)?,
        (Schema::F32, Value::F64(v))           => sink.write_unmanaged(&(*v as f32))?,
        (Schema::F32, Value::Int(i))           => sink.write_unmanaged(&(*i as f32))?,
        (Schema::F64, Value::F64(v))           => sink.write_unmanaged(v)?,
        (Schema::F64, Value::F32(v))           => sink.write_unmanaged(&f64::from(*v))?,
        (Schema::F64, Value::Int(i))           => sink.write_unmanaged(&(*i as f64))?,
        (Schema::Char, Value::Char(c))         => sink.write_unmanaged(&u32::from(*c))?,
        (Schema::String, Value::Str(s))        => sink.write_string(Some(s.as_str()))?,
        (Schema::Array(element), Value::Array(values)) => {
            sink.write_collection_header(values.len())?;
            for value in values {
                encode(element, value, sink)?;
            }
        },
        (Schema::Object(members), Value::Object(values)) if members.len() == values.len() => {
            let count = MemberCount::checked(members.len()).ok_or_else(|| anyhow!("{} has too many members", schema))?;
            sink.write_object_header(count)?;
            for (member, value) in members.iter().zip(values) {
                encode(member, value, sink)?;
            }
        },
        (Schema::Union(cases), Value::Union(tag, value)) => {
            let case = schema.case(cases, *tag)?;
            sink.write_union_header(*tag)?;
            encode(case, value, sink)?;
        },
        (schema, value) => bail!("{} value does not match schema {}", value.typename(), schema),
    }
    Ok(())
}

fn encode_null<S: Sink>(schema: &Schema, sink: &mut S) -> Result<()> {
    match schema {
        Schema::String      => sink.write_string(None)?,
        Schema::Array(_)    => sink.write_null_collection_header()?,
        Schema::Object(_)   => sink.write_null_object_header()?,
        Schema::Union(_)    => sink.write_null_union_header()?,
        Schema::Nullable(_) => bail!("{}? is nullable twice", schema),
        _                   => sink.write_unmanaged(&0u8)?,
    }
    Ok(())
}

/// Decodes a value laid out as `schema`.
pub fn decode(schema: &Schema, reader: &mut Reader<'_>) -> Result<Value> {
    read(schema, false, reader)
}

fn read(schema: &Schema, nullable: bool, reader: &mut Reader<'_>) -> Result<Value> {
    let absent = || -> Result<Value> {
        if nullable {
            Ok(Value::Null)
        } else {
            Err(anyhow!("null where {} was required", schema))
        }
    };
    Ok(match schema {
        Schema::Nullable(inner) if inner.is_scalar() => match reader.read_unmanaged::<u8>()? {
            0 => Value::Null,
            1 => read(inner, false, reader)?,
            b => bail!("invalid presence byte {:#x}", b),
        },
        Schema::Nullable(inner) => read(inner, true, reader)?,
        Schema::Bool   => match reader.read_unmanaged::<u8>()? {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            b => bail!("invalid bool {:#x}", b),
        },
        Schema::I8     => Value::Int(reader.read_unmanaged::<i8>()?.into()),
        Schema::I16    => Value::Int(reader.read_unmanaged::<i16>()?.into()),
        Schema::I32    => Value::Int(reader.read_unmanaged::<i32>()?.into()),
        Schema::I64    => Value::Int(reader.read_unmanaged::<i64>()?.into()),
        Schema::U8     => Value::Int(reader.read_unmanaged::<u8>()?.into()),
        Schema::U16    => Value::Int(reader.read_unmanaged::<u16>()?.into()),
        Schema::U32    => Value::Int(reader.read_unmanaged::<u32>()?.into()),
        Schema::U64    => Value::Int(reader.read_unmanaged::<u64>()?.into()),
        Schema::F32    => Value::F32(reader.read_unmanaged()?),
        Schema::F64    => Value::F64(reader.read_unmanaged()?),
        Schema::Char   => {
            let scalar = reader.read_unmanaged::<u32>()?;
            Value::Char(char::from_u32(scalar).ok_or_else(|| anyhow!("{:#x} is not a unicode scalar value", scalar))?)
        },
        Schema::String => match reader.read_string()? {
            Some(s) => Value::Str(s),
            None    => absent()?,
        },
        Schema::Array(element) => match reader.read_collection_header()? {
            Some(len) => {
                let mut values = Vec::with_capacity(len.min(reader.remaining()));
                for _ in 0..len {
                    values.push(read(element, false, reader)?);
                }
                Value::Array(values)
            },
            None => absent()?,
        },
        Schema::Object(members) => match reader.read_object_header()? {
            ObjectHeader::Members(n) if n as usize == members.len() => {
                Value::Object(members.iter().map(|m| read(m, false, reader)).collect::<Result<_>>()?)
            },
            ObjectHeader::Null => absent()?,
            other => bail!("expected {} members for {}, found {:?}", members.len(), schema, other),
        },
        Schema::Union(cases) => match reader.read_union_header()? {
            Some(tag) => Value::Union(tag, Box::new(read(schema.case(cases, tag)?, false, reader)?)),
            None      => absent()?,
        },
    })
}
