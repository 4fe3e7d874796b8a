use nom::{
    character::complete::{char, digit1, none_of, one_of},
    Finish,
    IResult,
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    multi::{fold_many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    branch::alt,
    bytes::complete::{tag, take_while},
};
use crate::schema::Schema;
use crate::value::Value;
use anyhow::{anyhow, Result};

const WHITESPACE: &str = " \t\r\n";

fn white(i: &str) -> IResult<&str, &str> {
    take_while(move |c| WHITESPACE.contains(c))(i)
}

fn ws<'a, O>(inner: impl FnMut(&'a str) -> IResult<&'a str, O>) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    delimited(white, inner, white)
}

/// Closes a list, tolerating a trailing comma.
fn close<'a>(c: char) -> impl FnMut(&'a str) -> IResult<&'a str, char> {
    preceded(opt(ws(char(','))), ws(char(c)))
}

fn tag_number(i: &str) -> IResult<&str, u16> {
    map_res(digit1, |n: &str| n.parse())(i)
}

fn scalar(i: &str) -> IResult<&str, Schema> {
    alt((
        value(Schema::Bool, tag("bool")),
        value(Schema::I8, tag("i8")),
        value(Schema::I16, tag("i16")),
        value(Schema::I32, tag("i32")),
        value(Schema::I64, tag("i64")),
        value(Schema::U8, tag("u8")),
        value(Schema::U16, tag("u16")),
        value(Schema::U32, tag("u32")),
        value(Schema::U64, tag("u64")),
        value(Schema::F32, tag("f32")),
        value(Schema::F64, tag("f64")),
        value(Schema::Char, tag("char")),
        value(Schema::String, tag("string")),
    ))(i)
}

fn array_schema(i: &str) -> IResult<&str, Schema> {
    map(delimited(ws(char('[')), schema, ws(char(']'))), |s| Schema::Array(Box::new(s)))(i)
}

fn object_schema(i: &str) -> IResult<&str, Schema> {
    map(delimited(ws(char('(')), separated_list0(ws(char(',')), schema), close(')')), Schema::Object)(i)
}

fn union_schema(i: &str) -> IResult<&str, Schema> {
    map(
        delimited(
            ws(char('<')),
            separated_list1(ws(char('|')), separated_pair(ws(tag_number), char(':'), schema)),
            ws(char('>')),
        ),
        Schema::Union,
    )(i)
}

fn schema(i: &str) -> IResult<&str, Schema> {
    map(
        pair(ws(alt((scalar, array_schema, object_schema, union_schema))), opt(ws(char('?')))),
        |(s, nullable)| match nullable {
            Some(_) => Schema::Nullable(Box::new(s)),
            None    => s,
        },
    )(i)
}

fn escape(i: &str) -> IResult<&str, char> {
    preceded(char('\\'), alt((
        value('\\', char('\\')),
        value('"', char('"')),
        value('\'', char('\'')),
        value('\n', char('n')),
        value('\t', char('t')),
        value('\r', char('r')),
        value('\0', char('0')),
    )))(i)
}

fn string(i: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        fold_many0(alt((escape, none_of("\\\""))), String::new, |mut s, c| {
            s.push(c);
            s
        }),
        char('"'),
    )(i)
}

fn character(i: &str) -> IResult<&str, char> {
    delimited(char('\''), alt((escape, none_of("\\'"))), char('\''))(i)
}

fn number(i: &str) -> IResult<&str, Value> {
    let text = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )));
    map_res(text, |n: &str| if n.contains(&['.', 'e', 'E'][..]) {
        n.parse().map(Value::F64).map_err(|_| ())
    } else {
        n.parse().map(Value::Int).map_err(|_| ())
    })(i)
}

fn keyword(i: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Null, tag("null")),
        value(Value::Bool(true), tag("true")),
        value(Value::Bool(false), tag("false")),
    ))(i)
}

fn lum_value(i: &str) -> IResult<&str, Value> {
    ws(alt((
        keyword,
        number,
        map(character, Value::Char),
        map(string, Value::Str),
        map(preceded(char('['), terminated(separated_list0(ws(char(',')), lum_value), close(']'))), Value::Array),
        map(preceded(char('('), terminated(separated_list0(ws(char(',')), lum_value), close(')'))), Value::Object),
        map(preceded(char('#'), pair(tag_number, lum_value)), |(t, v)| Value::Union(t, Box::new(v))),
    )))(i)
}

pub fn parse_schema(i: &str) -> Result<Schema> {
    Ok(all_consuming(schema)(i).finish().map_err(|e| anyhow!("Invalid schema: {}", e))?.1)
}

pub fn parse_value(i: &str) -> Result<Value> {
    Ok(all_consuming(lum_value)(i).finish().map_err(|e| anyhow!("Invalid value: {}", e))?.1)
}
