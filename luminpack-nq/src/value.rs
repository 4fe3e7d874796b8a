//! Untyped values as `nq` reads and prints them. What a value means on wire is only decided by the schema it is
//! encoded with.

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i128),
    F32(f32),
    F64(f64),
    Char(char),
    Str(String),
    Array(Vec<Value>),
    Object(Vec<Value>),
    Union(u16, Box<Value>),
}

impl Value {

    pub fn typename(&self) -> &'static str {
        match *self {
            Self::Null         => "null",
            Self::Bool(_)      => "bool",
            Self::Int(_)       => "integer",
            Self::F32(_)       => "f32",
            Self::F64(_)       => "f64",
            Self::Char(_)      => "char",
            Self::Str(_)       => "string",
            Self::Array(_)     => "array",
            Self::Object(_)    => "object",
            Self::Union(_, _)  => "union",
        }
    }

    fn escape(c: char, quote: char) -> String {
        match c {
            '\\'           => "\\\\".to_owned(),
            '\n'           => "\\n".to_owned(),
            '\t'           => "\\t".to_owned(),
            '\r'           => "\\r".to_owned(),
            '\0'           => "\\0".to_owned(),
            c if c == quote => format!("\\{}", c),
            c              => c.to_string(),
        }
    }

    fn block(f: &mut std::fmt::Formatter<'_>, open: &str, close: &str, values: &[Value]) -> std::fmt::Result {
        if values.is_empty() {
            return write!(f, "{}{}", open, close);
        }
        write!(f, "{}\n{}\n{}", open, values.iter()
            .flat_map(|v| format!("{},", v).lines().map(|line| format!("  {}", line)).collect::<Vec<String>>())
            .collect::<Vec<String>>().join("\n"), close)
    }

}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null         => f.write_str("null"),
            Value::Bool(true)   => f.write_str("true"),
            Value::Bool(false)  => f.write_str("false"),
            Value::Int(v)       => write!(f, "{}", v),
            Value::F32(v)       => write!(f, "{:?}", v),
            Value::F64(v)       => write!(f, "{:?}", v),
            Value::Char(c)      => write!(f, "'{}'", Self::escape(*c, '\'')),
            Value::Str(s)       => write!(f, "\"{}\"", s.chars().map(|c| Self::escape(c, '"')).collect::<String>()),
            Value::Array(v)     => Self::block(f, "[", "]", v),
            Value::Object(v)    => Self::block(f, "(", ")", v),
            Value::Union(t, v)  => write!(f, "#{} {}", t, v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let value = Value::Object(vec![
            Value::Int(-3),
            Value::Str("say \"hi\"\n".to_owned()),
            Value::Array(vec![Value::F64(1.0), Value::Null]),
            Value::Array(vec![]),
            Value::Union(300, Box::new(Value::Char('\''))),
        ]);
        let expected = "(\n  -3,\n  \"say \\\"hi\\\"\\n\",\n  [\n    1.0,\n    null,\n  ],\n  [],\n  #300 '\\'',\n)";
        assert_eq!(expected, value.to_string());
    }

}
