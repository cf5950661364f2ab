use std::io::{ErrorKind, Read, Write};

use serde::{Deserialize, Serialize};

use crate::types::error::{DatabaseError, Result};

/// Column type tags as persisted in schema rows. Strings are likely to be
/// the most common type, so `Str` gets tag 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Str,
    Int,
    Real,
    Null,
    Text,
    Blob,
    JsonObject,
    JsonArray,
}

impl DataType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DataType::Str),
            1 => Some(DataType::Int),
            2 => Some(DataType::Real),
            3 => Some(DataType::Null),
            4 => Some(DataType::Text),
            5 => Some(DataType::Blob),
            6 => Some(DataType::JsonObject),
            7 => Some(DataType::JsonArray),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            DataType::Str => 0,
            DataType::Int => 1,
            DataType::Real => 2,
            DataType::Null => 3,
            DataType::Text => 4,
            DataType::Blob => 5,
            DataType::JsonObject => 6,
            DataType::JsonArray => 7,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::Str => "Str",
            DataType::Int => "Int",
            DataType::Real => "Real",
            DataType::Null => "Null",
            DataType::Text => "Text",
            DataType::Blob => "Blob",
            DataType::JsonObject => "JsonObject",
            DataType::JsonArray => "JsonArray",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int(i64),
    Real(f64),
    Str(String),
    Text(String),
    Blob(Vec<u8>),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Int(_) => DataType::Int,
            Value::Real(_) => DataType::Real,
            Value::Str(_) => DataType::Str,
            Value::Text(_) => DataType::Text,
            Value::Blob(_) => DataType::Blob,
            Value::Array(_) => DataType::JsonArray,
            Value::Object(_) => DataType::JsonObject,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value may be stored in a column of the given declared
    /// type. `Null` is accepted for every column; `Str` and `Text` are both
    /// strings on the wire and accept each other.
    pub fn conforms_to(&self, declared: DataType) -> bool {
        if self.is_null() {
            return true;
        }
        match (self.data_type(), declared) {
            (DataType::Str, DataType::Text) | (DataType::Text, DataType::Str) => true,
            (actual, declared) => actual == declared,
        }
    }

    fn to_msgpack(&self) -> rmpv::Value {
        match self {
            Value::Null => rmpv::Value::Nil,
            Value::Int(i) => rmpv::Value::from(*i),
            Value::Real(r) => rmpv::Value::F64(*r),
            Value::Str(s) | Value::Text(s) => rmpv::Value::String(s.clone().into()),
            Value::Blob(b) => rmpv::Value::Binary(b.clone()),
            Value::Array(items) => {
                rmpv::Value::Array(items.iter().map(Value::to_msgpack).collect())
            }
            Value::Object(entries) => rmpv::Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (rmpv::Value::String(k.clone().into()), v.to_msgpack()))
                    .collect(),
            ),
        }
    }

    /// Shape-based conversion from the MessagePack object model. Strings
    /// come back as `Str`; the row codec retags them as `Text` when the
    /// declared column type says so. The error is a description of the
    /// offending shape, contextualized by the caller.
    fn from_msgpack(value: rmpv::Value) -> std::result::Result<Value, String> {
        match value {
            rmpv::Value::Nil => Ok(Value::Null),
            rmpv::Value::Integer(i) => i
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| format!("integer {} out of i64 range", i)),
            rmpv::Value::F32(r) => Ok(Value::Real(r as f64)),
            rmpv::Value::F64(r) => Ok(Value::Real(r)),
            rmpv::Value::String(s) => s
                .into_str()
                .map(Value::Str)
                .ok_or_else(|| "non-UTF-8 string".to_string()),
            rmpv::Value::Binary(b) => Ok(Value::Blob(b)),
            rmpv::Value::Array(items) => items
                .into_iter()
                .map(Value::from_msgpack)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::Array),
            rmpv::Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| {
                    let key = match k {
                        rmpv::Value::String(s) => {
                            s.into_str().ok_or_else(|| "non-UTF-8 map key".to_string())
                        }
                        other => Err(format!("non-string map key {}", other)),
                    }?;
                    Ok((key, Value::from_msgpack(v)?))
                })
                .collect::<std::result::Result<Vec<_>, String>>()
                .map(Value::Object),
            other => Err(format!("unsupported object type {}", other)),
        }
    }
}

/// Append one self-delimited object to the sink.
pub fn encode_value<W: Write>(sink: &mut W, value: &Value) -> Result<()> {
    rmpv::encode::write_value(sink, &value.to_msgpack())
        .map_err(|e| DatabaseError::Io(std::io::Error::other(e.to_string())))
}

/// Consume one object from the source and check it against the declared
/// column type. A short source yields `Truncated`; a decoded value of the
/// wrong shape yields `TypeMismatch` naming the column.
pub fn decode_value<R: Read>(source: &mut R, column: &str, declared: DataType) -> Result<Value> {
    let raw = rmpv::decode::read_value(source).map_err(|e| decode_error(e, column))?;
    let value = Value::from_msgpack(raw).map_err(|got| DatabaseError::TypeMismatch {
        column: column.to_string(),
        expected: declared.to_string(),
        got,
    })?;

    // Both string flavors share a wire representation
    let value = match (declared, value) {
        (DataType::Text, Value::Str(s)) => Value::Text(s),
        (_, value) => value,
    };

    if !value.conforms_to(declared) {
        return Err(DatabaseError::TypeMismatch {
            column: column.to_string(),
            expected: declared.to_string(),
            got: value.data_type().to_string(),
        });
    }
    Ok(value)
}

fn decode_error(err: rmpv::decode::Error, column: &str) -> DatabaseError {
    match err {
        rmpv::decode::Error::InvalidMarkerRead(e) | rmpv::decode::Error::InvalidDataRead(e)
            if e.kind() == ErrorKind::UnexpectedEof =>
        {
            DatabaseError::Truncated {
                what: format!("value for column '{}'", column),
            }
        }
        other => DatabaseError::Io(std::io::Error::other(other.to_string())),
    }
}
