use crate::{Error, Result, Value};

use uuid::Uuid;

/// Declared logical type of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ColumnTy {
    #[default]
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Uuid,
    Datetime,
    Date,
    Json,
}

impl ColumnTy {
    /// Parses a type name as written in a model definition.
    pub fn parse(name: &str) -> Result<ColumnTy> {
        Ok(match name.to_ascii_lowercase().as_str() {
            "string" | "text" | "varchar" | "char" => ColumnTy::String,
            "int" | "integer" | "bigint" | "smallint" | "i64" => ColumnTy::Integer,
            "float" | "double" | "real" | "f64" => ColumnTy::Float,
            "decimal" | "numeric" | "money" => ColumnTy::Decimal,
            "bool" | "boolean" => ColumnTy::Boolean,
            "uuid" => ColumnTy::Uuid,
            "datetime" | "timestamp" | "timestamptz" => ColumnTy::Datetime,
            "date" => ColumnTy::Date,
            "json" | "jsonb" => ColumnTy::Json,
            _ => return Err(Error::schema(format!("unknown column type `{name}`"))),
        })
    }

    /// Returns `true` if `name` is a column type name rather than a field kind.
    pub fn is_type_name(name: &str) -> bool {
        ColumnTy::parse(name).is_ok()
    }

    /// Types the driver cannot decode natively are selected as text.
    pub fn selects_as_text(self) -> bool {
        matches!(
            self,
            ColumnTy::Datetime | ColumnTy::Date | ColumnTy::Decimal | ColumnTy::Json
        )
    }

    /// SQL type a text parameter is cast to when compared against a column of
    /// this type.
    pub fn param_cast(self) -> Option<&'static str> {
        match self {
            ColumnTy::Datetime => Some("timestamptz"),
            ColumnTy::Date => Some("date"),
            ColumnTy::Decimal => Some("numeric"),
            ColumnTy::Json => Some("jsonb"),
            _ => None,
        }
    }

    pub fn is_textual(self) -> bool {
        matches!(self, ColumnTy::String)
    }

    /// Normalizes a value decoded from the backend to this type.
    ///
    /// Values that cannot be converted are returned unchanged.
    pub fn coerce(self, value: Value) -> Value {
        match (self, value) {
            (_, Value::Null) => Value::Null,

            (ColumnTy::String, Value::Uuid(v)) => Value::String(v.hyphenated().to_string()),
            (ColumnTy::String, Value::Bytes(v)) => bytes_to_text(v),
            (ColumnTy::String, v @ (Value::Bool(_) | Value::I64(_) | Value::F64(_))) => {
                Value::String(v.to_text())
            }

            (ColumnTy::Integer, Value::F64(v)) if v.fract() == 0.0 => Value::I64(v as i64),
            (ColumnTy::Integer, Value::String(v)) => match v.trim().parse::<i64>() {
                Ok(n) => Value::I64(n),
                Err(_) => Value::String(v),
            },

            (ColumnTy::Float, Value::I64(v)) => Value::F64(v as f64),
            (ColumnTy::Float, Value::String(v)) => match v.trim().parse::<f64>() {
                Ok(n) => Value::F64(n),
                Err(_) => Value::String(v),
            },

            (ColumnTy::Boolean, Value::I64(v)) => Value::Bool(v != 0),
            (ColumnTy::Boolean, Value::String(v)) => match parse_bool(&v) {
                Some(b) => Value::Bool(b),
                None => Value::String(v),
            },

            (ColumnTy::Uuid, Value::Uuid(v)) => Value::String(v.hyphenated().to_string()),
            (ColumnTy::Uuid, Value::Bytes(v)) => match Uuid::from_slice(&v) {
                Ok(uuid) => Value::String(uuid.hyphenated().to_string()),
                Err(_) => bytes_to_text(v),
            },
            (ColumnTy::Uuid, Value::String(v)) => match Uuid::parse_str(&v) {
                Ok(uuid) => Value::String(uuid.hyphenated().to_string()),
                Err(_) => Value::String(v),
            },

            (ColumnTy::Json, Value::String(v)) => match serde_json::from_str::<serde_json::Value>(&v) {
                Ok(json) => Value::from(json),
                Err(_) => Value::String(v),
            },

            (_, Value::Bytes(v)) => bytes_to_text(v),
            (_, value) => value,
        }
    }

    /// Converts a filter argument to the representation bound for this type.
    ///
    /// UUID text becomes a UUID, numeric text becomes a number. Arguments
    /// that do not convert are passed through and left for the backend to
    /// reject.
    pub fn coerce_arg(self, value: Value) -> Value {
        match (self, value) {
            (ColumnTy::Uuid, Value::String(v)) => match Uuid::parse_str(&v) {
                Ok(uuid) => Value::Uuid(uuid),
                Err(_) => Value::String(v),
            },
            (ColumnTy::Integer, Value::String(v)) => match v.trim().parse::<i64>() {
                Ok(n) => Value::I64(n),
                Err(_) => Value::String(v),
            },
            (ColumnTy::Integer, Value::F64(v)) if v.fract() == 0.0 => Value::I64(v as i64),
            (ColumnTy::Float, Value::String(v)) => match v.trim().parse::<f64>() {
                Ok(n) => Value::F64(n),
                Err(_) => Value::String(v),
            },
            (ColumnTy::Float, Value::I64(v)) => Value::F64(v as f64),
            (ColumnTy::Boolean, Value::String(v)) => match parse_bool(&v) {
                Some(b) => Value::Bool(b),
                None => Value::String(v),
            },
            (ColumnTy::String, v @ (Value::I64(_) | Value::F64(_) | Value::Bool(_))) => {
                Value::String(v.to_text())
            }
            (
                ColumnTy::Datetime | ColumnTy::Date | ColumnTy::Decimal | ColumnTy::Json,
                v @ (Value::I64(_) | Value::F64(_) | Value::Bool(_)),
            ) => Value::String(v.to_text()),
            (ColumnTy::Json, v @ (Value::List(_) | Value::Object(_))) => Value::String(v.to_text()),
            (_, value) => value,
        }
    }
}

fn parse_bool(src: &str) -> Option<bool> {
    match src.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Some(true),
        "false" | "f" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn bytes_to_text(bytes: Vec<u8>) -> Value {
    match String::from_utf8(bytes) {
        Ok(text) => Value::String(text),
        Err(err) => Value::String(String::from_utf8_lossy(err.as_bytes()).into_owned()),
    }
}
