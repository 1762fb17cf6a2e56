use arbor_core::{Error, Result, Value as CoreValue};
use postgres_types::{accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type};
use tokio_postgres::Row;
use uuid::Uuid;

/// A bound parameter.
#[derive(Debug)]
pub struct Value(CoreValue);

impl From<CoreValue> for Value {
    fn from(value: CoreValue) -> Self {
        Self(value)
    }
}

impl Value {
    /// The PostgreSQL type the parameter is declared as.
    pub(crate) fn ty(&self) -> Type {
        match &self.0 {
            CoreValue::Bool(_) => Type::BOOL,
            CoreValue::I64(_) => Type::INT8,
            CoreValue::F64(_) => Type::FLOAT8,
            CoreValue::Uuid(_) => Type::UUID,
            CoreValue::Bytes(_) => Type::BYTEA,
            // Untyped NULL; lists and objects are bound as their JSON text
            CoreValue::Null | CoreValue::String(_) | CoreValue::List(_) | CoreValue::Object(_) => Type::TEXT,
        }
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn std::error::Error + Sync + Send>>
    where
        Self: Sized,
    {
        match &self.0 {
            CoreValue::Null => Ok(IsNull::Yes),
            CoreValue::Bool(value) => value.to_sql(ty, out),
            CoreValue::I64(value) => match *ty {
                Type::INT2 => i16::try_from(*value)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*value)?.to_sql(ty, out),
                _ => value.to_sql(ty, out),
            },
            CoreValue::F64(value) => match *ty {
                Type::FLOAT4 => (*value as f32).to_sql(ty, out),
                _ => value.to_sql(ty, out),
            },
            CoreValue::String(value) => value.to_sql(ty, out),
            CoreValue::Uuid(value) => value.to_sql(ty, out),
            CoreValue::Bytes(value) => value.to_sql(ty, out),
            value @ (CoreValue::List(_) | CoreValue::Object(_)) => value.to_text().to_sql(ty, out),
        }
    }

    accepts!(BOOL, INT2, INT4, INT8, FLOAT4, FLOAT8, TEXT, VARCHAR, UUID, BYTEA);
    to_sql_checked!();
}

/// JSON and JSONB columns, decoded as their text.
struct JsonText(String);

impl<'a> FromSql<'a> for JsonText {
    fn from_sql(
        ty: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        let text = match *ty {
            // JSONB is prefixed by a format version
            Type::JSONB => match raw.split_first() {
                Some((&1, rest)) => rest,
                _ => return Err("unsupported JSONB encoding version".into()),
            },
            _ => raw,
        };

        Ok(JsonText(std::str::from_utf8(text)?.to_string()))
    }

    accepts!(JSON, JSONB);
}

/// Converts the value at `index` of a row.
///
/// Integers widen to `I64` and floats to `F64`. Text-like types and JSON
/// decode as strings. Other types (timestamps, decimals) are expected to be
/// selected as text; they decode as null.
pub(crate) fn from_row(row: &Row, index: usize) -> Result<CoreValue> {
    let column = &row.columns()[index];
    let ty = column.type_();

    let value = match *ty {
        Type::BOOL => get::<bool>(row, index)?.map(CoreValue::Bool),
        Type::INT2 => get::<i16>(row, index)?.map(|v| CoreValue::I64(v.into())),
        Type::INT4 => get::<i32>(row, index)?.map(|v| CoreValue::I64(v.into())),
        Type::INT8 => get::<i64>(row, index)?.map(CoreValue::I64),
        Type::OID => get::<u32>(row, index)?.map(|v| CoreValue::I64(v.into())),
        Type::FLOAT4 => get::<f32>(row, index)?.map(|v| CoreValue::F64(v.into())),
        Type::FLOAT8 => get::<f64>(row, index)?.map(CoreValue::F64),
        Type::UUID => get::<Uuid>(row, index)?.map(CoreValue::Uuid),
        Type::BYTEA => get::<Vec<u8>>(row, index)?.map(CoreValue::Bytes),
        Type::JSON | Type::JSONB => get::<JsonText>(row, index)?.map(|json| CoreValue::String(json.0)),
        _ if <String as FromSql<'_>>::accepts(ty) => get::<String>(row, index)?.map(CoreValue::String),
        _ => {
            tracing::warn!(column = column.name(), %ty, "cannot decode column; select it as text");
            None
        }
    };

    Ok(value.unwrap_or(CoreValue::Null))
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, index: usize) -> Result<Option<T>> {
    row.try_get(index).map_err(Error::query_execution)
}
