mod document;
pub use document::Document;

mod json;

use uuid::Uuid;

/// A dynamically typed value.
///
/// Rows coming back from a driver, intermediate documents built by the
/// resolver, and filter arguments are all represented as `Value`s.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// Signed 64-bit integer
    I64(i64),

    /// 64-bit float
    F64(f64),

    /// String value
    String(String),

    /// A UUID as returned by the backend. Materialized documents carry UUIDs
    /// as text; this variant only appears on the wire.
    Uuid(Uuid),

    /// Raw bytes as returned by the backend
    Bytes(Vec<u8>),

    /// A list of values
    List(Vec<Value>),

    /// A nested document
    Object(Document),
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F64(v) => Some(v),
            Self::I64(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Document> {
        match self {
            Self::Object(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Document> {
        match self {
            Self::Object(doc) => Some(doc),
            _ => None,
        }
    }

    #[track_caller]
    pub fn expect_object(&self) -> &Document {
        match self {
            Self::Object(doc) => doc,
            _ => panic!("expected object; actual={self:?}"),
        }
    }

    /// Renders the value as text, the way templates see it.
    ///
    /// Null renders as the empty string; lists and objects render as JSON.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(v) => v.to_string(),
            Self::I64(v) => v.to_string(),
            Self::F64(v) => v.to_string(),
            Self::String(v) => v.clone(),
            Self::Uuid(v) => v.hyphenated().to_string(),
            Self::Bytes(v) => String::from_utf8_lossy(v).into_owned(),
            Self::List(_) | Self::Object(_) => self.to_json().to_string(),
        }
    }

    /// Returns a canonical key used to match parent and child rows.
    ///
    /// Values that compare equal across wire representations (a UUID and its
    /// hyphenated text, an integral float and an integer) produce the same key.
    /// Returns `None` for null, lists, and objects.
    pub fn key(&self) -> Option<String> {
        match self {
            Self::Null | Self::List(_) | Self::Object(_) => None,
            Self::Bool(v) => Some(v.to_string()),
            Self::I64(v) => Some(v.to_string()),
            Self::F64(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                Some((*v as i64).to_string())
            }
            Self::F64(v) => Some(v.to_string()),
            Self::String(v) => match Uuid::parse_str(v) {
                Ok(uuid) => Some(uuid.hyphenated().to_string()),
                Err(_) => Some(v.clone()),
            },
            Self::Uuid(v) => Some(v.hyphenated().to_string()),
            Self::Bytes(v) => match Uuid::from_slice(v) {
                Ok(uuid) => Some(uuid.hyphenated().to_string()),
                Err(_) => Some(String::from_utf8_lossy(v).into_owned()),
            },
        }
    }

    /// Returns `true` if the value is null or, for objects, if every leaf is null.
    pub fn is_all_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Object(doc) => doc.values().all(Value::is_all_null),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

impl From<i64> for Value {
    fn from(src: i64) -> Self {
        Self::I64(src)
    }
}

impl From<i32> for Value {
    fn from(src: i32) -> Self {
        Self::I64(src as i64)
    }
}

impl From<f64> for Value {
    fn from(src: f64) -> Self {
        Self::F64(src)
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

impl From<&String> for Value {
    fn from(src: &String) -> Self {
        Self::String(src.clone())
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(src: Uuid) -> Self {
        Self::Uuid(src)
    }
}

impl From<Vec<Value>> for Value {
    fn from(src: Vec<Value>) -> Self {
        Self::List(src)
    }
}

impl From<Document> for Value {
    fn from(src: Document) -> Self {
        Self::Object(src)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(src: Option<T>) -> Self {
        match src {
            Some(value) => value.into(),
            None => Self::Null,
        }
    }
}
