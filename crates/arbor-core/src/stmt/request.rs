use serde::{Deserialize, Serialize};

/// A list or count request.
///
/// ```
/// use arbor_core::stmt::Request;
///
/// let request: Request = serde_json::from_value(serde_json::json!({
///     "model": "Post",
///     "preset": "card",
///     "filters": {"title__cnt": "rust"},
///     "sorts": ["created_at DESC"],
///     "limit": 20,
/// }))
/// .unwrap();
///
/// assert_eq!(request.offset, 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub model: String,

    /// Preset name. Required for listing, ignored when counting.
    #[serde(default)]
    pub preset: String,

    /// Nested boolean filter document
    #[serde(default)]
    pub filters: serde_json::Value,

    /// `"path.column [ASC|DESC]"` entries
    #[serde(default)]
    pub sorts: Vec<String>,

    #[serde(default)]
    pub offset: u64,

    /// `0` means no limit
    #[serde(default)]
    pub limit: u64,

    /// Locale used for localized fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl Request {
    pub fn new(model: impl Into<String>, preset: impl Into<String>) -> Request {
        Request {
            model: model.into(),
            preset: preset.into(),
            ..Request::default()
        }
    }

    pub fn filters(mut self, filters: serde_json::Value) -> Request {
        self.filters = filters;
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Request {
        self.sorts.push(sort.into());
        self
    }

    pub fn offset(mut self, offset: u64) -> Request {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: u64) -> Request {
        self.limit = limit;
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Request {
        self.locale = Some(locale.into());
        self
    }
}
