use super::Value;

use indexmap::IndexMap;

/// An insertion-ordered map of keys to values.
///
/// Documents are the unit the resolver assembles and returns: one per result
/// row, with nested documents for joined relations and lists of documents for
/// has-many relations.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Document {
        Document::default()
    }

    pub fn with_capacity(capacity: usize) -> Document {
        Document {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Builds a nested document from a flat `dotted.key -> value` map.
    ///
    /// Each key is split on `.`; intermediate documents are created as needed.
    /// If a key names a prefix that already holds a non-object value, the
    /// value is replaced by a document.
    pub fn fold(flat: impl IntoIterator<Item = (String, Value)>) -> Document {
        let mut root = Document::new();

        for (key, value) in flat {
            let mut segments = key.split('.').peekable();
            let mut doc = &mut root;

            while let Some(segment) = segments.next() {
                if segments.peek().is_none() {
                    doc.insert(segment, value);
                    break;
                }

                let entry = doc
                    .fields
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Document::new()));

                if !entry.is_object() {
                    *entry = Value::Object(Document::new());
                }

                doc = entry.as_object_mut().unwrap();
            }
        }

        root
    }

    /// The inverse of [`Document::fold`]: every non-object leaf becomes one
    /// `dotted.key -> value` entry.
    pub fn flatten(&self) -> IndexMap<String, Value> {
        let mut out = IndexMap::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut IndexMap<String, Value>) {
        for (key, value) in &self.fields {
            let key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };

            match value {
                Value::Object(doc) => doc.flatten_into(&key, out),
                value => {
                    out.insert(key, value.clone());
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.get_mut(key)
    }

    /// Inserts a value, keeping the position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Removes a key, preserving the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Value)> {
        self.fields.iter_mut()
    }

    /// Looks up a dotted path, descending through nested documents.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        self.get_segments(path.split('.'))
    }

    pub fn get_segments<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Option<&Value> {
        let mut segments = segments.into_iter();
        let mut value = self.get(segments.next()?)?;

        for segment in segments {
            value = value.as_object()?.get(segment)?;
        }

        Some(value)
    }

    /// Returns the nested document at `segments`, or `None` if any step is
    /// missing or not a document. An empty path returns `self`.
    pub fn doc_at_mut<S: AsRef<str>>(&mut self, segments: &[S]) -> Option<&mut Document> {
        let mut doc = self;

        for segment in segments {
            doc = doc.get_mut(segment.as_ref())?.as_object_mut()?;
        }

        Some(doc)
    }

    pub fn doc_at<S: AsRef<str>>(&self, segments: &[S]) -> Option<&Document> {
        let mut doc = self;

        for segment in segments {
            doc = doc.get(segment.as_ref())?.as_object()?;
        }

        Some(doc)
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Document {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
