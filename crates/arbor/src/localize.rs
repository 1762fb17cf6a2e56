//! Translation of localized fields.

use arbor_core::Value;

use indexmap::IndexMap;

/// Looks up translations for localized field values.
pub trait Localizer: std::fmt::Debug + Send + Sync + 'static {
    /// Returns the translation of `text` in `locale`, if one exists.
    fn translate(&self, locale: &str, text: &str) -> Option<String>;
}

/// An in-memory `locale -> key -> text` catalog.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    locales: IndexMap<String, IndexMap<String, String>>,
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog::default()
    }

    pub fn insert(
        &mut self,
        locale: impl Into<String>,
        key: impl Into<String>,
        text: impl Into<String>,
    ) -> &mut Self {
        self.locales
            .entry(locale.into())
            .or_default()
            .insert(key.into(), text.into());
        self
    }
}

impl Localizer for Catalog {
    fn translate(&self, locale: &str, text: &str) -> Option<String> {
        self.locales.get(locale)?.get(text).cloned()
    }
}

/// Localizes one field value.
///
/// An object of `locale -> text` picks `locale`, then `fallback`, and is
/// left as is when neither is present. A string is translated through the
/// localizer for `locale`, then `fallback`. Anything else is returned
/// unchanged.
pub(crate) fn localize(
    value: Value,
    localizer: Option<&dyn Localizer>,
    locale: Option<&str>,
    fallback: Option<&str>,
) -> Value {
    let candidates = || locale.into_iter().chain(fallback);

    match value {
        Value::Object(doc) => {
            for locale in candidates() {
                if let Some(text) = doc.get(locale) {
                    return text.clone();
                }
            }
            Value::Object(doc)
        }
        Value::String(text) => {
            let Some(localizer) = localizer else {
                return Value::String(text);
            };

            for locale in candidates() {
                if let Some(translated) = localizer.translate(locale, &text) {
                    return Value::String(translated);
                }
            }
            Value::String(text)
        }
        value => value,
    }
}
