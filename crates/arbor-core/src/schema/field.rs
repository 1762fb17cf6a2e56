use super::ColumnTy;
use crate::template::Template;

/// One entry of a preset.
#[derive(Debug, Clone)]
pub struct Field {
    /// Column name, relation name, computable name, or template text
    pub source: String,

    pub ty: FieldTy,

    /// Output key. Defaults to `source`.
    pub key: String,

    /// Available to formatters while assembling, removed from the output
    pub internal: bool,

    pub localize: bool,

    /// Legacy formatter applied to a nested preset: a `has_many` field
    /// renders each child through it and yields a list of strings.
    pub formatter: Option<Template>,

    /// Overrides the relation's reentrancy depth when descending through
    /// this field
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone)]
pub enum FieldTy {
    /// A column of the model's own table
    Column(ColumnTy),

    /// A relation rendered with the target model's named preset
    Preset(String),

    /// A template rendered into a string
    Formatter(Template),

    /// A template referencing nested values. A single `{path}` placeholder
    /// keeps the referenced value as is.
    NestedField(Template),

    /// A computable defined on the model
    Computable,
}

impl Field {
    pub fn column(source: impl Into<String>, ty: ColumnTy) -> Field {
        let source = source.into();
        Field {
            key: source.clone(),
            source,
            ty: FieldTy::Column(ty),
            internal: false,
            localize: false,
            formatter: None,
            max_depth: None,
        }
    }

    /// A relation field rendered with `preset` on the target.
    pub fn preset(source: impl Into<String>, preset: impl Into<String>) -> Field {
        let source = source.into();
        Field {
            key: source.clone(),
            source,
            ty: FieldTy::Preset(preset.into()),
            internal: false,
            localize: false,
            formatter: None,
            max_depth: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_column(&self) -> bool {
        matches!(self.ty, FieldTy::Column(_))
    }

    pub fn is_computable(&self) -> bool {
        matches!(self.ty, FieldTy::Computable)
    }

    /// Name of the nested preset for relation fields.
    pub fn nested_preset(&self) -> Option<&str> {
        match &self.ty {
            FieldTy::Preset(preset) => Some(preset),
            _ => None,
        }
    }

    /// Template evaluated during finalize, if any.
    pub fn template(&self) -> Option<&Template> {
        match &self.ty {
            FieldTy::Formatter(template) | FieldTy::NestedField(template) => Some(template),
            _ => None,
        }
    }
}
