//! Model definitions as produced by the external loader.
//!
//! These types only describe shape. Linking them into a [`Schema`] validates
//! references and fills in defaults.
//!
//! [`Schema`]: super::Schema

use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelDef {
    /// Table name. Defaults to the snake-cased model name.
    #[serde(default)]
    pub table: Option<String>,

    #[serde(default)]
    pub primary_key: Option<OneOrMany>,

    /// Column name to type name
    #[serde(default)]
    pub columns: IndexMap<String, String>,

    #[serde(default)]
    pub relations: IndexMap<String, RelationDef>,

    #[serde(default)]
    pub presets: IndexMap<String, PresetDef>,

    #[serde(default)]
    pub computables: IndexMap<String, ComputableDef>,

    #[serde(default)]
    pub aliases: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationDef {
    /// `belongs_to`, `has_one`, or `has_many`
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub fk: Option<String>,

    #[serde(default)]
    pub pk: Option<String>,

    /// Junction model name
    #[serde(default)]
    pub through: Option<String>,

    #[serde(default, rename = "where")]
    pub filter: Option<String>,

    #[serde(default, rename = "through_where")]
    pub through_filter: Option<String>,

    #[serde(default)]
    pub reentrant: bool,

    #[serde(default)]
    pub max_depth: Option<usize>,

    #[serde(default)]
    pub polymorphic: Option<PolymorphicDef>,

    #[serde(default)]
    pub sorts: Vec<String>,
}

/// `polymorphic: true` or `polymorphic: { type_column, types }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PolymorphicDef {
    Flag(bool),
    Config {
        #[serde(default)]
        type_column: Option<String>,

        #[serde(default)]
        types: IndexMap<String, String>,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresetDef {
    #[serde(default)]
    pub extends: Option<OneOrMany>,

    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// A preset field. A bare string is shorthand for a column field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "FieldRepr")]
pub struct FieldDef {
    pub source: String,

    /// A column type name, or `preset`, `formatter`, `nested_field`,
    /// `computable`. Inferred when omitted.
    pub ty: Option<String>,

    pub alias: Option<String>,

    pub preset: Option<String>,

    pub internal: bool,

    pub localize: bool,

    pub formatter: Option<String>,

    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FieldRepr {
    Source(String),
    Full {
        source: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        alias: Option<String>,
        #[serde(default)]
        preset: Option<String>,
        #[serde(default)]
        internal: bool,
        #[serde(default)]
        localize: bool,
        #[serde(default)]
        formatter: Option<String>,
        #[serde(default)]
        max_depth: Option<usize>,
    },
}

impl From<FieldRepr> for FieldDef {
    fn from(repr: FieldRepr) -> FieldDef {
        match repr {
            FieldRepr::Source(source) => FieldDef {
                source,
                ..FieldDef::default()
            },
            FieldRepr::Full {
                source,
                ty,
                alias,
                preset,
                internal,
                localize,
                formatter,
                max_depth,
            } => FieldDef {
                source,
                ty,
                alias,
                preset,
                internal,
                localize,
                formatter,
                max_depth,
            },
        }
    }
}

/// A bare expression or `{ expr, type }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ComputableDef {
    Expr(String),
    Full {
        expr: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
    },
}

impl ComputableDef {
    pub fn expr(&self) -> &str {
        match self {
            ComputableDef::Expr(expr) => expr,
            ComputableDef::Full { expr, .. } => expr,
        }
    }

    pub fn ty(&self) -> Option<&str> {
        match self {
            ComputableDef::Expr(_) => None,
            ComputableDef::Full { ty, .. } => ty.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(one) => vec![one.clone()],
            OneOrMany::Many(many) => many.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_model() {
        let def: ModelDef = serde_json::from_value(json!({
            "table": "posts",
            "columns": {"id": "integer", "title": "string"},
            "relations": {
                "author": {"type": "belongs_to", "model": "User"},
                "subject": {"type": "belongs_to", "polymorphic": {"type_column": "subject_kind"}},
                "owner": {"type": "belongs_to", "polymorphic": true},
            },
            "presets": {
                "base": {"fields": ["id", {"source": "title", "alias": "headline"}]},
                "full": {"extends": "base", "fields": [{"source": "author", "preset": "short"}]},
            },
            "computables": {
                "comment_count": {"expr": "COUNT({comments.id})", "type": "integer"},
                "upper_title": "UPPER({title})",
            },
        }))
        .unwrap();

        assert_eq!(def.table.as_deref(), Some("posts"));
        assert_eq!(def.relations["author"].kind, "belongs_to");
        assert!(matches!(
            def.relations["owner"].polymorphic,
            Some(PolymorphicDef::Flag(true))
        ));

        let base = &def.presets["base"];
        assert_eq!(base.fields[0].source, "id");
        assert_eq!(base.fields[1].alias.as_deref(), Some("headline"));

        let full = &def.presets["full"];
        assert_eq!(
            full.extends.as_ref().map(OneOrMany::to_vec),
            Some(vec!["base".to_string()])
        );

        assert_eq!(def.computables["comment_count"].ty(), Some("integer"));
        assert_eq!(def.computables["upper_title"].expr(), "UPPER({title})");
    }
}
