use super::{ColumnTy, Computable, Preset, Relation};
use crate::{Error, Result};

use indexmap::IndexMap;

/// One relational entity.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,

    pub table: String,

    /// Primary key columns. Defaults to `["id"]`.
    pub primary_key: Vec<String>,

    /// Declared column types. Columns not listed are treated as strings.
    pub columns: IndexMap<String, ColumnTy>,

    pub relations: IndexMap<String, Relation>,

    pub presets: IndexMap<String, Preset>,

    pub computables: IndexMap<String, Computable>,

    /// Shorthand path aliases expanded in filter and sort paths, e.g.
    /// `org -> contragent.organization`
    pub aliases: IndexMap<String, String>,
}

impl Model {
    pub fn relation(&self, name: &str) -> Result<&Relation> {
        self.relations.get(name).ok_or_else(|| {
            Error::schema(format!("model `{}` has no relation `{name}`", self.name))
        })
    }

    pub fn get_relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn preset(&self, name: &str) -> Result<&Preset> {
        self.presets
            .get(name)
            .ok_or_else(|| Error::schema(format!("model `{}` has no preset `{name}`", self.name)))
    }

    pub fn computable(&self, name: &str) -> Option<&Computable> {
        self.computables.get(name)
    }

    pub fn column_ty(&self, column: &str) -> ColumnTy {
        self.columns.get(column).copied().unwrap_or_default()
    }

    /// The single primary key column used to match child rows.
    pub fn key_column(&self) -> &str {
        self.primary_key.first().map(String::as_str).unwrap_or("id")
    }

    pub fn has_composite_key(&self) -> bool {
        self.primary_key.len() > 1
    }

    /// Expands a leading path alias. `org.name` with `org -> contragent.organization`
    /// becomes `contragent.organization.name`.
    pub fn expand_alias(&self, path: &str) -> String {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        match (self.aliases.get(head), rest) {
            (Some(expanded), Some(rest)) => format!("{expanded}.{rest}"),
            (Some(expanded), None) => expanded.clone(),
            (None, _) => path.to_string(),
        }
    }
}
